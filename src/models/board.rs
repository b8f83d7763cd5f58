use serde::{Deserialize, Serialize};

/// A named directory of sound files, one per device slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    pub files: Vec<SoundFile>,
}

/// A clip assigned to a device button slot, parsed from `<id>_<name>.mp3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundFile {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetSlotQuery {
    pub url: String,
}
