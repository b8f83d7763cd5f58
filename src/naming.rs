use crate::models::board::SoundFile;

pub const SOUND_EXTENSION: &str = ".mp3";

/// Build the on-disk filename for a slot: `<id>_<name>.mp3`.
pub fn sound_filename(id: u32, name: &str) -> String {
    format!("{id}_{name}{SOUND_EXTENSION}")
}

/// Parse an on-disk filename back into its slot id and display name.
///
/// The separator is the first `_` at or after index 1, so the name itself
/// may contain digits and underscores. The id prefix must be all ASCII digits.
pub fn parse_sound_filename(filename: &str) -> Result<SoundFile, &'static str> {
    let stem = filename
        .strip_suffix(SOUND_EXTENSION)
        .ok_or("sound file must end with .mp3")?;

    let sep = stem
        .get(1..)
        .and_then(|rest| rest.find('_'))
        .map(|i| i + 1)
        .ok_or("sound file name has no slot separator")?;

    let (id_part, rest) = stem.split_at(sep);
    if !id_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err("slot id must be numeric");
    }
    let id: u32 = id_part.parse().map_err(|_| "slot id out of range")?;

    Ok(SoundFile {
        id,
        name: rest[1..].to_string(),
    })
}

/// The flat name a slot's file gets on the device: `<id>.mp3`.
pub fn device_filename(id: u32) -> String {
    format!("{id}{SOUND_EXTENSION}")
}

/// Prefix that every file belonging to `id` starts with.
pub fn slot_prefix(id: u32) -> String {
    format!("{id}_")
}

/// Validate a caller-supplied board or file name as a single path component.
///
/// Rules: non-empty, not `.` or `..`, and no `/`, `\` or NUL.
pub fn validate_component(component: &str) -> Result<(), &'static str> {
    if component.is_empty() {
        return Err("name must not be empty");
    }
    if component == "." || component == ".." {
        return Err("name must not be a relative directory reference");
    }
    if component.contains(['/', '\\', '\0']) {
        return Err("name must not contain path separators");
    }
    Ok(())
}

/// Derive the local file name from a download URL's last path segment.
///
/// `.mp3` is appended when missing so the file shows up in board listings.
pub fn url_basename(url: &reqwest::Url) -> Result<String, &'static str> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err("url must use http or https");
    }
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .ok_or("url has no file name")?;
    validate_component(segment)?;

    if segment.ends_with(SOUND_EXTENSION) {
        Ok(segment.to_string())
    } else {
        Ok(format!("{segment}{SOUND_EXTENSION}"))
    }
}
