use dashmap::DashMap;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::device::DeviceClient;
use crate::error::AppError;
use crate::models::board::{Board, SoundFile};
use crate::naming::{self, SOUND_EXTENSION};

pub const BOARDS_DIR: &str = "soundboards";
const PART_SUFFIX: &str = ".part";
const READ_CHUNK_SIZE: usize = 64 * 1024;

type SlotLocks = DashMap<(String, u32), Arc<Mutex<()>>>;

/// Holds a slot lock; drops the map entry once no other task wants it.
struct SlotGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: (String, u32),
    locks: Arc<SlotLocks>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Owns the on-disk layout `<root>/soundboards/<board>/<slot>_<name>.mp3`.
#[derive(Clone)]
pub struct SoundRepository {
    root: PathBuf,
    client: Client,
    download_timeout: Duration,
    slot_locks: Arc<SlotLocks>,
}

impl SoundRepository {
    pub fn new(root: impl Into<PathBuf>, download_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            client: Client::new(),
            download_timeout,
            slot_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn boards_dir(&self) -> PathBuf {
        self.root.join(BOARDS_DIR)
    }

    fn board_dir(&self, board: &str) -> Result<PathBuf, AppError> {
        naming::validate_component(board)
            .map_err(|e| AppError::UnsafePath(format!("invalid board name: {e}")))?;
        Ok(self.boards_dir().join(board))
    }

    /// Create the root and `soundboards` directories if missing.
    pub async fn ensure_dirs(&self) -> Result<PathBuf, AppError> {
        let dir = self.boards_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create {dir:?}: {e}")))?;
        Ok(dir)
    }

    /// Enumerate every board directory and the parsed sound files inside it.
    pub async fn list_boards(&self) -> Result<Vec<Board>, AppError> {
        let boards_dir = self.ensure_dirs().await?;
        let mut entries = tokio::fs::read_dir(&boards_dir)
            .await
            .map_err(|e| AppError::Internal(format!("failed to read boards directory: {e}")))?;

        let mut boards = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Internal(format!("failed to read directory entry: {e}")))?
        {
            let path = entry.path();
            let is_dir = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("skipping board with non UTF-8 name: {:?}", path);
                continue;
            };

            let files = read_board_files(&path).await?;
            boards.push(Board { name, files });
        }

        Ok(boards)
    }

    /// Open a stored clip for streaming. Returns its size and a chunked byte stream.
    pub async fn get_file_stream(
        &self,
        board: &str,
        file_name: &str,
    ) -> Result<(u64, BoxStream<'static, std::io::Result<Vec<u8>>>), AppError> {
        naming::validate_component(file_name)
            .map_err(|e| AppError::UnsafePath(format!("invalid file name: {e}")))?;
        let path = self.board_dir(board)?.join(file_name);

        let not_found = || AppError::NotFound(format!("sound file {board}/{file_name} not found"));
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(AppError::Internal(format!("failed to open {path:?}: {e}"))),
        };
        let metadata = file
            .metadata()
            .await
            .map_err(|e| AppError::Internal(format!("failed to stat {path:?}: {e}")))?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        Ok((metadata.len(), file_chunks(file)))
    }

    /// Find the file currently assigned to `slot` on `board`, if any.
    pub async fn find_slot(&self, board: &str, slot: u32) -> Result<Option<String>, AppError> {
        let dir = self.board_dir(board)?;
        Ok(slot_files(&dir, slot).await?.into_iter().next())
    }

    /// Replace the file of `slot` on `board` with the clip at `source_url`.
    ///
    /// The download lands in a `.part` file first; the old slot file is only
    /// removed once the new one is completely written. Returns the new filename.
    pub async fn set_slot_from_url(
        &self,
        board: &str,
        slot: u32,
        source_url: &str,
    ) -> Result<String, AppError> {
        let dir = self.board_dir(board)?;
        let url = Url::parse(source_url)
            .map_err(|e| AppError::BadRequest(format!("invalid url {source_url:?}: {e}")))?;
        let basename = naming::url_basename(&url)
            .map_err(|e| AppError::BadRequest(format!("invalid url {source_url:?}: {e}")))?;
        let filename = format!("{}{basename}", naming::slot_prefix(slot));

        let _guard = self.lock_slot(board, slot).await;

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create board directory: {e}")))?;

        let part_path = dir.join(format!("{filename}{PART_SUFFIX}"));
        if let Err(e) = self.download_to(&url, &part_path).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e);
        }

        for stale in slot_files(&dir, slot).await? {
            if stale != filename {
                tracing::debug!("removing replaced file {board}/{stale}");
                tokio::fs::remove_file(dir.join(&stale))
                    .await
                    .map_err(|e| AppError::Internal(format!("failed to delete {stale}: {e}")))?;
            }
        }

        tokio::fs::rename(&part_path, dir.join(&filename))
            .await
            .map_err(|e| AppError::Internal(format!("failed to move download into place: {e}")))?;

        tracing::info!("slot {slot} of board {board} set to {filename} from {url}");
        Ok(filename)
    }

    /// Send the slot's file to the device, named `<slot>.mp3` there.
    pub async fn push_slot_to_device(
        &self,
        board: &str,
        slot: u32,
        device: &DeviceClient,
    ) -> Result<(), AppError> {
        let dir = self.board_dir(board)?;
        let _guard = self.lock_slot(board, slot).await;

        let filename = slot_files(&dir, slot)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("no file for slot {slot} on board {board}")))?;
        let path = dir.join(&filename);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to read {path:?}: {e}")))?;

        device
            .upload(bytes, &naming::device_filename(slot))
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        tracing::info!("pushed {board}/{filename} to device slot {slot}");
        Ok(())
    }

    async fn lock_slot(&self, board: &str, slot: u32) -> SlotGuard {
        let key = (board.to_string(), slot);
        let lock = self.slot_locks.entry(key.clone()).or_default().clone();
        SlotGuard {
            guard: Some(lock.lock_owned().await),
            key,
            locks: self.slot_locks.clone(),
        }
    }

    /// Stream the response body into `path`, flushing before returning.
    async fn download_to(&self, url: &Url, path: &Path) -> Result<(), AppError> {
        let mut response = self
            .client
            .get(url.clone())
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| AppError::Download(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Download(format!("{url} returned {status}")));
        }

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create {path:?}: {e}")))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::Download(format!("reading {url} failed: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("failed to write {path:?}: {e}")))?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("failed to flush {path:?}: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| AppError::Internal(format!("failed to sync {path:?}: {e}")))?;
        Ok(())
    }
}

async fn read_board_files(dir: &Path) -> Result<Vec<SoundFile>, AppError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read board directory: {e}")))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Internal(format!("failed to read directory entry: {e}")))?
    {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.ends_with(SOUND_EXTENSION) {
            continue;
        }
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        match naming::parse_sound_filename(&name) {
            Ok(file) => files.push(file),
            Err(e) => tracing::warn!("skipping {:?}: {e}", entry.path()),
        }
    }

    Ok(files)
}

/// All `.mp3` files in `dir` belonging to `slot`. A missing directory has none.
async fn slot_files(dir: &Path, slot: u32) -> Result<Vec<String>, AppError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::Internal(format!(
                "failed to read board directory: {e}"
            )))
        }
    };

    let prefix = naming::slot_prefix(slot);
    let mut found = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Internal(format!("failed to read directory entry: {e}")))?
    {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with(&prefix) || !name.ends_with(SOUND_EXTENSION) {
            continue;
        }
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            found.push(name);
        }
    }
    Ok(found)
}

fn file_chunks(file: tokio::fs::File) -> BoxStream<'static, std::io::Result<Vec<u8>>> {
    futures_util::stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok::<_, std::io::Error>(Some((buf, file)))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_repository() -> SoundRepository {
        let root = std::env::temp_dir().join(format!("espsoundboard-{}", uuid::Uuid::new_v4()));
        SoundRepository::new(root, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_slot_locks_released_after_failed_pushes() {
        let repository = temp_repository();
        let device = DeviceClient::new(
            "http://127.0.0.1:1",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        for slot in 0..100 {
            let result = repository.push_slot_to_device("ghost", slot, &device).await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }
        assert!(repository.slot_locks.is_empty());
    }

    #[tokio::test]
    async fn test_slot_lock_kept_while_another_task_waits() {
        let repository = temp_repository();

        let first = repository.lock_slot("party", 3).await;
        let waiter = {
            let repository = repository.clone();
            tokio::spawn(async move {
                let _second = repository.lock_slot("party", 3).await;
            })
        };
        while Arc::strong_count(&repository.slot_locks.get(&("party".to_string(), 3)).unwrap()) < 3 {
            tokio::task::yield_now().await;
        }

        drop(first);
        assert_eq!(repository.slot_locks.len(), 1);
        waiter.await.unwrap();
        assert!(repository.slot_locks.is_empty());
    }
}
