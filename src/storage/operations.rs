//! Storage operations
//!
//! Applies create-directory, write-file and delete-file events to paths that
//! have already been confined to the base directory.

use log::info;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::{fs, task};

use crate::error::StorageError;
use crate::event::{OutputEvent, WriteToFile};
use crate::lock::FileLock;
use crate::storage::filesystem::{Occupant, occupant};

/// How a write opens its target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create if missing, add to the end.
    Append,
    /// Create if missing, replace any existing contents once the lock is held.
    Truncate,
    /// Create, failing if the file already exists.
    CreateNew,
}

impl WriteMode {
    /// `append` takes precedence over `may_overwrite`.
    pub fn for_event(event: &WriteToFile) -> Self {
        if event.append {
            WriteMode::Append
        } else if event.may_overwrite {
            WriteMode::Truncate
        } else {
            WriteMode::CreateNew
        }
    }

    fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            WriteMode::Append => options.append(true).create(true),
            // Truncated under the lock, so a writer that never gets it leaves the file alone.
            WriteMode::Truncate => options.write(true).create(true).truncate(false),
            WriteMode::CreateNew => options.write(true).create_new(true),
        };
        options
    }
}

/// Apply `event` at the already-confined `path`.
pub async fn dispatch(path: &Path, event: &OutputEvent, lock: &FileLock) -> Result<(), StorageError> {
    match event {
        OutputEvent::CreateDirectory(_) => create_directory(path).await,
        OutputEvent::WriteToFile(write) => write_file(path, write, lock).await,
        OutputEvent::DeleteFile(_) => delete_file(path).await,
    }
}

/// Create a directory and any missing ancestors. An existing directory is fine.
pub async fn create_directory(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).await?;
    info!("Created directory {}", path.display());
    Ok(())
}

/// Write the event's contents to `path` while holding an exclusive lock on it.
pub async fn write_file(
    path: &Path,
    event: &WriteToFile,
    lock: &FileLock,
) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mode = WriteMode::for_event(event);
    let options = mode.open_options();
    let target = path.to_path_buf();
    let file: Arc<File> = Arc::new(
        task::spawn_blocking(move || options.open(target))
            .await
            .map_err(join_error)??,
    );

    let guard = lock.acquire(&file).await?;
    let bytes = event.contents.as_bytes().to_vec();
    let written = bytes.len();

    // The guard travels with the write so the lock is released when the
    // write finishes, even if this future is dropped first.
    task::spawn_blocking(move || {
        let result = truncate_if(mode, &file)
            .and_then(|()| (&*file).write_all(&bytes))
            .and_then(|()| (&*file).flush());
        drop(guard);
        result
    })
    .await
    .map_err(join_error)??;

    info!(
        "Wrote {} bytes to {} ({:?}, {})",
        written,
        path.display(),
        mode,
        if event.contents.is_text() { "text" } else { "binary" }
    );
    Ok(())
}

/// Remove the file at `path`.
///
/// The target is inspected first so a directory is reported as such on every
/// platform, rather than as whatever error `unlink` happens to return.
pub async fn delete_file(path: &Path) -> Result<(), StorageError> {
    match occupant(path).await? {
        Occupant::Nothing => return Err(StorageError::NotFound),
        Occupant::Directory => return Err(StorageError::IsADirectory),
        Occupant::File => {}
    }

    fs::remove_file(path).await?;
    info!("Deleted file {}", path.display());
    Ok(())
}

fn truncate_if(mode: WriteMode, file: &File) -> std::io::Result<()> {
    if mode == WriteMode::Truncate {
        file.set_len(0)?;
    }
    Ok(())
}

fn join_error(e: task::JoinError) -> StorageError {
    if e.is_panic() {
        std::panic::resume_unwind(e.into_panic());
    }
    StorageError::Io(std::io::Error::other(e))
}
