//! Output events
//!
//! The events the gateway consumes, and the envelope the host delivers them in.

pub mod parser;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Operation;

pub use parser::{SUPPORTED_KINDS, parse_event};

/// Contents of a file write: text or raw bytes, never both.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FileContents {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileContents {
    /// The bytes that end up on disk. Text is written as UTF-8.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContents::Text(text) => text.as_bytes(),
            FileContents::Bytes(bytes) => bytes,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FileContents::Text(_))
    }
}

impl From<&str> for FileContents {
    fn from(text: &str) -> Self {
        FileContents::Text(text.to_string())
    }
}

impl From<String> for FileContents {
    fn from(text: String) -> Self {
        FileContents::Text(text)
    }
}

impl From<&[u8]> for FileContents {
    fn from(bytes: &[u8]) -> Self {
        FileContents::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for FileContents {
    fn from(bytes: Vec<u8>) -> Self {
        FileContents::Bytes(bytes)
    }
}

/// Create a directory, and any missing parents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateDirectory {
    pub path: PathBuf,
}

impl CreateDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Write contents to a file.
///
/// `append` wins over `may_overwrite`; with neither set the file must not
/// exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WriteToFile {
    pub path: PathBuf,
    pub contents: FileContents,
    #[serde(default)]
    pub append: bool,
    #[serde(default = "default_may_overwrite")]
    pub may_overwrite: bool,
}

fn default_may_overwrite() -> bool {
    true
}

impl WriteToFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<FileContents>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            append: false,
            may_overwrite: default_may_overwrite(),
        }
    }

    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn may_overwrite(mut self, may_overwrite: bool) -> Self {
        self.may_overwrite = may_overwrite;
        self
    }
}

/// Delete a single file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteFile {
    pub path: PathBuf,
}

impl DeleteFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Every event the gateway knows how to apply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    CreateDirectory(CreateDirectory),
    WriteToFile(WriteToFile),
    DeleteFile(DeleteFile),
}

impl OutputEvent {
    /// Wire name of this event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OutputEvent::CreateDirectory(_) => "create_directory",
            OutputEvent::WriteToFile(_) => "write_to_file",
            OutputEvent::DeleteFile(_) => "delete_file",
        }
    }

    /// The operation this event asks for.
    pub fn operation(&self) -> Operation {
        match self {
            OutputEvent::CreateDirectory(_) => Operation::CreateDirectory,
            OutputEvent::WriteToFile(_) => Operation::WriteFile,
            OutputEvent::DeleteFile(_) => Operation::DeleteFile,
        }
    }

    /// The path the event targets, before confinement.
    pub fn path(&self) -> &Path {
        match self {
            OutputEvent::CreateDirectory(event) => &event.path,
            OutputEvent::WriteToFile(event) => &event.path,
            OutputEvent::DeleteFile(event) => &event.path,
        }
    }
}

impl From<CreateDirectory> for OutputEvent {
    fn from(event: CreateDirectory) -> Self {
        OutputEvent::CreateDirectory(event)
    }
}

impl From<WriteToFile> for OutputEvent {
    fn from(event: WriteToFile) -> Self {
        OutputEvent::WriteToFile(event)
    }
}

impl From<DeleteFile> for OutputEvent {
    fn from(event: DeleteFile) -> Self {
        OutputEvent::DeleteFile(event)
    }
}

/// An event as routed by the host: one of ours, or something else by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    Storage(OutputEvent),
    Unsupported(String),
}

impl From<OutputEvent> for IncomingEvent {
    fn from(event: OutputEvent) -> Self {
        IncomingEvent::Storage(event)
    }
}

impl From<CreateDirectory> for IncomingEvent {
    fn from(event: CreateDirectory) -> Self {
        IncomingEvent::Storage(event.into())
    }
}

impl From<WriteToFile> for IncomingEvent {
    fn from(event: WriteToFile) -> Self {
        IncomingEvent::Storage(event.into())
    }
}

impl From<DeleteFile> for IncomingEvent {
    fn from(event: DeleteFile) -> Self {
        IncomingEvent::Storage(event.into())
    }
}
