use std::{
    fmt, fs, io,
    path::{Component, Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to stored upload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHandle(String);

impl FileHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Byte storage for uploaded files: store, read back, delete.
pub trait FileStorage: Send + Sync {
    fn put(&self, bytes: &[u8]) -> io::Result<FileHandle>;
    fn read(&self, handle: &FileHandle) -> io::Result<Vec<u8>>;
    fn delete(&self, handle: &FileHandle) -> io::Result<()>;
}

/// Stores each upload as `<root>/datasets/<uuid>.csv`.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

pub const UPLOAD_DIR: &str = "datasets";

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, handle: &FileHandle) -> io::Result<PathBuf> {
        let relative = Path::new(handle.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Handle '{handle}' does not name a stored upload"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStorage for FsStorage {
    fn put(&self, bytes: &[u8]) -> io::Result<FileHandle> {
        let dir = self.root.join(UPLOAD_DIR);
        fs::create_dir_all(&dir)?;
        let name = format!("{}.csv", Uuid::new_v4());
        fs::write(dir.join(&name), bytes)?;
        Ok(FileHandle::new(format!("{UPLOAD_DIR}/{name}")))
    }

    fn read(&self, handle: &FileHandle) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(handle)?)
    }

    fn delete(&self, handle: &FileHandle) -> io::Result<()> {
        fs::remove_file(self.resolve(handle)?)
    }
}
