use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
}

/// Snapshot of one filesystem node, taken at call time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(rename = "type")]
    pub kind: FileType,
    pub name: String,
    /// Absolute path
    pub path: String,
    pub size: u64,
    /// Extension without the dot, `""` for files without one, `None` for directories
    pub ext: Option<String>,
    /// Epoch milliseconds
    pub modify_at: i64,
    pub access_at: i64,
    /// `None` where the filesystem does not record a birth time
    pub create_at: Option<i64>,
    pub readable: bool,
    pub writeable: bool,
    /// e.g. `-rw-r--r--`
    pub unix_mode_stat: String,
    /// e.g. `644`
    pub unix_mode_octal: String,
    pub uid: String,
    pub gid: String,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == FileType::Directory
    }
}

/// A `FileEntry` plus shallow child counts, which are only set for directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryStat {
    #[serde(flatten)]
    pub entry: FileEntry,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub directory_count: Option<usize>,
}

/// Filesystem primitives consumed by the file-manager host. Implementations
/// keep no state between calls.
#[async_trait]
pub trait FileProvider: Send + Sync {
    /// List the children of `dir`, keeping only names containing the trimmed
    /// `keyword` when it is non-empty
    async fn list_file(&self, dir: &str, keyword: Option<&str>) -> ProviderResult<Vec<FileEntry>>;

    /// Metadata for `path`, with child counts when it is a directory.
    /// Counting needs read permission on the directory, so a searchable but
    /// unreadable directory (e.g. mode `0311`) fails with `AccessDenied`
    /// rather than returning an entry without counts.
    async fn stat(&self, path: &str) -> ProviderResult<DirectoryStat>;

    async fn read_file(&self, path: &str) -> ProviderResult<Bytes>;

    /// Create or truncate `path` and write `data`. `mode` only applies when
    /// the file is created.
    async fn write_file(&self, path: &str, data: &[u8], mode: Option<u32>) -> ProviderResult<()>;

    /// `mkdir -p`, succeeding when the directory already exists
    async fn make_dir(&self, path: &str, mode: Option<u32>) -> ProviderResult<()>;

    /// Copy a file or a directory tree, overwriting existing files at `dest`
    async fn copy(&self, src: &str, dest: &str) -> ProviderResult<()>;

    /// Relocate `src`, falling back to copy and remove across filesystems
    async fn move_entry(&self, src: &str, dest: &str) -> ProviderResult<()>;

    async fn rename(&self, src: &str, dest: &str) -> ProviderResult<()>;

    /// Delete a file or directory tree. Missing paths are not an error.
    async fn remove(&self, path: &str) -> ProviderResult<()>;

    async fn chmod(&self, path: &str, mode: u32) -> ProviderResult<()>;

    fn exists(&self, path: &str) -> bool;
}
