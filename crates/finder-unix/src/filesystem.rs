use std::fs::{Metadata, Permissions};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use bytes::Bytes;
use nix::errno::Errno;
use nix::unistd::{access, AccessFlags};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use finder_platform::error::{ProviderError, ProviderResult};
use finder_platform::filesystem::{DirectoryStat, FileEntry, FileProvider, FileType};
use finder_platform::mode;
use finder_platform::options::{ListErrorPolicy, ProviderOptions};

use crate::tree;

/// `FileProvider` backed by the host's POSIX filesystem through `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct UnixFileProvider {
    options: ProviderOptions,
}

impl UnixFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ProviderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn absolute(path: &str) -> ProviderResult<PathBuf> {
        if path.is_empty() {
            return Err(ProviderError::invalid_input("empty path"));
        }
        std::path::absolute(path).map_err(ProviderError::at(path))
    }

    /// Build the metadata record for `path`, following symlinks.
    async fn describe(path: &Path, name: String) -> ProviderResult<FileEntry> {
        let meta = fs::metadata(path).await.map_err(ProviderError::at(path))?;
        Ok(Self::to_file_entry(path, name, &meta))
    }

    fn to_file_entry(path: &Path, name: String, meta: &Metadata) -> FileEntry {
        let is_dir = meta.is_dir();
        let unix_mode_stat = mode::mode_to_symbolic(meta.mode());
        let unix_mode_octal = mode::mode_to_octal(meta.mode());

        FileEntry {
            kind: if is_dir { FileType::Directory } else { FileType::File },
            name,
            path: path.to_string_lossy().to_string(),
            size: meta.len(),
            ext: if is_dir {
                None
            } else {
                Some(
                    path.extension()
                        .map(|e| e.to_string_lossy().to_string())
                        .unwrap_or_default(),
                )
            },
            modify_at: epoch_ms(meta.mtime(), meta.mtime_nsec()),
            access_at: epoch_ms(meta.atime(), meta.atime_nsec()),
            create_at: meta
                .created()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64),
            readable: has_access(path, AccessFlags::R_OK),
            writeable: has_access(path, AccessFlags::W_OK),
            unix_mode_stat,
            unix_mode_octal,
            uid: meta.uid().to_string(),
            gid: meta.gid().to_string(),
        }
    }

    /// Shallow (files, directories) count of a directory's children.
    async fn count_children(dir: &Path) -> ProviderResult<(usize, usize)> {
        let mut entries = fs::read_dir(dir).await.map_err(ProviderError::at(dir))?;
        let (mut files, mut dirs) = (0, 0);
        while let Some(entry) = entries.next_entry().await.map_err(ProviderError::at(dir))? {
            let file_type = entry.file_type().await.map_err(ProviderError::at(entry.path()))?;
            let is_dir = if file_type.is_symlink() {
                // dangling links count as files
                fs::metadata(entry.path()).await.map(|m| m.is_dir()).unwrap_or(false)
            } else {
                file_type.is_dir()
            };
            if is_dir {
                dirs += 1;
            } else {
                files += 1;
            }
        }
        Ok((files, dirs))
    }

    fn sort_entries(&self, entries: &mut [FileEntry]) {
        if self.options.directories_first {
            entries.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name)));
        } else {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

fn epoch_ms(secs: i64, nsecs: i64) -> i64 {
    secs * 1000 + nsecs / 1_000_000
}

/// `access(2)` check; any failure reads as "no".
fn has_access(path: &Path, flags: AccessFlags) -> bool {
    access(path, flags).is_ok()
}

#[async_trait]
impl FileProvider for UnixFileProvider {
    async fn list_file(&self, dir: &str, keyword: Option<&str>) -> ProviderResult<Vec<FileEntry>> {
        let dir = Self::absolute(dir)?;
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        debug!("list {} (keyword: {:?})", dir.display(), keyword);

        let mut children = fs::read_dir(&dir).await.map_err(ProviderError::at(&dir))?;
        let mut result = Vec::new();
        while let Some(child) = children.next_entry().await.map_err(ProviderError::at(&dir))? {
            let name = child.file_name().to_string_lossy().to_string();
            if keyword.is_some_and(|k| !name.contains(k)) {
                continue;
            }

            let path = child.path();
            match Self::describe(&path, name).await {
                Ok(entry) => result.push(entry),
                Err(e) if self.options.list_errors == ListErrorPolicy::Skip => {
                    warn!("skipping {}: {}", path.display(), e);
                }
                Err(e) => return Err(e),
            }
        }

        self.sort_entries(&mut result);
        Ok(result)
    }

    async fn stat(&self, path: &str) -> ProviderResult<DirectoryStat> {
        let path = Self::absolute(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let entry = Self::describe(&path, name).await?;

        let (file_count, directory_count) = if entry.is_dir() {
            let (files, dirs) = Self::count_children(&path).await?;
            (Some(files), Some(dirs))
        } else {
            (None, None)
        };

        Ok(DirectoryStat {
            entry,
            file_count,
            directory_count,
        })
    }

    async fn read_file(&self, path: &str) -> ProviderResult<Bytes> {
        let data = fs::read(path).await.map_err(ProviderError::at(path))?;
        debug!("read {} ({} bytes)", path, data.len());
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &str, data: &[u8], mode: Option<u32>) -> ProviderResult<()> {
        if self.options.create_parent_dirs {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await.map_err(ProviderError::at(parent))?;
            }
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        if let Some(mode) = mode {
            options.mode(mode);
        }

        let mut file = options.open(path).await.map_err(ProviderError::at(path))?;
        file.write_all(data).await.map_err(ProviderError::at(path))?;
        file.flush().await.map_err(ProviderError::at(path))?;
        debug!("wrote {} ({} bytes)", path, data.len());
        Ok(())
    }

    async fn make_dir(&self, path: &str, mode: Option<u32>) -> ProviderResult<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        if let Some(mode) = mode {
            builder.mode(mode);
        }
        // a non-directory already at `path` surfaces as AlreadyExists
        builder.create(path).await.map_err(ProviderError::at(path))?;
        debug!("mkdir {}", path);
        Ok(())
    }

    async fn copy(&self, src: &str, dest: &str) -> ProviderResult<()> {
        let (src, dest) = (Self::absolute(src)?, Self::absolute(dest)?);
        debug!("copy {} -> {}", src.display(), dest.display());
        tree::copy_tree(&src, &dest).await
    }

    async fn move_entry(&self, src: &str, dest: &str) -> ProviderResult<()> {
        match fs::rename(src, dest).await {
            Ok(()) => {
                debug!("move {} -> {}", src, dest);
                Ok(())
            }
            Err(e) if e.raw_os_error() == Some(Errno::EXDEV as i32) => {
                warn!("{} and {} are on different filesystems, copying", src, dest);
                tree::move_across_devices(&Self::absolute(src)?, &Self::absolute(dest)?).await
            }
            Err(e) => Err(ProviderError::from_io(e, format!("{} -> {}", src, dest))),
        }
    }

    async fn rename(&self, src: &str, dest: &str) -> ProviderResult<()> {
        fs::rename(src, dest)
            .await
            .map_err(ProviderError::at(format!("{} -> {}", src, dest)))?;
        debug!("rename {} -> {}", src, dest);
        Ok(())
    }

    async fn remove(&self, path: &str) -> ProviderResult<()> {
        if tree::remove_tree(Path::new(path)).await? {
            debug!("removed {}", path);
        } else {
            debug!("remove {}: nothing to delete", path);
        }
        Ok(())
    }

    async fn chmod(&self, path: &str, mode: u32) -> ProviderResult<()> {
        fs::set_permissions(path, Permissions::from_mode(mode))
            .await
            .map_err(ProviderError::at(path))?;
        debug!("chmod {} {:o}", path, mode);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}
