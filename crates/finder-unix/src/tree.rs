//! Recursive copy and delete over `tokio::fs`.

use std::fs::Metadata;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Component, Path, PathBuf};

use finder_platform::error::{ProviderError, ProviderResult};
use tokio::fs;

/// Copy `src` to `dest`. Regular files overwrite whatever file sits at the
/// destination, directories are merged into existing ones, and symlinks
/// are recreated rather than followed.
pub async fn copy_tree(src: &Path, dest: &Path) -> ProviderResult<()> {
    let root_meta = fs::symlink_metadata(src).await.map_err(ProviderError::at(src))?;
    if src == dest || same_entry(src, &root_meta, dest).await {
        return Err(ProviderError::invalid_input(format!(
            "source and destination are the same: {} -> {}",
            src.display(),
            dest.display()
        )));
    }
    if root_meta.is_dir() {
        let real_src = fs::canonicalize(src).await.map_err(ProviderError::at(src))?;
        let real_dest = resolve_existing_prefix(dest).await?;
        if real_dest.starts_with(&real_src) {
            return Err(ProviderError::invalid_input(format!(
                "cannot copy {} into itself ({})",
                src.display(),
                dest.display()
            )));
        }
    }

    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dest.to_path_buf())];
    // Applied last so read-only source directories still receive their children
    let mut dir_permissions = Vec::new();
    while let Some((from, to)) = pending.pop() {
        let meta = fs::symlink_metadata(&from).await.map_err(ProviderError::at(&from))?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            copy_symlink(&from, &to).await?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&to).await.map_err(ProviderError::at(&to))?;

            let mut entries = fs::read_dir(&from).await.map_err(ProviderError::at(&from))?;
            while let Some(entry) = entries.next_entry().await.map_err(ProviderError::at(&from))? {
                pending.push((entry.path(), to.join(entry.file_name())));
            }
            dir_permissions.push((to, meta.permissions()));
        } else {
            fs::copy(&from, &to).await.map_err(ProviderError::at(&to))?;
        }
    }

    for (dir, permissions) in dir_permissions.into_iter().rev() {
        fs::set_permissions(&dir, permissions)
            .await
            .map_err(ProviderError::at(&dir))?;
    }
    Ok(())
}

fn identity(meta: &Metadata) -> (u64, u64) {
    (meta.dev(), meta.ino())
}

/// Whether writing to `dest` would clobber `src` itself: `dest` names the
/// same inode (through `..`, a symlink or a hard link), or `src` is a
/// symlink whose target is `dest`.
async fn same_entry(src: &Path, src_meta: &Metadata, dest: &Path) -> bool {
    let src_id = identity(src_meta);
    let dest_followed = fs::metadata(dest).await.ok().map(|m| identity(&m));
    let dest_direct = fs::symlink_metadata(dest).await.ok().map(|m| identity(&m));

    if dest_followed == Some(src_id) || dest_direct == Some(src_id) {
        return true;
    }
    if src_meta.file_type().is_symlink() {
        let src_target = fs::metadata(src).await.ok().map(|m| identity(&m));
        return src_target.is_some() && src_target == dest_direct;
    }
    false
}

/// Canonicalize the longest existing prefix of `path` and append the rest
/// lexically, so not-yet-created destinations still resolve `..` and symlinks.
async fn resolve_existing_prefix(path: &Path) -> ProviderResult<PathBuf> {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        match fs::canonicalize(existing).await {
            Ok(mut resolved) => {
                for component in rest.into_iter().rev() {
                    match component {
                        Component::ParentDir => {
                            resolved.pop();
                        }
                        Component::Normal(name) => resolved.push(name),
                        _ => {}
                    }
                }
                return Ok(resolved);
            }
            Err(e)
                if e.kind() == io::ErrorKind::NotFound
                    || e.kind() == io::ErrorKind::NotADirectory =>
            {
                match (existing.parent(), existing.components().next_back()) {
                    (Some(parent), Some(last)) => {
                        rest.push(last);
                        existing = parent;
                    }
                    _ => return Ok(path.to_path_buf()),
                }
            }
            Err(e) => return Err(ProviderError::from_io(e, existing)),
        }
    }
}

async fn copy_symlink(from: &Path, to: &Path) -> ProviderResult<()> {
    let target = fs::read_link(from).await.map_err(ProviderError::at(from))?;
    match fs::symlink_metadata(to).await {
        Ok(existing) if existing.is_dir() => {
            return Err(ProviderError::IsADirectory {
                path: to.display().to_string(),
            });
        }
        Ok(_) => fs::remove_file(to).await.map_err(ProviderError::at(to))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(ProviderError::from_io(e, to)),
    }
    fs::symlink(&target, to).await.map_err(ProviderError::at(to))
}

/// Copy then delete, for moves that `rename(2)` refuses across filesystems.
/// The source is only removed once the copy has fully succeeded.
pub async fn move_across_devices(src: &Path, dest: &Path) -> ProviderResult<()> {
    copy_tree(src, dest).await?;
    remove_tree(src).await?;
    Ok(())
}

/// Delete `path` and everything below it. Returns `Ok(false)` when there
/// was nothing to delete.
pub async fn remove_tree(path: &Path) -> ProviderResult<bool> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ProviderError::from_io(e, path)),
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(true),
        // Raced with another deleter
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProviderError::from_io(e, path)),
    }
}
