//! Filesystem helpers: file discovery, clean-slate output directories and
//! recursive copying.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{PrepError, Result};

/// True when `path` has one of `extensions` (lowercase, no dot),
/// compared case-insensitively
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

/// Every file under `root` with one of `extensions`, sorted by path.
///
/// Symlinks to files are included; symlinked directories are not entered.
pub fn find_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Delete `dir` recursively if it exists, then create it empty.
///
/// This is destructive by intent: the output of the previous run is gone
/// once this returns.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        info!("Clearing existing output directory {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Copy the tree under `src_dir` into `dst_dir`, keeping its structure.
///
/// Directories (empty ones included) are recreated, files are copied over
/// any existing file with the same name. A symlink to a directory becomes a
/// plain empty directory; its target is not copied. Returns the number of
/// files copied.
pub fn recursive_copy<P: AsRef<Path>, Q: AsRef<Path>>(src_dir: P, dst_dir: Q) -> Result<usize> {
    let src_dir = src_dir.as_ref();
    let dst_dir = dst_dir.as_ref();
    if !src_dir.is_dir() {
        return Err(PrepError::InvalidInput(format!(
            "source directory does not exist: {}",
            src_dir.display()
        )));
    }

    fs::create_dir_all(dst_dir)?;

    let mut copied = 0;
    for entry in WalkDir::new(src_dir).min_depth(1).follow_links(false) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|_| PrepError::InvalidInput(format!("{} escaped the source tree", entry.path().display())))?;
        let target = dst_dir.join(relative);

        let is_dir = entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir());
        if is_dir {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            debug!("Copied {} -> {}", entry.path().display(), target.display());
            copied += 1;
        }
    }

    info!(
        "Copied {} files from {} to {}",
        copied,
        src_dir.display(),
        dst_dir.display()
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension(Path::new("a/B.WAV"), &["wav"]));
        assert!(!has_extension(Path::new("a/b.wave"), &["wav"]));
        assert!(!has_extension(Path::new("a/wav"), &["wav"]));
    }

    #[test]
    fn reset_dir_removes_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("old")).unwrap();
        fs::write(out.join("old/stale.wav"), b"x").unwrap();

        reset_dir(&out).unwrap();

        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn copy_reproduces_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("top.txt"), b"top").unwrap();
        fs::write(src.join("a/b/deep.wav"), b"deep").unwrap();

        let dst = dir.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("top.txt"), b"old").unwrap();

        let copied = recursive_copy(&src, &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read(dst.join("top.txt")).unwrap(), b"top");
        assert_eq!(fs::read(dst.join("a/b/deep.wav")).unwrap(), b"deep");
        assert!(dst.join("empty").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn copy_recreates_linked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("d")).unwrap();
        fs::write(src.join("d/f.txt"), b"f").unwrap();
        std::os::unix::fs::symlink(src.join("d"), src.join("dlink")).unwrap();

        let dst = dir.path().join("dst");
        let copied = recursive_copy(&src, &dst).unwrap();

        assert_eq!(copied, 1);
        assert_eq!(fs::read(dst.join("d/f.txt")).unwrap(), b"f");
        assert!(dst.join("dlink").is_dir());
        assert!(!fs::symlink_metadata(dst.join("dlink")).unwrap().file_type().is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn linked_files_are_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store");
        let root = dir.path().join("root");
        fs::create_dir_all(&store).unwrap();
        fs::create_dir_all(&root).unwrap();
        fs::write(store.join("real.wav"), b"x").unwrap();
        fs::write(root.join("a.wav"), b"x").unwrap();
        std::os::unix::fs::symlink(store.join("real.wav"), root.join("linked.wav")).unwrap();

        let files = find_files(&root, &["wav"]).unwrap();
        assert_eq!(files, vec![root.join("a.wav"), root.join("linked.wav")]);
    }

    #[test]
    fn copy_requires_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = recursive_copy(dir.path().join("missing"), dir.path().join("dst")).unwrap_err();
        assert!(matches!(err, PrepError::InvalidInput(_)));
    }
}
