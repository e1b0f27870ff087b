// src/storage.rs

//! Upload storage: per-user staging and per-dataset permanent folders
//!
//! Layout under the storage root:
//!
//! ```text
//! temp/<user_id>/<file>.uvl                         staged, not yet ingested
//! uploads/user_<user_id>/dataset_<dataset_id>/...   written once at promotion
//! ```
//!
//! The staging folder belongs to one user and is not safe against two
//! sessions of that user racing the same filename.

use crate::db::paths;
use crate::error::{Error, Result};
use crate::uvl;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A dataset folder found under `uploads/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDataset {
    pub user_id: i64,
    pub dataset_id: i64,
    pub path: PathBuf,
}

/// Filesystem side of dataset ingestion
#[derive(Debug, Clone)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self, user_id: i64) -> PathBuf {
        paths::staging_dir(&self.root, user_id)
    }

    pub fn dataset_dir(&self, user_id: i64, dataset_id: i64) -> PathBuf {
        paths::dataset_dir(&self.root, user_id, dataset_id)
    }

    /// Path of a staged file; the name must be a bare filename
    pub fn staged_path(&self, user_id: i64, filename: &str) -> Result<PathBuf> {
        check_bare_filename(filename)?;
        Ok(self.staging_dir(user_id).join(filename))
    }

    /// Store an uploaded file in the user's staging folder
    ///
    /// Returns the name actually used: on collision `"<stem> (<n>).uvl"`
    /// with the smallest free `n`.
    pub fn stage_upload(&self, user_id: i64, filename: &str, content: &[u8]) -> Result<String> {
        check_bare_filename(filename)?;
        if !uvl::has_uvl_extension(filename) {
            return Err(Error::validation(
                "filename",
                format!("'{filename}' does not end in .{}", uvl::UVL_EXTENSION),
            ));
        }

        let dir = self.staging_dir(user_id);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", dir.display())))?;

        let stored_name = free_name(&dir, filename);
        let path = dir.join(&stored_name);

        // Write to a temp name, then rename into place
        let temp_path = dir.join(format!(".{stored_name}.tmp"));
        let mut file = File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        debug!(
            "Staged {} for user {} ({} bytes)",
            stored_name,
            user_id,
            content.len()
        );
        Ok(stored_name)
    }

    /// Staged filenames of a user, sorted
    pub fn list_staged(&self, user_id: i64) -> Result<Vec<String>> {
        let dir = self.staging_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete one staged file
    pub fn remove_staged(&self, user_id: i64, filename: &str) -> Result<()> {
        let path = self.staged_path(user_id, filename)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFoundError(format!(
                "Staged file {filename} for user {user_id}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Move staged files into the dataset's permanent folder
    ///
    /// Returns the permanent folder.
    pub fn promote(&self, user_id: i64, dataset_id: i64, filenames: &[String]) -> Result<PathBuf> {
        let dest_dir = self.dataset_dir(user_id, dataset_id);
        fs::create_dir_all(&dest_dir).map_err(|e| {
            Error::IoError(format!("Failed to create {}: {e}", dest_dir.display()))
        })?;

        for filename in filenames {
            let src = self.staged_path(user_id, filename)?;
            let dst = dest_dir.join(filename);
            move_file(&src, &dst).map_err(|e| {
                Error::IoError(format!(
                    "Failed to move {} to {}: {e}",
                    src.display(),
                    dst.display()
                ))
            })?;
        }

        info!(
            "Promoted {} file(s) to {}",
            filenames.len(),
            dest_dir.display()
        );
        Ok(dest_dir)
    }

    /// Remove the user's staging folder and everything in it
    pub fn clear_staging(&self, user_id: i64) -> Result<()> {
        let dir = self.staging_dir(user_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!("Cleared staging folder {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::IoError(format!(
                "Failed to clear {}: {e}",
                dir.display()
            ))),
        }
    }

    /// Remove a dataset's permanent folder; a missing folder is not an error
    pub fn remove_dataset_dir(&self, user_id: i64, dataset_id: i64) -> Result<()> {
        let dir = self.dataset_dir(user_id, dataset_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!("Removed {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::IoError(format!(
                "Failed to remove {}: {e}",
                dir.display()
            ))),
        }
    }

    /// Every `user_<u>/dataset_<d>` folder under `uploads/`, ordered by dataset id
    pub fn list_dataset_dirs(&self) -> Result<Vec<StoredDataset>> {
        let uploads = paths::uploads_dir(&self.root);
        if !uploads.exists() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for user_entry in fs::read_dir(&uploads)? {
            let user_entry = user_entry?;
            let Some(user_id) = parse_prefixed_id(&user_entry.file_name(), "user_") else {
                continue;
            };
            if !user_entry.file_type()?.is_dir() {
                continue;
            }
            for dataset_entry in fs::read_dir(user_entry.path())? {
                let dataset_entry = dataset_entry?;
                let Some(dataset_id) = parse_prefixed_id(&dataset_entry.file_name(), "dataset_")
                else {
                    continue;
                };
                if dataset_entry.file_type()?.is_dir() {
                    found.push(StoredDataset {
                        user_id,
                        dataset_id,
                        path: dataset_entry.path(),
                    });
                }
            }
        }

        found.sort_by_key(|d| d.dataset_id);
        Ok(found)
    }
}

fn parse_prefixed_id(name: &std::ffi::OsStr, prefix: &str) -> Option<i64> {
    name.to_str()?.strip_prefix(prefix)?.parse().ok()
}

fn check_bare_filename(filename: &str) -> Result<()> {
    let bare = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0']);
    if bare {
        Ok(())
    } else {
        Err(Error::validation(
            "filename",
            format!("'{filename}' is not a plain file name"),
        ))
    }
}

/// First name not taken in `dir`: `name`, then `stem (1).ext`, `stem (2).ext`, ...
fn free_name(dir: &Path, filename: &str) -> String {
    if !dir.join(filename).exists() {
        return filename.to_string();
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (filename, String::new()),
    };

    let mut n = 1u32;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Rename, falling back to copy+sync+delete across filesystems
fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "Cross-filesystem move ({} -> {}), copying",
                src.display(),
                dst.display()
            );
            fs::copy(src, dst)?;
            File::open(dst)?.sync_all()?;
            fs::remove_file(src)?;
            Ok(())
        }
        Err(e) => {
            warn!("Rename {} failed: {}", src.display(), e);
            Err(e)
        }
    }
}
