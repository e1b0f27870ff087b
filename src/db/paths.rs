// src/db/paths.rs
//! Centralized path derivation for fmhub directories

use std::path::{Path, PathBuf};

/// Default state directory when nothing is configured
pub const DEFAULT_ROOT: &str = "/var/lib/fmhub";

/// Get the directory containing the database
pub fn db_dir(db_path: &str) -> PathBuf {
    Path::new(db_path)
        .parent()
        .unwrap_or(Path::new(DEFAULT_ROOT))
        .to_path_buf()
}

/// Default database location under a storage root
pub fn default_db_path(root: &Path) -> PathBuf {
    root.join("fmhub.db")
}

/// Permanent uploads directory
pub fn uploads_dir(root: &Path) -> PathBuf {
    root.join("uploads")
}

/// Parent of all per-user staging folders
pub fn temp_dir(root: &Path) -> PathBuf {
    root.join("temp")
}

/// Staging folder of one user
pub fn staging_dir(root: &Path, user_id: i64) -> PathBuf {
    temp_dir(root).join(user_id.to_string())
}

/// Folder name a dataset gets inside uploads and export archives
pub fn dataset_folder_name(dataset_id: i64) -> String {
    format!("dataset_{dataset_id}")
}

/// Permanent folder of one dataset
pub fn dataset_dir(root: &Path, user_id: i64, dataset_id: i64) -> PathBuf {
    uploads_dir(root)
        .join(format!("user_{user_id}"))
        .join(dataset_folder_name(dataset_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_dir() {
        assert_eq!(
            db_dir("/var/lib/fmhub/fmhub.db"),
            PathBuf::from("/var/lib/fmhub")
        );
    }

    #[test]
    fn test_staging_dir() {
        assert_eq!(
            staging_dir(Path::new("/srv/hub"), 7),
            PathBuf::from("/srv/hub/temp/7")
        );
    }

    #[test]
    fn test_dataset_dir() {
        assert_eq!(
            dataset_dir(Path::new("/srv/hub"), 7, 42),
            PathBuf::from("/srv/hub/uploads/user_7/dataset_42")
        );
    }
}
