// src/export.rs

//! Packaging stored datasets into ZIP archives
//!
//! Layouts:
//! - single dataset: `dataset_<id>/<file>` for every stored file, plus
//!   `dataset_<id>/<stem>.<ext>` converted copies when a format is requested
//! - bulk: `dataset_<id>/UVL/<file>.uvl` and `dataset_<id>/<Format>/<stem>.<ext>`
//!   for every interchange format, synchronized datasets with feature models
//!   only; other stored files are left out
//!
//! A file that fails to convert is logged and left out; the rest of the
//! archive is still produced.

use crate::convert::{self, ExportFormat, InterchangeFormat};
use crate::db::models::{Dataset, FeatureModel};
use crate::db::paths;
use crate::error::{Error, Result};
use crate::storage::UploadStorage;
use crate::uvl;
use rusqlite::Connection;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File found in a dataset folder
struct StoredFile {
    /// Path relative to the dataset folder, `/`-separated
    relative: String,
    path: PathBuf,
}

impl StoredFile {
    fn is_uvl(&self) -> bool {
        uvl::has_uvl_extension(&self.relative)
    }

    fn stem(&self) -> &str {
        let name = self.relative.rsplit('/').next().unwrap_or(&self.relative);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }
}

fn stored_files(folder: &Path) -> Result<Vec<StoredFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::IoError(format!("Failed to walk {}: {}", folder.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(folder)
            .map_err(|e| Error::IoError(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push(StoredFile {
            relative,
            path: entry.into_path(),
        });
    }
    Ok(files)
}

struct ArchiveBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveBuilder {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        }
    }

    fn add(&mut self, name: String, content: &[u8]) -> Result<()> {
        debug!("Adding {} ({} bytes)", name, content.len());
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(content)?;
        self.entries += 1;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Builds export archives from the permanent upload folders
pub struct ExportPackager {
    storage: UploadStorage,
}

impl ExportPackager {
    pub fn new(storage: UploadStorage) -> Self {
        Self { storage }
    }

    /// Resolve the folder of an exportable dataset
    ///
    /// Unknown datasets are `NotFoundError`; datasets without feature
    /// models are incomplete and rejected.
    fn dataset_folder(&self, conn: &Connection, dataset_id: i64) -> Result<PathBuf> {
        let dataset = Dataset::get(conn, dataset_id)?;
        if FeatureModel::count_for_dataset(conn, dataset_id)? == 0 {
            return Err(Error::validation(
                "feature_models",
                format!("Dataset {dataset_id} has no feature models"),
            ));
        }

        let folder = self.storage.dataset_dir(dataset.user_id, dataset_id);
        if !folder.is_dir() {
            return Err(Error::IoError(format!(
                "Files of dataset {} are missing from {}",
                dataset_id,
                folder.display()
            )));
        }
        Ok(folder)
    }

    /// Archive of the stored files exactly as uploaded
    pub fn export_original(&self, conn: &Connection, dataset_id: i64) -> Result<Vec<u8>> {
        self.build_single(conn, dataset_id, None)
    }

    /// Archive of the stored files plus a converted copy of every UVL file
    pub fn export_one(
        &self,
        conn: &Connection,
        dataset_id: i64,
        format: ExportFormat,
    ) -> Result<Vec<u8>> {
        self.build_single(conn, dataset_id, Some(format))
    }

    fn build_single(
        &self,
        conn: &Connection,
        dataset_id: i64,
        format: Option<ExportFormat>,
    ) -> Result<Vec<u8>> {
        let folder = self.dataset_folder(conn, dataset_id)?;
        let prefix = paths::dataset_folder_name(dataset_id);
        let mut archive = ArchiveBuilder::new();

        for file in stored_files(&folder)? {
            let content = fs::read(&file.path)?;
            archive.add(format!("{prefix}/{}", file.relative), &content)?;

            let Some(format) = format.filter(|_| file.is_uvl()) else {
                continue;
            };
            let text = String::from_utf8_lossy(&content);
            match convert::convert(&text, format) {
                Ok(converted) => {
                    let name = uvl::with_extension(&file.relative, format.extension());
                    archive.add(format!("{prefix}/{name}"), converted.as_bytes())?;
                }
                Err(e) => warn!("Skipping {} conversion of {}: {}", format, file.relative, e),
            }
        }

        info!(
            "Exported dataset {} ({} entries)",
            dataset_id, archive.entries
        );
        archive.finish()
    }

    /// Archive of every synchronized dataset with interchange copies
    ///
    /// Fails with `NotFoundError` instead of returning an empty archive when
    /// no stored dataset is synchronized.
    pub fn export_all(&self, conn: &Connection) -> Result<Vec<u8>> {
        let mut archive = ArchiveBuilder::new();
        let mut included = 0;

        for stored in self.storage.list_dataset_dirs()? {
            match Dataset::find_by_id(conn, stored.dataset_id)? {
                Some(dataset) if dataset.user_id == stored.user_id => {}
                _ => {
                    debug!("Skipping orphan folder {}", stored.path.display());
                    continue;
                }
            }
            if !Dataset::is_synchronized(conn, stored.dataset_id)? {
                debug!("Skipping unsynchronized dataset {}", stored.dataset_id);
                continue;
            }
            if FeatureModel::count_for_dataset(conn, stored.dataset_id)? == 0 {
                debug!("Skipping incomplete dataset {}", stored.dataset_id);
                continue;
            }

            self.add_bulk_dataset(&mut archive, stored.dataset_id, &stored.path)?;
            included += 1;
        }

        if included == 0 {
            return Err(Error::NotFoundError(
                "No synchronized datasets to export".to_string(),
            ));
        }

        info!(
            "Exported {} datasets ({} entries)",
            included, archive.entries
        );
        archive.finish()
    }

    fn add_bulk_dataset(
        &self,
        archive: &mut ArchiveBuilder,
        dataset_id: i64,
        folder: &Path,
    ) -> Result<()> {
        let prefix = paths::dataset_folder_name(dataset_id);

        for file in stored_files(folder)? {
            if !file.is_uvl() {
                debug!("Leaving {} out of dataset {}", file.relative, dataset_id);
                continue;
            }
            let content = fs::read(&file.path)?;
            archive.add(format!("{prefix}/UVL/{}", file.relative), &content)?;

            let text = String::from_utf8_lossy(&content);
            for format in InterchangeFormat::ALL {
                match convert::convert_interchange(&text, file.stem(), format) {
                    Ok(converted) => {
                        let name = format!(
                            "{prefix}/{}/{}.{}",
                            format.folder(),
                            file.stem(),
                            format.extension()
                        );
                        archive.add(name, converted.as_bytes())?;
                    }
                    Err(e) => warn!(
                        "Skipping {} conversion of {} in dataset {}: {}",
                        format, file.relative, dataset_id, e
                    ),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{DatasetMetadata, FeatureModelMetadata, PublicationType};
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn seed(conn: &Connection, storage: &UploadStorage, with_model: bool) -> i64 {
        let md_id = DatasetMetadata::new("T".into(), "D".into(), PublicationType::None)
            .insert(conn)
            .unwrap();
        let id = Dataset::new(3, md_id).insert(conn).unwrap();
        if with_model {
            let fm_md = FeatureModelMetadata::new(
                "chat.uvl".into(),
                "Chat".into(),
                "d".into(),
                PublicationType::None,
            )
            .insert(conn)
            .unwrap();
            FeatureModel::new(id, fm_md).insert(conn).unwrap();
        }
        let dir = storage.dataset_dir(3, id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("chat.uvl"), "features\n    Chat\n        optional\n            A\n").unwrap();
        fs::write(dir.join("notes.txt"), "hello").unwrap();
        id
    }

    fn names(bytes: Vec<u8>) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    #[test]
    fn test_export_one_adds_converted_copy() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());
        let conn = crate::db::open_in_memory().unwrap();
        let id = seed(&conn, &storage, true);
        let packager = ExportPackager::new(storage);

        let bytes = packager.export_one(&conn, id, ExportFormat::Yaml).unwrap();
        let prefix = format!("dataset_{id}");
        assert_eq!(
            names(bytes),
            vec![
                format!("{prefix}/chat.uvl"),
                format!("{prefix}/chat.yaml"),
                format!("{prefix}/notes.txt"),
            ]
        );

        let original = packager.export_original(&conn, id).unwrap();
        assert_eq!(names(original).len(), 2);
    }

    #[test]
    fn test_export_rejects_incomplete_and_unknown() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());
        let conn = crate::db::open_in_memory().unwrap();
        let id = seed(&conn, &storage, false);
        let packager = ExportPackager::new(storage);

        assert!(matches!(
            packager.export_one(&conn, id, ExportFormat::Json),
            Err(Error::ValidationError { .. })
        ));
        assert!(matches!(
            packager.export_original(&conn, 999),
            Err(Error::NotFoundError(_))
        ));
    }

    #[test]
    fn test_export_all_requires_synchronized() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());
        let conn = crate::db::open_in_memory().unwrap();
        seed(&conn, &storage, true);
        let packager = ExportPackager::new(storage);

        assert!(matches!(
            packager.export_all(&conn),
            Err(Error::NotFoundError(_))
        ));
    }

    #[test]
    fn test_export_all_keeps_only_models_of_complete_datasets() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());
        let conn = crate::db::open_in_memory().unwrap();
        let complete = seed(&conn, &storage, true);
        let incomplete = seed(&conn, &storage, false);
        for (id, deposition) in [(complete, 10), (incomplete, 11)] {
            let md_id = Dataset::get(&conn, id).unwrap().ds_meta_data_id;
            DatasetMetadata::set_archival_identifier(
                &conn,
                md_id,
                deposition,
                &format!("10.5281/zenodo.{deposition}"),
            )
            .unwrap();
        }
        let packager = ExportPackager::new(storage);

        let prefix = format!("dataset_{complete}");
        assert_eq!(
            names(packager.export_all(&conn).unwrap()),
            vec![
                format!("{prefix}/DIMACS/chat.cnf"),
                format!("{prefix}/Glencoe/chat.json"),
                format!("{prefix}/SPLOT/chat.sxfm"),
                format!("{prefix}/UVL/chat.uvl"),
            ]
        );

        // Only incomplete datasets left
        fs::remove_dir_all(packager.storage.dataset_dir(3, complete)).unwrap();
        assert!(matches!(
            packager.export_all(&conn),
            Err(Error::NotFoundError(_))
        ));
    }

    #[test]
    fn test_stem() {
        let file = StoredFile {
            relative: "sub/model (1).uvl".to_string(),
            path: PathBuf::new(),
        };
        assert_eq!(file.stem(), "model (1)");
        assert!(file.is_uvl());
    }
}
