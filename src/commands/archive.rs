// src/commands/archive.rs

//! Synchronization and export commands

use super::HubContext;
use anyhow::{Context, Result};
use fmhub::audit;
use fmhub::convert::ExportFormat;
use fmhub::export::ExportPackager;
use std::fs;
use std::path::Path;
use tracing::info;

pub fn cmd_sync(ctx: &HubContext, dataset_id: i64) -> Result<()> {
    let conn = ctx.open()?;
    let outcome = ctx.coordinator()?.synchronize(&conn, dataset_id)?;

    println!("Dataset {}: {}", dataset_id, outcome);
    Ok(())
}

fn write_archive(output: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))
}

/// Export one dataset and record the download
pub fn cmd_export(
    ctx: &HubContext,
    dataset_id: i64,
    format: Option<ExportFormat>,
    output: &Path,
    user_id: Option<i64>,
    token: Option<&str>,
) -> Result<()> {
    let conn = ctx.open()?;
    let packager = ExportPackager::new(ctx.storage.clone());

    let bytes = match format {
        Some(format) => packager.export_one(&conn, dataset_id, format)?,
        None => packager.export_original(&conn, dataset_id)?,
    };
    write_archive(output, &bytes)?;

    let receipt = audit::record_download(&conn, dataset_id, user_id, token)?;
    info!(
        "Download of dataset {} recorded (new: {})",
        dataset_id, receipt.created
    );

    println!(
        "Exported dataset {} to {} ({} bytes)",
        dataset_id,
        output.display(),
        bytes.len()
    );
    println!("  Download token: {}", receipt.token);
    Ok(())
}

pub fn cmd_export_all(ctx: &HubContext, output: &Path) -> Result<()> {
    let conn = ctx.open()?;
    let bytes = ExportPackager::new(ctx.storage.clone()).export_all(&conn)?;
    write_archive(output, &bytes)?;

    println!(
        "Exported all synchronized datasets to {} ({} bytes)",
        output.display(),
        bytes.len()
    );
    Ok(())
}
