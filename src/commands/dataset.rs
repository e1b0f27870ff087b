// src/commands/dataset.rs

//! Dataset lifecycle commands: staging, ingestion, listing and removal

use super::HubContext;
use anyhow::{Context, Result};
use fmhub::audit;
use fmhub::db::models::{Dataset, DatasetDetail, Rating, human_size};
use fmhub::db::paths;
use fmhub::ingest::{DatasetAssembler, IngestRequest, UserProfile};
use fmhub::integrity::FileIntegrity;
use std::fs;
use std::path::Path;
use tracing::info;

/// Create the database and the storage directories
pub fn cmd_init(ctx: &HubContext) -> Result<()> {
    info!("Initializing fmhub at {}", ctx.storage.root().display());
    fmhub::db::init(ctx.db_path())?;

    for dir in [
        paths::uploads_dir(ctx.storage.root()),
        paths::temp_dir(ctx.storage.root()),
    ] {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    println!("Database initialized at: {}", ctx.db_path());
    println!("Storage root: {}", ctx.storage.root().display());
    Ok(())
}

pub fn cmd_stage(ctx: &HubContext, user_id: i64, file: &Path) -> Result<()> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", file.display()))?;
    let content =
        fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let stored = ctx.storage.stage_upload(user_id, filename, &content)?;
    println!("Staged {} for user {}", stored, user_id);

    let staged = ctx.storage.list_staged(user_id)?;
    println!("  Staging area now holds {} file(s)", staged.len());
    Ok(())
}

/// Create a dataset from staged files, then try to publish it
pub fn cmd_ingest(
    ctx: &HubContext,
    request_path: &Path,
    profile_path: &Path,
    no_sync: bool,
) -> Result<()> {
    let request = IngestRequest::load(request_path)?;
    let user = UserProfile::load(profile_path)?;

    let mut conn = ctx.open()?;
    let assembler = DatasetAssembler::new(
        ctx.storage.clone(),
        FileIntegrity::new(ctx.config.integrity.algorithm),
    );
    let dataset = assembler.ingest(&mut conn, &request, &user)?;
    let dataset_id = dataset.id.context("Created dataset has no id")?;

    let detail = DatasetDetail::load(&conn, dataset_id)?;
    println!("Created dataset {}: {}", dataset_id, detail.metadata.title);
    if let Some(metrics) = &detail.metrics {
        println!(
            "  Models: {}  Features: {}  Products: {}",
            metrics.number_of_models, metrics.number_of_features, metrics.number_of_products
        );
    }

    if no_sync {
        println!("  Synchronization skipped");
        return Ok(());
    }
    let outcome = ctx.coordinator()?.synchronize(&conn, dataset_id)?;
    println!("  {}", outcome);
    Ok(())
}

pub fn cmd_list(ctx: &HubContext, user_id: Option<i64>) -> Result<()> {
    let conn = ctx.open()?;
    let datasets = match user_id {
        Some(user_id) => Dataset::list_by_user(&conn, user_id)?,
        None => Dataset::list_all(&conn)?,
    };

    if datasets.is_empty() {
        println!("No datasets.");
        return Ok(());
    }

    println!("{:<6} {:<6} {:<30} {:<12} {}", "ID", "USER", "TITLE", "SIZE", "DOI");
    println!("{}", "-".repeat(80));
    for dataset in &datasets {
        let Some(id) = dataset.id else { continue };
        let detail = DatasetDetail::load(&conn, id)?;
        println!(
            "{:<6} {:<6} {:<30} {:<12} {}",
            id,
            dataset.user_id,
            truncate(&detail.metadata.title, 30),
            Dataset::total_size_for_human(&conn, id)?,
            detail.metadata.dataset_doi.as_deref().unwrap_or("(local only)")
        );
    }
    println!("{}", "-".repeat(80));
    println!(
        "{} dataset(s): {} synchronized, {} local only",
        datasets.len(),
        Dataset::count_synchronized(&conn)?,
        Dataset::count_unsynchronized(&conn)?
    );
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width - 3).collect();
    short.push_str("...");
    short
}

/// Print one dataset and record the view
pub fn cmd_show(
    ctx: &HubContext,
    dataset_id: i64,
    user_id: Option<i64>,
    token: Option<&str>,
) -> Result<()> {
    let conn = ctx.open()?;
    let detail = DatasetDetail::load(&conn, dataset_id)?;
    let receipt = audit::record_view(&conn, dataset_id, user_id, token)?;

    let metadata = &detail.metadata;
    println!("Dataset {}: {}", dataset_id, metadata.title);
    println!("  Owner: user {}", detail.dataset.user_id);
    println!("  Created: {}", detail.dataset.created_at);
    println!("  Publication type: {}", metadata.publication_type);
    if let Some(doi) = &metadata.publication_doi {
        println!("  Publication DOI: {}", doi);
    }
    match &metadata.dataset_doi {
        Some(doi) => println!("  Dataset DOI: {}", doi),
        None => println!("  Dataset DOI: (not synchronized)"),
    }
    let tags = metadata.tag_list();
    if !tags.is_empty() {
        println!("  Tags: {}", tags.join(", "));
    }
    println!("  Description: {}", metadata.description);

    if !detail.authors.is_empty() {
        println!("  Authors:");
        for author in &detail.authors {
            let mut line = format!("    {}", author.name);
            if let Some(affiliation) = &author.affiliation {
                line.push_str(&format!(" ({affiliation})"));
            }
            if let Some(orcid) = &author.orcid {
                line.push_str(&format!(" [{orcid}]"));
            }
            println!("{}", line);
        }
    }

    if let Some(metrics) = &detail.metrics {
        println!(
            "  Metrics: {} model(s), {} feature(s), {} product(s)",
            metrics.number_of_models, metrics.number_of_features, metrics.number_of_products
        );
    }

    println!("  Files:");
    for model in &detail.feature_models {
        for file in &model.files {
            println!(
                "    {} ({}, {})",
                file.name,
                human_size(u64::try_from(file.size).unwrap_or_default()),
                file.checksum
            );
        }
    }

    println!(
        "  Rating: {:.1} from {} vote(s)",
        metadata.rating,
        Rating::count(&conn, detail.dataset.ds_meta_data_id)?
    );
    println!(
        "  Downloads: {}  Views: {}",
        audit::download_count(&conn, dataset_id)?,
        audit::view_count(&conn, dataset_id)?
    );
    println!("  View token: {}", receipt.token);
    Ok(())
}

pub fn cmd_rate(ctx: &HubContext, dataset_id: i64, user_id: i64, value: u8) -> Result<()> {
    let conn = ctx.open()?;
    let dataset = Dataset::get(&conn, dataset_id)?;

    Rating::upsert(&conn, dataset.ds_meta_data_id, user_id, value)?;
    let average = Rating::average(&conn, dataset.ds_meta_data_id)?;
    println!(
        "User {} rated dataset {} with {}; average is now {:.2}",
        user_id, dataset_id, value, average
    );
    Ok(())
}

/// Remove a dataset's rows and its permanent folder
pub fn cmd_delete(ctx: &HubContext, dataset_id: i64) -> Result<()> {
    let mut conn = ctx.open()?;
    let dataset = Dataset::get(&conn, dataset_id)?;

    Dataset::delete(&mut conn, dataset_id)?;
    ctx.storage
        .remove_dataset_dir(dataset.user_id, dataset_id)?;

    println!("Deleted dataset {}", dataset_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title", 10), "a very ...");
    }
}
