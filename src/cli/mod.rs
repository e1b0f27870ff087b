// src/cli/mod.rs
//! CLI definitions for fmhub
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! Dataset lifecycle:
//! - `stage` - Place a UVL file in a user's staging area
//! - `ingest` - Turn staged files into a dataset
//! - `sync` - Publish a dataset to the archival service
//! - `export` / `export-all` - Build ZIP archives
//!
//! Lookup and bookkeeping:
//! - `list`, `show`, `resolve`, `rate`, `delete`, `redirect`

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod redirect;

pub use redirect::RedirectCommands;

#[derive(Parser)]
#[command(name = "fmhub")]
#[command(author = "fmhub Contributors")]
#[command(version)]
#[command(about = "Feature-model dataset hub: UVL ingestion, archival sync and export", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = fmhub::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and storage directories
    Init,

    /// Stage a UVL file for a user's next dataset
    Stage {
        /// Owning user id
        user: i64,

        /// Path to the .uvl file
        file: PathBuf,
    },

    /// Create a dataset from staged files
    ///
    /// The request file (TOML, or JSON with a .json suffix) describes the
    /// dataset metadata and one entry per staged file.
    Ingest {
        /// Path to the ingestion request
        request: PathBuf,

        /// Path to the uploading user's profile (TOML)
        #[arg(short, long)]
        user_profile: PathBuf,

        /// Skip synchronization with the archival service
        #[arg(long)]
        no_sync: bool,
    },

    /// Publish a dataset to the archival service
    Sync {
        dataset_id: i64,
    },

    /// Export one dataset as a ZIP archive
    Export {
        dataset_id: i64,

        /// Add converted copies of every UVL file: json, xml, yaml
        #[arg(short, long)]
        format: Option<fmhub::convert::ExportFormat>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Downloading user id
        #[arg(long)]
        user: Option<i64>,

        /// Download cookie; repeated downloads with the same token count once
        #[arg(long)]
        token: Option<String>,
    },

    /// Export every synchronized dataset with DIMACS, Glencoe and SPLOT copies
    ExportAll {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List datasets
    List {
        /// Only datasets of this user
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Show a dataset and record a view
    Show {
        dataset_id: i64,

        /// Viewing user id
        #[arg(long)]
        user: Option<i64>,

        /// View cookie; repeated views with the same token count once
        #[arg(long)]
        token: Option<String>,
    },

    /// Find the dataset behind a DOI, following redirects
    Resolve {
        doi: String,
    },

    /// Rate a dataset from 1 to 5
    Rate {
        dataset_id: i64,

        user_id: i64,

        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        value: u8,
    },

    /// Delete a dataset, its files and its metadata
    Delete {
        dataset_id: i64,
    },

    /// DOI redirect management
    #[command(subcommand)]
    Redirect(RedirectCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "fmhub", "export", "4", "--format", "yaml", "-o", "out.zip",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Export { dataset_id, format, output, .. }) => {
                assert_eq!(dataset_id, 4);
                assert_eq!(format, Some(fmhub::convert::ExportFormat::Yaml));
                assert_eq!(output, PathBuf::from("out.zip"));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_rate_range() {
        assert!(Cli::try_parse_from(["fmhub", "rate", "1", "2", "6"]).is_err());
        assert!(Cli::try_parse_from(["fmhub", "rate", "1", "2", "5"]).is_ok());
    }
}
