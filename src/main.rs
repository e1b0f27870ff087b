// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::io;

mod cli;
mod commands;

use cli::{Cli, Commands, RedirectCommands};
use commands::HubContext;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("fmhub v{}", env!("CARGO_PKG_VERSION"));
        println!("Run 'fmhub --help' for usage information");
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "fmhub", &mut io::stdout());
        return Ok(());
    }

    let ctx = HubContext::load(&cli.config)?;

    match command {
        Commands::Init => commands::cmd_init(&ctx),
        Commands::Stage { user, file } => commands::cmd_stage(&ctx, user, &file),
        Commands::Ingest {
            request,
            user_profile,
            no_sync,
        } => commands::cmd_ingest(&ctx, &request, &user_profile, no_sync),
        Commands::Sync { dataset_id } => commands::cmd_sync(&ctx, dataset_id),
        Commands::Export {
            dataset_id,
            format,
            output,
            user,
            token,
        } => commands::cmd_export(&ctx, dataset_id, format, &output, user, token.as_deref()),
        Commands::ExportAll { output } => commands::cmd_export_all(&ctx, &output),
        Commands::List { user } => commands::cmd_list(&ctx, user),
        Commands::Show {
            dataset_id,
            user,
            token,
        } => commands::cmd_show(&ctx, dataset_id, user, token.as_deref()),
        Commands::Resolve { doi } => commands::cmd_resolve(&ctx, &doi),
        Commands::Rate {
            dataset_id,
            user_id,
            value,
        } => commands::cmd_rate(&ctx, dataset_id, user_id, value),
        Commands::Delete { dataset_id } => commands::cmd_delete(&ctx, dataset_id),
        Commands::Redirect(RedirectCommands::List) => commands::cmd_redirect_list(&ctx),
        Commands::Redirect(RedirectCommands::Add { old_doi, new_doi }) => {
            commands::cmd_redirect_add(&ctx, &old_doi, &new_doi)
        }
        Commands::Completions { .. } => Ok(()),
    }
}
