// src/cli/redirect.rs
//! DOI redirect management commands

use clap::Subcommand;

#[derive(Subcommand)]
pub enum RedirectCommands {
    /// List all DOI redirects
    List,

    /// Map a retired DOI to its replacement
    ///
    /// Resolving the old DOI afterwards yields the new one instead of a
    /// dataset.
    Add {
        /// DOI that should no longer resolve directly
        old_doi: String,

        /// DOI to redirect to
        new_doi: String,
    },
}
