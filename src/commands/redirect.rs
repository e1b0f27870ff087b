// src/commands/redirect.rs

//! DOI lookup and redirect commands

use super::HubContext;
use anyhow::Result;
use fmhub::db::models::{DoiLookup, DoiRedirect, lookup_by_doi};

/// Resolve a DOI to a dataset, following redirects
pub fn cmd_resolve(ctx: &HubContext, doi: &str) -> Result<()> {
    let conn = ctx.open()?;

    let dataset = match lookup_by_doi(&conn, doi)? {
        DoiLookup::Found(dataset) => dataset,
        DoiLookup::Redirect(new_doi) => {
            println!("{} redirects to {}", doi, new_doi);
            match lookup_by_doi(&conn, &new_doi)? {
                DoiLookup::Found(dataset) => dataset,
                DoiLookup::Redirect(_) => {
                    anyhow::bail!("Redirect target {} is itself redirected", new_doi)
                }
            }
        }
    };

    match dataset.id {
        Some(id) => println!("Dataset {} (user {})", id, dataset.user_id),
        None => println!("Dataset of user {}", dataset.user_id),
    }
    Ok(())
}

pub fn cmd_redirect_list(ctx: &HubContext) -> Result<()> {
    let conn = ctx.open()?;
    let redirects = DoiRedirect::list_all(&conn)?;

    if redirects.is_empty() {
        println!("No DOI redirects configured.");
        return Ok(());
    }

    println!("DOI Redirects:");
    println!("{}", "-".repeat(70));
    for redirect in &redirects {
        println!("{} -> {}", redirect.old_doi, redirect.new_doi);
    }
    println!("{}", "-".repeat(70));
    println!("{} redirect(s) total", redirects.len());
    Ok(())
}

pub fn cmd_redirect_add(ctx: &HubContext, old_doi: &str, new_doi: &str) -> Result<()> {
    if old_doi == new_doi {
        anyhow::bail!("A DOI cannot redirect to itself");
    }
    let conn = ctx.open()?;

    DoiRedirect::new(old_doi, new_doi).insert(&conn)?;
    println!("Added redirect: {} -> {}", old_doi, new_doi);
    Ok(())
}
