//! Bulk maintenance of the foods collection: connectivity check, import from
//! the JSON fixture and destroy-all.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::foods::normalize::normalize_all;

pub mod fixture;
pub mod prompt;
pub mod store;
pub mod summary;

use fixture::load_fixture;
use prompt::{is_confirmed, ConfirmationPrompt, CONFIRMATION_WORD};
use store::FoodStore;
use summary::ImportSummary;

/// Number of foods shown in the post-import sample.
pub const SAMPLE_SIZE: i64 = 3;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("fixture file not found: {}", .0.display())]
    FixtureMissing(PathBuf),
    #[error("cannot read fixture {}: {source}", path.display())]
    FixtureRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("fixture {} is not valid JSON: {source}", path.display())]
    FixtureParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("fixture {} must contain a JSON array", .0.display())]
    FixtureNotArray(PathBuf),
    #[error("fixture {} is empty", .0.display())]
    FixtureEmpty(PathBuf),
    #[error("database error: {0:#}")]
    Database(anyhow::Error),
    #[error("could not read confirmation: {0}")]
    Prompt(std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub deleted: u64,
    pub inserted: u64,
    pub warnings: usize,
    pub summary: ImportSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Cancelled,
    Deleted(u64),
}

/// `true` when the database answers a query. The database listing that
/// follows is diagnostics only and never changes the outcome.
pub async fn check_connectivity(store: &dyn FoodStore) -> bool {
    if let Err(e) = store.ping().await {
        error!(error = %format!("{e:#}"), "database connection check failed");
        return false;
    }
    info!("database connection ok");

    match store.list_databases().await {
        Ok(dbs) => {
            for d in &dbs {
                info!(name = %d.name, size_bytes = ?d.size_bytes, "database");
            }
        }
        Err(e) => warn!(error = %format!("{e:#}"), "could not list databases"),
    }
    true
}

/// Replace every food with the normalized contents of the fixture at `path`.
///
/// The fixture is fully read and normalized before the store is touched.
pub async fn import_foods(
    store: &dyn FoodStore,
    path: &Path,
    now: OffsetDateTime,
) -> Result<ImportReport, SeedError> {
    let raws = load_fixture(path).await?;
    info!(path = %path.display(), records = raws.len(), "fixture loaded");

    let (foods, warnings) = normalize_all(&raws, now);
    for w in &warnings {
        warn!(index = w.index(), "{w}");
    }

    let outcome = store.replace_all(&foods).await.map_err(SeedError::Database)?;
    info!(
        deleted = outcome.deleted,
        inserted = outcome.inserted,
        "foods imported"
    );

    let summary = store
        .summary(SAMPLE_SIZE)
        .await
        .map_err(SeedError::Database)?;

    Ok(ImportReport {
        deleted: outcome.deleted,
        inserted: outcome.inserted,
        warnings: warnings.len(),
        summary,
    })
}

/// Delete every food once `prompt` answers with the confirmation word.
pub async fn destroy_foods(
    store: &dyn FoodStore,
    prompt: &mut dyn ConfirmationPrompt,
) -> Result<DestroyOutcome, SeedError> {
    let question = format!(
        "This will delete ALL foods. Type {CONFIRMATION_WORD} to confirm: "
    );
    let answer = prompt.ask(&question).await.map_err(SeedError::Prompt)?;
    if !is_confirmed(&answer) {
        info!("deletion cancelled");
        return Ok(DestroyOutcome::Cancelled);
    }

    let deleted = store.delete_all().await.map_err(SeedError::Database)?;
    info!(deleted, "foods deleted");
    Ok(DestroyOutcome::Deleted(deleted))
}
