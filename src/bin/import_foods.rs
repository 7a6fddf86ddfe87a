//! Maintenance tool for the foods collection.
//!
//! `--test` checks connectivity, `--import` replaces every food with the
//! fixture contents and `--delete` removes them all after confirmation.

use std::{path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, ArgGroup, CommandFactory, Parser};
use time::OffsetDateTime;

use food_ordering_api::{
    config::ImportConfig,
    seed::{
        self,
        prompt::{ConfirmationPrompt, PresetAnswer, StdinPrompt},
        store::{FoodStore, PgFoodStore},
        DestroyOutcome,
    },
    telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "import-foods")]
#[command(about = "Import, delete or check the food catalogue")]
#[command(version)]
#[command(group(ArgGroup::new("action").args(["import", "delete", "test"]).multiple(false)))]
struct Cli {
    /// Replace all foods with the fixture contents
    #[arg(long)]
    import: bool,

    /// Delete all foods (asks for confirmation)
    #[arg(long)]
    delete: bool,

    /// Only check that the database is reachable
    #[arg(long)]
    test: bool,

    /// Fixture to import instead of FOOD_FIXTURE_PATH
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Skip the confirmation prompt of --delete
    #[arg(long, requires = "delete")]
    yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Import,
    Delete,
    Test,
}

impl Cli {
    fn action(&self) -> Option<Action> {
        if self.import {
            Some(Action::Import)
        } else if self.delete {
            Some(Action::Delete)
        } else if self.test {
            Some(Action::Test)
        } else {
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init_tracing("food_ordering_api=info,import_foods=info");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let Some(action) = cli.action() else {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::FAILURE;
    };

    let config = match ImportConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let store = match PgFoodStore::connect(&config.database_url, config.connect_timeout).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "database connection failed");
            return ExitCode::FAILURE;
        }
    };

    if action != Action::Test {
        if let Err(e) = store.ensure_schema().await {
            tracing::error!(error = %format!("{e:#}"), "could not prepare database schema");
            store.close().await;
            return ExitCode::FAILURE;
        }
    }

    let code = match action {
        Action::Test => {
            if seed::check_connectivity(&store).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Action::Import => {
            let path = cli.file.clone().unwrap_or(config.fixture_path.clone());
            run_import(&store, path).await
        }
        Action::Delete => {
            let mut prompt: Box<dyn ConfirmationPrompt> = if cli.yes {
                Box::new(PresetAnswer::confirm())
            } else {
                Box::new(StdinPrompt)
            };
            run_delete(&store, prompt.as_mut()).await
        }
    };

    store.close().await;
    code
}

async fn run_import(store: &dyn FoodStore, path: PathBuf) -> ExitCode {
    if !seed::check_connectivity(store).await {
        return ExitCode::FAILURE;
    }
    match seed::import_foods(store, &path, OffsetDateTime::now_utc()).await {
        Ok(report) => {
            println!("{}", report.summary);
            if report.warnings > 0 {
                println!("{} record(s) repaired during import", report.warnings);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "import failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_delete(store: &dyn FoodStore, prompt: &mut dyn ConfirmationPrompt) -> ExitCode {
    match seed::destroy_foods(store, prompt).await {
        Ok(DestroyOutcome::Cancelled) => {
            println!("Deletion cancelled");
            ExitCode::SUCCESS
        }
        Ok(DestroyOutcome::Deleted(n)) => {
            println!("Deleted {n} food(s)");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "delete failed");
            ExitCode::FAILURE
        }
    }
}
