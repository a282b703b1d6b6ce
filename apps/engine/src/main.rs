use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use engine::config::Config;
use engine::models::{ImpactRule, PersonaState};
use engine::persona::PersonaStore;
use engine::rules::{default_rule_set, load_rule_set};
use engine::{adjust_persona, extract_signals, preview_adjustments};
use engine::{Lexicon, PgPersonaStore, RuleEngine};

#[derive(Parser)]
#[command(name = "engine", version, about = "RFP signal extraction and persona adjustment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract pages, sections and signals from a document, as JSON on stdout.
    /// Needs no database.
    Extract {
        /// Plain-text document. Form feeds mark page breaks.
        file: PathBuf,
        /// Lexicon JSON replacing parts of the built-in Korean/English one.
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Run the full pipeline against a stored persona and commit the result.
    Adjust {
        /// Plain-text document. Form feeds mark page breaks.
        file: PathBuf,
        /// Persona to adjust.
        #[arg(long)]
        persona: Uuid,
        /// Document id recorded in the audit trail. Random if omitted.
        #[arg(long)]
        document: Option<Uuid>,
        /// Rule set JSON replacing the built-in seed rules.
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Lexicon JSON replacing parts of the built-in Korean/English one.
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// Print the would-be outcome without committing anything.
        #[arg(long)]
        dry_run: bool,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Create a persona with default state and print its id.
    CreatePersona {
        /// Persona id. Random if omitted.
        #[arg(long)]
        persona: Option<Uuid>,
        /// Display name.
        #[arg(long, default_value = "기본 평가자")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Extract {
            file,
            lexicon,
            pretty,
        } => {
            // Pure extraction: lexicon override comes from the flag or the
            // environment, no Config (and no DATABASE_URL) needed.
            let lexicon = load_lexicon(lexicon.or_else(env_lexicon_path))?;
            let text = read_document(&file)?;
            let outcome = extract_signals(&text, &lexicon);
            print_json(&outcome, pretty)
        }
        Command::Adjust {
            file,
            persona,
            document,
            rules,
            lexicon,
            dry_run,
            pretty,
        } => {
            let config = Config::from_env()?;
            let lexicon =
                load_lexicon(lexicon.or_else(|| config.lexicon_path.clone().map(PathBuf::from)))?;
            let rules = load_rules(rules.or_else(|| config.rules_path.clone().map(PathBuf::from)))?;
            let engine = RuleEngine::new(rules, &lexicon);

            let store = PgPersonaStore::connect(&config.database_url).await?;
            store.ensure_schema().await?;

            let text = read_document(&file)?;
            let extraction = extract_signals(&text, &lexicon);
            let document_id = document.unwrap_or_else(Uuid::new_v4);

            if dry_run {
                let outcome =
                    preview_adjustments(&store, &engine, persona, document_id, &extraction.signals)
                        .await?;
                info!(
                    adjustments = outcome.adjustments.len(),
                    "dry run, nothing committed"
                );
                print_json(&outcome, pretty)
            } else {
                let adjustments =
                    adjust_persona(&store, &engine, persona, document_id, &extraction.signals)
                        .await?;
                print_json(&adjustments, pretty)
            }
        }
        Command::CreatePersona { persona, name } => {
            let config = Config::from_env()?;
            let store = PgPersonaStore::connect(&config.database_url).await?;
            store.ensure_schema().await?;

            let persona_id = persona.unwrap_or_else(Uuid::new_v4);
            store
                .create(persona_id, &name, &PersonaState::default())
                .await?;
            info!(%persona_id, name, "persona created");
            println!("{persona_id}");
            Ok(())
        }
    }
}

fn env_lexicon_path() -> Option<PathBuf> {
    std::env::var("LEXICON_PATH").ok().map(PathBuf::from)
}

fn load_lexicon(path: Option<PathBuf>) -> Result<Lexicon> {
    match path {
        Some(path) => Lexicon::from_path(&path),
        None => Ok(Lexicon::default()),
    }
}

fn load_rules(path: Option<PathBuf>) -> Result<Vec<ImpactRule>> {
    match path {
        Some(path) => load_rule_set(&path),
        None => Ok(default_rule_set()),
    }
}

fn read_document(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read document {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
