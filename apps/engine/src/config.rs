use anyhow::{Context, Result};

/// Engine configuration loaded from environment variables.
///
/// `DATABASE_URL` is required for anything that touches the persona store;
/// the pattern/rule overrides are optional and fall back to the built-in
/// Korean/English defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Path to a JSON rule set. Unset ⇒ the built-in seed rules.
    pub rules_path: Option<String>,
    /// Path to a JSON lexicon. Unset ⇒ the built-in Korean/English lexicon.
    pub lexicon_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            rules_path: std::env::var("RULES_PATH").ok(),
            lexicon_path: std::env::var("LEXICON_PATH").ok(),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
