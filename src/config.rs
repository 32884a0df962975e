use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub public_url: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Booklist REST API for books, movies and shows")]
pub struct Args {
    /// Host to bind to (overrides BOOKLIST_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BOOKLIST_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides BOOKLIST_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Base URL used in Location headers (overrides BOOKLIST_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args, |key| env::var(key))?, migrate))
    }

    /// CLI values win over environment values, which win over defaults.
    pub fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = lookup("BOOKLIST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match lookup("BOOKLIST_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BOOKLIST_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 4567,
            Err(err) => return Err(err).context("reading BOOKLIST_PORT"),
        };
        let env_db = lookup("BOOKLIST_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/booklist.db".into());
        let env_public = lookup("BOOKLIST_PUBLIC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            public_url: args.public_url.or(env_public),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
