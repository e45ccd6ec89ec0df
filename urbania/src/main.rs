//! Point d'entrée CLI pour urbania

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;

use cadastre_search::HttpBackend;
use cli::{Commands, Session};
use config::Config;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Rechercher adresses et parcelles cadastrales via l'API Urbania
#[derive(Parser)]
#[command(name = "urbania")]
#[command(author, version)]
#[command(about = "Rechercher adresses et parcelles cadastrales pour une déclaration préalable")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sortie JSON
    #[arg(long, global = true)]
    json: bool,

    /// Fichier de configuration JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// URL de l'API (défaut : env URBANIA_API_URL / http://localhost:8010/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Jeton Bearer (défaut : env URBANIA_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut backend_config = config.backend_config();
    if let Some(url) = cli.api_url {
        backend_config.base_url = url;
    }
    if let Some(token) = cli.token {
        backend_config.token = Some(token);
    }
    debug!(base_url = %backend_config.base_url, timeout = ?backend_config.timeout, "Backend configured");

    let backend = HttpBackend::new(&backend_config).context("Failed to build HTTP client")?;
    let session = Session::new(backend, config.quiet_period(), cli.json);

    cli::run(&session, cli.command).await
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
