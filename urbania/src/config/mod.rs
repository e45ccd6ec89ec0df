//! Configuration du client
//!
//! Priorité : valeurs par défaut < variables d'environnement < fichier JSON
//! (`--config`) < options de la ligne de commande.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use cadastre_search::autocomplete::DEFAULT_QUIET_PERIOD;
use cadastre_search::BackendConfig;
use serde::{Deserialize, Serialize};

/// Fichier de configuration JSON, tous les champs optionnels
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// URL de base de l'API (ex: "https://api.urbania.fr/api")
    pub api_url: Option<String>,

    /// Jeton Bearer
    pub api_token: Option<String>,

    /// Timeout HTTP en secondes (absent = pas de timeout)
    pub timeout_secs: Option<u64>,

    pub user_agent: Option<String>,

    /// Période de silence de l'autocomplétion, en millisecondes
    pub debounce_ms: Option<u64>,
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Configuration du backend : environnement, puis fichier par-dessus
    pub fn backend_config(&self) -> BackendConfig {
        self.apply(BackendConfig::from_env())
    }

    fn apply(&self, mut base: BackendConfig) -> BackendConfig {
        if let Some(url) = &self.api_url {
            base.base_url = url.clone();
        }
        if let Some(token) = &self.api_token {
            base.token = Some(token.clone());
        }
        if let Some(secs) = self.timeout_secs {
            base.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(user_agent) = &self.user_agent {
            base.user_agent = user_agent.clone();
        }
        base
    }

    /// Période de silence de l'autocomplétion
    pub fn quiet_period(&self) -> Duration {
        self.debounce_ms
            .or_else(|| {
                std::env::var("URBANIA_DEBOUNCE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_QUIET_PERIOD)
    }
}
