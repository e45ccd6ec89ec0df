//! Types d'erreurs pour le crate cadastre-search

use thiserror::Error;

/// Message affiché quand la recherche cadastrale échoue sans message du backend
pub const PARCEL_SEARCH_FAILED: &str = "Erreur lors de la recherche cadastrale";

/// Message affiché quand la recherche d'adresse échoue sans message du backend
pub const ADDRESS_SEARCH_FAILED: &str = "Erreur lors de la recherche d'adresse";

/// Erreurs remontées à l'appelant par les composants de recherche
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Entrée invalide (code commune mal formé), détectée avant tout appel réseau
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Le backend a échoué pour une autre raison qu'une annulation ou un "not found"
    #[error("Search failed: {message}")]
    SearchFailed { message: String },
}

impl SearchError {
    /// Crée une erreur d'échec de recherche
    pub fn search_failed(message: impl Into<String>) -> Self {
        Self::SearchFailed {
            message: message.into(),
        }
    }

    /// Convertit une erreur backend en message lisible.
    ///
    /// Le message du backend est repris tel quel quand il existe, sinon `fallback`.
    pub fn from_backend(err: &BackendError, fallback: &str) -> Self {
        match err {
            BackendError::Status {
                message: Some(message),
                ..
            } => Self::search_failed(message.clone()),
            _ => Self::search_failed(fallback),
        }
    }

    /// Message à afficher à l'utilisateur
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(msg) => msg,
            Self::SearchFailed { message } => message,
        }
    }
}

/// Erreurs de transport vers le backend cadastre
#[derive(Debug, Error)]
pub enum BackendError {
    /// Ressource absente (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// Réponse non-2xx, avec le message `{"error": "..."}` du backend si présent
    #[error("Backend returned {status}: {}", message.as_deref().unwrap_or("<no message>"))]
    Status { status: u16, message: Option<String> },

    /// Erreur réseau ou client HTTP
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Corps de réponse illisible
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Configuration du client invalide (URL, token)
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// Crée une erreur de statut HTTP
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self::Status { status, message }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
