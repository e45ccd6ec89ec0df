//! Autocomplétion d'adresse (recherche à la frappe)
//!
//! Une recherche part quand la saisie fait au moins 3 caractères et n'a pas
//! bougé pendant la période de silence (300 ms par défaut). Une rafale de
//! frappes ne produit qu'une requête, pour la dernière valeur.
//!
//! [`AddressAutocomplete::set_query`] lance une tâche tokio : il doit être
//! appelé depuis un runtime tokio.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::CadastreBackend;
use crate::flight::{Outcome, SingleFlight};
use crate::{AddressSuggestion, SearchError, ADDRESS_SEARCH_FAILED};

/// Longueur minimale d'une requête
pub const MIN_QUERY_LEN: usize = 3;

/// Nombre de suggestions demandées au backend
pub const MAX_SUGGESTIONS: usize = 5;

/// Période de silence par défaut
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// État observable de l'autocomplétion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutocompleteState {
    pub query: String,
    pub suggestions: Vec<AddressSuggestion>,
    pub is_loading: bool,
    /// Message du dernier échec, effacé à la recherche suivante
    pub error: Option<String>,
}

struct Shared<B> {
    backend: Arc<B>,
    flight: SingleFlight,
    state: Mutex<AutocompleteState>,
}

impl<B: CadastreBackend> Shared<B> {
    fn state(&self) -> MutexGuard<'_, AutocompleteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn search(&self, query: &str) -> Result<Outcome<Vec<AddressSuggestion>>, SearchError> {
        let outcome = self
            .flight
            .run(self.backend.geocode(query, MAX_SUGGESTIONS))
            .await;

        match outcome {
            Outcome::Superseded => Ok(Outcome::Superseded),
            Outcome::Ready(Ok(results)) => Ok(Outcome::Ready(
                results
                    .into_iter()
                    .filter_map(AddressSuggestion::from_geocode)
                    .collect(),
            )),
            Outcome::Ready(Err(e)) => {
                warn!(query, error = %e, "Address search failed");
                Err(SearchError::from_backend(&e, ADDRESS_SEARCH_FAILED))
            }
        }
    }

    /// Recherche puis applique le résultat à l'état, sauf si remplacée
    async fn search_and_apply(
        &self,
        query: &str,
    ) -> Result<Outcome<Vec<AddressSuggestion>>, SearchError> {
        {
            let mut state = self.state();
            state.query = query.to_string();
            state.is_loading = true;
            state.error = None;
        }

        let result = self.search(query).await;

        let mut state = self.state();
        match &result {
            Ok(Outcome::Superseded) => {}
            Ok(Outcome::Ready(suggestions)) => {
                debug!(query, count = suggestions.len(), "Suggestions received");
                state.suggestions = suggestions.clone();
                state.is_loading = false;
            }
            Err(e) => {
                state.suggestions.clear();
                state.error = Some(e.message().to_string());
                state.is_loading = false;
            }
        }
        drop(state);
        result
    }

    /// Saisie trop courte : plus de requête en vol, suggestions vidées
    fn reset(&self, query: String) {
        let mut state = self.state();
        self.flight.cancel();
        state.query = query;
        state.suggestions.clear();
        state.is_loading = false;
    }
}

/// Autocomplétion d'adresse avec anti-rebond et une requête en vol au plus
pub struct AddressAutocomplete<B> {
    shared: Arc<Shared<B>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    quiet_period: Duration,
}

impl<B: CadastreBackend + 'static> AddressAutocomplete<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_quiet_period(backend, DEFAULT_QUIET_PERIOD)
    }

    pub fn with_quiet_period(backend: Arc<B>, quiet_period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                flight: SingleFlight::new(),
                state: Mutex::new(AutocompleteState::default()),
            }),
            pending: Mutex::new(None),
            quiet_period,
        }
    }

    /// Met à jour la saisie (à chaque frappe).
    ///
    /// Une saisie trop courte vide les suggestions immédiatement, sans appel
    /// réseau. Sinon une recherche est programmée après la période de silence.
    /// Chaque frappe annule aussitôt la recherche programmée ou en vol : une
    /// réponse qui arriverait pendant la période de silence n'est pas affichée.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut pending = self.pending();
        if let Some(task) = pending.take() {
            task.abort();
        }

        if query.chars().count() < MIN_QUERY_LEN {
            self.shared.reset(query);
            return;
        }
        self.shared.state().query = query.clone();

        let shared = Arc::clone(&self.shared);
        let quiet_period = self.quiet_period;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let _ = shared.search_and_apply(&query).await;
        }));
    }

    /// Recherche immédiate, sans anti-rebond.
    ///
    /// Remplace la recherche programmée ou en vol et met à jour l'état comme
    /// une recherche à la frappe.
    pub async fn search_now(
        &self,
        query: &str,
    ) -> Result<Outcome<Vec<AddressSuggestion>>, SearchError> {
        if let Some(task) = self.pending().take() {
            task.abort();
        }

        if query.chars().count() < MIN_QUERY_LEN {
            self.shared.reset(query.to_string());
            return Ok(Outcome::Ready(Vec::new()));
        }
        self.shared.search_and_apply(query).await
    }

    /// Instantané de l'état courant
    pub fn snapshot(&self) -> AutocompleteState {
        self.shared.state().clone()
    }

    pub fn suggestions(&self) -> Vec<AddressSuggestion> {
        self.shared.state().suggestions.clone()
    }

    pub fn query(&self) -> String {
        self.shared.state().query.clone()
    }

    /// Vide suggestions et erreur (la saisie est conservée)
    pub fn clear(&self) {
        let mut state = self.shared.state();
        state.suggestions.clear();
        state.error = None;
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<B> Drop for AddressAutocomplete<B> {
    fn drop(&mut self) {
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = pending.take() {
            task.abort();
        }
        self.shared.flight.cancel();
    }
}
