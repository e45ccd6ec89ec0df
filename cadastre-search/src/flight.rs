//! Une seule requête en vol par composant
//!
//! Chaque appel à [`SingleFlight::run`] prend un numéro de génération et
//! annule la requête précédente via son `AbortHandle`. Un résultat dont la
//! génération n'est plus la courante est jeté : seul le dernier appel est
//! observable.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use futures::future::{AbortHandle, Abortable};

/// Issue d'une requête soumise à [`SingleFlight`]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// La requête est la plus récente et a abouti
    Ready(T),
    /// Une requête plus récente l'a remplacée ; son résultat n'est pas observable
    Superseded,
}

impl<T> Outcome<T> {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }

    /// Retourne la valeur si la requête n'a pas été remplacée
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Superseded => None,
        }
    }
}

/// Créneau "requête courante" d'un composant
#[derive(Debug, Default)]
pub struct SingleFlight {
    generation: AtomicU64,
    current: Mutex<Option<AbortHandle>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalide la requête en vol sans en lancer une nouvelle
    pub fn cancel(&self) {
        let mut current = self.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = current.take() {
            handle.abort();
        }
    }

    /// Exécute `fut` comme nouvelle requête courante
    pub async fn run<F: Future>(&self, fut: F) -> Outcome<F::Output> {
        let (handle, registration) = AbortHandle::new_pair();

        let ticket = {
            let mut current = self.lock();
            if let Some(previous) = current.replace(handle) {
                previous.abort();
            }
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let result = Abortable::new(fut, registration).await;

        let mut current = self.lock();
        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "Dropping superseded result");
            return Outcome::Superseded;
        }
        current.take();

        match result {
            Ok(value) => Outcome::Ready(value),
            Err(_aborted) => Outcome::Superseded,
        }
    }

    /// Génération courante (incrémentée à chaque `run` ou `cancel`)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_single_request_is_ready() {
        let flight = SingleFlight::new();
        let outcome = flight.run(async { 42 }).await;
        assert_eq!(outcome, Outcome::Ready(42));
    }

    #[tokio::test]
    async fn test_newer_request_supersedes_older() {
        let flight = SingleFlight::new();
        let (tx, rx) = oneshot::channel::<&'static str>();

        let first = flight.run(async move { rx.await.unwrap_or("closed") });
        let second = async {
            tokio::task::yield_now().await;
            let outcome = flight.run(async { "second" }).await;
            // Le premier est déjà annulé : cette valeur ne doit jamais être observée
            let _ = tx.send("first");
            outcome
        };

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Outcome::Superseded);
        assert_eq!(b, Outcome::Ready("second"));
    }

    #[tokio::test]
    async fn test_cancel_discards_in_flight() {
        let flight = SingleFlight::new();
        let (_tx, rx) = oneshot::channel::<u8>();

        let pending = flight.run(async move { rx.await.ok() });
        let cancel = async {
            tokio::task::yield_now().await;
            flight.cancel();
        };

        let (outcome, ()) = tokio::join!(pending, cancel);
        assert!(outcome.is_superseded());
        assert_eq!(flight.generation(), 2);
    }
}
