//! Recherche de parcelles par proximité
//!
//! Étapes d'une recherche :
//! 1. validation du code commune (5 caractères), avant tout appel réseau
//! 2. remplacement de la requête en vol ([`SingleFlight`])
//! 3. recherche par point si une cible est fournie, sinon par commune
//! 4. conversion des features en [`Parcel`]
//! 5. classement par distance (5 plus proches) ou troncature (10 premières)

use std::sync::Arc;

use geo::Point;
use tracing::{debug, info, warn};

use crate::backend::CadastreBackend;
use crate::flight::{Outcome, SingleFlight};
use crate::ranking;
use crate::types::{canonical_number, canonical_section};
use crate::{BackendError, Parcel, SearchError, PARCEL_SEARCH_FAILED};

/// Longueur d'un code INSEE
pub const MUNICIPALITY_CODE_LEN: usize = 5;

/// Vérifie qu'un code commune a exactement 5 caractères
pub fn validate_municipality_code(code: &str) -> Result<(), SearchError> {
    let len = code.chars().count();
    if len != MUNICIPALITY_CODE_LEN {
        return Err(SearchError::InvalidInput(format!(
            "Code INSEE invalide: {:?} ({} caractères, {} attendus)",
            code, len, MUNICIPALITY_CODE_LEN
        )));
    }
    Ok(())
}

/// Composant de recherche de parcelles, une requête en vol à la fois
pub struct ParcelleProximitySearch<B> {
    backend: Arc<B>,
    flight: SingleFlight,
}

impl<B: CadastreBackend> ParcelleProximitySearch<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            flight: SingleFlight::new(),
        }
    }

    /// Recherche les parcelles d'une commune, classées par proximité à `target` (lon, lat).
    ///
    /// Un appel remplacé par un appel plus récent se termine en
    /// [`Outcome::Superseded`], jamais en erreur.
    pub async fn search(
        &self,
        municipality_code: &str,
        target: Option<Point>,
    ) -> Result<Outcome<Vec<Parcel>>, SearchError> {
        validate_municipality_code(municipality_code)?;

        match self.flight.run(self.fetch(municipality_code, target)).await {
            Outcome::Ready(result) => result.map(Outcome::Ready),
            Outcome::Superseded => {
                debug!(code = municipality_code, "Parcel search superseded");
                Ok(Outcome::Superseded)
            }
        }
    }

    /// Annule la recherche en vol (son appelant obtient `Superseded`)
    pub fn cancel(&self) {
        self.flight.cancel();
    }

    async fn fetch(&self, code: &str, target: Option<Point>) -> Result<Vec<Parcel>, SearchError> {
        let features = match target {
            Some(point) => match self.backend.parcel_at(point.x(), point.y()).await {
                Ok(feature) => vec![feature],
                Err(BackendError::NotFound) => {
                    info!(lon = point.x(), lat = point.y(), "No parcel at point");
                    Vec::new()
                }
                Err(e) => return Err(failed(e)),
            },
            None => self
                .backend
                .parcels_by_municipality(code)
                .await
                .map_err(failed)?
                .features,
        };

        let parcels = to_parcels(&features);
        let selected = ranking::select(parcels, target);
        info!(
            code,
            candidates = features.len(),
            returned = selected.len(),
            "Parcel search done"
        );
        Ok(selected)
    }

    /// Une parcelle par sa référence cadastrale. `None` si elle n'existe pas.
    pub async fn parcel_by_reference(
        &self,
        municipality_code: &str,
        section: &str,
        number: &str,
    ) -> Result<Option<Parcel>, SearchError> {
        validate_municipality_code(municipality_code)?;
        let section = canonical_section(section);
        let number = canonical_number(number);

        match self
            .backend
            .parcel_by_reference(municipality_code, &section, &number)
            .await
        {
            Ok(feature) => Parcel::from_feature(&feature).map(Some).map_err(failed),
            Err(BackendError::NotFound) => Ok(None),
            Err(e) => Err(failed(e)),
        }
    }

    /// Sections cadastrales d'une commune, triées et dédoublonnées
    pub async fn sections(&self, municipality_code: &str) -> Result<Vec<String>, SearchError> {
        validate_municipality_code(municipality_code)?;
        let mut sections = self
            .backend
            .sections(municipality_code)
            .await
            .map_err(failed)?;
        sections.sort();
        sections.dedup();
        Ok(sections)
    }
}

fn failed(err: BackendError) -> SearchError {
    warn!(error = %err, "Parcel lookup failed");
    SearchError::from_backend(&err, PARCEL_SEARCH_FAILED)
}

/// Convertit les features ; une feature illisible est ignorée avec un warning
fn to_parcels(features: &[geojson::Feature]) -> Vec<Parcel> {
    features
        .iter()
        .filter_map(|f| match Parcel::from_feature(f) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "Skipping malformed parcel feature");
                None
            }
        })
        .collect()
}
