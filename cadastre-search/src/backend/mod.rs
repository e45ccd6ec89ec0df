//! Accès au backend cadastre (géocodage, parcelles)

pub mod http;

use std::future::Future;

use geojson::{Feature, FeatureCollection};

use crate::types::GeocodeResult;
use crate::BackendError;

pub use http::{BackendConfig, HttpBackend};

/// Backend consommé par les composants de recherche.
///
/// Les implémentations renvoient les données brutes ; la transformation en
/// [`crate::Parcel`] / [`crate::AddressSuggestion`] reste du ressort des
/// composants. Un 404 est signalé par [`BackendError::NotFound`].
pub trait CadastreBackend: Send + Sync {
    /// Géocode une adresse libre, au plus `limit` résultats
    fn geocode(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<GeocodeResult>, BackendError>> + Send;

    /// Toutes les parcelles d'une commune (code INSEE sur 5 caractères)
    fn parcels_by_municipality(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<FeatureCollection, BackendError>> + Send;

    /// La parcelle contenant le point (lon, lat)
    fn parcel_at(
        &self,
        lon: f64,
        lat: f64,
    ) -> impl Future<Output = Result<Feature, BackendError>> + Send;

    /// Une parcelle par sa référence (section et numéro déjà normalisés)
    fn parcel_by_reference(
        &self,
        code: &str,
        section: &str,
        number: &str,
    ) -> impl Future<Output = Result<Feature, BackendError>> + Send;

    /// Les sections cadastrales d'une commune
    fn sections(&self, code: &str) -> impl Future<Output = Result<Vec<String>, BackendError>> + Send;
}
