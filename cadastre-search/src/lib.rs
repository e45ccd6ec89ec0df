//! # cadastre-search
//!
//! Recherche de parcelles cadastrales et autocomplétion d'adresses pour le
//! parcours de déclaration préalable Urbania.
//!
//! ## Features
//!
//! - Recherche de parcelles par commune ou par point, classées par distance
//!   (Haversine) au centroïde de chaque parcelle
//! - Autocomplétion d'adresse avec anti-rebond (300 ms)
//! - Une seule requête en vol par composant : la dernière gagne
//! - Client HTTP `reqwest` vers l'API Urbania, backend remplaçable via
//!   [`CadastreBackend`]
//! - Export GeoJSON des résultats
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cadastre_search::{BackendConfig, HttpBackend, Outcome, ParcelleProximitySearch};
//!
//! let backend = Arc::new(HttpBackend::new(&BackendConfig::from_env())?);
//! let search = ParcelleProximitySearch::new(backend);
//!
//! let target = geo::Point::new(5.7266, 45.1875);
//! if let Outcome::Ready(parcels) = search.search("38185", Some(target)).await? {
//!     for p in &parcels {
//!         println!("{} ({} m²)", p.reference(), p.area);
//!     }
//! }
//! ```

pub mod autocomplete;
pub mod backend;
pub mod error;
pub mod export;
pub mod flight;
pub mod form;
pub mod geometry;
pub mod ranking;
pub mod search;
pub mod types;

pub use autocomplete::{AddressAutocomplete, AutocompleteState};
pub use backend::{BackendConfig, CadastreBackend, HttpBackend};
pub use error::{BackendError, SearchError, ADDRESS_SEARCH_FAILED, PARCEL_SEARCH_FAILED};
pub use export::{export_to_geojson, ExportError};
pub use flight::{Outcome, SingleFlight};
pub use form::{FieldError, LocationField, LocationForm};
pub use search::{validate_municipality_code, ParcelleProximitySearch};
pub use types::{AddressSuggestion, GeocodeResult, Parcel};
