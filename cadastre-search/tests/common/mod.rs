//! Backend de test en mémoire

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cadastre_search::{BackendError, CadastreBackend, GeocodeResult};
use geojson::{Feature, FeatureCollection};
use serde_json::json;
use tokio::sync::Notify;

/// Réponse scriptée
#[derive(Clone)]
pub enum Reply {
    Features(Vec<Feature>),
    Geocode(Vec<GeocodeResult>),
    Sections(Vec<String>),
    NotFound,
    Fail(u16, Option<String>),
}

#[derive(Default)]
pub struct FakeBackend {
    /// Appels reçus, dans l'ordre ("geocode:abcd", "municipality:38185", "point:5,45"...)
    calls: Mutex<Vec<String>>,
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, key: &str, reply: Reply) -> &Self {
        self.replies.lock().unwrap().insert(key.to_string(), reply);
        self
    }

    /// La réponse à `key` attend `notify_one()` sur le `Notify` renvoyé
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, key: String) -> Result<Reply, BackendError> {
        self.calls.lock().unwrap().push(key.clone());
        let gate = self.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::NotFound) | None => Err(BackendError::NotFound),
            Some(Reply::Fail(status, message)) => Err(BackendError::status(status, message)),
            Some(other) => Ok(other),
        }
    }
}

impl CadastreBackend for FakeBackend {
    async fn geocode(&self, query: &str, limit: usize) -> Result<Vec<GeocodeResult>, BackendError> {
        assert_eq!(limit, 5, "geocoder must be asked for 5 results");
        match self.answer(format!("geocode:{}", query)).await? {
            Reply::Geocode(results) => Ok(results),
            _ => Ok(Vec::new()),
        }
    }

    async fn parcels_by_municipality(&self, code: &str) -> Result<FeatureCollection, BackendError> {
        match self.answer(format!("municipality:{}", code)).await? {
            Reply::Features(features) => Ok(collection(features)),
            _ => Ok(collection(Vec::new())),
        }
    }

    async fn parcel_at(&self, lon: f64, lat: f64) -> Result<Feature, BackendError> {
        match self.answer(format!("point:{},{}", lon, lat)).await? {
            Reply::Features(mut features) if !features.is_empty() => Ok(features.remove(0)),
            _ => Err(BackendError::NotFound),
        }
    }

    async fn parcel_by_reference(
        &self,
        code: &str,
        section: &str,
        number: &str,
    ) -> Result<Feature, BackendError> {
        match self
            .answer(format!("reference:{}/{}/{}", code, section, number))
            .await?
        {
            Reply::Features(mut features) if !features.is_empty() => Ok(features.remove(0)),
            _ => Err(BackendError::NotFound),
        }
    }

    async fn sections(&self, code: &str) -> Result<Vec<String>, BackendError> {
        match self.answer(format!("sections:{}", code)).await? {
            Reply::Sections(sections) => Ok(sections),
            _ => Ok(Vec::new()),
        }
    }
}

pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Parcelle carrée (côté 0.0002°) centrée sur (lon, lat)
pub fn parcel_feature(id: &str, section: &str, numero: &str, lon: f64, lat: f64) -> Feature {
    let h = 0.0001;
    serde_json::from_value(json!({
        "type": "Feature",
        "properties": {
            "id": id,
            "commune": "38185",
            "section": section,
            "numero": numero,
            "contenance": 400
        },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [lon - h, lat - h],
                [lon + h, lat - h],
                [lon + h, lat + h],
                [lon - h, lat + h],
                [lon - h, lat - h]
            ]]
        }
    }))
    .unwrap()
}

pub fn geocode_result(label: &str, citycode: &str, lon: f64, lat: f64) -> GeocodeResult {
    GeocodeResult {
        label: label.to_string(),
        postcode: "38000".to_string(),
        city: "Grenoble".to_string(),
        citycode: citycode.to_string(),
        longitude: Some(lon),
        latitude: Some(lat),
        score: 0.9,
    }
}
