//! Types de données pour le crate cadastre-search

use geo::{Geometry, LineString, Point, Polygon};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::BackendError;

/// Une parcelle cadastrale
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    /// Identifiant opaque, unique dans la commune (ex: "380910000A0123")
    pub id: String,

    /// Section cadastrale (ex: "AB")
    pub section: String,

    /// Numéro de parcelle, forme canonique sur 4 chiffres (ex: "0123")
    pub number: String,

    /// Nom de la commune (affichage uniquement)
    pub municipality: String,

    /// Contenance en m²
    pub area: f64,

    /// Contour (lon, lat). Seul l'anneau extérieur sert au centroïde.
    pub boundary: Polygon,
}

impl Parcel {
    pub fn new(
        id: impl Into<String>,
        section: &str,
        number: &str,
        municipality: impl Into<String>,
        area: f64,
        boundary: Polygon,
    ) -> Self {
        Self {
            id: id.into(),
            section: canonical_section(section),
            number: canonical_number(number),
            municipality: municipality.into(),
            area: area.max(0.0),
            boundary,
        }
    }

    /// Référence d'affichage `section + " " + numéro`, toujours dérivée
    pub fn reference(&self) -> String {
        format!("{} {}", self.section, self.number)
    }

    /// Construit une parcelle depuis une feature GeoJSON du backend
    pub fn from_feature(feature: &geojson::Feature) -> Result<Self, BackendError> {
        let props: ParcelProperties = match &feature.properties {
            Some(props) => serde_json::from_value(serde_json::Value::Object(props.clone()))
                .map_err(|e| BackendError::Decode(format!("parcel properties: {}", e)))?,
            None => return Err(BackendError::Decode("feature without properties".into())),
        };

        let id = match (props.id, &feature.id) {
            (Some(id), _) => id,
            (None, Some(geojson::feature::Id::String(id))) => id.clone(),
            (None, Some(geojson::feature::Id::Number(n))) => n.to_string(),
            (None, None) => return Err(BackendError::Decode("parcel without id".into())),
        };

        let boundary = match &feature.geometry {
            Some(geometry) => boundary_from_geometry(&geometry.value)
                .map_err(|reason| BackendError::Decode(format!("parcel {}: {}", id, reason)))?,
            None => empty_polygon(),
        };

        Ok(Self::new(
            id,
            &props.section,
            &props.numero,
            props.commune,
            props.contenance,
            boundary,
        ))
    }
}

impl Serialize for Parcel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Parcel", 6)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("section", &self.section)?;
        s.serialize_field("number", &self.number)?;
        s.serialize_field("municipality", &self.municipality)?;
        s.serialize_field("area", &self.area)?;
        s.serialize_field("reference", &self.reference())?;
        s.end()
    }
}

/// Propriétés lues sur une feature parcelle (noms du backend)
#[derive(Debug, Deserialize)]
struct ParcelProperties {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    commune: String,
    section: String,
    numero: String,
    #[serde(default)]
    contenance: f64,
}

/// Normalise un numéro de parcelle sur 4 chiffres ("123" → "0123")
pub fn canonical_number(number: &str) -> String {
    format!("{:0>4}", number.trim())
}

/// Normalise une section cadastrale (" ab " → "AB")
pub fn canonical_section(section: &str) -> String {
    section.trim().to_uppercase()
}

fn boundary_from_geometry(value: &geojson::Value) -> Result<Polygon, String> {
    let geometry = Geometry::<f64>::try_from(value).map_err(|e| e.to_string())?;
    match geometry {
        Geometry::Polygon(poly) => Ok(poly),
        Geometry::MultiPolygon(mp) => Ok(mp.0.into_iter().next().unwrap_or_else(empty_polygon)),
        other => Err(format!("unsupported geometry {}", geometry_name(&other))),
    }
}

fn geometry_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "Other",
    }
}

fn empty_polygon() -> Polygon {
    Polygon::new(LineString::new(Vec::new()), Vec::new())
}

/// Une adresse candidate issue du géocodage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    /// Libellé complet (ex: "8 Boulevard du Port 80000 Amiens")
    pub label: String,

    pub postal_code: String,

    pub city: String,

    /// Code INSEE de la commune
    pub city_code: String,

    /// (longitude, latitude) WGS84
    pub coordinates: (f64, f64),

    /// Score de pertinence du géocodeur (affichage uniquement)
    #[serde(default)]
    pub score: f64,
}

impl AddressSuggestion {
    /// Point (lon, lat) de l'adresse
    pub fn point(&self) -> Point {
        Point::new(self.coordinates.0, self.coordinates.1)
    }

    /// Convertit un résultat du géocodeur. Les résultats sans coordonnées sont ignorés.
    pub fn from_geocode(result: GeocodeResult) -> Option<Self> {
        let (Some(lon), Some(lat)) = (result.longitude, result.latitude) else {
            return None;
        };
        Some(Self {
            label: result.label,
            postal_code: result.postcode,
            city: result.city,
            city_code: result.citycode,
            coordinates: (lon, lat),
            score: result.score,
        })
    }
}

/// Résultat brut du endpoint de géocodage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub citycode: String,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(value: serde_json::Value) -> geojson::Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_reference_derivation() {
        let parcel = Parcel::new("1", "AB", "0123", "Grenoble", 512.0, empty_polygon());
        assert_eq!(parcel.reference(), "AB 0123");
    }

    #[test]
    fn test_number_is_padded() {
        let parcel = Parcel::new("1", "C", "42", "Grenoble", 10.0, empty_polygon());
        assert_eq!(parcel.number, "0042");
        assert_eq!(parcel.reference(), "C 0042");
        assert_eq!(canonical_section(" ab "), "AB");
    }

    #[test]
    fn test_section_is_uppercased() {
        let parcel = Parcel::new("1", " ab", "123", "Grenoble", 10.0, empty_polygon());
        assert_eq!(parcel.section, "AB");
        assert_eq!(parcel.reference(), "AB 0123");
    }

    #[test]
    fn test_open_ring_is_closed_on_conversion() {
        // Anneau non fermé : la conversion geo ajoute le sommet de fermeture,
        // compté ensuite par le centroïde
        let f = feature(json!({
            "type": "Feature",
            "properties": {"id": "X", "section": "A", "numero": "1"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]
            }
        }));

        let parcel = Parcel::from_feature(&f).unwrap();
        assert_eq!(parcel.boundary.exterior().0.len(), 5);
        let c = crate::geometry::vertex_centroid(parcel.boundary.exterior()).unwrap();
        assert!((c.x() - 0.4).abs() < 1e-12);
        assert!((c.y() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_from_feature() {
        let f = feature(json!({
            "type": "Feature",
            "properties": {
                "id": "38185000AB0123",
                "commune": "38185",
                "section": "AB",
                "numero": "123",
                "contenance": 640
            },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[5.0, 45.0], [5.001, 45.0], [5.001, 45.001], [5.0, 45.0]]]
            }
        }));

        let parcel = Parcel::from_feature(&f).unwrap();
        assert_eq!(parcel.id, "38185000AB0123");
        assert_eq!(parcel.reference(), "AB 0123");
        assert_eq!(parcel.area, 640.0);
        assert_eq!(parcel.boundary.exterior().0.len(), 4);
    }

    #[test]
    fn test_from_feature_multipolygon_uses_first() {
        let f = feature(json!({
            "type": "Feature",
            "properties": {"id": "X", "section": "A", "numero": "0001"},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]]],
                    [[[9.0, 9.0], [8.0, 9.0], [8.0, 8.0], [9.0, 9.0]]]
                ]
            }
        }));

        let parcel = Parcel::from_feature(&f).unwrap();
        assert_eq!(parcel.boundary.exterior().0[0].x, 1.0);
        assert_eq!(parcel.area, 0.0);
    }

    #[test]
    fn test_from_feature_missing_section() {
        let f = feature(json!({
            "type": "Feature",
            "properties": {"id": "X", "numero": "0001"},
            "geometry": null
        }));
        assert!(matches!(Parcel::from_feature(&f), Err(BackendError::Decode(_))));
    }

    #[test]
    fn test_serialized_parcel_has_reference() {
        let parcel = Parcel::new("1", "AB", "0123", "Grenoble", 512.0, empty_polygon());
        let value = serde_json::to_value(&parcel).unwrap();
        assert_eq!(value["reference"], "AB 0123");
        assert_eq!(value["number"], "0123");
    }

    #[test]
    fn test_suggestion_from_geocode() {
        let result: GeocodeResult = serde_json::from_value(json!({
            "label": "1 Rue de la Paix 75002 Paris",
            "postcode": "75002",
            "city": "Paris",
            "citycode": "75102",
            "longitude": 2.331,
            "latitude": 48.869,
            "score": 0.97
        }))
        .unwrap();

        let s = AddressSuggestion::from_geocode(result).unwrap();
        assert_eq!(s.city_code, "75102");
        assert_eq!(s.point().x(), 2.331);

        let no_coords = GeocodeResult {
            label: "?".into(),
            ..Default::default()
        };
        assert!(AddressSuggestion::from_geocode(no_coords).is_none());
    }
}
