//! État du formulaire de localisation (étape "terrain" du dossier)
//!
//! L'état est une valeur sérialisable détenue par un seul contrôleur. Chaque
//! mise à jour renvoie un nouvel instantané au lieu de modifier l'existant.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{AddressSuggestion, Parcel};

/// Champs éditables à la main
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationField {
    Address,
    PostalCode,
    City,
    CadastralReference,
}

/// Erreur de validation d'un champ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: LocationField,
    pub message: &'static str,
}

/// Données de localisation du terrain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationForm {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    /// Code INSEE de la commune (renseigné par la sélection d'une adresse)
    pub city_code: String,
    /// (lon, lat) de l'adresse sélectionnée
    pub coordinates: Option<(f64, f64)>,
    pub cadastral_reference: String,
    pub parcel_id: Option<String>,
    /// Contenance de la parcelle sélectionnée, en m²
    pub land_area: Option<f64>,
}

impl LocationForm {
    /// Applique une adresse sélectionnée. La parcelle précédente est oubliée.
    pub fn with_address(&self, suggestion: &AddressSuggestion) -> Self {
        Self {
            address: suggestion.label.clone(),
            postal_code: suggestion.postal_code.clone(),
            city: suggestion.city.clone(),
            city_code: suggestion.city_code.clone(),
            coordinates: Some(suggestion.coordinates),
            cadastral_reference: String::new(),
            parcel_id: None,
            land_area: None,
        }
    }

    /// Applique une parcelle sélectionnée
    pub fn with_parcel(&self, parcel: &Parcel) -> Self {
        Self {
            cadastral_reference: parcel.reference(),
            parcel_id: Some(parcel.id.clone()),
            land_area: Some(parcel.area),
            ..self.clone()
        }
    }

    /// Modifie un champ saisi à la main.
    ///
    /// Le code postal est nettoyé à la frappe : chiffres seulement, 5 au plus.
    pub fn with_field(&self, field: LocationField, value: &str) -> Self {
        let mut next = self.clone();
        match field {
            LocationField::Address => next.address = value.to_string(),
            LocationField::PostalCode => {
                next.postal_code = value.chars().filter(|c| c.is_ascii_digit()).take(5).collect()
            }
            LocationField::City => next.city = value.to_string(),
            LocationField::CadastralReference => {
                next.cadastral_reference = value.to_string();
                next.parcel_id = None;
                next.land_area = None;
            }
        }
        next
    }

    /// Valide l'étape ; renvoie toutes les erreurs d'un coup
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut fail = |field, message| errors.push(FieldError { field, message });

        let address_len = self.address.trim().chars().count();
        if address_len == 0 {
            fail(LocationField::Address, "L'adresse est obligatoire");
        } else if address_len > 200 {
            fail(LocationField::Address, "L'adresse ne doit pas dépasser 200 caractères");
        }

        if !postal_code_regex().is_match(&self.postal_code) {
            fail(LocationField::PostalCode, "Le code postal doit contenir 5 chiffres");
        }

        let city_len = self.city.trim().chars().count();
        if city_len == 0 {
            fail(LocationField::City, "La ville est obligatoire");
        } else if city_len > 100 {
            fail(LocationField::City, "Le nom de la ville ne doit pas dépasser 100 caractères");
        }

        if self.cadastral_reference.chars().count() > 50 {
            fail(
                LocationField::CadastralReference,
                "La référence cadastrale ne doit pas dépasser 50 caractères",
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn postal_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{5}$").expect("valid postal code regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn suggestion() -> AddressSuggestion {
        AddressSuggestion {
            label: "12 Rue Lesdiguières 38000 Grenoble".into(),
            postal_code: "38000".into(),
            city: "Grenoble".into(),
            city_code: "38185".into(),
            coordinates: (5.7266, 45.1875),
            score: 0.9,
        }
    }

    fn parcel() -> Parcel {
        Parcel::new(
            "38185000AB0123",
            "AB",
            "0123",
            "Grenoble",
            512.0,
            Polygon::new(LineString::new(Vec::new()), Vec::new()),
        )
    }

    #[test]
    fn test_updates_return_new_snapshot() {
        let empty = LocationForm::default();
        let with_address = empty.with_address(&suggestion());
        let with_parcel = with_address.with_parcel(&parcel());

        assert_eq!(empty, LocationForm::default());
        assert_eq!(with_address.city_code, "38185");
        assert!(with_address.cadastral_reference.is_empty());
        assert_eq!(with_parcel.cadastral_reference, "AB 0123");
        assert_eq!(with_parcel.land_area, Some(512.0));
        assert!(with_parcel.validate().is_ok());
    }

    #[test]
    fn test_new_address_forgets_parcel() {
        let form = LocationForm::default()
            .with_address(&suggestion())
            .with_parcel(&parcel())
            .with_address(&suggestion());
        assert_eq!(form.parcel_id, None);
        assert!(form.cadastral_reference.is_empty());
    }

    #[test]
    fn test_postal_code_cleaning() {
        let form = LocationForm::default().with_field(LocationField::PostalCode, "38 0-00 12");
        assert_eq!(form.postal_code, "38000");
    }

    #[test]
    fn test_validation_errors() {
        let form = LocationForm::default()
            .with_field(LocationField::PostalCode, "380")
            .with_field(LocationField::CadastralReference, &"A".repeat(51));

        let errors = form.validate().unwrap_err();
        let fields: Vec<LocationField> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                LocationField::Address,
                LocationField::PostalCode,
                LocationField::City,
                LocationField::CadastralReference,
            ]
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let form = LocationForm::default().with_address(&suggestion());
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["postalCode"], "38000");
        assert_eq!(json["cityCode"], "38185");
    }
}
