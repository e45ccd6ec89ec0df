//! Classement des parcelles par proximité

use geo::Point;

use crate::geometry::{haversine_distance, vertex_centroid};
use crate::Parcel;

/// Nombre de parcelles gardées quand un point cible est fourni
pub const NEAREST_LIMIT: usize = 5;

/// Nombre de parcelles gardées sans point cible
pub const UNRANKED_LIMIT: usize = 10;

/// Distance entre le centroïde (naïf) d'une parcelle et la cible, en mètres.
///
/// Une parcelle sans contour est placée à l'infini.
pub fn distance_to(parcel: &Parcel, target: Point) -> f64 {
    vertex_centroid(parcel.boundary.exterior())
        .map(|c| haversine_distance(c, target))
        .unwrap_or(f64::INFINITY)
}

/// Trie par distance croissante à `target` et garde les `limit` plus proches.
///
/// Le tri est stable : à distance égale, l'ordre du backend est conservé.
pub fn rank_by_proximity(parcels: Vec<Parcel>, target: Point, limit: usize) -> Vec<Parcel> {
    let mut with_distance: Vec<(f64, Parcel)> = parcels
        .into_iter()
        .map(|p| (distance_to(&p, target), p))
        .collect();

    with_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

    with_distance
        .into_iter()
        .take(limit)
        .map(|(_, p)| p)
        .collect()
}

/// Applique la politique de sélection d'une recherche
///
/// - avec cible et plus d'un candidat : les `NEAREST_LIMIT` plus proches
/// - sans cible : les `UNRANKED_LIMIT` premiers, dans l'ordre du backend
pub fn select(parcels: Vec<Parcel>, target: Option<Point>) -> Vec<Parcel> {
    match target {
        Some(target) if parcels.len() > 1 => rank_by_proximity(parcels, target, NEAREST_LIMIT),
        Some(_) => parcels,
        None => parcels.into_iter().take(UNRANKED_LIMIT).collect(),
    }
}
