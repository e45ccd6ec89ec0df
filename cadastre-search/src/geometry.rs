//! Calculs géométriques pour le classement par proximité
//!
//! Coordonnées en degrés WGS84, `x` = longitude, `y` = latitude.

use geo::{Coord, LineString, Point};

/// Rayon terrestre utilisé pour la distance de Haversine (mètres)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Centroïde naïf d'un anneau : moyenne arithmétique de tous ses sommets.
///
/// Ce n'est pas un centroïde pondéré par l'aire. Le sommet de fermeture
/// (identique au premier) est compté comme les autres. Retourne `None` pour
/// un anneau vide.
pub fn vertex_centroid(ring: &LineString) -> Option<Point> {
    let n = ring.0.len();
    if n == 0 {
        return None;
    }

    let sum = ring
        .coords()
        .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| Coord {
            x: acc.x + c.x,
            y: acc.y + c.y,
        });

    Some(Point::new(sum.x / n as f64, sum.y / n as f64))
}

/// Distance orthodromique (Haversine) entre deux points, en mètres
pub fn haversine_distance(a: Point, b: Point) -> f64 {
    let phi1 = a.y().to_radians();
    let phi2 = b.y().to_radians();
    let d_phi = (b.y() - a.y()).to_radians();
    let d_lambda = (b.x() - a.x()).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
