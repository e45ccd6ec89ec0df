//! Export GeoJSON des parcelles trouvées (geozero, en streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::Geometry;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use thiserror::Error;

use crate::Parcel;

/// Erreurs d'export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Geometry encoding failed: {0}")]
    Geometry(#[from] geozero::error::GeozeroError),

    #[error("Properties encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Écrit les parcelles dans un fichier GeoJSON (WGS84)
pub fn export_to_geojson(parcels: &[Parcel], output_path: &Path) -> Result<(), ExportError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write_feature_collection(&mut writer, parcels)?;
    writer.flush()?;
    Ok(())
}

/// Écrit une FeatureCollection, dans l'ordre des parcelles
pub fn write_feature_collection<W: Write>(
    writer: &mut W,
    parcels: &[Parcel],
) -> Result<(), ExportError> {
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::4326"}}}},"features":["#
    )?;

    for (i, parcel) in parcels.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, parcel)?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

/// Écrit une feature ; les propriétés incluent la référence dérivée
fn write_feature<W: Write>(writer: &mut W, parcel: &Parcel) -> Result<(), ExportError> {
    write!(
        writer,
        r#"{{"type":"Feature","id":{},"geometry":"#,
        serde_json::to_string(&parcel.id)?
    )?;

    if parcel.boundary.exterior().0.is_empty() {
        write!(writer, "null")?;
    } else {
        let mut geom_buf = Vec::new();
        let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
        Geometry::Polygon(parcel.boundary.clone()).process_geom(&mut geom_writer)?;
        writer.write_all(&geom_buf)?;
    }

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, parcel)?;
    write!(writer, "}}")?;

    Ok(())
}
