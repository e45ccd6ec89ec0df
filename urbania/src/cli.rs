//! Définition et implémentation des commandes CLI
//!
//! - `geocode` : adresse libre → suggestions
//! - `parcels` : parcelles d'une commune, classées autour d'un point
//! - `locate` : adresse → parcelle sous l'adresse (parcours "terrain")
//! - `parcel` / `sections` : consultation directe

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cadastre_search::{
    export_to_geojson, AddressAutocomplete, AddressSuggestion, HttpBackend, LocationForm,
    Outcome, Parcel, ParcelleProximitySearch,
};
use clap::Subcommand;
use geo::Point;
use tracing::{info, warn};

#[derive(Subcommand)]
pub enum Commands {
    /// Geocode a free-text address (at most 5 suggestions)
    Geocode {
        /// Address to search (at least 3 characters)
        query: String,
    },

    /// Search the parcels of a municipality, optionally around a point
    Parcels {
        /// INSEE code of the municipality (5 characters, e.g. 38185)
        #[arg(short, long)]
        code: String,

        /// Longitude of the target point (WGS84)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Latitude of the target point (WGS84)
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Write the parcels to a GeoJSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Geocode an address, then find the parcel under it
    Locate {
        /// Address of the land
        address: String,

        /// Write the parcels to a GeoJSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch one parcel by its cadastral reference
    Parcel {
        #[arg(short, long)]
        code: String,

        /// Section (e.g. AB)
        #[arg(short, long)]
        section: String,

        /// Parcel number (padded to 4 digits)
        #[arg(short, long)]
        number: String,
    },

    /// List the cadastral sections of a municipality
    Sections {
        #[arg(short, long)]
        code: String,
    },
}

/// Composants de recherche partageant le même client HTTP
pub struct Session {
    pub search: ParcelleProximitySearch<HttpBackend>,
    pub autocomplete: AddressAutocomplete<HttpBackend>,
    pub json: bool,
}

impl Session {
    pub fn new(backend: HttpBackend, quiet_period: std::time::Duration, json: bool) -> Self {
        let backend = Arc::new(backend);
        Self {
            search: ParcelleProximitySearch::new(Arc::clone(&backend)),
            autocomplete: AddressAutocomplete::with_quiet_period(backend, quiet_period),
            json,
        }
    }
}

/// Exécute une commande
pub async fn run(session: &Session, command: Commands) -> Result<()> {
    match command {
        Commands::Geocode { query } => cmd_geocode(session, &query).await,
        Commands::Parcels {
            code,
            lon,
            lat,
            output,
        } => {
            let target = lon.zip(lat).map(|(lon, lat)| Point::new(lon, lat));
            cmd_parcels(session, &code, target, output).await
        }
        Commands::Locate { address, output } => cmd_locate(session, &address, output).await,
        Commands::Parcel {
            code,
            section,
            number,
        } => cmd_parcel(session, &code, &section, &number).await,
        Commands::Sections { code } => cmd_sections(session, &code).await,
    }
}

async fn geocode(session: &Session, query: &str) -> Result<Vec<AddressSuggestion>> {
    match session.autocomplete.search_now(query).await? {
        Outcome::Ready(suggestions) => Ok(suggestions),
        Outcome::Superseded => bail!("Address search was superseded"),
    }
}

async fn parcels(session: &Session, code: &str, target: Option<Point>) -> Result<Vec<Parcel>> {
    match session.search.search(code, target).await? {
        Outcome::Ready(parcels) => Ok(parcels),
        Outcome::Superseded => bail!("Parcel search was superseded"),
    }
}

/// Exécute la commande geocode
pub async fn cmd_geocode(session: &Session, query: &str) -> Result<()> {
    if query.chars().count() < cadastre_search::autocomplete::MIN_QUERY_LEN {
        bail!("Query must have at least 3 characters");
    }

    let suggestions = geocode(session, query).await?;
    info!(query, count = suggestions.len(), "Geocoding done");

    if session.json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("Aucune adresse trouvée");
    }
    for s in &suggestions {
        println!(
            "{}  [{} {}] INSEE {} ({:.6}, {:.6})",
            s.label, s.postal_code, s.city, s.city_code, s.coordinates.0, s.coordinates.1
        );
    }
    Ok(())
}

/// Exécute la commande parcels
pub async fn cmd_parcels(
    session: &Session,
    code: &str,
    target: Option<Point>,
    output: Option<PathBuf>,
) -> Result<()> {
    let found = parcels(session, code, target).await?;
    print_parcels(session, &found)?;
    write_output(&found, output)
}

/// Exécute la commande locate : géocodage, puis parcelle au point de la première adresse
pub async fn cmd_locate(session: &Session, address: &str, output: Option<PathBuf>) -> Result<()> {
    let suggestions = geocode(session, address).await?;
    let Some(best) = suggestions.first() else {
        bail!("No address found for {:?}", address);
    };
    info!(label = %best.label, city_code = %best.city_code, "Address selected");

    let mut form = LocationForm::default().with_address(best);
    let found = parcels(session, &best.city_code, Some(best.point())).await?;

    if let [parcel] = found.as_slice() {
        form = form.with_parcel(parcel);
    } else if found.is_empty() {
        warn!(label = %best.label, "No parcel under this address");
    }

    if let Err(errors) = form.validate() {
        for e in &errors {
            warn!(field = ?e.field, "{}", e.message);
        }
    }

    if session.json {
        let report = serde_json::json!({ "form": form, "parcels": found });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Adresse: {}", form.address);
        println!("Commune: {} {} (INSEE {})", form.postal_code, form.city, form.city_code);
        if form.cadastral_reference.is_empty() {
            println!("Référence cadastrale: -");
        } else {
            println!("Référence cadastrale: {}", form.cadastral_reference);
        }
        print_parcels(session, &found)?;
    }

    write_output(&found, output)
}

/// Exécute la commande parcel
pub async fn cmd_parcel(session: &Session, code: &str, section: &str, number: &str) -> Result<()> {
    let Some(parcel) = session
        .search
        .parcel_by_reference(code, section, number)
        .await?
    else {
        bail!("Parcel {} {} not found in {}", section, number, code);
    };
    print_parcels(session, std::slice::from_ref(&parcel))
}

/// Exécute la commande sections
pub async fn cmd_sections(session: &Session, code: &str) -> Result<()> {
    let sections = session.search.sections(code).await?;
    if session.json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
    } else {
        println!("{} sections: {}", sections.len(), sections.join(", "));
    }
    Ok(())
}

fn print_parcels(session: &Session, parcels: &[Parcel]) -> Result<()> {
    if session.json {
        println!("{}", serde_json::to_string_pretty(parcels)?);
        return Ok(());
    }

    if parcels.is_empty() {
        println!("Aucune parcelle trouvée");
    }
    for p in parcels {
        println!("{:<10} {:>10.0} m²  {}  ({})", p.reference(), p.area, p.id, p.municipality);
    }
    Ok(())
}

fn write_output(parcels: &[Parcel], output: Option<PathBuf>) -> Result<()> {
    let Some(path) = output else {
        return Ok(());
    };
    export_to_geojson(parcels, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), count = parcels.len(), "GeoJSON written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_parse_parcels_with_point() {
        let cli = TestCli::try_parse_from([
            "urbania", "parcels", "--code", "38185", "--lon", "-1.55", "--lat", "47.21",
        ])
        .unwrap();
        match cli.command {
            Commands::Parcels { code, lon, lat, .. } => {
                assert_eq!(code, "38185");
                assert_eq!(lon, Some(-1.55));
                assert_eq!(lat, Some(47.21));
            }
            _ => panic!("expected parcels command"),
        }
    }

    #[test]
    fn test_lon_requires_lat() {
        let result =
            TestCli::try_parse_from(["urbania", "parcels", "--code", "38185", "--lon", "5.7"]);
        assert!(result.is_err());
    }
}
