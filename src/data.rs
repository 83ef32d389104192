use crate::config::InputConfig;
use crate::regions;
use crate::types::{Dataset, Measurement, Region};
use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::GeoJson;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const YEAR_COLUMN: &str = "YEAR";
const JURISDICTION_COLUMN: &str = "JURISDICTION";
const FINES_COLUMN: &str = "Sum(FINES)";
const TOTAL_LICENCES_COLUMN: &str = "TOTAL_LICENCES";
const RATE_COLUMN: &str = "LICENCES_PER_10,000";

/// Loads the measurement CSV and the boundary GeoJSON concurrently.
/// Either failing fails the whole load.
pub async fn load_dataset(input: &InputConfig) -> Result<Dataset> {
    info!(csv = ?input.data_csv, boundaries = %input.boundaries, "loading choropleth data");

    let (measurements, regions) = tokio::try_join!(
        load_measurements(&input.data_csv),
        load_boundaries(&input.boundaries)
    )?;

    info!(
        rows = measurements.len(),
        regions = regions.len(),
        "loaded choropleth data"
    );
    Ok(Dataset::new(measurements, regions))
}

/// Text shown in place of the chart when `load_dataset` fails.
pub fn load_error_message(err: &anyhow::Error) -> String {
    format!(
        "Failed to load choropleth data. Ensure HTTP serving and internet access. Error: {:#}",
        err
    )
}

async fn load_measurements(path: &Path) -> Result<Vec<Measurement>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    parse_measurements(bytes.as_slice())
}

async fn load_boundaries(source: &str) -> Result<Vec<Region>> {
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::get(source)
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Failed to fetch boundaries: {}", source))?
            .text()
            .await
            .with_context(|| format!("Failed to read boundaries body: {}", source))?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to open GeoJSON file: {}", source))?
    };
    parse_boundaries(&text)
}

/// Empty, whitespace-only, absent and non-numeric cells are all missing.
pub fn parse_optional_number(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_measurements<R: Read>(reader: R) -> Result<Vec<Measurement>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let year_idx = column(YEAR_COLUMN)
        .ok_or_else(|| anyhow!("Column '{}' not found in CSV", YEAR_COLUMN))?;
    let jurisdiction_idx = column(JURISDICTION_COLUMN)
        .ok_or_else(|| anyhow!("Column '{}' not found in CSV", JURISDICTION_COLUMN))?;
    let fines_idx = column(FINES_COLUMN);
    let licences_idx = column(TOTAL_LICENCES_COLUMN);
    let rate_idx = column(RATE_COLUMN);

    let mut measurements = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.context("Failed to read CSV record")?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i));

        let Some(year) = record
            .get(year_idx)
            .and_then(|s| s.trim().parse::<i32>().ok())
        else {
            warn!(line = line + 2, "skipping row with unparseable year");
            continue;
        };

        measurements.push(Measurement {
            year,
            jurisdiction: record.get(jurisdiction_idx).unwrap_or("").replace('"', ""),
            fines: parse_optional_number(field(fines_idx)),
            total_licences: parse_optional_number(field(licences_idx)),
            rate: parse_optional_number(field(rate_idx)),
        });
    }

    Ok(measurements)
}

pub fn parse_boundaries(text: &str) -> Result<Vec<Region>> {
    let geojson: GeoJson = text.parse().context("Failed to parse boundary GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => bail!("Boundary GeoJSON must be a FeatureCollection"),
    };

    let mut regions = Vec::new();

    for feature in collection.features {
        let name = regions::feature_name(feature.properties.as_ref());

        let geometry = match feature.geometry {
            Some(geometry) => {
                let converted: geo::Geometry<f64> = geometry
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert boundary geometry: {:?}", e))?;
                match converted {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue,
                }
            }
            None => continue,
        };

        let code = name.as_deref().and_then(regions::abbreviation_for);
        if code.is_none() {
            warn!(name = ?name, "boundary feature has no known region code");
        }

        regions.push(Region {
            name,
            code,
            geometry,
        });
    }

    Ok(regions)
}
