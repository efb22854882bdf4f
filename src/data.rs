use crate::config::{AppConfig, InputConfig};
use crate::projection::Projection;
use crate::topojson::Topology;
use crate::types::Region;
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// Column of the financial CSV holding the category label.
const CATEGORY_COLUMN: &str = "letter";

/// Read-only lookup tables, loaded once at startup.
#[derive(Debug, Clone)]
pub struct DataStore {
    pub rates: HashMap<String, f64>,
    pub financial: Arc<FinancialDataset>,
}

/// One chart category with its percentage per region code.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialCategory {
    pub label: String,
    pub values: HashMap<String, f64>,
}

/// Ordered chart categories. A region code missing from a category, or with a
/// non-numeric cell, simply has no entry in `values`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialDataset {
    pub categories: Vec<FinancialCategory>,
}

impl FinancialDataset {
    pub fn value(&self, category: usize, code: &str) -> Option<f64> {
        self.categories.get(category)?.values.get(code).copied()
    }
}

impl DataStore {
    pub fn load(config: &AppConfig) -> Result<Self> {
        let rates = parse_rates(open(&config.input.rates_csv)?)
            .with_context(|| format!("Failed to read rates CSV: {:?}", config.input.rates_csv))?;
        tracing::info!("Loaded unemployment rates for {} areas", rates.len());

        // Without the breakdown the map still draws; every bar is just flat.
        let financial = match load_financial(&config.input.financial_csv) {
            Ok(financial) => {
                tracing::info!("Loaded {} financial categories", financial.categories.len());
                financial
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                FinancialDataset::default()
            }
        };

        Ok(Self {
            rates,
            financial: Arc::new(financial),
        })
    }
}

fn load_financial(path: &Path) -> Result<FinancialDataset> {
    parse_financial(open(path)?)
        .with_context(|| format!("Failed to read financial CSV: {:?}", path))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open data file: {:?}", path))
}

/// Load the district boundaries (TopoJSON topology or GeoJSON feature
/// collection) and compute each district's projected bounding box.
pub fn load_regions(input: &InputConfig, projection: &impl Projection) -> Result<Vec<Region>> {
    tracing::info!("Loading boundaries from {:?}...", input.boundaries);
    let file = open(&input.boundaries)?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse boundary JSON: {:?}", input.boundaries))?;

    let collection = if json.get("type").and_then(|t| t.as_str()) == Some("Topology") {
        let topology: Topology =
            serde_json::from_value(json).context("Malformed TopoJSON topology")?;
        topology.feature_collection(&input.boundary_object)?
    } else {
        match GeoJson::from_json_value(json).context("Failed to parse GeoJSON")? {
            GeoJson::FeatureCollection(fc) => fc,
            _ => return Err(anyhow!("Boundary GeoJSON must be a FeatureCollection")),
        }
    };

    let regions = regions_from_features(collection, input, projection)?;
    if regions.is_empty() {
        return Err(anyhow!("No district boundaries found in {:?}", input.boundaries));
    }
    tracing::info!("Loaded {} district boundaries", regions.len());
    Ok(regions)
}

fn regions_from_features(
    collection: FeatureCollection,
    input: &InputConfig,
    projection: &impl Projection,
) -> Result<Vec<Region>> {
    let mut regions: Vec<Region> = Vec::new();
    let mut seen = HashSet::new();

    for feature in collection.features {
        let code = match feature.property(&input.code_property) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        let name = feature
            .property(&input.name_property)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| code.clone());

        let geometry = match feature.geometry {
            Some(geometry) => {
                let valid_geo: geo::Geometry<f64> = geometry.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of {}: {:?}", code, e))?;
                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue,
                }
            }
            None => continue,
        };

        let Some(bounds) = projection.bounds(&geometry) else {
            tracing::warn!("District {} has an empty boundary, skipping", code);
            continue;
        };

        if !seen.insert(code.clone()) {
            tracing::warn!("Duplicate district code {}, keeping the first", code);
            continue;
        }

        regions.push(Region {
            code,
            name,
            geometry,
            bounds,
        });
    }

    Ok(regions)
}

#[derive(Debug, Deserialize)]
struct RateRow {
    onscode: String,
    unemployment: String,
}

/// `onscode,unemployment` rows. Rows whose rate does not parse are dropped,
/// which leaves the district without a fill value.
pub fn parse_rates<R: Read>(reader: R) -> Result<HashMap<String, f64>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rates = HashMap::new();

    for result in rdr.deserialize() {
        let row: RateRow = result?;
        match row.unemployment.parse::<f64>() {
            Ok(rate) if rate.is_finite() => {
                rates.insert(row.onscode, rate);
            }
            _ => tracing::warn!("Unreadable unemployment rate for {}: {:?}", row.onscode, row.unemployment),
        }
    }

    Ok(rates)
}

/// One row per category: the `letter` label followed by one column per
/// region code. Short rows are accepted; their missing cells have no value.
pub fn parse_financial<R: Read>(reader: R) -> Result<FinancialDataset> {
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let label_idx = headers.iter().position(|h| h == CATEGORY_COLUMN)
        .ok_or_else(|| anyhow!("Column '{}' not found in financial CSV", CATEGORY_COLUMN))?;

    let mut categories = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let label = record.get(label_idx).unwrap_or("").to_string();

        let values = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != label_idx)
            .filter_map(|(_, (code, cell))| {
                let value = cell.parse::<f64>().ok().filter(|v| v.is_finite())?;
                Some((code.to_string(), value))
            })
            .collect();

        categories.push(FinancialCategory { label, values });
    }

    Ok(FinancialDataset { categories })
}

#[derive(Debug, Deserialize)]
struct HeadcountRow {
    laname: String,
    unemp: String,
}

/// `laname,unemp` rows, keyed by district name. Counts are kept as written.
pub fn parse_headcounts<R: Read>(reader: R) -> Result<HashMap<String, String>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut counts = HashMap::new();
    for result in rdr.deserialize() {
        let row: HeadcountRow = result?;
        counts.insert(row.laname, row.unemp);
    }
    Ok(counts)
}
