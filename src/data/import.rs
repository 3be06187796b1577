//! Import the company spreadsheet into normalized JSON records.
//!
//! Source format: one row per company with columns `Company Name 1`,
//! `CustomSector` and `PLZ_Coordinates` (a `"(lat, lon)"` string). Rows with
//! malformed or out-of-range coordinates are skipped with a warning here and
//! never reach the recommendation engine.

use std::fmt;
use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::data::company::{Company, CompanyKind};
use crate::data::registry::{write_registry, DataSetEntry, DEFAULT_REGISTRY_PATH};
use crate::engine::geo::GeoPoint;

pub const DEFAULT_COMPANIES_PATH: &str = "data/companies.json";

const COLUMN_NAME: &str = "Company Name 1";
const COLUMN_SECTOR: &str = "CustomSector";
const COLUMN_COORDINATES: &str = "PLZ_Coordinates";

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Spreadsheet(calamine::Error),
    Serde(serde_json::Error),
    /// Sheet missing, or a required column absent from the header row.
    Format(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "import io error: {err}"),
            Self::Spreadsheet(err) => write!(f, "spreadsheet error: {err}"),
            Self::Serde(err) => write!(f, "import serialization error: {err}"),
            Self::Format(msg) => write!(f, "dataset format error: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        Self::Spreadsheet(err)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

fn cell_str(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format!("{f}"),
        Data::Int(i) => format!("{i}"),
        Data::Bool(b) => format!("{b}"),
        other => format!("{other:?}"),
    }
}

/// Parse a `"(lat, lon)"` cell into a point. Returns None for anything that
/// does not contain exactly two parseable floats.
pub fn parse_coordinate_pair(raw: &str) -> Option<GeoPoint> {
    let cleaned = raw.trim().trim_start_matches('(').trim_end_matches(')');
    let mut parts = cleaned.split(',');
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    let lon: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(GeoPoint::new(lat, lon))
}

/// Build one company from raw cells. None when the coordinates are missing,
/// unparseable, NaN or out of geographic range.
pub fn build_company(name: &str, sector: &str, raw_coordinates: &str) -> Option<Company> {
    let point = parse_coordinate_pair(raw_coordinates)?;
    if point.lat.is_nan() || point.lon.is_nan() || !point.is_in_range() {
        return None;
    }

    // All dataset companies are treated as potential targets; the engine
    // narrows them down by tag.
    let mut company = Company::new(CompanyKind::Target, point.lat, point.lon);
    if !name.trim().is_empty() {
        company = company.with_name(name.trim());
    }
    if !sector.trim().is_empty() {
        company = company.with_tags(vec![sector.trim().to_string()]);
    }
    Some(company)
}

/// Read the spreadsheet at `path` into validated company records.
pub fn import_companies_xlsx(path: &Path) -> Result<(Vec<Company>, ImportSummary), ImportError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Format("workbook has no sheets".into()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| ImportError::Format("sheet is empty".into()))?
        .iter()
        .map(cell_str)
        .collect();

    let column = |name: &str| -> Result<usize, ImportError> {
        header
            .iter()
            .position(|cell| cell == name)
            .ok_or_else(|| ImportError::Format(format!("missing column {name}")))
    };
    let name_col = column(COLUMN_NAME)?;
    let sector_col = column(COLUMN_SECTOR)?;
    let coordinates_col = column(COLUMN_COORDINATES)?;

    let mut companies = Vec::new();
    let mut summary = ImportSummary::default();
    for row in rows {
        let name = row.get(name_col).map(cell_str).unwrap_or_default();
        let sector = row.get(sector_col).map(cell_str).unwrap_or_default();
        let coordinates = row.get(coordinates_col).map(cell_str).unwrap_or_default();

        match build_company(&name, &sector, &coordinates) {
            Some(company) => {
                companies.push(company);
                summary.imported += 1;
            }
            None => {
                eprintln!("invalid coordinates for company {name:?} -> skipping");
                summary.skipped += 1;
            }
        }
    }

    Ok((companies, summary))
}

/// Load normalized companies written by the importer.
pub fn load_companies(path: &str) -> Result<Vec<Company>, ImportError> {
    let raw = fs::read_to_string(Path::new(path))?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn save_companies(path: &str, companies: &[Company]) -> Result<(), ImportError> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string(companies)?;
    fs::write(path, raw)?;
    Ok(())
}

/// Import `xlsx`, write the normalized records to `out_path` and refresh the
/// dataset registry entry.
pub fn run_import(xlsx: &Path, out_path: &str) -> Result<ImportSummary, ImportError> {
    let (companies, summary) = import_companies_xlsx(xlsx)?;
    save_companies(out_path, &companies)?;
    let entry = DataSetEntry {
        source: xlsx
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| xlsx.display().to_string()),
        data_version: None,
        last_updated: Some(chrono::Utc::now().to_rfc3339()),
        path: out_path.to_string(),
    };
    write_registry(DEFAULT_REGISTRY_PATH, &entry)?;
    Ok(summary)
}

/// All distinct sector tags across the dataset, in first-seen order.
pub fn collect_sectors(companies: &[Company]) -> Vec<String> {
    let mut sectors: Vec<String> = Vec::new();
    for company in companies {
        for tag in &company.tags {
            if !sectors.contains(tag) {
                sectors.push(tag.clone());
            }
        }
    }
    sectors
}
