//! Import the company spreadsheet into data/companies.json.
//! Usage: cargo run --bin import_companies -- path/to/dataset.xlsx

use std::path::Path;

use standort::data::import::{run_import, DEFAULT_COMPANIES_PATH};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: import_companies <path-to.xlsx>")?;
    let path = Path::new(&path);
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let summary = run_import(path, DEFAULT_COMPANIES_PATH)?;
    println!(
        "imported {} companies ({} rows skipped) -> {DEFAULT_COMPANIES_PATH}",
        summary.imported, summary.skipped
    );
    Ok(())
}
