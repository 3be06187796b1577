//! Command dispatch for the standort binary.

use std::env;
use std::path::Path;

use crate::data::import::{run_import, DEFAULT_COMPANIES_PATH};
use crate::engine::LocationRecommender;
use crate::server;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Recommend,
    Import,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("recommend") => Some(Command::Recommend),
        Some("import") => Some(Command::Import),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Recommend) => handle_recommend(args),
        Some(Command::Import) => handle_import(args),
        None => {
            eprintln!("usage: standort <serve|recommend|import>");
            2
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var("STANDORT_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn parse_usize_arg(arg: Option<&String>, name: &str, default: usize) -> usize {
    match arg {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("invalid {name} {raw:?}, using {default}");
            default
        }),
    }
}

/// `standort recommend <sector> [max] [sample_size]`
fn handle_recommend(args: &[String]) -> i32 {
    let Some(sector) = args.get(2) else {
        eprintln!("usage: standort recommend <sector> [max] [sample_size]");
        return 2;
    };
    let max_count = parse_usize_arg(args.get(3), "max", 10);
    let sample_size = parse_usize_arg(args.get(4), "sample_size", 10_000);

    let companies = match crate::data::import::load_companies(DEFAULT_COMPANIES_PATH) {
        Ok(companies) => companies,
        Err(err) => {
            eprintln!("failed to load companies ({err}); run `standort import` first");
            return 1;
        }
    };

    let mut engine = match LocationRecommender::open_default(companies) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("failed to open engine: {err}");
            return 1;
        }
    };
    engine.set_target_tags(vec![sector.clone()]);
    engine.set_sample_size(sample_size);

    match engine.get_attributed_location_recommendations(max_count) {
        Ok(recommendations) => {
            for (i, r) in recommendations.iter().enumerate() {
                println!(
                    "{:>2}. ({:.4}, {:.4})  value {:.4}  nearby targets {}",
                    i + 1,
                    r.latitude,
                    r.longitude,
                    r.value.unwrap_or(0.0),
                    r.attributed_targets.as_deref().map_or(0, <[_]>::len)
                );
            }
            0
        }
        Err(err) => {
            eprintln!("recommendation failed: {err}");
            1
        }
    }
}

/// `standort import <dataset.xlsx>`
fn handle_import(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: standort import <dataset.xlsx>");
        return 2;
    };
    match run_import(Path::new(path), DEFAULT_COMPANIES_PATH) {
        Ok(summary) => {
            println!(
                "imported {} companies ({} rows skipped) -> {DEFAULT_COMPANIES_PATH}",
                summary.imported, summary.skipped
            );
            0
        }
        Err(err) => {
            eprintln!("import failed: {err}");
            1
        }
    }
}
