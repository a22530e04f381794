//! Write functions - persist tables as timestamped CSV snapshots

use crate::surveillance::error::Result;
use crate::surveillance::types::{Disease, Table};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SNAPSHOT_PREFIX: &str = "HHS_daily-hosp";

pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// `HHS_daily-hosp_{state}_{season}_{disease}__{unix}.csv`
pub fn query_snapshot_name(state: &str, season: i32, disease: Disease, unix: i64) -> String {
    format!(
        "{}_{}_{}_{}__{}.csv",
        SNAPSHOT_PREFIX, state, season, disease, unix
    )
}

/// `HHS_daily-hosp__{unix}.csv`
pub fn full_snapshot_name(unix: i64) -> String {
    format!("{}__{}.csv", SNAPSHOT_PREFIX, unix)
}

/// Write the table to `output_dir/filename`, replacing any existing file
pub fn write_snapshot(table: &Table, output_dir: &Path, filename: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(filename);

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&path)?;

    if !table.headers.is_empty() {
        writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {:?}", table.len(), path);

    Ok(path)
}
