//! Parse functions - turn CSV text into `Table`

use crate::surveillance::error::Result;
use crate::surveillance::types::Table;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Parse a CSV response body; the first record is the header row
pub fn parse_csv(body: &str) -> Result<Table> {
    read_table(body.as_bytes())
}

/// Read a previously written snapshot back into memory
pub fn load_snapshot(path: &Path) -> Result<Table> {
    info!("Loading snapshot {:?}", path);
    let file = std::fs::File::open(path)?;
    let table = read_table(file)?;
    info!("Loaded {} rows from {:?}", table.len(), path);
    Ok(table)
}

fn read_table<R: Read>(input: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_row() {
        let table = parse_csv("date,state\n2023-09-01,CA\n").unwrap();

        assert_eq!(table.headers, vec!["date", "state"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0], vec!["2023-09-01", "CA"]);
    }

    #[test]
    fn test_parse_header_only() {
        let table = parse_csv("\"date\"\n").unwrap();

        assert_eq!(table.headers, vec!["date"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_quoted_and_empty_cells() {
        let body = "\"date\",\"state\",\"deaths_covid\"\n\"2023-09-01T00:00:00.000\",\"CA\",\"\"\n";
        let table = parse_csv(body).unwrap();

        assert_eq!(table.column("date").unwrap(), vec!["2023-09-01T00:00:00.000"]);
        assert_eq!(table.column("deaths_covid").unwrap(), vec![""]);
    }

    #[test]
    fn test_parse_empty_body() {
        let table = parse_csv("").unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }
}
