//! Core data types for surveillance queries
//! Static lookup tables and plain data, no I/O

use crate::surveillance::error::{FetchError, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Columns every query selects
pub const BASE_COLUMNS: &[&str] = &["date", "state"];

/// Diseases tracked by the hospital capacity dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disease {
    Influenza,
    Covid,
}

impl Disease {
    pub const ALL: [Disease; 2] = [Disease::Influenza, Disease::Covid];

    /// Metric columns for this disease, in request order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Disease::Influenza => &[
                "previous_day_admission_influenza_confirmed",
                "previous_day_admission_influenza_confirmed_coverage",
                "previous_day_deaths_influenza",
                "previous_day_deaths_influenza_coverage",
            ],
            Disease::Covid => &[
                "previous_day_admission_adult_covid_confirmed",
                "previous_day_admission_adult_covid_confirmed_coverage",
                "previous_day_admission_pediatric_covid_confirmed",
                "previous_day_admission_pediatric_covid_confirmed_coverage",
                "deaths_covid",
                "deaths_covid_coverage",
            ],
        }
    }
}

impl std::fmt::Display for Disease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disease::Influenza => write!(f, "influenza"),
            Disease::Covid => write!(f, "covid"),
        }
    }
}

impl FromStr for Disease {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "influenza" => Ok(Disease::Influenza),
            "covid" => Ok(Disease::Covid),
            other => Err(FetchError::UnknownDisease(other.to_string())),
        }
    }
}

/// Upper bound of a season's date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonEnd {
    Fixed(NaiveDate),
    /// Season still running: ends on the caller-supplied "today"
    Today,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonRange {
    pub season: i32,
    pub start: NaiveDate,
    pub end: SeasonEnd,
}

// Evaluated at compile time, so an invalid date fails the build
const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid season date"),
    }
}

const SEASON_2021_START: NaiveDate = ymd(2021, 9, 1);
const SEASON_2021_END: NaiveDate = ymd(2022, 6, 1);
const SEASON_2022_START: NaiveDate = ymd(2022, 9, 1);
const SEASON_2022_END: NaiveDate = ymd(2023, 6, 1);
const SEASON_2023_START: NaiveDate = ymd(2023, 8, 1);

/// Immutable season -> date range table, built once at startup
#[derive(Debug, Clone)]
pub struct SeasonCatalog {
    ranges: Vec<SeasonRange>,
}

impl SeasonCatalog {
    pub fn new(ranges: Vec<SeasonRange>) -> Self {
        Self { ranges }
    }

    /// Seasons published by the HHS dataset
    pub fn standard() -> Self {
        Self::new(vec![
            SeasonRange {
                season: 2021,
                start: SEASON_2021_START,
                end: SeasonEnd::Fixed(SEASON_2021_END),
            },
            SeasonRange {
                season: 2022,
                start: SEASON_2022_START,
                end: SeasonEnd::Fixed(SEASON_2022_END),
            },
            SeasonRange {
                season: 2023,
                start: SEASON_2023_START,
                end: SeasonEnd::Today,
            },
        ])
    }

    /// Inclusive (start, end) bounds of a season
    pub fn date_range(&self, season: i32, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let range = self
            .ranges
            .iter()
            .find(|r| r.season == season)
            .ok_or(FetchError::UnknownSeason(season))?;

        let end = match range.end {
            SeasonEnd::Fixed(date) => date,
            SeasonEnd::Today => today,
        };

        Ok((range.start, end))
    }

    pub fn seasons(&self) -> impl Iterator<Item = i32> + '_ {
        self.ranges.iter().map(|r| r.season)
    }
}

impl Default for SeasonCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// In-memory CSV table - headers plus string cells, no schema enforcement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values of a named column
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Deserialize rows into typed records, matching fields by header name
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let headers = csv::StringRecord::from(self.headers.clone());
        self.rows
            .iter()
            .map(|row| {
                csv::StringRecord::from(row.clone())
                    .deserialize(Some(&headers))
                    .map_err(FetchError::from)
            })
            .collect()
    }
}

/// Outcome of one fetch: parsed rows and the server's Last-Modified header
#[derive(Debug, Clone)]
pub struct FetchOutput {
    pub table: Table,
    /// Literal header value; None when the response carried none
    pub last_modified: Option<String>,
    /// Where the snapshot was written, when persistence was requested
    pub snapshot: Option<std::path::PathBuf>,
}
