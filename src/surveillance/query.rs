//! Query builder - SODA `$select` / `$where` / `$order` / `$limit` parameters

use crate::surveillance::error::Result;
use crate::surveillance::types::{Disease, SeasonCatalog, BASE_COLUMNS};
use chrono::NaiveDate;

/// Default row limit, large enough for a whole dataset in one response
pub const CHUNK_LIMIT: u64 = 1_000_000;

pub const DEFAULT_ORDER: &str = "date";

/// Parameters for a single GET, discarded after the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub select: String,
    pub filter: Option<String>,
    pub order: String,
    pub limit: u64,
}

impl QueryParams {
    /// Render as `$`-prefixed query pairs in a stable order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("$select".to_string(), self.select.clone())];
        if let Some(ref filter) = self.filter {
            pairs.push(("$where".to_string(), filter.clone()));
        }
        pairs.push(("$order".to_string(), self.order.clone()));
        pairs.push(("$limit".to_string(), self.limit.to_string()));
        pairs
    }
}

/// Filtered query for one disease, state and season
#[derive(Debug, Clone)]
pub struct DiseaseQuery<'a> {
    pub disease: Disease,
    pub state: &'a str,
    pub season: i32,
    pub order_by: &'a str,
    pub limit: u64,
}

impl<'a> DiseaseQuery<'a> {
    pub fn new(disease: Disease, state: &'a str, season: i32) -> Self {
        Self {
            disease,
            state,
            season,
            order_by: DEFAULT_ORDER,
            limit: CHUNK_LIMIT,
        }
    }

    pub fn order_by(self, order_by: &'a str) -> Self {
        Self { order_by, ..self }
    }

    pub fn limit(self, limit: u64) -> Self {
        Self { limit, ..self }
    }

    pub fn build(&self, seasons: &SeasonCatalog, today: NaiveDate) -> Result<QueryParams> {
        let (start, end) = seasons.date_range(self.season, today)?;

        Ok(QueryParams {
            select: select_columns(&[self.disease]),
            filter: Some(format!(
                "state = {} AND date BETWEEN {} AND {}",
                quote_literal(self.state),
                quote_literal(&start.format("%Y-%m-%d").to_string()),
                quote_literal(&end.format("%Y-%m-%d").to_string()),
            )),
            order: self.order_by.to_string(),
            limit: self.limit,
        })
    }
}

/// Unfiltered query selecting every disease's columns
pub fn build_all_query(order_by: &str, limit: u64) -> QueryParams {
    QueryParams {
        select: select_columns(&Disease::ALL),
        filter: None,
        order: order_by.to_string(),
        limit,
    }
}

/// Zero-row query, used only to read the Last-Modified header
pub fn build_probe_query() -> QueryParams {
    QueryParams {
        select: "date".to_string(),
        filter: None,
        order: DEFAULT_ORDER.to_string(),
        limit: 0,
    }
}

/// Base columns followed by each disease's columns, comma separated
pub fn select_columns(diseases: &[Disease]) -> String {
    BASE_COLUMNS
        .iter()
        .chain(diseases.iter().flat_map(|d| d.columns().iter()))
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// SoQL string literal: wrap in single quotes, double any embedded quote
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
