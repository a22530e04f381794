//! Fetch functions - query the HHS endpoint and optionally snapshot the result

use crate::surveillance::error::{FetchError, Result};
use crate::surveillance::parse::parse_csv;
use crate::surveillance::query::{build_all_query, build_probe_query, DiseaseQuery, QueryParams};
use crate::surveillance::types::{FetchOutput, SeasonCatalog};
use crate::surveillance::utils::{
    last_modified_unix, parse_last_modified, snapshot_timestamp, Transport, DEFAULT_API,
};
use crate::surveillance::write::{full_snapshot_name, query_snapshot_name, write_snapshot};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Client for the hospital capacity timeseries endpoint
pub struct SurveillanceClient<T> {
    transport: T,
    endpoint: String,
    seasons: SeasonCatalog,
}

impl<T: Transport> SurveillanceClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            endpoint: DEFAULT_API.to_string(),
            seasons: SeasonCatalog::standard(),
        }
    }

    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..self
        }
    }

    pub fn with_seasons(self, seasons: SeasonCatalog) -> Self {
        Self { seasons, ..self }
    }

    pub fn seasons(&self) -> &SeasonCatalog {
        &self.seasons
    }

    /// Fetch one disease/state/season slice.
    /// With `output_dir` set, the table is also written as a snapshot named
    /// after the query and the server's Last-Modified time.
    pub async fn fetch_by_query(
        &self,
        query: &DiseaseQuery<'_>,
        today: NaiveDate,
        output_dir: Option<&Path>,
    ) -> Result<FetchOutput> {
        info!(
            "Fetching {} data for {} season {}",
            query.disease, query.state, query.season
        );
        let params = query.build(&self.seasons, today)?;
        let mut output = self.execute(&params).await?;

        if let Some(dir) = output_dir {
            output.snapshot = Some(save_query_snapshot(query, &output, dir)?);
        }

        Ok(output)
    }

    /// Fetch every state and date for all diseases.
    /// Callers normally persist this one, so pass the data directory.
    pub async fn fetch_all(
        &self,
        order_by: &str,
        limit: u64,
        output_dir: Option<&Path>,
    ) -> Result<FetchOutput> {
        info!("Fetching full dataset (limit {})", limit);
        let params = build_all_query(order_by, limit);
        let mut output = self.execute(&params).await?;

        if let Some(dir) = output_dir {
            let unix = last_modified_unix(output.last_modified.as_deref())?;
            let filename = full_snapshot_name(unix);
            output.snapshot = Some(write_snapshot(&output.table, dir, &filename)?);
        }

        Ok(output)
    }

    /// Current Last-Modified header, via a zero-row query
    pub async fn fetch_last_modified(&self) -> Result<Option<String>> {
        let response = self
            .transport
            .get(&self.endpoint, &build_probe_query().to_pairs())
            .await?
            .into_success()?;

        if response.last_modified.is_none() {
            warn!("Endpoint returned no Last-Modified header");
        }

        Ok(response.last_modified)
    }

    /// True when the snapshot's embedded timestamp equals the server's
    /// current Last-Modified time, to the second
    pub async fn is_snapshot_current(&self, snapshot: &Path) -> Result<bool> {
        let saved = snapshot_timestamp(snapshot)?;

        let header = self.fetch_last_modified().await?;
        let current = parse_last_modified(header.as_deref().ok_or(FetchError::MissingLastModified)?)?;

        let fresh = saved == current;
        info!(
            "Snapshot {:?} saved at {}, server at {}: {}",
            snapshot,
            saved,
            current,
            if fresh { "current" } else { "stale" }
        );

        Ok(fresh)
    }

    /// Re-fetch `query` into `output_dir` unless `existing` is on disk and current.
    /// Returns the path of the up-to-date snapshot.
    pub async fn refresh_snapshot(
        &self,
        existing: &Path,
        query: &DiseaseQuery<'_>,
        today: NaiveDate,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        if !existing.is_file() {
            info!("Snapshot {:?} not found, fetching", existing);
        } else if self.is_snapshot_current(existing).await? {
            return Ok(existing.to_path_buf());
        } else {
            info!("Snapshot {:?} is stale, re-fetching", existing);
        }

        let params = query.build(&self.seasons, today)?;
        let output = self.execute(&params).await?;
        save_query_snapshot(query, &output, output_dir)
    }

    async fn execute(&self, params: &QueryParams) -> Result<FetchOutput> {
        let response = self
            .transport
            .get(&self.endpoint, &params.to_pairs())
            .await?
            .into_success()?;

        let table = parse_csv(&response.body)?;
        info!("Parsed {} rows ({} columns)", table.len(), table.headers.len());

        Ok(FetchOutput {
            table,
            last_modified: response.last_modified,
            snapshot: None,
        })
    }
}

fn save_query_snapshot(
    query: &DiseaseQuery<'_>,
    output: &FetchOutput,
    output_dir: &Path,
) -> Result<PathBuf> {
    let unix = last_modified_unix(output.last_modified.as_deref())?;
    let filename = query_snapshot_name(query.state, query.season, query.disease, unix);
    write_snapshot(&output.table, output_dir, &filename)
}
