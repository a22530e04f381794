//! Utility functions for common operations

use crate::surveillance::error::{FetchError, Result};
use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::Client;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// HHS COVID-19 Reported Patient Impact and Hospital Capacity by State Timeseries
pub const DEFAULT_API: &str = "https://healthdata.gov/resource/g62h-syeh.csv";

/// Raw HTTP response, before status handling
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub last_modified: Option<String>,
}

impl HttpResponse {
    /// Anything below 400 counts as success, redirects included
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// Body on success, `FetchError::Http` carrying the body otherwise
    pub fn into_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Http {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// One GET with query pairs
pub trait Transport {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse> {
        info!("GET {}", url);
        debug!("Query parameters: {:?}", query);

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status().as_u16();
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let body = response.text().await?;
        info!("Received {} bytes (status {})", body.len(), status);

        Ok(HttpResponse {
            status,
            body,
            last_modified,
        })
    }
}

/// Parse an RFC 1123 Last-Modified value, e.g. `Fri, 01 Sep 2023 00:00:00 GMT`
pub fn parse_last_modified(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| FetchError::InvalidLastModified(value.to_string()))
}

/// Unix seconds for a Last-Modified value; absent header is its own error
pub fn last_modified_unix(value: Option<&str>) -> Result<i64> {
    let value = value.ok_or(FetchError::MissingLastModified)?;
    Ok(parse_last_modified(value)?.timestamp())
}

/// Extract the Unix timestamp from `<prefix>__<unix>.csv`
pub fn snapshot_timestamp(path: &Path) -> Result<DateTime<Utc>> {
    let invalid = || FetchError::InvalidSnapshotName(path.display().to_string());

    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let (_, tail) = name.rsplit_once("__").ok_or_else(invalid)?;
    let digits = tail.strip_suffix(".csv").ok_or_else(invalid)?;
    let seconds = digits.parse::<i64>().map_err(|_| invalid())?;

    DateTime::from_timestamp(seconds, 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveillance::fetch::SurveillanceClient;
    use crate::surveillance::query::DiseaseQuery;
    use crate::surveillance::types::Disease;
    use chrono::{NaiveDate, TimeZone};
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP/1.1 response on a local port.
    /// The handle resolves to the request line the client sent.
    async fn serve_once(status: &str, headers: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/resource/g62h-syeh.csv", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            headers,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (url, handle)
    }

    fn client(url: String) -> SurveillanceClient<HttpTransport> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()
            .unwrap();
        SurveillanceClient::new(HttpTransport::from_client(http)).with_endpoint(url)
    }

    #[tokio::test]
    async fn test_http_transport_success_with_last_modified() {
        let (url, server) = serve_once(
            "200 OK",
            "Last-Modified: Fri, 01 Sep 2023 00:00:00 GMT\r\nContent-Type: text/csv\r\n",
            "date,state\n2023-09-01,CA\n",
        )
        .await;
        let query = DiseaseQuery::new(Disease::Influenza, "CA", 2023);
        let today = NaiveDate::from_ymd_opt(2023, 9, 2).unwrap();

        let output = client(url).fetch_by_query(&query, today, None).await.unwrap();

        assert_eq!(output.table.len(), 1);
        assert_eq!(output.table.rows[0], vec!["2023-09-01", "CA"]);
        assert_eq!(
            output.last_modified.as_deref(),
            Some("Fri, 01 Sep 2023 00:00:00 GMT")
        );

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /resource/g62h-syeh.csv?"));
        assert!(request_line.contains(
            "%24where=state+%3D+%27CA%27+AND+date+BETWEEN+%272023-08-01%27+AND+%272023-09-02%27"
        ));
        assert!(request_line.contains("%24select=date%2C+state%2C+previous_day_admission_influenza_confirmed"));
        assert!(request_line.contains("%24limit=1000000"));
    }

    #[tokio::test]
    async fn test_http_transport_without_last_modified() {
        let (url, server) = serve_once("200 OK", "", "\"date\"\n").await;

        let header = client(url).fetch_last_modified().await.unwrap();

        assert!(header.is_none());
        let request_line = server.await.unwrap();
        assert!(request_line.contains("%24limit=0"));
    }

    #[tokio::test]
    async fn test_http_transport_error_status() {
        let (url, server) = serve_once("400 Bad Request", "", "bad request").await;
        let query = DiseaseQuery::new(Disease::Covid, "CA", 2022);
        let today = NaiveDate::from_ymd_opt(2023, 9, 2).unwrap();

        let err = client(url).fetch_by_query(&query, today, None).await.unwrap_err();

        assert_eq!(err.to_string(), "bad request");
        assert!(matches!(err, FetchError::Http { status: 400, .. }));
        server.await.unwrap();
    }

    #[test]
    fn test_parse_last_modified() {
        let parsed = parse_last_modified("Fri, 01 Sep 2023 00:00:00 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap());
        assert_eq!(parsed.timestamp(), 1_693_526_400);

        assert!(matches!(
            parse_last_modified("yesterday"),
            Err(FetchError::InvalidLastModified(_))
        ));
    }

    #[test]
    fn test_last_modified_unix_missing() {
        assert!(matches!(
            last_modified_unix(None),
            Err(FetchError::MissingLastModified)
        ));
        assert_eq!(
            last_modified_unix(Some("Fri, 01 Sep 2023 00:00:00 GMT")).unwrap(),
            1_693_526_400
        );
    }

    #[test]
    fn test_snapshot_timestamp() {
        let path = PathBuf::from("data/HHS_daily-hosp_CA_2023_influenza__1693526400.csv");
        assert_eq!(snapshot_timestamp(&path).unwrap().timestamp(), 1_693_526_400);

        let path = PathBuf::from("HHS_daily-hosp__1693526400.csv");
        assert_eq!(snapshot_timestamp(&path).unwrap().timestamp(), 1_693_526_400);
    }

    #[test]
    fn test_snapshot_timestamp_rejects_bad_names() {
        for name in [
            "HHS_daily-hosp_CA_2023_influenza.csv",
            "HHS_daily-hosp__1693526400.parquet",
            "HHS_daily-hosp__notanumber.csv",
            "HHS_daily-hosp__.csv",
        ] {
            assert!(
                matches!(
                    snapshot_timestamp(Path::new(name)),
                    Err(FetchError::InvalidSnapshotName(_))
                ),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_http_response_status() {
        let ok = HttpResponse {
            status: 200,
            body: String::new(),
            last_modified: None,
        };
        assert!(ok.into_success().is_ok());

        let not_modified = HttpResponse {
            status: 304,
            body: String::new(),
            last_modified: None,
        };
        assert!(not_modified.is_success());

        let bad = HttpResponse {
            status: 404,
            body: "not found".to_string(),
            last_modified: None,
        };
        match bad.into_success() {
            Err(FetchError::Http { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }
}
