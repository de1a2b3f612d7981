//! Loki-backed log provider.
//!
//! Executes one backward `query_range` round over HTTP and decodes the JSON
//! envelope into [`LogLine`]s; the full retrieval is the pagination loop from
//! [`query`](super::query) followed by boundary deduplication.

use super::dedup::dedup_log_lines;
use super::query::{RangeQuery, collect_recent};
use super::{LogLine, LogProvider};
use ces_control_core::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, ClientBuilder, Url};
use serde::Deserialize;

const QUERY_RANGE_PATH: &str = "/loki/api/v1/query_range";

/// Connection settings for the Loki query endpoint.
#[derive(Debug, Clone)]
pub struct LokiConfig {
    /// Base URL of the Loki instance, e.g. `http://loki-gateway:3100`.
    pub base_url: String,
    /// HTTP Basic auth username.
    pub username: String,
    /// HTTP Basic auth password.
    pub password: String,
    /// Maximum lines requested per pagination round.
    pub page_limit: usize,
    /// Width of one backward query window.
    pub lookback: Duration,
}

/// Log provider querying a Loki instance.
///
/// Holds no per-request state; every retrieval builds its own accumulator
/// and dedup working set.
#[derive(Debug)]
pub struct LokiLogProvider {
    client: Client,
    query_url: Url,
    username: String,
    password: String,
    page_limit: usize,
    lookback: Duration,
}

impl LokiLogProvider {
    /// Creates a provider for the given endpoint. Fails if the base URL is
    /// malformed or the HTTP client cannot be built; no network I/O happens
    /// here.
    pub fn new(config: LokiConfig) -> Result<Self> {
        let endpoint = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            QUERY_RANGE_PATH
        );
        let query_url = Url::parse(&endpoint).map_err(|e| Error::QueryConstruction {
            context: format!("invalid Loki base URL {:?}: {e}", config.base_url),
        })?;

        let client = ClientBuilder::new()
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::QueryConstruction {
                context: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            query_url,
            username: config.username,
            password: config.password,
            page_limit: config.page_limit,
            lookback: config.lookback,
        })
    }
}

#[async_trait::async_trait]
impl LogProvider for LokiLogProvider {
    async fn get_logs(&self, dogu_name: &str, max_lines: i64) -> Result<Vec<LogLine>> {
        let lines =
            collect_recent(self, dogu_name, max_lines, self.page_limit, self.lookback).await?;
        Ok(dedup_log_lines(lines))
    }
}

#[async_trait::async_trait]
impl RangeQuery for LokiLogProvider {
    async fn query_range(
        &self,
        selector: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LogLine>> {
        // Select all pods whose name starts with the dogu name.
        let query = format!("{{pod=~\"{selector}.*\"}}");
        let limit_param = limit.to_string();
        let start_param = timestamp_nanos(start)?.to_string();
        let end_param = timestamp_nanos(end)?.to_string();

        let response = self
            .client
            .get(self.query_url.clone())
            .query(&[
                ("query", query.as_str()),
                ("direction", "backward"),
                ("limit", limit_param.as_str()),
                ("start", start_param.as_str()),
                ("end", end_param.as_str()),
            ])
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| Error::Transport {
                context: format!("query_range request failed: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Transport {
            context: format!("failed to read query_range response: {e}"),
        })?;

        if !status.is_success() {
            return Err(Error::BackendProtocol {
                context: format!("query_range returned status {status}: {body}"),
            });
        }

        let envelope: QueryRangeResponse =
            serde_json::from_str(&body).map_err(|e| Error::Decode {
                context: format!("invalid query_range body: {e}"),
            })?;

        decode_batch(envelope)
    }
}

fn timestamp_nanos(instant: DateTime<Utc>) -> Result<i64> {
    instant
        .timestamp_nanos_opt()
        .ok_or_else(|| Error::QueryConstruction {
            context: format!("instant {instant} is outside the nanosecond range"),
        })
}

/// JSON envelope of a Loki `query_range` response. Stream labels are not
/// needed and left undeclared.
#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    status: String,
    data: QueryRangeData,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: Vec<LokiStream>,
}

#[derive(Debug, Deserialize)]
struct LokiStream {
    /// `[timestamp-in-nanoseconds, line]` string pairs.
    values: Vec<(String, String)>,
}

/// Flattens all label-grouped streams into lines and re-sorts them ascending
/// by timestamp. `Vec::sort_by_key` is stable, so lines sharing a timestamp
/// keep their relative order.
fn decode_batch(envelope: QueryRangeResponse) -> Result<Vec<LogLine>> {
    if envelope.status != "success" {
        return Err(Error::BackendProtocol {
            context: format!("unexpected response status {:?}", envelope.status),
        });
    }
    if envelope.data.result_type != "streams" {
        return Err(Error::BackendProtocol {
            context: format!("unexpected result type {:?}", envelope.data.result_type),
        });
    }

    let mut lines = Vec::new();
    for stream in envelope.data.result {
        for (raw_timestamp, value) in stream.values {
            let nanos: i64 = raw_timestamp.parse().map_err(|_| Error::BackendProtocol {
                context: format!("unparseable timestamp {:?}", raw_timestamp),
            })?;
            lines.push(LogLine {
                timestamp: DateTime::from_timestamp_nanos(nanos),
                value,
            });
        }
    }

    lines.sort_by_key(|line| line.timestamp);
    Ok(lines)
}
