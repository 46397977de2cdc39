//! Druid SQL client: sends the task aggregation query and decodes the rows.

use async_trait::async_trait;
use tracing::debug;

use super::decode::{decode_rows, DecodeError};
use super::query::TaskQuery;
use super::source::TaskSource;
use crate::config::{defaults, DruidConfig};
use crate::types::TaskCountRecord;

/// Failure of one query round trip.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Connect, send, timeout or body-read failure
    #[error("transport error querying {uri}: {source}")]
    Transport {
        uri: String,
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered, but not with a 2xx
    #[error("upstream {uri} returned status {status}: {body}")]
    UpstreamStatus {
        uri: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode response from {uri}: {source}")]
    Decode {
        uri: String,
        #[source]
        source: DecodeError,
    },
}

impl QueryError {
    /// Transport-level failures: the upstream was not reachable or refused
    /// the request.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::UpstreamStatus { .. })
    }

    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// HTTP client for the Druid router/broker SQL API.
#[derive(Debug, Clone)]
pub struct DruidClient {
    http: reqwest::Client,
    uri: String,
    query: TaskQuery,
}

impl DruidClient {
    /// Build a client for `config.uri` grouping on `status_column`.
    pub fn new(config: &DruidConfig, status_column: &str) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            uri: config.uri.clone(),
            query: TaskQuery::new(status_column),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub const fn query(&self) -> &TaskQuery {
        &self.query
    }

    /// POST the aggregation query and decode the JSON rows.
    ///
    /// One network call, no retries.
    pub async fn query_tasks(&self) -> Result<Vec<TaskCountRecord>, QueryError> {
        let resp = self
            .http
            .post(&self.uri)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&self.query.request_body())
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| self.transport(e))?;

        if !status.is_success() {
            return Err(QueryError::UpstreamStatus {
                uri: self.uri.clone(),
                status,
                body: snippet(&body),
            });
        }

        debug!(uri = %self.uri, bytes = body.len(), "Received task counts");

        decode_rows(&body, self.query.status_column()).map_err(|source| QueryError::Decode {
            uri: self.uri.clone(),
            source,
        })
    }

    fn transport(&self, source: reqwest::Error) -> QueryError {
        QueryError::Transport {
            uri: self.uri.clone(),
            source,
        }
    }
}

#[async_trait]
impl TaskSource for DruidClient {
    async fn fetch(&self) -> Result<Vec<TaskCountRecord>, QueryError> {
        self.query_tasks().await
    }

    fn source_name(&self) -> &str {
        &self.uri
    }
}

/// Leading part of an error body, lossily decoded, for log lines.
fn snippet(body: &[u8]) -> String {
    let end = body.len().min(defaults::ERROR_BODY_SNIPPET_BYTES);
    String::from_utf8_lossy(&body[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, status_column: &str) -> DruidClient {
        let config = DruidConfig {
            uri: format!("{}/druid/v2/sql/", server.uri()),
            timeout_secs: 5,
        };
        DruidClient::new(&config, status_column).unwrap()
    }

    #[tokio::test]
    async fn test_posts_query_and_decodes_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/druid/v2/sql/"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "query": "SELECT type,runner_status,count(*) AS total FROM sys.tasks GROUP BY type,runner_status"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"type": "index", "runner_status": "RUNNING", "total": 3}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server, "runner_status").query_tasks().await.unwrap();
        assert_eq!(records, vec![TaskCountRecord::new("index", "RUNNING", 3)]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server, "runner_status").query_tasks().await.unwrap_err();
        assert!(err.is_decode(), "{err}");
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_level() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_string(r#"{"error":"Unknown exception","errorMessage":"boom"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, "status").query_tasks().await.unwrap_err();
        assert!(err.is_transport());
        match err {
            QueryError::UpstreamStatus { status, body, .. } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected upstream status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = DruidConfig {
            uri: format!("http://127.0.0.1:{port}/druid/v2/sql/"),
            timeout_secs: 5,
        };
        let client = DruidClient::new(&config, "runner_status").unwrap();

        let err = client.query_tasks().await.unwrap_err();
        assert!(matches!(err, QueryError::Transport { .. }), "{err}");
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let body = vec![b'x'; defaults::ERROR_BODY_SNIPPET_BYTES * 2];
        assert_eq!(snippet(&body).len(), defaults::ERROR_BODY_SNIPPET_BYTES);
    }
}
