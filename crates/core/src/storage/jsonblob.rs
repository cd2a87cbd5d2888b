//! HTTP client for the JSON-blob hosting service.
//!
//! The service stores one opaque JSON document per id:
//!
//! | Operation | Request                  | Success                                      |
//! |-----------|--------------------------|----------------------------------------------|
//! | create    | `POST {base}` + body     | 201, `Location: {base}/{id}`                 |
//! | read      | `GET {base}/{id}`        | 200 + body                                   |
//! | replace   | `PUT {base}/{id}` + body | 200                                          |

use crate::{StoreError, StoreResult};
use reqwest::header::{ACCEPT, LOCATION};
use serde_json::Value;
use std::time::Duration;

/// Async client for a JSON-blob endpoint.
#[derive(Clone, Debug)]
pub struct JsonBlobClient {
    base_url: String,
    client: reqwest::Client,
}

impl JsonBlobClient {
    /// Create a client for `base_url`.
    ///
    /// With `timeout` set to `None` requests wait indefinitely for a response.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> StoreResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(StoreError::HttpClient)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Creates a new document holding `body` and returns its id.
    ///
    /// The id is the last path segment of the `Location` response header.
    pub async fn create_document(&self, body: &Value) -> StoreResult<String> {
        let response = self
            .client
            .post(&self.base_url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::RemoteStatus {
                status: status.as_u16(),
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(StoreError::MissingLocation)?;

        document_id_from_location(location).ok_or(StoreError::MissingLocation)
    }

    /// Fetches the whole document `id`.
    pub async fn read_document(&self, id: &str) -> StoreResult<Value> {
        tracing::debug!("GET blob document {}", id);
        let response = self
            .client
            .get(self.document_url(id))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::RemoteStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }

    /// Replaces the whole document `id` with `body`.
    pub async fn replace_document(&self, id: &str, body: &Value) -> StoreResult<()> {
        tracing::debug!("PUT blob document {}", id);
        let response = self
            .client
            .put(self.document_url(id))
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::RemoteStatus {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Extracts the trailing path segment of a `Location` header value.
pub(crate) fn document_id_from_location(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBlobServer;
    use serde_json::json;

    #[test]
    fn test_document_id_from_absolute_location() {
        assert_eq!(
            document_id_from_location("https://jsonblob.com/api/jsonBlob/1234567890").as_deref(),
            Some("1234567890")
        );
    }

    #[test]
    fn test_document_id_from_relative_location_with_trailing_slash_and_query() {
        assert_eq!(
            document_id_from_location("/api/jsonBlob/abc/?x=1").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_document_id_from_empty_location() {
        assert_eq!(document_id_from_location(""), None);
        assert_eq!(document_id_from_location("/"), None);
    }

    #[tokio::test]
    async fn test_create_read_replace_against_fake_service() {
        let server = FakeBlobServer::start().await;
        let client = JsonBlobClient::new(&server.base_url(), None).unwrap();

        let id = client.create_document(&json!([])).await.unwrap();
        assert_eq!(client.read_document(&id).await.unwrap(), json!([]));

        client
            .replace_document(&id, &json!([{"id": "p1"}]))
            .await
            .unwrap();
        assert_eq!(
            client.read_document(&id).await.unwrap(),
            json!([{"id": "p1"}])
        );
    }

    #[tokio::test]
    async fn test_read_unknown_document_is_status_error() {
        let server = FakeBlobServer::start().await;
        let client = JsonBlobClient::new(&server.base_url(), None).unwrap();

        let err = client.read_document("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::RemoteStatus { status: 404 }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = JsonBlobClient::new(
            &format!("http://{addr}/api/jsonBlob"),
            Some(Duration::from_secs(2)),
        )
        .unwrap();

        let err = client.read_document("abc").await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }
}
