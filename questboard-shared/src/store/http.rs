/// HTTP document store client
///
/// Talks to the `questboard-api` document server:
///
/// ```text
/// GET   /v1/users/{user_id}/state   → 200 document | 404
/// PUT   /v1/users/{user_id}/state   → 201 {"created": true} | 200 {"created": false}
/// PATCH /v1/users/{user_id}/state   → 204 | 404
/// ```
///
/// The underlying `reqwest` client carries the store timeout as well, so a
/// hung connection is cut off even when the caller forgets to bound it.

use super::{DocumentStore, StoreError, StoreResult, StoreTimeout};
use crate::models::{UserDocument, UserId};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

/// Body returned by the create endpoint
#[derive(Debug, Deserialize)]
struct CreateResponse {
    created: bool,
}

/// `DocumentStore` backed by the document server's REST API
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: Url,
    timeout: StoreTimeout,
}

impl HttpDocumentStore {
    /// Creates a client for the server at `base_url`
    ///
    /// # Errors
    ///
    /// `StoreError::Transport` if the URL is invalid or the client cannot be built.
    pub fn new(base_url: impl AsRef<str>, timeout: StoreTimeout) -> StoreResult<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| StoreError::Transport(format!("invalid store URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Transport(format!(
                "store URL cannot be a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout.duration())
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpDocumentStore {
            client,
            base_url,
            timeout,
        })
    }

    /// `{base}/v1/users/{user_id}/state`, with the id percent-encoded
    fn state_url(&self, user: &UserId) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("store URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v1", "users", user.as_str(), "state"]);
        Ok(url)
    }

    /// Maps a client error; timeouts report the configured duration like
    /// `StoreTimeout::run` does
    fn request_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout.duration())
        } else if err.is_decode() {
            StoreError::Transport(format!("invalid response body: {}", err))
        } else {
            StoreError::Transport(err.to_string())
        }
    }

    /// Turns an unexpected response into a store error
    async fn unexpected(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StoreError::Unavailable(format!("document server returned {}: {}", status, body))
    }
}


#[async_trait]
impl DocumentStore for HttpDocumentStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn get(&self, user: &UserId) -> StoreResult<Option<UserDocument>> {
        let response = self
            .client
            .get(self.state_url(user)?)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        match response.status() {
            StatusCode::OK => {
                let document = response
                    .json::<UserDocument>()
                    .await
                    .map_err(|e| self.request_error(e))?;
                Ok(Some(document))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn create_if_absent(&self, user: &UserId, document: UserDocument) -> StoreResult<bool> {
        let response = self
            .client
            .put(self.state_url(user)?)
            .json(&document)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body = response
                    .json::<CreateResponse>()
                    .await
                    .map_err(|e| self.request_error(e))?;
                Ok(body.created)
            }
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn update(&self, user: &UserId, patch: UserDocument) -> StoreResult<()> {
        let response = self
            .client
            .patch(self.state_url(user)?)
            .json(&patch)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(user.clone())),
            _ => Err(Self::unexpected(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_state_url_encodes_user_id() {
        let store = HttpDocumentStore::new("http://localhost:8080/", StoreTimeout::default()).unwrap();
        let user = UserId::new("a b/c").unwrap();

        let url = store.state_url(&user).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/users/a%20b%2Fc/state");
    }

    #[test]
    fn test_state_url_keeps_base_path() {
        let store =
            HttpDocumentStore::new("http://localhost:8080/docs", StoreTimeout::default()).unwrap();
        let user = UserId::new("u1").unwrap();

        let url = store.state_url(&user).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/docs/v1/users/u1/state");
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = StoreTimeout::new(Duration::from_millis(200));
        let store = HttpDocumentStore::new(format!("http://{}", addr), timeout).unwrap();
        let user = UserId::new("u1").unwrap();

        let result = store.get(&user).await;
        assert!(
            matches!(result, Err(StoreError::Timeout(d)) if d == timeout.duration()),
            "unexpected result: {:?}",
            result
        );
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(HttpDocumentStore::new("not a url", StoreTimeout::default()).is_err());
        assert!(HttpDocumentStore::new("mailto:someone@example.com", StoreTimeout::default()).is_err());
    }
}
