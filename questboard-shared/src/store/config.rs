/// Document store configuration
///
/// # Environment Variables
///
/// - `QUESTBOARD_STORE_URL`: Base URL of the document server
///   (e.g. `http://127.0.0.1:8080`). Unset selects the in-memory store.
/// - `QUESTBOARD_STORE_TIMEOUT_MS`: Per-call timeout in milliseconds
///   (default: 10000, clamped to 100..=60000)
///
/// # Example
///
/// ```no_run
/// use questboard_shared::store::StoreConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = StoreConfig::from_env()?;
/// let store = config.build_store()?;
/// println!("Using {} store, timeout {:?}", store.name(), config.timeout().duration());
/// # Ok(())
/// # }
/// ```

use super::{DocumentStore, HttpDocumentStore, MemoryDocumentStore, StoreTimeout};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

/// Store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Document server base URL; `None` means in-memory
    pub url: Option<String>,

    /// Per-call timeout in milliseconds; `None` means the default
    pub timeout_ms: Option<u64>,
}

impl StoreConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `QUESTBOARD_STORE_TIMEOUT_MS` is not a number.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let url = env::var("QUESTBOARD_STORE_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let timeout_ms = match env::var("QUESTBOARD_STORE_TIMEOUT_MS") {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                anyhow::anyhow!("QUESTBOARD_STORE_TIMEOUT_MS must be a number of milliseconds: {}", e)
            })?),
            Err(_) => None,
        };

        Ok(Self { url, timeout_ms })
    }

    /// Timeout applied to every store call
    pub fn timeout(&self) -> StoreTimeout {
        StoreTimeout::from_millis(self.timeout_ms)
    }

    /// Builds the configured store
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build_store(&self) -> anyhow::Result<Arc<dyn DocumentStore>> {
        match &self.url {
            Some(url) => {
                tracing::info!(url = %url, "Using HTTP document store");
                Ok(Arc::new(HttpDocumentStore::new(url.clone(), self.timeout())?))
            }
            None => {
                tracing::info!("Using in-memory document store");
                Ok(Arc::new(MemoryDocumentStore::new()))
            }
        }
    }
}
