//! Where a visitor's tokens live between requests.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::TokenPair;

/// Storage for one visitor's token pair.
///
/// The web apps implement this over the visitor's session; the CLI and
/// tests use [`MemoryTokenStore`]. Storage failures are logged by the
/// implementation rather than surfaced, since a lost save only costs an
/// extra refresh later.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> impl Future<Output = Option<TokenPair>> + Send;
    fn save(&self, tokens: &TokenPair) -> impl Future<Output = ()> + Send;
    fn clear(&self) -> impl Future<Output = ()> + Send;
}

/// In-memory token store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<TokenPair>>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with tokens already present.
    #[must_use]
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(tokens))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Option<TokenPair> {
        self.slot.read().await.clone()
    }

    async fn save(&self, tokens: &TokenPair) {
        *self.slot.write().await = Some(tokens.clone());
    }

    async fn clear(&self) {
        *self.slot.write().await = None;
    }
}
