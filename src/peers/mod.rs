//! Peers Module
//!
//! Key ownership across cache nodes and the transport seam used to reach them.
//!
//! A [`PeerRouter`] decides whether a key is served locally or by a remote
//! peer; a [`RemoteFetcher`] transfers the value from that peer.

mod hash_ring;
mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use hash_ring::{HashFn, HashRing, DEFAULT_REPLICAS};
pub use http::{HttpFetcher, HttpPool, DEFAULT_BASE_PATH};
pub(crate) use http::is_dot_segment;

// == Remote Fetcher ==
/// Transfers a value for `(group, key)` from one remote peer.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>>;
}

// == Peer Router ==
/// Picks the owner of a key.
pub trait PeerRouter: Send + Sync {
    /// Returns the fetcher of the remote owner, or `None` when the key is
    /// owned by this node or no peer is known.
    fn pick(&self, key: &str) -> Option<Arc<dyn RemoteFetcher>>;
}
