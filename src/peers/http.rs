//! HTTP Peer Binding
//!
//! Routes keys over the hash ring and fetches remote values with reqwest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::{HashRing, PeerRouter, RemoteFetcher};
use crate::error::{CacheError, Result};

/// Path prefix under which peers serve `<group>/<key>`.
pub const DEFAULT_BASE_PATH: &str = "/_gocache/";

/// True for `.` and `..`, which URL parsers collapse even when
/// percent-encoded, so they can never travel as a path segment.
pub(crate) fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

// == HTTP Fetcher ==
/// Fetches values from one peer at `GET {base_url}{group}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    base_url: String,
    client: Client,
}

impl HttpFetcher {
    /// `base_url` is the peer address joined with the base path,
    /// e.g. `http://10.0.0.1:9999/_gocache/`.
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the request URL with group and key percent-encoded as
    /// single path segments.
    pub fn url_for(&self, group: &str, key: &str) -> Result<Url> {
        if is_dot_segment(group) || is_dot_segment(key) {
            return Err(CacheError::InvalidRequest(format!(
                "'{}/{}' cannot be addressed over http",
                group, key
            )));
        }
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            CacheError::RemoteFetch(format!("bad peer url {}: {}", self.base_url, e))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                CacheError::RemoteFetch(format!("peer url {} cannot take a path", self.base_url))
            })?;
            segments.pop_if_empty().push(group).push(key);
        }
        Ok(url)
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>> {
        let url = self.url_for(group, key)?;
        debug!(%url, "fetching from peer");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CacheError::RemoteFetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::RemoteFetch(format!(
                "{} returned {}",
                url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::RemoteFetch(format!("reading body from {}: {}", url, e)))?;
        Ok(body.to_vec())
    }
}

// == Peer Snapshot ==
/// Ring plus clients, always replaced together.
#[derive(Debug, Default)]
struct PeerSnapshot {
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

// == HTTP Pool ==
/// Hash-ring router over a set of HTTP peers.
///
/// Membership changes build a fresh snapshot and swap it in under one lock,
/// so a concurrent `pick` sees either the old ring or the new one.
pub struct HttpPool {
    self_addr: String,
    base_path: String,
    replicas: usize,
    client: Client,
    snapshot: Mutex<Arc<PeerSnapshot>>,
}

impl HttpPool {
    // == Constructor ==
    /// Creates a pool for the node reachable at `self_addr`
    /// (e.g. `http://127.0.0.1:9999`). Peer requests time out after `timeout`.
    pub fn new(self_addr: impl Into<String>, replicas: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("building http client: {}", e)))?;

        Ok(Self {
            self_addr: self_addr.into().trim_end_matches('/').to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas,
            client,
            snapshot: Mutex::new(Arc::new(PeerSnapshot::default())),
        })
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    // == Set Peers ==
    /// Replaces the full peer set. The list should include this node.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers
            .into_iter()
            .map(|p| p.as_ref().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let mut ring = HashRing::new(self.replicas, None);
        ring.add_peers(&peers);

        let fetchers = peers
            .iter()
            .map(|peer| {
                let fetcher = HttpFetcher::new(
                    format!("{}{}", peer, self.base_path),
                    self.client.clone(),
                );
                (peer.clone(), Arc::new(fetcher))
            })
            .collect();

        *self.snapshot.lock() = Arc::new(PeerSnapshot { ring, fetchers });
        info!(node = %self.self_addr, ?peers, "peer set updated");
    }

    /// Peers currently on the ring.
    pub fn peers(&self) -> Vec<String> {
        self.snapshot.lock().ring.peers()
    }
}

impl PeerRouter for HttpPool {
    fn pick(&self, key: &str) -> Option<Arc<dyn RemoteFetcher>> {
        let snapshot = self.snapshot.lock().clone();
        let owner = snapshot.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }
        debug!(node = %self.self_addr, key, owner, "picked remote peer");
        let fetcher = snapshot.fetchers.get(owner)?;
        Some(Arc::clone(fetcher) as Arc<dyn RemoteFetcher>)
    }
}
