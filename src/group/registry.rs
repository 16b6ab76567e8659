//! Group Registry
//!
//! Name to group lookup shared by the HTTP layer and background tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::info;

use super::{Group, Retriever};
use crate::cache::EvictionPolicy;
use crate::error::{CacheError, Result};
use crate::peers::is_dot_segment;

/// Default lifetime of a coalesced result.
pub const DEFAULT_FLIGHT_TTL: Duration = Duration::from_secs(10);

// == Group Registry ==
/// Cloneable handle to the set of groups on this node.
#[derive(Clone)]
pub struct GroupRegistry {
    groups: Arc<RwLock<HashMap<String, Arc<Group>>>>,
    flight_ttl: Duration,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FLIGHT_TTL)
    }
}

impl GroupRegistry {
    pub fn new(flight_ttl: Duration) -> Self {
        Self {
            groups: Arc::new(RwLock::new(HashMap::new())),
            flight_ttl,
        }
    }

    // == New Group ==
    /// Creates and registers a group.
    ///
    /// If `name` is already registered the existing group is returned
    /// unchanged and the other arguments are ignored.
    pub fn new_group(
        &self,
        name: &str,
        policy: EvictionPolicy,
        max_bytes: usize,
        retriever: Arc<dyn Retriever>,
    ) -> Result<Arc<Group>> {
        if name.is_empty() {
            return Err(CacheError::InvalidRequest(
                "group name is required".to_string(),
            ));
        }
        if is_dot_segment(name) {
            return Err(CacheError::InvalidRequest(format!(
                "group name '{}' is reserved",
                name
            )));
        }

        let mut groups = self.groups.write();
        if let Some(existing) = groups.get(name) {
            return Ok(Arc::clone(existing));
        }

        let group = Arc::new(Group::new(
            name,
            policy,
            max_bytes,
            retriever,
            self.flight_ttl,
        ));
        groups.insert(name.to_string(), Arc::clone(&group));
        info!(group = name, %policy, max_bytes, "group created");
        Ok(group)
    }

    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// All groups, ordered by name.
    pub fn groups(&self) -> Vec<Arc<Group>> {
        let mut groups: Vec<_> = self.groups.read().values().cloned().collect();
        groups.sort_by(|a, b| a.name().cmp(b.name()));
        groups
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
