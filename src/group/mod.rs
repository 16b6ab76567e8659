//! Group Module
//!
//! Named cache namespaces and the registry that owns them.

#[allow(clippy::module_inception)]
mod group;
mod registry;
mod retriever;

pub use group::Group;
pub use registry::{GroupRegistry, DEFAULT_FLIGHT_TTL};
pub use retriever::{RetrieveFn, Retriever, StaticRetriever};
