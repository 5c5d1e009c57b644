//! Read cache and change signalling for persisted content.
//!
//! - [`ContentCache`]: an owned, TTL-bounded cache of the site content record.
//! - [`ChangeSignal`]: an epoch counter readers poll to learn that content may
//!   have changed somewhere else.
//!
//! Both are plain values owned by whoever builds the persistence gateway, so two
//! editors in one process never share cached state unless they are handed the
//! same instance.
//!
//! ## Configuration
//!
//! ```toml
//! [storage]
//! cache_ttl_ms = 1000   # 0 disables the cache
//! ```

mod config;
mod events;
pub(crate) mod lock;
mod store;

pub use config::CacheConfig;
pub use events::{ChangeKind, ChangeSignal, ChangeSubscription, Epoch};
pub use store::ContentCache;
