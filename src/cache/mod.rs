pub mod ttl_cache;

pub use ttl_cache::{CacheEntry, CacheStats, TtlCache, DEFAULT_TTL};

use crate::discovery::ManagerStatus;
use crate::managers::ManagerId;

/// Last resolved status per manager
pub type PathCache = TtlCache<ManagerId, ManagerStatus>;
