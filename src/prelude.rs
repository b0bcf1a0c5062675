pub use crate::error::{ConfigError, InvariantError};
pub use crate::policy::lirs::{
    Classification, ConcurrentLirsCache, LirsCache, DEFAULT_HIR_RATIO,
};
pub use crate::store::{ResidentStore, StoreCore, StoreFull, StoreMetrics, StoreMut};
pub use crate::traits::{CoreCache, ReadOnlyCache};
