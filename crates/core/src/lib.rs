pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod numeric;
pub mod traits;

pub use cache::{CacheSource, CachedValue, FreshCache, Served};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::UpstreamError;
pub use models::*;
pub use traits::*;
