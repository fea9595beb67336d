//! Lantern session core: a bounded, turn-aware token cache, the incremental
//! generation loop that feeds it, and the handle registry exposed to the
//! platform-binding layer. Model evaluation itself lives behind the
//! `lantern_abi::ModelRuntime` seam.

pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod eviction;
pub mod registry;
pub mod session;
pub mod stats;

pub use buffer::TokenBuffer;
pub use config::{DEFAULT_CACHE_CAPACITY, PerformanceMode, SessionConfig, is_quantized_model_path};
pub use error::{Result, SessionError};
pub use registry::{SessionId, SessionRegistry};
pub use session::Session;
pub use stats::{SessionStats, StatsSnapshot};
