//! Cache
//!
//! Este módulo contiene el cache de listados de despachos.

pub mod cache_config;
pub mod dispatch_cache;

pub use cache_config::CacheConfig;
pub use dispatch_cache::{CacheStats, DispatchCache};
