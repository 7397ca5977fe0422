//! Configuración de cache
//!
//! Este módulo contiene la configuración para el cache de despachos.

use std::time::Duration;

/// Configuración del cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Tiempo de vida de cada listado cacheado
    pub ttl: Duration,
    /// Número máximo de listados (uno por combinación de filtros)
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30), // igual que el intervalo de polling del tablero
            max_entries: 64,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            ..Self::default()
        }
    }
}
