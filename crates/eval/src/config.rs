//! Engine configuration.
//!
//! Everything here is advisory tuning: none of these values changes which
//! fiqh rule applies or the exact fraction an heir receives. The epsilon
//! only decides whether awl or radd triggers; the correction itself stays
//! exact.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! trigger_epsilon = "0.0001"
//! amount_scale = 2
//! latency_budget_ms = 50
//!
//! [cache]
//! capacity = 256
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `[engine]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window around 1 inside which neither awl nor radd fires.
    pub trigger_epsilon: Decimal,
    /// Minor-unit digits amounts are rounded to.
    pub amount_scale: u32,
    /// Calculations slower than this lose `latency_penalty` confidence.
    pub latency_budget_ms: u64,
    pub awl_penalty: f64,
    pub radd_penalty: f64,
    pub latency_penalty: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            trigger_epsilon: Decimal::new(1, 4),
            amount_scale: 2,
            latency_budget_ms: 50,
            awl_penalty: 0.1,
            radd_penalty: 0.05,
            latency_penalty: 0.05,
        }
    }
}

/// `[cache]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached results; 0 disables caching.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { capacity: 256 }
    }
}
