//! Mirath calculation engine -- accepts a madhab, an estate and heir
//! counts, produces exact fractional shares, amounts and an audit log.
//!
//! Pipeline (one pure, synchronous pass):
//! 1. Validate input and net the estate
//! 2. Apply hijab (complete and partial exclusion)
//! 3. Resolve fixed shares
//! 4. Distribute the residual to the residuary class
//! 5. Apply awl or radd when the shares do not sum to one
//! 6. Convert fractions to amounts
//!
//! All share arithmetic is exact; decimals appear only at the final
//! monetary projection.

pub mod amounts;
pub mod asaba;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fard;
pub mod hijab;
pub mod result;
pub mod shares;
pub mod special;
pub mod steps;

pub use cache::{CacheStats, CachedEngine};
pub use config::{CacheConfig, EngineConfig};
pub use engine::{Calculator, Engine};
pub use error::CalculationError;
pub use hijab::{apply_hijab, Exclusion, HijabOutcome};
pub use result::{CalculationRequest, CalculationResult, ErrorInfo, ShareRecord};
pub use shares::ShareBasis;
pub use special::SpecialCase;
pub use steps::{CalculationStage, StepRecord};

/// Calculate with the classical rule tables and default configuration.
///
/// Never fails: rejected input comes back as a result with
/// `success == false` and an error code.
pub fn calculate(request: &CalculationRequest) -> CalculationResult {
    Engine::classical().calculate(request)
}
