//! mirath-core: data model for Islamic inheritance (faraid) calculation.
//!
//! Holds everything the engine reasons over but none of the reasoning:
//! exact fractions, heir categories and head counts, the estate and its
//! deductions, the four schools, and the versioned fiqh rule tables.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Fraction`] -- exact rational, always reduced
//! - [`HeirType`], [`HeirsData`] -- heir categories and head counts
//! - [`EstateData`] -- gross estate and deductions
//! - [`Madhab`] -- school of jurisprudence
//! - [`RuleDatabase`], [`MadhhabRuleSet`], [`HijabRule`] -- rule tables
//! - [`ValidationError`], [`ArithmeticError`] -- error taxonomy

pub mod error;
pub mod estate;
pub mod fraction;
pub mod heir;
pub mod madhab;
pub mod rules;

// ── Convenience re-exports ───────────────────────────────────────────

pub use error::{ArithmeticError, ValidationError};
pub use estate::EstateData;
pub use fraction::{Fraction, ParseFractionError};
pub use heir::{HeirType, HeirsData};
pub use madhab::Madhab;
pub use rules::{
    GrandfatherPolicy, HijabKind, HijabRule, MadhhabRuleSet, MotherWithFather, Reduction,
    RuleDatabase, CLASSICAL_RULES_VERSION,
};
