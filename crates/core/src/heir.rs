//! Heir categories and per-category head counts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The closed set of classical heir categories.
///
/// Declaration order is the canonical priority order used wherever a
/// deterministic "first heir" is needed (for example when a rounding
/// remainder has to land on exactly one share).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeirType {
    Husband,
    Wife,
    Son,
    Daughter,
    /// Son's son.
    Grandson,
    /// Son's daughter.
    Granddaughter,
    Father,
    Mother,
    /// Father's father.
    Grandfather,
    /// Father's mother.
    PaternalGrandmother,
    /// Mother's mother.
    MaternalGrandmother,
    FullBrother,
    FullSister,
    /// Consanguine brother (same father).
    PaternalBrother,
    /// Consanguine sister (same father).
    PaternalSister,
    /// Uterine brother (same mother).
    MaternalBrother,
    /// Uterine sister (same mother).
    MaternalSister,
    /// Son of a full brother.
    FullNephew,
    /// Son of a consanguine brother.
    PaternalNephew,
    /// Full brother of the father.
    FullUncle,
    /// Consanguine brother of the father.
    PaternalUncle,
}

impl HeirType {
    pub const ALL: [HeirType; 21] = [
        HeirType::Husband,
        HeirType::Wife,
        HeirType::Son,
        HeirType::Daughter,
        HeirType::Grandson,
        HeirType::Granddaughter,
        HeirType::Father,
        HeirType::Mother,
        HeirType::Grandfather,
        HeirType::PaternalGrandmother,
        HeirType::MaternalGrandmother,
        HeirType::FullBrother,
        HeirType::FullSister,
        HeirType::PaternalBrother,
        HeirType::PaternalSister,
        HeirType::MaternalBrother,
        HeirType::MaternalSister,
        HeirType::FullNephew,
        HeirType::PaternalNephew,
        HeirType::FullUncle,
        HeirType::PaternalUncle,
    ];

    pub const SPOUSES: [HeirType; 2] = [HeirType::Husband, HeirType::Wife];

    pub const DESCENDANTS: [HeirType; 4] = [
        HeirType::Son,
        HeirType::Daughter,
        HeirType::Grandson,
        HeirType::Granddaughter,
    ];

    pub const FEMALE_DESCENDANTS: [HeirType; 2] = [HeirType::Daughter, HeirType::Granddaughter];

    pub const SIBLINGS: [HeirType; 6] = [
        HeirType::FullBrother,
        HeirType::FullSister,
        HeirType::PaternalBrother,
        HeirType::PaternalSister,
        HeirType::MaternalBrother,
        HeirType::MaternalSister,
    ];

    pub const AGNATIC_SIBLINGS: [HeirType; 4] = [
        HeirType::FullBrother,
        HeirType::FullSister,
        HeirType::PaternalBrother,
        HeirType::PaternalSister,
    ];

    pub const UTERINE_SIBLINGS: [HeirType; 2] = [HeirType::MaternalBrother, HeirType::MaternalSister];

    /// Nephews and uncles, nearest first.
    pub const REMOTE_AGNATES: [HeirType; 4] = [
        HeirType::FullNephew,
        HeirType::PaternalNephew,
        HeirType::FullUncle,
        HeirType::PaternalUncle,
    ];

    /// Key used at the input boundary and in serialized output.
    pub fn key(&self) -> &'static str {
        match self {
            HeirType::Husband => "husband",
            HeirType::Wife => "wife",
            HeirType::Son => "son",
            HeirType::Daughter => "daughter",
            HeirType::Grandson => "grandson",
            HeirType::Granddaughter => "granddaughter",
            HeirType::Father => "father",
            HeirType::Mother => "mother",
            HeirType::Grandfather => "grandfather",
            HeirType::PaternalGrandmother => "paternal_grandmother",
            HeirType::MaternalGrandmother => "maternal_grandmother",
            HeirType::FullBrother => "full_brother",
            HeirType::FullSister => "full_sister",
            HeirType::PaternalBrother => "paternal_brother",
            HeirType::PaternalSister => "paternal_sister",
            HeirType::MaternalBrother => "maternal_brother",
            HeirType::MaternalSister => "maternal_sister",
            HeirType::FullNephew => "full_nephew",
            HeirType::PaternalNephew => "paternal_nephew",
            HeirType::FullUncle => "full_uncle",
            HeirType::PaternalUncle => "paternal_uncle",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            HeirType::Husband => "Husband",
            HeirType::Wife => "Wife",
            HeirType::Son => "Son",
            HeirType::Daughter => "Daughter",
            HeirType::Grandson => "Son's son",
            HeirType::Granddaughter => "Son's daughter",
            HeirType::Father => "Father",
            HeirType::Mother => "Mother",
            HeirType::Grandfather => "Paternal grandfather",
            HeirType::PaternalGrandmother => "Paternal grandmother",
            HeirType::MaternalGrandmother => "Maternal grandmother",
            HeirType::FullBrother => "Full brother",
            HeirType::FullSister => "Full sister",
            HeirType::PaternalBrother => "Consanguine brother",
            HeirType::PaternalSister => "Consanguine sister",
            HeirType::MaternalBrother => "Uterine brother",
            HeirType::MaternalSister => "Uterine sister",
            HeirType::FullNephew => "Full brother's son",
            HeirType::PaternalNephew => "Consanguine brother's son",
            HeirType::FullUncle => "Full paternal uncle",
            HeirType::PaternalUncle => "Consanguine paternal uncle",
        }
    }

    pub fn from_key(key: &str) -> Option<HeirType> {
        let normalized = key.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        HeirType::ALL
            .iter()
            .copied()
            .find(|h| h.key() == normalized)
    }

    pub fn is_spouse(&self) -> bool {
        matches!(self, HeirType::Husband | HeirType::Wife)
    }

    pub fn is_male(&self) -> bool {
        matches!(
            self,
            HeirType::Husband
                | HeirType::Son
                | HeirType::Grandson
                | HeirType::Father
                | HeirType::Grandfather
                | HeirType::FullBrother
                | HeirType::PaternalBrother
                | HeirType::MaternalBrother
                | HeirType::FullNephew
                | HeirType::PaternalNephew
                | HeirType::FullUncle
                | HeirType::PaternalUncle
        )
    }

    /// Upper bound on the head count for categories that admit one.
    pub fn max_count(&self) -> Option<u32> {
        match self {
            HeirType::Husband
            | HeirType::Father
            | HeirType::Mother
            | HeirType::Grandfather
            | HeirType::PaternalGrandmother
            | HeirType::MaternalGrandmother => Some(1),
            HeirType::Wife => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for HeirType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for HeirType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HeirType::from_key(s).ok_or_else(|| ValidationError::UnknownHeirType { key: s.to_string() })
    }
}

// ──────────────────────────────────────────────
// Head counts
// ──────────────────────────────────────────────

/// Head count per heir category. Only positive counts are stored, so two
/// values compare equal exactly when every category has the same count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<HeirType, u32>", into = "BTreeMap<HeirType, u32>")]
pub struct HeirsData(BTreeMap<HeirType, u32>);

impl HeirsData {
    pub fn new() -> Self {
        HeirsData(BTreeMap::new())
    }

    /// Builder form of [`HeirsData::set`].
    pub fn with(mut self, heir: HeirType, count: u32) -> Self {
        self.set(heir, count);
        self
    }

    /// Set a category's count; zero removes the category.
    pub fn set(&mut self, heir: HeirType, count: u32) {
        if count == 0 {
            self.0.remove(&heir);
        } else {
            self.0.insert(heir, count);
        }
    }

    pub fn count(&self, heir: HeirType) -> u32 {
        self.0.get(&heir).copied().unwrap_or(0)
    }

    pub fn is_present(&self, heir: HeirType) -> bool {
        self.count(heir) > 0
    }

    pub fn any_present(&self, heirs: &[HeirType]) -> bool {
        heirs.iter().any(|h| self.is_present(*h))
    }

    /// Summed head count over several categories.
    pub fn total_of(&self, heirs: &[HeirType]) -> u64 {
        heirs.iter().map(|h| u64::from(self.count(*h))).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Present categories with their counts, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (HeirType, u32)> + '_ {
        self.0.iter().map(|(h, c)| (*h, *c))
    }

    pub fn present(&self) -> Vec<HeirType> {
        self.0.keys().copied().collect()
    }

    /// Convert an untyped key→count map, rejecting unknown keys, negative
    /// counts and impossible family structures.
    pub fn from_raw(raw: &BTreeMap<String, i64>) -> Result<HeirsData, ValidationError> {
        let mut heirs = HeirsData::new();
        for (key, &count) in raw {
            let heir = HeirType::from_key(key)
                .ok_or_else(|| ValidationError::UnknownHeirType { key: key.clone() })?;
            if count < 0 {
                return Err(ValidationError::NegativeHeirCount {
                    heir: key.clone(),
                    count,
                });
            }
            let count = u32::try_from(count).map_err(|_| ValidationError::HeirCountExceedsLimit {
                heir,
                count,
                max: u32::MAX,
            })?;
            heirs.set(heir, heirs.count(heir).saturating_add(count));
        }
        heirs.validate()?;
        Ok(heirs)
    }

    /// Structural checks shared by the typed and untyped entry points.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NoHeirsSpecified);
        }
        for (heir, count) in self.iter() {
            if let Some(max) = heir.max_count() {
                if count > max {
                    return Err(ValidationError::HeirCountExceedsLimit {
                        heir,
                        count: i64::from(count),
                        max,
                    });
                }
            }
        }
        if self.is_present(HeirType::Husband) && self.is_present(HeirType::Wife) {
            return Err(ValidationError::ConflictingSpouses);
        }
        Ok(())
    }
}

impl FromIterator<(HeirType, u32)> for HeirsData {
    fn from_iter<I: IntoIterator<Item = (HeirType, u32)>>(iter: I) -> Self {
        let mut heirs = HeirsData::new();
        for (heir, count) in iter {
            heirs.set(heir, count);
        }
        heirs
    }
}

/// Deserialized head counts pass the same checks as [`HeirsData::from_raw`].
impl TryFrom<BTreeMap<HeirType, u32>> for HeirsData {
    type Error = ValidationError;

    fn try_from(map: BTreeMap<HeirType, u32>) -> Result<Self, Self::Error> {
        let heirs: HeirsData = map.into_iter().collect();
        heirs.validate()?;
        Ok(heirs)
    }
}

impl From<HeirsData> for BTreeMap<HeirType, u32> {
    fn from(heirs: HeirsData) -> Self {
        heirs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn keys_round_trip() {
        for heir in HeirType::ALL {
            assert_eq!(HeirType::from_key(heir.key()), Some(heir));
        }
        assert_eq!(HeirType::from_key("Full-Brother"), Some(HeirType::FullBrother));
        assert_eq!(HeirType::from_key("cousin"), None);
    }

    #[test]
    fn canonical_order_starts_with_spouses() {
        let mut sorted = HeirType::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, HeirType::ALL.to_vec());
        assert_eq!(sorted[0], HeirType::Husband);
    }

    #[test]
    fn zero_counts_are_not_stored() {
        let heirs = HeirsData::new()
            .with(HeirType::Son, 2)
            .with(HeirType::Daughter, 0);
        assert_eq!(heirs.present(), vec![HeirType::Son]);
        assert_eq!(heirs, HeirsData::new().with(HeirType::Son, 2));
    }

    #[test]
    fn from_raw_accepts_valid_input() {
        let heirs = HeirsData::from_raw(&raw(&[("wife", 2), ("son", 1), ("daughter", 0)])).unwrap();
        assert_eq!(heirs.count(HeirType::Wife), 2);
        assert_eq!(heirs.count(HeirType::Son), 1);
        assert!(!heirs.is_present(HeirType::Daughter));
    }

    #[test]
    fn from_raw_rejects_unknown_keys() {
        let err = HeirsData::from_raw(&raw(&[("cousin", 1)])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownHeirType {
                key: "cousin".to_string()
            }
        );
    }

    #[test]
    fn from_raw_rejects_negative_counts() {
        let err = HeirsData::from_raw(&raw(&[("son", -1)])).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeHeirCount { count: -1, .. }));
    }

    #[test]
    fn from_raw_requires_an_heir() {
        let err = HeirsData::from_raw(&raw(&[("son", 0)])).unwrap_err();
        assert_eq!(err, ValidationError::NoHeirsSpecified);
        let err = HeirsData::from_raw(&BTreeMap::new()).unwrap_err();
        assert_eq!(err, ValidationError::NoHeirsSpecified);
    }

    #[test]
    fn structural_limits() {
        let err = HeirsData::from_raw(&raw(&[("wife", 5)])).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::HeirCountExceedsLimit { heir: HeirType::Wife, max: 4, .. }
        ));
        let err = HeirsData::from_raw(&raw(&[("father", 2)])).unwrap_err();
        assert!(matches!(err, ValidationError::HeirCountExceedsLimit { max: 1, .. }));
        let err = HeirsData::from_raw(&raw(&[("husband", 1), ("wife", 1)])).unwrap_err();
        assert_eq!(err, ValidationError::ConflictingSpouses);
    }

    #[test]
    fn deserialization_applies_structural_checks() {
        let heirs: HeirsData =
            serde_json::from_str(r#"{"wife": 2, "son": 1, "daughter": 0}"#).unwrap();
        assert_eq!(heirs.count(HeirType::Wife), 2);
        assert!(!heirs.is_present(HeirType::Daughter));
        let back = serde_json::to_value(&heirs).unwrap();
        assert_eq!(back, serde_json::json!({"wife": 2, "son": 1}));

        for invalid in [
            r#"{}"#,
            r#"{"daughter": 0}"#,
            r#"{"wife": 5}"#,
            r#"{"husband": 1, "wife": 1}"#,
        ] {
            assert!(serde_json::from_str::<HeirsData>(invalid).is_err(), "{}", invalid);
        }
    }

    #[test]
    fn group_queries() {
        let heirs = HeirsData::new()
            .with(HeirType::FullBrother, 1)
            .with(HeirType::MaternalSister, 2);
        assert_eq!(heirs.total_of(&HeirType::SIBLINGS), 3);
        assert!(heirs.any_present(&HeirType::UTERINE_SIBLINGS));
        assert!(!heirs.any_present(&HeirType::DESCENDANTS));
    }
}
