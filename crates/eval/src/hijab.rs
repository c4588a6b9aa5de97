//! Hijab engine: complete and partial exclusion.
//!
//! Every rule is judged against the original head counts, never against a
//! progressively filtered copy, so the outcome does not depend on rule
//! order. Complete rules zero the blocked counts; partial rules only attach
//! a [`Reduction`] flag that the fixed-share resolver reads to pick a
//! fraction.

use std::collections::{BTreeMap, BTreeSet};

use mirath_core::{HeirType, HeirsData, HijabKind, MadhhabRuleSet, Reduction};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why one heir category was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub heir: HeirType,
    /// Blockers of the first rule that excluded the heir, present in the input.
    pub blocked_by: Vec<HeirType>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HijabOutcome {
    pub filtered: HeirsData,
    /// One entry per excluded category, in canonical order.
    pub exclusions: Vec<Exclusion>,
    /// Partial-exclusion flags for heirs that still inherit.
    pub reductions: BTreeMap<HeirType, BTreeSet<Reduction>>,
    pub log: Vec<String>,
}

impl HijabOutcome {
    /// Categories that had a positive count and were excluded.
    pub fn blocked_heirs(&self) -> Vec<HeirType> {
        self.exclusions.iter().map(|e| e.heir).collect()
    }

    pub fn is_reduced(&self, heir: HeirType, reduction: Reduction) -> bool {
        self.reductions
            .get(&heir)
            .is_some_and(|set| set.contains(&reduction))
    }
}

pub fn apply_hijab(heirs: &HeirsData, rules: &MadhhabRuleSet) -> HijabOutcome {
    let mut filtered = heirs.clone();
    let mut exclusions: BTreeMap<HeirType, Exclusion> = BTreeMap::new();
    let mut log = Vec::new();

    for rule in rules.complete_rules().filter(|r| r.fires(heirs)) {
        for &heir in &rule.blocked {
            if !heirs.is_present(heir) || exclusions.contains_key(&heir) {
                continue;
            }
            filtered.set(heir, 0);
            let blocked_by: Vec<HeirType> = rule
                .blockers
                .iter()
                .copied()
                .filter(|b| heirs.is_present(*b))
                .collect();
            let reason = rule.describe();
            debug!(heir = %heir, reason = %reason, "heir excluded");
            log.push(format!("{} excluded: {}", heir.label(), reason));
            exclusions.insert(
                heir,
                Exclusion {
                    heir,
                    blocked_by,
                    reason,
                },
            );
        }
    }

    let mut reductions: BTreeMap<HeirType, BTreeSet<Reduction>> = BTreeMap::new();
    for rule in rules.partial_rules().filter(|r| r.fires(heirs)) {
        let HijabKind::Partial(reduction) = rule.kind else {
            continue;
        };
        for &heir in rule.blocked.iter().filter(|h| filtered.is_present(**h)) {
            if reductions.entry(heir).or_default().insert(reduction) {
                log.push(format!("{} reduced: {}", heir.label(), rule.describe()));
            }
        }
    }

    HijabOutcome {
        filtered,
        exclusions: exclusions.into_values().collect(),
        reductions,
        log,
    }
}
