//! Fiqh rule database: per-madhab parameters and ordered hijab tables.
//!
//! Rule data is hand-authored and versioned as a unit per madhab. Nothing
//! here is derived at runtime and nothing mutates a rule set once built;
//! callers thread a [`RuleDatabase`] (or a single [`MadhhabRuleSet`])
//! through the engine explicitly, so alternate tables can be substituted
//! in tests without touching global state.
//!
//! Every school-specific behavior is a field of [`MadhhabRuleSet`]. The
//! resolvers never branch on the [`Madhab`] itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::heir::{HeirType, HeirsData};
use crate::madhab::Madhab;

/// Version stamp of the classical tables built by [`MadhhabRuleSet::classical`].
pub const CLASSICAL_RULES_VERSION: &str = "1.0.0";

// ──────────────────────────────────────────────
// Hijab rules
// ──────────────────────────────────────────────

/// What a partial exclusion does to the affected heir's fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// A child or son's child exists: spouses and mother take their lower
    /// fraction, father and grandfather take a sixth.
    DescendantPresent,
    /// The father exists: the mother's third is reduced.
    FatherPresent,
    /// Two or more siblings of any kind exist: the mother drops to a sixth.
    MultipleSiblings,
    /// A single nearer female of the same class holds a half: this heir
    /// takes the sixth that completes two thirds.
    CompletesTwoThirds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reduction")]
pub enum HijabKind {
    /// The blocked heirs inherit nothing.
    Complete,
    /// The blocked heirs still inherit, under a different fraction.
    Partial(Reduction),
}

/// One exclusion rule.
///
/// The rule fires against a head-count snapshot when the summed count of
/// `blockers` reaches `min_count`, at least one `requires_any` heir is
/// present (if the list is non-empty), and no `unless` heir is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HijabRule {
    pub blockers: Vec<HeirType>,
    pub blocked: Vec<HeirType>,
    pub kind: HijabKind,
    #[serde(default = "one")]
    pub min_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_any: Vec<HeirType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unless: Vec<HeirType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn one() -> u32 {
    1
}

impl HijabRule {
    /// `blocker` alone excludes `blocked` entirely.
    pub fn complete(blocker: HeirType, blocked: &[HeirType]) -> Self {
        Self::any_complete(&[blocker], blocked)
    }

    /// Any of `blockers` excludes `blocked` entirely.
    pub fn any_complete(blockers: &[HeirType], blocked: &[HeirType]) -> Self {
        HijabRule {
            blockers: blockers.to_vec(),
            blocked: blocked.to_vec(),
            kind: HijabKind::Complete,
            min_count: 1,
            requires_any: Vec::new(),
            unless: Vec::new(),
            reason: None,
        }
    }

    /// Any of `blockers` changes the fraction `blocked` receives.
    pub fn partial(blockers: &[HeirType], blocked: &[HeirType], reduction: Reduction) -> Self {
        HijabRule {
            kind: HijabKind::Partial(reduction),
            ..Self::any_complete(blockers, blocked)
        }
    }

    pub fn min_count(mut self, n: u32) -> Self {
        self.min_count = n;
        self
    }

    pub fn requires_any(mut self, heirs: &[HeirType]) -> Self {
        self.requires_any = heirs.to_vec();
        self
    }

    pub fn unless(mut self, heirs: &[HeirType]) -> Self {
        self.unless = heirs.to_vec();
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn is_complete(&self) -> bool {
        self.kind == HijabKind::Complete
    }

    /// Whether the rule's condition holds for `heirs`.
    pub fn fires(&self, heirs: &HeirsData) -> bool {
        heirs.total_of(&self.blockers) >= u64::from(self.min_count.max(1))
            && (self.requires_any.is_empty() || heirs.any_present(&self.requires_any))
            && !heirs.any_present(&self.unless)
    }

    /// Human-readable description, falling back to the blocker list.
    pub fn describe(&self) -> String {
        if let Some(reason) = &self.reason {
            return reason.clone();
        }
        let blockers: Vec<&str> = self.blockers.iter().map(|h| h.key()).collect();
        let blocked: Vec<&str> = self.blocked.iter().map(|h| h.key()).collect();
        match self.kind {
            HijabKind::Complete => format!("{} exclude {}", blockers.join("/"), blocked.join(", ")),
            HijabKind::Partial(r) => format!(
                "{} reduce {} ({:?})",
                blockers.join("/"),
                blocked.join(", "),
                r
            ),
        }
    }
}

// ──────────────────────────────────────────────
// Madhab parameters
// ──────────────────────────────────────────────

/// How the paternal grandfather treats full and consanguine siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrandfatherPolicy {
    /// He stands in the father's place and excludes them.
    Exclude,
    /// He shares the residue with them as one of the brothers, keeping the
    /// best of the shared portion, a third of the residue, or a sixth.
    Share,
}

/// The mother's fraction when the father survives and there are no
/// descendants and fewer than two siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotherWithFather {
    /// A third of what remains after the spouse (a plain third without one).
    ThirdOfRemainder,
    /// A sixth, with or without a spouse.
    Sixth,
}

/// Immutable rule set for one school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MadhhabRuleSet {
    pub madhab: Madhab,
    pub version: String,
    pub grandfather_with_siblings: GrandfatherPolicy,
    pub mother_with_father: MotherWithFather,
    /// Whether spouses take part in radd alongside other fixed-share heirs.
    pub spouse_radd: bool,
    /// Mushtarakah: full siblings share the uterine third per head when
    /// the fixed shares would otherwise leave them nothing.
    pub shared_uterine_third: bool,
    /// Ordered hijab table; complete and partial rules interleaved.
    pub hijab_rules: Vec<HijabRule>,
}

impl MadhhabRuleSet {
    pub fn complete_rules(&self) -> impl Iterator<Item = &HijabRule> {
        self.hijab_rules.iter().filter(|r| r.is_complete())
    }

    pub fn partial_rules(&self) -> impl Iterator<Item = &HijabRule> {
        self.hijab_rules.iter().filter(|r| !r.is_complete())
    }

    /// The hand-authored classical table for `madhab`.
    pub fn classical(madhab: Madhab) -> MadhhabRuleSet {
        let (grandfather_with_siblings, mother_with_father, shared_uterine_third) = match madhab {
            Madhab::Hanafi => (GrandfatherPolicy::Exclude, MotherWithFather::ThirdOfRemainder, false),
            Madhab::Maliki => (GrandfatherPolicy::Share, MotherWithFather::Sixth, true),
            Madhab::Shafii => (GrandfatherPolicy::Share, MotherWithFather::ThirdOfRemainder, true),
            Madhab::Hanbali => (GrandfatherPolicy::Share, MotherWithFather::ThirdOfRemainder, false),
        };
        let father_excludes_paternal_grandmother = madhab != Madhab::Hanbali;

        MadhhabRuleSet {
            madhab,
            version: CLASSICAL_RULES_VERSION.to_string(),
            grandfather_with_siblings,
            mother_with_father,
            spouse_radd: false,
            shared_uterine_third,
            hijab_rules: classical_hijab_table(
                grandfather_with_siblings,
                father_excludes_paternal_grandmother,
            ),
        }
    }
}

fn join(groups: &[&[HeirType]]) -> Vec<HeirType> {
    groups.iter().flat_map(|g| g.iter().copied()).collect()
}

fn classical_hijab_table(
    grandfather: GrandfatherPolicy,
    father_excludes_paternal_grandmother: bool,
) -> Vec<HijabRule> {
    use HeirType::*;

    let siblings = &HeirType::SIBLINGS[..];
    let uterine = &HeirType::UTERINE_SIBLINGS[..];
    let remote = &HeirType::REMOTE_AGNATES[..];

    let mut father_blocks = join(&[&[Grandfather], siblings, remote]);
    if father_excludes_paternal_grandmother {
        father_blocks.push(PaternalGrandmother);
    }

    let grandfather_blocks = match grandfather {
        GrandfatherPolicy::Exclude => join(&[siblings, remote]),
        GrandfatherPolicy::Share => join(&[uterine, remote]),
    };

    let mut rules = vec![
        // descendants
        HijabRule::complete(Son, &join(&[&[Grandson, Granddaughter], siblings, remote]))
            .reason("a son excludes son's children, siblings, nephews and uncles"),
        HijabRule::complete(Grandson, &join(&[siblings, remote]))
            .reason("a son's son excludes siblings, nephews and uncles"),
        HijabRule::any_complete(&HeirType::FEMALE_DESCENDANTS, uterine)
            .reason("a female descendant excludes uterine siblings"),
        HijabRule::complete(Daughter, &[Granddaughter])
            .min_count(2)
            .unless(&[Grandson])
            .reason("two daughters exhaust two thirds; son's daughters need a son's son to inherit"),
        // ascendants
        HijabRule::complete(Father, &father_blocks)
            .reason("the father excludes the grandfather, siblings, nephews and uncles"),
        HijabRule::complete(Mother, &[PaternalGrandmother, MaternalGrandmother])
            .reason("the mother excludes both grandmothers"),
        HijabRule::complete(Grandfather, &grandfather_blocks)
            .reason("the grandfather excludes those the father would, as far as his school allows"),
        // siblings
        HijabRule::complete(FullBrother, &join(&[&[PaternalBrother, PaternalSister], remote]))
            .reason("a full brother excludes consanguine siblings, nephews and uncles"),
        HijabRule::complete(FullSister, &[PaternalSister])
            .min_count(2)
            .unless(&[PaternalBrother])
            .reason("two full sisters exhaust two thirds; consanguine sisters need a brother to inherit"),
        HijabRule::complete(FullSister, &join(&[&[PaternalBrother, PaternalSister], remote]))
            .requires_any(&HeirType::FEMALE_DESCENDANTS)
            .reason("a full sister taking the residue beside daughters ranks as a full brother"),
        HijabRule::complete(PaternalSister, remote)
            .requires_any(&HeirType::FEMALE_DESCENDANTS)
            .reason("a consanguine sister taking the residue beside daughters ranks as a consanguine brother"),
        HijabRule::complete(PaternalBrother, remote)
            .reason("a consanguine brother excludes nephews and uncles"),
        // remote agnates
        HijabRule::complete(FullNephew, &[PaternalNephew, FullUncle, PaternalUncle]),
        HijabRule::complete(PaternalNephew, &[FullUncle, PaternalUncle]),
        HijabRule::complete(FullUncle, &[PaternalUncle]),
    ];

    if grandfather == GrandfatherPolicy::Share {
        rules.push(
            HijabRule::any_complete(&[FullBrother, FullSister], &[PaternalBrother, PaternalSister])
                .requires_any(&[Grandfather])
                .reason("beside the grandfather, full siblings take what consanguine siblings would"),
        );
    }

    // partial exclusions
    rules.extend([
        HijabRule::partial(
            &HeirType::DESCENDANTS,
            &[Husband, Wife, Mother, Father, Grandfather],
            Reduction::DescendantPresent,
        )
        .reason("descendants reduce spouses and mother, and limit father and grandfather to a sixth"),
        HijabRule::partial(&[Father], &[Mother], Reduction::FatherPresent)
            .reason("the father reduces the mother's third"),
        HijabRule::partial(siblings, &[Mother], Reduction::MultipleSiblings)
            .min_count(2)
            .reason("two or more siblings reduce the mother to a sixth"),
        HijabRule::partial(&[Daughter], &[Granddaughter], Reduction::CompletesTwoThirds)
            .reason("beside one daughter, son's daughters take the sixth completing two thirds"),
        HijabRule::partial(&[FullSister], &[PaternalSister], Reduction::CompletesTwoThirds)
            .reason("beside one full sister, consanguine sisters take the sixth completing two thirds"),
    ]);

    rules
}

// ──────────────────────────────────────────────
// Database
// ──────────────────────────────────────────────

/// Lookup table of rule sets keyed by madhab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDatabase {
    sets: BTreeMap<Madhab, MadhhabRuleSet>,
}

impl RuleDatabase {
    /// The four classical rule sets.
    pub fn classical() -> Self {
        Self::from_rule_sets(Madhab::ALL.into_iter().map(MadhhabRuleSet::classical))
    }

    /// Build a database from arbitrary rule sets; later sets replace
    /// earlier ones for the same madhab.
    pub fn from_rule_sets<I: IntoIterator<Item = MadhhabRuleSet>>(sets: I) -> Self {
        RuleDatabase {
            sets: sets.into_iter().map(|s| (s.madhab, s)).collect(),
        }
    }

    pub fn rule_set_for(&self, madhab: Madhab) -> Result<&MadhhabRuleSet, ValidationError> {
        self.sets
            .get(&madhab)
            .ok_or_else(|| ValidationError::UnknownMadhab {
                code: madhab.code().to_string(),
            })
    }

    pub fn rule_set_for_code(&self, code: &str) -> Result<&MadhhabRuleSet, ValidationError> {
        self.rule_set_for(Madhab::from_code(code)?)
    }

    pub fn madhabs(&self) -> impl Iterator<Item = Madhab> + '_ {
        self.sets.keys().copied()
    }
}

impl Default for RuleDatabase {
    fn default() -> Self {
        Self::classical()
    }
}
