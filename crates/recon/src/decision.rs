//! The combined-map decision tree.
//!
//! Precedence, first match wins:
//!
//! 1. new unit is intertidal → new wins
//! 2. existing unit is intertidal → existing wins
//! 3. both sub-tidal or mixed → higher primary score wins, then higher
//!    secondary score, then the pair goes to expert review
//! 4. anything left (an unclassified side) → expert review
//!
//! Classification always dominates confidence; confidence only arbitrates
//! between units of equal standing. Nothing here ever picks a side by default.

use std::cmp::Ordering;

use crate::model::{Decision, DecisionBasis, MapUnit, Verdict, Zone};

/// The inputs the tree reads for one side.
#[derive(Debug, Clone, Copy)]
pub struct Contender {
    pub zone: Zone,
    pub primary: f64,
    pub secondary: f64,
}

impl From<&MapUnit> for Contender {
    fn from(unit: &MapUnit) -> Self {
        Self {
            zone: unit.zone,
            primary: unit.confidence.primary.into_inner(),
            secondary: unit.confidence.secondary.into_inner(),
        }
    }
}

/// Decide a pair and report which rule fired.
pub fn adjudicate(new: Contender, existing: Contender) -> Verdict {
    use DecisionBasis as B;

    if new.zone == Zone::Intertidal {
        return verdict(Decision::WinnerIsNew, B::NewIntertidal);
    }
    if existing.zone == Zone::Intertidal {
        return verdict(Decision::WinnerIsExisting, B::ExistingIntertidal);
    }
    if !is_contestable(new.zone) || !is_contestable(existing.zone) {
        return verdict(Decision::RequiresExpertJudgement, B::Unclassified);
    }

    match compare(new.primary, existing.primary) {
        Ordering::Greater => return verdict(Decision::WinnerIsNew, B::PrimaryConfidence),
        Ordering::Less => return verdict(Decision::WinnerIsExisting, B::PrimaryConfidence),
        Ordering::Equal => {}
    }

    match compare(new.secondary, existing.secondary) {
        Ordering::Greater => verdict(Decision::WinnerIsNew, B::SecondaryConfidence),
        Ordering::Less => verdict(Decision::WinnerIsExisting, B::SecondaryConfidence),
        Ordering::Equal => verdict(Decision::RequiresExpertJudgement, B::ConfidenceTie),
    }
}

/// Decide which map unit should occupy the contested area.
pub fn decide(new: &MapUnit, existing: &MapUnit) -> Decision {
    adjudicate(new.into(), existing.into()).decision
}

fn verdict(decision: Decision, basis: DecisionBasis) -> Verdict {
    Verdict { decision, basis }
}

/// Sub-tidal and mixed units compete on confidence.
fn is_contestable(zone: Zone) -> bool {
    matches!(zone, Zone::SubTidal | Zone::Mixed)
}

// Scores are sanitized upstream; total_cmp keeps this total even if not.
fn compare(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
