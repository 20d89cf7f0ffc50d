//! Habitat zone classification from raw habitat codes.
//!
//! A code belongs to a group when it *contains* one of the group's tokens
//! anywhere, not only as a prefix. `"XA3"` therefore counts as sub-tidal.
//! This over-matches codes that embed a token by accident. Outputs must stay
//! comparable with earlier combined-map runs, so do not tighten it.

use std::collections::BTreeSet;

use crate::config::ClassifierConfig;
use crate::model::Zone;

/// Token groups plus the placeholder values stripped before classification.
#[derive(Debug, Clone)]
pub struct HabitatClassifier {
    intertidal: Vec<String>,
    subtidal: Vec<String>,
    placeholders: Vec<String>,
}

impl Default for HabitatClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl HabitatClassifier {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            intertidal: config.intertidal.clone(),
            subtidal: config.subtidal.clone(),
            placeholders: config.placeholders.clone(),
        }
    }

    /// Missing-value markers (`nan`, blank, ...) carry no habitat.
    pub fn is_placeholder(&self, code: &str) -> bool {
        let trimmed = code.trim();
        self.placeholders.iter().any(|p| p == trimmed)
    }

    /// Trim codes and drop placeholders.
    pub fn clean<'a, I>(&self, codes: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        codes
            .into_iter()
            .filter(|c| !self.is_placeholder(c))
            .map(|c| c.trim().to_string())
            .collect()
    }

    pub fn is_intertidal(&self, code: &str) -> bool {
        self.intertidal.iter().any(|t| code.contains(t.as_str()))
    }

    pub fn is_subtidal(&self, code: &str) -> bool {
        self.subtidal.iter().any(|t| code.contains(t.as_str()))
    }

    pub fn classify<'a, I>(&self, codes: I) -> Zone
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut intertidal = false;
        let mut subtidal = false;
        for code in codes {
            intertidal |= self.is_intertidal(code);
            subtidal |= self.is_subtidal(code);
            if intertidal && subtidal {
                break;
            }
        }

        match (intertidal, subtidal) {
            (true, true) => Zone::Mixed,
            (true, false) => Zone::Intertidal,
            (false, true) => Zone::SubTidal,
            (false, false) => Zone::Error,
        }
    }
}

/// Classify a cleaned code set with the standard token groups.
pub fn classify(codes: &BTreeSet<String>) -> Zone {
    HabitatClassifier::default().classify(codes.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn mixed_when_both_groups_present() {
        assert_eq!(classify(&set(&["A3.1", "A1.2"])), Zone::Mixed);
    }

    #[test]
    fn subtidal_only() {
        assert_eq!(classify(&set(&["A4.3"])), Zone::SubTidal);
        assert_eq!(classify(&set(&["A5.23", "A6"])), Zone::SubTidal);
    }

    #[test]
    fn intertidal_only() {
        assert_eq!(classify(&set(&["A2.7"])), Zone::Intertidal);
        assert_eq!(classify(&set(&["B3.1", "A1"])), Zone::Intertidal);
    }

    #[test]
    fn unrecognised_or_empty_is_error() {
        assert_eq!(classify(&set(&["X9"])), Zone::Error);
        assert_eq!(classify(&set(&[])), Zone::Error);
    }

    #[test]
    fn containment_not_prefix() {
        // Token embedded mid-string still matches.
        assert_eq!(classify(&set(&["Void+A5.1"])), Zone::SubTidal);
        assert_eq!(classify(&set(&["A5.1+A2.4"])), Zone::Mixed);
    }

    #[test]
    fn clean_drops_placeholders_and_trims() {
        let c = HabitatClassifier::default();
        let cleaned = c.clean(["nan", " A5.2 ", "", "A5.2", "NaN"]);
        assert_eq!(cleaned, set(&["A5.2"]));
    }

    #[test]
    fn custom_groups_from_config() {
        let config = ClassifierConfig {
            intertidal: vec!["LR".into()],
            subtidal: vec!["SS".into()],
            placeholders: vec![],
        };
        let c = HabitatClassifier::from_config(&config);
        assert_eq!(c.classify(["LR.FLR"]), Zone::Intertidal);
        assert_eq!(c.classify(["A1.1"]), Zone::Error);
        assert_eq!(c.classify(["SS.SMu", "LR.MLR"]), Zone::Mixed);
    }
}
