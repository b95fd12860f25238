use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::election::DistrictResult;

/// A canonical party and, per election, the raw labels that stand for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyEntry {
    pub party: String,
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

/// Ordered alias table mapping raw party labels of each election onto
/// canonical party keys. A canonical key without an alias list for an
/// election matches its own label literally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyAliases {
    entries: Vec<PartyEntry>,
}

impl PartyAliases {
    pub fn new(entries: Vec<PartyEntry>) -> Self { Self { entries } }

    /// Canonical keys in table order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.party.as_str())
    }

    #[inline] pub fn len(&self) -> usize { self.entries.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Raw labels that make up `canonical` in `election`.
    pub fn aliases_for<'a>(&'a self, election: &str, canonical: &'a str) -> Vec<&'a str> {
        self.entries.iter()
            .find(|entry| entry.party == canonical)
            .and_then(|entry| entry.aliases.get(election))
            .map(|labels| labels.iter().map(String::as_str).collect())
            .unwrap_or_else(|| vec![canonical])
    }

    /// Does `raw` count towards `canonical` in `election`?
    pub fn resolve(&self, election: &str, raw: &str, canonical: &str) -> bool {
        self.aliases_for(election, canonical).contains(&raw)
    }

    /// Sum of the vote shares of all aliases of `canonical` present in `result`,
    /// or `None` if none of them is present.
    pub fn raw_vote(&self, election: &str, canonical: &str, result: &DistrictResult) -> Option<f64> {
        self.aliases_for(election, canonical).into_iter()
            .filter_map(|label| result.get(label))
            .reduce(|a, b| a + b)
    }

    /// Map a raw label onto a key accepted by `known`: the label itself if
    /// known, else the first known canonical key whose alias list for
    /// `election` contains it.
    pub fn canonical_for<'a>(&'a self, election: &str, raw: &'a str, known: impl Fn(&str) -> bool) -> Option<&'a str> {
        if known(raw) { return Some(raw) }

        self.entries.iter()
            .filter(|entry| known(entry.party.as_str()))
            .find(|entry| entry.aliases.get(election)
                .is_some_and(|labels| labels.iter().any(|label| label == raw)))
            .map(|entry| entry.party.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::DistrictResult;

    fn aliases() -> PartyAliases {
        PartyAliases::new(vec![
            PartyEntry { party: "LSDP".into(), aliases: BTreeMap::new() },
            PartyEntry {
                party: "LT".into(),
                aliases: BTreeMap::from([("2019_EP".into(), vec!["TT".into(), "LLS".into()])]),
            },
            PartyEntry {
                party: "TTS".into(),
                aliases: BTreeMap::from([("2020_LRS".into(), vec!["CP-T".into()])]),
            },
        ])
    }

    fn result(votes: &[(&str, f64)]) -> DistrictResult {
        DistrictResult {
            votes: votes.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            turnout: Some(50.0),
            voters: Some(1000.0),
        }
    }

    #[test]
    fn literal_match_is_the_default() {
        let table = aliases();
        assert_eq!(table.aliases_for("2019_EP", "LSDP"), vec!["LSDP"]);
        assert_eq!(table.aliases_for("2020_LRS", "LT"), vec!["LT"]);
        assert_eq!(table.aliases_for("2019_EP", "UNKNOWN"), vec!["UNKNOWN"]);
        assert!(table.resolve("2020_LRS", "LT", "LT"));
        assert!(!table.resolve("2019_EP", "LT", "LT"));
        assert!(table.resolve("2019_EP", "LLS", "LT"));
    }

    #[test]
    fn coalition_labels_are_summed() {
        let table = aliases();
        let r = result(&[("TT", 10.0), ("LLS", 5.0), ("LSDP", 20.0)]);
        assert_eq!(table.raw_vote("2019_EP", "LT", &r), Some(15.0));
    }

    #[test]
    fn absent_aliases_are_null_not_zero() {
        let table = aliases();
        let r = result(&[("TT", 10.0), ("LLS", 5.0)]);
        assert_eq!(table.raw_vote("2016_LRS", "LT", &r), None);
        assert_eq!(table.raw_vote("2016_LRS", "LSDP", &r), None);
    }

    #[test]
    fn synthetic_keys_resolve_literally() {
        let table = aliases();
        let r = result(&[]);
        assert_eq!(table.raw_vote("2019_EP", "TURNOUT", &r), Some(50.0));
        assert_eq!(table.raw_vote("2019_EP", "VOTERS", &r), Some(1000.0));
    }

    #[test]
    fn canonical_for_prefers_known_raw_label() {
        let table = aliases();
        let known = |key: &str| ["TT", "TTS", "LT"].contains(&key);
        assert_eq!(table.canonical_for("2019_EP", "TT", known), Some("TT"));
        assert_eq!(table.canonical_for("2020_LRS", "CP-T", known), Some("TTS"));
        assert_eq!(table.canonical_for("2019_EP", "LLS", known), Some("LT"));
        assert_eq!(table.canonical_for("2016_LRS", "LLS", known), None);
        assert_eq!(table.canonical_for("2020_LRS", "XYZ", known), None);
    }
}
