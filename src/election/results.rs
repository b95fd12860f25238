use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::district::DistrictId;

/// Pseudo-district holding nationwide results.
pub const TOTAL: &str = "TOTAL";
/// Synthetic key for the turnout percentage of a district.
pub const TURNOUT: &str = "TURNOUT";
/// Synthetic key for the number of registered voters of a district.
pub const VOTERS: &str = "VOTERS";

/// Returns true for the synthetic keys that are not parties.
#[inline]
pub(crate) fn is_turnout_key(key: &str) -> bool { key == TURNOUT || key == VOTERS }

/// Results of one district: party label → vote share (percent), plus turnout
/// (percent) and registered voters when the provider could fetch them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, RawNumber>", into = "BTreeMap<String, RawNumber>")]
pub struct DistrictResult {
    pub votes: BTreeMap<String, f64>,
    pub turnout: Option<f64>,
    pub voters: Option<f64>,
}

impl DistrictResult {
    /// Look up a label, treating TURNOUT and VOTERS as synthetic keys.
    pub fn get(&self, label: &str) -> Option<f64> {
        match label {
            TURNOUT => self.turnout,
            VOTERS => self.voters,
            _ => self.votes.get(label).copied(),
        }
    }
}

/// A vote figure as published: a JSON number, numeric text, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
    Null,
}

impl RawNumber {
    fn to_f64(&self, label: &str) -> Result<Option<f64>> {
        match self {
            RawNumber::Number(n) => Ok(Some(*n)),
            RawNumber::Text(s) if s.trim().is_empty() => Ok(None),
            RawNumber::Text(s) => s.trim().replace(',', ".").parse().map(Some)
                .map_err(|_| anyhow!("non-numeric value {s:?} for {label}")),
            RawNumber::Null => Ok(None),
        }
    }
}

impl TryFrom<BTreeMap<String, RawNumber>> for DistrictResult {
    type Error = anyhow::Error;

    fn try_from(raw: BTreeMap<String, RawNumber>) -> Result<Self> {
        let mut result = DistrictResult::default();
        for (label, value) in raw {
            let value = value.to_f64(&label)?;
            match label.as_str() {
                TURNOUT => result.turnout = value,
                VOTERS => result.voters = value,
                _ => if let Some(v) = value { result.votes.insert(label, v); },
            }
        }
        Ok(result)
    }
}

impl From<DistrictResult> for BTreeMap<String, RawNumber> {
    fn from(result: DistrictResult) -> Self {
        let mut raw = result.votes.into_iter()
            .map(|(label, v)| (label, RawNumber::Number(v)))
            .collect::<BTreeMap<_, _>>();
        if let Some(turnout) = result.turnout { raw.insert(TURNOUT.into(), RawNumber::Number(turnout)); }
        if let Some(voters) = result.voters { raw.insert(VOTERS.into(), RawNumber::Number(voters)); }
        raw
    }
}

/// All results of one election, keyed by district id, plus the nationwide TOTAL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, DistrictResult>", into = "BTreeMap<String, DistrictResult>")]
pub struct ElectionResults {
    pub districts: BTreeMap<DistrictId, DistrictResult>,
    pub total: DistrictResult,
}

impl ElectionResults {
    #[inline] pub fn get(&self, id: &DistrictId) -> Option<&DistrictResult> { self.districts.get(id) }

    /// Recompute the nationwide turnout and voter count from the districts that have both.
    pub fn recompute_total_turnout(&mut self) {
        let (voters, voted) = self.districts.values()
            .filter_map(|r| Some((r.voters?, r.turnout?)))
            .fold((0.0, 0.0), |(sum_voters, sum_voted), (voters, turnout)| {
                (sum_voters + voters, sum_voted + voters * turnout / 100.0)
            });
        self.total.voters = Some(voters);
        self.total.turnout = (voters > 0.0).then(|| (10_000.0 * voted / voters).round() / 100.0);
    }
}

impl From<BTreeMap<String, DistrictResult>> for ElectionResults {
    fn from(mut raw: BTreeMap<String, DistrictResult>) -> Self {
        let total = raw.remove(TOTAL).unwrap_or_default();
        Self {
            districts: raw.into_iter().map(|(id, r)| (DistrictId::new(&id), r)).collect(),
            total,
        }
    }
}

impl From<ElectionResults> for BTreeMap<String, DistrictResult> {
    fn from(results: ElectionResults) -> Self {
        let mut raw = results.districts.into_iter()
            .map(|(id, r)| (id.as_str().to_string(), r))
            .collect::<BTreeMap<_, _>>();
        raw.insert(TOTAL.into(), results.total);
        raw
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_numbers_text_and_synthetic_keys() {
        let results: ElectionResults = serde_json::from_value(json!({
            "1:1:a": {"LSDP": 20.5, "TS-LKD": "30,25", "TURNOUT": "51.2", "VOTERS": 1200},
            "1:2:b": {"LSDP": 10.0, "TURNOUT": null},
            "TOTAL": {"LSDP": 15.0}
        })).unwrap();

        let a = results.get(&"1:1:a".into()).unwrap();
        assert_eq!(a.get("LSDP"), Some(20.5));
        assert_eq!(a.get("TS-LKD"), Some(30.25));
        assert_eq!(a.get(TURNOUT), Some(51.2));
        assert_eq!(a.get(VOTERS), Some(1200.0));
        assert!(!a.votes.contains_key(TURNOUT));

        let b = results.get(&"1:2:b".into()).unwrap();
        assert_eq!(b.turnout, None);
        assert_eq!(results.total.get("LSDP"), Some(15.0));
        assert_eq!(results.districts.len(), 2);
    }

    #[test]
    fn rejects_garbage_numbers() {
        let parsed: Result<ElectionResults, _> = serde_json::from_value(json!({"1": {"LSDP": "n/a"}}));
        assert!(parsed.is_err());
    }

    #[test]
    fn total_turnout_is_voter_weighted() {
        let mut results = ElectionResults::default();
        results.districts.insert("a".into(), DistrictResult { turnout: Some(50.0), voters: Some(100.0), ..Default::default() });
        results.districts.insert("b".into(), DistrictResult { turnout: Some(20.0), voters: Some(300.0), ..Default::default() });
        results.districts.insert("c".into(), DistrictResult { turnout: None, voters: Some(1000.0), ..Default::default() });
        results.recompute_total_turnout();
        assert_eq!(results.total.voters, Some(400.0));
        assert_eq!(results.total.turnout, Some(27.5));
    }
}
