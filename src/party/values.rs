use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::election::Election;
use super::PartyAliases;

/// Party position scores by survey year: party → year → axis → score.
/// Survey coverage is sparse; scores between surveys are interpolated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyValueSeries {
    parties: BTreeMap<String, BTreeMap<i32, BTreeMap<String, f64>>>,
}

impl PartyValueSeries {
    pub fn new(parties: BTreeMap<String, BTreeMap<i32, BTreeMap<String, f64>>>) -> Self {
        Self { parties }
    }

    /// Does the series have surveys for `party`?
    #[inline] pub fn contains(&self, party: &str) -> bool { self.parties.contains_key(party) }

    /// Score of `party` on `axis` in `year`, with clamping outside the surveyed
    /// years and linear interpolation between them.
    pub fn at_year(&self, party: &str, year: i32, axis: &str) -> Option<f64> {
        let years = self.parties.get(party)?;
        let score = |y: &i32| years.get(y).and_then(|scores| scores.get(axis)).copied();

        let (first, last) = (years.keys().next()?, years.keys().next_back()?);
        if years.contains_key(&year) { return score(&year) }
        if year < *first { return score(first) }
        if year > *last { return score(last) }

        let (&y0, _) = years.range(..year).next_back()?;
        let (&y1, _) = years.range(year..).next()?;
        let (v0, v1) = (score(&y0)?, score(&y1)?);
        Some(v0 + (v1 - v0) * f64::from(year - y0) / f64::from(y1 - y0))
    }

    /// Score on `axis` of the party a raw label stands for in `election`.
    /// Unresolvable labels have no score.
    pub fn value(&self, aliases: &PartyAliases, election: &Election, raw: &str, axis: &str) -> Option<f64> {
        let party = aliases.canonical_for(&election.key, raw, |key| self.contains(key))?;
        self.at_year(party, election.year(), axis)
    }
}
