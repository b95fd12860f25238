mod popularity;
mod values;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    district::DistrictId,
    election::{DistrictResult, ElectionResults},
    overlap::OverlapEntry,
    stats::{SeriesStats, Stat},
};

pub use popularity::reproject_popularity;
pub use values::reproject_values;

/// Results of one source election expressed on the target partition:
/// per target district, per key, a [`Stat`]; plus the cross-district
/// statistics of each key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reprojection {
    pub sds: BTreeMap<String, SeriesStats>,
    pub districts: BTreeMap<DistrictId, BTreeMap<String, Stat>>,
}

impl Reprojection {
    /// Stat of `key` in district `id`, if the district was reprojected.
    pub fn get(&self, id: &DistrictId, key: &str) -> Option<&Stat> {
        self.districts.get(id)?.get(key)
    }

    /// Compute each key's statistics over the non-null values and backfill
    /// every district's bias from them.
    fn finalize(mut self, keys: &[String]) -> Self {
        for key in keys {
            let values = self.districts.values()
                .filter_map(|stats| stats.get(key).and_then(|stat| stat.value))
                .collect::<Vec<_>>();
            self.sds.insert(key.clone(), SeriesStats::from_values(&values));
        }

        for stats in self.districts.values_mut() {
            for (key, stat) in stats.iter_mut() {
                if let Some(series) = self.sds.get(key) { stat.backfill(series) }
            }
        }
        self
    }
}

/// Weights of the source districts overlapping one target district:
/// population share × turnout, normalized to sum to 1. Returns `None` when
/// every weight is zero. Overlaps whose source district has no results are
/// dropped; a source district without turnout weighs zero.
fn source_weights<'a>(entries: &[OverlapEntry], results: &'a ElectionResults) -> Option<Vec<(&'a DistrictResult, f64)>> {
    let found = entries.iter()
        .filter_map(|entry| match results.get(&entry.id) {
            Some(result) => Some((result, entry.pop_fraction * result.turnout.unwrap_or(0.0))),
            None => {
                tracing::warn!(district = %entry.id, "no results for overlapping source district");
                None
            }
        })
        .collect::<Vec<_>>();

    let denom = found.iter().map(|(_, raw)| raw).sum::<f64>();
    if denom == 0.0 { return None }

    Some(found.into_iter().map(|(result, raw)| (result, raw / denom)).collect())
}
