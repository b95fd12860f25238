use std::collections::BTreeMap;

use crate::{
    election::{ElectionResults, TURNOUT, VOTERS},
    overlap::Overlaps,
    party::PartyAliases,
    stats::Stat,
};
use super::{source_weights, Reprojection};

/// Reproject one source election's vote shares onto the target partition.
///
/// `overlaps` lists, per target district, the overlapping districts of the
/// source election. Every canonical party of `aliases` is reprojected, plus
/// TURNOUT and VOTERS; a party none of whose labels appears in any
/// overlapping source district stays null.
pub fn reproject_popularity(
    overlaps: &Overlaps,
    results: &ElectionResults,
    aliases: &PartyAliases,
    election: &str,
) -> Reprojection {
    let keys = aliases.keys()
        .chain([TURNOUT, VOTERS])
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut output = Reprojection::default();
    for (target, entries) in overlaps.iter() {
        if entries.is_empty() { continue }

        let mut stats = keys.iter()
            .map(|key| (key.clone(), Stat::default()))
            .collect::<BTreeMap<_, _>>();

        if let Some(weights) = source_weights(entries, results) {
            for (key, stat) in stats.iter_mut() {
                for (result, weight) in &weights {
                    if let Some(raw_vote) = aliases.raw_vote(election, key, result) {
                        stat.accumulate(raw_vote * weight);
                    }
                }
            }
        }

        output.districts.insert(target.clone(), stats);
    }

    tracing::info!(election, districts = output.districts.len(), "popularity reprojected");
    output.finalize(&keys)
}
