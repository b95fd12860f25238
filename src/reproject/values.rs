use std::collections::BTreeMap;

use crate::{
    election::{Election, ElectionResults},
    overlap::Overlaps,
    party::{PartyAliases, PartyValueSeries},
    stats::Stat,
};
use super::{source_weights, Reprojection};

/// Reproject party position scores onto the target partition.
///
/// Within each overlapping source district, the scores of the parties that
/// have one are averaged by vote share among those parties; the source
/// districts are then combined with the same turnout-weighted population
/// weights as vote shares. An axis stays null in a district until at least
/// one party's score resolves.
pub fn reproject_values(
    overlaps: &Overlaps,
    results: &ElectionResults,
    aliases: &PartyAliases,
    series: &PartyValueSeries,
    axes: &[String],
    election: &Election,
) -> Reprojection {
    let mut output = Reprojection::default();
    for (target, entries) in overlaps.iter() {
        if entries.is_empty() { continue }

        let mut stats = axes.iter()
            .map(|axis| (axis.clone(), Stat::default()))
            .collect::<BTreeMap<_, _>>();

        if let Some(weights) = source_weights(entries, results) {
            for (axis, stat) in stats.iter_mut() {
                for (result, weight) in &weights {
                    let scored = result.votes.iter()
                        .filter_map(|(party, vote)| series.value(aliases, election, party, axis).map(|score| (score, *vote)))
                        .collect::<Vec<_>>();
                    if scored.is_empty() { continue }

                    stat.accumulate(0.0);
                    let vote_sum = scored.iter().map(|(_, vote)| vote).sum::<f64>();
                    if vote_sum == 0.0 { continue }

                    stat.accumulate(scored.iter()
                        .map(|(score, vote)| score * weight * vote / vote_sum)
                        .sum());
                }
            }
        }

        output.districts.insert(target.clone(), stats);
    }

    tracing::info!(election = %election.key, districts = output.districts.len(), "values reprojected");
    output.finalize(axes)
}
