use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    district::DistrictId,
    election::{is_turnout_key, Election, TURNOUT},
    reproject::Reprojection,
    stats::{SeriesStats, Stat},
};

/// Default recency half-life: four years, in days.
pub const HALF_LIFE_DAYS: f64 = 1461.0;

/// The two kinds of reprojected figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Votes,
    Values,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Votes, Category::Values];
}

/// One key's figures across elections, plus their weighted summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyHistory {
    #[serde(flatten)]
    pub elections: BTreeMap<String, Stat>,
    pub summary: Stat,
}

/// Keys with the largest and smallest summary bias in a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasExtremes {
    pub max_bias_key: Option<String>,
    pub min_bias_key: Option<String>,
}

/// All keys of one category for one district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub keys: BTreeMap<String, KeyHistory>,
    pub summary: BiasExtremes,
}

/// Combined figures of one target district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictSummary {
    pub votes: CategorySummary,
    pub values: CategorySummary,
}

impl DistrictSummary {
    pub fn category(&self, category: Category) -> &CategorySummary {
        match category {
            Category::Votes => &self.votes,
            Category::Values => &self.values,
        }
    }

    pub fn category_mut(&mut self, category: Category) -> &mut CategorySummary {
        match category {
            Category::Votes => &mut self.votes,
            Category::Values => &mut self.values,
        }
    }
}

/// Cross-district statistics of one key, per election and for the summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    #[serde(flatten)]
    pub elections: BTreeMap<String, SeriesStats>,
    pub summary: SeriesStats,
}

/// Reprojected results of several elections folded onto the target partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub sds: BTreeMap<Category, BTreeMap<String, KeyStats>>,
    #[serde(flatten)]
    pub districts: BTreeMap<DistrictId, DistrictSummary>,
}

/// One source election's reprojections, as input to [`combine`].
#[derive(Debug, Clone, Copy)]
pub struct ElectionInput<'a> {
    pub election: &'a Election,
    pub popularity: &'a Reprojection,
    pub values: &'a Reprojection,
}

/// Weight of an election `days` after the target election: doubles every
/// `half_life_days` later and halves every `half_life_days` earlier.
#[inline]
pub fn recency_weight(days: i64, half_life_days: f64) -> f64 {
    2f64.powf(days as f64 / half_life_days)
}

/// Weighted mean of the present values; `None` if no value is present or
/// the weights of the present values sum to zero.
fn weighted_mean(items: impl Iterator<Item = (Option<f64>, Option<f64>)>) -> Option<f64> {
    let (sum, weights) = items
        .filter_map(|(value, weight)| Some((value?, weight?)))
        .fold((0.0, 0.0), |(sum, weights), (value, weight)| (sum + value * weight, weights + weight));
    (weights != 0.0).then(|| sum / weights)
}

/// Key with the largest and smallest summary `bias_sd` among party/axis keys.
/// For values the magnitude is compared. Ties keep the first key.
fn bias_extremes(category: Category, keys: &BTreeMap<String, KeyHistory>) -> BiasExtremes {
    let mut max: Option<(&str, f64)> = None;
    let mut min: Option<(&str, f64)> = None;

    for (key, history) in keys {
        if is_turnout_key(key) { continue }
        let Some(bias_sd) = history.summary.bias_sd else { continue };
        let bias_sd = match category {
            Category::Values => bias_sd.abs(),
            Category::Votes => bias_sd,
        };
        if max.is_none_or(|(_, m)| bias_sd > m) { max = Some((key, bias_sd)) }
        if min.is_none_or(|(_, m)| bias_sd < m) { min = Some((key, bias_sd)) }
    }

    BiasExtremes {
        max_bias_key: max.map(|(key, _)| key.to_string()),
        min_bias_key: min.map(|(key, _)| key.to_string()),
    }
}

/// Fold the reprojections of several elections into one summary per target
/// district, weighting each election by recency and by the district's turnout.
pub fn combine(target: &Election, inputs: &[ElectionInput], half_life_days: f64) -> CombinedSummary {
    let mut output = CombinedSummary::default();

    // Merge: district → category → key → election.
    for input in inputs {
        let key = &input.election.key;
        for (category, reprojection) in [(Category::Votes, input.popularity), (Category::Values, input.values)] {
            for (id, stats) in &reprojection.districts {
                let district = output.districts.entry(id.clone()).or_default().category_mut(category);
                for (name, stat) in stats {
                    district.keys.entry(name.clone()).or_default().elections.insert(key.clone(), *stat);
                }
            }
            let sds = output.sds.entry(category).or_default();
            for (name, series) in &reprojection.sds {
                sds.entry(name.clone()).or_default().elections.insert(key.clone(), *series);
            }
        }
    }

    let recency = inputs.iter()
        .map(|input| (input.election.key.as_str(), recency_weight(input.election.days_since(target), half_life_days)))
        .collect::<Vec<_>>();

    // Weighted summaries per district.
    for district in output.districts.values_mut() {
        let turnout = district.votes.keys.get(TURNOUT);
        let weights = recency.iter()
            .map(|&(election, recency)| {
                let turnout = turnout
                    .and_then(|history| history.elections.get(election))
                    .and_then(|stat| stat.value);
                (election, turnout.map(|t| recency * t / 100.0))
            })
            .collect::<Vec<_>>();

        for category in Category::ALL {
            for history in district.category_mut(category).keys.values_mut() {
                let field = |get: fn(&Stat) -> Option<f64>| weighted_mean(weights.iter()
                    .map(|&(election, weight)| (history.elections.get(election).and_then(get), weight)));
                history.summary = Stat {
                    value: field(|stat| stat.value),
                    bias: field(|stat| stat.bias),
                    bias_sd: field(|stat| stat.bias_sd),
                };
            }
        }
    }

    // Cross-district statistics of the summaries, then bias backfill.
    for category in Category::ALL {
        let mut values: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for district in output.districts.values() {
            for (key, history) in &district.category(category).keys {
                let list = values.entry(key.as_str()).or_default();
                if let Some(value) = history.summary.value { list.push(value) }
            }
        }

        let sds = output.sds.entry(category).or_default();
        for (key, list) in values {
            sds.entry(key.to_string()).or_default().summary = SeriesStats::from_values(&list);
        }
    }

    for district in output.districts.values_mut() {
        for category in Category::ALL {
            let summary = district.category_mut(category);
            for (key, history) in summary.keys.iter_mut() {
                if history.summary.value.is_none() { continue }
                if let Some(stats) = output.sds.get(&category).and_then(|sds| sds.get(key)) {
                    history.summary.backfill(&stats.summary);
                }
            }
            summary.summary = bias_extremes(category, &summary.keys);
        }
    }

    tracing::info!(
        target_election = %target.key,
        elections = inputs.len(),
        districts = output.districts.len(),
        "elections combined"
    );
    output
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;

    fn stat(value: f64) -> Stat { Stat { value: Some(value), ..Stat::default() } }

    fn reprojection(districts: &[(&str, Option<f64>, f64)]) -> Reprojection {
        let districts = districts.iter()
            .map(|&(id, turnout, share)| {
                let turnout = Stat { value: turnout, ..Stat::default() };
                let stats = BTreeMap::from([(TURNOUT.to_string(), turnout), ("P".to_string(), stat(share))]);
                (DistrictId::new(id), stats)
            })
            .collect();
        Reprojection { districts, ..Reprojection::default() }
    }

    #[test]
    fn summaries_weigh_elections_by_recency_and_turnout() {
        let target = Election::new("T", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let old = Election::new("OLD", target.date.checked_sub_days(Days::new(1461)).unwrap());
        let new = Election::new("NEW", target.date);

        // d1: weights 0.5 × 0.4 = 0.2 and 1 × 0.6 = 0.6.
        // d2: no turnout in NEW, so only OLD (0.5 × 0.5) counts.
        let old_votes = reprojection(&[("d1", Some(40.0), 10.0), ("d2", Some(50.0), 20.0)]);
        let new_votes = reprojection(&[("d1", Some(60.0), 30.0), ("d2", None, 99.0)]);
        let values = Reprojection::default();
        let inputs = [
            ElectionInput { election: &old, popularity: &old_votes, values: &values },
            ElectionInput { election: &new, popularity: &new_votes, values: &values },
        ];
        let summary = combine(&target, &inputs, HALF_LIFE_DAYS);

        let d1 = &summary.districts[&DistrictId::new("d1")].votes.keys["P"];
        let d2 = &summary.districts[&DistrictId::new("d2")].votes.keys["P"];
        assert_eq!(d1.elections.len(), 2);
        assert!((d1.summary.value.unwrap() - (10.0 * 0.2 + 30.0 * 0.6) / 0.8).abs() < 1e-9);
        assert!((d2.summary.value.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(d2.elections["NEW"].value, Some(99.0));

        // Summary bias is measured against the statistics of the summary values (25 and 20).
        let sd = 12.5f64.sqrt();
        let stats = &summary.sds[&Category::Votes]["P"].summary;
        assert!((stats.mean.unwrap() - 22.5).abs() < 1e-9);
        assert!((stats.sd.unwrap() - sd).abs() < 1e-9);
        assert!((d1.summary.bias.unwrap() - 2.5).abs() < 1e-9);
        assert!((d1.summary.bias_sd.unwrap() - 2.5 / sd).abs() < 1e-9);
        assert!((d2.summary.bias.unwrap() + 2.5).abs() < 1e-9);
        assert!((d2.summary.bias_sd.unwrap() + 2.5 / sd).abs() < 1e-9);
    }

    #[test]
    fn district_without_any_turnout_has_no_summary() {
        let target = Election::new("T", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let votes = reprojection(&[("d1", None, 10.0)]);
        let values = Reprojection::default();
        let inputs = [ElectionInput { election: &target, popularity: &votes, values: &values }];
        let summary = combine(&target, &inputs, HALF_LIFE_DAYS);

        let history = &summary.districts[&DistrictId::new("d1")].votes.keys["P"];
        assert_eq!(history.elections["T"].value, Some(10.0));
        assert_eq!(history.summary, Stat::default());
    }

    #[test]
    fn recency_weight_halves_and_doubles_over_half_life() {
        assert_eq!(recency_weight(0, HALF_LIFE_DAYS), 1.0);
        assert!((recency_weight(-1461, HALF_LIFE_DAYS) - 0.5).abs() < 1e-12);
        // Later elections weigh more than the target itself; kept symmetric on purpose.
        assert!((recency_weight(1461, HALF_LIFE_DAYS) - 2.0).abs() < 1e-12);
        assert!(recency_weight(10, HALF_LIFE_DAYS) > 1.0);
    }

    #[test]
    fn weighted_mean_skips_missing_values_and_weights() {
        let mean = weighted_mean([(Some(1.0), Some(1.0)), (None, Some(5.0)), (Some(4.0), Some(2.0)), (Some(100.0), None)].into_iter());
        assert_eq!(mean, Some(3.0));
        assert_eq!(weighted_mean([(None, Some(1.0))].into_iter()), None);
        assert_eq!(weighted_mean([(Some(1.0), Some(0.0))].into_iter()), None);
    }

    #[test]
    fn extremes_ignore_turnout_and_use_magnitude_for_values() {
        let history = |bias_sd: f64| KeyHistory {
            summary: Stat { value: Some(0.0), bias: Some(0.0), bias_sd: Some(bias_sd) },
            ..Default::default()
        };
        let keys = BTreeMap::from([
            ("A".to_string(), history(1.0)),
            ("B".to_string(), history(-2.0)),
            ("C".to_string(), history(0.5)),
            (TURNOUT.to_string(), history(9.0)),
        ]);

        let votes = bias_extremes(Category::Votes, &keys);
        assert_eq!(votes.max_bias_key.as_deref(), Some("A"));
        assert_eq!(votes.min_bias_key.as_deref(), Some("B"));

        let values = bias_extremes(Category::Values, &keys);
        assert_eq!(values.max_bias_key.as_deref(), Some("B"));
        assert_eq!(values.min_bias_key.as_deref(), Some("C"));
    }

    #[test]
    fn extremes_are_empty_without_summaries() {
        let keys = BTreeMap::from([("A".to_string(), KeyHistory::default())]);
        assert_eq!(bias_extremes(Category::Votes, &keys), BiasExtremes::default());
    }
}
