use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::{Column, NamedFrom}, series::Series};

use crate::{
    combine::{Category, CombinedSummary, KeyHistory, KeyStats},
    common::{self, round_to},
    stats::SeriesStats,
};

const TABLE_PRECISION: i32 = 2;
const SUMMARY: &str = "summary";

/// Cross-district statistics listed below the district rows.
const STAT_ROWS: [(&str, fn(&SeriesStats) -> Option<f64>); 4] = [
    ("mean", |s| s.mean),
    ("sd", |s| s.sd),
    ("min", |s| s.min),
    ("max", |s| s.max),
];

/// One table column: a key's figure for one election, or its summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableColumn {
    category: Category,
    key: String,
    election: String,
}

impl TableColumn {
    fn name(&self) -> String { format!("{}|{}", self.key, self.election) }

    fn district_value(&self, history: &KeyHistory) -> Option<f64> {
        match self.election.as_str() {
            SUMMARY => history.summary.value,
            election => history.elections.get(election)?.value,
        }
    }

    fn stats<'a>(&self, stats: &'a KeyStats) -> Option<&'a SeriesStats> {
        match self.election.as_str() {
            SUMMARY => Some(&stats.summary),
            election => stats.elections.get(election),
        }
    }
}

/// Columns in order of first appearance across districts.
fn table_columns(summary: &CombinedSummary) -> Vec<TableColumn> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for district in summary.districts.values() {
        for category in Category::ALL {
            for (key, history) in &district.category(category).keys {
                let elections = history.elections.keys().map(String::as_str).chain([SUMMARY]);
                for election in elections {
                    let column = TableColumn { category, key: key.clone(), election: election.to_string() };
                    if seen.insert(column.clone()) { columns.push(column) }
                }
            }
        }
    }
    columns
}

/// Flatten a combined summary into a table: one row per district followed by
/// `mean`, `sd`, `min` and `max` rows, one `key|election` column per figure.
/// Values are rounded to two decimals.
pub fn summary_table(summary: &CombinedSummary) -> Result<DataFrame> {
    let columns = table_columns(summary);
    let round = |value: Option<f64>| value.map(|x| round_to(x, TABLE_PRECISION));

    let labels = summary.districts.keys()
        .map(|id| id.to_string())
        .chain(STAT_ROWS.iter().map(|(label, _)| label.to_string()))
        .collect::<Vec<_>>();

    let mut frame = vec![Column::from(Series::new("district".into(), labels))];
    for column in &columns {
        let district_values = summary.districts.values()
            .map(|district| {
                district.category(column.category).keys.get(&column.key)
                    .and_then(|history| column.district_value(history))
            });

        let stats = summary.sds.get(&column.category)
            .and_then(|keys| keys.get(&column.key))
            .and_then(|stats| column.stats(stats));
        let stat_values = STAT_ROWS.iter().map(|(_, field)| stats.and_then(field));

        let values = district_values.chain(stat_values).map(round).collect::<Vec<_>>();
        frame.push(Series::new(column.name().into(), values).into());
    }

    DataFrame::new(frame).context("[export::table] failed to build summary table")
}

/// Write the summary table to a CSV file.
pub fn write_table_csv(summary: &CombinedSummary, path: &Path) -> Result<()> {
    let mut df = summary_table(summary)?;
    common::write_csv(&mut df, path)?;
    tracing::info!(path = %path.display(), rows = df.height(), columns = df.width(), "summary table written");
    Ok(())
}
