#![doc = "districtshift public API"]
mod cache;
mod combine;
mod common;
mod config;
mod district;
mod election;
mod export;
mod geom;
mod overlap;
mod party;
mod pipeline;
mod population;
mod reproject;
mod results;
mod stats;

#[doc(inline)]
pub use cache::{ArtifactCache, Stage, StageKey};

#[doc(inline)]
pub use combine::{combine, BiasExtremes, Category, CategorySummary, CombinedSummary, DistrictSummary, ElectionInput, KeyHistory, KeyStats, recency_weight, HALF_LIFE_DAYS};

#[doc(inline)]
pub use config::{Config, ElectionConfig, PopulationConfig, ValueConfig, VrkSource};

#[doc(inline)]
pub use district::{district_id, normalize_id_field, slugify, DistrictId, Partition};

#[doc(inline)]
pub use election::{DistrictResult, Election, ElectionResults, TOTAL, TURNOUT, VOTERS};

#[doc(inline)]
pub use export::{compact_geojson, summary_table, write_compact_geojson, write_table_csv};

#[doc(inline)]
pub use geom::{encode_polyline, Geometries};

#[doc(inline)]
pub use overlap::{OverlapEntry, Overlaps};

#[doc(inline)]
pub use party::{PartyAliases, PartyEntry, PartyValueSeries};

#[doc(inline)]
pub use pipeline::Pipeline;

#[doc(inline)]
pub use population::PopulationGrid;

#[doc(inline)]
pub use reproject::{reproject_popularity, reproject_values, Reprojection};

#[doc(inline)]
pub use results::{JsonResultsProvider, ResultsProvider};

#[cfg(feature = "download")]
#[doc(inline)]
pub use results::VrkClient;

#[doc(inline)]
pub use stats::{SeriesStats, Stat};
