use std::{collections::HashMap, path::{Path, PathBuf}};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::{
    cache::{fingerprint_of, ArtifactCache, Stage, StageKey},
    combine::{combine, CombinedSummary, ElectionInput},
    common,
    config::Config,
    district::Partition,
    election::{Election, ElectionResults},
    export::{write_compact_geojson, write_table_csv},
    overlap::Overlaps,
    population::PopulationGrid,
    reproject::{reproject_popularity, reproject_values, Reprojection},
    results::ResultsProvider,
};

/// Runs the full reapportionment for one configuration: fetch results,
/// compare each source partition with the target, reproject, combine and
/// export. Every stage output is cached in the output directory.
pub struct Pipeline {
    config: Config,
    cache: ArtifactCache,
    out_dir: PathBuf,
    provider: Box<dyn ResultsProvider>,
    partitions: HashMap<String, Partition>,
    grid: Option<PopulationGrid>,
}

impl Pipeline {
    pub fn new(config: Config, out_dir: &Path, provider: Box<dyn ResultsProvider>) -> Result<Self> {
        common::ensure_dir_exists(out_dir)?;
        Ok(Self {
            config,
            cache: ArtifactCache::new(out_dir)?,
            out_dir: out_dir.to_path_buf(),
            provider,
            partitions: HashMap::new(),
            grid: None,
        })
    }

    #[inline] pub fn config(&self) -> &Config { &self.config }

    #[inline] pub fn cache(&self) -> &ArtifactCache { &self.cache }

    /// Use an already loaded partition (in the common CRS) instead of its shapefile.
    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partitions.insert(partition.election().to_string(), partition);
        self
    }

    /// Use an already loaded population grid (in the common CRS).
    pub fn with_population(mut self, grid: PopulationGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Path of the summary table written by [`Pipeline::run`].
    pub fn table_path(&self) -> PathBuf {
        self.out_dir.join(format!("combined_{}.csv", self.config.target))
    }

    /// Path of the rounded combined summary written by [`Pipeline::run`].
    pub fn summary_path(&self) -> PathBuf {
        self.out_dir.join(format!("combined_{}.json", self.config.target))
    }

    /// Path of the compact target geometry written by [`Pipeline::run`].
    pub fn geojson_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}_geo.json", self.config.target))
    }

    /// CRS a loaded election's shapes are in, if known.
    fn partition_crs(&self, election: &str) -> Result<Option<String>> {
        let own = self.config.election_config(election)?.proj4.clone();
        Ok(self.config.proj4.clone().or(own))
    }

    fn load_partition(&mut self, election: &str) -> Result<()> {
        if self.partitions.contains_key(election) { return Ok(()) }

        let source = self.config.election_config(election)?;
        let path = self.config.resolve(&source.shapes);
        let mut partition = Partition::from_shapefile(election, &path, &source.id_fields)
            .with_context(|| format!("[pipeline] failed to load districts of {election}"))?;
        if let (Some(from), Some(to)) = (&source.proj4, &self.config.proj4) {
            partition = partition.reproject(from, to)?;
        }

        self.partitions.insert(election.to_string(), partition);
        Ok(())
    }

    fn partition(&self, election: &str) -> Result<&Partition> {
        self.partitions.get(election).ok_or_else(|| anyhow!("[pipeline] districts of {election} are not loaded"))
    }

    fn load_population(&mut self) -> Result<()> {
        if self.grid.is_some() { return Ok(()) }

        let population = &self.config.population;
        let path = self.config.resolve(&population.path);
        let mut grid = PopulationGrid::from_shapefile(&path, &population.field)
            .context("[pipeline] failed to load population grid")?;
        if let (Some(from), Some(to)) = (&population.proj4, &self.config.proj4) {
            grid = grid.reproject(from, to)?;
        }

        self.grid = Some(grid);
        Ok(())
    }

    /// Fingerprint of the inputs that determine an election's results.
    fn results_fingerprint(&self, election: &str) -> Result<String> {
        fingerprint_of(self.config.election_config(election)?)
    }

    /// Fingerprint of the inputs that determine the overlaps of `source` with the target.
    fn compare_fingerprint(&self, source: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Inputs<'a> {
            source: &'a crate::config::ElectionConfig,
            target: &'a crate::config::ElectionConfig,
            population: &'a crate::config::PopulationConfig,
            proj4: &'a Option<String>,
        }
        fingerprint_of(&Inputs {
            source: self.config.election_config(source)?,
            target: self.config.election_config(&self.config.target)?,
            population: &self.config.population,
            proj4: &self.config.proj4,
        })
    }

    /// Fingerprint of the inputs that determine a reprojection of `source`.
    fn reproject_fingerprint(&self, stage: Stage, source: &str) -> Result<String> {
        let upstream = [self.results_fingerprint(source)?, self.compare_fingerprint(source)?];
        match stage {
            Stage::Values => fingerprint_of(&(upstream, &self.config.parties, &self.config.values)),
            _ => fingerprint_of(&(upstream, &self.config.parties)),
        }
    }

    /// Per-district results of `election`, from cache or the provider.
    pub fn results(&self, election: &str, force: bool) -> Result<ElectionResults> {
        let key = StageKey::new(Stage::Results, Some(election), None, self.results_fingerprint(election)?);
        self.cache.get_or_compute(&key, force, || {
            tracing::info!(election, "fetching results");
            self.provider.results(election)
        })
    }

    /// Overlaps of every target district with the districts of `source`.
    pub fn compare(&mut self, source: &str, force: bool) -> Result<Overlaps> {
        let target = self.config.target.clone();
        let key = StageKey::new(Stage::Compare, Some(source), Some(&target), self.compare_fingerprint(source)?);
        if !force {
            if let Some(overlaps) = self.cache.load(&key)? { return Ok(overlaps) }
        }

        self.load_partition(&target)?;
        self.load_partition(source)?;
        self.load_population()?;

        let grid = self.grid.as_ref().ok_or_else(|| anyhow!("[pipeline] population grid is not loaded"))?;
        let overlaps = self.partition(&target)?.overlaps(self.partition(source)?, grid);
        self.cache.store(&key, &overlaps)?;
        Ok(overlaps)
    }

    /// Vote shares of `source` reprojected onto the target partition.
    fn popularity(&self, source: &Election, overlaps: &Overlaps, results: &ElectionResults, force: bool) -> Result<Reprojection> {
        let key = StageKey::new(Stage::Popularity, Some(&source.key), Some(&self.config.target),
            self.reproject_fingerprint(Stage::Popularity, &source.key)?);
        self.cache.get_or_compute(&key, force, || {
            tracing::info!(election = %source.key, "reprojecting popularity");
            Ok(reproject_popularity(overlaps, results, &self.config.parties, &source.key))
        })
    }

    /// Party position scores of `source` reprojected onto the target partition.
    fn values(&self, source: &Election, overlaps: &Overlaps, results: &ElectionResults, force: bool) -> Result<Reprojection> {
        let key = StageKey::new(Stage::Values, Some(&source.key), Some(&self.config.target),
            self.reproject_fingerprint(Stage::Values, &source.key)?);
        self.cache.get_or_compute(&key, force, || {
            tracing::info!(election = %source.key, "reprojecting values");
            let values = &self.config.values;
            Ok(reproject_values(overlaps, results, &self.config.parties, &values.series, &values.axes, source))
        })
    }

    /// Run every stage for every configured election, then combine and export.
    /// `force` recomputes stages even when their artifacts are cached.
    pub fn run(&mut self, force: bool) -> Result<CombinedSummary> {
        let target = self.config.target_election()?;
        let mut reprojections = Vec::with_capacity(self.config.elections.len());

        for key in self.config.elections.clone() {
            let election = self.config.election(&key)?;
            tracing::info!(election = %key, target = %target.key, "processing election");

            let results = self.results(&key, force)
                .with_context(|| format!("[pipeline] results of {key}"))?;
            let overlaps = self.compare(&key, force)
                .with_context(|| format!("[pipeline] comparison of {key} with {}", target.key))?;
            let popularity = self.popularity(&election, &overlaps, &results, force)?;
            let values = self.values(&election, &overlaps, &results, force)?;
            reprojections.push((election, popularity, values));
        }

        let key = StageKey::new(Stage::Combined, None, Some(&target.key), self.config.fingerprint()?);
        let summary = self.cache.get_or_compute(&key, force, || {
            tracing::info!(target = %target.key, elections = reprojections.len(), "combining elections");
            let inputs = reprojections.iter()
                .map(|(election, popularity, values)| ElectionInput { election, popularity, values })
                .collect::<Vec<_>>();
            Ok(combine(&target, &inputs, self.config.half_life_days))
        })?;

        common::write_json_rounded(&self.summary_path(), &summary)?;
        write_table_csv(&summary, &self.table_path())?;

        self.load_partition(&target.key)?;
        let crs = self.partition_crs(&target.key)?;
        write_compact_geojson(self.partition(&target.key)?, crs.as_deref(), &self.geojson_path())?;

        tracing::info!(target = %target.key, districts = summary.districts.len(), "run complete");
        Ok(summary)
    }
}
