use std::{collections::HashSet, path::Path};

use anyhow::{bail, ensure, Context, Result};
use geo::MultiPolygon;

use crate::{common, geom::Geometries};
use super::{id::normalize_field, DistrictId};

/// One election's set of district polygons with their ids, in file order.
#[derive(Debug, Clone)]
pub struct Partition {
    election: String,
    ids: Vec<DistrictId>,
    geoms: Geometries,
}

impl Partition {
    /// Construct a partition from parallel lists of ids and shapes.
    /// Repeated ids are kept but logged.
    pub fn new(election: &str, ids: Vec<DistrictId>, shapes: Vec<MultiPolygon<f64>>) -> Result<Self> {
        ensure!(ids.len() == shapes.len(),
            "[district] {election}: {} ids but {} shapes", ids.len(), shapes.len());

        let unique = ids.iter().collect::<HashSet<_>>().len();
        if unique != ids.len() {
            tracing::warn!(election, duplicates = ids.len() - unique, "partition has repeated district ids");
        }

        Ok(Self { election: election.to_string(), ids, geoms: Geometries::new(shapes) })
    }

    /// Load a partition from a shapefile, building ids from `id_fields`.
    pub fn from_shapefile(election: &str, path: &Path, id_fields: &[String]) -> Result<Self> {
        if id_fields.is_empty() { bail!("[district] {election}: no id fields configured") }

        let (shapes, records) = common::read_shapefile(path)?;
        let ids = records.iter()
            .map(|record| -> Result<DistrictId> {
                let parts = id_fields.iter()
                    .map(|field| common::get_id_field(record, field).map(|raw| normalize_field(&raw)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(DistrictId::new(&parts.join(":")))
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Error building district ids from {}", path.display()))?;

        let shapes = shapes.into_iter()
            .map(common::shape_to_multipolygon)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Error converting shapes to multipolygons in shapefile: {}", path.display()))?;

        tracing::info!(election, path = %path.display(), districts = ids.len(), "partition loaded");
        Self::new(election, ids, shapes)
    }

    /// Reproject the district shapes between two PROJ.4 CRSs.
    pub fn reproject(self, from: &str, to: &str) -> Result<Self> {
        let geoms = self.geoms.reproject(from, to)
            .with_context(|| format!("[district] failed to reproject partition {}", self.election))?;
        Ok(Self { geoms, ..self })
    }

    /// Key of the election this partition belongs to.
    #[inline] pub fn election(&self) -> &str { &self.election }

    /// Get the number of districts.
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    /// Check if there are no districts.
    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// District ids in partition order.
    #[inline] pub fn ids(&self) -> &[DistrictId] { &self.ids }

    /// Id of the district at `idx`.
    #[inline] pub fn id(&self, idx: usize) -> &DistrictId { &self.ids[idx] }

    /// Shape of the district at `idx`.
    #[inline] pub fn shape(&self, idx: usize) -> &MultiPolygon<f64> { self.geoms.shape(idx) }

    /// The indexed geometry store.
    #[inline] pub fn geoms(&self) -> &Geometries { &self.geoms }
}
