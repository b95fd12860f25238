use std::path::Path;

use anyhow::{ensure, Context, Result};
use geo::{Area, MultiPolygon};

use crate::{common, geom::Geometries};

/// A fixed grid of populated cells used to estimate the population of
/// arbitrary polygons, assuming population is spread evenly within a cell.
#[derive(Debug, Clone)]
pub struct PopulationGrid {
    cells: Geometries,
    counts: Vec<f64>,
    areas: Vec<f64>,
}

impl PopulationGrid {
    /// Construct a grid from cell polygons and their population counts.
    pub fn new(cells: Vec<MultiPolygon<f64>>, counts: Vec<f64>) -> Result<Self> {
        ensure!(cells.len() == counts.len(),
            "[population] {} cells but {} population counts", cells.len(), counts.len());

        let areas = cells.iter().map(|cell| cell.unsigned_area()).collect();
        Ok(Self { cells: Geometries::new(cells), counts, areas })
    }

    /// Load a grid from a shapefile, reading populations from `field`.
    pub fn from_shapefile(path: &Path, field: &str) -> Result<Self> {
        let (shapes, records) = common::read_shapefile(path)?;

        let counts = records.iter()
            .map(|record| common::get_numeric_field(record, field))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Error reading population field {field} in {}", path.display()))?;

        let cells = shapes.into_iter()
            .map(common::shape_to_multipolygon)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Error converting grid cells in shapefile: {}", path.display()))?;

        tracing::info!(path = %path.display(), cells = cells.len(), "population grid loaded");
        Self::new(cells, counts)
    }

    /// Reproject the grid cells between two PROJ.4 CRSs. Cell areas are
    /// recomputed in the new CRS.
    pub fn reproject(self, from: &str, to: &str) -> Result<Self> {
        let cells = self.cells.reproject(from, to)
            .context("[population] failed to reproject population grid")?;
        Self::new(cells.shapes().to_vec(), self.counts)
    }

    /// Get the number of grid cells.
    #[inline] pub fn len(&self) -> usize { self.counts.len() }

    /// Check if the grid has no cells.
    #[inline] pub fn is_empty(&self) -> bool { self.counts.is_empty() }

    /// Total population of the grid.
    pub fn total(&self) -> f64 { self.counts.iter().sum() }

    /// Population of cell `idx` that falls inside `shape`.
    fn cell_share(&self, idx: usize, shape: &MultiPolygon<f64>) -> f64 {
        let area = self.areas[idx];
        if area <= 0.0 { return 0.0 }
        self.counts[idx] * self.cells.intersection_area(idx, shape) / area
    }

    /// Estimate the population inside `shape`.
    pub fn estimate(&self, shape: &MultiPolygon<f64>) -> f64 {
        self.cells.candidates(shape).into_iter()
            .map(|idx| self.cell_share(idx, shape))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use geo::{BooleanOps, MultiPolygon, Rect};

    use super::PopulationGrid;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Rect::new((x0, y0), (x1, y1)).to_polygon()])
    }

    /// 2x2 grid of unit cells with populations 10, 20, 30, 40.
    fn grid() -> PopulationGrid {
        PopulationGrid::new(
            vec![rect(0.0, 0.0, 1.0, 1.0), rect(1.0, 0.0, 2.0, 1.0), rect(0.0, 1.0, 1.0, 2.0), rect(1.0, 1.0, 2.0, 2.0)],
            vec![10.0, 20.0, 30.0, 40.0],
        ).unwrap()
    }

    #[test]
    fn whole_grid_estimates_total() {
        let g = grid();
        assert!((g.estimate(&rect(-1.0, -1.0, 3.0, 3.0)) - 100.0).abs() < 1e-9);
        assert_eq!(g.total(), 100.0);
    }

    #[test]
    fn partial_cells_scale_by_area() {
        let g = grid();
        // Left half of the bottom row: half of cell 0 and nothing else.
        assert!((g.estimate(&rect(0.0, 0.0, 0.5, 1.0)) - 5.0).abs() < 1e-9);
        // Centered unit square covers a quarter of each cell.
        assert!((g.estimate(&rect(0.5, 0.5, 1.5, 1.5)) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_geometry_estimates_zero() {
        assert_eq!(grid().estimate(&rect(10.0, 10.0, 11.0, 11.0)), 0.0);
        assert_eq!(grid().estimate(&MultiPolygon(vec![])), 0.0);
    }

    #[test]
    fn estimates_are_additive() {
        let g = grid();
        let left = rect(0.2, 0.1, 1.0, 1.7);
        let right = rect(1.0, 0.1, 1.6, 1.7);
        let union = left.union(&right);
        let sum = g.estimate(&left) + g.estimate(&right);
        assert!((g.estimate(&union) - sum).abs() < 1e-9);
    }

    #[test]
    fn zero_area_cells_contribute_nothing() {
        let g = PopulationGrid::new(
            vec![rect(0.0, 0.0, 0.0, 1.0), rect(0.0, 0.0, 1.0, 1.0)],
            vec![1000.0, 10.0],
        ).unwrap();
        assert!((g.estimate(&rect(0.0, 0.0, 1.0, 1.0)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn counts_must_match_cells() {
        assert!(PopulationGrid::new(vec![rect(0.0, 0.0, 1.0, 1.0)], vec![]).is_err());
    }
}
