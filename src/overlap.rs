use std::collections::BTreeMap;

use geo::{Area, BooleanOps};
use serde::{Deserialize, Serialize};

use crate::{district::{DistrictId, Partition}, population::PopulationGrid};

/// Share of a district covered by one district of another partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapEntry {
    /// District of the other partition.
    pub id: DistrictId,
    /// Intersection area / district area.
    pub area_fraction: f64,
    /// Estimated intersection population / estimated district population.
    pub pop_fraction: f64,
}

/// For every district of one partition, the overlapping districts of another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overlaps {
    entries: BTreeMap<DistrictId, Vec<OverlapEntry>>,
}

impl Overlaps {
    pub fn new(entries: BTreeMap<DistrictId, Vec<OverlapEntry>>) -> Self { Self { entries } }

    #[inline] pub fn get(&self, id: &DistrictId) -> Option<&[OverlapEntry]> { self.entries.get(id).map(Vec::as_slice) }

    #[inline] pub fn len(&self) -> usize { self.entries.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&DistrictId, &[OverlapEntry])> {
        self.entries.iter().map(|(id, entries)| (id, entries.as_slice()))
    }
}

impl Partition {
    /// For each district of `self`, list the districts of `other` it overlaps,
    /// with the fraction of its area and estimated population each one covers.
    ///
    /// Candidates are visited in index order of `other`, and a district's list
    /// stops growing once its area fractions sum to at least 1, so sliver
    /// duplicates past full coverage are dropped.
    pub fn overlaps(&self, other: &Partition, grid: &PopulationGrid) -> Overlaps {
        let mut entries = BTreeMap::new();

        for idx in 0..self.len() {
            let shape = self.shape(idx);
            let area = shape.unsigned_area();
            let population = grid.estimate(shape);

            let mut list = Vec::new();
            let mut covered = 0.0;
            for candidate in other.geoms().candidates(shape) {
                let intersection = shape.intersection(other.shape(candidate));
                let area_fraction = if area > 0.0 { intersection.unsigned_area() / area } else { 0.0 };
                if area_fraction == 0.0 { continue }

                let pop_fraction = if population > 0.0 { grid.estimate(&intersection) / population } else { 0.0 };
                list.push(OverlapEntry { id: other.id(candidate).clone(), area_fraction, pop_fraction });

                covered += area_fraction;
                if covered >= 1.0 { break }
            }

            entries.insert(self.id(idx).clone(), list);
        }

        tracing::info!(
            base = self.election(),
            other = other.election(),
            districts = entries.len(),
            "overlaps computed"
        );
        Overlaps { entries }
    }
}

#[cfg(test)]
mod tests {
    use geo::{MultiPolygon, Rect};

    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Rect::new((x0, y0), (x1, y1)).to_polygon()])
    }

    fn uniform_grid() -> PopulationGrid {
        let mut cells = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                cells.push(rect(x as f64, y as f64, x as f64 + 1.0, y as f64 + 1.0));
            }
        }
        let counts = vec![100.0; cells.len()];
        PopulationGrid::new(cells, counts).unwrap()
    }

    #[test]
    fn zero_population_gives_zero_pop_fraction() {
        let empty = PopulationGrid::new(vec![], vec![]).unwrap();
        let a = Partition::new("A", vec!["1".into()], vec![rect(0.0, 0.0, 2.0, 2.0)]).unwrap();
        let b = Partition::new("B", vec!["x".into()], vec![rect(0.0, 0.0, 2.0, 2.0)]).unwrap();
        let overlaps = a.overlaps(&b, &empty);
        let list = overlaps.get(&"1".into()).unwrap();
        assert_eq!(list.len(), 1);
        assert!((list[0].area_fraction - 1.0).abs() < 1e-9);
        assert_eq!(list[0].pop_fraction, 0.0);
    }

    #[test]
    fn touching_districts_are_skipped() {
        let grid = uniform_grid();
        let a = Partition::new("A", vec!["1".into()], vec![rect(0.0, 0.0, 2.0, 2.0)]).unwrap();
        let b = Partition::new("B", vec!["x".into(), "y".into()], vec![rect(2.0, 0.0, 4.0, 2.0), rect(1.0, 0.0, 3.0, 2.0)]).unwrap();
        let overlaps = a.overlaps(&b, &grid);
        let list = overlaps.get(&"1".into()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id.as_str(), "y");
        assert!((list[0].area_fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn districts_without_overlap_have_empty_lists() {
        let grid = uniform_grid();
        let a = Partition::new("A", vec!["1".into()], vec![rect(10.0, 10.0, 11.0, 11.0)]).unwrap();
        let b = Partition::new("B", vec!["x".into()], vec![rect(0.0, 0.0, 4.0, 4.0)]).unwrap();
        let overlaps = a.overlaps(&b, &grid);
        assert_eq!(overlaps.len(), 1);
        assert!(overlaps.get(&"1".into()).unwrap().is_empty());
    }
}
