use geo::{Area, BooleanOps, MultiPolygon};
use rstar::RTree;

use super::{envelope_of, BoundingBox};

/// Geometries is an indexed collection of MultiPolygons: a district partition
/// or a population grid, queried by bounding box through an R-tree.
#[derive(Debug, Clone)]
pub struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes are kept (so indices line up) but never returned by queries.
    pub fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| BoundingBox::of(i, shape))
                    .collect()
            ),
            shapes,
        }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no MultiPolygons.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get a single shape by index.
    #[inline] pub fn shape(&self, idx: usize) -> &MultiPolygon<f64> { &self.shapes[idx] }

    /// Indices of all shapes whose bounding boxes intersect the bounding box
    /// of `shape`, in ascending index order.
    pub fn candidates(&self, shape: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(envelope) = envelope_of(shape) else { return Vec::new() };
        let mut found = self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|bb| bb.idx())
            .collect::<Vec<_>>();
        found.sort_unstable();
        found
    }

    /// Area of the intersection between shape `idx` and an arbitrary shape.
    #[inline]
    pub fn intersection_area(&self, idx: usize, shape: &MultiPolygon<f64>) -> f64 {
        self.shapes[idx].intersection(shape).unsigned_area()
    }
}
