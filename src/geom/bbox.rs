use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, tagged with the index of its shape.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    idx: usize, // Index of corresponding MultiPolygon in shapes
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(super) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Bounding box of a shape, or `None` for an empty MultiPolygon.
    pub(super) fn of(idx: usize, shape: &MultiPolygon<f64>) -> Option<Self> {
        shape.bounding_rect().map(|bbox| Self::new(idx, bbox))
    }

    /// Get the index of the corresponding MultiPolygon.
    #[inline] pub(super) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Envelope of a shape for R-tree queries; `None` for an empty MultiPolygon.
pub(super) fn envelope_of(shape: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    shape.bounding_rect()
        .map(|rect| AABB::from_corners(rect.min().into(), rect.max().into()))
}
