use anyhow::{bail, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{PolygonRing, Shape};

/// Convert a list of shapefile rings to a geo::MultiPolygon<f64>.
/// Shapefiles store each outer ring followed by its holes.
fn rings_to_multipolygon<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn closed(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
        LineString(coords)
    }

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let ls = closed(ring.points().iter().map(&xy).collect());
        match ring {
            PolygonRing::Outer(_) => {
                // flush previous polygon
                if let Some(ext) = current_exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(ls);
            }
            PolygonRing::Inner(_) => current_holes.push(ls),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    MultiPolygon(polys)
}

/// Convert a shapefile Shape to a geo::MultiPolygon<f64>, dropping Z/M values.
/// Null shapes become an empty MultiPolygon.
pub(crate) fn shape_to_multipolygon(shape: Shape) -> Result<MultiPolygon<f64>> {
    Ok(match shape {
        Shape::Polygon(p) => rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::PolygonM(p) => rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::PolygonZ(p) => rings_to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::NullShape => MultiPolygon(vec![]),
        other => bail!("Unsupported shape type (expected polygon): {:?}", other.shapetype()),
    })
}

#[cfg(test)]
mod tests {
    use geo::Area;
    use shapefile::{Point, Polygon, PolygonRing, Shape};

    use super::shape_to_multipolygon;

    fn pt(x: f64, y: f64) -> Point { Point { x, y } }

    #[test]
    fn outer_ring_with_hole() {
        let polygon = Polygon::with_rings(vec![
            PolygonRing::Outer(vec![pt(0.0, 0.0), pt(0.0, 4.0), pt(4.0, 4.0), pt(4.0, 0.0), pt(0.0, 0.0)]),
            PolygonRing::Inner(vec![pt(1.0, 1.0), pt(2.0, 1.0), pt(2.0, 2.0), pt(1.0, 2.0), pt(1.0, 1.0)]),
        ]);
        let mp = shape_to_multipolygon(Shape::Polygon(polygon)).unwrap();
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert!((mp.unsigned_area() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn two_outer_rings_make_two_polygons() {
        let polygon = Polygon::with_rings(vec![
            PolygonRing::Outer(vec![pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 1.0), pt(1.0, 0.0), pt(0.0, 0.0)]),
            PolygonRing::Outer(vec![pt(5.0, 0.0), pt(5.0, 1.0), pt(6.0, 1.0), pt(6.0, 0.0), pt(5.0, 0.0)]),
        ]);
        let mp = shape_to_multipolygon(Shape::Polygon(polygon)).unwrap();
        assert_eq!(mp.0.len(), 2);
    }

    #[test]
    fn null_shape_is_empty() {
        assert!(shape_to_multipolygon(Shape::NullShape).unwrap().0.is_empty());
    }

    #[test]
    fn points_are_rejected() {
        assert!(shape_to_multipolygon(Shape::Point(pt(0.0, 0.0))).is_err());
    }
}
