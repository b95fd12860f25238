use anyhow::{anyhow, Context, Result};
use geo::{Coord, MultiPolygon, TryMapCoords};
use proj4rs::{proj::Proj, transform::transform};

use super::Geometries;

/// PROJ.4 string for WGS84 lon/lat, the CRS of exported map geometry.
pub(crate) const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Returns true if the PROJ.4 string describes a geographic (lon/lat) CRS.
pub(crate) fn is_geographic(proj_string: &str) -> bool {
    proj_string.split_whitespace()
        .any(|token| token == "+proj=longlat" || token == "+proj=latlong")
}

/// Parse a PROJ.4 string into a projection.
fn build(proj_string: &str) -> Result<Proj> {
    Proj::from_proj_string(proj_string)
        .map_err(|e| anyhow!("{e:?}"))
        .with_context(|| format!("[geom::proj] failed to build PROJ.4: {proj_string}"))
}

/// Reproject a MultiPolygon between two CRSs. Geographic coordinates are in degrees.
pub(crate) fn reproject_shape(shape: &MultiPolygon<f64>, from: &str, to: &str) -> Result<MultiPolygon<f64>> {
    let (src, dst) = (build(from)?, build(to)?);
    let (src_geog, dst_geog) = (is_geographic(from), is_geographic(to));

    shape.try_map_coords(|coord: Coord<f64>| {
        let mut point = if src_geog {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&src, &dst, &mut point)
            .map_err(|e| anyhow!("[geom::proj] CRS transform failed at ({}, {}): {e:?}", coord.x, coord.y))?;
        Ok(if dst_geog {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    })
}

impl Geometries {
    /// Reproject every shape from CRS `from` to CRS `to`, rebuilding the R-tree.
    pub fn reproject(&self, from: &str, to: &str) -> Result<Self> {
        if from.trim() == to.trim() { return Ok(self.clone()) }

        let shapes = self.shapes().iter()
            .map(|shape| reproject_shape(shape, from, to))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(shapes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_geographic_crs() {
        assert!(is_geographic(WGS84));
        assert!(is_geographic("+proj=latlong +ellps=GRS80"));
        assert!(!is_geographic("+proj=tmerc +lat_0=0 +lon_0=24 +k=0.9998 +x_0=500000 +y_0=0 +ellps=GRS80 +units=m +no_defs"));
    }

    #[test]
    fn identical_crs_is_a_no_op() {
        let geoms = Geometries::new(vec![MultiPolygon(vec![
            geo::Rect::new((1.0, 2.0), (3.0, 4.0)).to_polygon()
        ])]);
        let same = geoms.reproject(WGS84, WGS84).unwrap();
        assert_eq!(same.shapes(), geoms.shapes());
    }
}
