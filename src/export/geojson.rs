use std::path::Path;

use anyhow::{Context, Result};
use geo::{MultiPolygon, Polygon};
use serde_json::{json, Value};

use crate::{
    common,
    district::Partition,
    geom::{encode_polyline, WGS84},
};

/// Rings of a polygon as encoded polylines, exterior first.
fn encode_polygon(polygon: &Polygon<f64>) -> Vec<String> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(encode_polyline)
        .collect()
}

fn encode_multipolygon(shape: &MultiPolygon<f64>) -> Value {
    json!({
        "type": "MultiPolygon",
        "coordinates": shape.iter().map(encode_polygon).collect::<Vec<_>>(),
    })
}

/// Feature collection of a partition in WGS84 with every ring encoded as a
/// polyline. `crs` is the PROJ.4 CRS the partition is currently in; `None`
/// means it is already geographic WGS84.
pub fn compact_geojson(partition: &Partition, crs: Option<&str>) -> Result<Value> {
    let geoms = match crs {
        Some(crs) => partition.geoms().reproject(crs, WGS84)
            .with_context(|| format!("[export::geojson] failed to reproject {} to WGS84", partition.election()))?,
        None => partition.geoms().clone(),
    };

    let features = partition.ids().iter().zip(geoms.shapes())
        .map(|(id, shape)| json!({
            "type": "Feature",
            "id": id,
            "properties": {"id": id},
            "geometry": encode_multipolygon(shape),
        }))
        .collect::<Vec<_>>();

    Ok(json!({"type": "FeatureCollection", "features": features}))
}

/// Write the compact feature collection of a partition to `path`.
pub fn write_compact_geojson(partition: &Partition, crs: Option<&str>, path: &Path) -> Result<()> {
    let collection = compact_geojson(partition, crs)?;
    common::write_json(path, &collection)?;
    tracing::info!(election = partition.election(), path = %path.display(), "compact geojson written");
    Ok(())
}
