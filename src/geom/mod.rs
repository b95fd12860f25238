mod bbox;
mod geom;
mod polyline;
mod proj;

use bbox::{envelope_of, BoundingBox};
pub use geom::Geometries;
pub use polyline::encode_polyline;
pub(crate) use proj::WGS84;
