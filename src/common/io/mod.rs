mod csv;
mod json;
mod shp;

pub(crate) use csv::*;
pub(crate) use json::*;
pub(crate) use shp::*;
