mod geojson;
mod table;

pub use geojson::{compact_geojson, write_compact_geojson};
pub use table::{summary_table, write_table_csv};
