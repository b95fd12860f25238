mod id;
mod partition;

pub use id::{district_id, normalize_id_field, slugify, DistrictId};
pub use partition::Partition;
