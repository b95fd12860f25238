mod election;
mod results;

pub use election::Election;
pub use results::{DistrictResult, ElectionResults, TOTAL, TURNOUT, VOTERS};
pub(crate) use results::is_turnout_key;
