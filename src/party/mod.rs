mod alias;
mod values;

pub use alias::{PartyAliases, PartyEntry};
pub use values::PartyValueSeries;
