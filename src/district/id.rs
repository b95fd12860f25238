use std::{fmt, sync::{Arc, LazyLock}};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::common::FieldText;

/// Stable composite key of a district within one election's partition,
/// e.g. "3:12:zirmunu" (constituency number, district number, name slug).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistrictId(Arc<str>);

impl DistrictId {
    pub fn new(id: &str) -> Self { Self(Arc::from(id)) }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for DistrictId {
    fn from(id: &str) -> Self { Self::new(id) }
}

impl std::borrow::Borrow<str> for DistrictId {
    fn borrow(&self) -> &str { &self.0 }
}

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").expect("valid regex"));

/// Remove every non-word character and lowercase the rest.
pub fn slugify(text: &str) -> String {
    NON_WORD.replace_all(text, "").to_lowercase()
}

/// Normalize one id attribute: integers print as integers, anything else is slugified.
pub fn normalize_id_field(text: &str) -> String {
    match text.trim().parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => slugify(text),
    }
}

/// Normalize a raw attribute value (text or number) into an id component.
pub(crate) fn normalize_field(field: &FieldText) -> String {
    match field {
        FieldText::Number(n) if n.is_finite() => (n.trunc() as i64).to_string(),
        FieldText::Number(n) => slugify(&n.to_string()),
        FieldText::Text(s) => normalize_id_field(s),
    }
}

/// Build a composite district id from already-extracted attribute texts.
pub fn district_id<S: AsRef<str>>(parts: &[S]) -> DistrictId {
    DistrictId::new(&parts.iter()
        .map(|part| normalize_id_field(part.as_ref()))
        .collect::<Vec<_>>()
        .join(":"))
}
