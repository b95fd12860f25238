use std::path::Path;

use anyhow::{bail, Context, Result};
use shapefile::{dbase::{FieldValue, Record}, Reader, Shape};

/// A raw attribute value used as part of a district identifier.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldText {
    Text(String),
    Number(f64),
}

/// Reads all shapes + attribute records from a given `.shp` file path.
pub(crate) fn read_shapefile(path: &Path) -> Result<(Vec<Shape>, Vec<Record>)> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut shapes = Vec::new();
    let mut records = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .with_context(|| format!("Error reading shape+record in {}", path.display()))?;
        shapes.push(shape);
        records.push(record);
    }
    Ok((shapes, records))
}

/// Get an attribute as text or number, for building district identifiers.
pub(crate) fn get_id_field(record: &Record, field: &str) -> Result<FieldText> {
    Ok(match record.get(field) {
        Some(FieldValue::Character(Some(s))) => FieldText::Text(s.clone()),
        Some(FieldValue::Memo(s)) => FieldText::Text(s.clone()),
        Some(FieldValue::Numeric(Some(n))) => FieldText::Number(*n),
        Some(FieldValue::Integer(i)) => FieldText::Number(*i as f64),
        Some(FieldValue::Float(Some(f))) => FieldText::Number(*f as f64),
        Some(FieldValue::Double(d)) => FieldText::Number(*d),
        Some(FieldValue::Character(None)) => FieldText::Text(String::new()),
        _ => bail!("missing or invalid id field: {}", field),
    })
}

/// Get the value of a numeric attribute, accepting numeric text.
pub(crate) fn get_numeric_field(record: &Record, field: &str) -> Result<f64> {
    match record.get(field) {
        Some(FieldValue::Numeric(Some(n))) => Ok(*n),
        Some(FieldValue::Integer(i)) => Ok(*i as f64),
        Some(FieldValue::Float(Some(f))) => Ok(*f as f64),
        Some(FieldValue::Double(d)) => Ok(*d),
        Some(FieldValue::Character(Some(s))) => s.trim().parse()
            .with_context(|| format!("non-numeric value {s:?} in field: {field}")),
        _ => bail!("missing or invalid numeric field: {}", field),
    }
}
