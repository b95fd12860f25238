use std::{fs::File, io::{BufReader, BufWriter, Write}, path::Path};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Decimal places kept for floats in published JSON outputs.
pub(crate) const JSON_PRECISION: i32 = 4;

/// Round a float to `precision` decimal places.
#[inline]
pub(crate) fn round_to(x: f64, precision: i32) -> f64 {
    let scale = 10f64.powi(precision);
    (x * scale).round() / scale
}

/// Recursively round every float in a JSON value. Integers are left untouched.
pub(crate) fn round_floats(value: Value, precision: i32) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64()
            .and_then(|x| serde_json::Number::from_f64(round_to(x, precision)))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items.into_iter()
            .map(|v| round_floats(v, precision))
            .collect()),
        Value::Object(map) => Value::Object(map.into_iter()
            .map(|(k, v)| (k, round_floats(v, precision)))
            .collect()),
        other => other,
    }
}

/// Serialize `data` to a pretty JSON file at `path`, rounding floats.
pub(crate) fn write_json_rounded<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let value = round_floats(
        serde_json::to_value(data).context("[io::json] Failed to serialize artifact")?,
        JSON_PRECISION,
    );
    let file = File::create(path)
        .with_context(|| format!("[io::json] Failed to create JSON file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &value)
        .with_context(|| format!("[io::json] Failed to write JSON to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Serialize `data` to a compact JSON file at `path` without rounding.
pub(crate) fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::json] Failed to create JSON file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, data)
        .with_context(|| format!("[io::json] Failed to write JSON to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Deserialize a JSON file at `path`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("[io::json] Failed to read JSON file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::json] Failed to parse JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rounds_nested_floats_only() {
        let value = json!({"a": 1.234567, "b": [0.00004, 2], "c": {"d": -3.33337}, "e": null});
        let rounded = round_floats(value, 4);
        assert_eq!(rounded, json!({"a": 1.2346, "b": [0.0, 2], "c": {"d": -3.3334}, "e": null}));
    }

    #[test]
    fn rounded_file_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("artifact.json");
        write_json_rounded(&path, &json!({"x": 0.123456789})).unwrap();
        let back: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(back, json!({"x": 0.1235}));
    }
}
