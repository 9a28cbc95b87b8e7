//! Conversion of HANA values into the generic record model

use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;

use hdbconnect_async::{HdbResult, HdbValue};
use serde_json::Value;

type JsonFuture = Pin<Box<dyn Future<Output = HdbResult<Value>> + Send>>;

/// Convert `HdbValue` to `serde_json::Value`
///
/// Temporal values keep their HANA text form; binary and spatial values
/// (WKB) become lowercase hex strings.
pub fn hdb_value_to_json(value: &HdbValue) -> Value {
    match value {
        HdbValue::NULL => Value::Null,
        HdbValue::TINYINT(v) => serde_json::json!(v),
        HdbValue::SMALLINT(v) => serde_json::json!(v),
        HdbValue::INT(v) => serde_json::json!(v),
        HdbValue::BIGINT(v) => serde_json::json!(v),
        HdbValue::DECIMAL(v) => serde_json::json!(v.to_string()),
        HdbValue::REAL(v) => serde_json::json!(v),
        HdbValue::DOUBLE(v) => serde_json::json!(v),
        HdbValue::STRING(v) => serde_json::json!(v),
        HdbValue::STR(v) => serde_json::json!(v),
        HdbValue::DBSTRING(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        HdbValue::BOOLEAN(v) => serde_json::json!(v),
        HdbValue::LONGDATE(v) => serde_json::json!(v.to_string()),
        HdbValue::SECONDDATE(v) => serde_json::json!(v.to_string()),
        HdbValue::DAYDATE(v) => serde_json::json!(v.to_string()),
        HdbValue::SECONDTIME(v) => serde_json::json!(v.to_string()),
        HdbValue::BINARY(bytes) | HdbValue::GEOMETRY(bytes) | HdbValue::POINT(bytes) => {
            Value::String(to_hex(bytes))
        }
        HdbValue::ARRAY(values) => Value::Array(values.iter().map(hdb_value_to_json).collect()),
        #[allow(unreachable_patterns)]
        _ => serde_json::json!(format!("{value:?}")),
    }
}

/// Convert an owned `HdbValue`, reading LOB content from the database
///
/// CLOB and NCLOB values become strings, BLOB values hex strings like
/// `BINARY`. Array elements are converted the same way.
pub fn hdb_value_into_json(value: HdbValue<'static>) -> JsonFuture {
    Box::pin(async move {
        Ok(match value {
            HdbValue::ASYNC_CLOB(clob) => Value::String(clob.into_string().await?),
            HdbValue::ASYNC_NCLOB(nclob) => Value::String(nclob.into_string().await?),
            HdbValue::ASYNC_BLOB(blob) => Value::String(to_hex(&blob.into_bytes().await?)),
            HdbValue::ARRAY(values) => {
                let mut items = Vec::with_capacity(values.len());
                for item in values {
                    items.push(hdb_value_into_json(item).await?);
                }
                Value::Array(items)
            }
            other => hdb_value_to_json(&other),
        })
    })
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Text content of a catalog value, `None` for NULL.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Integer content of a catalog value, `None` for NULL or non-numeric text.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// HANA boolean flags in system views are `'TRUE'`/`'FALSE'` strings.
pub fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("TRUE"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hdb_value_to_json_null() {
        assert!(hdb_value_to_json(&HdbValue::NULL).is_null());
    }

    #[test]
    fn test_hdb_value_to_json_integers() {
        assert_eq!(hdb_value_to_json(&HdbValue::TINYINT(42)).as_u64(), Some(42));
        assert_eq!(
            hdb_value_to_json(&HdbValue::SMALLINT(1234)).as_i64(),
            Some(1234)
        );
        assert_eq!(
            hdb_value_to_json(&HdbValue::INT(123_456)).as_i64(),
            Some(123_456)
        );
        assert_eq!(
            hdb_value_to_json(&HdbValue::BIGINT(9_876_543_210)).as_i64(),
            Some(9_876_543_210)
        );
    }

    #[test]
    fn test_hdb_value_to_json_double() {
        let result = hdb_value_to_json(&HdbValue::DOUBLE(2.5));
        assert_eq!(result.as_f64(), Some(2.5));
    }

    #[test]
    fn test_hdb_value_to_json_string_and_bool() {
        assert_eq!(
            hdb_value_to_json(&HdbValue::STRING("ROADS".to_string())).as_str(),
            Some("ROADS")
        );
        assert_eq!(
            hdb_value_to_json(&HdbValue::BOOLEAN(true)).as_bool(),
            Some(true)
        );
    }

    #[test]
    fn test_hdb_value_to_json_binary_as_hex() {
        let result = hdb_value_to_json(&HdbValue::BINARY(vec![0x01, 0xab, 0xff]));
        assert_eq!(result.as_str(), Some("01abff"));
    }

    #[test]
    fn test_hdb_value_to_json_dbstring() {
        let result = hdb_value_to_json(&HdbValue::DBSTRING(b"Main St".to_vec()));
        assert_eq!(result.as_str(), Some("Main St"));

        let invalid = hdb_value_to_json(&HdbValue::DBSTRING(vec![b'A', 0xff, b'B']));
        assert_eq!(invalid.as_str(), Some("A\u{fffd}B"));
    }

    #[test]
    fn test_hdb_value_to_json_array() {
        let value = HdbValue::ARRAY(vec![
            HdbValue::INT(1),
            HdbValue::NULL,
            HdbValue::ARRAY(vec![HdbValue::STRING("x".to_string())]),
        ]);
        assert_eq!(hdb_value_to_json(&value), serde_json::json!([1, null, ["x"]]));
    }

    #[tokio::test]
    async fn test_hdb_value_into_json() {
        let value = HdbValue::ARRAY(vec![
            HdbValue::DBSTRING(b"Main St".to_vec()),
            HdbValue::BINARY(vec![0x00, 0x10]),
        ]);
        assert_eq!(
            hdb_value_into_json(value).await.unwrap(),
            serde_json::json!(["Main St", "0010"])
        );
        assert_eq!(
            hdb_value_into_json(HdbValue::BIGINT(7)).await.unwrap(),
            serde_json::json!(7)
        );
    }

    #[test]
    fn test_as_text() {
        assert_eq!(as_text(&Value::Null), None);
        assert_eq!(as_text(&serde_json::json!("GIS")), Some("GIS".to_string()));
        assert_eq!(as_text(&serde_json::json!(4326)), Some("4326".to_string()));
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(as_i64(&serde_json::json!(4326)), Some(4326));
        assert_eq!(as_i64(&serde_json::json!("3857")), Some(3857));
        assert_eq!(as_i64(&serde_json::json!("abc")), None);
        assert_eq!(as_i64(&Value::Null), None);
    }

    #[test]
    fn test_as_flag() {
        assert!(as_flag(&serde_json::json!("TRUE")));
        assert!(as_flag(&serde_json::json!("true")));
        assert!(as_flag(&serde_json::json!(true)));
        assert!(!as_flag(&serde_json::json!("FALSE")));
        assert!(!as_flag(&Value::Null));
    }
}
