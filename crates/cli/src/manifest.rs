use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Compute SHA-256 etag from compact JSON representation.
pub fn compute_etag(result: &Value) -> String {
    let canonical = serde_json::to_string(result)
        .unwrap_or_else(|e| format!("serialization error computing etag: {}", e));
    let hash = Sha256::digest(canonical.as_bytes());
    format!("{:x}", hash)
}

/// Wrap a calculation result with its etag and the time it was produced.
///
/// `serde_json::Map` keeps keys sorted, so the envelope layout is stable.
pub fn build_envelope(result: Value) -> Value {
    let etag = compute_etag(&result);
    let calculated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    let mut map = Map::new();
    map.insert("calculated_at".to_string(), Value::String(calculated_at));
    map.insert("etag".to_string(), Value::String(etag));
    map.insert("result".to_string(), result);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn etag_is_stable_and_content_addressed() {
        let a = json!({"success": true, "shares": []});
        let b = json!({"shares": [], "success": true});
        assert_eq!(compute_etag(&a), compute_etag(&b));
        assert_eq!(compute_etag(&a).len(), 64);
        assert_ne!(compute_etag(&a), compute_etag(&json!({"success": false})));
    }

    #[test]
    fn envelope_carries_result_etag_and_timestamp() {
        let result = json!({"success": true});
        let envelope = build_envelope(result.clone());
        assert_eq!(envelope["result"], result);
        assert_eq!(envelope["etag"], json!(compute_etag(&result)));
        let stamp = envelope["calculated_at"].as_str().unwrap();
        assert!(OffsetDateTime::parse(stamp, &Rfc3339).is_ok());
    }
}
