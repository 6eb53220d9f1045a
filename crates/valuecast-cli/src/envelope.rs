use serde::Serialize;
use valuecast_core::UtcDateTime;

pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Response envelope for every machine-readable output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(meta: EnvelopeMeta, data: T) -> Self {
        Self { meta, data }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub schema_version: String,
    pub generated_at: UtcDateTime,
    pub latency_ms: u64,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_warnings_are_omitted() {
        let meta = EnvelopeMeta {
            request_id: String::from("123e4567-e89b-42d3-a456-426614174000"),
            schema_version: String::from(SCHEMA_VERSION),
            generated_at: UtcDateTime::from_unix_seconds(0).expect("epoch"),
            latency_ms: 12,
            cache_hit: false,
            warnings: Vec::new(),
        };
        let json = serde_json::to_value(Envelope::new(meta, serde_json::json!({"rows": 0}))).expect("serializes");

        assert!(json["meta"].get("warnings").is_none());
        assert_eq!(json["meta"]["generated_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["data"]["rows"], 0);
    }
}
