use std::fmt::{Display, Formatter};

use serde::Serialize;
use uuid::Uuid;
use valuecast_core::UtcDateTime;

use crate::envelope::EnvelopeMeta;

/// Request identifier (UUID v4) for end-to-end request tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Per-command metadata, converted to [`EnvelopeMeta`] at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub request_id: RequestId,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(latency_ms: u64, cache_hit: bool) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            latency_ms,
            cache_hit,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn into_envelope_meta(self, schema_version: &str) -> EnvelopeMeta {
        EnvelopeMeta {
            request_id: self.request_id.to_string(),
            schema_version: schema_version.to_owned(),
            generated_at: UtcDateTime::now(),
            latency_ms: self.latency_ms,
            cache_hit: self.cache_hit,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
        assert_eq!(request_id.to_string().len(), 36);
    }

    #[test]
    fn warnings_carry_into_envelope_meta() {
        let mut metadata = Metadata::new(42, true);
        metadata.push_warning("missing statements: CF");
        let meta = metadata.into_envelope_meta("v1.0.0");

        assert_eq!(meta.latency_ms, 42);
        assert!(meta.cache_hit);
        assert_eq!(meta.warnings, vec!["missing statements: CF"]);
    }
}
