//! Fresh identifier values in the shapes the document stores expect.

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// 64 lowercase hex characters built from two random 128-bit values.
pub fn new_hex_id() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// Version-4 UUID in canonical hyphenated form.
pub fn new_uuid() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Hex SHA-256 digest of a fresh random 128-bit value.
pub fn new_hash_id() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Which generator a field is refreshed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    Hex,
    Uuid,
    Hash,
}

impl IdKind {
    pub fn generate(self) -> String {
        match self {
            IdKind::Hex => new_hex_id(),
            IdKind::Uuid => new_uuid(),
            IdKind::Hash => new_hash_id(),
        }
    }
}

/// Static field-name to generator table used by `regenerate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    fields: Vec<(String, IdKind)>,
}

impl FieldPlan {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, IdKind)>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Telemetry identifiers written by VS Code-family editors.
    pub fn telemetry() -> Self {
        Self::new([
            ("telemetry.machineId", IdKind::Hex),
            ("telemetry.devDeviceId", IdKind::Uuid),
            ("telemetry.macMachineId", IdKind::Hash),
            ("machineId", IdKind::Hex),
            ("devDeviceId", IdKind::Uuid),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, IdKind)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn kind_for(&self, field: &str) -> Option<IdKind> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldPlan {
    fn default() -> Self {
        Self::telemetry()
    }
}
