use serde::{Deserialize, Deserializer, Serialize};

/// The operations defined by RFC 6902.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

/// A JSON patch operation, see https://tools.ietf.org/html/rfc6902
///
/// Operations are built through the per-op constructors, which only accept
/// the fields that make sense for each op. Deserialization enforces the same
/// shapes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "WirePatchOperation")]
pub struct PatchOperation {
    op: PatchOp,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::with_value(PatchOp::Add, path, value)
    }

    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::with_value(PatchOp::Replace, path, value)
    }

    pub fn test(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::with_value(PatchOp::Test, path, value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        PatchOperation {
            op: PatchOp::Remove,
            path: path.into(),
            from: None,
            value: None,
        }
    }

    pub fn move_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_from(PatchOp::Move, from, path)
    }

    pub fn copy_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_from(PatchOp::Copy, from, path)
    }

    fn with_value(op: PatchOp, path: impl Into<String>, value: serde_json::Value) -> Self {
        PatchOperation {
            op,
            path: path.into(),
            from: None,
            value: Some(value),
        }
    }

    fn with_from(op: PatchOp, from: impl Into<String>, path: impl Into<String>) -> Self {
        PatchOperation {
            op,
            path: path.into(),
            from: Some(from.into()),
            value: None,
        }
    }

    pub fn op(&self) -> PatchOp {
        self.op
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        self.value.as_ref()
    }
}

#[derive(Deserialize)]
struct WirePatchOperation {
    op: PatchOp,
    path: String,
    #[serde(default)]
    from: Option<String>,
    // `"value": null` is a value, only a missing field is `None`
    #[serde(default, deserialize_with = "present_value")]
    value: Option<serde_json::Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl TryFrom<WirePatchOperation> for PatchOperation {
    type Error = String;

    fn try_from(wire: WirePatchOperation) -> Result<Self, Self::Error> {
        let WirePatchOperation {
            op,
            path,
            from,
            value,
        } = wire;

        match (op, from, value) {
            (PatchOp::Add | PatchOp::Replace | PatchOp::Test, None, Some(value)) => {
                Ok(Self::with_value(op, path, value))
            }
            (PatchOp::Move | PatchOp::Copy, Some(from), None) => Ok(Self::with_from(op, from, path)),
            (PatchOp::Remove, None, None) => Ok(Self::remove(path)),
            (op, from, value) => Err(format!(
                "invalid {op:?} operation on {path:?}: from {}, value {}",
                if from.is_some() { "present" } else { "missing" },
                if value.is_some() { "present" } else { "missing" },
            )),
        }
    }
}
