// ── Core identity type ──
//
// Rows are identified by whatever the remote collection assigns: a UUID,
// an integer serial, or an opaque string. `EntityId` hides the difference.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any stored entity.
///
/// Serializes back to the same JSON shape it was read from, so it can be
/// used directly as a filter value against the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Uuid(Uuid),
    Serial(i64),
    Text(String),
}

impl EntityId {
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_serial(&self) -> Option<i64> {
        match self {
            Self::Serial(n) => Some(*n),
            _ => None,
        }
    }

    /// JSON value to match against the `id` column.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Uuid(u) => Value::String(u.to_string()),
            Self::Serial(n) => Value::from(*n),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Serial(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Serial(n)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        if let Ok(u) = Uuid::parse_str(&s) {
            return Self::Uuid(u);
        }
        match s.parse::<i64>() {
            Ok(n) => Self::Serial(n),
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_from_uuid_string() {
        let id = EntityId::from("550e8400-e29b-41d4-a716-446655440000");
        assert!(id.as_uuid().is_some());
    }

    #[test]
    fn entity_id_from_numeric_string() {
        let id: EntityId = "42".parse().unwrap();
        assert_eq!(id.as_serial(), Some(42));
        assert_eq!(id.to_value(), json!(42));
    }

    #[test]
    fn entity_id_from_opaque_string() {
        let id = EntityId::from("news-2024-01");
        assert_eq!(id, EntityId::Text("news-2024-01".into()));
        assert_eq!(id.to_value(), json!("news-2024-01"));
    }

    #[test]
    fn entity_id_deserializes_json_shapes() {
        let serial: EntityId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(serial, EntityId::Serial(7));

        let uuid: EntityId =
            serde_json::from_value(json!("550e8400-e29b-41d4-a716-446655440000")).unwrap();
        assert!(uuid.as_uuid().is_some());

        let text: EntityId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(text, EntityId::Text("abc".into()));
    }

    #[test]
    fn entity_id_display() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            EntityId::Uuid(uuid).to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(EntityId::Serial(9).to_string(), "9");
    }
}
