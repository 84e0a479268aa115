use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service metadata the backend attaches to every stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "$id")]
    pub id: String,

    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,

    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,

    #[serde(rename = "$databaseId", default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,

    #[serde(rename = "$collectionId", default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
}

impl DocumentMeta {
    pub fn new(id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at: at,
            updated_at: at,
            permissions: Vec::new(),
            database_id: None,
            collection_id: None,
        }
    }
}

/// Response envelope of a list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList<T> {
    #[serde(default)]
    pub total: u64,
    pub documents: Vec<T>,
}

impl<T> DocumentList<T> {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_wire_names() {
        let raw = serde_json::json!({
            "$id": "68ad824c00373298e7ee",
            "$createdAt": "2025-08-26T09:12:44.123+00:00",
            "$updatedAt": "2025-08-26T09:15:00.000+00:00",
            "$permissions": ["read(\"any\")"],
            "$databaseId": "chat",
            "$collectionId": "chatrooms"
        });
        let meta: DocumentMeta = serde_json::from_value(raw).unwrap();
        assert_eq!(meta.id, "68ad824c00373298e7ee");
        assert_eq!(meta.permissions.len(), 1);
        assert_eq!(meta.collection_id.as_deref(), Some("chatrooms"));
        assert!(meta.updated_at > meta.created_at);
    }
}
