use serde_json::{json, Value};

/// Hard cap applied to every list call.
pub const LIST_LIMIT: u32 = 100;

/// A single list filter, ordering or limit, encoded the way the backend expects.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Vec<Value>),
    OrderAsc(String),
    OrderDesc(String),
    Limit(u32),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal(attribute.into(), vec![value.into()])
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Query::OrderAsc(attribute.into())
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::OrderDesc(attribute.into())
    }

    pub fn limit(n: u32) -> Self {
        Query::Limit(n)
    }

    /// JSON string passed as one `queries[]` parameter.
    pub fn encode(&self) -> String {
        let value = match self {
            Query::Equal(attribute, values) => {
                json!({ "method": "equal", "attribute": attribute, "values": values })
            }
            Query::OrderAsc(attribute) => json!({ "method": "orderAsc", "attribute": attribute }),
            Query::OrderDesc(attribute) => {
                json!({ "method": "orderDesc", "attribute": attribute })
            }
            Query::Limit(n) => json!({ "method": "limit", "values": [n] }),
        };
        value.to_string()
    }

    /// Evaluates equality filters against a raw document.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Query::Equal(attribute, values) => document
                .get(attribute)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            _ => true,
        }
    }
}

/// Applies filters, ordering and limit in the same order the backend does.
pub fn apply_queries(mut documents: Vec<Value>, queries: &[Query]) -> Vec<Value> {
    documents.retain(|doc| queries.iter().all(|q| q.matches(doc)));

    for query in queries {
        match query {
            Query::OrderAsc(attribute) => {
                documents.sort_by(|a, b| compare_field(a, b, attribute));
            }
            Query::OrderDesc(attribute) => {
                documents.sort_by(|a, b| compare_field(b, a, attribute));
            }
            _ => {}
        }
    }

    let limit = queries
        .iter()
        .find_map(|q| match q {
            Query::Limit(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(25)
        .min(LIST_LIMIT) as usize;
    documents.truncate(limit);
    documents
}

fn compare_field(a: &Value, b: &Value, attribute: &str) -> std::cmp::Ordering {
    let left = a.get(attribute);
    let right = b.get(attribute);
    match (left, right) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&y.as_f64().unwrap_or_default()),
        (Some(x), Some(y)) => x.as_str().unwrap_or("").cmp(y.as_str().unwrap_or("")),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(
            Query::equal("chatRoomId", "r1").encode(),
            r#"{"attribute":"chatRoomId","method":"equal","values":["r1"]}"#
        );
        assert_eq!(
            Query::order_desc("$createdAt").encode(),
            r#"{"attribute":"$createdAt","method":"orderDesc"}"#
        );
        assert_eq!(Query::limit(100).encode(), r#"{"method":"limit","values":[100]}"#);
    }

    #[test]
    fn test_apply_queries() {
        let docs = vec![
            json!({"chatRoomId": "r1", "$createdAt": "2025-01-01T00:00:01Z"}),
            json!({"chatRoomId": "r2", "$createdAt": "2025-01-01T00:00:02Z"}),
            json!({"chatRoomId": "r1", "$createdAt": "2025-01-01T00:00:03Z"}),
        ];
        let out = apply_queries(
            docs,
            &[
                Query::equal("chatRoomId", "r1"),
                Query::order_desc("$createdAt"),
                Query::limit(100),
            ],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["$createdAt"], "2025-01-01T00:00:03Z");
    }

    #[test]
    fn test_limit_is_capped() {
        let docs: Vec<Value> = (0..150).map(|i| json!({ "n": i })).collect();
        assert_eq!(apply_queries(docs.clone(), &[Query::limit(500)]).len(), 100);
        assert_eq!(apply_queries(docs, &[]).len(), 25);
    }
}
