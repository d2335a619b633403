use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON:API resource object as returned by Fastly.
///
/// Only `type`, `id`, `attributes` and `relationships` are named; everything
/// else the API sends is kept in `extra` so records round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// True when `relationships.tls_domains` lists `domain` exactly.
    ///
    /// Accepts both a bare array of domain names and the JSON:API form
    /// `{ "data": [{ "type": "tls_domain", "id": "..." }] }`.
    pub fn has_tls_domain(&self, domain: &str) -> bool {
        let entries = match self.relationships.get("tls_domains") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(obj)) => match obj.get("data") {
                Some(Value::Array(items)) => items,
                _ => return false,
            },
            _ => return false,
        };

        entries.iter().any(|entry| match entry {
            Value::String(name) => name == domain,
            Value::Object(obj) => obj.get("id").and_then(Value::as_str) == Some(domain),
            _ => false,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageMeta {
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Page envelope of a list endpoint; after aggregation it holds every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<Record>>,
    #[serde(default)]
    pub meta: PageMeta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    /// Appends `next`'s records onto this page element-wise.
    ///
    /// `meta` and other top-level fields of `self` are left as they are.
    pub fn absorb(&mut self, next: Page) {
        self.data.extend(next.data);

        match (&mut self.included, next.included) {
            (Some(included), Some(more)) => included.extend(more),
            (None, Some(more)) => self.included = Some(more),
            (_, None) => {}
        }
    }
}

/// Single-resource envelope returned by create/update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub data: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<Record>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub domain: String,
    pub private_key: Document,
    pub certificate: Document,
    pub action: DeployAction,
    pub replaced_key_id: Option<String>,
}
