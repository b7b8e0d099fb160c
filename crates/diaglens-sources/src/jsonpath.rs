use serde_json::Value;
use std::collections::BTreeMap;

/// Scalar leaf produced by flattening. Nested objects and arrays become
/// intermediate key segments, never collection values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Bool(_) | Scalar::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            Scalar::Bool(_) | Scalar::Number(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Number(_) | Scalar::Text(_) => None,
        }
    }
}

/// Flattened view of one entity's subtree: dotted path → scalar, plus the
/// maximum object-nesting depth seen while flattening (so depth-sensitive
/// checks need no second traversal).
#[derive(Debug, Clone, Default)]
pub struct EntityPaths {
    pub values: BTreeMap<String, Scalar>,
    pub max_depth: usize,
}

impl EntityPaths {
    pub fn get(&self, path: &str) -> Option<&Scalar> {
        self.values.get(path)
    }

    pub fn number(&self, path: &str) -> Option<f64> {
        self.values.get(path).and_then(Scalar::as_f64)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.values.get(path).and_then(Scalar::as_str)
    }

    /// All `(suffix, scalar)` pairs whose path starts with `prefix`.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Scalar)> + 'a {
        self.values
            .iter()
            .filter_map(move |(path, value)| path.strip_prefix(prefix).map(|rest| (rest, value)))
    }
}

/// Entity family to extract from a JSON API dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Node,
    Index,
}

impl TargetKind {
    /// Known top-level key holding this entity family.
    fn top_level_key(&self) -> &'static str {
        match self {
            TargetKind::Node => "nodes",
            TargetKind::Index => "indices",
        }
    }
}

/// Flattens nested JSON dumps into per-entity dotted-path maps.
pub struct JsonPathExtractor;

impl JsonPathExtractor {
    /// Per-entity flattened paths for `target`.
    ///
    /// An unknown or absent top-level key is not an error: the result is
    /// an empty map, which downstream code treats as "no data from this
    /// source", distinct from explicit zero values.
    pub fn extract(doc: &Value, target: TargetKind) -> BTreeMap<String, EntityPaths> {
        let mut entities = BTreeMap::new();

        let Some(Value::Object(members)) = doc.get(target.top_level_key()) else {
            return entities;
        };

        for (entity_id, subtree) in members {
            let mut paths = EntityPaths::default();
            flatten(subtree, String::new(), 1, &mut paths);
            entities.insert(entity_id.clone(), paths);
        }

        entities
    }
}

fn flatten(value: &Value, prefix: String, depth: usize, out: &mut EntityPaths) {
    if depth > out.max_depth {
        out.max_depth = depth;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(child, path, depth + 1, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = if prefix.is_empty() {
                    i.to_string()
                } else {
                    format!("{}.{}", prefix, i)
                };
                flatten(child, path, depth + 1, out);
            }
        }
        Value::String(s) => {
            out.values.insert(prefix, Scalar::Text(s.clone()));
        }
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                out.values.insert(prefix, Scalar::Number(f));
            }
        }
        Value::Bool(b) => {
            out.values.insert(prefix, Scalar::Bool(*b));
        }
        Value::Null => {}
    }
}
