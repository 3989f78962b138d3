//! Query parameters and the sanitizer that runs before serialization.

use serde_json::Value;

/// Ordered query parameter map. Inserting an existing key replaces its value
/// in place, so the original position is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, Value)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// `None` is kept as `null` and dropped by [`clean_params`].
    pub fn with_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        self.with(key, value.map_or(Value::Null, Into::into))
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    /// Entries of `other` override ours, like an object spread.
    pub fn merge(mut self, other: Params) -> Self {
        for (k, v) in other.0 {
            self.insert(&k, v);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize to query pairs. Call [`clean_params`] first.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            let key: String = k.into();
            params.insert(&key, v);
        }
        params
    }
}

/// Drop `null` values and strings that are blank after trimming. Everything
/// else, including `0` and `false`, is kept with its position.
pub fn clean_params(params: &Params) -> Params {
    Params(
        params
            .0
            .iter()
            .filter(|(_, v)| !is_blank(v))
            .cloned()
            .collect(),
    )
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Params {
        Params::new()
            .with("a", Value::Null)
            .with("b", "")
            .with("c", " ")
            .with("d", 0)
            .with("e", false)
            .with("f", "x")
    }

    #[test]
    fn test_clean_params() {
        let cleaned = clean_params(&sample());
        let expected = Params::new().with("d", 0).with("e", false).with("f", "x");
        assert_eq!(cleaned, expected);
    }

    #[test]
    fn test_clean_params_is_a_fixed_point() {
        let once = clean_params(&sample());
        assert_eq!(clean_params(&once), once);
    }

    #[test]
    fn test_values_pass_through_verbatim() {
        let params = Params::new()
            .with("keyword", " battery ")
            .with("ratio", 0.5)
            .with_opt("productId", Some(3))
            .with_opt::<i64>("aspectId", None);
        let cleaned = clean_params(&params);

        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned.get("keyword"), Some(&json!(" battery ")));
        assert_eq!(cleaned.get("productId"), Some(&json!(3)));
        assert_eq!(cleaned.get("aspectId"), None);
    }

    #[test]
    fn test_insert_keeps_position() {
        let params = Params::new()
            .with("productId", 1)
            .with("start", "2024-01-01")
            .merge(Params::new().with("productId", 2).with("page", 1));
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["productId", "start", "page"]);
        assert_eq!(params.get("productId"), Some(&json!(2)));
    }

    #[test]
    fn test_to_query() {
        let query = clean_params(&sample()).to_query();
        assert_eq!(
            query,
            vec![
                ("d".to_string(), "0".to_string()),
                ("e".to_string(), "false".to_string()),
                ("f".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_iterator() {
        let params: Params = vec![("a", json!(1)), ("b", Value::Null), ("a", json!(2))]
            .into_iter()
            .collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some(&json!(2)));
    }
}
