//! Element Attributes
//!
//! Insertion-ordered attribute bag: get, set, remove, has.

use indexmap::IndexMap;

/// Attribute collection of an element
///
/// Names wrapped in brackets (`[title]`) are bound attributes whose value is
/// an expression source rather than a literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBag {
    entries: IndexMap<String, String>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Set attribute, returning the previous value.
    ///
    /// Replacing an existing value keeps its original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), value.into())
    }

    /// Remove attribute, keeping the order of the remaining ones
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    /// Check if attribute exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attribute names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Inner name of a bound attribute (`[title]` -> `title`)
    pub fn bound_name(name: &str) -> Option<&str> {
        name.strip_prefix('[')?.strip_suffix(']').filter(|n| !n.is_empty())
    }

    /// Check whether `name` denotes a bound attribute
    pub fn is_bound(name: &str) -> bool {
        Self::bound_name(name).is_some()
    }

    /// Keep only attributes matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|k, v| keep(k, v));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_attribute() {
        let mut attrs = AttributeBag::new();
        attrs.set("class", "btn");
        attrs.set("id", "submit");

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("class"), Some("btn"));
        assert_eq!(attrs.get("id"), Some("submit"));
    }

    #[test]
    fn test_insertion_order_survives_update_and_remove() {
        let mut attrs = AttributeBag::new();
        attrs.set("a", "1");
        attrs.set("b", "2");
        attrs.set("c", "3");

        assert_eq!(attrs.set("a", "10"), Some("1".to_string()));
        attrs.remove("b");

        assert_eq!(attrs.names(), vec!["a", "c"]);
        assert_eq!(attrs.get("a"), Some("10"));
    }

    #[test]
    fn test_bound_names() {
        assert_eq!(AttributeBag::bound_name("[title]"), Some("title"));
        assert!(AttributeBag::is_bound("[disabled]"));
        assert!(!AttributeBag::is_bound("title"));
        assert!(!AttributeBag::is_bound("[]"));
        assert!(!AttributeBag::is_bound("[open"));
    }
}
