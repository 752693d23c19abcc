//! Case-insensitive name maps.
//!
//! Route parameter names compare with an ordinal ASCII case fold: `ID`, `Id`
//! and `id` are the same key, and no locale rules are involved. Keys keep the
//! casing of their first insertion.

use std::fmt;

/// An insertion-ordered map keyed by ASCII case-insensitive names.
///
/// Backed by a `Vec`; route patterns and extracted values hold a handful of
/// entries, so a linear scan beats hashing a folded copy of every key.
#[derive(Clone)]
pub struct CaseInsensitiveMap<V> {
    entries: Vec<(String, V)>,
}

/// Route values: parameter name to value.
pub type RouteValues = CaseInsensitiveMap<String>;

impl<V> CaseInsensitiveMap<V> {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Look up a value by name.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Look up a value by name for mutation.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.position(key).map(|i| &mut self.entries[i].1)
    }

    /// Returns true if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert a value, returning the previous one stored under the same name.
    ///
    /// Replacing keeps the original key spelling and position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for CaseInsensitiveMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// Equality ignores key casing and insertion order.
impl<V: PartialEq> PartialEq for CaseInsensitiveMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl<V: Eq> Eq for CaseInsensitiveMap<V> {}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for CaseInsensitiveMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<V> IntoIterator for CaseInsensitiveMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_ascii_case() {
        let mut values = RouteValues::new();
        values.insert("Controller", "Home".to_string());

        assert_eq!(values.get("controller").map(String::as_str), Some("Home"));
        assert_eq!(values.get("CONTROLLER").map(String::as_str), Some("Home"));
        assert!(values.get("action").is_none());
    }

    #[test]
    fn test_insert_replaces_and_keeps_first_spelling() {
        let mut values = RouteValues::new();
        values.insert("id", "1".to_string());
        let previous = values.insert("ID", "2".to_string());

        assert_eq!(previous.as_deref(), Some("1"));
        assert_eq!(values.len(), 1);
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(values.get("id").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_equality_ignores_order_and_case() {
        let a: RouteValues = [("a", "1".to_string()), ("B", "2".to_string())]
            .into_iter()
            .collect();
        let b: RouteValues = [("b", "2".to_string()), ("A", "1".to_string())]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove() {
        let mut values: RouteValues = [("id", "7".to_string())].into_iter().collect();
        assert_eq!(values.remove("Id").as_deref(), Some("7"));
        assert!(values.is_empty());
    }
}
