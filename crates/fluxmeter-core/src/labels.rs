//! Label sets: the identity of one metric instance under a metric name.
//!
//! Pairs are kept sorted by key with unique keys, so two sets built from the
//! same pairs in any order are structurally equal, hash identically, and
//! render the same canonical key and tag order.

use std::fmt;

/// Value used to pad an odd-length flat label list.
pub const PAD_VALUE: &str = "unknown";

/// Canonical, immutable key/value label collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    /// The empty label set.
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Build from key/value pairs in any order. A repeated key keeps the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (k, v) in pairs {
            set.insert(k.into(), v.into());
        }
        set
    }

    /// Build from a flat `[k1, v1, k2, v2, ...]` list.
    /// A trailing key without a value is paired with [`PAD_VALUE`].
    pub fn from_flat(label_values: &[&str]) -> Self {
        Self::new().with_flat(label_values)
    }

    /// Return a new set extended by `pairs`; existing keys are overridden.
    pub fn with_pairs<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut set = self.clone();
        for (k, v) in pairs {
            set.insert(k.into(), v.into());
        }
        set
    }

    /// Return a new set extended by a flat `[k1, v1, ...]` list (see [`LabelSet::from_flat`]).
    pub fn with_flat(&self, label_values: &[&str]) -> Self {
        let mut set = self.clone();
        for chunk in label_values.chunks(2) {
            let (k, v) = match chunk {
                [k, v] => (*k, *v),
                [k] => (*k, PAD_VALUE),
                _ => continue,
            };
            set.insert(k.to_string(), v.to_string());
        }
        set
    }

    fn insert(&mut self, key: String, value: String) {
        match self.pairs.binary_search_by(|(k, _)| k.as_str().cmp(key.as_str())) {
            Ok(i) => self.pairs[i].1 = value,
            Err(i) => self.pairs.insert(i, (key, value)),
        }
    }

    /// Look up the value bound to `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|i| self.pairs[i].1.as_str())
    }

    /// Iterate pairs in canonical (key-sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Canonical string key, `k1=v1,k2=v2`. `\`, `,` and `=` are backslash-escaped
    /// so distinct sets never collide.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_escaped(&mut out, k);
            out.push('=');
            push_escaped(&mut out, v);
        }
        out
    }
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        if matches!(c, '\\' | ',' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_independent_equality() {
        let a = LabelSet::from_pairs([("a", "b"), ("c", "d")]);
        let b = LabelSet::from_pairs([("c", "d"), ("a", "b")]);
        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), "a=b,c=d");
        assert_eq!(a.canonical_key(), b.canonical_key());
        let order: Vec<_> = b.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["a", "c"]);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let a = LabelSet::from_pairs([("z", "1"), ("m", "2")]);
        let again = LabelSet::from_pairs(a.iter());
        assert_eq!(a, again);
        assert_eq!(a.canonical_key(), again.canonical_key());
    }

    #[test]
    fn odd_flat_list_is_padded() {
        let s = LabelSet::from_flat(&["k1", "v1", "k2"]);
        assert_eq!(s.get("k1"), Some("v1"));
        assert_eq!(s.get("k2"), Some(PAD_VALUE));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn later_key_wins() {
        let s = LabelSet::from_flat(&["k", "old"]).with_flat(&["k", "new"]);
        assert_eq!(s.get("k"), Some("new"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn with_does_not_mutate_parent() {
        let base = LabelSet::from_pairs([("a", "1")]);
        let derived = base.with_pairs([("b", "2")]);
        assert_eq!(base.len(), 1);
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn escaped_key_does_not_collide() {
        let a = LabelSet::from_pairs([("a", "b,c=d")]);
        let b = LabelSet::from_pairs([("a", "b"), ("c", "d")]);
        assert_ne!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn empty_set() {
        let s = LabelSet::new();
        assert!(s.is_empty());
        assert_eq!(s.canonical_key(), "");
        assert_eq!(s, LabelSet::from_flat(&[]));
    }
}
