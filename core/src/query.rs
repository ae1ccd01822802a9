//! Ordered, multi-valued query parameters.
//!
//! Keys keep their first-insertion order. `set` replaces every value of a
//! key, `merge` replaces keys wholesale, so the request-level layer always
//! wins over client defaults.

use url::form_urlencoded;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string (without
    /// the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.add(key.into_owned(), value.into_owned());
        }
        params
    }

    pub fn from_url(url: &Url) -> Self {
        url.query().map(Self::parse).unwrap_or_default()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.position(key)
            .map(|i| self.entries[i].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Replace all values of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Append `value` to the values of `key`. Only parsing appends; callers
    /// outside the crate replace with `set`.
    pub(crate) fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Overlay `other`: each of its keys replaces the same key here.
    pub fn merge(&mut self, other: &QueryParams) {
        for (key, values) in &other.entries {
            match self.position(key) {
                Some(i) => self.entries[i].1 = values.clone(),
                None => self.entries.push((key.clone(), values.clone())),
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Replace the query string of `url` with these parameters.
    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.encode()));
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_order_and_repeats() {
        let q = QueryParams::parse("a=1&b=2&a=3");
        assert_eq!(q.get("a"), Some("1"));
        assert_eq!(q.get_all("a"), ["1".to_string(), "3".to_string()]);
        assert_eq!(q.encode(), "a=1&a=3&b=2");
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn set_replaces_instead_of_appending() {
        let mut q = QueryParams::parse("b=1");
        q.set("b", "2");
        q.set("b", "4");
        assert_eq!(q.get_all("b"), ["4".to_string()]);
    }

    #[test]
    fn set_replaces_every_parsed_repeat() {
        let mut q = QueryParams::parse("tag=a&tag=b&page=1");
        q.set("tag", "c");
        assert_eq!(q.get_all("tag"), ["c".to_string()]);
        assert_eq!(q.encode(), "tag=c&page=1");
    }

    #[test]
    fn merge_overrides_and_preserves() {
        let mut base = QueryParams::parse("a=1&b=1&c=1");
        let overlay = QueryParams::parse("b=4&d=2");
        base.merge(&overlay);
        assert_eq!(base.encode(), "a=1&b=4&c=1&d=2");
    }

    #[test]
    fn remove_drops_key() {
        let mut q = QueryParams::parse("a=1&b=2");
        assert_eq!(q.remove("a"), Some(vec!["1".to_string()]));
        assert!(!q.contains("a"));
        assert_eq!(q.remove("a"), None);
    }

    #[test]
    fn encodes_reserved_characters() {
        let mut q = QueryParams::new();
        q.set("q", "a b&c");
        assert_eq!(q.encode(), "q=a+b%26c");
        assert_eq!(QueryParams::parse(&q.encode()).get("q"), Some("a b&c"));
    }

    #[test]
    fn apply_to_clears_empty_query() {
        let mut url = Url::parse("http://example.com/x?old=1").unwrap();
        QueryParams::new().apply_to(&mut url);
        assert_eq!(url.as_str(), "http://example.com/x");

        let mut q = QueryParams::new();
        q.set("new", "2");
        q.apply_to(&mut url);
        assert_eq!(url.as_str(), "http://example.com/x?new=2");
    }
}
