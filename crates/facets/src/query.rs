use std::fmt;

use url::form_urlencoded;

/// Ordered key/value pairs with `URLSearchParams` semantics, serialized as
/// `application/x-www-form-urlencoded`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a search string, with or without the leading `?`.
    pub fn parse(search: &str) -> Self {
        let search = search.strip_prefix('?').unwrap_or(search);
        Self {
            pairs: form_urlencoded::parse(search.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn append(&mut self, key: &str, value: &str) {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    /// Replaces the first `key` in place and drops any later duplicates; appends when absent.
    pub fn set(&mut self, key: &str, value: &str) {
        let Some(first) = self.pairs.iter().position(|(k, _)| k == key) else {
            self.append(key, value);
            return;
        };
        self.pairs[first].1 = value.to_string();
        let mut index = 0;
        self.pairs.retain(|(k, _)| {
            let keep = index <= first || k != key;
            index += 1;
            keep
        });
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        f.write_str(&encoded)
    }
}

/// Reads a user-entered decimal. Accepts `,` as the decimal separator.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = normalize_decimal(raw);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trims and swaps the first `,` for `.`.
pub fn normalize_decimal(raw: &str) -> String {
    raw.trim().replacen(',', ".", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_first_and_drops_duplicates() {
        let mut q = Query::parse("a=1&b=2&a=3&c=4");
        q.set("a", "9");
        assert_eq!(q.to_string(), "a=9&b=2&c=4");
        q.set("d", "x y");
        assert_eq!(q.to_string(), "a=9&b=2&c=4&d=x+y");
    }

    #[test]
    fn append_keeps_repeated_keys_in_order() {
        let mut q = Query::new();
        q.append("filter.v.option.color", "Red");
        q.append("filter.v.option.color", "Blue");
        assert_eq!(
            q.get_all("filter.v.option.color").collect::<Vec<_>>(),
            vec!["Red", "Blue"]
        );
        assert_eq!(
            q.to_string(),
            "filter.v.option.color=Red&filter.v.option.color=Blue"
        );
    }

    #[test]
    fn parse_accepts_leading_question_mark_and_decodes() {
        let q = Query::parse("?sort_by=price-ascending&q=red+shoes&x=%26");
        assert_eq!(q.get("sort_by"), Some("price-ascending"));
        assert_eq!(q.get("q"), Some("red shoes"));
        assert_eq!(q.get("x"), Some("&"));
        assert!(Query::parse("").is_empty());
    }

    #[test]
    fn decimals_accept_either_separator() {
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal(" 12,5 "), Some(12.5));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(normalize_decimal(" 7,25"), "7.25");
    }
}
