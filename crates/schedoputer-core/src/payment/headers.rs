//! Case-insensitive request header view.

/// Request headers as the transport handed them over.
///
/// Names are compared ASCII case-insensitively. If a name repeats, the first
/// occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let headers = RequestHeaders::new().with("X-Payment", "proof");
        assert_eq!(headers.get("x-payment"), Some("proof"));
        assert_eq!(headers.get("X-PAYMENT"), Some("proof"));
        assert_eq!(headers.get("authorization"), None);
    }

    #[test]
    fn first_occurrence_wins() {
        let headers: RequestHeaders = [("x-payment", "a"), ("X-Payment", "b")].into_iter().collect();
        assert_eq!(headers.get("x-payment"), Some("a"));
    }
}
