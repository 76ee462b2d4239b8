//! Path parameter bindings.

/// Ordered `(name, value)` pairs captured from a matched path.
///
/// Values are raw path segments: no percent-decoding is applied. A wildcard
/// binding holds the rest of the path, slashes included. Built fresh for
/// every lookup and owned by that request alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.pairs.len() }
    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }
}

impl<'k, 'v> FromIterator<(&'k str, &'v str)> for Params {
    fn from_iter<I: IntoIterator<Item = (&'k str, &'v str)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_pattern_order() {
        let params: Params = [("org", "rust"), ("repo", "tsu")].into_iter().collect();
        let names: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["org", "repo"]);
        assert_eq!(params.get("repo"), Some("tsu"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 2);
    }
}
