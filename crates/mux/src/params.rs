//! Path parameters bound from a matched route.

use crate::trie::segment::{parse, split_path};

/// Request scoped key/value store of path parameters.
///
/// For the pattern `/users/:id|^[0-9]+$` and the path `/users/42`, `id` is bound to `42`.
/// Unknown keys are not an error: [`get`](Self::get) returns `None` and
/// [`param`](Self::param) an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { inner: vec![] }
    }

    /// Binds the dynamic segments of `pattern` to the segments of `path` at the same position.
    ///
    /// A trailing catch-all segment takes the rest of the path. If the path does not
    /// have the shape of the pattern, or is the root path, nothing is bound.
    pub fn bind(pattern: &str, path: &str) -> Self {
        let mut params = Self::empty();
        if pattern == "/" || path == "/" {
            return params;
        }

        let pattern_segments = split_path(pattern);
        let path_segments = split_path(path);

        let ends_with_catch_all = pattern_segments.last().is_some_and(|segment| parse(segment).is_catch_all());
        if pattern_segments.len() != path_segments.len() && !ends_with_catch_all {
            return params;
        }

        for (index, raw) in pattern_segments.iter().enumerate() {
            let segment = parse(raw);
            let Some(name) = segment.param_name() else {
                continue;
            };

            if segment.is_catch_all() {
                if let Some(rest) = path_segments.get(index..) {
                    params.insert(name, rest.join("/"));
                }
                break;
            }

            if let Some(value) = path_segments.get(index) {
                params.insert(name, *value);
            }
        }
        params
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.inner.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    /// Gets the value of a path parameter, or an empty string if it doesn't exist
    #[inline]
    pub fn param(&self, key: impl AsRef<str>) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Sets a parameter, replacing the value of an existing one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.inner.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => *existing = value,
            None => self.inner.push((key, value)),
        }
    }

    /// Iterates the parameters in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
