//! Method-first prefix tree of route patterns.
//!
//! The first level under the root is keyed by the upper-cased HTTP method, path
//! segments follow beneath it. Each distinct regex constraint is compiled once
//! and cached on the [`Trie`] it was registered with.
//!
//! Matching is deterministic and backtracking: at every depth the literal child
//! is tried first, then regex constrained children ordered by regex source, then
//! the bare wildcard, then the static file catch-all. A branch that fails deeper
//! down falls back to the next candidate.

mod node;
pub mod segment;

pub use node::Node;

use crate::error::RouteError;
use crate::params::PathParams;
use regex::Regex;
use segment::{DynamicKey, Segment, parse, route_segments, split_path};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// The routing trie, generic over the value stored on each leaf.
#[derive(Debug)]
pub struct Trie<T> {
    root: Node<T>,
    regexes: HashMap<String, Regex>,
    size: usize,
}

/// A successful match: the leaf node and the parameters bound from the request path.
#[derive(Debug)]
pub struct Matched<'t, T> {
    node: &'t Node<T>,
    params: PathParams,
}

/// Two routes of one method that can both match some request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub method: String,
    pub first: String,
    pub second: String,
    pub kind: OverlapKind,
}

/// How sure an [`Overlap`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapKind {
    /// Some request path is known to match both routes.
    Definite,
    /// The routes differ by two regex constraints at the same depth. Whether a
    /// segment satisfies both is not decided.
    Possible,
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Trie<T> {
    pub fn new() -> Self {
        Self { root: Node::new(""), regexes: HashMap::new(), size: 0 }
    }

    /// Number of routes registered
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Inserts `value` as the leaf of `method` + `pattern`.
    ///
    /// The pattern must already be normalized. The whole pattern is validated
    /// before the tree is touched, so a failed insert leaves the trie unchanged.
    /// Registering a second route on an existing leaf fails with
    /// [`RouteError::Conflict`] and keeps the first one.
    ///
    /// # Errors
    /// Returns an error for an empty parameter name, an invalid regex, a catch-all
    /// segment that is not the last one, or a conflict.
    pub fn insert(&mut self, method: &str, pattern: &str, value: T) -> Result<&mut Node<T>, RouteError> {
        let segments = route_segments(method, pattern);
        self.compile(pattern, &segments[1..])?;

        let mut node = &mut self.root;
        for (index, raw) in segments.iter().copied().enumerate() {
            let segment = if index == 0 { Segment::Literal(raw) } else { parse(raw) };
            node = node.child_or_insert(segment, raw);
        }

        if node.is_leaf() {
            return Err(RouteError::conflict(method, pattern));
        }

        node.set_leaf(pattern, value);
        self.size += 1;
        Ok(node)
    }

    /// Validates the path segments of a pattern and caches its regex constraints.
    fn compile(&mut self, pattern: &str, segments: &[&str]) -> Result<(), RouteError> {
        let last = segments.len().saturating_sub(1);
        for (index, raw) in segments.iter().copied().enumerate() {
            let segment = parse(raw);
            let Some(name) = segment.param_name() else {
                continue;
            };

            if name.is_empty() {
                return Err(RouteError::empty_param_name(raw));
            }

            if segment.is_catch_all() && index != last {
                return Err(RouteError::catch_all_not_last(pattern));
            }

            if let Some(source) = segment.regex() {
                if !self.regexes.contains_key(source) {
                    let regex = Regex::new(source).map_err(|e| RouteError::invalid_regex(raw, e))?;
                    self.regexes.insert(source.to_owned(), regex);
                }
            }
        }
        Ok(())
    }

    /// Looks up the leaf `method` + `pattern` resolves to, without matching.
    ///
    /// Patterns differing only by a bare parameter's name resolve to the same leaf.
    pub fn leaf_mut(&mut self, method: &str, pattern: &str) -> Option<&mut Node<T>> {
        let mut node = &mut self.root;
        for (index, raw) in route_segments(method, pattern).into_iter().enumerate() {
            let segment = if index == 0 { Segment::Literal(raw) } else { parse(raw) };
            node = node.child_mut(segment)?;
        }
        node.is_leaf().then_some(node)
    }

    /// Matches a request method and path, binding the parameters of the matched route.
    pub fn at(&self, method: &str, path: &str) -> Option<Matched<'_, T>> {
        let segments = route_segments(method, path);
        let node = self.find(&self.root, &segments)?;
        let params = node.pattern().map(|pattern| PathParams::bind(pattern, path)).unwrap_or_default();
        Some(Matched { node, params })
    }

    fn find<'t>(&'t self, node: &'t Node<T>, segments: &[&str]) -> Option<&'t Node<T>> {
        let Some((segment, rest)) = segments.split_first() else {
            return node.is_leaf().then_some(node);
        };

        if let Some(found) = node.static_child(segment).and_then(|child| self.find(child, rest)) {
            return Some(found);
        }

        for (key, child) in node.dynamics() {
            let found = match key {
                DynamicKey::Regex(source) => {
                    if !self.regexes.get(source).is_some_and(|regex| regex.is_match(segment)) {
                        continue;
                    }
                    self.find(child, rest)
                }
                DynamicKey::Wildcard => self.find(child, rest),
                DynamicKey::CatchAll => child.is_leaf().then_some(child),
            };

            if found.is_some() {
                return found;
            }
        }

        None
    }

    /// The methods, other than `method`, having a route that matches `path`.
    pub fn allowed_methods(&self, method: &str, path: &str) -> Vec<&str> {
        let mut methods = self
            .root
            .statics()
            .keys()
            .map(String::as_str)
            .filter(|candidate| *candidate != method)
            .filter(|candidate| self.at(candidate, path).is_some())
            .collect::<Vec<_>>();
        methods.sort_unstable();
        methods
    }

    /// All registered `(method, pattern)` pairs, sorted.
    pub fn routes(&self) -> Vec<(&str, &str)> {
        let mut routes = vec![];
        for (method, node) in self.root.statics() {
            collect_patterns(node, &mut |pattern| routes.push((method.as_str(), pattern)));
        }
        routes.sort_unstable();
        routes
    }

    /// Reports pairs of routes of the same method that some request path could match both.
    ///
    /// Which one serves such a request is decided by matching precedence. A literal
    /// segment is checked against regex constraints and bare parameters overlap with
    /// anything. Two different regex constraints at the same depth are not compared:
    /// such pairs are reported as [`OverlapKind::Possible`].
    pub fn overlaps(&self) -> Vec<Overlap> {
        let mut overlaps = vec![];
        for (method, pattern_a, pattern_b) in self.same_method_pairs() {
            if let Some(kind) = self.may_overlap(&split_path(pattern_a), &split_path(pattern_b)) {
                overlaps.push(Overlap {
                    method: method.to_owned(),
                    first: pattern_a.to_owned(),
                    second: pattern_b.to_owned(),
                    kind,
                });
            }
        }
        overlaps
    }

    fn same_method_pairs(&self) -> Vec<(&str, &str, &str)> {
        let routes = self.routes();
        let mut pairs = vec![];
        for (i, (method, pattern_a)) in routes.iter().enumerate() {
            for (other_method, pattern_b) in &routes[i + 1..] {
                if method == other_method {
                    pairs.push((*method, *pattern_a, *pattern_b));
                }
            }
        }
        pairs
    }

    fn may_overlap(&self, a: &[&str], b: &[&str]) -> Option<OverlapKind> {
        let mut kind = OverlapKind::Definite;
        for (raw_a, raw_b) in a.iter().zip(b) {
            let (segment_a, segment_b) = (parse(raw_a), parse(raw_b));
            if segment_a.is_catch_all() || segment_b.is_catch_all() {
                return Some(kind);
            }
            if self.segments_overlap(segment_a, segment_b)? == OverlapKind::Possible {
                kind = OverlapKind::Possible;
            }
        }
        (a.len() == b.len()).then_some(kind)
    }

    fn segments_overlap(&self, a: Segment<'_>, b: Segment<'_>) -> Option<OverlapKind> {
        let overlapping = match (a, b) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Literal(text), Segment::Param { regex: Some(source), .. })
            | (Segment::Param { regex: Some(source), .. }, Segment::Literal(text)) => {
                self.regexes.get(source).is_some_and(|regex| regex.is_match(text))
            }
            (Segment::Param { regex: Some(a), .. }, Segment::Param { regex: Some(b), .. }) if a != b => {
                return Some(OverlapKind::Possible);
            }
            _ => true,
        };
        overlapping.then_some(OverlapKind::Definite)
    }
}

fn collect_patterns<'t, T>(node: &'t Node<T>, f: &mut impl FnMut(&'t str)) {
    if let Some(pattern) = node.pattern() {
        f(pattern);
    }
    for child in node.children() {
        collect_patterns(child, f);
    }
}

impl<'t, T> Matched<'t, T> {
    #[inline]
    pub fn node(&self) -> &'t Node<T> {
        self.node
    }

    /// The leaf value, always present on a matched node
    #[inline]
    pub fn value(&self) -> Option<&'t T> {
        self.node.value()
    }

    #[inline]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_params(self) -> PathParams {
        self.params
    }
}

impl<T> Serialize for Trie<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut regexes = self.regexes.keys().collect::<Vec<_>>();
        regexes.sort_unstable();

        let mut state = serializer.serialize_struct("Trie", 3)?;
        state.serialize_field("root", &self.root)?;
        state.serialize_field("regexes", &regexes)?;
        state.serialize_field("size", &self.size)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(routes: &[(&str, &'static str)]) -> Trie<&'static str> {
        let mut trie = Trie::new();
        for (method, pattern) in routes {
            trie.insert(method, pattern, *pattern).unwrap();
        }
        trie
    }

    #[test]
    fn test_match_root() {
        let trie = trie(&[("GET", "/")]);

        let matched = trie.at("GET", "/").unwrap();
        assert_eq!(matched.value(), Some(&"/"));
        assert!(matched.params().is_empty());

        assert!(trie.at("POST", "/").is_none());
    }

    #[test]
    fn test_match_regex_param() {
        let trie = trie(&[("GET", "/api/:id|^[0-9]+$")]);

        let matched = trie.at("GET", "/api/100").unwrap();
        assert_eq!(matched.params().get("id"), Some("100"));

        assert!(trie.at("GET", "/api/abc").is_none());
    }

    #[test]
    fn test_conflict_on_param_name() {
        let mut trie = trie(&[("GET", "/api/:id")]);

        let err = trie.insert("GET", "/api/:name", "/api/:name").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(trie.size(), 1);

        // the first route survives
        let matched = trie.at("GET", "/api/7").unwrap();
        assert_eq!(matched.value(), Some(&"/api/:id"));
        assert_eq!(matched.params().get("id"), Some("7"));
        assert_eq!(matched.params().get("name"), None);
    }

    #[test]
    fn test_conflict_is_per_method() {
        let mut trie = trie(&[("GET", "/api/:id")]);
        assert!(trie.insert("POST", "/api/:name", "post").is_ok());
        assert_eq!(trie.size(), 2);
    }

    #[test]
    fn test_different_regex_are_distinct() {
        let trie = trie(&[("GET", "/api/:id|^[0-9]+$"), ("GET", "/api/:name|^[a-z]+$")]);
        assert_eq!(trie.size(), 2);

        assert_eq!(trie.at("GET", "/api/42").unwrap().params().get("id"), Some("42"));
        assert_eq!(trie.at("GET", "/api/go").unwrap().params().get("name"), Some("go"));
        assert!(trie.at("GET", "/api/Go").is_none());
    }

    #[test]
    fn test_regex_is_cached_once() {
        let trie = trie(&[("GET", "/a/:id|^[0-9]+$"), ("GET", "/b/:id|^[0-9]+$"), ("POST", "/c/:n|^[0-9]+$")]);
        assert_eq!(trie.regexes.len(), 1);
    }

    #[test]
    fn test_invalid_segments_leave_trie_untouched() {
        let mut trie: Trie<()> = Trie::new();

        assert!(matches!(trie.insert("GET", "/a/:|x", ()), Err(RouteError::EmptyParamName { .. })));
        assert!(matches!(trie.insert("GET", "/a/:id|[0-9", ()), Err(RouteError::InvalidRegex { .. })));
        assert!(matches!(trie.insert("GET", "/a/:filepath/b", ()), Err(RouteError::CatchAllNotLast { .. })));

        assert_eq!(trie.size(), 0);
        assert!(trie.routes().is_empty());
        assert!(trie.leaf_mut("GET", "/a/:id").is_none());
    }

    #[test]
    fn test_prefix_is_not_a_match() {
        let trie = trie(&[("GET", "/v1/auth/login")]);
        assert!(trie.at("GET", "/v1/auth").is_none());
        assert!(trie.at("GET", "/v1/auth/login/more").is_none());
    }

    #[test]
    fn test_literal_wins_over_param() {
        let trie = trie(&[("GET", "/api/posts"), ("GET", "/api/:name")]);

        assert_eq!(trie.at("GET", "/api/posts").unwrap().value(), Some(&"/api/posts"));
        assert_eq!(trie.at("GET", "/api/other").unwrap().value(), Some(&"/api/:name"));
    }

    #[test]
    fn test_backtracks_into_sibling() {
        let trie = trie(&[("GET", "/api/:cat/cat"), ("GET", "/api/feiyu/fish"), ("GET", "/api/:id|^[0-9]+$/dog")]);

        // the literal child `feiyu` is a dead end for `/cat`
        let matched = trie.at("GET", "/api/feiyu/cat").unwrap();
        assert_eq!(matched.value(), Some(&"/api/:cat/cat"));
        assert_eq!(matched.params().get("cat"), Some("feiyu"));

        // the regex child accepts `9` first but only has `/dog`
        let matched = trie.at("GET", "/api/9/cat").unwrap();
        assert_eq!(matched.params().get("cat"), Some("9"));

        assert_eq!(trie.at("GET", "/api/9/dog").unwrap().value(), Some(&"/api/:id|^[0-9]+$/dog"));
    }

    #[test]
    fn test_nested_params() {
        let trie = trie(&[
            ("POST", "/api/posts/:tag|^[0-9]+$/:name"),
            ("POST", "/api/posts/:tag|^[0-9]+$/:name/all"),
        ]);

        let matched = trie.at("POST", "/api/posts/222/go").unwrap();
        assert_eq!(matched.params().get("tag"), Some("222"));
        assert_eq!(matched.params().get("name"), Some("go"));

        let matched = trie.at("POST", "/api/posts/500/go/all").unwrap();
        assert_eq!(matched.value(), Some(&"/api/posts/:tag|^[0-9]+$/:name/all"));

        assert!(trie.at("POST", "/api/posts/abc/go").is_none());
    }

    #[test]
    fn test_catch_all() {
        let trie = trie(&[("GET", "/static/:filepath"), ("GET", "/static/index")]);

        let matched = trie.at("GET", "/static/css/site.css").unwrap();
        assert_eq!(matched.params().get("filepath"), Some("css/site.css"));

        assert_eq!(trie.at("GET", "/static/index").unwrap().value(), Some(&"/static/index"));
        assert!(trie.at("GET", "/static").is_none());
    }

    #[test]
    fn test_match_is_idempotent() {
        let trie = trie(&[("GET", "/api/:fish/fish/:id|^[a-zA-Z]+$/:age|^[0-9]+$")]);

        let first = trie.at("GET", "/api/feiyu/fish/GO/3").unwrap();
        let second = trie.at("GET", "/api/feiyu/fish/GO/3").unwrap();

        assert!(std::ptr::eq(first.node(), second.node()));
        assert_eq!(first.params(), second.params());
        assert_eq!(first.params().get("age"), Some("3"));
    }

    #[test]
    fn test_leaf_mut_resolves_collapsed_names() {
        let mut trie = trie(&[("GET", "/users/:id")]);
        let leaf = trie.leaf_mut("GET", "/users/:name").unwrap();
        assert_eq!(leaf.pattern(), Some("/users/:id"));
        assert!(trie.leaf_mut("POST", "/users/:id").is_none());
        assert!(trie.leaf_mut("GET", "/users").is_none());
    }

    #[test]
    fn test_allowed_methods() {
        let trie = trie(&[("GET", "/v2/auth/login"), ("PUT", "/v2/auth/login"), ("POST", "/other")]);
        assert_eq!(trie.allowed_methods("DELETE", "/v2/auth/login"), vec!["GET", "PUT"]);
        assert_eq!(trie.allowed_methods("GET", "/v2/auth/login"), vec!["PUT"]);
        assert!(trie.allowed_methods("DELETE", "/nothing").is_empty());
    }

    #[test]
    fn test_routes_and_size() {
        let trie = trie(&[("GET", "/a/b"), ("GET", "/a"), ("POST", "/a")]);
        assert_eq!(trie.size(), 3);
        assert_eq!(trie.routes(), vec![("GET", "/a"), ("GET", "/a/b"), ("POST", "/a")]);
    }

    #[test]
    fn test_overlaps() {
        let trie = trie(&[
            ("GET", "/api/:name"),
            ("GET", "/api/posts"),
            ("GET", "/api/:id|^[0-9]+$"),
            ("GET", "/files/:filepath"),
            ("GET", "/files/a/b"),
            ("POST", "/api/posts"),
        ]);

        let overlaps = trie.overlaps();
        let pairs = overlaps.iter().map(|o| (o.first.as_str(), o.second.as_str())).collect::<Vec<_>>();

        assert!(pairs.contains(&("/api/:id|^[0-9]+$", "/api/:name")));
        assert!(pairs.contains(&("/api/:name", "/api/posts")));
        assert!(pairs.contains(&("/files/:filepath", "/files/a/b")));
        // `posts` never satisfies the digit constraint
        assert!(!pairs.contains(&("/api/:id|^[0-9]+$", "/api/posts")));
        assert!(overlaps.iter().all(|o| o.method == "GET"));
        assert!(overlaps.iter().all(|o| o.kind == OverlapKind::Definite));
    }

    #[test]
    fn test_different_regexes_overlap_possibly() {
        let trie = trie(&[("GET", "/a/:id|^[0-9]+$"), ("GET", "/a/:hex|^[0-9a-f]+$"), ("GET", "/b/:id|^[0-9]+$")]);

        let overlaps = trie.overlaps();
        assert_eq!(
            overlaps,
            vec![Overlap {
                method: "GET".to_owned(),
                first: "/a/:hex|^[0-9a-f]+$".to_owned(),
                second: "/a/:id|^[0-9]+$".to_owned(),
                kind: OverlapKind::Possible,
            }]
        );

        // both accept `12`, regex source order decides
        assert_eq!(trie.at("GET", "/a/12").unwrap().value(), Some(&"/a/:id|^[0-9]+$"));
    }

    #[test]
    fn test_root_path_binds_nothing() {
        let trie = trie(&[("GET", "/:id")]);

        let matched = trie.at("GET", "/").unwrap();
        assert_eq!(matched.value(), Some(&"/:id"));
        assert!(matched.params().is_empty());
        assert_eq!(matched.params().param("id"), "");
    }

    #[test]
    fn test_serialize() {
        let trie = trie(&[("GET", "/api/:id|^[0-9]+$")]);
        let json = serde_json::to_value(&trie).unwrap();

        assert_eq!(json["size"], 1);
        assert_eq!(json["regexes"][0], "^[0-9]+$");

        let leaf = &json["root"]["children"]["GET"]["children"]["api"]["children"]["^[0-9]+$"];
        assert_eq!(leaf["isLeaf"], true);
        assert_eq!(leaf["template"], ":id|^[0-9]+$");
        assert_eq!(leaf["pattern"], "/api/:id|^[0-9]+$");
    }
}
