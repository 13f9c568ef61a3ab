//! Route pattern grammar.
//!
//! A pattern is a `/` separated list of segments:
//! - `users` is a literal segment, matched by exact text
//! - `:id` is a dynamic segment binding the parameter `id`
//! - `:id|^[0-9]+$` is a dynamic segment whose values must match the regex after `|`
//! - `:filepath` is the catch-all used by static file serving, it binds the rest of the path
//!
//! `/` alone is the root pattern.

use std::borrow::Cow;
use std::fmt;

pub(crate) const DYNAMIC_MARKER: char = ':';
pub(crate) const REGEX_SEPARATOR: char = '|';

/// The reserved parameter name of the static file catch-all segment.
pub const CATCH_ALL_PARAM: &str = "filepath";

/// One compiled pattern segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Param { name: &'a str, regex: Option<&'a str> },
}

impl<'a> Segment<'a> {
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Segment::Param { .. })
    }

    /// The parameter name of a dynamic segment
    #[inline]
    pub fn param_name(&self) -> Option<&'a str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param { name, .. } => Some(*name),
        }
    }

    #[inline]
    pub fn regex(&self) -> Option<&'a str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param { regex, .. } => *regex,
        }
    }

    #[inline]
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Segment::Param { name: CATCH_ALL_PARAM, regex: None })
    }

    /// Derives the key under which this segment's node lives in its parent.
    ///
    /// Bare dynamic segments collapse into one wildcard key whatever their name is,
    /// regex constrained ones are keyed by the regex source.
    pub(crate) fn key(&self) -> SegmentKey<'a> {
        match self {
            Segment::Literal(text) => SegmentKey::Literal(*text),
            Segment::Param { regex: Some(regex), .. } => SegmentKey::Dynamic(DynamicKey::Regex((*regex).to_owned())),
            seg if seg.is_catch_all() => SegmentKey::Dynamic(DynamicKey::CatchAll),
            Segment::Param { .. } => SegmentKey::Dynamic(DynamicKey::Wildcard),
        }
    }
}

/// Parses a single pattern segment.
///
/// Pure function of the segment text, adjacent segments do not matter.
pub fn parse(segment: &str) -> Segment<'_> {
    let Some(rest) = segment.strip_prefix(DYNAMIC_MARKER) else {
        return Segment::Literal(segment);
    };

    match rest.split_once(REGEX_SEPARATOR) {
        Some((name, regex)) => Segment::Param { name, regex: Some(regex) },
        None => Segment::Param { name: rest, regex: None },
    }
}

/// Key of a child node in the trie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SegmentKey<'a> {
    Literal(&'a str),
    Dynamic(DynamicKey),
}

/// Key of a dynamic child node.
///
/// The derived ordering is the matching precedence among dynamic siblings:
/// regex constrained branches (by regex source), then the wildcard, then the catch-all.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum DynamicKey {
    Regex(String),
    Wildcard,
    CatchAll,
}

impl fmt::Display for DynamicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicKey::Regex(regex) => f.write_str(regex),
            DynamicKey::Wildcard => f.write_str(":*"),
            DynamicKey::CatchAll => write!(f, ":{CATCH_ALL_PARAM}"),
        }
    }
}

/// Collapses repeated slashes into one.
pub fn clean_path(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let mut cleaned = String::with_capacity(path.len());
    let mut last_slash = false;
    for c in path.chars() {
        if c == '/' && last_slash {
            continue;
        }
        last_slash = c == '/';
        cleaned.push(c);
    }
    Cow::Owned(cleaned)
}

/// Normalizes a registration pattern.
///
/// Ensures a leading slash, collapses repeated slashes and strips a single
/// trailing slash, except for the root pattern.
pub fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = if pattern.starts_with('/') {
        clean_path(pattern).into_owned()
    } else {
        clean_path(&format!("/{pattern}")).into_owned()
    };

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Splits a path into its segments, `/` alone is a one element list.
pub fn split_path(path: &str) -> Vec<&str> {
    if path == "/" {
        return vec!["/"];
    }
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

/// The method token followed by the path segments.
pub(crate) fn route_segments<'a>(method: &'a str, path: &'a str) -> Vec<&'a str> {
    let mut segments = Vec::with_capacity(8);
    segments.push(method);
    segments.extend(split_path(path));
    segments
}
