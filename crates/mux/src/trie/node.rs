use crate::trie::segment::{DynamicKey, Segment, SegmentKey};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// A node of the routing trie.
///
/// Every node is exclusively owned by its parent. Literal children are kept
/// apart from dynamic ones so that a request segment can be looked up by its
/// exact text first.
#[derive(Debug)]
pub struct Node<T> {
    template: String,
    pattern: Option<String>,
    value: Option<T>,
    statics: HashMap<String, Node<T>>,
    dynamics: BTreeMap<DynamicKey, Node<T>>,
}

impl<T> Node<T> {
    pub(crate) fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            pattern: None,
            value: None,
            statics: HashMap::new(),
            dynamics: BTreeMap::new(),
        }
    }

    /// The segment text this node was created from, e.g. `:id|^[0-9]+$`
    #[inline]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The full registered pattern, only present on leaves
    #[inline]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    #[inline]
    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub(crate) fn set_leaf(&mut self, pattern: &str, value: T) {
        self.pattern = Some(pattern.to_owned());
        self.value = Some(value);
    }

    pub(crate) fn child_or_insert(&mut self, segment: Segment<'_>, template: &str) -> &mut Node<T> {
        match segment.key() {
            SegmentKey::Literal(text) => self.statics.entry(text.to_owned()).or_insert_with(|| Node::new(template)),
            SegmentKey::Dynamic(key) => self.dynamics.entry(key).or_insert_with(|| Node::new(template)),
        }
    }

    pub(crate) fn child_mut(&mut self, segment: Segment<'_>) -> Option<&mut Node<T>> {
        match segment.key() {
            SegmentKey::Literal(text) => self.statics.get_mut(text),
            SegmentKey::Dynamic(key) => self.dynamics.get_mut(&key),
        }
    }

    #[inline]
    pub(crate) fn static_child(&self, text: &str) -> Option<&Node<T>> {
        self.statics.get(text)
    }

    /// The literal children keyed by their text
    #[inline]
    pub(crate) fn statics(&self) -> &HashMap<String, Node<T>> {
        &self.statics
    }

    /// The dynamic children in matching precedence order
    #[inline]
    pub(crate) fn dynamics(&self) -> impl Iterator<Item = (&DynamicKey, &Node<T>)> {
        self.dynamics.iter()
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = &Node<T>> {
        self.statics.values().chain(self.dynamics.values())
    }
}

struct Children<'a, T>(&'a Node<T>);

impl<T> Serialize for Children<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.0;
        let statics = node.statics.iter().collect::<BTreeMap<_, _>>();

        let mut map = serializer.serialize_map(Some(node.statics.len() + node.dynamics.len()))?;
        for (key, child) in statics {
            map.serialize_entry(key, child)?;
        }
        for (key, child) in &node.dynamics {
            map.serialize_entry(&key.to_string(), child)?;
        }
        map.end()
    }
}

impl<T> Serialize for Node<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("template", &self.template)?;
        state.serialize_field("pattern", &self.pattern)?;
        state.serialize_field("isLeaf", &self.is_leaf())?;
        state.serialize_field("children", &Children(self))?;
        state.end()
    }
}
