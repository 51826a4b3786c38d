// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host document: nodes, inline styles, attributes and the
//! mutation/lifecycle notifications the auto box consumes.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;
use understory_box_style::{StyleProp, StyleProps, StyleSurface};
use understory_watch::{MutationRecord, WatchRegistry};

/// Name of the attribute reported when a node's inline style changes.
pub const STYLE_ATTRIBUTE: &str = "style";

/// Tag of the document's root element.
pub const ROOT_TAG: &str = "root";

/// Identifier of a node in a [`Document`].
///
/// Nodes are never freed, so an id stays valid for the document's lifetime.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors from structural and attribute operations on a [`Document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentError {
    /// The id does not belong to this document.
    UnknownNode(NodeId),
    /// The operation needs an element, but the node is a text node.
    NotAnElement(NodeId),
    /// Inserting `child` under `parent` would break the tree (cycle, or
    /// moving the root).
    HierarchyRequest {
        /// The would-be parent.
        parent: NodeId,
        /// The node being inserted.
        child: NodeId,
    },
    /// `child` is not a direct child of `parent`.
    NotAChild {
        /// The expected parent.
        parent: NodeId,
        /// The node that is not its child.
        child: NodeId,
    },
    /// The inline style is not a plain attribute; use the style setters.
    ReservedAttribute,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(node) => write!(f, "node {node} does not belong to this document"),
            Self::NotAnElement(node) => write!(f, "node {node} is not an element"),
            Self::HierarchyRequest { parent, child } => {
                write!(f, "cannot insert {child} under {parent}")
            }
            Self::NotAChild { parent, child } => write!(f, "{child} is not a child of {parent}"),
            Self::ReservedAttribute => write!(
                f,
                "`{STYLE_ATTRIBUTE}` is reserved for the inline style; use set_style"
            ),
        }
    }
}

impl core::error::Error for DocumentError {}

/// A lifecycle reaction queued by the document for the hosting runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reaction {
    /// The element became part of the connected tree.
    Connected(NodeId),
    /// The element left the connected tree.
    Disconnected(NodeId),
    /// An attribute of the element changed value.
    AttributeChanged {
        /// The element.
        node: NodeId,
        /// Attribute name.
        name: String,
        /// Previous value, `None` if the attribute was absent.
        old: Option<String>,
        /// New value, `None` if the attribute was removed.
        new: Option<String>,
    },
}

#[derive(Debug)]
enum NodeKind {
    Element { tag: String },
    Text,
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    style: StyleProps,
    attributes: SmallVec<[(String, String); 2]>,
}

/// A minimal presentation tree with observable mutations.
///
/// The document plays the role of the browser DOM for auto boxes:
///
/// - a permanently connected [root](Self::root) element;
/// - element and text nodes with ordered children;
/// - per-element inline style and attributes;
/// - a resolved-style query ([`resolved_style`](Self::resolved_style)) that
///   returns the inline value or the property's CSS initial value (there is
///   no stylesheet cascade and no inheritance);
/// - a [`WatchRegistry`] that receives a record for every *effective*
///   mutation: writing a value a node already has produces no record;
/// - a queue of lifecycle [`Reaction`]s for the hosting runtime.
///
/// # Example
///
/// ```
/// use understory_auto_box::{Document, Reaction};
/// use understory_box_style::StyleProp;
///
/// let mut doc = Document::new();
/// let panel = doc.create_element("div");
/// doc.append_child(doc.root(), panel).unwrap();
/// assert_eq!(doc.take_reaction(), Some(Reaction::Connected(panel)));
///
/// assert_eq!(doc.resolved_style(panel, StyleProp::FlexDirection), "row");
/// assert!(doc.set_style(panel, StyleProp::FlexDirection, "column").unwrap());
/// assert!(!doc.set_style(panel, StyleProp::FlexDirection, "column").unwrap());
/// assert_eq!(doc.style_write_count(), 1);
/// ```
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    watches: WatchRegistry<NodeId>,
    reactions: VecDeque<Reaction>,
    style_writes: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document containing only its root element.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            watches: WatchRegistry::new(),
            reactions: VecDeque::new(),
            style_writes: 0,
        };
        doc.root = doc.push(NodeKind::Element {
            tag: String::from(ROOT_TAG),
        });
        doc
    }

    /// The root element. It is always connected.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: String::from(tag),
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self) -> NodeId {
        self.push(NodeKind::Text)
    }

    /// Returns `true` if `node` belongs to this document.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        node.idx() < self.nodes.len()
    }

    /// Returns the parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).ok()?.parent
    }

    /// Returns the direct children of `node` in tree order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.data(node).map_or(&[], |data| data.children.as_slice())
    }

    /// Returns the tag of an element, `None` for text nodes.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).ok()?.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text => None,
        }
    }

    /// Returns `true` if `node` is an element.
    #[must_use]
    pub fn is_element(&self, node: NodeId) -> bool {
        self.tag(node).is_some()
    }

    /// Returns `true` if `node` is the root or a descendant of it.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.root {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// See [`insert_before`](Self::insert_before).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` under `parent` before `reference`, or last if `None`.
    ///
    /// A child that already has a parent is removed from it first, which is
    /// reported as a separate child list mutation on the old parent.
    /// Inserting a node before itself leaves the tree unchanged.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        if !self.is_element(parent) {
            return Err(self.element_error(parent));
        }
        self.data(child)?;
        if child == self.root || self.is_inclusive_ancestor(child, parent) {
            return Err(DocumentError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DocumentError::NotAChild {
                    parent,
                    child: reference,
                });
            }
            if reference == child {
                return Ok(());
            }
        }

        if let Some(old_parent) = self.parent(child) {
            self.detach(old_parent, child);
        }

        let children = &mut self.nodes[parent.idx()].children;
        let index = reference
            .and_then(|r| children.iter().position(|c| *c == r))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.nodes[child.idx()].parent = Some(parent);

        self.watches
            .notify(MutationRecord::child_list(parent, [child], []));
        if self.is_connected(parent) {
            self.queue_subtree(child, Reaction::Connected);
        }
        Ok(())
    }

    /// Removes `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.data(parent)?;
        if self.parent(child) != Some(parent) {
            return Err(DocumentError::NotAChild { parent, child });
        }
        self.detach(parent, child);
        Ok(())
    }

    /// Removes `node` from its parent, if it has one.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let parent = self.data(node)?.parent;
        match parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.data(node)
            .ok()?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute. Returns `true` if the value changed.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<bool, DocumentError> {
        self.write_attribute(node, name, Some(value))
    }

    /// Removes an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<bool, DocumentError> {
        self.write_attribute(node, name, None)
    }

    /// Returns the inline value of `prop` on `node`.
    #[must_use]
    pub fn inline_style(&self, node: NodeId, prop: StyleProp) -> Option<&str> {
        self.data(node).ok()?.style.get(prop)
    }

    /// Returns the whole inline style of `node`.
    #[must_use]
    pub fn inline_styles(&self, node: NodeId) -> Option<&StyleProps> {
        self.data(node).ok().map(|data| &data.style)
    }

    /// Returns the resolved value of `prop`: the inline value, or the CSS
    /// initial value when none is set.
    #[must_use]
    pub fn resolved_style(&self, node: NodeId, prop: StyleProp) -> &str {
        self.inline_style(node, prop)
            .unwrap_or_else(|| prop.initial_value())
    }

    /// Writes an inline style value. Returns `true` if the value changed.
    ///
    /// Only effective writes are counted and reported to watchers.
    pub fn set_style(
        &mut self,
        node: NodeId,
        prop: StyleProp,
        value: &str,
    ) -> Result<bool, DocumentError> {
        if !self.is_element(node) {
            return Err(self.element_error(node));
        }
        let style = &mut self.nodes[node.idx()].style;
        if style.get(prop) == Some(value) {
            return Ok(false);
        }
        style.set(prop, value);
        self.style_changed(node);
        Ok(true)
    }

    /// Clears an inline style value. Returns `true` if it was set.
    pub fn remove_style(&mut self, node: NodeId, prop: StyleProp) -> Result<bool, DocumentError> {
        if !self.is_element(node) {
            return Err(self.element_error(node));
        }
        if self.nodes[node.idx()].style.remove(prop).is_none() {
            return Ok(false);
        }
        self.style_changed(node);
        Ok(true)
    }

    /// A [`StyleSurface`] view of an element's inline style.
    ///
    /// Returns `None` for text nodes and unknown ids.
    pub fn style_surface(&mut self, node: NodeId) -> Option<NodeStyle<'_>> {
        self.is_element(node).then_some(NodeStyle {
            document: self,
            node,
        })
    }

    /// Number of effective inline style writes since creation.
    #[must_use]
    pub fn style_write_count(&self) -> usize {
        self.style_writes
    }

    /// The registry receiving this document's mutation records.
    #[must_use]
    pub fn watches(&self) -> &WatchRegistry<NodeId> {
        &self.watches
    }

    /// Mutable access to the watch registry, to arm and disarm watchers.
    pub fn watches_mut(&mut self) -> &mut WatchRegistry<NodeId> {
        &mut self.watches
    }

    /// Pops the oldest pending lifecycle reaction.
    pub fn take_reaction(&mut self) -> Option<Reaction> {
        self.reactions.pop_front()
    }

    /// Returns `true` if lifecycle reactions are pending.
    #[must_use]
    pub fn has_reactions(&self) -> bool {
        !self.reactions.is_empty()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("document exceeds u32::MAX nodes"));
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            style: StyleProps::new(),
            attributes: SmallVec::new(),
        });
        id
    }

    fn data(&self, node: NodeId) -> Result<&NodeData, DocumentError> {
        self.nodes
            .get(node.idx())
            .ok_or(DocumentError::UnknownNode(node))
    }

    fn element_error(&self, node: NodeId) -> DocumentError {
        if self.contains(node) {
            DocumentError::NotAnElement(node)
        } else {
            DocumentError::UnknownNode(node)
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let was_connected = self.is_connected(parent);
        self.nodes[parent.idx()].children.retain(|c| *c != child);
        self.nodes[child.idx()].parent = None;
        self.watches
            .notify(MutationRecord::child_list(parent, [], [child]));
        if was_connected {
            self.queue_subtree(child, Reaction::Disconnected);
        }
    }

    /// Queues `reaction` for every element in the subtree at `node`, in tree
    /// order.
    fn queue_subtree(&mut self, node: NodeId, reaction: fn(NodeId) -> Reaction) {
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.push(node);
        while let Some(n) = stack.pop() {
            if self.is_element(n) {
                self.reactions.push_back(reaction(n));
            }
            stack.extend(self.nodes[n.idx()].children.iter().rev().copied());
        }
    }

    fn write_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<bool, DocumentError> {
        if name == STYLE_ATTRIBUTE {
            return Err(DocumentError::ReservedAttribute);
        }
        if !self.is_element(node) {
            return Err(self.element_error(node));
        }
        let attributes = &mut self.nodes[node.idx()].attributes;
        let position = attributes.iter().position(|(n, _)| n == name);
        let old = match (position, value) {
            (Some(i), Some(v)) if attributes[i].1 == v => return Ok(false),
            (Some(i), Some(v)) => Some(core::mem::replace(&mut attributes[i].1, String::from(v))),
            (Some(i), None) => Some(attributes.remove(i).1),
            (None, Some(v)) => {
                attributes.push((String::from(name), String::from(v)));
                None
            }
            (None, None) => return Ok(false),
        };
        self.watches.notify(MutationRecord::attribute(node, name));
        self.reactions.push_back(Reaction::AttributeChanged {
            node,
            name: String::from(name),
            old,
            new: value.map(String::from),
        });
        Ok(true)
    }

    fn style_changed(&mut self, node: NodeId) {
        self.style_writes += 1;
        self.watches
            .notify(MutationRecord::attribute(node, STYLE_ATTRIBUTE));
    }
}

/// Inline style of one element, as a [`StyleSurface`].
///
/// Writes go through [`Document::set_style`], so they are counted and
/// reported to watchers like any other style change.
#[derive(Debug)]
pub struct NodeStyle<'a> {
    document: &'a mut Document,
    node: NodeId,
}

impl StyleSurface for NodeStyle<'_> {
    fn style_value(&self, prop: StyleProp) -> Option<&str> {
        self.document.inline_style(self.node, prop)
    }

    fn set_style_value(&mut self, prop: StyleProp, value: &str) {
        // The node was checked to be an element when the surface was made.
        let _ = self.document.set_style(self.node, prop, value);
    }
}
