// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The auto box element: cached environment, the three resolvers and the
//! recomputation engine.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use smallvec::SmallVec;
use understory_box_style::{
    Axis, CommitStats, DefaultCalculators, Insets, StyleCalculators, StyleProp, StyleProps, Sty,
    commit,
};
use understory_watch::{MutationRecord, WatchOptions, WatcherId};

use crate::document::{NodeId, STYLE_ATTRIBUTE};
use crate::element::{CustomElement, ElementCx};
use crate::registry::{ElementRegistry, ElementRegistryError};

/// Tag under which [`BoxNode::register`] defines the auto box.
pub const BOX_TAG: &str = "b-x";

/// The attribute carrying a box's JSON descriptor.
pub const STY_ATTRIBUTE: &str = "sty";

/// A `sty` attribute value that is not a valid descriptor.
#[derive(Debug)]
pub struct DescriptorError(serde_json::Error);

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid box descriptor: {}", self.0)
    }
}

impl core::error::Error for DescriptorError {}

/// Parses the JSON form of a descriptor, as carried by the `sty` attribute.
///
/// ```
/// use understory_auto_box::parse_sty;
/// use understory_box_style::{Axis, Size};
///
/// let sty = parse_sty(r#"{ "axis": "row", "width": { "grow": 2 } }"#).unwrap();
/// assert_eq!(sty.axis(), Axis::Row);
/// assert_eq!(sty.width, Some(Size::Grow(2.0)));
/// assert!(parse_sty("{ axis: row }").is_err());
/// ```
pub fn parse_sty(json: &str) -> Result<Sty, DescriptorError> {
    serde_json::from_str(json).map_err(DescriptorError)
}

/// What a box has observed about its surroundings.
///
/// Every field starts at its default and only changes when a fresh
/// observation differs from the cached value.
#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    /// The parent's resolved layout direction.
    pub parent_axis: Axis,
    /// The parent's resolved paddings.
    pub parent_padding: Insets,
    /// Number of direct child nodes of any kind.
    pub child_count: usize,
    /// At least one direct box child expands horizontally.
    pub child_grows_width: bool,
    /// At least one direct box child expands vertically.
    pub child_grows_height: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            parent_axis: Axis::Column,
            parent_padding: Insets::default(),
            child_count: 0,
            child_grows_width: false,
            child_grows_height: false,
        }
    }
}

/// How many recomputations a parent style change causes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ParentRecompute {
    /// One recomputation per changed field (axis and each padding).
    ///
    /// Every field is updated before the first pass, so each pass sees the
    /// full new snapshot: the pass count is per field, but only the first
    /// pass can write.
    #[default]
    PerField,
    /// At most one recomputation per observation.
    Once,
}

/// Per-box behavior options.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BoxOptions {
    /// See [`ParentRecompute`].
    pub parent_recompute: ParentRecompute,
}

impl BoxOptions {
    /// Sets [`parent_recompute`](Self::parent_recompute).
    #[must_use]
    pub fn with_parent_recompute(mut self, parent_recompute: ParentRecompute) -> Self {
        self.parent_recompute = parent_recompute;
        self
    }
}

/// The three watchers a box owns, created on first attach.
#[derive(Copy, Clone, Debug)]
struct Watchers {
    /// The parent's inline style.
    parent: WatcherId,
    /// The box's own child list.
    own_children: WatcherId,
    /// The inline style of every direct child.
    children_style: WatcherId,
}

/// An element that derives its own style from a descriptor, its parent's
/// layout and its children's growth.
///
/// While attached, a box keeps an [`Environment`] snapshot up to date through
/// three resolvers, each fed by its own watcher:
///
/// - [`resolve_parent_environment`](Self::resolve_parent_environment): the
///   parent's inline style changed;
/// - [`resolve_child_list`](Self::resolve_child_list): the box's own child
///   list changed;
/// - [`resolve_child_growth`](Self::resolve_child_growth): a direct child's
///   inline style changed.
///
/// A resolver recomputes only when the snapshot actually changed, and
/// [`recompute`](Self::recompute) writes only properties whose value
/// differs. Together these make every pass idempotent, so style writes
/// that bounce between parents and children die out.
pub struct BoxNode {
    sty: Sty,
    env: Environment,
    watchers: Option<Watchers>,
    calculators: Box<dyn StyleCalculators>,
    options: BoxOptions,
    passes: usize,
    attached: bool,
}

impl fmt::Debug for BoxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxNode")
            .field("sty", &self.sty)
            .field("env", &self.env)
            .field("options", &self.options)
            .field("passes", &self.passes)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}

impl Default for BoxNode {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxNode {
    /// Creates a detached box with an empty descriptor and the
    /// [`DefaultCalculators`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_calculators(DefaultCalculators)
    }

    /// Creates a box that computes its style with `calculators`.
    #[must_use]
    pub fn with_calculators(calculators: impl StyleCalculators + 'static) -> Self {
        Self {
            sty: Sty::default(),
            env: Environment::default(),
            watchers: None,
            calculators: Box::new(calculators),
            options: BoxOptions::default(),
            passes: 0,
            attached: false,
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: BoxOptions) -> Self {
        self.options = options;
        self
    }

    /// Defines [`BOX_TAG`] in `registry` with default boxes.
    pub fn register(registry: &mut ElementRegistry) -> Result<(), ElementRegistryError> {
        Self::register_with(registry, Self::new)
    }

    /// Defines [`BOX_TAG`] in `registry`, building each box with `factory`.
    pub fn register_with(
        registry: &mut ElementRegistry,
        factory: impl Fn() -> Self + 'static,
    ) -> Result<(), ElementRegistryError> {
        registry.define(BOX_TAG, &[STY_ATTRIBUTE], move || Box::new(factory()))
    }

    /// The descriptor.
    #[must_use]
    pub fn sty(&self) -> &Sty {
        &self.sty
    }

    /// Replaces the descriptor.
    ///
    /// This does not recompute; the new descriptor takes effect at the next
    /// pass, e.g. [`refresh`](Self::refresh).
    pub fn set_sty(&mut self, sty: Sty) {
        self.sty = sty;
    }

    /// Mutable access to the descriptor. Like [`set_sty`](Self::set_sty),
    /// edits take effect at the next pass.
    pub fn sty_mut(&mut self) -> &mut Sty {
        &mut self.sty
    }

    /// The layout direction of this box's children.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.sty.axis()
    }

    /// The options.
    #[must_use]
    pub fn options(&self) -> BoxOptions {
        self.options
    }

    /// The cached environment snapshot.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Cached number of direct child nodes.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.env.child_count
    }

    /// Cached parent layout direction.
    #[must_use]
    pub fn parent_axis(&self) -> Axis {
        self.env.parent_axis
    }

    /// Cached parent paddings.
    #[must_use]
    pub fn parent_padding(&self) -> &Insets {
        &self.env.parent_padding
    }

    /// Whether a direct box child expands horizontally.
    #[must_use]
    pub fn child_grows_width(&self) -> bool {
        self.env.child_grows_width
    }

    /// Whether a direct box child expands vertically.
    #[must_use]
    pub fn child_grows_height(&self) -> bool {
        self.env.child_grows_height
    }

    /// Number of [`recompute`](Self::recompute) passes run so far.
    #[must_use]
    pub fn recompute_passes(&self) -> usize {
        self.passes
    }

    /// Whether the box is in the connected tree.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Re-reads the parent's resolved direction and paddings.
    ///
    /// Each of the five fields is compared on its own. How many
    /// recomputations follow depends on [`BoxOptions::parent_recompute`].
    /// A box without a parent keeps its snapshot.
    pub fn resolve_parent_environment(&mut self, cx: &mut ElementCx<'_>) {
        let Some(parent) = cx.document().parent(cx.node()) else {
            return;
        };
        let doc = cx.document();
        let axis = Axis::from_flex_direction(doc.resolved_style(parent, StyleProp::FlexDirection));
        let observed = [
            StyleProp::PaddingTop,
            StyleProp::PaddingRight,
            StyleProp::PaddingBottom,
            StyleProp::PaddingLeft,
        ]
        .map(|prop| doc.resolved_style(parent, prop));

        let mut changed = 0_usize;
        if self.env.parent_axis != axis {
            self.env.parent_axis = axis;
            changed += 1;
        }
        let padding = &mut self.env.parent_padding;
        let slots = [
            &mut padding.top,
            &mut padding.right,
            &mut padding.bottom,
            &mut padding.left,
        ];
        for (slot, value) in slots.into_iter().zip(observed) {
            if slot.as_str() != value {
                *slot = String::from(value);
                changed += 1;
            }
        }

        let passes = match self.options.parent_recompute {
            ParentRecompute::PerField => changed,
            ParentRecompute::Once => changed.min(1),
        };
        tracing::trace!(node = %cx.node(), changed, "resolved parent environment");
        for _ in 0..passes {
            self.recompute(cx);
        }
    }

    /// Re-derives whether any direct box child grows, per dimension.
    ///
    /// Along a row, a child grows horizontally when its resolved
    /// `flex-basis` is not `auto` and vertically when its resolved `height`
    /// is `100%`; along a column the two rules swap dimensions. Children
    /// that are not boxes are ignored.
    pub fn resolve_child_growth(&mut self, cx: &mut ElementCx<'_>) {
        let axis = self.sty.axis();
        let doc = cx.document();
        let (mut grows_width, mut grows_height) = (false, false);
        for &child in doc.children(cx.node()) {
            if cx.instance::<Self>(child).is_none() {
                continue;
            }
            let main = doc.resolved_style(child, StyleProp::FlexBasis) != "auto";
            match axis {
                Axis::Row => {
                    grows_width |= main;
                    grows_height |= doc.resolved_style(child, StyleProp::Height) == "100%";
                }
                Axis::Column => {
                    grows_width |= doc.resolved_style(child, StyleProp::Width) == "100%";
                    grows_height |= main;
                }
            }
        }

        if self.env.child_grows_width != grows_width {
            self.env.child_grows_width = grows_width;
            self.recompute(cx);
        }
        if self.env.child_grows_height != grows_height {
            self.env.child_grows_height = grows_height;
            self.recompute(cx);
        }
    }

    /// Recounts the direct children and re-arms the per-child style watcher.
    ///
    /// Always re-derives child growth, since the set of children may have
    /// changed even when the count did not.
    pub fn resolve_child_list(&mut self, cx: &mut ElementCx<'_>) {
        if let Some(watchers) = self.watchers {
            cx.watches_mut().disconnect(watchers.children_style);
        }
        let children: SmallVec<[NodeId; 8]> =
            cx.document().children(cx.node()).iter().copied().collect();

        if self.env.child_count != children.len() {
            self.env.child_count = children.len();
            self.recompute(cx);
        }
        self.resolve_child_growth(cx);

        let Some(watchers) = self.watchers.filter(|_| self.attached) else {
            return;
        };
        for child in children {
            cx.watches_mut().observe(
                watchers.children_style,
                child,
                WatchOptions::attribute(STYLE_ATTRIBUTE),
            );
        }
    }

    /// The style the calculators produce for the current descriptor and
    /// environment, merged in the order size, layout, decoration, text,
    /// interaction.
    #[must_use]
    pub fn compute_style(&self) -> StyleProps {
        let sty = &self.sty;
        let env = &self.env;
        let calc = &*self.calculators;
        let align = sty.align();

        let mut style = calc.size(
            sty,
            env.child_grows_width,
            env.child_grows_height,
            env.parent_axis,
            &env.parent_padding,
        );
        style.merge(&calc.layout(sty, align, env.parent_axis, sty.axis(), env.child_count));
        style.merge(&calc.decoration(sty));
        style.merge(&calc.text(sty, align.x, sty.overflow_x()));
        style.merge(&calc.interaction(sty));
        style
    }

    /// Recomputes the style and commits the properties that changed.
    pub fn recompute(&mut self, cx: &mut ElementCx<'_>) -> CommitStats {
        self.passes += 1;
        let candidate = self.compute_style();
        let node = cx.node();
        let stats = match cx.document_mut().style_surface(node) {
            Some(mut surface) => commit(&candidate, &mut surface),
            None => CommitStats::default(),
        };
        tracing::trace!(
            node = %node,
            pass = self.passes,
            written = stats.written,
            unchanged = stats.unchanged,
            "recomputed box style"
        );
        stats
    }

    /// Runs the full resolution sequence: parent environment, child list
    /// (with growth), then one recomputation.
    pub fn refresh(&mut self, cx: &mut ElementCx<'_>) -> CommitStats {
        self.resolve_parent_environment(cx);
        self.resolve_child_list(cx);
        self.recompute(cx)
    }

    fn watchers(&mut self, cx: &mut ElementCx<'_>) -> Watchers {
        *self.watchers.get_or_insert_with(|| Watchers {
            parent: cx.create_watcher(),
            own_children: cx.create_watcher(),
            children_style: cx.create_watcher(),
        })
    }
}

impl CustomElement for BoxNode {
    fn on_attach(&mut self, cx: &mut ElementCx<'_>) {
        let watchers = self.watchers(cx);
        self.attached = true;
        tracing::debug!(node = %cx.node(), "box attached");
        self.refresh(cx);

        let node = cx.node();
        let parent = cx.document().parent(node);
        let watches = cx.watches_mut();
        watches.observe(watchers.own_children, node, WatchOptions::child_list());
        if let Some(parent) = parent {
            watches.observe(
                watchers.parent,
                parent,
                WatchOptions::attribute(STYLE_ATTRIBUTE),
            );
        }
    }

    fn on_detach(&mut self, cx: &mut ElementCx<'_>) {
        if let Some(watchers) = self.watchers {
            let watches = cx.watches_mut();
            watches.disconnect(watchers.parent);
            watches.disconnect(watchers.own_children);
            watches.disconnect(watchers.children_style);
        }
        self.attached = false;
        self.env = Environment::default();
        tracing::debug!(node = %cx.node(), "box detached");
    }

    fn attribute_changed(
        &mut self,
        name: &str,
        _old: Option<&str>,
        new: Option<&str>,
        cx: &mut ElementCx<'_>,
    ) {
        if name != STY_ATTRIBUTE {
            return;
        }
        match new.map(parse_sty) {
            None => self.sty = Sty::default(),
            Some(Ok(sty)) => self.sty = sty,
            Some(Err(err)) => {
                tracing::warn!(node = %cx.node(), %err, "keeping previous descriptor");
            }
        }
    }

    fn on_mutations(
        &mut self,
        watcher: WatcherId,
        records: &[MutationRecord<NodeId>],
        cx: &mut ElementCx<'_>,
    ) {
        let Some(watchers) = self.watchers else {
            return;
        };
        for record in records {
            if watcher == watchers.own_children && record.kind.is_child_list() {
                self.resolve_child_list(cx);
            } else if watcher == watchers.parent && record.kind.is_attribute(STYLE_ATTRIBUTE) {
                self.resolve_parent_environment(cx);
            } else if watcher == watchers.children_style
                && record.kind.is_attribute(STYLE_ATTRIBUTE)
            {
                self.resolve_child_growth(cx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_box_style::{Align, AlignX, Overflow, Size};

    #[test]
    fn environment_defaults() {
        let env = Environment::default();
        assert_eq!(env.parent_axis, Axis::Column);
        assert_eq!(env.parent_padding.left, "0px");
        assert_eq!(env.child_count, 0);
        assert!(!env.child_grows_width && !env.child_grows_height);
    }

    #[test]
    fn parses_full_descriptor() {
        let sty = parse_sty(
            r#"{
                "width": "shrink",
                "height": { "px": 40 },
                "align": { "x": "left", "y": "top" },
                "overflowX": "crop",
                "textIsBold": true
            }"#,
        )
        .unwrap();
        assert_eq!(sty.width, Some(Size::Shrink));
        assert_eq!(sty.height, Some(Size::Px(40.0)));
        assert_eq!(sty.align(), Align::TOP_LEFT);
        assert_eq!(sty.align().x, AlignX::Left);
        assert_eq!(sty.overflow_x(), Overflow::Crop);
        assert_eq!(sty.text_is_bold, Some(true));
    }

    #[test]
    fn rejects_malformed_descriptor() {
        let err = parse_sty(r#"{ "axis": "diagonal" }"#).unwrap_err();
        assert!(alloc::format!("{err}").starts_with("invalid box descriptor"));
    }

    #[test]
    fn compute_style_merges_in_order() {
        let mut node = BoxNode::new();
        node.set_sty(Sty {
            axis: Some(Axis::Row),
            pad: Some(4.0),
            ..Sty::default()
        });
        let style = node.compute_style();
        assert_eq!(style.get(StyleProp::Display), Some("flex"));
        assert_eq!(style.get(StyleProp::FlexDirection), Some("row"));
        assert_eq!(style.get(StyleProp::PaddingTop), Some("4px"));
        assert_eq!(style.get(StyleProp::Cursor), Some("default"));
        // Not attached yet: the parent axis is the default column.
        assert_eq!(style.get(StyleProp::Height), Some("fit-content"));
        assert_eq!(node.recompute_passes(), 0);
    }

    struct Fixed;

    impl StyleCalculators for Fixed {
        fn size(&self, _: &Sty, _: bool, _: bool, _: Axis, _: &Insets) -> StyleProps {
            StyleProps::new().with(StyleProp::Width, "1px")
        }

        fn layout(&self, _: &Sty, _: Align, _: Axis, _: Axis, _: usize) -> StyleProps {
            StyleProps::new().with(StyleProp::Width, "2px")
        }

        fn decoration(&self, _: &Sty) -> StyleProps {
            StyleProps::new()
        }

        fn text(&self, _: &Sty, _: AlignX, _: Overflow) -> StyleProps {
            StyleProps::new()
        }

        fn interaction(&self, _: &Sty) -> StyleProps {
            StyleProps::new().with(StyleProp::Cursor, "pointer")
        }
    }

    #[test]
    fn later_calculators_win() {
        let style = BoxNode::with_calculators(Fixed).compute_style();
        assert_eq!(style.get(StyleProp::Width), Some("2px"));
        assert_eq!(style.get(StyleProp::Cursor), Some("pointer"));
        assert_eq!(style.len(), 2);
    }
}
