// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed style properties, partial style records and diffed commits.

use alloc::string::String;

use smallvec::SmallVec;

/// Default inline capacity for style entries.
///
/// A single calculator rarely emits more than a dozen properties.
const INLINE_CAPACITY: usize = 16;

/// Every presentation property a box can write.
///
/// The set is closed so that every property name is known statically; there
/// is no string-keyed escape hatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[expect(missing_docs, reason = "variants are named after their CSS property")]
pub enum StyleProp {
    Display,
    BoxSizing,
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    FlexBasis,
    FlexGrow,
    FlexShrink,
    FlexDirection,
    FlexWrap,
    JustifyContent,
    AlignItems,
    Gap,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    OverflowX,
    OverflowY,
    BackgroundColor,
    BorderRadius,
    Outline,
    OutlineOffset,
    FontSize,
    FontWeight,
    FontStyle,
    Color,
    TextAlign,
    WhiteSpace,
    TextOverflow,
    Cursor,
    UserSelect,
    PointerEvents,
}

impl StyleProp {
    /// All properties, in declaration order.
    pub const ALL: [Self; 36] = [
        Self::Display,
        Self::BoxSizing,
        Self::Width,
        Self::Height,
        Self::MinWidth,
        Self::MinHeight,
        Self::MaxWidth,
        Self::MaxHeight,
        Self::FlexBasis,
        Self::FlexGrow,
        Self::FlexShrink,
        Self::FlexDirection,
        Self::FlexWrap,
        Self::JustifyContent,
        Self::AlignItems,
        Self::Gap,
        Self::PaddingTop,
        Self::PaddingRight,
        Self::PaddingBottom,
        Self::PaddingLeft,
        Self::OverflowX,
        Self::OverflowY,
        Self::BackgroundColor,
        Self::BorderRadius,
        Self::Outline,
        Self::OutlineOffset,
        Self::FontSize,
        Self::FontWeight,
        Self::FontStyle,
        Self::Color,
        Self::TextAlign,
        Self::WhiteSpace,
        Self::TextOverflow,
        Self::Cursor,
        Self::UserSelect,
        Self::PointerEvents,
    ];

    /// The CSS property name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::BoxSizing => "box-sizing",
            Self::Width => "width",
            Self::Height => "height",
            Self::MinWidth => "min-width",
            Self::MinHeight => "min-height",
            Self::MaxWidth => "max-width",
            Self::MaxHeight => "max-height",
            Self::FlexBasis => "flex-basis",
            Self::FlexGrow => "flex-grow",
            Self::FlexShrink => "flex-shrink",
            Self::FlexDirection => "flex-direction",
            Self::FlexWrap => "flex-wrap",
            Self::JustifyContent => "justify-content",
            Self::AlignItems => "align-items",
            Self::Gap => "gap",
            Self::PaddingTop => "padding-top",
            Self::PaddingRight => "padding-right",
            Self::PaddingBottom => "padding-bottom",
            Self::PaddingLeft => "padding-left",
            Self::OverflowX => "overflow-x",
            Self::OverflowY => "overflow-y",
            Self::BackgroundColor => "background-color",
            Self::BorderRadius => "border-radius",
            Self::Outline => "outline",
            Self::OutlineOffset => "outline-offset",
            Self::FontSize => "font-size",
            Self::FontWeight => "font-weight",
            Self::FontStyle => "font-style",
            Self::Color => "color",
            Self::TextAlign => "text-align",
            Self::WhiteSpace => "white-space",
            Self::TextOverflow => "text-overflow",
            Self::Cursor => "cursor",
            Self::UserSelect => "user-select",
            Self::PointerEvents => "pointer-events",
        }
    }

    /// The CSS initial value, used when nothing has been set.
    #[must_use]
    pub const fn initial_value(self) -> &'static str {
        match self {
            Self::Display => "inline",
            Self::BoxSizing => "content-box",
            Self::Width
            | Self::Height
            | Self::MinWidth
            | Self::MinHeight
            | Self::FlexBasis
            | Self::Cursor
            | Self::UserSelect
            | Self::PointerEvents => "auto",
            Self::MaxWidth | Self::MaxHeight | Self::Outline => "none",
            Self::FlexGrow => "0",
            Self::FlexShrink => "1",
            Self::FlexDirection => "row",
            Self::FlexWrap => "nowrap",
            Self::JustifyContent | Self::AlignItems | Self::Gap => "normal",
            Self::PaddingTop
            | Self::PaddingRight
            | Self::PaddingBottom
            | Self::PaddingLeft
            | Self::BorderRadius
            | Self::OutlineOffset => "0px",
            Self::OverflowX | Self::OverflowY => "visible",
            Self::BackgroundColor => "transparent",
            Self::FontSize => "medium",
            Self::FontWeight | Self::FontStyle | Self::WhiteSpace => "normal",
            Self::Color => "canvastext",
            Self::TextAlign => "start",
            Self::TextOverflow => "clip",
        }
    }

    /// Looks a property up by its CSS name.
    #[must_use]
    pub fn from_css_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.css_name() == name)
    }
}

/// A partial style: values for some subset of [`StyleProp`]s.
///
/// Entries are kept sorted by property for binary search, with a small
/// inline buffer so a calculator's output rarely allocates for the entry
/// list itself.
///
/// # Example
///
/// ```
/// use understory_box_style::{StyleProp, StyleProps};
///
/// let mut size = StyleProps::new();
/// size.set(StyleProp::Width, "100%");
/// size.set(StyleProp::FlexGrow, "0");
///
/// let layout = StyleProps::new().with(StyleProp::FlexGrow, "1");
///
/// // Later records win.
/// size.merge(&layout);
/// assert_eq!(size.get(StyleProp::FlexGrow), Some("1"));
/// assert_eq!(size.get(StyleProp::Width), Some("100%"));
/// assert_eq!(size.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleProps {
    entries: SmallVec<[(StyleProp, String); INLINE_CAPACITY]>,
}

impl StyleProps {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of set properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the value of `prop`, if set.
    #[must_use]
    pub fn get(&self, prop: StyleProp) -> Option<&str> {
        self.entries
            .binary_search_by_key(&prop, |(p, _)| *p)
            .ok()
            .map(|i| self.entries[i].1.as_str())
    }

    /// Sets `prop`, replacing any previous value.
    pub fn set(&mut self, prop: StyleProp, value: impl Into<String>) {
        let value = value.into();
        match self.entries.binary_search_by_key(&prop, |(p, _)| *p) {
            Ok(i) => self.entries[i].1 = value,
            Err(i) => self.entries.insert(i, (prop, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, prop: StyleProp, value: impl Into<String>) -> Self {
        self.set(prop, value);
        self
    }

    /// Unsets `prop`, returning its previous value.
    pub fn remove(&mut self, prop: StyleProp) -> Option<String> {
        self.entries
            .binary_search_by_key(&prop, |(p, _)| *p)
            .ok()
            .map(|i| self.entries.remove(i).1)
    }

    /// Copies every entry of `later` into `self`, overwriting shared keys.
    pub fn merge(&mut self, later: &Self) {
        for (prop, value) in later.iter() {
            self.set(prop, value);
        }
    }

    /// Iterates set properties in [`StyleProp`] order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleProp, &str)> + '_ {
        self.entries.iter().map(|(p, v)| (*p, v.as_str()))
    }
}

impl<V: Into<String>> FromIterator<(StyleProp, V)> for StyleProps {
    fn from_iter<I: IntoIterator<Item = (StyleProp, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (prop, value) in iter {
            props.set(prop, value);
        }
        props
    }
}

/// A live, writable presentation surface, such as a node's inline style.
pub trait StyleSurface {
    /// Returns the committed value of `prop`, if any.
    fn style_value(&self, prop: StyleProp) -> Option<&str>;

    /// Writes `value` to `prop`.
    fn set_style_value(&mut self, prop: StyleProp, value: &str);
}

impl StyleSurface for StyleProps {
    fn style_value(&self, prop: StyleProp) -> Option<&str> {
        self.get(prop)
    }

    fn set_style_value(&mut self, prop: StyleProp, value: &str) {
        self.set(prop, value);
    }
}

/// Outcome of a [`commit`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Properties written because their value differed.
    pub written: usize,
    /// Properties skipped because the surface already held the value.
    pub unchanged: usize,
}

impl CommitStats {
    /// Returns `true` if the commit wrote nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.written == 0
    }
}

/// Writes `candidate` to `surface`, touching only properties that differ.
///
/// An unset surface value compares equal to the empty string. Properties the
/// candidate does not mention are left alone.
///
/// # Example
///
/// ```
/// use understory_box_style::{commit, StyleProp, StyleProps};
///
/// let candidate = StyleProps::new()
///     .with(StyleProp::Display, "flex")
///     .with(StyleProp::Width, "100%");
///
/// let mut live = StyleProps::new().with(StyleProp::Display, "flex");
/// let stats = commit(&candidate, &mut live);
/// assert_eq!((stats.written, stats.unchanged), (1, 1));
///
/// // A second commit of the same candidate is a no-op.
/// assert!(commit(&candidate, &mut live).is_noop());
/// ```
pub fn commit(candidate: &StyleProps, surface: &mut impl StyleSurface) -> CommitStats {
    let mut stats = CommitStats::default();
    for (prop, value) in candidate.iter() {
        let current = surface.style_value(prop).unwrap_or("");
        if current == value {
            stats.unchanged += 1;
        } else {
            surface.set_style_value(prop, value);
            stats.written += 1;
        }
    }
    stats
}
