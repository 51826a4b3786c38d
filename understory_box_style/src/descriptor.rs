// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style descriptor and its value types.

use alloc::string::String;

/// Main layout direction of a box's children.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// Children flow left to right.
    Row,
    /// Children flow top to bottom.
    #[default]
    Column,
}

impl Axis {
    /// Maps a resolved `flex-direction` value onto the two-axis model.
    ///
    /// `column` and `column-reverse` are [`Axis::Column`]; every other value,
    /// including the CSS initial value `row`, is [`Axis::Row`].
    #[must_use]
    pub fn from_flex_direction(value: &str) -> Self {
        match value {
            "column" | "column-reverse" => Self::Column,
            _ => Self::Row,
        }
    }

    /// The `flex-direction` value for this axis.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Column => "column",
        }
    }

    /// The other axis.
    #[must_use]
    pub const fn cross(self) -> Self {
        match self {
            Self::Row => Self::Column,
            Self::Column => Self::Row,
        }
    }
}

/// Horizontal alignment of content.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlignX {
    /// Flush with the left edge.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush with the right edge.
    Right,
}

/// Vertical alignment of content.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlignY {
    /// Flush with the top edge.
    Top,
    /// Centered.
    #[default]
    Center,
    /// Flush with the bottom edge.
    Bottom,
}

/// Two-dimensional alignment of a box's content.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Align {
    /// Horizontal component.
    pub x: AlignX,
    /// Vertical component.
    pub y: AlignY,
}

impl Align {
    /// Centered on both axes. This is the effective alignment when none is set.
    pub const CENTER: Self = Self::new(AlignX::Center, AlignY::Center);
    /// Top-left corner.
    pub const TOP_LEFT: Self = Self::new(AlignX::Left, AlignY::Top);
    /// Top edge, horizontally centered.
    pub const TOP_CENTER: Self = Self::new(AlignX::Center, AlignY::Top);
    /// Bottom-right corner.
    pub const BOTTOM_RIGHT: Self = Self::new(AlignX::Right, AlignY::Bottom);

    /// Creates an alignment from its components.
    #[must_use]
    pub const fn new(x: AlignX, y: AlignY) -> Self {
        Self { x, y }
    }
}

/// How a box is sized along one dimension.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Size {
    /// Wrap the content.
    #[default]
    Shrink,
    /// Expand to fill the available space, sharing it by weight.
    Grow(f32),
    /// A fixed length in pixels.
    Px(f32),
}

impl Size {
    /// Returns `true` for [`Size::Grow`].
    #[must_use]
    pub const fn is_grow(self) -> bool {
        matches!(self, Self::Grow(_))
    }
}

/// What happens to content that does not fit along a dimension.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Overflow {
    /// The box grows with its content; nothing is clipped.
    #[default]
    Forbid,
    /// Overflowing content is clipped.
    Crop,
    /// Overflowing content scrolls.
    Scroll,
    /// Content wraps onto new lines.
    Wrap,
}

/// Overflow policy along x when the descriptor does not set one.
pub const DEFAULT_OVERFLOW_X: Overflow = Overflow::Forbid;

/// Declarative, owner-supplied style configuration for one box.
///
/// Every field is optional; each calculator applies its own default for an
/// absent field. The descriptor is pure data.
///
/// With the `serde` feature, descriptors (de)serialize with camel-cased
/// field names, which is the form used by the `sty` attribute:
///
/// ```json
/// { "width": { "grow": 1 }, "axis": "row", "align": { "x": "left" }, "pad": 8 }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Sty {
    /// Horizontal sizing.
    pub width: Option<Size>,
    /// Vertical sizing.
    pub height: Option<Size>,
    /// Layout direction of the children.
    pub axis: Option<Axis>,
    /// Alignment of the children.
    pub align: Option<Align>,
    /// Uniform padding in pixels.
    pub pad: Option<f32>,
    /// Space between adjacent children in pixels.
    pub gap: Option<f32>,
    /// Horizontal overflow policy.
    pub overflow_x: Option<Overflow>,
    /// Vertical overflow policy.
    pub overflow_y: Option<Overflow>,
    /// Background color, any CSS color.
    pub background: Option<String>,
    /// Corner radius in pixels.
    pub corner_radius: Option<f32>,
    /// Outline color, any CSS color.
    pub outline_color: Option<String>,
    /// Outline thickness in pixels, drawn inside the box.
    pub outline_size: Option<f32>,
    /// Font size in pixels.
    pub text_size: Option<f32>,
    /// Text color, any CSS color.
    pub text_color: Option<String>,
    /// Bold text.
    pub text_is_bold: Option<bool>,
    /// Italic text.
    pub text_is_italic: Option<bool>,
    /// Marks the box as clickable.
    pub interactive: Option<bool>,
    /// Whether the box receives pointer events at all.
    pub pointer_events: Option<bool>,
}

impl Sty {
    /// The layout direction of the children, [`Axis::Column`] when unset.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis.unwrap_or_default()
    }

    /// The effective alignment, [`Align::CENTER`] when unset.
    #[must_use]
    pub fn align(&self) -> Align {
        self.align.unwrap_or(Align::CENTER)
    }

    /// The effective horizontal overflow policy.
    #[must_use]
    pub fn overflow_x(&self) -> Overflow {
        self.overflow_x.unwrap_or(DEFAULT_OVERFLOW_X)
    }

    /// The effective vertical overflow policy.
    #[must_use]
    pub fn overflow_y(&self) -> Overflow {
        self.overflow_y.unwrap_or_default()
    }
}
