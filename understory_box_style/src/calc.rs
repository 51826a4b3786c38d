// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style calculators: pure transforms from a descriptor plus context to a
//! partial style.

use alloc::format;
use alloc::string::String;

use crate::descriptor::{Align, AlignX, AlignY, Axis, Overflow, Size, Sty};
use crate::props::{StyleProp, StyleProps};

/// Resolved padding lengths of a box's parent, as CSS length strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Insets {
    /// Top padding.
    pub top: String,
    /// Right padding.
    pub right: String,
    /// Bottom padding.
    pub bottom: String,
    /// Left padding.
    pub left: String,
}

impl Default for Insets {
    fn default() -> Self {
        Self {
            top: String::from("0px"),
            right: String::from("0px"),
            bottom: String::from("0px"),
            left: String::from("0px"),
        }
    }
}

/// The five style-domain calculators consumed by a box.
///
/// Implementations must be total: an absent or unrecognized descriptor field
/// yields the calculator's default or no property at all, never a failure.
/// Outputs are merged in the order size, layout, decoration, text,
/// interaction, with later outputs overwriting earlier ones.
pub trait StyleCalculators {
    /// Size and flex participation of the box inside its parent.
    fn size(
        &self,
        sty: &Sty,
        child_grows_width: bool,
        child_grows_height: bool,
        parent_axis: Axis,
        parent_padding: &Insets,
    ) -> StyleProps;

    /// Flex container layout of the box's own children.
    fn layout(
        &self,
        sty: &Sty,
        align: Align,
        parent_axis: Axis,
        axis: Axis,
        child_count: usize,
    ) -> StyleProps;

    /// Background, corners and outline.
    fn decoration(&self, sty: &Sty) -> StyleProps;

    /// Typography.
    fn text(&self, sty: &Sty, align_x: AlignX, overflow_x: Overflow) -> StyleProps;

    /// Pointer and selection behavior.
    fn interaction(&self, sty: &Sty) -> StyleProps;
}

/// The built-in calculators for the [`Sty`] vocabulary.
///
/// Sizing follows flexbox along the parent's axis:
///
/// | size | parent main axis | parent cross axis |
/// | --- | --- | --- |
/// | `Grow(w)` | `flex-basis: 0px`, `flex-grow: w` | `100%` |
/// | `Px(n)` | `n px`, rigid | `n px` |
/// | `Shrink` | `fit-content`, rigid | `fit-content` |
///
/// A shrinking box with a growing child grows itself, so growth bubbles up
/// through shrink-wrapped ancestors.
///
/// The parent padding passed to [`size`](StyleCalculators::size) is not
/// used here: the vocabulary has no padding-relative sizes, and cross-axis
/// `100%` already resolves against the parent's content box under
/// `box-sizing: border-box`. A parent padding change therefore reruns the
/// pass without writing anything. Calculators that need the padding get it
/// through the same channel.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultCalculators;

/// Default font size in pixels.
const DEFAULT_TEXT_SIZE: f32 = 16.0;

fn px(value: f32) -> String {
    format!("{value}px")
}

fn overflow_css(overflow: Overflow) -> &'static str {
    match overflow {
        Overflow::Forbid | Overflow::Wrap => "visible",
        Overflow::Crop => "hidden",
        Overflow::Scroll => "auto",
    }
}

fn justify_x(x: AlignX) -> &'static str {
    match x {
        AlignX::Left => "flex-start",
        AlignX::Center => "center",
        AlignX::Right => "flex-end",
    }
}

fn justify_y(y: AlignY) -> &'static str {
    match y {
        AlignY::Top => "flex-start",
        AlignY::Center => "center",
        AlignY::Bottom => "flex-end",
    }
}

/// Writes the size of one dimension. `main` tells whether that dimension is
/// the parent's main axis.
fn size_dimension(out: &mut StyleProps, size: Size, dim: StyleProp, main: bool) {
    match (size, main) {
        (Size::Grow(weight), true) => {
            out.set(dim, "auto");
            out.set(StyleProp::FlexBasis, "0px");
            out.set(StyleProp::FlexGrow, format!("{weight}"));
            out.set(StyleProp::FlexShrink, "1");
        }
        (Size::Grow(_), false) => out.set(dim, "100%"),
        (Size::Px(n), true) => {
            out.set(dim, px(n));
            out.set(StyleProp::FlexBasis, "auto");
            out.set(StyleProp::FlexGrow, "0");
            out.set(StyleProp::FlexShrink, "0");
        }
        (Size::Px(n), false) => out.set(dim, px(n)),
        (Size::Shrink, true) => {
            out.set(dim, "fit-content");
            out.set(StyleProp::FlexBasis, "auto");
            out.set(StyleProp::FlexGrow, "0");
            out.set(StyleProp::FlexShrink, "0");
        }
        (Size::Shrink, false) => out.set(dim, "fit-content"),
    }
}

impl StyleCalculators for DefaultCalculators {
    fn size(
        &self,
        sty: &Sty,
        child_grows_width: bool,
        child_grows_height: bool,
        parent_axis: Axis,
        _parent_padding: &Insets,
    ) -> StyleProps {
        let effective = |size: Option<Size>, child_grows: bool| match size.unwrap_or_default() {
            Size::Shrink if child_grows => Size::Grow(1.0),
            other => other,
        };
        let width = effective(sty.width, child_grows_width);
        let height = effective(sty.height, child_grows_height);

        let mut out = StyleProps::new().with(StyleProp::BoxSizing, "border-box");
        size_dimension(&mut out, width, StyleProp::Width, parent_axis == Axis::Row);
        size_dimension(&mut out, height, StyleProp::Height, parent_axis == Axis::Column);
        out.set(StyleProp::MaxWidth, "100%");
        out.set(StyleProp::MaxHeight, "100%");
        out
    }

    fn layout(
        &self,
        sty: &Sty,
        align: Align,
        parent_axis: Axis,
        axis: Axis,
        child_count: usize,
    ) -> StyleProps {
        let (justify, items) = match axis {
            Axis::Row => (justify_x(align.x), justify_y(align.y)),
            Axis::Column => (justify_y(align.y), justify_x(align.x)),
        };
        let pad = px(sty.pad.unwrap_or(0.0));
        let gap = if child_count > 1 {
            px(sty.gap.unwrap_or(0.0))
        } else {
            String::from("0px")
        };
        let overflow_x = sty.overflow_x();
        let overflow_y = sty.overflow_y();
        let main_overflow = match axis {
            Axis::Row => overflow_x,
            Axis::Column => overflow_y,
        };

        let mut out = StyleProps::new()
            .with(StyleProp::Display, "flex")
            .with(StyleProp::FlexDirection, axis.as_css())
            .with(
                StyleProp::FlexWrap,
                if main_overflow == Overflow::Wrap { "wrap" } else { "nowrap" },
            )
            .with(StyleProp::JustifyContent, justify)
            .with(StyleProp::AlignItems, items)
            .with(StyleProp::Gap, gap)
            .with(StyleProp::PaddingTop, pad.clone())
            .with(StyleProp::PaddingRight, pad.clone())
            .with(StyleProp::PaddingBottom, pad.clone())
            .with(StyleProp::PaddingLeft, pad)
            .with(StyleProp::OverflowX, overflow_css(overflow_x))
            .with(StyleProp::OverflowY, overflow_css(overflow_y));

        // A flex item only shrinks below its content along the parent's main
        // axis when its automatic minimum size is lifted.
        let (parent_main_overflow, min_dim) = match parent_axis {
            Axis::Row => (overflow_x, StyleProp::MinWidth),
            Axis::Column => (overflow_y, StyleProp::MinHeight),
        };
        if matches!(parent_main_overflow, Overflow::Crop | Overflow::Scroll) {
            out.set(min_dim, "0px");
        }
        out
    }

    fn decoration(&self, sty: &Sty) -> StyleProps {
        let outline_size = sty.outline_size.unwrap_or(0.0);
        let mut out = StyleProps::new()
            .with(
                StyleProp::BackgroundColor,
                sty.background.as_deref().unwrap_or("transparent"),
            )
            .with(StyleProp::BorderRadius, px(sty.corner_radius.unwrap_or(0.0)));
        if outline_size > 0.0 {
            let color = sty.outline_color.as_deref().unwrap_or("black");
            out.set(StyleProp::Outline, format!("{} solid {color}", px(outline_size)));
            out.set(StyleProp::OutlineOffset, px(-outline_size));
        } else {
            out.set(StyleProp::Outline, "none");
            out.set(StyleProp::OutlineOffset, "0px");
        }
        out
    }

    fn text(&self, sty: &Sty, align_x: AlignX, overflow_x: Overflow) -> StyleProps {
        let text_align = match align_x {
            AlignX::Left => "left",
            AlignX::Center => "center",
            AlignX::Right => "right",
        };
        StyleProps::new()
            .with(StyleProp::FontSize, px(sty.text_size.unwrap_or(DEFAULT_TEXT_SIZE)))
            .with(StyleProp::Color, sty.text_color.as_deref().unwrap_or("inherit"))
            .with(
                StyleProp::FontWeight,
                if sty.text_is_bold == Some(true) { "bold" } else { "normal" },
            )
            .with(
                StyleProp::FontStyle,
                if sty.text_is_italic == Some(true) { "italic" } else { "normal" },
            )
            .with(StyleProp::TextAlign, text_align)
            .with(
                StyleProp::WhiteSpace,
                if overflow_x == Overflow::Wrap { "normal" } else { "nowrap" },
            )
            .with(
                StyleProp::TextOverflow,
                if overflow_x == Overflow::Crop { "ellipsis" } else { "clip" },
            )
    }

    fn interaction(&self, sty: &Sty) -> StyleProps {
        let interactive = sty.interactive == Some(true);
        StyleProps::new()
            .with(StyleProp::Cursor, if interactive { "pointer" } else { "default" })
            .with(StyleProp::UserSelect, if interactive { "none" } else { "auto" })
            .with(
                StyleProp::PointerEvents,
                if sty.pointer_events == Some(false) { "none" } else { "auto" },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_of(sty: &Sty, grows: (bool, bool), parent_axis: Axis) -> StyleProps {
        DefaultCalculators.size(sty, grows.0, grows.1, parent_axis, &Insets::default())
    }

    #[test]
    fn grow_uses_flex_basis_on_parent_main_axis() {
        let sty = Sty {
            width: Some(Size::Grow(2.0)),
            ..Sty::default()
        };
        let out = size_of(&sty, (false, false), Axis::Row);
        assert_eq!(out.get(StyleProp::FlexBasis), Some("0px"));
        assert_eq!(out.get(StyleProp::FlexGrow), Some("2"));
        assert_eq!(out.get(StyleProp::Width), Some("auto"));
        assert_eq!(out.get(StyleProp::Height), Some("fit-content"));
    }

    #[test]
    fn grow_fills_parent_cross_axis() {
        let sty = Sty {
            width: Some(Size::Grow(1.0)),
            ..Sty::default()
        };
        let out = size_of(&sty, (false, false), Axis::Column);
        assert_eq!(out.get(StyleProp::Width), Some("100%"));
        assert_eq!(out.get(StyleProp::FlexBasis), Some("auto"));
    }

    #[test]
    fn growing_child_makes_shrinking_box_grow() {
        let sty = Sty::default();
        let rigid = size_of(&sty, (false, false), Axis::Column);
        assert_eq!(rigid.get(StyleProp::Height), Some("fit-content"));

        let grown = size_of(&sty, (false, true), Axis::Column);
        assert_eq!(grown.get(StyleProp::FlexBasis), Some("0px"));
        assert_eq!(grown.get(StyleProp::Height), Some("auto"));
    }

    #[test]
    fn fixed_size_is_rigid() {
        let sty = Sty {
            width: Some(Size::Px(40.0)),
            height: Some(Size::Px(12.5)),
            ..Sty::default()
        };
        let out = size_of(&sty, (true, true), Axis::Row);
        assert_eq!(out.get(StyleProp::Width), Some("40px"));
        assert_eq!(out.get(StyleProp::Height), Some("12.5px"));
        assert_eq!(out.get(StyleProp::FlexShrink), Some("0"));
    }

    #[test]
    fn layout_maps_alignment_through_axis() {
        let sty = Sty::default();
        let align = Align::new(AlignX::Left, AlignY::Bottom);

        let row = DefaultCalculators.layout(&sty, align, Axis::Column, Axis::Row, 0);
        assert_eq!(row.get(StyleProp::JustifyContent), Some("flex-start"));
        assert_eq!(row.get(StyleProp::AlignItems), Some("flex-end"));
        assert_eq!(row.get(StyleProp::FlexDirection), Some("row"));

        let column = DefaultCalculators.layout(&sty, align, Axis::Column, Axis::Column, 0);
        assert_eq!(column.get(StyleProp::JustifyContent), Some("flex-end"));
        assert_eq!(column.get(StyleProp::AlignItems), Some("flex-start"));
    }

    #[test]
    fn gap_needs_two_children() {
        let sty = Sty {
            gap: Some(6.0),
            ..Sty::default()
        };
        let one = DefaultCalculators.layout(&sty, Align::CENTER, Axis::Column, Axis::Row, 1);
        let two = DefaultCalculators.layout(&sty, Align::CENTER, Axis::Column, Axis::Row, 2);
        assert_eq!(one.get(StyleProp::Gap), Some("0px"));
        assert_eq!(two.get(StyleProp::Gap), Some("6px"));
    }

    #[test]
    fn scrolling_along_parent_axis_lifts_min_size() {
        let sty = Sty {
            overflow_y: Some(Overflow::Scroll),
            ..Sty::default()
        };
        let out = DefaultCalculators.layout(&sty, Align::CENTER, Axis::Column, Axis::Column, 0);
        assert_eq!(out.get(StyleProp::OverflowY), Some("auto"));
        assert_eq!(out.get(StyleProp::MinHeight), Some("0px"));
        assert_eq!(out.get(StyleProp::MinWidth), None);
    }

    #[test]
    fn outline_is_drawn_inside() {
        let sty = Sty {
            outline_size: Some(2.0),
            outline_color: Some(String::from("red")),
            ..Sty::default()
        };
        let out = DefaultCalculators.decoration(&sty);
        assert_eq!(out.get(StyleProp::Outline), Some("2px solid red"));
        assert_eq!(out.get(StyleProp::OutlineOffset), Some("-2px"));
        assert_eq!(out.get(StyleProp::BackgroundColor), Some("transparent"));
    }

    #[test]
    fn text_follows_overflow_policy() {
        let sty = Sty::default();
        let wrap = DefaultCalculators.text(&sty, AlignX::Right, Overflow::Wrap);
        assert_eq!(wrap.get(StyleProp::WhiteSpace), Some("normal"));
        assert_eq!(wrap.get(StyleProp::TextAlign), Some("right"));
        assert_eq!(wrap.get(StyleProp::FontSize), Some("16px"));

        let crop = DefaultCalculators.text(&sty, AlignX::Center, Overflow::Crop);
        assert_eq!(crop.get(StyleProp::WhiteSpace), Some("nowrap"));
        assert_eq!(crop.get(StyleProp::TextOverflow), Some("ellipsis"));
    }

    #[test]
    fn interaction_defaults() {
        let out = DefaultCalculators.interaction(&Sty::default());
        assert_eq!(out.get(StyleProp::Cursor), Some("default"));
        assert_eq!(out.get(StyleProp::PointerEvents), Some("auto"));

        let clickable = Sty {
            interactive: Some(true),
            pointer_events: Some(false),
            ..Sty::default()
        };
        let out = DefaultCalculators.interaction(&clickable);
        assert_eq!(out.get(StyleProp::Cursor), Some("pointer"));
        assert_eq!(out.get(StyleProp::UserSelect), Some("none"));
        assert_eq!(out.get(StyleProp::PointerEvents), Some("none"));
    }

    #[test]
    fn size_ignores_parent_padding() {
        let sty = Sty {
            width: Some(Size::Grow(1.0)),
            ..Sty::default()
        };
        let padded = Insets {
            left: String::from("8px"),
            right: String::from("8px"),
            ..Insets::default()
        };
        let plain = DefaultCalculators.size(&sty, false, false, Axis::Column, &Insets::default());
        let with_padding = DefaultCalculators.size(&sty, false, false, Axis::Column, &padded);
        assert_eq!(plain, with_padding);
    }
}
