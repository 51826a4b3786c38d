// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Box Style: descriptors, typed style records and calculators for
//! auto-sizing boxes.
//!
//! This crate holds the pure, stateless half of the auto box:
//!
//! - [`Sty`]: the declarative, partial style descriptor an owner attaches to a
//!   box, with its value types ([`Size`], [`Axis`], [`Align`], [`Overflow`]).
//! - [`StyleProp`] / [`StyleProps`]: a closed set of presentation properties and
//!   a partial record of values for them.
//! - [`StyleSurface`] and [`commit`]: the per-property diff-and-assign step that
//!   writes only values that changed.
//! - [`StyleCalculators`]: the five style-domain transforms (size, layout,
//!   decoration, text, interaction), with [`DefaultCalculators`] as the
//!   built-in implementation.
//!
//! Observation, caching and deciding *when* to recompute live in
//! `understory_auto_box`.
//!
//! ```rust
//! use understory_box_style::{
//!     commit, Axis, DefaultCalculators, Insets, Size, StyleCalculators, StyleProp, StyleProps,
//!     Sty,
//! };
//!
//! let sty = Sty { width: Some(Size::Grow(1.0)), axis: Some(Axis::Row), ..Sty::default() };
//! let calc = DefaultCalculators;
//!
//! let mut candidate = calc.size(&sty, false, false, Axis::Column, &Insets::default());
//! candidate.merge(&calc.layout(&sty, sty.align(), Axis::Column, sty.axis(), 0));
//! assert_eq!(candidate.get(StyleProp::Width), Some("100%"));
//! assert_eq!(candidate.get(StyleProp::FlexDirection), Some("row"));
//!
//! let mut live = StyleProps::new();
//! assert_eq!(commit(&candidate, &mut live).written, candidate.len());
//! assert!(commit(&candidate, &mut live).is_noop());
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`Sty`] and its value types.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod calc;
mod descriptor;
mod props;

pub use calc::{DefaultCalculators, Insets, StyleCalculators};
pub use descriptor::{Align, AlignX, AlignY, Axis, DEFAULT_OVERFLOW_X, Overflow, Size, Sty};
pub use props::{CommitStats, StyleProp, StyleProps, StyleSurface, commit};
