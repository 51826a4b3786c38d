// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Auto Box: layout boxes that style themselves.
//!
//! A [`BoxNode`] derives its inline style from three inputs:
//!
//! - its owner's descriptor ([`Sty`](understory_box_style::Sty)), set
//!   directly or through the JSON `sty` attribute;
//! - its parent's resolved `flex-direction` and paddings;
//! - whether any of its direct box children grows along each dimension.
//!
//! Each input has its own watcher. When a watcher fires, the box re-reads
//! that input, compares it with its cached [`Environment`], and only on a
//! difference recomputes its style through the
//! [`StyleCalculators`](understory_box_style::StyleCalculators). The commit
//! writes only properties whose value changed, and the host only reports
//! effective changes, so passes are idempotent and cascades between parents
//! and children settle.
//!
//! The crate also provides the pieces a box needs from its host:
//!
//! - [`Document`]: an in-memory presentation tree with inline styles,
//!   attributes, a resolved-style query and mutation reporting into a
//!   [`WatchRegistry`](understory_watch::WatchRegistry).
//! - [`ElementRegistry`]: an explicit tag → factory table.
//! - [`Runtime`]: upgrades elements, runs lifecycle reactions, and delivers
//!   watcher batches on [`flush`](Runtime::flush).
//!
//! ```rust
//! use understory_auto_box::{BOX_TAG, BoxNode, ElementRegistry, Runtime};
//! use understory_box_style::{Axis, StyleProp};
//!
//! let mut registry = ElementRegistry::new();
//! BoxNode::register(&mut registry).unwrap();
//! let mut rt = Runtime::new(registry);
//!
//! let root = rt.document().root();
//! let row = rt.create_element(BOX_TAG);
//! rt.set_attribute(row, "sty", r#"{ "axis": "row", "pad": 8 }"#).unwrap();
//! let cell = rt.create_element(BOX_TAG);
//! rt.set_attribute(cell, "sty", r#"{ "width": { "grow": 1 } }"#).unwrap();
//!
//! rt.append_child(root, row).unwrap();
//! rt.append_child(row, cell).unwrap();
//! rt.flush().unwrap();
//!
//! let doc = rt.document();
//! assert_eq!(doc.inline_style(row, StyleProp::PaddingLeft), Some("8px"));
//! assert_eq!(doc.inline_style(cell, StyleProp::FlexGrow), Some("1"));
//!
//! let cell_box = rt.element::<BoxNode>(cell).unwrap();
//! assert_eq!(cell_box.parent_axis(), Axis::Row);
//! assert_eq!(cell_box.parent_padding().left, "8px");
//! // The growing cell makes the row report a growing child.
//! assert!(rt.element::<BoxNode>(row).unwrap().child_grows_width());
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `debug` for lifecycle changes,
//! `trace` for resolution passes, `warn` for rejected descriptors and
//! runaway flushes. No subscriber is installed.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod document;
mod element;
mod node;
mod registry;
mod runtime;

pub use document::{
    Document, DocumentError, NodeId, NodeStyle, ROOT_TAG, Reaction, STYLE_ATTRIBUTE,
};
pub use element::{CustomElement, ElementCx};
pub use node::{
    BOX_TAG, BoxNode, BoxOptions, DescriptorError, Environment, ParentRecompute, STY_ATTRIBUTE,
    parse_sty,
};
pub use registry::{ElementFactory, ElementRegistry, ElementRegistryError};
pub use runtime::{FlushStats, Runtime, RuntimeConfig, RuntimeError};
