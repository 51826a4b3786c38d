// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Watch: host-agnostic mutation watchers with batched delivery.
//!
//! This crate is a small, explicit replacement for platform observation APIs
//! (such as the web's `MutationObserver`). A host owns a [`WatchRegistry`] and
//! reports every *effective* mutation of its nodes to it. Watchers subscribe
//! to specific targets with [`WatchOptions`] and receive their matching
//! [`MutationRecord`]s in batches.
//!
//! - [`WatcherId`]: generational handle of a watcher.
//! - [`WatchKinds`] / [`WatchOptions`]: attribute and child list interest, with an
//!   optional attribute-name filter.
//! - [`MutationRecord`] / [`MutationKind`]: what changed, and where.
//! - [`WatchRegistry`]: target → watcher index, per-watcher pending queues.
//!
//! ## Delivery model
//!
//! Notification and delivery are decoupled. [`WatchRegistry::notify`] only
//! queues; the host decides when to drain with [`WatchRegistry::take_batch`].
//! A single batch may carry several records, so consumers must iterate all
//! records of interest rather than reacting to the first one.
//!
//! The registry never filters out no-op mutations. Hosts must only notify
//! when a value actually changed; that is what keeps observers that write to
//! the nodes they watch from feeding back into themselves.
//!
//! ```rust
//! use understory_watch::{MutationRecord, WatchOptions, WatchRegistry};
//!
//! let mut watches = WatchRegistry::<u32>::new();
//! let children = watches.create();
//! watches.observe(children, 10, WatchOptions::child_list());
//!
//! watches.notify(MutationRecord::child_list(10, [11], []));
//! watches.notify(MutationRecord::child_list(10, [12], []));
//!
//! let (watcher, batch) = watches.take_batch().unwrap();
//! assert_eq!(watcher, children);
//! assert_eq!(batch.len(), 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod options;
mod record;
mod registry;

pub use options::{WatchKinds, WatchOptions};
pub use record::{MutationKind, MutationRecord};
pub use registry::{WatchRegistry, WatcherId};
