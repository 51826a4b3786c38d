// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Custom element behavior and the context handed to its callbacks.

use alloc::boxed::Box;
use core::any::Any;

use hashbrown::HashMap;
use understory_watch::{MutationRecord, WatchRegistry, WatcherId};

use crate::document::{Document, NodeId};

/// Behavior attached to an element by the [`Runtime`](crate::Runtime).
///
/// Every callback runs to completion synchronously. Callbacks receive an
/// [`ElementCx`] scoped to the element's node; that is the only way an
/// element reads or writes the document.
pub trait CustomElement: Any {
    /// The element became part of the connected tree.
    fn on_attach(&mut self, cx: &mut ElementCx<'_>);

    /// The element left the connected tree.
    fn on_detach(&mut self, cx: &mut ElementCx<'_>);

    /// One of the element's observed attributes changed.
    ///
    /// Only attributes listed at registration are reported.
    fn attribute_changed(
        &mut self,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
        cx: &mut ElementCx<'_>,
    ) {
        let _ = (name, old, new, cx);
    }

    /// A batch of records for one of the element's watchers.
    ///
    /// Watchers are created with [`ElementCx::create_watcher`]; a batch may
    /// carry several records and the element should consider all of them.
    fn on_mutations(
        &mut self,
        watcher: WatcherId,
        records: &[MutationRecord<NodeId>],
        cx: &mut ElementCx<'_>,
    ) {
        let _ = (watcher, records, cx);
    }
}

/// Access to the document from inside an element callback.
///
/// While a callback runs, the element itself is checked out of the runtime,
/// so [`instance`](Self::instance) never returns the calling element.
pub struct ElementCx<'a> {
    node: NodeId,
    document: &'a mut Document,
    instances: &'a HashMap<NodeId, Box<dyn CustomElement>>,
    watch_owners: &'a mut HashMap<WatcherId, NodeId>,
}

impl core::fmt::Debug for ElementCx<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElementCx")
            .field("node", &self.node)
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}

impl<'a> ElementCx<'a> {
    pub(crate) fn new(
        node: NodeId,
        document: &'a mut Document,
        instances: &'a HashMap<NodeId, Box<dyn CustomElement>>,
        watch_owners: &'a mut HashMap<WatcherId, NodeId>,
    ) -> Self {
        Self {
            node,
            document,
            instances,
            watch_owners,
        }
    }

    /// The node of the element being called.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The host document.
    #[must_use]
    pub fn document(&self) -> &Document {
        self.document
    }

    /// Mutable access to the host document.
    pub fn document_mut(&mut self) -> &mut Document {
        self.document
    }

    /// The watch registry of the host document.
    pub fn watches_mut(&mut self) -> &mut WatchRegistry<NodeId> {
        self.document.watches_mut()
    }

    /// Creates a watcher whose batches are delivered to this element.
    pub fn create_watcher(&mut self) -> WatcherId {
        let watcher = self.document.watches_mut().create();
        self.watch_owners.insert(watcher, self.node);
        watcher
    }

    /// Returns the element instance on `node` if it is a `T`.
    #[must_use]
    pub fn instance<T: CustomElement>(&self, node: NodeId) -> Option<&T> {
        let element: &dyn Any = &**self.instances.get(&node)?;
        element.downcast_ref()
    }
}
