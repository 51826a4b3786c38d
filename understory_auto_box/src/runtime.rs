// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hosting runtime: element upgrades, lifecycle reactions and watcher
//! delivery.

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use hashbrown::HashMap;
use understory_box_style::StyleProp;
use understory_watch::WatcherId;

use crate::document::{Document, DocumentError, NodeId, Reaction};
use crate::element::{CustomElement, ElementCx};
use crate::registry::ElementRegistry;

/// Runtime configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Upper bound on watcher batches delivered by one [`Runtime::flush`].
    ///
    /// Diffed commits make well-behaved element trees converge quickly; the
    /// bound turns a cascade that never settles into an error.
    pub max_flush_rounds: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_rounds: 4096,
        }
    }
}

impl RuntimeConfig {
    /// Sets [`max_flush_rounds`](Self::max_flush_rounds).
    #[must_use]
    pub fn with_max_flush_rounds(mut self, rounds: usize) -> Self {
        self.max_flush_rounds = rounds;
        self
    }
}

/// Errors from [`Runtime`] operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    /// A document operation failed.
    Document(DocumentError),
    /// [`Runtime::flush`] delivered this many batches without settling.
    FlushLimitExceeded {
        /// The configured limit that was hit.
        rounds: usize,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(err) => write!(f, "document error: {err}"),
            Self::FlushLimitExceeded { rounds } => {
                write!(f, "mutations did not settle after {rounds} batches")
            }
        }
    }
}

impl core::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::FlushLimitExceeded { .. } => None,
        }
    }
}

impl From<DocumentError> for RuntimeError {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

/// What one [`Runtime::flush`] delivered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Lifecycle reactions run.
    pub reactions: usize,
    /// Watcher batches delivered.
    pub batches: usize,
    /// Mutation records across all batches.
    pub records: usize,
}

/// Owns a [`Document`], an [`ElementRegistry`] and the element instances
/// living in the document.
///
/// Two queues drive elements:
///
/// - Lifecycle reactions (attach, detach, observed attribute changes) run
///   synchronously at the end of every runtime-level document operation,
///   and at the start of every [`flush`](Self::flush) step.
/// - Watcher batches are delivered by [`flush`](Self::flush), the runtime's
///   checkpoint, until no batch is left.
///
/// Elements whose tag is registered are upgraded (constructed) when they are
/// created through the runtime, or when they first connect.
///
/// # Example
///
/// ```
/// use understory_auto_box::{BOX_TAG, BoxNode, ElementRegistry, Runtime};
///
/// let mut registry = ElementRegistry::new();
/// BoxNode::register(&mut registry).unwrap();
/// let mut rt = Runtime::new(registry);
///
/// let root = rt.document().root();
/// let outer = rt.create_element(BOX_TAG);
/// let inner = rt.create_element(BOX_TAG);
/// rt.append_child(root, outer).unwrap();
/// rt.append_child(outer, inner).unwrap();
/// rt.flush().unwrap();
///
/// assert_eq!(rt.element::<BoxNode>(outer).unwrap().child_count(), 1);
/// // Nothing is left to do once the tree has settled.
/// assert_eq!(rt.flush().unwrap().batches, 0);
/// ```
pub struct Runtime {
    document: Document,
    registry: ElementRegistry,
    instances: HashMap<NodeId, Box<dyn CustomElement>>,
    watch_owners: HashMap<WatcherId, NodeId>,
    config: RuntimeConfig,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("document", &self.document)
            .field("registry", &self.registry)
            .field("instances", &self.instances.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Creates a runtime over an empty document.
    #[must_use]
    pub fn new(registry: ElementRegistry) -> Self {
        Self::with_config(registry, RuntimeConfig::default())
    }

    /// Creates a runtime with an explicit configuration.
    #[must_use]
    pub fn with_config(registry: ElementRegistry, config: RuntimeConfig) -> Self {
        Self {
            document: Document::new(),
            registry,
            instances: HashMap::new(),
            watch_owners: HashMap::new(),
            config,
        }
    }

    /// The hosted document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Raw mutable access to the document.
    ///
    /// Reactions caused through this handle run at the next runtime-level
    /// operation or [`flush`](Self::flush).
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The element registry.
    #[must_use]
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    /// Creates an element, upgrading it right away if its tag is defined.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let node = self.document.create_element(tag);
        self.upgrade(node);
        node
    }

    /// Creates a text node.
    pub fn create_text(&mut self) -> NodeId {
        self.document.create_text()
    }

    /// [`Document::append_child`], then runs reactions.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RuntimeError> {
        self.document.append_child(parent, child)?;
        self.run_reactions();
        Ok(())
    }

    /// [`Document::insert_before`], then runs reactions.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), RuntimeError> {
        self.document.insert_before(parent, child, reference)?;
        self.run_reactions();
        Ok(())
    }

    /// [`Document::remove_child`], then runs reactions.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RuntimeError> {
        self.document.remove_child(parent, child)?;
        self.run_reactions();
        Ok(())
    }

    /// [`Document::set_attribute`], then runs reactions.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<bool, RuntimeError> {
        let changed = self.document.set_attribute(node, name, value)?;
        self.run_reactions();
        Ok(changed)
    }

    /// [`Document::set_style`]. Style writes cause no reactions.
    pub fn set_style(
        &mut self,
        node: NodeId,
        prop: StyleProp,
        value: &str,
    ) -> Result<bool, RuntimeError> {
        Ok(self.document.set_style(node, prop, value)?)
    }

    /// Returns the element instance on `node` if it is a `T`.
    #[must_use]
    pub fn element<T: CustomElement>(&self, node: NodeId) -> Option<&T> {
        let element: &dyn Any = &**self.instances.get(&node)?;
        element.downcast_ref()
    }

    /// Runs `f` on the element on `node` with a callback context.
    ///
    /// Returns `None` if there is no element of type `T` on `node`.
    pub fn with_element<T: CustomElement, R>(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut T, &mut ElementCx<'_>) -> R,
    ) -> Option<R> {
        let mut out = None;
        self.dispatch(node, |element, cx| {
            let element: &mut dyn Any = &mut **element;
            if let Some(element) = element.downcast_mut::<T>() {
                out = Some(f(element, cx));
            }
        });
        out
    }

    /// Runs reactions and delivers watcher batches until both queues are
    /// empty.
    ///
    /// Batches for watchers that no element owns are discarded.
    pub fn flush(&mut self) -> Result<FlushStats, RuntimeError> {
        let mut stats = FlushStats::default();
        loop {
            stats.reactions += self.run_reactions();
            let Some((watcher, records)) = self.document.watches_mut().take_batch() else {
                break;
            };
            if stats.batches == self.config.max_flush_rounds {
                tracing::warn!(
                    rounds = self.config.max_flush_rounds,
                    "flush limit exceeded; dropping remaining mutations"
                );
                return Err(RuntimeError::FlushLimitExceeded {
                    rounds: self.config.max_flush_rounds,
                });
            }
            stats.batches += 1;
            stats.records += records.len();
            let Some(&owner) = self.watch_owners.get(&watcher) else {
                continue;
            };
            self.dispatch(owner, |element, cx| element.on_mutations(watcher, &records, cx));
        }
        tracing::trace!(
            reactions = stats.reactions,
            batches = stats.batches,
            records = stats.records,
            "flushed"
        );
        Ok(stats)
    }

    /// Runs pending lifecycle reactions; returns how many ran.
    fn run_reactions(&mut self) -> usize {
        let mut count = 0;
        while let Some(reaction) = self.document.take_reaction() {
            count += 1;
            match reaction {
                Reaction::Connected(node) => {
                    self.upgrade(node);
                    self.dispatch(node, |element, cx| element.on_attach(cx));
                }
                Reaction::Disconnected(node) => {
                    self.dispatch(node, |element, cx| element.on_detach(cx));
                }
                Reaction::AttributeChanged {
                    node,
                    name,
                    old,
                    new,
                } => {
                    if !self.observes(node, &name) {
                        continue;
                    }
                    self.dispatch(node, |element, cx| {
                        element.attribute_changed(&name, old.as_deref(), new.as_deref(), cx);
                    });
                }
            }
        }
        count
    }

    /// Constructs the element for `node` if its tag is defined and it has no
    /// instance yet. Attributes present at that point are reported as
    /// changes from absent.
    fn upgrade(&mut self, node: NodeId) {
        if self.instances.contains_key(&node) {
            return;
        }
        let Some(tag) = self.document.tag(node) else {
            return;
        };
        let Some(element) = self.registry.construct(tag) else {
            return;
        };
        let observed = self.registry.observed_attributes(tag);
        tracing::debug!(node = %node, tag, "upgraded element");
        self.instances.insert(node, element);
        for name in observed {
            let Some(value) = self.document.attribute(node, name).map(alloc::string::String::from)
            else {
                continue;
            };
            self.dispatch(node, |element, cx| {
                element.attribute_changed(name, None, Some(&value), cx);
            });
        }
    }

    fn observes(&self, node: NodeId, name: &str) -> bool {
        self.document
            .tag(node)
            .is_some_and(|tag| self.registry.observed_attributes(tag).contains(&name))
    }

    /// Checks the element on `node` out, calls `f`, and checks it back in.
    fn dispatch(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut Box<dyn CustomElement>, &mut ElementCx<'_>),
    ) {
        let Some(mut element) = self.instances.remove(&node) else {
            return;
        };
        let mut cx = ElementCx::new(
            node,
            &mut self.document,
            &self.instances,
            &mut self.watch_owners,
        );
        f(&mut element, &mut cx);
        self.instances.insert(node, element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use understory_watch::{MutationRecord, WatchOptions};

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records callbacks and echoes child list batches.
    struct Recorder {
        log: Log,
        watcher: Option<WatcherId>,
    }

    impl CustomElement for Recorder {
        fn on_attach(&mut self, cx: &mut ElementCx<'_>) {
            self.log.borrow_mut().push(alloc::format!("attach {}", cx.node()));
            let watcher = *self.watcher.get_or_insert_with(|| cx.create_watcher());
            let node = cx.node();
            cx.watches_mut().observe(watcher, node, WatchOptions::child_list());
        }

        fn on_detach(&mut self, cx: &mut ElementCx<'_>) {
            self.log.borrow_mut().push(alloc::format!("detach {}", cx.node()));
            if let Some(watcher) = self.watcher {
                cx.watches_mut().disconnect(watcher);
            }
        }

        fn attribute_changed(
            &mut self,
            name: &str,
            old: Option<&str>,
            new: Option<&str>,
            _cx: &mut ElementCx<'_>,
        ) {
            self.log
                .borrow_mut()
                .push(alloc::format!("attr {name} {old:?} -> {new:?}"));
        }

        fn on_mutations(
            &mut self,
            _watcher: WatcherId,
            records: &[MutationRecord<NodeId>],
            _cx: &mut ElementCx<'_>,
        ) {
            self.log
                .borrow_mut()
                .push(alloc::format!("batch of {}", records.len()));
        }
    }

    fn runtime(log: &Log) -> Runtime {
        let mut registry = ElementRegistry::new();
        let log = log.clone();
        registry
            .define("x-rec", &["data"], move || {
                Box::new(Recorder {
                    log: log.clone(),
                    watcher: None,
                })
            })
            .unwrap();
        Runtime::new(registry)
    }

    fn entries(log: &Log) -> Vec<String> {
        core::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn lifecycle_reactions_run_synchronously() {
        let log = Log::default();
        let mut rt = runtime(&log);
        let root = rt.document().root();
        let el = rt.create_element("x-rec");
        rt.append_child(root, el).unwrap();
        assert_eq!(entries(&log), ["attach #1"]);

        rt.remove_child(root, el).unwrap();
        assert_eq!(entries(&log), ["detach #1"]);
    }

    #[test]
    fn only_observed_attributes_are_reported() {
        let log = Log::default();
        let mut rt = runtime(&log);
        let el = rt.create_element("x-rec");
        rt.set_attribute(el, "data", "1").unwrap();
        rt.set_attribute(el, "other", "1").unwrap();
        assert_eq!(entries(&log), ["attr data None -> Some(\"1\")"]);
    }

    #[test]
    fn late_upgrade_reports_existing_attributes() {
        let log = Log::default();
        let mut rt = runtime(&log);
        let root = rt.document().root();
        let el = rt.document_mut().create_element("x-rec");
        rt.document_mut().set_attribute(el, "data", "v").unwrap();
        rt.append_child(root, el).unwrap();
        assert_eq!(
            entries(&log),
            ["attr data None -> Some(\"v\")", "attach #1"]
        );
    }

    #[test]
    fn flush_delivers_batches_to_owners() {
        let log = Log::default();
        let mut rt = runtime(&log);
        let root = rt.document().root();
        let el = rt.create_element("x-rec");
        rt.append_child(root, el).unwrap();
        entries(&log);

        let a = rt.create_text();
        let b = rt.create_text();
        rt.append_child(el, a).unwrap();
        rt.append_child(el, b).unwrap();
        let stats = rt.flush().unwrap();

        assert_eq!(stats.batches, 1);
        assert_eq!(stats.records, 2);
        assert_eq!(entries(&log), ["batch of 2"]);
    }

    /// Appends a text node to itself for every child list batch.
    struct Runaway {
        watcher: Option<WatcherId>,
    }

    impl CustomElement for Runaway {
        fn on_attach(&mut self, cx: &mut ElementCx<'_>) {
            let watcher = *self.watcher.get_or_insert_with(|| cx.create_watcher());
            let node = cx.node();
            cx.watches_mut().observe(watcher, node, WatchOptions::child_list());
            let text = cx.document_mut().create_text();
            cx.document_mut().append_child(node, text).unwrap();
        }

        fn on_detach(&mut self, _cx: &mut ElementCx<'_>) {}

        fn on_mutations(
            &mut self,
            _watcher: WatcherId,
            _records: &[MutationRecord<NodeId>],
            cx: &mut ElementCx<'_>,
        ) {
            let node = cx.node();
            let text = cx.document_mut().create_text();
            cx.document_mut().append_child(node, text).unwrap();
        }
    }

    #[test]
    fn non_settling_cascades_hit_the_flush_limit() {
        let mut registry = ElementRegistry::new();
        registry
            .define("x-runaway", &[], || Box::new(Runaway { watcher: None }))
            .unwrap();
        let mut rt =
            Runtime::with_config(registry, RuntimeConfig::default().with_max_flush_rounds(8));
        let root = rt.document().root();
        let el = rt.create_element("x-runaway");
        rt.append_child(root, el).unwrap();

        assert_eq!(
            rt.flush(),
            Err(RuntimeError::FlushLimitExceeded { rounds: 8 })
        );
    }
}
