// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watch registry: watched targets, subscriptions and pending batches.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::options::WatchOptions;
use crate::record::MutationRecord;

/// Handle of a watcher in a [`WatchRegistry`].
///
/// Like box tree node ids this is a slot index plus a generation, so a handle
/// kept past [`WatchRegistry::release`] never aliases a newer watcher.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct WatcherId(u32, u32);

impl WatcherId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Slot<K> {
    generation: u32,
    live: bool,
    targets: SmallVec<[(K, WatchOptions); 2]>,
    pending: Vec<MutationRecord<K>>,
    queued: bool,
}

/// Registry mapping watched targets to interested watchers.
///
/// The registry does not observe anything by itself. A host reports every
/// effective mutation through [`notify`](Self::notify); the registry fans the
/// record out to each watcher whose options on that target match, and queues
/// the watcher for delivery. The host later drains one batch per watcher with
/// [`take_batch`](Self::take_batch), usually at its microtask checkpoint.
///
/// Within a batch, records keep the order in which they were notified.
/// Watchers are handed out in the order they first received a pending record.
///
/// # Example
///
/// ```
/// use understory_watch::{MutationRecord, WatchOptions, WatchRegistry};
///
/// let mut watches = WatchRegistry::<u32>::new();
/// let parent_watch = watches.create();
/// watches.observe(parent_watch, 1, WatchOptions::attribute("style"));
///
/// watches.notify(MutationRecord::attribute(1, "style"));
/// watches.notify(MutationRecord::attribute(1, "class"));
/// watches.notify(MutationRecord::attribute(1, "style"));
///
/// let (watcher, records) = watches.take_batch().unwrap();
/// assert_eq!(watcher, parent_watch);
/// assert_eq!(records.len(), 2);
/// assert!(watches.take_batch().is_none());
/// ```
#[derive(Debug)]
pub struct WatchRegistry<K>
where
    K: Copy + Eq + Hash,
{
    slots: Vec<Slot<K>>,
    free: Vec<u32>,
    by_target: HashMap<K, SmallVec<[WatcherId; 4]>>,
    queue: VecDeque<WatcherId>,
}

impl<K> Default for WatchRegistry<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> WatchRegistry<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_target: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Creates a watcher that observes nothing yet.
    pub fn create(&mut self) -> WatcherId {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.live = true;
            return WatcherId(idx, slot.generation);
        }
        let idx = u32::try_from(self.slots.len()).expect("watcher slots exceed u32::MAX");
        self.slots.push(Slot {
            generation: 1,
            live: true,
            targets: SmallVec::new(),
            pending: Vec::new(),
            queued: false,
        });
        WatcherId(idx, 1)
    }

    /// Returns `true` if `watcher` refers to a live watcher.
    #[must_use]
    pub fn is_live(&self, watcher: WatcherId) -> bool {
        self.slot(watcher).is_some()
    }

    /// Starts (or re-configures) observation of `target` by `watcher`.
    ///
    /// Returns `false` if the watcher handle is stale.
    pub fn observe(&mut self, watcher: WatcherId, target: K, options: WatchOptions) -> bool {
        let Some(slot) = self.slot_mut(watcher) else {
            return false;
        };
        if let Some(entry) = slot.targets.iter_mut().find(|(k, _)| *k == target) {
            entry.1 = options;
            return true;
        }
        slot.targets.push((target, options));
        self.by_target.entry(target).or_default().push(watcher);
        true
    }

    /// Returns `true` if `watcher` currently observes `target`.
    #[must_use]
    pub fn is_observing(&self, watcher: WatcherId, target: K) -> bool {
        self.slot(watcher)
            .is_some_and(|slot| slot.targets.iter().any(|(k, _)| *k == target))
    }

    /// Returns the targets currently observed by `watcher`.
    pub fn targets(&self, watcher: WatcherId) -> impl Iterator<Item = K> + '_ {
        self.slot(watcher)
            .into_iter()
            .flat_map(|slot| slot.targets.iter().map(|(k, _)| *k))
    }

    /// Stops all observation by `watcher` and drops its undelivered records.
    ///
    /// The watcher stays live and can observe again.
    pub fn disconnect(&mut self, watcher: WatcherId) {
        let Some(slot) = self.slot_mut(watcher) else {
            return;
        };
        let targets = core::mem::take(&mut slot.targets);
        slot.pending.clear();
        let was_queued = core::mem::replace(&mut slot.queued, false);
        for (target, _) in targets {
            self.unlink(target, watcher);
        }
        if was_queued {
            self.queue.retain(|w| *w != watcher);
        }
    }

    /// Disconnects `watcher` and frees its slot. The handle becomes stale.
    pub fn release(&mut self, watcher: WatcherId) {
        if !self.is_live(watcher) {
            return;
        }
        self.disconnect(watcher);
        self.slots[watcher.idx()].live = false;
        self.free.push(watcher.0);
    }

    /// Removes `target` from every watcher, e.g. when the node is destroyed.
    ///
    /// Records already queued for the target are kept.
    pub fn forget_target(&mut self, target: K) {
        let Some(watchers) = self.by_target.remove(&target) else {
            return;
        };
        for watcher in watchers {
            if let Some(slot) = self.slot_mut(watcher) {
                slot.targets.retain(|(k, _)| *k != target);
            }
        }
    }

    /// Delivers `record` to every watcher interested in it.
    ///
    /// Returns the number of watchers that queued the record.
    pub fn notify(&mut self, record: MutationRecord<K>) -> usize {
        let Some(watchers) = self.by_target.get(&record.target) else {
            return 0;
        };
        let mut delivered = 0;
        for &watcher in watchers {
            let slot = &mut self.slots[watcher.idx()];
            let interested = slot
                .targets
                .iter()
                .any(|(k, opts)| *k == record.target && opts.matches(&record.kind));
            if !interested {
                continue;
            }
            slot.pending.push(record.clone());
            if !slot.queued {
                slot.queued = true;
                self.queue.push_back(watcher);
            }
            delivered += 1;
        }
        delivered
    }

    /// Returns `true` if any watcher has undelivered records.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Returns the number of undelivered records for `watcher`.
    #[must_use]
    pub fn pending_len(&self, watcher: WatcherId) -> usize {
        self.slot(watcher).map_or(0, |slot| slot.pending.len())
    }

    /// Takes the next watcher's batch of undelivered records.
    pub fn take_batch(&mut self) -> Option<(WatcherId, Vec<MutationRecord<K>>)> {
        while let Some(watcher) = self.queue.pop_front() {
            let Some(slot) = self.slot_mut(watcher) else {
                continue;
            };
            slot.queued = false;
            let records = core::mem::take(&mut slot.pending);
            if !records.is_empty() {
                return Some((watcher, records));
            }
        }
        None
    }

    fn unlink(&mut self, target: K, watcher: WatcherId) {
        if let Some(watchers) = self.by_target.get_mut(&target) {
            watchers.retain(|w| *w != watcher);
            if watchers.is_empty() {
                self.by_target.remove(&target);
            }
        }
    }

    fn slot(&self, watcher: WatcherId) -> Option<&Slot<K>> {
        self.slots
            .get(watcher.idx())
            .filter(|slot| slot.live && slot.generation == watcher.1)
    }

    fn slot_mut(&mut self, watcher: WatcherId) -> Option<&mut Slot<K>> {
        self.slots
            .get_mut(watcher.idx())
            .filter(|slot| slot.live && slot.generation == watcher.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn records_for_unwatched_targets_are_dropped() {
        let mut watches = WatchRegistry::<u32>::new();
        let w = watches.create();
        watches.observe(w, 1, WatchOptions::attributes());

        assert_eq!(watches.notify(MutationRecord::attribute(2, "style")), 0);
        assert!(!watches.has_pending());
    }

    #[test]
    fn batch_keeps_notification_order() {
        let mut watches = WatchRegistry::<u32>::new();
        let w = watches.create();
        watches.observe(w, 1, WatchOptions::attributes());
        watches.observe(w, 2, WatchOptions::attributes());

        watches.notify(MutationRecord::attribute(2, "a"));
        watches.notify(MutationRecord::attribute(1, "b"));
        watches.notify(MutationRecord::attribute(2, "c"));

        let (_, records) = watches.take_batch().unwrap();
        let targets: Vec<u32> = records.iter().map(|r| r.target).collect();
        assert_eq!(targets, vec![2, 1, 2]);
    }

    #[test]
    fn one_record_fans_out_to_each_interested_watcher() {
        let mut watches = WatchRegistry::<u32>::new();
        let a = watches.create();
        let b = watches.create();
        let c = watches.create();
        watches.observe(a, 7, WatchOptions::attribute("style"));
        watches.observe(b, 7, WatchOptions::attributes());
        watches.observe(c, 7, WatchOptions::child_list());

        assert_eq!(watches.notify(MutationRecord::attribute(7, "style")), 2);
        let first = watches.take_batch().unwrap().0;
        let second = watches.take_batch().unwrap().0;
        assert_eq!((first, second), (a, b));
        assert!(watches.take_batch().is_none());
    }

    #[test]
    fn observe_again_replaces_options() {
        let mut watches = WatchRegistry::<u32>::new();
        let w = watches.create();
        watches.observe(w, 1, WatchOptions::child_list());
        watches.observe(w, 1, WatchOptions::attributes());

        assert_eq!(watches.targets(w).count(), 1);
        assert_eq!(watches.notify(MutationRecord::child_list(1, [3], [])), 0);
        assert_eq!(watches.notify(MutationRecord::attribute(1, "style")), 1);
    }

    #[test]
    fn disconnect_drops_pending_and_targets() {
        let mut watches = WatchRegistry::<u32>::new();
        let w = watches.create();
        watches.observe(w, 1, WatchOptions::attributes());
        watches.notify(MutationRecord::attribute(1, "style"));
        assert_eq!(watches.pending_len(w), 1);

        watches.disconnect(w);
        assert!(watches.is_live(w));
        assert!(!watches.is_observing(w, 1));
        assert!(!watches.has_pending());
        assert_eq!(watches.notify(MutationRecord::attribute(1, "style")), 0);

        // Observation can resume after a disconnect.
        watches.observe(w, 1, WatchOptions::attributes());
        assert_eq!(watches.notify(MutationRecord::attribute(1, "style")), 1);
    }

    #[test]
    fn released_handles_go_stale() {
        let mut watches = WatchRegistry::<u32>::new();
        let old = watches.create();
        watches.release(old);
        let new = watches.create();

        assert_ne!(old, new);
        assert!(!watches.is_live(old));
        assert!(!watches.observe(old, 1, WatchOptions::attributes()));
        assert!(watches.observe(new, 1, WatchOptions::attributes()));
    }

    #[test]
    fn forget_target_unsubscribes_everyone() {
        let mut watches = WatchRegistry::<u32>::new();
        let a = watches.create();
        let b = watches.create();
        watches.observe(a, 1, WatchOptions::attributes());
        watches.observe(b, 1, WatchOptions::attributes());
        watches.observe(b, 2, WatchOptions::attributes());

        watches.forget_target(1);
        assert!(!watches.is_observing(a, 1));
        assert!(watches.is_observing(b, 2));
        assert_eq!(watches.notify(MutationRecord::attribute(1, "style")), 0);
    }
}
