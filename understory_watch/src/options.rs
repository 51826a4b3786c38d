// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watch options: which kinds of mutation a watcher is interested in.

use alloc::string::String;

use smallvec::SmallVec;

use crate::record::MutationKind;

bitflags::bitflags! {
    /// Kinds of mutation a watcher can subscribe to on a target.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct WatchKinds: u8 {
        /// Attribute changes on the target itself.
        const ATTRIBUTES = 0b0000_0001;
        /// Additions and removals of the target's direct children.
        const CHILD_LIST = 0b0000_0010;
    }
}

/// Subscription options for one watched target.
///
/// Options are per `(watcher, target)` pair. Observing a target again with
/// new options replaces the previous ones rather than merging them.
///
/// # Example
///
/// ```
/// use understory_watch::{MutationKind, WatchOptions};
///
/// let style_only = WatchOptions::attribute("style");
/// assert!(style_only.matches(&MutationKind::<u32>::attribute("style")));
/// assert!(!style_only.matches(&MutationKind::<u32>::attribute("class")));
/// assert!(!style_only.matches(&MutationKind::<u32>::child_list([1], [])));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchOptions {
    kinds: WatchKinds,
    /// When non-empty, only attribute changes with one of these names match.
    attribute_filter: SmallVec<[String; 1]>,
}

impl WatchOptions {
    /// Options matching the given kinds, with no attribute filter.
    #[must_use]
    pub fn new(kinds: WatchKinds) -> Self {
        Self {
            kinds,
            attribute_filter: SmallVec::new(),
        }
    }

    /// Options matching every attribute change on the target.
    #[must_use]
    pub fn attributes() -> Self {
        Self::new(WatchKinds::ATTRIBUTES)
    }

    /// Options matching changes of a single named attribute.
    #[must_use]
    pub fn attribute(name: &str) -> Self {
        Self::attributes().with_attribute_filter([name])
    }

    /// Options matching child list changes on the target.
    #[must_use]
    pub fn child_list() -> Self {
        Self::new(WatchKinds::CHILD_LIST)
    }

    /// Restricts attribute matches to the given names.
    ///
    /// Has no effect on child list matching.
    #[must_use]
    pub fn with_attribute_filter<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.attribute_filter = names.into_iter().map(String::from).collect();
        self
    }

    /// Returns the subscribed kinds.
    #[must_use]
    pub fn kinds(&self) -> WatchKinds {
        self.kinds
    }

    /// Returns the attribute filter. Empty means "all attributes".
    #[must_use]
    pub fn attribute_filter(&self) -> &[String] {
        &self.attribute_filter
    }

    /// Returns `true` if a mutation of this kind should be delivered.
    #[must_use]
    pub fn matches<K>(&self, kind: &MutationKind<K>) -> bool {
        match kind {
            MutationKind::Attribute { name } => {
                self.kinds.contains(WatchKinds::ATTRIBUTES)
                    && (self.attribute_filter.is_empty()
                        || self.attribute_filter.iter().any(|f| f == name))
            }
            MutationKind::ChildList { .. } => self.kinds.contains(WatchKinds::CHILD_LIST),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_attributes_match_any_name() {
        let opts = WatchOptions::attributes();
        assert!(opts.matches(&MutationKind::<u32>::attribute("style")));
        assert!(opts.matches(&MutationKind::<u32>::attribute("sty")));
        assert!(!opts.matches(&MutationKind::<u32>::child_list([], [2])));
    }

    #[test]
    fn combined_kinds() {
        let opts = WatchOptions::new(WatchKinds::ATTRIBUTES | WatchKinds::CHILD_LIST)
            .with_attribute_filter(["style", "sty"]);
        assert!(opts.matches(&MutationKind::<u32>::attribute("sty")));
        assert!(!opts.matches(&MutationKind::<u32>::attribute("class")));
        assert!(opts.matches(&MutationKind::<u32>::child_list([1], [])));
        assert_eq!(opts.attribute_filter().len(), 2);
    }
}
