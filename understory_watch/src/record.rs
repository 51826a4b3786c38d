// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation records delivered to watchers.

use alloc::string::String;

use smallvec::SmallVec;

/// What changed on a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind<K> {
    /// An attribute of the target changed value.
    Attribute {
        /// Name of the changed attribute.
        name: String,
    },
    /// Direct children were added to or removed from the target.
    ChildList {
        /// Children inserted by this mutation, in tree order.
        added: SmallVec<[K; 1]>,
        /// Children removed by this mutation.
        removed: SmallVec<[K; 1]>,
    },
}

impl<K> MutationKind<K> {
    /// Convenience constructor for an attribute change.
    #[must_use]
    pub fn attribute(name: &str) -> Self {
        Self::Attribute {
            name: String::from(name),
        }
    }

    /// Convenience constructor for a child list change.
    #[must_use]
    pub fn child_list(
        added: impl IntoIterator<Item = K>,
        removed: impl IntoIterator<Item = K>,
    ) -> Self {
        Self::ChildList {
            added: added.into_iter().collect(),
            removed: removed.into_iter().collect(),
        }
    }

    /// Returns `true` if this is a change of the named attribute.
    #[must_use]
    pub fn is_attribute(&self, attribute: &str) -> bool {
        matches!(self, Self::Attribute { name } if name == attribute)
    }

    /// Returns `true` if this is a child list change.
    #[must_use]
    pub fn is_child_list(&self) -> bool {
        matches!(self, Self::ChildList { .. })
    }
}

/// One observed mutation on one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord<K> {
    /// The node the mutation happened on.
    pub target: K,
    /// What changed.
    pub kind: MutationKind<K>,
}

impl<K> MutationRecord<K> {
    /// Creates a record for an attribute change on `target`.
    #[must_use]
    pub fn attribute(target: K, name: &str) -> Self {
        Self {
            target,
            kind: MutationKind::attribute(name),
        }
    }

    /// Creates a record for a child list change on `target`.
    #[must_use]
    pub fn child_list(
        target: K,
        added: impl IntoIterator<Item = K>,
        removed: impl IntoIterator<Item = K>,
    ) -> Self {
        Self {
            target,
            kind: MutationKind::child_list(added, removed),
        }
    }
}
