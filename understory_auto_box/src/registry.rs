// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit tag → element factory table.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use hashbrown::HashMap;

use crate::element::CustomElement;

/// Builds a fresh element instance for one node.
pub type ElementFactory = Box<dyn Fn() -> Box<dyn CustomElement>>;

/// Errors from [`ElementRegistry::define`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementRegistryError {
    /// The tag is not a valid custom element name.
    InvalidName(String),
    /// The tag already has a definition.
    AlreadyDefined(String),
}

impl fmt::Display for ElementRegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(tag) => write!(f, "`{tag}` is not a valid custom element name"),
            Self::AlreadyDefined(tag) => write!(f, "`{tag}` is already defined"),
        }
    }
}

impl core::error::Error for ElementRegistryError {}

struct Definition {
    factory: ElementFactory,
    observed_attributes: &'static [&'static str],
}

/// Registration table mapping custom tags to element factories.
///
/// The table is owned by whoever hosts the UI and handed to the
/// [`Runtime`](crate::Runtime); there is no global registry.
///
/// Tags follow the custom element naming rule: they start with a lowercase
/// ASCII letter, contain a `-`, and have no uppercase ASCII letters.
#[derive(Default)]
pub struct ElementRegistry {
    definitions: HashMap<String, Definition>,
}

impl fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.definitions.keys()).finish()
    }
}

impl ElementRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines `tag`.
    ///
    /// `observed_attributes` lists the attributes whose changes are
    /// reported through [`CustomElement::attribute_changed`].
    pub fn define(
        &mut self,
        tag: &str,
        observed_attributes: &'static [&'static str],
        factory: impl Fn() -> Box<dyn CustomElement> + 'static,
    ) -> Result<(), ElementRegistryError> {
        if !is_valid_custom_name(tag) {
            return Err(ElementRegistryError::InvalidName(String::from(tag)));
        }
        if self.definitions.contains_key(tag) {
            return Err(ElementRegistryError::AlreadyDefined(String::from(tag)));
        }
        self.definitions.insert(
            String::from(tag),
            Definition {
                factory: Box::new(factory),
                observed_attributes,
            },
        );
        Ok(())
    }

    /// Returns `true` if `tag` is defined.
    #[must_use]
    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    /// Constructs a new instance for `tag`.
    #[must_use]
    pub fn construct(&self, tag: &str) -> Option<Box<dyn CustomElement>> {
        self.definitions.get(tag).map(|def| (def.factory)())
    }

    /// The attributes observed by instances of `tag`.
    #[must_use]
    pub fn observed_attributes(&self, tag: &str) -> &'static [&'static str] {
        self.definitions
            .get(tag)
            .map_or(&[], |def| def.observed_attributes)
    }
}

fn is_valid_custom_name(tag: &str) -> bool {
    tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag.contains('-')
        && !tag.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace())
}
