// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::Type;

/// One global array of the emitted model. Every pointer the translator
/// produces is an offset into exactly one of these (or the null array).
///
/// The source name, source type and dimensions are carried for reporting
/// only; the range type is what the memory model refines.
#[derive(Debug)]
pub struct GlobalArray {
    name: String,
    range_type: Type,
    source_name: String,
    source_type: String,
    source_dims: Vec<u64>,
    attributes: RefCell<BTreeSet<String>>,
    not_accessed: Cell<bool>,
}

impl GlobalArray {
    pub(crate) fn new(
        name: String,
        range_type: Type,
        source_name: String,
        source_type: String,
        source_dims: Vec<u64>,
    ) -> Self {
        GlobalArray {
            name,
            range_type,
            source_name,
            source_type,
            source_dims,
            attributes: RefCell::new(BTreeSet::new()),
            not_accessed: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range_type(&self) -> &Type {
        &self.range_type
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    pub fn source_dims(&self) -> &[u64] {
        &self.source_dims
    }

    pub fn add_attribute(&self, attrib: &str) {
        self.attributes.borrow_mut().insert(attrib.to_string());
    }

    pub fn attributes(&self) -> Vec<String> {
        self.attributes.borrow().iter().cloned().collect()
    }

    pub fn has_attribute(&self, attrib: &str) -> bool {
        self.attributes.borrow().contains(attrib)
    }

    pub fn is_global(&self) -> bool {
        self.has_attribute("global")
    }

    pub fn is_group_shared(&self) -> bool {
        self.has_attribute("group_shared")
    }

    /// Whether the array is visible to both threads of the verification
    /// harness, and therefore needs race-tracking state.
    pub fn is_global_or_group_shared(&self) -> bool {
        self.is_global() || self.is_group_shared()
    }

    pub fn set_not_accessed(&self) {
        self.not_accessed.set(true);
    }

    pub fn not_accessed(&self) -> bool {
        self.not_accessed.get()
    }
}

// Identity follows the unique emitted name; candidate sets of arrays are
// ordered collections.
impl PartialEq for GlobalArray {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for GlobalArray {}

impl PartialOrd for GlobalArray {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GlobalArray {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for GlobalArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
