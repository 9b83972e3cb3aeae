//! Name → helper lookup consumed by the interpreter

use super::{Helper, StringHelper};
use std::collections::BTreeMap;

/// Closed registry of the standard helper set
///
/// Built once at startup from [`StringHelper::ALL`]. There is no runtime
/// registration; the names it answers for are fixed at build time.
pub struct HelperRegistry {
    helpers: BTreeMap<&'static str, Box<dyn Helper>>,
}

impl HelperRegistry {
    /// Registry holding every standard string helper
    pub fn standard() -> Self {
        let helpers = StringHelper::ALL
            .into_iter()
            .map(|helper| (helper.name(), Box::new(helper) as Box<dyn Helper>))
            .collect();
        Self { helpers }
    }

    /// Look up a helper by its registry key
    pub fn get(&self, name: &str) -> Option<&dyn Helper> {
        self.helpers.get(name).map(|helper| helper.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.helpers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
