//! Code for handing IDs
use anyhow::{Context, Result};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;

/// Indicates that the struct has an ID field
pub trait HasID {
    /// Get a string representation of the struct's ID
    fn get_id(&self) -> &str;
}

/// A data structure containing a set of IDs
pub trait IDCollection<ID>
where
    ID: Eq + Hash + Borrow<str>,
{
    /// Get the ID after checking that it exists this collection.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID to look up
    ///
    /// # Returns
    ///
    /// A copy of the `Rc<str>` in `self` or an error if not found.
    fn get_id(&self, id: &str) -> Result<ID>;
}

impl<ID> IDCollection<ID> for HashSet<ID>
where
    ID: Eq + Hash + Borrow<str> + Clone,
{
    fn get_id(&self, id: &str) -> Result<ID> {
        let found = self
            .get(id)
            .with_context(|| format!("Unknown ID {id} found"))?;
        Ok(found.clone())
    }
}
