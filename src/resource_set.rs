//! Ordered record set: the on-disk id order plus the id → record map.
//!
//! Invariant: every id in `order` appears exactly once and has an entry in
//! `map`, and `map` has no other entries. Every mutating method keeps both
//! halves in step.

use std::collections::HashMap;

use crate::codec::Resource;
use crate::error::{ResourceError, Result};
use crate::toc::ResourceId;

pub type ResourceMap = HashMap<ResourceId, Resource>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    order: Vec<ResourceId>,
    map:   ResourceMap,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a set from separately maintained halves, checking that they
    /// agree.
    pub fn from_parts(order: Vec<ResourceId>, mut map: ResourceMap) -> Result<Self> {
        let mut resources = ResourceSet::new();
        for id in order {
            let resource = match map.remove(&id) {
                Some(r) => r,
                None if resources.contains(&id) => return Err(ResourceError::DuplicateId { id }),
                None => return Err(ResourceError::MissingResource { id }),
            };
            resources.push(id, resource)?;
        }
        if let Some(&id) = map.keys().next() {
            return Err(ResourceError::MissingResource { id });
        }
        Ok(resources)
    }

    pub fn into_parts(self) -> (Vec<ResourceId>, ResourceMap) {
        (self.order, self.map)
    }

    /// Ids in write order.
    pub fn ids(&self) -> &[ResourceId] {
        &self.order
    }

    pub fn map(&self) -> &ResourceMap {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.map.contains_key(id)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.map.get(id)
    }

    pub fn get_mut(&mut self, id: &ResourceId) -> Option<&mut Resource> {
        self.map.get_mut(id)
    }

    pub fn position(&self, id: &ResourceId) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }

    /// Records in write order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &Resource)> + '_ {
        self.order.iter().filter_map(move |id| self.map.get(id).map(|r| (id, r)))
    }

    // ── Editing ──────────────────────────────────────────────────────────────

    /// Append a record. Fails with `DuplicateId` if the id is taken.
    pub fn push(&mut self, id: ResourceId, resource: Resource) -> Result<()> {
        let index = self.order.len();
        self.insert_at(index, id, resource)
    }

    /// Insert a record at `index` (clamped to the end).
    pub fn insert_at(&mut self, index: usize, id: ResourceId, resource: Resource) -> Result<()> {
        if self.map.contains_key(&id) {
            return Err(ResourceError::DuplicateId { id });
        }
        self.map.insert(id, resource);
        self.order.insert(index.min(self.order.len()), id);
        Ok(())
    }

    /// Swap a record's content, keeping its position. Returns the old record.
    pub fn replace(&mut self, id: &ResourceId, resource: Resource) -> Result<Resource> {
        match self.map.get_mut(id) {
            Some(slot) => Ok(std::mem::replace(slot, resource)),
            None => Err(ResourceError::MissingResource { id: *id }),
        }
    }

    pub fn remove(&mut self, id: &ResourceId) -> Option<Resource> {
        let resource = self.map.remove(id)?;
        self.order.retain(|o| o != id);
        Some(resource)
    }

    /// Change a record's id in place.
    pub fn rename(&mut self, old: &ResourceId, new: ResourceId) -> Result<()> {
        if old == &new {
            return if self.contains(old) {
                Ok(())
            } else {
                Err(ResourceError::MissingResource { id: *old })
            };
        }
        if self.map.contains_key(&new) {
            return Err(ResourceError::DuplicateId { id: new });
        }
        let index = self.position(old).ok_or(ResourceError::MissingResource { id: *old })?;
        let resource = self
            .map
            .remove(old)
            .ok_or(ResourceError::MissingResource { id: *old })?;
        self.map.insert(new, resource);
        self.order[index] = new;
        Ok(())
    }

    /// Move a record to `index` (clamped to the end) in write order.
    pub fn move_to(&mut self, id: &ResourceId, index: usize) -> Result<()> {
        let from = self.position(id).ok_or(ResourceError::MissingResource { id: *id })?;
        let id = self.order.remove(from);
        self.order.insert(index.min(self.order.len()), id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TextResource;

    fn text(s: &str) -> Resource {
        Resource::Text(TextResource::from(s))
    }

    fn ids(set: &ResourceSet) -> Vec<String> {
        set.ids().iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut set = ResourceSet::new();
        set.push("aaaa".into(), text("a")).unwrap();
        let err = set.push("aaaa".into(), text("b")).unwrap_err();
        assert!(matches!(err, ResourceError::DuplicateId { id } if id == ResourceId::new("aaaa")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn edits_keep_order_and_map_in_step() {
        let mut set = ResourceSet::new();
        for name in ["one", "two", "thr"] {
            set.push(name.into(), text(name)).unwrap();
        }
        set.insert_at(1, "new".into(), text("n")).unwrap();
        assert_eq!(ids(&set), ["one", "new", "two", "thr"]);

        set.rename(&"two".into(), "TWO".into()).unwrap();
        assert_eq!(ids(&set), ["one", "new", "TWO", "thr"]);
        assert!(set.get(&"two".into()).is_none());
        assert_eq!(set.get(&"TWO".into()), Some(&text("two")));

        set.move_to(&"thr".into(), 0).unwrap();
        assert_eq!(ids(&set), ["thr", "one", "new", "TWO"]);

        assert_eq!(set.remove(&"new".into()), Some(text("n")));
        assert_eq!(ids(&set), ["thr", "one", "TWO"]);
        assert_eq!(set.map().len(), set.len());

        let old = set.replace(&"one".into(), text("uno")).unwrap();
        assert_eq!(old, text("one"));
        assert_eq!(set.position(&"one".into()), Some(1));
    }

    #[test]
    fn rename_onto_existing_fails() {
        let mut set = ResourceSet::new();
        set.push("a".into(), text("a")).unwrap();
        set.push("b".into(), text("b")).unwrap();
        assert!(matches!(
            set.rename(&"a".into(), "b".into()),
            Err(ResourceError::DuplicateId { .. })
        ));
        assert!(matches!(
            set.rename(&"zz".into(), "c".into()),
            Err(ResourceError::MissingResource { .. })
        ));
        assert_eq!(ids(&set), ["a", "b"]);
    }

    #[test]
    fn from_parts_checks_lockstep() {
        let mut map = ResourceMap::new();
        map.insert("a".into(), text("a"));
        map.insert("b".into(), text("b"));

        let set = ResourceSet::from_parts(vec!["b".into(), "a".into()], map.clone()).unwrap();
        assert_eq!(ids(&set), ["b", "a"]);

        assert!(matches!(
            ResourceSet::from_parts(vec!["a".into()], map.clone()),
            Err(ResourceError::MissingResource { id }) if id == ResourceId::new("b")
        ));
        assert!(matches!(
            ResourceSet::from_parts(vec!["a".into(), "b".into(), "c".into()], map.clone()),
            Err(ResourceError::MissingResource { id }) if id == ResourceId::new("c")
        ));
        assert!(matches!(
            ResourceSet::from_parts(vec!["a".into(), "a".into(), "b".into()], map),
            Err(ResourceError::DuplicateId { .. })
        ));
    }
}
