//! Id-keyed resource storage

use std::collections::BTreeMap;

use super::handle::{ResourceHandle, ResourceId, hash_name};

struct Entry<T> {
    name: String,
    value: T,
}

/// Owns every loaded resource of one type
pub struct ResourceManager<T> {
    entries: BTreeMap<ResourceId, Entry<T>>,
}

impl<T> ResourceManager<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Store `value` under the hash of `name`, replacing any previous resource
    pub fn load(&mut self, name: impl Into<String>, value: T) -> ResourceHandle<T> {
        let name = name.into();
        self.load_with_id(hash_name(&name), name, value)
    }

    /// Store `value` under an explicit id
    pub fn load_with_id(&mut self, id: ResourceId, name: impl Into<String>, value: T) -> ResourceHandle<T> {
        let name = name.into();
        if let Some(previous) = self.entries.insert(id, Entry { name, value }) {
            log::debug!("Replaced resource {} ({id:#010x})", previous.name);
        }
        ResourceHandle::new(id)
    }

    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&T> {
        self.entries.get(&id).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut T> {
        self.entries.get_mut(&id).map(|entry| &mut entry.value)
    }

    #[must_use]
    pub fn handle(&self, handle: ResourceHandle<T>) -> Option<&T> {
        self.get(handle.id())
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.get(hash_name(name))
    }

    #[must_use]
    pub fn name(&self, id: ResourceId) -> Option<&str> {
        self.entries.get(&id).map(|entry| entry.name.as_str())
    }

    #[must_use]
    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn remove(&mut self, id: ResourceId) -> Option<T> {
        self.entries.remove(&id).map(|entry| entry.value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Resources in id order
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &T)> + '_ {
        self.entries.iter().map(|(id, entry)| (*id, &entry.value))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.entries.values_mut().map(|entry| &mut entry.value)
    }
}

impl<T> Default for ResourceManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_get() {
        let mut manager = ResourceManager::new();
        let handle = manager.load("hello", 42_i32);

        assert_eq!(manager.handle(handle), Some(&42));
        assert_eq!(manager.get_by_name("hello"), Some(&42));
        assert_eq!(manager.name(handle.id()), Some("hello"));
        assert!(manager.get_by_name("missing").is_none());
    }

    #[test]
    fn test_load_replaces() {
        let mut manager = ResourceManager::new();
        manager.load("a", 1);
        manager.load("a", 2);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get_by_name("a"), Some(&2));
    }

    #[test]
    fn test_explicit_ids_iterate_in_order() {
        let mut manager = ResourceManager::new();
        manager.load_with_id(9, "nine", 'c');
        manager.load_with_id(1, "one", 'a');
        manager.load_with_id(4, "four", 'b');

        let ids: Vec<_> = manager.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 4, 9]);
        assert_eq!(manager.remove(4), Some('b'));
        assert!(!manager.contains(4));
    }
}
