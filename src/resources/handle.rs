//! Typed resource identifiers
//!
//! Resources are addressed by a 32-bit id, usually the FNV-1a hash of their
//! name. A handle carries the id plus the resource type.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub type ResourceId = u32;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash of a resource name
#[must_use]
pub const fn hash_name(name: &str) -> ResourceId {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Id of a resource of type `T`
pub struct ResourceHandle<T> {
    id: ResourceId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ResourceHandle<T> {
    #[must_use]
    pub const fn new(id: ResourceId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Handle of the resource registered under `name`
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self::new(hash_name(name))
    }

    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }
}

impl<T> std::fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResourceHandle({:#010x})", self.id)
    }
}

impl<T> Clone for ResourceHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceHandle<T> {}

impl<T> PartialEq for ResourceHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ResourceHandle<T> {}

impl<T> Hash for ResourceHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(hash_name(""), 0x811c_9dc5);
        assert_eq!(hash_name("a"), 0xe40c_292c);
        assert_eq!(hash_name("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_handle_from_name() {
        let a = ResourceHandle::<i32>::from_name("coffre");
        let b = ResourceHandle::<i32>::from_name("coffre");
        assert_eq!(a, b);
        assert_eq!(a.id(), hash_name("coffre"));
        assert_ne!(a, ResourceHandle::from_name("coffre2"));
    }
}
