//! Time-ordered record identifiers.

use uuid::Uuid;

/// Allocates globally-unique, time-ordered ids (UUID v7). Ids are assigned
/// once at first discovery and never change afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAllocator;

impl IdentityAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Next identifier. The leading 48 bits encode the unix timestamp in
    /// milliseconds, so lexical order tracks allocation time.
    pub fn allocate(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let alloc = IdentityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_order_by_allocation_time() {
        let alloc = IdentityAllocator::new();
        let earlier = alloc.allocate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let later = alloc.allocate();
        assert!(earlier < later);
    }

    #[test]
    fn ids_are_version_7() {
        let id = IdentityAllocator::new().allocate();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }
}
