//! A capability set the host can grant and revoke at runtime.

use std::collections::HashSet;
use std::sync::RwLock;

use blescan_types::Capability;

use crate::traits::Capabilities;

/// Capabilities held in memory.
///
/// Desktop stacks have no runtime permission model, so the btleplug host
/// grants everything. Tests and front ends can revoke entries to exercise
/// the denied paths.
#[derive(Debug, Default)]
pub struct CapabilitySet {
    granted: RwLock<HashSet<Capability>>,
}

impl CapabilitySet {
    /// Nothing granted.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every known capability granted.
    pub fn all() -> Self {
        Self::from_iter([Capability::Scan, Capability::Connect])
    }

    /// Grant a capability.
    pub fn grant(&self, capability: Capability) {
        self.granted
            .write()
            .expect("capability lock poisoned - a thread panicked while holding the lock")
            .insert(capability);
    }

    /// Revoke a capability.
    pub fn revoke(&self, capability: Capability) {
        self.granted
            .write()
            .expect("capability lock poisoned - a thread panicked while holding the lock")
            .remove(&capability);
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            granted: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl Capabilities for CapabilitySet {
    fn has_capability(&self, capability: Capability) -> bool {
        self.granted
            .read()
            .expect("capability lock poisoned - a thread panicked while holding the lock")
            .contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_revoke() {
        let caps = CapabilitySet::none();
        assert!(!caps.has_capability(Capability::Scan));

        caps.grant(Capability::Scan);
        assert!(caps.has_capability(Capability::Scan));
        assert!(!caps.has_capability(Capability::Connect));

        caps.revoke(Capability::Scan);
        assert!(!caps.has_capability(Capability::Scan));
    }

    #[test]
    fn test_all_grants_everything() {
        let caps = CapabilitySet::all();
        assert!(caps.has_capability(Capability::Scan));
        assert!(caps.has_capability(Capability::Connect));
    }

    #[test]
    fn test_closure_predicate() {
        let only_scan = |c: Capability| c == Capability::Scan;
        assert!(only_scan.has_capability(Capability::Scan));
        assert!(!only_scan.has_capability(Capability::Connect));
    }
}
