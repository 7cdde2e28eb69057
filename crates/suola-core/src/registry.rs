//! Published rule set
//!
//! A rule set is published as a whole behind an `Arc`. Readers clone the
//! `Arc` at call start and keep using that version even if a new one is
//! published mid-call.

use std::sync::{Arc, RwLock};

use crate::rules::{LoadError, RuleSet};

/// Holder of the currently published rule set.
pub struct RuleRegistry {
    current: RwLock<Option<Arc<RuleSet>>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    pub const fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Replace the published rule set.
    pub fn publish(&self, rules: RuleSet) -> Arc<RuleSet> {
        let rules = Arc::new(rules);
        // The guarded value is only ever swapped whole, so a poisoned lock
        // still holds a complete rule set.
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&rules));
        log::info!("published rule set with {} sites", rules.len());
        rules
    }

    /// Decode, compile and publish. Nothing is published on error.
    pub fn load(&self, data: &[u8]) -> Result<Arc<RuleSet>, LoadError> {
        let rules = RuleSet::load(data)?;
        Ok(self.publish(rules))
    }

    /// The published rule set, if any.
    pub fn snapshot(&self) -> Option<Arc<RuleSet>> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The published rule set, publishing the result of `init` first if
    /// nothing has been published yet.
    pub fn snapshot_or_init<F>(&self, init: F) -> Result<Arc<RuleSet>, LoadError>
    where
        F: FnOnce() -> Result<RuleSet, LoadError>,
    {
        if let Some(rules) = self.snapshot() {
            return Ok(rules);
        }

        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have published while we waited for the lock.
        if let Some(rules) = guard.as_ref() {
            return Ok(Arc::clone(rules));
        }
        let rules = Arc::new(init()?);
        *guard = Some(Arc::clone(&rules));
        log::info!("published default rule set with {} sites", rules.len());
        Ok(rules)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const ONE: &[u8] = b"sites:\n  - domain: one.test\n    templates: []\n";
    const TWO: &[u8] =
        b"sites:\n  - domain: one.test\n    templates: []\n  - domain: two.test\n    templates: []\n";

    #[test]
    fn test_publish_and_snapshot() {
        let registry = RuleRegistry::new();
        assert!(!registry.is_loaded());
        assert!(registry.snapshot().is_none());

        registry.load(ONE).unwrap();
        assert_eq!(registry.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_survives_republish() {
        let registry = RuleRegistry::new();
        registry.load(ONE).unwrap();
        let held = registry.snapshot().unwrap();

        registry.load(TWO).unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(registry.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_load_keeps_previous() {
        let registry = RuleRegistry::new();
        registry.load(ONE).unwrap();
        let bad = b"sites:\n  - domain: bad.test\n    templates:\n      - pattern: \"(\"\n        template: x\n";
        assert!(registry.load(bad).is_err());
        assert_eq!(registry.snapshot().unwrap().sites()[0].domain, "one.test");
    }

    #[test]
    fn test_snapshot_or_init_runs_once() {
        let registry = RuleRegistry::new();
        let first = registry.snapshot_or_init(|| RuleSet::load(ONE)).unwrap();
        let second = registry.snapshot_or_init(|| RuleSet::load(TWO)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_see_whole_versions() {
        let registry = Arc::new(RuleRegistry::new());
        registry.load(ONE).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let len = registry.snapshot().unwrap().len();
                        assert!(len == 1 || len == 2);
                    }
                })
            })
            .collect();

        for i in 0..50 {
            registry.load(if i % 2 == 0 { TWO } else { ONE }).unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
