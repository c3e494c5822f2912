use super::VersionChain;
use crate::core::Key;
use std::collections::HashMap;

/// Per-key version chains. Chains are created on first write and never
/// removed, even if a compaction pass empties them.
#[derive(Debug, Default)]
pub struct VersionStore {
    chains: HashMap<Key, VersionChain>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(&self, key: &str) -> Option<&VersionChain> {
        self.chains.get(key)
    }

    pub fn chain_mut(&mut self, key: &str) -> Option<&mut VersionChain> {
        self.chains.get_mut(key)
    }

    pub fn chain_or_insert(&mut self, key: &str) -> &mut VersionChain {
        self.chains.entry(key.to_string()).or_default()
    }

    /// Whether `key` has ever been written.
    pub fn contains_key(&self, key: &str) -> bool {
        self.chains.contains_key(key)
    }

    pub fn key_count(&self) -> usize {
        self.chains.len()
    }

    pub fn version_count(&self) -> usize {
        self.chains.values().map(VersionChain::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &VersionChain)> {
        self.chains.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Key, &mut VersionChain)> {
        self.chains.iter_mut()
    }
}
