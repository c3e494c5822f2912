use crate::core::{Result, TxnId, Value};

/// One entry of a key's version chain.
///
/// `created_by` is the writer that produced the value. `closed_by` lists every
/// writer that superseded or deleted it while the version was visible to that
/// writer, in closing order. Closers are only ever added; compaction removes
/// the ones that aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    value: Value,
    created_by: TxnId,
    closed_by: Vec<TxnId>,
}

impl Version {
    pub fn new(value: Value, created_by: TxnId) -> Self {
        debug_assert!(created_by.is_valid());
        Self {
            value,
            created_by,
            closed_by: Vec::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn created_by(&self) -> TxnId {
        self.created_by
    }

    pub fn closed_by(&self) -> &[TxnId] {
        &self.closed_by
    }

    pub fn is_closed_by(&self, txn: TxnId) -> bool {
        self.closed_by.contains(&txn)
    }

    pub fn is_open(&self) -> bool {
        self.closed_by.is_empty()
    }

    /// Returns `false` if `closer` had already closed this version.
    fn close(&mut self, closer: TxnId) -> bool {
        debug_assert!(closer.is_valid());
        if self.is_closed_by(closer) {
            return false;
        }
        self.closed_by.push(closer);
        true
    }
}

/// Versions of a single key, oldest insertion first.
#[derive(Debug, Clone, Default)]
pub struct VersionChain {
    versions: Vec<Version>,
}

impl VersionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter().rev()
    }

    /// Newest version accepted by `is_visible`.
    pub fn find_visible<F>(&self, mut is_visible: F) -> Result<Option<&Version>>
    where
        F: FnMut(&Version) -> Result<bool>,
    {
        for version in self.newest_first() {
            if is_visible(version)? {
                return Ok(Some(version));
            }
        }
        Ok(None)
    }

    /// Close every version accepted by `is_visible` on behalf of `closer`.
    /// Returns how many versions were closed.
    pub fn close_visible<F>(&mut self, closer: TxnId, mut is_visible: F) -> Result<usize>
    where
        F: FnMut(&Version) -> Result<bool>,
    {
        let mut closed = 0;
        for version in self.versions.iter_mut().rev() {
            if is_visible(&*version)? && version.close(closer) {
                closed += 1;
            }
        }
        Ok(closed)
    }

    /// Forget every closer matching `aborted`, keeping the others.
    /// Returns how many closers were removed.
    pub fn remove_closers<F>(&mut self, mut aborted: F) -> usize
    where
        F: FnMut(TxnId) -> bool,
    {
        let mut removed = 0;
        for version in &mut self.versions {
            let before = version.closed_by.len();
            version.closed_by.retain(|&closer| !aborted(closer));
            removed += before - version.closed_by.len();
        }
        removed
    }

    pub fn push(&mut self, version: Version) {
        self.versions.push(version);
    }

    /// Drop versions for which `keep` returns `false`. Returns the number removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Version) -> bool,
    {
        let before = self.versions.len();
        self.versions.retain(keep);
        before - self.versions.len()
    }
}
