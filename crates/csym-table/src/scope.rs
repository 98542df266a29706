//! Scope frame lifecycle (§4.1).

use crate::symbol::SymbolId;
use csym_intern::Name;
use rustc_hash::FxHashMap;

/// Lifecycle state of one [`ScopeFrame`]'s lookup table (§4.1).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FrameState {
    /// Capacity reserved, no table built yet.
    Created,
    /// Table exists but holds stale entries from a previous pop at this
    /// depth; not visible to lookup until the next insert clears it.
    Dirty,
    /// Table is live and visible to lookup.
    Initialized,
}

/// A lookup index (name -> symbol) for one lexical block, plus the
/// lifecycle state that lets the watermarking optimization in
/// [`crate::Namespace::push_scope`] reuse capacity across pops.
#[derive(Debug)]
pub struct ScopeFrame {
    pub(crate) state: FrameState,
    pub(crate) table: FxHashMap<Name, SymbolId>,
    capacity_hint: usize,
}

impl ScopeFrame {
    pub(crate) fn created(capacity_hint: usize) -> Self {
        Self { state: FrameState::Created, table: FxHashMap::default(), capacity_hint }
    }

    /// Lazily builds (or clears a dirty) table and marks it live; called
    /// the first time a symbol is inserted at this depth (§4.1).
    pub(crate) fn ensure_initialized(&mut self) {
        if self.state != FrameState::Initialized {
            self.table.clear();
            if self.table.capacity() < self.capacity_hint {
                self.table.reserve(self.capacity_hint - self.table.capacity());
            }
            self.state = FrameState::Initialized;
        }
    }

    pub(crate) fn insert(&mut self, name: Name, id: SymbolId) {
        self.ensure_initialized();
        self.table.insert(name, id);
    }

    #[must_use]
    pub(crate) fn get(&self, name: Name) -> Option<SymbolId> {
        if self.state == FrameState::Initialized { self.table.get(&name).copied() } else { None }
    }

    #[must_use]
    pub fn state(&self) -> FrameState {
        self.state
    }
}

/// Initial hash-capacity seeds per scope depth (§4.1), reflecting the
/// empirical distribution of declarations in C code: file scope holds
/// the most, parameter scope (depth 1) the fewest of the "normal"
/// depths, and nested blocks taper off from there.
///
/// These are seeds only — the underlying table may grow past them.
/// A small `Copy` config struct threaded into the constructor, not a
/// global.
#[derive(Clone, Copy, Debug)]
pub struct ScopeCapacityProfile {
    pub file_scope: usize,
    pub param_scope: usize,
    pub block_scope_taper: [usize; 5],
    pub block_scope_floor: usize,
}

impl Default for ScopeCapacityProfile {
    fn default() -> Self {
        Self {
            file_scope: 256,
            param_scope: 16,
            block_scope_taper: [128, 64, 32, 16, 8],
            block_scope_floor: 8,
        }
    }
}

impl ScopeCapacityProfile {
    #[must_use]
    pub fn capacity_for_depth(&self, depth: usize) -> usize {
        match depth {
            0 => self.file_scope,
            1 => self.param_scope,
            d => {
                let taper_idx = d - 2;
                self.block_scope_taper.get(taper_idx).copied().unwrap_or(self.block_scope_floor)
            }
        }
    }
}
