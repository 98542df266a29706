//! Single-threaded string interner for the symbol table core.
//!
//! The symbol table core treats identifier spellings as an opaque,
//! hashable, equality-comparable handle (see the *String interner*
//! collaborator contract). This crate provides one concrete
//! implementation: [`Name`] is a `Copy` index into an [`Interner`],
//! cheap to pass around and to use as a hash map key.
//!
//! The translation unit is single-threaded (the core makes no
//! thread-safety claims), so the interner does not need to be `Sync`.

use lasso::{Rodeo, Spur};

/// An interned identifier spelling.
///
/// Two `Name`s compare equal iff they were interned from byte-identical
/// spellings in the same [`Interner`]. Hashing and equality operate on
/// the underlying index, never on the spelling itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Name(Spur);

/// Interns identifier spellings for one translation unit.
///
/// Not `Sync`: the core runs single-threaded inside one translation
/// unit, and the interner is torn down along with it.
#[derive(Debug, Default)]
pub struct Interner {
    rodeo: Rodeo,
}

impl Interner {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self { rodeo: Rodeo::new() }
    }

    /// Interns `bytes`, returning the same [`Name`] for repeated identical
    /// spellings.
    pub fn intern(&mut self, bytes: &str) -> Name {
        Name(self.rodeo.get_or_intern(bytes))
    }

    /// Returns `true` if `bytes` has already been interned.
    #[must_use]
    pub fn contains(&self, bytes: &str) -> bool {
        self.rodeo.contains(bytes)
    }

    /// Resolves a [`Name`] back to its spelling.
    ///
    /// # Panics
    ///
    /// Panics if `name` was not produced by this interner.
    #[must_use]
    pub fn raw(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.0)
    }

    /// Number of distinct spellings interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// `true` if no spelling has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_spellings_intern_to_the_same_name() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, b);
        assert_eq!(interner.raw(a), "foo");
    }

    #[test]
    fn distinct_spellings_intern_to_distinct_names() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn contains_reflects_prior_interning() {
        let mut interner = Interner::new();
        assert!(!interner.contains("memcpy"));
        interner.intern("memcpy");
        assert!(interner.contains("memcpy"));
    }
}
