//! The [`Symbol`] record (§3) and its small companion enums.

use csym_intern::Name;
use csym_types::Type;

/// Index of a [`Symbol`] within the append-only list of the namespace
/// that owns it.
///
/// Per the "Stable pointer semantics" design note, this is the
/// `NamespaceId + index` style handle: a plain `u32`, never an owning
/// pointer. It stays valid for the life of the namespace because the
/// append-only list never removes or reorders entries (§3 invariants).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Symbol kind (§3 `symtype`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymType {
    Declaration,
    Tentative,
    Definition,
    Typedef,
    Tag,
    Label,
    Constant,
    StringValue,
}

/// Linkage classification (§3 `linkage`, GLOSSARY).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Linkage {
    Extern,
    Intern,
    None,
}

/// The variant payload carried by a [`Symbol`] (§3 `value`).
#[derive(Clone, Debug)]
pub enum SymbolValue {
    /// No payload (the common case for ordinary declarations).
    None,
    /// Integer constant bits, for `symtype = CONSTANT`.
    Int(i64),
    /// Floating-point constant bits, for `symtype = CONSTANT`.
    Float(f64),
    /// Interned string bytes, for `symtype = STRING_VALUE`.
    Str(Name),
    /// Back-reference to the symbol holding a VLA's runtime length.
    ///
    /// Modeled as an index into the owning namespace's append-only
    /// list rather than an owning pointer (§9 "Cyclic references").
    VlaAddress(SymbolId),
}

/// A single named entity's compile-time facts (§3).
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Name,
    /// Disambiguation number. Zero for ordinary symbols whose `name`
    /// already uniquely identifies them; nonzero for every synthetic
    /// symbol and every block-scope `Intern`-linkage symbol.
    pub n: u32,
    pub ty: Type,
    pub symtype: SymType,
    pub linkage: Linkage,
    /// Scope depth at which this symbol first became visible (0 = file
    /// scope), except a function symbol's depth is lowered when a
    /// shallower redeclaration unifies with it (§3).
    pub depth: u32,
    /// Set to `true` the first time a lookup returns this symbol.
    pub referenced: bool,
    pub value: SymbolValue,
    /// Byte offset assigned by a later pass; the core never reads or
    /// writes this except to leave it at `None` on creation.
    pub stack_offset: Option<i64>,
}

impl Symbol {
    pub(crate) fn new(name: Name, ty: Type, symtype: SymType, linkage: Linkage, depth: u32) -> Self {
        Self {
            name,
            n: 0,
            ty,
            symtype,
            linkage,
            depth,
            referenced: false,
            value: SymbolValue::None,
            stack_offset: None,
        }
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        self.ty.is_function()
    }
}
