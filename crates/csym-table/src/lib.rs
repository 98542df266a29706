//! Symbol table core for a C89/C99 compiler front-end.
//!
//! A translation unit owns one [`SymbolTable`]: three namespaces
//! (identifiers, labels, tags), a cross-scope function registry, and the
//! synthetic-symbol machinery (temporaries, anonymous aggregates,
//! constants, string literals, internal labels) that semantic analysis
//! needs on top of ordinary declarations.
//!
//! Token scanning, preprocessing, expression evaluation, type
//! construction, IR generation, and diagnostic formatting are all out of
//! scope here; [`csym_types::Type`] and [`csym_diagnostics`] stand in for
//! the type system and diagnostics collaborators this core assumes.

mod namespace;
mod scope;
mod symbol;
mod table;

pub use namespace::{Namespace, NamespaceKind};
pub use scope::{FrameState, ScopeCapacityProfile, ScopeFrame};
pub use symbol::{Linkage, SymType, Symbol, SymbolId, SymbolValue};
pub use table::SymbolTable;
