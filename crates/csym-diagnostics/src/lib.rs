//! Fatal error types for the symbol table core.
//!
//! Four fatal, unrecovered error cases can arise while merging
//! declarators. This crate gives each one a `thiserror`-derived variant:
//! one variant per case, the offending name and types interpolated into
//! the message, `Debug + Clone + PartialEq` so tests can assert on the
//! exact error produced.
//!
//! None of these are recoverable locally; the core itself never panics
//! to report them — see the `panic = "deny"` / `unwrap_used = "deny"`
//! workspace lints — it returns `Err(SymbolError)` and leaves
//! termination to the caller.

use csym_types::Type;
use thiserror::Error;

/// One of the four fatal error cases from §7.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolError {
    /// A redeclaration's type is incompatible with the existing symbol's
    /// type (§4.4, and merge-table rows R4/R5).
    #[error("'{name}' redeclared with incompatible type: {previous} vs {new}")]
    TypeConflict { name: String, previous: Type, new: Type },

    /// Same name at file scope with incompatible linkage or kind
    /// (merge-table row R5).
    #[error("'{name}' does not match prior declaration")]
    LinkageMismatch { name: String },

    /// Same name defined twice in the same block scope (merge-table
    /// row R7).
    #[error("duplicate definition of '{name}'")]
    DuplicateDefinition { name: String },

    /// A label was referenced (`TENTATIVE`) but never defined before its
    /// function's label scope was popped (§4.1, §7).
    #[error("undefined label '{name}'")]
    UndefinedLabel { name: String },
}

/// Result alias used throughout the symbol table core.
pub type SymbolResult<T> = Result<T, SymbolError>;

/// The *Diagnostics* external collaborator from §6: something the core
/// can hand a fatal [`SymbolError`] to.
///
/// A real driver's `error(fmt, …)` terminates the translation unit on
/// every call (§5 "Cancellation: ... A fatal semantic error terminates
/// the process"); this trait only models the hand-off, so the core
/// stays decoupled from how the message is ultimately printed or the
/// process is ultimately torn down.
pub trait DiagnosticSink {
    fn fatal(&mut self, error: SymbolError);
}

/// A [`DiagnosticSink`] that collects every fatal error it receives,
/// for use in tests and in embedders that want to keep going after a
/// semantic error instead of aborting.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub errors: Vec<SymbolError>,
}

impl DiagnosticSink for CollectingSink {
    fn fatal(&mut self, error: SymbolError) {
        self.errors.push(error);
    }
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_interpolate_the_offending_name() {
        let err = SymbolError::DuplicateDefinition { name: "x".to_string() };
        assert_eq!(err.to_string(), "duplicate definition of 'x'");
    }

    #[test]
    fn type_conflict_renders_both_types() {
        let err = SymbolError::TypeConflict {
            name: "x".to_string(),
            previous: Type::int(true),
            new: Type::float(),
        };
        assert_eq!(err.to_string(), "'x' redeclared with incompatible type: int vs float");
    }

    #[test]
    fn collecting_sink_accumulates_errors() {
        let mut sink = CollectingSink::new();
        assert!(sink.is_empty());
        sink.fatal(SymbolError::UndefinedLabel { name: "L".to_string() });
        assert_eq!(sink.errors.len(), 1);
    }
}
