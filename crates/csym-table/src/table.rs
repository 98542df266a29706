//! [`SymbolTable`]: the single context value bundling every piece of
//! global mutable state the core needs (§9 "bundle these into a single
//! `SymbolTable` context value").

use std::fmt::Write as _;

use csym_diagnostics::{DiagnosticSink, SymbolError, SymbolResult};
use csym_intern::{Interner, Name};
use csym_types::Type;
use rustc_hash::FxHashMap;
use tracing::instrument;

use crate::namespace::{Namespace, NamespaceKind};
use crate::scope::ScopeCapacityProfile;
use crate::symbol::{Linkage, Symbol, SymbolId, SymType, SymbolValue};

/// The symbol table core's single context value.
///
/// Holds the three namespace singletons, the cross-scope function
/// registry, the shared temporaries/labels recycle pool, the `memcpy`
/// cache, and every monotonic counter (`n_t`, `n_u`, `n_c`, `n_s`, `n_l`,
/// and the per-declaration block-static counter `svc`). One value per
/// translation unit; nothing here is ever shared across two of them.
pub struct SymbolTable {
    pub interner: Interner,
    identifiers: Namespace,
    labels: Namespace,
    tags: Namespace,
    function_registry: FxHashMap<Name, SymbolId>,
    recycle_pool: Vec<Symbol>,
    capacity_profile: ScopeCapacityProfile,
    decl_memcpy: Option<SymbolId>,
    memcpy_name: Name,
    counter_t: u32,
    counter_u: u32,
    counter_c: u32,
    counter_s: u32,
    counter_l: u32,
    counter_static_block: u32,
    prefix_t: Name,
    prefix_u: Name,
    prefix_c: Name,
    prefix_lc: Name,
    prefix_l: Name,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity_profile(ScopeCapacityProfile::default())
    }

    #[must_use]
    pub fn with_capacity_profile(capacity_profile: ScopeCapacityProfile) -> Self {
        let mut interner = Interner::new();
        let prefix_t = interner.intern(".t");
        let prefix_u = interner.intern(".u");
        let prefix_c = interner.intern(".C");
        let prefix_lc = interner.intern(".LC");
        let prefix_l = interner.intern(".L");
        let memcpy_name = interner.intern("memcpy");
        Self {
            interner,
            identifiers: Namespace::new(NamespaceKind::Identifiers),
            labels: Namespace::new(NamespaceKind::Labels),
            tags: Namespace::new(NamespaceKind::Tags),
            function_registry: FxHashMap::default(),
            recycle_pool: Vec::new(),
            capacity_profile,
            decl_memcpy: None,
            memcpy_name,
            counter_t: 0,
            counter_u: 0,
            counter_c: 0,
            counter_s: 0,
            counter_l: 0,
            counter_static_block: 0,
            prefix_t,
            prefix_u,
            prefix_c,
            prefix_lc,
            prefix_l,
        }
    }

    #[must_use]
    pub fn identifiers(&self) -> &Namespace {
        &self.identifiers
    }

    #[must_use]
    pub fn labels(&self) -> &Namespace {
        &self.labels
    }

    #[must_use]
    pub fn tags(&self) -> &Namespace {
        &self.tags
    }

    #[must_use]
    pub fn decl_memcpy(&self) -> Option<SymbolId> {
        self.decl_memcpy
    }

    #[must_use]
    pub fn recycle_pool_len(&self) -> usize {
        self.recycle_pool.len()
    }

    fn namespace(&self, kind: NamespaceKind) -> &Namespace {
        match kind {
            NamespaceKind::Identifiers => &self.identifiers,
            NamespaceKind::Labels => &self.labels,
            NamespaceKind::Tags => &self.tags,
        }
    }

    fn namespace_mut(&mut self, kind: NamespaceKind) -> &mut Namespace {
        match kind {
            NamespaceKind::Identifiers => &mut self.identifiers,
            NamespaceKind::Labels => &mut self.labels,
            NamespaceKind::Tags => &mut self.tags,
        }
    }

    /// Pushes one lexical block: the identifiers and tags namespaces move
    /// together, since C scopes both in lockstep (§4.1).
    #[instrument(level = "trace", skip(self))]
    pub fn push_scope(&mut self) {
        self.identifiers.push_scope(&self.capacity_profile);
        self.tags.push_scope(&self.capacity_profile);
        tracing::debug!(
            depth = self.identifiers.depth(),
            frame_state = ?self.identifiers.top_frame_state(),
            "pushed scope"
        );
    }

    /// Pops one lexical block. When this empties the identifier/tag
    /// stacks (end of translation unit), every symbol in both namespaces
    /// is destroyed and the recycle pool is drained (§4.1).
    #[instrument(level = "trace", skip(self))]
    pub fn pop_scope(&mut self) {
        let depth = self.identifiers.depth();
        let frame_state = self.identifiers.top_frame_state();
        let tags_done = self.tags.pop_scope();
        let identifiers_done = self.identifiers.pop_scope();
        tracing::debug!(depth, frame_state = ?frame_state, "popped scope");
        if tags_done {
            self.tags.take_symbols();
        }
        if identifiers_done {
            self.identifiers.take_symbols();
            self.recycle_pool.clear();
            tracing::debug!("translation unit torn down, recycle pool drained");
        }
    }

    /// Pushes the (flat, unnested) label scope for one function.
    pub fn push_label_scope(&mut self) {
        self.labels.push_scope(&self.capacity_profile);
    }

    /// Pops a function's label scope. Every label still `TENTATIVE`
    /// (referenced by a `goto` but never defined) is reported as an
    /// undefined label before the namespace's symbols are recycled back
    /// into the shared pool (§3, §4.1, §7).
    #[instrument(level = "trace", skip(self, sink))]
    pub fn pop_label_scope(&mut self, sink: &mut dyn DiagnosticSink) {
        for s in self.labels.symbols() {
            if s.symtype == SymType::Tentative {
                let name = self.interner.raw(s.name).to_string();
                tracing::warn!(label = %name, "undefined label at function label scope pop");
                sink.fatal(SymbolError::UndefinedLabel { name });
            }
        }
        if self.labels.pop_scope() {
            let recycled = self.labels.take_symbols();
            self.recycle_pool.extend(recycled);
        }
    }

    /// `sym_lookup` (§4.2), exposed directly for callers that only need
    /// to test visibility without going through `sym_add`.
    pub fn sym_lookup(&mut self, ns_kind: NamespaceKind, name: Name) -> Option<SymbolId> {
        self.namespace_mut(ns_kind).lookup(name)
    }

    #[must_use]
    pub fn symbol(&self, ns_kind: NamespaceKind, id: SymbolId) -> &Symbol {
        self.namespace(ns_kind).get(id)
    }

    /// The declarator merge algorithm (§4.3). `ns_kind` must not be
    /// `Labels` (labels are declared through [`SymbolTable::sym_reference_label`]
    /// / [`SymbolTable::sym_define_label`] instead); `symtype = Tag` requires
    /// `ns_kind = Tags`.
    #[instrument(level = "debug", skip(self, ty, sink))]
    pub fn sym_add(
        &mut self,
        ns_kind: NamespaceKind,
        name: Name,
        ty: Type,
        symtype: SymType,
        linkage: Linkage,
        sink: &mut dyn DiagnosticSink,
    ) -> SymbolResult<SymbolId> {
        debug_assert!(ns_kind != NamespaceKind::Labels, "labels use the dedicated label API");
        debug_assert!(symtype != SymType::Label, "labels use the dedicated label API");
        debug_assert!(
            symtype != SymType::Tag || ns_kind == NamespaceKind::Tags,
            "a TAG symtype must be declared in the tags namespace"
        );

        let depth = self.namespace(ns_kind).depth();

        let scope_hit = self.namespace_mut(ns_kind).lookup(name);

        let (existing_id, from_registry) = match scope_hit {
            Some(id) => (id, false),
            None if ns_kind == NamespaceKind::Identifiers && ty.is_function() => {
                match self.function_registry.get(&name).copied() {
                    Some(id) => (id, true),
                    None => return Ok(self.create_symbol(ns_kind, name, ty, symtype, linkage, depth)),
                }
            }
            None => return Ok(self.create_symbol(ns_kind, name, ty, symtype, linkage, depth)),
        };

        if from_registry {
            // §4.3a: a registry hit was not found by the ordinary lexical
            // scan, so it is revealed in the current scope instead of
            // merged through the R1-R8 table.
            let coerced = self.coerce_type(NamespaceKind::Identifiers, name, existing_id, &ty, sink)?;
            let sym = self.identifiers.get_mut(existing_id);
            sym.ty = coerced;
            if (depth as u32) < sym.depth {
                sym.depth = depth as u32;
            }
            self.identifiers.bind_in_current_scope(name, existing_id);
            return Ok(existing_id);
        }

        self.merge_declarator(ns_kind, existing_id, name, ty, symtype, linkage, depth, sink)
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_declarator(
        &mut self,
        ns_kind: NamespaceKind,
        existing_id: SymbolId,
        name: Name,
        ty: Type,
        symtype: SymType,
        linkage: Linkage,
        depth: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> SymbolResult<SymbolId> {
        let s = self.namespace(ns_kind).get(existing_id).clone();
        let file = depth == 0;
        let same_depth = s.depth as usize == depth;

        // R1: an `extern` re-declaration of a tentative/defined symbol
        // always just coerces and returns, at any depth.
        if linkage == Linkage::Extern
            && symtype == SymType::Declaration
            && matches!(s.symtype, SymType::Tentative | SymType::Definition)
        {
            tracing::debug!(row = "R1", name = %self.interner.raw(name), "extern declaration coerces into existing symbol");
            let coerced = self.coerce_type(ns_kind, name, existing_id, &ty, sink)?;
            self.namespace_mut(ns_kind).get_mut(existing_id).ty = coerced;
            return Ok(existing_id);
        }

        if !same_depth {
            // R8: shadowing at a different depth; nothing to merge.
            tracing::debug!(row = "R8", name = %self.interner.raw(name), "different-depth shadowing, creating new symbol");
            return Ok(self.create_symbol(ns_kind, name, ty, symtype, linkage, depth));
        }

        if !file {
            // R7: same block, same name, twice.
            tracing::debug!(row = "R7", name = %self.interner.raw(name), "duplicate definition in the same block");
            let err = SymbolError::DuplicateDefinition { name: self.interner.raw(name).to_string() };
            sink.fatal(err.clone());
            return Err(err);
        }

        if s.linkage != linkage {
            tracing::debug!(row = "R5", name = %self.interner.raw(name), "linkage mismatch at file scope");
            let err = SymbolError::LinkageMismatch { name: self.interner.raw(name).to_string() };
            sink.fatal(err.clone());
            return Err(err);
        }

        match (s.symtype, symtype) {
            // R2
            (SymType::Tentative, SymType::Definition) | (SymType::Definition, SymType::Tentative) => {
                tracing::debug!(row = "R2", name = %self.interner.raw(name), "tentative/definition pair collapses to definition");
                let coerced = self.coerce_type(ns_kind, name, existing_id, &ty, sink)?;
                let sym = self.namespace_mut(ns_kind).get_mut(existing_id);
                sym.ty = coerced;
                sym.symtype = SymType::Definition;
                Ok(existing_id)
            }
            // R3
            (SymType::Declaration, SymType::Tentative) => {
                tracing::debug!(row = "R3", name = %self.interner.raw(name), "declaration upgraded to tentative");
                let coerced = self.coerce_type(ns_kind, name, existing_id, &ty, sink)?;
                let sym = self.namespace_mut(ns_kind).get_mut(existing_id);
                sym.ty = coerced;
                sym.symtype = SymType::Tentative;
                Ok(existing_id)
            }
            // R4
            (SymType::Definition, SymType::Declaration) => {
                if s.ty.type_equal(&ty) {
                    tracing::debug!(row = "R4", name = %self.interner.raw(name), "declaration after definition, types agree");
                    Ok(existing_id)
                } else {
                    tracing::debug!(row = "R4", name = %self.interner.raw(name), "declaration after definition, type conflict");
                    let err = SymbolError::TypeConflict {
                        name: self.interner.raw(name).to_string(),
                        previous: s.ty.clone(),
                        new: ty,
                    };
                    sink.fatal(err.clone());
                    Err(err)
                }
            }
            // R6: identical symtype, identical linkage, at file scope.
            (a, b) if a == b => {
                tracing::debug!(row = "R6", name = %self.interner.raw(name), "idempotent redeclaration");
                let coerced = self.coerce_type(ns_kind, name, existing_id, &ty, sink)?;
                self.namespace_mut(ns_kind).get_mut(existing_id).ty = coerced;
                Ok(existing_id)
            }
            // R5: every other same-depth, file-scope combination.
            _ => {
                tracing::debug!(row = "R5", name = %self.interner.raw(name), "symtype mismatch at file scope");
                let err = SymbolError::LinkageMismatch { name: self.interner.raw(name).to_string() };
                sink.fatal(err.clone());
                Err(err)
            }
        }
    }

    fn create_symbol(
        &mut self,
        ns_kind: NamespaceKind,
        name: Name,
        ty: Type,
        symtype: SymType,
        linkage: Linkage,
        depth: usize,
    ) -> SymbolId {
        let mut symbol = Symbol::new(name, ty.clone(), symtype, linkage, depth as u32);
        if linkage == Linkage::Intern && depth > 0 {
            self.counter_static_block += 1;
            symbol.n = self.counter_static_block;
        }

        let id = self.namespace_mut(ns_kind).append(symbol);
        self.namespace_mut(ns_kind).bind_in_current_scope(name, id);

        if ns_kind == NamespaceKind::Identifiers {
            if name == self.memcpy_name && self.decl_memcpy.is_none() {
                self.decl_memcpy = Some(id);
            }
            if ty.is_function() {
                self.function_registry.insert(name, id);
            }
        }
        id
    }

    /// `sym_reference_label`: a `goto` target seen before its label is
    /// defined. Looks up first so repeated forward references to the
    /// same label share one symbol.
    pub fn sym_reference_label(&mut self, name: Name) -> SymbolId {
        if let Some(id) = self.labels.lookup(name) {
            return id;
        }
        let depth = self.labels.depth() as u32;
        let symbol = Symbol::new(name, Type::void(), SymType::Tentative, Linkage::Intern, depth);
        let id = self.labels.append(symbol);
        self.labels.bind_in_current_scope(name, id);
        id
    }

    /// `sym_define_label`: a `label:` definition. Upgrades a prior
    /// forward reference to `DEFINITION`, or creates the symbol directly
    /// if this is the label's first mention. A second definition of the
    /// same label is a duplicate-definition error.
    pub fn sym_define_label(&mut self, name: Name, sink: &mut dyn DiagnosticSink) -> SymbolResult<SymbolId> {
        if let Some(id) = self.labels.lookup(name) {
            let sym = self.labels.get_mut(id);
            if sym.symtype == SymType::Definition {
                let err = SymbolError::DuplicateDefinition { name: self.interner.raw(name).to_string() };
                sink.fatal(err.clone());
                return Err(err);
            }
            sym.symtype = SymType::Definition;
            return Ok(id);
        }
        let depth = self.labels.depth() as u32;
        let symbol = Symbol::new(name, Type::void(), SymType::Definition, Linkage::Intern, depth);
        let id = self.labels.append(symbol);
        self.labels.bind_in_current_scope(name, id);
        Ok(id)
    }

    /// Synthetic internal jump target (§4.5 "Label"). Unlike user labels,
    /// these are never looked up by name, so they are appended to the
    /// label namespace's list but never bound into a scope frame.
    pub fn sym_create_label(&mut self) -> SymbolId {
        self.counter_l += 1;
        let depth = self.labels.depth() as u32;
        let symbol = self.recycle(self.prefix_l, Type::void(), SymType::Label, Linkage::Intern, depth, self.counter_l);
        self.labels.append(symbol)
    }

    /// §4.5 "Temporary". Detached from every namespace: the caller owns
    /// the returned value outright and may feed it back to
    /// [`SymbolTable::sym_discard`] when done with it.
    pub fn sym_create_temporary(&mut self, ty: Type) -> Symbol {
        self.counter_t += 1;
        self.recycle(self.prefix_t, ty, SymType::Definition, Linkage::None, 0, self.counter_t)
    }

    /// Returns a discarded temporary to the shared recycle pool (§3).
    pub fn sym_discard(&mut self, temporary: Symbol) {
        self.recycle_pool.push(temporary);
    }

    /// §4.5 "Anonymous" (anonymous aggregates introduced by the parser).
    pub fn sym_create_anonymous(&mut self, ty: Type, depth: u32) -> SymbolId {
        self.counter_u += 1;
        let linkage = if depth == 0 { Linkage::Intern } else { Linkage::None };
        let mut symbol = Symbol::new(self.prefix_u, ty, SymType::Definition, linkage, depth);
        symbol.n = self.counter_u;
        self.identifiers.append(symbol)
    }

    /// §4.5 "Constant", integer case.
    pub fn sym_create_int_constant(&mut self, ty: Type, value: i64) -> SymbolId {
        self.counter_c += 1;
        let mut symbol = Symbol::new(self.prefix_c, ty, SymType::Constant, Linkage::Intern, 0);
        symbol.n = self.counter_c;
        symbol.value = SymbolValue::Int(value);
        self.identifiers.append(symbol)
    }

    /// §4.5 "Constant", floating-point case.
    pub fn sym_create_float_constant(&mut self, ty: Type, value: f64) -> SymbolId {
        self.counter_c += 1;
        let mut symbol = Symbol::new(self.prefix_c, ty, SymType::Constant, Linkage::Intern, 0);
        symbol.n = self.counter_c;
        symbol.value = SymbolValue::Float(value);
        self.identifiers.append(symbol)
    }

    /// §4.5 "String literal". `bytes` excludes the terminating null; the
    /// array type's length includes it.
    pub fn sym_create_string(&mut self, bytes: &str) -> SymbolId {
        self.counter_s += 1;
        let interned = self.interner.intern(bytes);
        let ty = Type::array(Type::char(true), Some(bytes.len() as u64 + 1));
        let mut symbol = Symbol::new(self.prefix_lc, ty, SymType::StringValue, Linkage::Intern, 0);
        symbol.n = self.counter_s;
        symbol.value = SymbolValue::Str(interned);
        self.identifiers.append(symbol)
    }

    #[allow(clippy::too_many_arguments)]
    fn recycle(&mut self, name: Name, ty: Type, symtype: SymType, linkage: Linkage, depth: u32, n: u32) -> Symbol {
        let mut symbol = self.recycle_pool.pop().unwrap_or_else(|| Symbol::new(name, ty.clone(), symtype, linkage, depth));
        symbol.name = name;
        symbol.n = n;
        symbol.ty = ty;
        symbol.symtype = symtype;
        symbol.linkage = linkage;
        symbol.depth = depth;
        symbol.referenced = false;
        symbol.value = SymbolValue::None;
        symbol.stack_offset = None;
        symbol
    }

    /// Runs `apply_type` against `existing_id`'s current type and `new`,
    /// reporting a named [`SymbolError::TypeConflict`] to `sink` on
    /// mismatch.
    fn coerce_type(
        &mut self,
        ns_kind: NamespaceKind,
        name: Name,
        existing_id: SymbolId,
        new: &Type,
        sink: &mut dyn DiagnosticSink,
    ) -> SymbolResult<Type> {
        let existing = self.namespace(ns_kind).get(existing_id);
        apply_type(existing, new).map_err(|(previous, new)| {
            let err = SymbolError::TypeConflict { name: self.interner.raw(name).to_string(), previous, new };
            sink.fatal(err.clone());
            err
        })
    }

    /// `sym_name` (§4.6): the back-end-facing spelling.
    #[must_use]
    pub fn sym_name(&self, symbol: &Symbol) -> String {
        let raw = self.interner.raw(symbol.name);
        if symbol.n == 0 {
            raw.to_string()
        } else if raw.starts_with('.') {
            format!("{raw}{}", symbol.n)
        } else {
            format!("{raw}.{}", symbol.n)
        }
    }

    /// `yield_declaration` (§4.7): advances `ns_kind`'s cursor to the next
    /// symbol worth emitting.
    pub fn yield_declaration(&mut self, ns_kind: NamespaceKind) -> Option<SymbolId> {
        let memcpy = self.decl_memcpy;
        self.namespace_mut(ns_kind).yield_next(|id, s| match s.symtype {
            SymType::Tentative | SymType::StringValue => true,
            SymType::Constant => s.ty.is_float(),
            SymType::Declaration => s.linkage == Linkage::Extern && (s.referenced || Some(id) == memcpy),
            SymType::Definition => true,
            SymType::Typedef | SymType::Tag | SymType::Label => false,
        })
    }

    /// A textual, one-symbol-per-line dump of all three namespaces,
    /// indented by scope depth (§6 "Debug output"). Informational only —
    /// no part of the core's behavior depends on this format.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (label, ns) in [
            ("identifiers", &self.identifiers),
            ("labels", &self.labels),
            ("tags", &self.tags),
        ] {
            let _ = writeln!(out, "; {label}");
            for s in ns.symbols() {
                let indent = " ".repeat(s.depth as usize * 2);
                let name = self.sym_name(s);
                let size = s.ty.size_of().map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
                let _ = write!(
                    out,
                    "{indent}{:?} {:?} {name}: {} (size {size})",
                    s.linkage, s.symtype, s.ty
                );
                if let Some(offset) = s.stack_offset {
                    let _ = write!(out, " @{offset}");
                }
                match &s.value {
                    SymbolValue::Int(v) => {
                        let _ = write!(out, " = {v}");
                    }
                    SymbolValue::Float(v) => {
                        let _ = write!(out, " = {v}");
                    }
                    SymbolValue::Str(n) => {
                        let _ = write!(out, " = {:?}", self.interner.raw(*n));
                    }
                    SymbolValue::VlaAddress(id) => {
                        let _ = write!(out, " -> #{}", id.index());
                    }
                    SymbolValue::None => {}
                }
                let _ = writeln!(out);
            }
        }
        out
    }
}

/// `apply_type` (§4.4): reconciles an existing symbol's type against a
/// newly-seen one. On conflict, returns the `(previous, new)` pair for
/// the caller to name and report.
fn apply_type(existing: &Symbol, new: &Type) -> Result<Type, (Type, Type)> {
    if existing.ty.type_equal(new) && (!existing.ty.is_function() || existing.symtype == SymType::Definition) {
        return Ok(existing.ty.clone());
    }

    let conflict = || (existing.ty.clone(), new.clone());

    if existing.ty.is_function() && new.is_function() {
        let ret_ok = existing
            .ty
            .type_next()
            .zip(new.type_next())
            .map(|(a, b)| a.type_equal(&b))
            .unwrap_or(false);
        if !ret_ok {
            return Err(conflict());
        }
        if !existing.ty.is_prototyped() || !new.is_prototyped() {
            return Ok(new.clone());
        }
        if existing.ty.nmembers() == new.nmembers() {
            return Ok(new.clone());
        }
        return Err(conflict());
    }

    if existing.ty.is_array() && new.is_array() {
        let element_ok = existing
            .ty
            .type_next()
            .zip(new.type_next())
            .map(|(a, b)| a.type_equal(&b))
            .unwrap_or(false);
        if !element_ok {
            return Err(conflict());
        }
        return match (existing.ty.type_array_len(), new.type_array_len()) {
            (None, Some(len)) => Ok(existing.ty.set_array_length(len)),
            (Some(a), Some(b)) if a == b => Ok(existing.ty.clone()),
            (Some(_), Some(_)) => Err(conflict()),
            (_, None) => Ok(existing.ty.clone()),
        };
    }

    Err(conflict())
}
