//! End-to-end scenarios from the declarator-merge specification,
//! exercised through the public `SymbolTable` API only.

use csym_diagnostics::{CollectingSink, SymbolError};
use csym_table::{Linkage, NamespaceKind, SymType, SymbolTable};
use csym_types::Type;

fn int() -> Type {
    Type::int(true)
}

#[test]
fn extern_then_tentative_then_definition_collapses_to_one_file_scope_symbol() {
    let mut t = SymbolTable::new();
    let mut sink = CollectingSink::new();
    let x = t.interner.intern("x");

    t.push_scope();
    let a = t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Declaration, Linkage::Extern, &mut sink).unwrap();
    let b = t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Tentative, Linkage::Extern, &mut sink).unwrap();
    let c = t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Definition, Linkage::Extern, &mut sink).unwrap();
    t.pop_scope();

    assert!(sink.is_empty());
    assert_eq!(a, b);
    assert_eq!(b, c);
    let sym = t.symbol(NamespaceKind::Identifiers, c);
    assert_eq!(sym.symtype, SymType::Definition);
    assert_eq!(sym.linkage, Linkage::Extern);
    assert_eq!(sym.depth, 0);
    assert_eq!(sym.n, 0);
}

#[test]
fn inner_block_declaration_unifies_with_outer_file_scope_definition() {
    let mut t = SymbolTable::new();
    let mut sink = CollectingSink::new();
    let f = t.interner.intern("f");
    let fn_ty = Type::function(int(), vec![int()], true, false);

    t.push_scope();
    let outer = t
        .sym_add(NamespaceKind::Identifiers, f, fn_ty.clone(), SymType::Declaration, Linkage::Extern, &mut sink)
        .unwrap();

    t.push_scope();
    let inner = t
        .sym_add(NamespaceKind::Identifiers, f, fn_ty.clone(), SymType::Declaration, Linkage::Extern, &mut sink)
        .unwrap();
    t.pop_scope();

    let def = t.sym_add(NamespaceKind::Identifiers, f, fn_ty, SymType::Definition, Linkage::Extern, &mut sink).unwrap();
    t.pop_scope();

    assert!(sink.is_empty());
    assert_eq!(outer, inner);
    assert_eq!(outer, def);
    let sym = t.symbol(NamespaceKind::Identifiers, def);
    assert_eq!(sym.depth, 0, "unification lowers depth to the shallowest declaration");
    assert_eq!(sym.symtype, SymType::Definition);
}

#[test]
fn second_block_scope_definition_of_the_same_name_is_a_fatal_duplicate() {
    let mut t = SymbolTable::new();
    let mut sink = CollectingSink::new();
    let x = t.interner.intern("x");

    t.push_scope();
    t.push_scope();
    t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Definition, Linkage::Intern, &mut sink).unwrap();
    let err = t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Definition, Linkage::Intern, &mut sink);
    t.pop_scope();
    t.pop_scope();

    assert!(matches!(err, Err(SymbolError::DuplicateDefinition { name }) if name == "x"));
    assert_eq!(sink.errors.len(), 1);
}

#[test]
fn file_scope_redeclaration_with_an_incompatible_type_is_fatal() {
    let mut t = SymbolTable::new();
    let mut sink = CollectingSink::new();
    let x = t.interner.intern("x");

    t.push_scope();
    t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Definition, Linkage::Extern, &mut sink).unwrap();
    let err = t.sym_add(NamespaceKind::Identifiers, x, Type::float(), SymType::Definition, Linkage::Extern, &mut sink);
    t.pop_scope();

    assert!(matches!(err, Err(SymbolError::TypeConflict { .. })));
    assert_eq!(sink.errors.len(), 1);
}

#[test]
fn creating_and_discarding_a_thousand_temporaries_bounds_the_recycle_pool() {
    let mut t = SymbolTable::new();
    let mut created = Vec::new();
    for _ in 0..1000 {
        created.push(t.sym_create_temporary(int()));
    }
    for temp in created {
        t.sym_discard(temp);
    }
    assert_eq!(t.recycle_pool_len(), 1000);

    for _ in 0..1000 {
        let temp = t.sym_create_temporary(int());
        t.sym_discard(temp);
    }
    assert_eq!(t.recycle_pool_len(), 1000, "second round reuses the pool instead of growing it");
}

#[test]
fn yield_declaration_emits_referenced_externs_and_float_constants_only() {
    let mut t = SymbolTable::new();
    let mut sink = CollectingSink::new();
    t.push_scope();

    let unused = t.interner.intern("unused");
    t.sym_add(NamespaceKind::Identifiers, unused, int(), SymType::Declaration, Linkage::Extern, &mut sink).unwrap();

    let used = t.interner.intern("used");
    t.sym_add(NamespaceKind::Identifiers, used, int(), SymType::Declaration, Linkage::Extern, &mut sink).unwrap();
    t.sym_lookup(NamespaceKind::Identifiers, used);

    t.sym_create_float_constant(Type::double(), 3.14);
    t.sym_create_int_constant(int(), 42);

    let mut emitted = Vec::new();
    while let Some(id) = t.yield_declaration(NamespaceKind::Identifiers) {
        emitted.push(t.sym_name(t.symbol(NamespaceKind::Identifiers, id)));
    }
    t.pop_scope();

    assert_eq!(emitted, vec!["used".to_string(), ".C1".to_string()]);
}

#[test]
fn goto_with_no_matching_label_is_undefined_when_the_function_label_scope_pops() {
    let mut t = SymbolTable::new();
    let mut sink = CollectingSink::new();
    let l = t.interner.intern("L");

    t.push_label_scope();
    t.sym_reference_label(l);
    t.pop_label_scope(&mut sink);

    assert_eq!(sink.errors.len(), 1);
    assert!(matches!(&sink.errors[0], SymbolError::UndefinedLabel { name } if name == "L"));
}

#[test]
fn string_literal_array_type_includes_the_terminating_null() {
    let mut t = SymbolTable::new();
    let id = t.sym_create_string("abc");
    let sym = t.symbol(NamespaceKind::Identifiers, id);
    assert_eq!(sym.ty.size_of(), Some(4));
    assert_eq!(sym.symtype, SymType::StringValue);
    assert_eq!(t.sym_name(sym), ".LC1");
}

#[test]
fn block_scope_static_variables_in_two_functions_get_distinct_disambiguators() {
    let mut t = SymbolTable::new();
    let mut sink = CollectingSink::new();
    let x = t.interner.intern("x");

    t.push_scope();
    let a = t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Definition, Linkage::Intern, &mut sink).unwrap();
    t.pop_scope();

    t.push_scope();
    let b = t.sym_add(NamespaceKind::Identifiers, x, int(), SymType::Definition, Linkage::Intern, &mut sink).unwrap();
    t.pop_scope();

    assert_ne!(a, b);
    let sym_a = t.symbol(NamespaceKind::Identifiers, a).clone();
    let sym_b = t.symbol(NamespaceKind::Identifiers, b).clone();
    assert_ne!(sym_a.n, sym_b.n);
    assert_eq!(t.sym_name(&sym_a), format!("x.{}", sym_a.n));
    assert_eq!(t.sym_name(&sym_b), format!("x.{}", sym_b.n));
}
