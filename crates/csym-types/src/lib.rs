//! Minimal C type representation for the symbol table core.
//!
//! The symbol table core treats the type system as an external
//! collaborator: it consumes an opaque `Type` handle and only needs a
//! handful of predicates and queries on it. This crate is a standalone
//! stand-in for that collaborator — just enough of a C99 type lattice
//! to drive the core's merge logic and its own tests — not a type
//! checker.
//!
//! [`Type`] is a cheap, `Clone`-able handle over a shared type graph,
//! the way a real front-end's type handle would be: two clones of the
//! same `Type` always compare structurally equal, and comparing two
//! independently-built `int`s also compares equal (C types are
//! structural, not nominal, except for tags).

use std::fmt;
use std::rc::Rc;

/// A tag-symbol back-reference, set by the core when a `struct`/`union`/
/// `enum` tag or a `typedef` is declared (§4.3d).
///
/// Modeled as a plain index rather than an owning pointer, per the
/// "Stable pointer semantics" design note: the real symbol lives in the
/// namespace's append-only list, and this handle only indexes into it.
pub type TagHandle = u32;

/// An opaque type handle.
///
/// Cloning a `Type` is an `Rc` bump, not a deep copy; this is the
/// "stable address" the rest of the front-end is assumed to hold onto.
#[derive(Clone, Debug)]
pub struct Type(Rc<TypeKind>);

#[derive(Debug, PartialEq)]
enum TypeKind {
    Void,
    Bool,
    Int { signed: bool, bits: IntWidth },
    Float,
    Double,
    LongDouble,
    Pointer(Type),
    Array { element: Type, length: Option<u64>, tag: Option<TagHandle> },
    Function { returns: Type, params: Vec<Type>, prototyped: bool, variadic: bool },
    Struct { tag: Option<TagHandle> },
    Union { tag: Option<TagHandle> },
    Enum { tag: Option<TagHandle> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntWidth {
    Char,
    Short,
    Int,
    Long,
    LongLong,
}

impl IntWidth {
    const fn size(self) -> u64 {
        match self {
            IntWidth::Char => 1,
            IntWidth::Short => 2,
            IntWidth::Int => 4,
            IntWidth::Long | IntWidth::LongLong => 8,
        }
    }
}

impl Type {
    fn new(kind: TypeKind) -> Self {
        Self(Rc::new(kind))
    }

    #[must_use]
    pub fn void() -> Self {
        Self::new(TypeKind::Void)
    }

    #[must_use]
    pub fn bool_() -> Self {
        Self::new(TypeKind::Bool)
    }

    #[must_use]
    pub fn char(signed: bool) -> Self {
        Self::new(TypeKind::Int { signed, bits: IntWidth::Char })
    }

    #[must_use]
    pub fn short(signed: bool) -> Self {
        Self::new(TypeKind::Int { signed, bits: IntWidth::Short })
    }

    #[must_use]
    pub fn int(signed: bool) -> Self {
        Self::new(TypeKind::Int { signed, bits: IntWidth::Int })
    }

    #[must_use]
    pub fn long(signed: bool) -> Self {
        Self::new(TypeKind::Int { signed, bits: IntWidth::Long })
    }

    #[must_use]
    pub fn long_long(signed: bool) -> Self {
        Self::new(TypeKind::Int { signed, bits: IntWidth::LongLong })
    }

    #[must_use]
    pub fn float() -> Self {
        Self::new(TypeKind::Float)
    }

    #[must_use]
    pub fn double() -> Self {
        Self::new(TypeKind::Double)
    }

    #[must_use]
    pub fn long_double() -> Self {
        Self::new(TypeKind::LongDouble)
    }

    #[must_use]
    pub fn pointer(to: Type) -> Self {
        Self::new(TypeKind::Pointer(to))
    }

    /// An array of `element`, with `length` known or `None` for an
    /// incomplete array (`int a[]`).
    #[must_use]
    pub fn array(element: Type, length: Option<u64>) -> Self {
        Self::new(TypeKind::Array { element, length, tag: None })
    }

    /// A function type. `prototyped` distinguishes `int f(int)` from
    /// the unprototyped `int f()` (§4.4 "Function types").
    #[must_use]
    pub fn function(returns: Type, params: Vec<Type>, prototyped: bool, variadic: bool) -> Self {
        Self::new(TypeKind::Function { returns, params, prototyped, variadic })
    }

    #[must_use]
    pub fn struct_(tag: Option<TagHandle>) -> Self {
        Self::new(TypeKind::Struct { tag })
    }

    #[must_use]
    pub fn union_(tag: Option<TagHandle>) -> Self {
        Self::new(TypeKind::Union { tag })
    }

    #[must_use]
    pub fn enum_(tag: Option<TagHandle>) -> Self {
        Self::new(TypeKind::Enum { tag })
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(*self.0, TypeKind::Function { .. })
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(*self.0, TypeKind::Array { .. })
    }

    #[must_use]
    pub fn is_struct(&self) -> bool {
        matches!(*self.0, TypeKind::Struct { .. })
    }

    #[must_use]
    pub fn is_union(&self) -> bool {
        matches!(*self.0, TypeKind::Union { .. })
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(*self.0, TypeKind::Int { signed: true, .. })
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(*self.0, TypeKind::Float | TypeKind::Double | TypeKind::LongDouble)
    }

    /// Structural type equality — C types are compared by shape, not by
    /// declaration site (except tags, which are compared by handle).
    #[must_use]
    pub fn type_equal(&self, other: &Type) -> bool {
        match (&*self.0, &*other.0) {
            (TypeKind::Void, TypeKind::Void)
            | (TypeKind::Bool, TypeKind::Bool)
            | (TypeKind::Float, TypeKind::Float)
            | (TypeKind::Double, TypeKind::Double)
            | (TypeKind::LongDouble, TypeKind::LongDouble) => true,
            (
                TypeKind::Int { signed: s1, bits: b1 },
                TypeKind::Int { signed: s2, bits: b2 },
            ) => s1 == s2 && b1 == b2,
            (TypeKind::Pointer(a), TypeKind::Pointer(b)) => a.type_equal(b),
            (
                TypeKind::Array { element: e1, length: l1, .. },
                TypeKind::Array { element: e2, length: l2, .. },
            ) => e1.type_equal(e2) && l1 == l2,
            (
                TypeKind::Function { returns: r1, params: p1, prototyped: pr1, variadic: v1 },
                TypeKind::Function { returns: r2, params: p2, prototyped: pr2, variadic: v2 },
            ) => {
                r1.type_equal(r2)
                    && v1 == v2
                    && (!pr1 || !pr2 || (p1.len() == p2.len()
                        && p1.iter().zip(p2).all(|(a, b)| a.type_equal(b))))
            }
            (TypeKind::Struct { tag: t1 }, TypeKind::Struct { tag: t2 })
            | (TypeKind::Union { tag: t1 }, TypeKind::Union { tag: t2 })
            | (TypeKind::Enum { tag: t1 }, TypeKind::Enum { tag: t2 }) => t1 == t2,
            _ => false,
        }
    }

    /// The element type of an array, or the return type of a function.
    /// `None` for any other type.
    #[must_use]
    pub fn type_next(&self) -> Option<Type> {
        match &*self.0 {
            TypeKind::Array { element, .. } => Some(element.clone()),
            TypeKind::Function { returns, .. } => Some(returns.clone()),
            TypeKind::Pointer(inner) => Some(inner.clone()),
            _ => None,
        }
    }

    /// Parameter count for a function type; `0` for anything else.
    #[must_use]
    pub fn nmembers(&self) -> usize {
        match &*self.0 {
            TypeKind::Function { params, .. } => params.len(),
            _ => 0,
        }
    }

    /// `true` when a function type carries a real prototype (as opposed
    /// to the legacy unprototyped `int f()` form).
    #[must_use]
    pub fn is_prototyped(&self) -> bool {
        matches!(&*self.0, TypeKind::Function { prototyped: true, .. })
    }

    #[must_use]
    pub fn is_variadic(&self) -> bool {
        matches!(&*self.0, TypeKind::Function { variadic: true, .. })
    }

    /// Size in bytes, where known. Incomplete arrays, functions, and
    /// untagged aggregates with no member list return `None`.
    #[must_use]
    pub fn size_of(&self) -> Option<u64> {
        match &*self.0 {
            TypeKind::Void => None,
            TypeKind::Bool => Some(1),
            TypeKind::Int { bits, .. } => Some(bits.size()),
            TypeKind::Float => Some(4),
            TypeKind::Double => Some(8),
            TypeKind::LongDouble => Some(16),
            TypeKind::Pointer(_) => Some(8),
            TypeKind::Array { element, length: Some(n), .. } => element.size_of().map(|e| e * n),
            TypeKind::Array { length: None, .. } => None,
            TypeKind::Function { .. } => None,
            TypeKind::Struct { .. } | TypeKind::Union { .. } | TypeKind::Enum { .. } => None,
        }
    }

    /// Declared element count of an array type; `None` if unknown or not
    /// an array.
    #[must_use]
    pub fn type_array_len(&self) -> Option<u64> {
        match &*self.0 {
            TypeKind::Array { length, .. } => *length,
            _ => None,
        }
    }

    /// Replaces an incomplete array's length once it becomes known
    /// (§4.4 "Array types": "If *S*'s length is unknown and *T*'s is
    /// known, adopt *T*'s length"). Returns the updated type; has no
    /// effect (returns a clone of `self`) if `self` is not an array.
    #[must_use]
    pub fn set_array_length(&self, length: u64) -> Type {
        match &*self.0 {
            TypeKind::Array { element, tag, .. } => {
                Type::new(TypeKind::Array { element: element.clone(), length: Some(length), tag: *tag })
            }
            _ => self.clone(),
        }
    }

    /// Associates a `struct`/`union`/`enum` type with the tag symbol
    /// that names it (§4.3d). Returns the updated type; has no effect
    /// on non-aggregate types.
    #[must_use]
    pub fn type_set_tag(&self, tag: TagHandle) -> Type {
        match &*self.0 {
            TypeKind::Struct { .. } => Type::new(TypeKind::Struct { tag: Some(tag) }),
            TypeKind::Union { .. } => Type::new(TypeKind::Union { tag: Some(tag) }),
            TypeKind::Enum { .. } => Type::new(TypeKind::Enum { tag: Some(tag) }),
            _ => self.clone(),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.type_equal(other)
    }
}

impl Eq for Type {}

/// `%t`-style rendering used by the diagnostics collaborator's
/// `printf`-style `error(fmt, …)` (§6).
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            TypeKind::Void => write!(f, "void"),
            TypeKind::Bool => write!(f, "_Bool"),
            TypeKind::Int { signed, bits } => {
                let name = match bits {
                    IntWidth::Char => "char",
                    IntWidth::Short => "short",
                    IntWidth::Int => "int",
                    IntWidth::Long => "long",
                    IntWidth::LongLong => "long long",
                };
                if *signed {
                    write!(f, "{name}")
                } else {
                    write!(f, "unsigned {name}")
                }
            }
            TypeKind::Float => write!(f, "float"),
            TypeKind::Double => write!(f, "double"),
            TypeKind::LongDouble => write!(f, "long double"),
            TypeKind::Pointer(inner) => write!(f, "{inner} *"),
            TypeKind::Array { element, length: Some(n), .. } => write!(f, "{element} [{n}]"),
            TypeKind::Array { element, length: None, .. } => write!(f, "{element} []"),
            TypeKind::Function { returns, params, .. } => {
                write!(f, "{returns} (")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
            TypeKind::Struct { .. } => write!(f, "struct"),
            TypeKind::Union { .. } => write!(f, "union"),
            TypeKind::Enum { .. } => write!(f, "enum"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_identity() {
        assert!(Type::int(true).type_equal(&Type::int(true)));
        assert!(!Type::int(true).type_equal(&Type::int(false)));
        assert!(!Type::int(true).type_equal(&Type::float()));
    }

    #[test]
    fn array_length_coercion() {
        let unknown = Type::array(Type::char(true), None);
        let known = unknown.set_array_length(4);
        assert_eq!(known.type_array_len(), Some(4));
        assert_eq!(known.size_of(), Some(4));
    }

    #[test]
    fn function_prototype_equality() {
        let a = Type::function(Type::int(true), vec![Type::int(true)], true, false);
        let b = Type::function(Type::int(true), vec![Type::int(true)], true, false);
        let c = Type::function(Type::int(true), vec![], false, false);
        assert!(a.type_equal(&b));
        // unprototyped declarations are compatible regardless of the other's param list
        assert!(a.type_equal(&c));
    }

    #[test]
    fn tags_compare_by_handle() {
        let s1 = Type::struct_(Some(1));
        let s2 = Type::struct_(Some(1));
        let s3 = Type::struct_(Some(2));
        assert!(s1.type_equal(&s2));
        assert!(!s1.type_equal(&s3));
    }

    #[test]
    fn display_renders_c_style_spelling() {
        assert_eq!(Type::int(true).to_string(), "int");
        assert_eq!(Type::int(false).to_string(), "unsigned int");
        assert_eq!(Type::pointer(Type::char(true)).to_string(), "char *");
    }
}
