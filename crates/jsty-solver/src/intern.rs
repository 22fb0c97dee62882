//! Hash-consed type storage.
//!
//! Types are arena-allocated and deduplicated; a `TypeId` is a stable handle
//! into one `TypeStore`. Intrinsic types have fixed ids so the rest of the
//! analyzer can name them without a store lookup.
//!
//! The store also owns the type-variable counter. Counters are
//! instance-local: two stores never share ids, which keeps parallel analyses
//! of different files independent and test ids deterministic.

use rustc_hash::FxHashMap;

/// Handle to an interned type within a `TypeStore`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Gradual escape hatch (no reason recorded).
    pub const ANY: TypeId = TypeId(0);
    /// Not-yet-resolved.
    pub const UNKNOWN: TypeId = TypeId(1);
    /// Unreachable value.
    pub const NEVER: TypeId = TypeId(2);
    /// Universal supertype.
    pub const TOP: TypeId = TypeId(3);
    /// Universal subtype.
    pub const BOTTOM: TypeId = TypeId(4);
    pub const BOOLEAN: TypeId = TypeId(5);
    pub const NUMBER: TypeId = TypeId(6);
    pub const STRING: TypeId = TypeId(7);
    pub const NULL: TypeId = TypeId(8);
    pub const UNDEFINED: TypeId = TypeId(9);
    pub const SYMBOL: TypeId = TypeId(10);
    pub const BIGINT: TypeId = TypeId(11);

    const INTRINSIC_COUNT: u32 = 12;

    #[must_use]
    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::INTRINSIC_COUNT
    }
}

/// Primitive base kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum PrimKind {
    Bool,
    Num,
    Str,
    Null,
    Undef,
    Sym,
    BigInt,
}

impl PrimKind {
    /// Name as rendered in type strings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            PrimKind::Bool => "boolean",
            PrimKind::Num => "number",
            PrimKind::Str => "string",
            PrimKind::Null => "null",
            PrimKind::Undef => "undefined",
            PrimKind::Sym => "symbol",
            PrimKind::BigInt => "bigint",
        }
    }

    /// The intrinsic id of the bare base type.
    #[must_use]
    pub const fn base_id(self) -> TypeId {
        match self {
            PrimKind::Bool => TypeId::BOOLEAN,
            PrimKind::Num => TypeId::NUMBER,
            PrimKind::Str => TypeId::STRING,
            PrimKind::Null => TypeId::NULL,
            PrimKind::Undef => TypeId::UNDEFINED,
            PrimKind::Sym => TypeId::SYMBOL,
            PrimKind::BigInt => TypeId::BIGINT,
        }
    }
}

/// An f64 with bit-level equality/hashing so literal number types can be
/// hash-consed. NaN is normalized to one bit pattern; -0 and +0 stay
/// distinct (they are distinct literals in the source language).
#[derive(Clone, Copy, Debug)]
pub struct Number(pub f64);

impl Number {
    fn bits(self) -> u64 {
        if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bits().cmp(&other.bits())
    }
}

impl std::hash::Hash for Number {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl serde::Serialize for Number {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

/// A literal singleton value refining a primitive base.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum LiteralValue {
    Bool(bool),
    Number(Number),
    String(String),
    BigInt(String),
}

impl LiteralValue {
    /// The base kind this literal refines.
    #[must_use]
    pub const fn base_kind(&self) -> PrimKind {
        match self {
            LiteralValue::Bool(_) => PrimKind::Bool,
            LiteralValue::Number(_) => PrimKind::Num,
            LiteralValue::String(_) => PrimKind::Str,
            LiteralValue::BigInt(_) => PrimKind::BigInt,
        }
    }

    /// Whether the literal is falsy in a condition position.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            LiteralValue::Bool(b) => !b,
            LiteralValue::Number(n) => n.0 == 0.0 || n.0.is_nan(),
            LiteralValue::String(s) => s.is_empty(),
            LiteralValue::BigInt(digits) => digits.trim_start_matches('-') == "0",
        }
    }
}

/// One function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ParamShape {
    pub name: String,
    pub ty: TypeId,
    pub optional: bool,
    pub rest: bool,
}

impl ParamShape {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            rest: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn rest(mut self) -> Self {
        self.rest = true;
        self
    }
}

/// A function type: contravariant in parameters, covariant in the return.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FunctionShape {
    pub params: Vec<ParamShape>,
    pub ret: TypeId,
    pub is_async: bool,
    pub is_generator: bool,
}

impl FunctionShape {
    pub fn new(params: Vec<ParamShape>, ret: TypeId) -> Self {
        Self {
            params,
            ret,
            is_async: false,
            is_generator: false,
        }
    }

    /// Number of parameters a caller must supply.
    #[must_use]
    pub fn required_params(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| !p.optional && !p.rest)
            .count()
    }

    /// Whether the signature accepts `n` arguments.
    #[must_use]
    pub fn accepts_arity(&self, n: usize) -> bool {
        let has_rest = self.params.last().is_some_and(|p| p.rest);
        n >= self.required_params() && (has_rest || n <= self.params.len())
    }
}

/// One record field. Fields are kept sorted by name so records hash-cons
/// into a canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FieldShape {
    pub name: String,
    pub ty: TypeId,
    pub optional: bool,
    pub readonly: bool,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            readonly: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// A class type: nominal by name, structural through its instance record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ClassShape {
    pub name: String,
    /// Constructor signature, when one is declared.
    pub ctor: Option<FunctionShape>,
    /// Record type of instances (`this`).
    pub instance: TypeId,
    /// Record type of static members.
    pub statics: TypeId,
    /// Parent class (`extends`), when declared.
    pub parent: Option<TypeId>,
}

/// The tagged type representation. One variant per lattice constructor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum TypeData {
    /// Inference variable. `level` supports rank-1 let-generalization.
    Var {
        id: u32,
        name: Option<String>,
        level: u32,
    },
    /// Primitive base, optionally refined to a literal singleton.
    Prim {
        kind: PrimKind,
        value: Option<LiteralValue>,
    },
    Function(FunctionShape),
    /// Structural record; fields sorted by name.
    Record { fields: Vec<FieldShape> },
    /// Array; `tuple` carries the fixed-length element sequence when known.
    Array {
        elem: TypeId,
        tuple: Option<Vec<TypeId>>,
    },
    Promise { resolved: TypeId },
    Class(ClassShape),
    /// Positive-polarity join. Canonical: flattened, deduplicated, sorted.
    Union(Vec<TypeId>),
    /// Negative-polarity meet. Canonical: flattened, deduplicated, sorted.
    Intersection(Vec<TypeId>),
    /// `μ var. body`; the binder occurs only at guarded covariant positions.
    Recursive { var: u32, body: TypeId },
    Top,
    Bottom,
    Any { reason: Option<String> },
    Never,
    Unknown,
}

impl TypeData {
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, TypeData::Record { .. })
    }

    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, TypeData::Any { .. })
    }

    /// The literal value when this is a literal primitive.
    #[must_use]
    pub const fn literal(&self) -> Option<&LiteralValue> {
        match self {
            TypeData::Prim {
                value: Some(value), ..
            } => Some(value),
            _ => None,
        }
    }
}

/// Arena + hash-consing store for types.
pub struct TypeStore {
    types: Vec<TypeData>,
    interned: FxHashMap<TypeData, TypeId>,
    next_var: u32,
}

impl TypeStore {
    /// Create a store with the intrinsic types pre-interned at their
    /// fixed ids.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            types: Vec::with_capacity(64),
            interned: FxHashMap::default(),
            next_var: 0,
        };
        // Order must match the TypeId consts.
        store.push(TypeData::Any { reason: None });
        store.push(TypeData::Unknown);
        store.push(TypeData::Never);
        store.push(TypeData::Top);
        store.push(TypeData::Bottom);
        for kind in [
            PrimKind::Bool,
            PrimKind::Num,
            PrimKind::Str,
            PrimKind::Null,
            PrimKind::Undef,
            PrimKind::Sym,
            PrimKind::BigInt,
        ] {
            store.push(TypeData::Prim { kind, value: None });
        }
        debug_assert_eq!(store.types.len() as u32, TypeId::INTRINSIC_COUNT);
        store
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.interned.insert(data.clone(), id);
        self.types.push(data);
        id
    }

    /// Intern a type, returning the canonical handle.
    pub fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.interned.get(&data) {
            return id;
        }
        self.push(data)
    }

    /// Look up the data behind a handle.
    #[must_use]
    pub fn data(&self, id: TypeId) -> &TypeData {
        &self.types[id.0 as usize]
    }

    /// Number of interned types (intrinsics included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false // intrinsics are always present
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// A fresh inference variable at the given generalization level.
    pub fn fresh_var(&mut self, name: Option<&str>, level: u32) -> TypeId {
        let id = self.next_var;
        self.next_var += 1;
        self.intern(TypeData::Var {
            id,
            name: name.map(str::to_owned),
            level,
        })
    }

    /// Look up an existing variable by its variable id.
    pub fn var_ref(&mut self, var: u32, level: u32) -> TypeId {
        self.intern(TypeData::Var {
            id: var,
            name: None,
            level,
        })
    }

    /// Allocate a variable id without interning a node (for recursive
    /// binders).
    pub fn fresh_var_id(&mut self) -> u32 {
        let id = self.next_var;
        self.next_var += 1;
        id
    }

    pub fn literal_bool(&mut self, value: bool) -> TypeId {
        self.intern(TypeData::Prim {
            kind: PrimKind::Bool,
            value: Some(LiteralValue::Bool(value)),
        })
    }

    pub fn literal_number(&mut self, value: f64) -> TypeId {
        self.intern(TypeData::Prim {
            kind: PrimKind::Num,
            value: Some(LiteralValue::Number(Number(value))),
        })
    }

    pub fn literal_string(&mut self, value: impl Into<String>) -> TypeId {
        self.intern(TypeData::Prim {
            kind: PrimKind::Str,
            value: Some(LiteralValue::String(value.into())),
        })
    }

    pub fn literal_bigint(&mut self, digits: impl Into<String>) -> TypeId {
        self.intern(TypeData::Prim {
            kind: PrimKind::BigInt,
            value: Some(LiteralValue::BigInt(digits.into())),
        })
    }

    pub fn any_with_reason(&mut self, reason: impl Into<String>) -> TypeId {
        self.intern(TypeData::Any {
            reason: Some(reason.into()),
        })
    }

    pub fn function(&mut self, params: Vec<ParamShape>, ret: TypeId) -> TypeId {
        self.intern(TypeData::Function(FunctionShape::new(params, ret)))
    }

    pub fn function_shape(&mut self, shape: FunctionShape) -> TypeId {
        self.intern(TypeData::Function(shape))
    }

    /// Intern a record; fields are sorted by name for canonical form.
    /// A duplicate field name keeps the last occurrence (source order wins,
    /// as in object literals).
    pub fn record(&mut self, mut fields: Vec<FieldShape>) -> TypeId {
        fields.reverse();
        let mut seen = rustc_hash::FxHashSet::default();
        fields.retain(|f| seen.insert(f.name.clone()));
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        self.intern(TypeData::Record { fields })
    }

    pub fn array(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Array { elem, tuple: None })
    }

    /// A tuple: a fixed-length array whose element type is the union of the
    /// element types.
    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        let elem = self.union(elems.clone());
        self.intern(TypeData::Array {
            elem,
            tuple: Some(elems),
        })
    }

    pub fn promise(&mut self, resolved: TypeId) -> TypeId {
        self.intern(TypeData::Promise { resolved })
    }

    pub fn class(&mut self, shape: ClassShape) -> TypeId {
        self.intern(TypeData::Class(shape))
    }

    pub fn recursive(&mut self, var: u32, body: TypeId) -> TypeId {
        self.intern(TypeData::Recursive { var, body })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The base type of a literal; non-literals return the type itself.
    #[must_use]
    pub fn literal_base(&self, id: TypeId) -> TypeId {
        match self.data(id) {
            TypeData::Prim {
                kind,
                value: Some(_),
            } => kind.base_id(),
            _ => id,
        }
    }

    /// Whether the type is `null`, `undefined`, or a union containing them.
    #[must_use]
    pub fn is_nullable(&self, id: TypeId) -> bool {
        match self.data(id) {
            TypeData::Prim {
                kind: PrimKind::Null | PrimKind::Undef,
                ..
            } => true,
            TypeData::Union(members) => members.iter().any(|&m| self.is_nullable(m)),
            TypeData::Any { .. } | TypeData::Unknown => true,
            _ => false,
        }
    }

    /// Whether the type is definitely numeric (number or bigint,
    /// literal or base).
    #[must_use]
    pub fn is_numeric(&self, id: TypeId) -> bool {
        matches!(
            self.data(id),
            TypeData::Prim {
                kind: PrimKind::Num | PrimKind::BigInt,
                ..
            }
        )
    }

    /// Whether the type is definitely a string (literal or base).
    #[must_use]
    pub fn is_string(&self, id: TypeId) -> bool {
        matches!(
            self.data(id),
            TypeData::Prim {
                kind: PrimKind::Str,
                ..
            }
        )
    }

    /// Union members, treating a non-union as a singleton list.
    #[must_use]
    pub fn union_members(&self, id: TypeId) -> Vec<TypeId> {
        match self.data(id) {
            TypeData::Union(members) => members.clone(),
            _ => vec![id],
        }
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/intern_tests.rs"]
mod tests;
