//! The type system (component D): an interning registry of type shapes plus
//! the compatibility/coercion rules the parser consults while it builds the
//! AST. Grounded in the teacher's `TypeContext` registry (arena + dedup map
//! + `TypeId` handles), generalized from that crate's tree-sitter node-type
//! shapes to primitive/pointer/reference/array/struct/union/enum/function
//! shapes and given an explicit mutable/immutable axis.

use std::collections::HashMap;

use ollie_core::Symbol;

/// A handle into the [`TypeRegistry`]'s arena. Stable for the lifetime of
/// the registry; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Mutability {
    Mutable,
    Immutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Primitive {
    Void,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Char,
    Bool,
}

impl Primitive {
    pub fn is_floating_point(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64)
    }

    pub fn size_bytes(self) -> u32 {
        match self {
            Primitive::Void => 0,
            Primitive::U8 | Primitive::I8 | Primitive::Char | Primitive::Bool => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
        }
    }

    /// A coarse rank used to decide which of two primitives a binary
    /// expression's result should widen to. Higher ranks win.
    pub fn rank(self) -> u8 {
        match self {
            Primitive::Void => 0,
            Primitive::Bool => 1,
            Primitive::Char | Primitive::I8 | Primitive::U8 => 2,
            Primitive::I16 | Primitive::U16 => 3,
            Primitive::I32 | Primitive::U32 => 4,
            Primitive::I64 | Primitive::U64 => 5,
            Primitive::F32 => 6,
            Primitive::F64 => 7,
        }
    }
}

/// A struct or union field: name plus its type.
pub type Field = (Symbol, TypeId);

/// The structural shape of a type, independent of its mutability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Class {
    Basic(Primitive),
    Pointer { points_to: TypeId },
    Reference { references: TypeId },
    /// `num_members == 0` means an incomplete (unbounded) array.
    Array { member_type: TypeId, num_members: u32 },
    Struct { name: Symbol, fields: Vec<Field>, complete: bool },
    Union { name: Symbol, members: Vec<Field> },
    Enum { name: Symbol, members: Vec<(Symbol, i64)>, repr: TypeId },
    FunctionSignature { params: Vec<TypeId>, return_type: TypeId, is_public: bool },
    /// A `define X as Y` alias. Dealiasing walks `points_to_real`.
    Alias { name: Symbol, points_to_real: TypeId },
}

/// An interned `(shape, mutability)` pair; the unit of equality the registry
/// dedups pointer/reference/array/basic types on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TypeShape {
    pub class: Class,
    pub mutability: Mutability,
}

/// Structural keys eligible for content-based deduplication. Named types
/// (struct/union/enum/alias/function signature) are *not* deduped this way:
/// each `define`/`struct`/`fn` introduces a fresh nominal type even if its
/// shape happens to match an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Basic(Primitive, Mutability),
    Pointer(TypeId, Mutability),
    Reference(TypeId, Mutability),
    Array(TypeId, u32, Mutability),
}

/// The type registry: an arena of [`TypeShape`]s addressed by [`TypeId`],
/// with structural interning for the unbounded type constructors (pointers,
/// references, arrays) and a lookup table of named types.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypeRegistry {
    shapes: Vec<TypeShape>,
    /// Interning accelerator, not part of the logical data; rebuilt lazily
    /// (callers that only read a deserialized registry never need it).
    #[serde(skip)]
    dedup: HashMap<DedupKey, TypeId>,
    #[serde(skip)]
    primitives: HashMap<(Primitive, Mutability), TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            shapes: Vec::new(),
            dedup: HashMap::new(),
            primitives: HashMap::new(),
        };
        for &prim in &[
            Primitive::Void,
            Primitive::U8,
            Primitive::I8,
            Primitive::U16,
            Primitive::I16,
            Primitive::U32,
            Primitive::I32,
            Primitive::U64,
            Primitive::I64,
            Primitive::F32,
            Primitive::F64,
            Primitive::Char,
            Primitive::Bool,
        ] {
            for &mutability in &[Mutability::Mutable, Mutability::Immutable] {
                let id = reg.push(TypeShape { class: Class::Basic(prim), mutability });
                reg.primitives.insert((prim, mutability), id);
                reg.dedup.insert(DedupKey::Basic(prim, mutability), id);
            }
        }
        reg
    }

    fn push(&mut self, shape: TypeShape) -> TypeId {
        let id = TypeId(self.shapes.len() as u32);
        self.shapes.push(shape);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeShape {
        &self.shapes[id.as_u32() as usize]
    }

    pub fn basic(&self, prim: Primitive, mutability: Mutability) -> TypeId {
        self.primitives[&(prim, mutability)]
    }

    pub fn void(&self) -> TypeId {
        self.basic(Primitive::Void, Mutability::Immutable)
    }

    pub fn pointer_to(&mut self, points_to: TypeId, mutability: Mutability) -> TypeId {
        let key = DedupKey::Pointer(points_to, mutability);
        if let Some(&id) = self.dedup.get(&key) {
            return id;
        }
        let id = self.push(TypeShape { class: Class::Pointer { points_to }, mutability });
        self.dedup.insert(key, id);
        id
    }

    pub fn reference_to(&mut self, references: TypeId, mutability: Mutability) -> TypeId {
        let key = DedupKey::Reference(references, mutability);
        if let Some(&id) = self.dedup.get(&key) {
            return id;
        }
        let id = self.push(TypeShape { class: Class::Reference { references }, mutability });
        self.dedup.insert(key, id);
        id
    }

    pub fn array_of(&mut self, member_type: TypeId, num_members: u32, mutability: Mutability) -> TypeId {
        let key = DedupKey::Array(member_type, num_members, mutability);
        if let Some(&id) = self.dedup.get(&key) {
            return id;
        }
        let id = self.push(TypeShape {
            class: Class::Array { member_type, num_members },
            mutability,
        });
        self.dedup.insert(key, id);
        id
    }

    /// Allocates a fresh (not yet finalized) struct with no fields, in both
    /// mutable and immutable forms, for incremental construction while its
    /// field list is being parsed. Returns the immutable id; its mutable
    /// counterpart is always `immutable_id.as_u32() + 1` by construction of
    /// [`Self::define_paired`], but callers should use
    /// [`Self::sibling_mutability`] rather than relying on that.
    pub fn begin_struct(&mut self, name: Symbol) -> (TypeId, TypeId) {
        self.define_paired(Class::Struct { name, fields: Vec::new(), complete: false })
    }

    pub fn begin_union(&mut self, name: Symbol) -> (TypeId, TypeId) {
        self.define_paired(Class::Union { name, members: Vec::new() })
    }

    fn define_paired(&mut self, class: Class) -> (TypeId, TypeId) {
        let immutable = self.push(TypeShape { class: class.clone(), mutability: Mutability::Immutable });
        let mutable = self.push(TypeShape { class, mutability: Mutability::Mutable });
        (immutable, mutable)
    }

    /// Appends a field to both halves of a struct pair created by
    /// [`Self::begin_struct`].
    pub fn push_struct_field(&mut self, immutable: TypeId, mutable: TypeId, field: Field) {
        for id in [immutable, mutable] {
            if let Class::Struct { fields, .. } = &mut self.shapes[id.as_u32() as usize].class {
                fields.push(field);
            }
        }
    }

    pub fn push_union_member(&mut self, immutable: TypeId, mutable: TypeId, member: Field) {
        for id in [immutable, mutable] {
            if let Class::Union { members, .. } = &mut self.shapes[id.as_u32() as usize].class {
                members.push(member);
            }
        }
    }

    pub fn finish_struct(&mut self, immutable: TypeId, mutable: TypeId) {
        for id in [immutable, mutable] {
            if let Class::Struct { complete, .. } = &mut self.shapes[id.as_u32() as usize].class {
                *complete = true;
            }
        }
    }

    pub fn define_enum(&mut self, name: Symbol, members: Vec<(Symbol, i64)>, repr: TypeId) -> (TypeId, TypeId) {
        self.define_paired(Class::Enum { name, members, repr })
    }

    pub fn define_function_signature(
        &mut self,
        params: Vec<TypeId>,
        return_type: TypeId,
        is_public: bool,
    ) -> TypeId {
        self.push(TypeShape {
            class: Class::FunctionSignature { params, return_type, is_public },
            mutability: Mutability::Immutable,
        })
    }

    pub fn define_alias(&mut self, name: Symbol, points_to_real: TypeId, mutability: Mutability) -> TypeId {
        self.push(TypeShape { class: Class::Alias { name, points_to_real }, mutability })
    }

    /// Follows `Alias` chains down to the first non-alias type.
    pub fn dealias(&self, mut id: TypeId) -> TypeId {
        loop {
            match &self.get(id).class {
                Class::Alias { points_to_real, .. } => id = *points_to_real,
                _ => return id,
            }
        }
    }

    pub fn mutability(&self, id: TypeId) -> Mutability {
        self.get(id).mutability
    }

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.get(self.dealias(id)).class, Class::Basic(Primitive::Void))
    }

    pub fn is_floating_point(&self, id: TypeId) -> bool {
        matches!(self.get(self.dealias(id)).class, Class::Basic(p) if p.is_floating_point())
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.get(self.dealias(id)).class, Class::Pointer { .. })
    }

    pub fn is_reference(&self, id: TypeId) -> bool {
        matches!(self.get(self.dealias(id)).class, Class::Reference { .. })
    }

    /// Structs, unions and arrays denote addressable memory regions whose
    /// address can be taken directly; pointers are themselves values that
    /// point *at* a region rather than being one.
    pub fn is_memory_region(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.dealias(id)).class,
            Class::Struct { .. } | Class::Union { .. } | Class::Array { .. }
        )
    }

    pub fn is_complete(&self, id: TypeId) -> bool {
        match &self.get(self.dealias(id)).class {
            Class::Array { num_members, .. } => *num_members > 0,
            Class::Struct { complete, .. } => *complete,
            _ => true,
        }
    }

    pub fn is_enum(&self, id: TypeId) -> bool {
        matches!(self.get(self.dealias(id)).class, Class::Enum { .. })
    }

    pub fn enum_members(&self, id: TypeId) -> Option<&[(Symbol, i64)]> {
        match &self.get(self.dealias(id)).class {
            Class::Enum { members, .. } => Some(members),
            _ => None,
        }
    }

    pub fn struct_field(&self, id: TypeId, name: Symbol) -> Option<TypeId> {
        match &self.get(self.dealias(id)).class {
            Class::Struct { fields, .. } => fields.iter().find(|(n, _)| *n == name).map(|(_, t)| *t),
            _ => None,
        }
    }

    pub fn union_member(&self, id: TypeId, name: Symbol) -> Option<TypeId> {
        match &self.get(self.dealias(id)).class {
            Class::Union { members, .. } => members.iter().find(|(n, _)| *n == name).map(|(_, t)| *t),
            _ => None,
        }
    }

    pub fn function_return_type(&self, id: TypeId) -> Option<TypeId> {
        match &self.get(self.dealias(id)).class {
            Class::FunctionSignature { return_type, .. } => Some(*return_type),
            _ => None,
        }
    }

    pub fn function_params(&self, id: TypeId) -> Option<&[TypeId]> {
        match &self.get(self.dealias(id)).class {
            Class::FunctionSignature { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match &self.get(self.dealias(id)).class {
            Class::Pointer { points_to } => Some(*points_to),
            Class::Array { member_type, .. } => Some(*member_type),
            _ => None,
        }
    }

    /// The type a `Reference` aliases, or `None` if `id` isn't a reference.
    pub fn reference_target(&self, id: TypeId) -> Option<TypeId> {
        match &self.get(self.dealias(id)).class {
            Class::Reference { references } => Some(*references),
            _ => None,
        }
    }

    /// True for the types the switch-exhaustiveness check can reason about
    /// as a closed, enumerable domain: enums, and the handful of primitives
    /// narrow enough that "every value" is a tractable set.
    pub fn is_exhaustive_switch_eligible(&self, id: TypeId) -> bool {
        let id = self.dealias(id);
        match &self.get(id).class {
            Class::Enum { .. } => true,
            Class::Basic(p) => matches!(p, Primitive::Bool | Primitive::U8 | Primitive::I8 | Primitive::Char),
            _ => false,
        }
    }

    /// The full `(lo, hi)` value domain of an exhaustive-eligible type, used
    /// to decide whether a switch's case values cover every possibility.
    pub fn domain_range(&self, id: TypeId) -> Option<(i64, i64)> {
        let id = self.dealias(id);
        match &self.get(id).class {
            Class::Basic(Primitive::Bool) => Some((0, 1)),
            Class::Basic(Primitive::U8) | Class::Basic(Primitive::Char) => Some((0, 255)),
            Class::Basic(Primitive::I8) => Some((-128, 127)),
            Class::Enum { members, .. } => {
                let values = members.iter().map(|(_, v)| *v);
                let lo = values.clone().min()?;
                let hi = values.max()?;
                Some((lo, hi))
            }
            _ => None,
        }
    }

    pub fn size_bytes(&self, id: TypeId) -> Option<u32> {
        match &self.get(self.dealias(id)).class {
            Class::Basic(p) => Some(p.size_bytes()),
            Class::Pointer { .. } => Some(8),
            Class::Array { member_type, num_members } if *num_members > 0 => {
                self.size_bytes(*member_type).map(|sz| sz * num_members)
            }
            Class::Struct { fields, complete: true, .. } => {
                fields.iter().try_fold(0u32, |acc, (_, t)| self.size_bytes(*t).map(|sz| acc + sz))
            }
            Class::Union { members, .. } => members
                .iter()
                .filter_map(|(_, t)| self.size_bytes(*t))
                .max(),
            Class::Enum { repr, .. } => self.size_bytes(*repr),
            _ => None,
        }
    }

    /// Two types are equal for the purposes of assignment/comparison if,
    /// after dealiasing, they refer to the exact same arena slot. Function
    /// pointer coercion is the one place structural (not identity) equality
    /// is needed; see [`Self::function_signatures_compatible`].
    pub fn types_equal(&self, a: TypeId, b: TypeId) -> bool {
        self.dealias(a) == self.dealias(b)
    }

    /// Structural equality for function signatures, ignoring the
    /// `is_public` flag: used when coercing a function name to a function
    /// pointer constant, since two `fn` declarations with identical
    /// parameter/return shape should be mutually assignable regardless of
    /// visibility.
    pub fn function_signatures_compatible(&self, a: TypeId, b: TypeId) -> bool {
        let (a, b) = (self.dealias(a), self.dealias(b));
        match (&self.get(a).class, &self.get(b).class) {
            (
                Class::FunctionSignature { params: pa, return_type: ra, .. },
                Class::FunctionSignature { params: pb, return_type: rb, .. },
            ) => pa.len() == pb.len() && self.types_equal(*ra, *rb) && pa.iter().zip(pb).all(|(x, y)| self.types_equal(*x, *y)),
            _ => false,
        }
    }

    /// Whether a value of type `source` can be assigned/passed where `target`
    /// is expected. `void` is never assignable in either position. Beyond an
    /// exact dealiased match this covers: same-family numeric widening,
    /// pointer/array decay with a `void*` escape hatch and a
    /// mutable-target-from-immutable-source rejection, integer-to-enum
    /// coercion, reference binding, and function-pointer compatibility.
    /// Returns the resulting (target-side) type on success so callers get
    /// the unified type of the operation for free.
    pub fn is_assignable(&self, target: TypeId, source: TypeId) -> Option<TypeId> {
        let (t, s) = (self.dealias(target), self.dealias(source));
        if self.is_void(t) || self.is_void(s) {
            return None;
        }
        if self.types_equal(t, s) {
            return Some(t);
        }
        if let (Class::Basic(pt), Class::Basic(ps)) = (&self.get(t).class, &self.get(s).class) {
            if pt.is_floating_point() == ps.is_floating_point() && pt.rank() >= ps.rank() {
                return Some(t);
            }
            return None;
        }
        if self.is_pointer(t) && (self.is_pointer(s) || matches!(self.get(s).class, Class::Array { .. })) {
            let target_elem = self.pointee(t).expect("pointer has a pointee");
            let source_elem = self.pointee(s).expect("pointer/array has a pointee");
            let elem_ok = self.types_equal(target_elem, source_elem) || self.is_void(target_elem);
            if !elem_ok {
                return None;
            }
            if self.mutability(target_elem) == Mutability::Mutable
                && self.mutability(source_elem) == Mutability::Immutable
            {
                return None;
            }
            return Some(t);
        }
        if let Class::Enum { repr, .. } = &self.get(t).class {
            if let Class::Basic(ps) = &self.get(s).class {
                let repr_prim = match &self.get(self.dealias(*repr)).class {
                    Class::Basic(p) => *p,
                    _ => return None,
                };
                if !ps.is_floating_point() && repr_prim.rank() >= ps.rank() {
                    return Some(t);
                }
            }
            return None;
        }
        if let Class::Reference { references } = &self.get(t).class {
            if self.types_equal(*references, s) {
                return Some(t);
            }
            return None;
        }
        if matches!(
            (&self.get(t).class, &self.get(s).class),
            (Class::FunctionSignature { .. }, Class::FunctionSignature { .. })
        ) && self.function_signatures_compatible(t, s)
        {
            return Some(t);
        }
        None
    }

    /// Whether assigning `source` into `target` narrows a wider type without
    /// an explicit cast; used to emit [`crate::diagnostics::DiagnosticKind::SubWidthNarrowing`]
    /// as a warning rather than silently truncating.
    pub fn is_narrowing(&self, target: TypeId, source: TypeId) -> bool {
        let (t, s) = (self.dealias(target), self.dealias(source));
        matches!(
            (&self.get(t).class, &self.get(s).class),
            (Class::Basic(pt), Class::Basic(ps)) if pt.rank() < ps.rank()
        )
    }

    pub fn is_valid_for_conditional(&self, id: TypeId) -> bool {
        let id = self.dealias(id);
        matches!(self.get(id).class, Class::Basic(_) | Class::Pointer { .. } | Class::Enum { .. })
            && !self.is_void(id)
    }

    pub fn is_valid_for_memory_addressing(&self, id: TypeId) -> bool {
        self.is_memory_region(id)
            || matches!(
                self.get(self.dealias(id)).class,
                Class::Reference { .. } | Class::Pointer { .. }
            )
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeShape)> {
        self.shapes.iter().enumerate().map(|(i, s)| (TypeId(i as u32), s))
    }

    pub fn type_count(&self) -> usize {
        self.shapes.len()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn pointer_types_are_interned() {
        let mut reg = TypeRegistry::new();
        let i32_ty = reg.basic(Primitive::I32, Mutability::Immutable);
        let p1 = reg.pointer_to(i32_ty, Mutability::Immutable);
        let p2 = reg.pointer_to(i32_ty, Mutability::Immutable);
        assert_eq!(p1, p2);
        assert_eq!(reg.type_count(), 26 + 1);
    }

    #[test]
    fn mutable_and_immutable_pointers_are_distinct() {
        let mut reg = TypeRegistry::new();
        let i32_ty = reg.basic(Primitive::I32, Mutability::Immutable);
        let p_mut = reg.pointer_to(i32_ty, Mutability::Mutable);
        let p_const = reg.pointer_to(i32_ty, Mutability::Immutable);
        assert_ne!(p_mut, p_const);
    }

    #[test]
    fn widening_is_assignable_narrowing_is_not() {
        let reg = TypeRegistry::new();
        let i32_ty = reg.basic(Primitive::I32, Mutability::Immutable);
        let i64_ty = reg.basic(Primitive::I64, Mutability::Immutable);
        assert_eq!(reg.is_assignable(i64_ty, i32_ty), Some(i64_ty));
        assert_eq!(reg.is_assignable(i32_ty, i64_ty), None);
        assert!(reg.is_narrowing(i32_ty, i64_ty));
    }

    #[test]
    fn void_is_never_assignable() {
        let reg = TypeRegistry::new();
        let void_ty = reg.void();
        let i32_ty = reg.basic(Primitive::I32, Mutability::Immutable);
        assert_eq!(reg.is_assignable(void_ty, void_ty), None);
        assert_eq!(reg.is_assignable(i32_ty, void_ty), None);
        assert_eq!(reg.is_assignable(void_ty, i32_ty), None);
    }

    #[test]
    fn pointer_to_void_pointer_is_assignable_either_direction() {
        let mut reg = TypeRegistry::new();
        let void_ty = reg.void();
        let i32_ty = reg.basic(Primitive::I32, Mutability::Immutable);
        let void_ptr = reg.pointer_to(void_ty, Mutability::Mutable);
        let i32_ptr = reg.pointer_to(i32_ty, Mutability::Mutable);
        assert_eq!(reg.is_assignable(void_ptr, i32_ptr), Some(void_ptr));
        assert_eq!(reg.is_assignable(i32_ptr, void_ptr), Some(i32_ptr));
    }

    #[test]
    fn mutable_pointer_target_rejects_immutable_element_source() {
        let mut reg = TypeRegistry::new();
        let i32_mut = reg.basic(Primitive::I32, Mutability::Mutable);
        let i32_const = reg.basic(Primitive::I32, Mutability::Immutable);
        let mut_ptr = reg.pointer_to(i32_mut, Mutability::Mutable);
        let const_ptr = reg.pointer_to(i32_const, Mutability::Mutable);
        assert_eq!(reg.is_assignable(mut_ptr, const_ptr), None);
        assert_eq!(reg.is_assignable(const_ptr, mut_ptr), Some(const_ptr));
    }

    #[test]
    fn alias_dealiases_to_target() {
        let mut reg = TypeRegistry::new();
        let i32_ty = reg.basic(Primitive::I32, Mutability::Immutable);
        let alias_sym = Symbol::from_raw(0);
        let alias = reg.define_alias(alias_sym, i32_ty, Mutability::Immutable);
        assert_eq!(reg.dealias(alias), i32_ty);
        assert!(reg.types_equal(alias, i32_ty));
    }

    #[test]
    fn struct_pair_shares_fields_once_finished() {
        let mut reg = TypeRegistry::new();
        let i32_ty = reg.basic(Primitive::I32, Mutability::Immutable);
        let name = Symbol::from_raw(1);
        let field_name = Symbol::from_raw(2);
        let (immutable, mutable) = reg.begin_struct(name);
        reg.push_struct_field(immutable, mutable, (field_name, i32_ty));
        reg.finish_struct(immutable, mutable);
        assert_eq!(reg.struct_field(immutable, field_name), Some(i32_ty));
        assert_eq!(reg.struct_field(mutable, field_name), Some(i32_ty));
        assert!(reg.is_complete(immutable));
    }
}
