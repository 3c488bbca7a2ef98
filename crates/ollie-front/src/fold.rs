//! Constant folding (component F): evaluates binary/unary expressions whose
//! operands are both constants at parse time, rather than leaving that work
//! for a downstream optimization pass. Folding is an inline pre-pass fired
//! from inside expression parsing (component G), not a separate tree walk.

use crate::ast::{BinaryOp, ConstantValue, UnaryOp};
use crate::types::{Mutability, Primitive, TypeId, TypeRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldError {
    DivisionByZero,
    ModuloByZero,
}

/// Folds a binary operator over two constant operands, given the type the
/// type checker already determined the expression as a whole should have.
/// Returns `Err` for the two conditions the specification calls out as
/// compile-time-detectable: division and modulo by a constant zero.
pub fn fold_binary(
    op: BinaryOp,
    left: &ConstantValue,
    right: &ConstantValue,
    result_type: TypeId,
    registry: &TypeRegistry,
) -> Result<ConstantValue, FoldError> {
    if registry.is_floating_point(result_type) {
        let a = left.as_f64().unwrap_or(0.0);
        let b = right.as_f64().unwrap_or(0.0);
        let value = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(FoldError::DivisionByZero);
                }
                a / b
            }
            _ => return Ok(relational_result(op, a.partial_cmp(&b))),
        };
        return Ok(coerce_numeric(value, result_type, registry));
    }

    let a = left.as_i64().unwrap_or(0);
    let b = right.as_i64().unwrap_or(0);
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(FoldError::DivisionByZero);
            }
            a.wrapping_div(b)
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(FoldError::ModuloByZero);
            }
            a.wrapping_rem(b)
        }
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        BinaryOp::LogicalAnd => ((a != 0) && (b != 0)) as i64,
        BinaryOp::LogicalOr => ((a != 0) || (b != 0)) as i64,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            return Ok(relational_result(op, a.partial_cmp(&b)))
        }
    };
    Ok(coerce_integral(value, result_type, registry))
}

fn relational_result(op: BinaryOp, ord: Option<std::cmp::Ordering>) -> ConstantValue {
    use std::cmp::Ordering::*;
    let result = match (op, ord) {
        (BinaryOp::Eq, Some(Equal)) => true,
        (BinaryOp::Eq, _) => false,
        (BinaryOp::Ne, Some(Equal)) => false,
        (BinaryOp::Ne, _) => true,
        (BinaryOp::Lt, Some(Less)) => true,
        (BinaryOp::Lt, _) => false,
        (BinaryOp::Le, Some(Less | Equal)) => true,
        (BinaryOp::Le, _) => false,
        (BinaryOp::Gt, Some(Greater)) => true,
        (BinaryOp::Gt, _) => false,
        (BinaryOp::Ge, Some(Greater | Equal)) => true,
        (BinaryOp::Ge, _) => false,
        _ => false,
    };
    ConstantValue::Bool(result)
}

pub fn fold_unary(op: UnaryOp, operand: &ConstantValue, result_type: TypeId, registry: &TypeRegistry) -> ConstantValue {
    match op {
        UnaryOp::Negate => {
            if registry.is_floating_point(result_type) {
                coerce_numeric(-operand.as_f64().unwrap_or(0.0), result_type, registry)
            } else {
                coerce_integral(-operand.as_i64().unwrap_or(0), result_type, registry)
            }
        }
        UnaryOp::BitwiseNot => coerce_integral(!operand.as_i64().unwrap_or(0), result_type, registry),
        UnaryOp::LogicalNot => ConstantValue::Bool(!operand.as_i64().unwrap_or(0) != 0),
        UnaryOp::AddressOf | UnaryOp::Dereference => operand.clone(),
    }
}

/// Reinterprets a constant's storage class to match `target`, the way the
/// front end applies an implicit widening coercion it has already approved
/// via `TypeRegistry::is_assignable`. This never narrows; callers are
/// expected to have already rejected narrowing coercions (or accepted them
/// explicitly via a cast) before calling this.
pub fn coerce_constant(value: &ConstantValue, target: TypeId, registry: &TypeRegistry) -> ConstantValue {
    if registry.is_floating_point(target) {
        coerce_numeric(value.as_f64().unwrap_or(0.0), target, registry)
    } else {
        coerce_integral(value.as_i64().unwrap_or(0), target, registry)
    }
}

fn coerce_integral(value: i64, target: TypeId, registry: &TypeRegistry) -> ConstantValue {
    match &registry.get(registry.dealias(target)).class {
        crate::types::Class::Basic(prim) => match prim {
            Primitive::Void => ConstantValue::Int(0),
            Primitive::U8 => ConstantValue::UByte(value as u8),
            Primitive::I8 => ConstantValue::Byte(value as i8),
            Primitive::U16 => ConstantValue::UShort(value as u16),
            Primitive::I16 => ConstantValue::Short(value as i16),
            Primitive::U32 => ConstantValue::UInt(value as u32),
            Primitive::I32 => ConstantValue::Int(value as i32),
            Primitive::U64 => ConstantValue::ULong(value as u64),
            Primitive::I64 => ConstantValue::Long(value),
            Primitive::F32 => ConstantValue::Float(value as f32),
            Primitive::F64 => ConstantValue::Double(value as f64),
            Primitive::Char => ConstantValue::Char(value as u8),
            Primitive::Bool => ConstantValue::Bool(value != 0),
        },
        _ => ConstantValue::Long(value),
    }
}

fn coerce_numeric(value: f64, target: TypeId, registry: &TypeRegistry) -> ConstantValue {
    match &registry.get(registry.dealias(target)).class {
        crate::types::Class::Basic(Primitive::F32) => ConstantValue::Float(value as f32),
        crate::types::Class::Basic(Primitive::F64) => ConstantValue::Double(value),
        _ => coerce_integral(value as i64, target, registry),
    }
}

/// Convenience used when interning a fresh numeric literal from the lexer:
/// finds the default immutable type for a given storage class.
pub fn default_type_for(value: &ConstantValue, registry: &TypeRegistry) -> TypeId {
    let prim = match value {
        ConstantValue::Byte(_) => Primitive::I8,
        ConstantValue::UByte(_) => Primitive::U8,
        ConstantValue::Short(_) => Primitive::I16,
        ConstantValue::UShort(_) => Primitive::U16,
        ConstantValue::Int(_) => Primitive::I32,
        ConstantValue::UInt(_) => Primitive::U32,
        ConstantValue::Long(_) => Primitive::I64,
        ConstantValue::ULong(_) => Primitive::U64,
        ConstantValue::Float(_) => Primitive::F32,
        ConstantValue::Double(_) => Primitive::F64,
        ConstantValue::Char(_) => Primitive::Char,
        ConstantValue::Bool(_) => Primitive::Bool,
        ConstantValue::Str(_) => Primitive::U8,
    };
    registry.basic(prim, Mutability::Immutable)
}

#[cfg(test)]
mod fold_tests {
    use super::*;

    #[test]
    fn folds_integer_addition() {
        let registry = TypeRegistry::new();
        let ty = registry.basic(Primitive::I32, Mutability::Immutable);
        let result = fold_binary(BinaryOp::Add, &ConstantValue::Int(2), &ConstantValue::Int(3), ty, &registry).unwrap();
        assert_eq!(result, ConstantValue::Int(5));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let registry = TypeRegistry::new();
        let ty = registry.basic(Primitive::I32, Mutability::Immutable);
        let result = fold_binary(BinaryOp::Div, &ConstantValue::Int(4), &ConstantValue::Int(0), ty, &registry);
        assert_eq!(result, Err(FoldError::DivisionByZero));
    }

    #[test]
    fn coerces_up_to_wider_type() {
        let registry = TypeRegistry::new();
        let wide = registry.basic(Primitive::I64, Mutability::Immutable);
        let coerced = coerce_constant(&ConstantValue::Int(7), wide, &registry);
        assert_eq!(coerced, ConstantValue::Long(7));
    }

    #[test]
    fn relational_fold_produces_bool() {
        let registry = TypeRegistry::new();
        let ty = registry.basic(Primitive::Bool, Mutability::Immutable);
        let result = fold_binary(BinaryOp::Lt, &ConstantValue::Int(1), &ConstantValue::Int(2), ty, &registry).unwrap();
        assert_eq!(result, ConstantValue::Bool(true));
    }
}
