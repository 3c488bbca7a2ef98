//! Expression parsing (component G): a fourteen-level precedence cascade
//! from assignment down to primary, with type checking and constant folding
//! applied inline at every binary/unary node rather than in a later pass.

use crate::ast::{BinaryOp, ConstantValue, IncDecOp, NodeId, NodeKind, Side, UnaryOp};
use crate::diagnostics::DiagnosticKind;
use crate::fold;
use crate::stacks::GroupingKind;
use crate::token::TokenKind;
use crate::types::{Mutability, TypeId};

use super::Parser;

/// Entry point: parses a full expression (assignment precedence).
pub(super) fn parse_expression(p: &mut Parser) -> NodeId {
    parse_assignment(p)
}

fn is_constant_node(p: &Parser, id: NodeId) -> bool {
    matches!(p.node(id).kind, NodeKind::Constant { .. })
}

fn constant_value(p: &Parser, id: NodeId) -> Option<ConstantValue> {
    match &p.node(id).kind {
        NodeKind::Constant { value } => Some(value.clone()),
        _ => None,
    }
}

fn node_type(p: &Parser, id: NodeId) -> TypeId {
    p.node(id).inferred_type.unwrap_or_else(|| p_void(p))
}

fn p_void(p: &Parser) -> TypeId {
    p.type_registry.void()
}

/// Picks the wider of two operand types for a binary arithmetic/bitwise
/// expression, or reports `InvalidOperatorForType` and falls back to the
/// left operand's type if neither widens to the other.
fn widen(p: &mut Parser, line: u32, a: TypeId, b: TypeId) -> TypeId {
    if let Some(t) = p.type_registry.is_assignable(a, b) {
        t
    } else if let Some(t) = p.type_registry.is_assignable(b, a) {
        t
    } else {
        p.error_at(DiagnosticKind::InvalidOperatorForType, line).emit();
        a
    }
}

/// Builds a binary-expression node, folding it to a `Constant` node in
/// place if both operands already are constants.
fn make_binary(p: &mut Parser, line: u32, op: BinaryOp, left: NodeId, right: NodeId, result_type: TypeId) -> NodeId {
    if is_constant_node(p, left) && is_constant_node(p, right) {
        let lv = constant_value(p, left).expect("checked constant");
        let rv = constant_value(p, right).expect("checked constant");
        match fold::fold_binary(op, &lv, &rv, result_type, &p.type_registry) {
            Ok(value) => {
                let id = p.alloc(NodeKind::Constant { value }, line);
                p.node_mut(id).inferred_type = Some(result_type);
                return id;
            }
            Err(fold::FoldError::DivisionByZero) => {
                p.error_at(DiagnosticKind::DivisionByZero, line).emit();
            }
            Err(fold::FoldError::ModuloByZero) => {
                p.error_at(DiagnosticKind::ModuloByZero, line).emit();
            }
        }
        // Fall through and still emit a (non-constant) node so the caller
        // gets a usable tree even after a fold error.
    }
    let id = p.alloc(NodeKind::BinaryExpr { op }, line);
    p.node_mut(left).side = Side::Left;
    p.node_mut(right).side = Side::Right;
    p.add_child(id, left);
    p.add_child(id, right);
    p.node_mut(id).inferred_type = Some(result_type);
    id
}

fn make_unary(p: &mut Parser, line: u32, op: UnaryOp, operand: NodeId, result_type: TypeId) -> NodeId {
    if matches!(op, UnaryOp::Negate | UnaryOp::LogicalNot | UnaryOp::BitwiseNot) && is_constant_node(p, operand) {
        let v = constant_value(p, operand).expect("checked constant");
        let value = fold::fold_unary(op, &v, result_type, &p.type_registry);
        let id = p.alloc(NodeKind::Constant { value }, line);
        p.node_mut(id).inferred_type = Some(result_type);
        return id;
    }
    let id = p.alloc(NodeKind::UnaryExpr { op }, line);
    p.add_child(id, operand);
    p.node_mut(id).inferred_type = Some(result_type);
    if matches!(op, UnaryOp::Dereference) {
        p.node_mut(id).is_assignable = true;
    }
    id
}

// ---- level 1: assignment (right-associative) --------------------------

fn parse_assignment(p: &mut Parser) -> NodeId {
    if !p.enter_rule() {
        return p.alloc(NodeKind::Error, p.current_line());
    }
    let left = parse_ternary(p);
    let op = match p.current().kind {
        TokenKind::Eq => None,
        TokenKind::PlusEq => Some(BinaryOp::Add),
        TokenKind::MinusEq => Some(BinaryOp::Sub),
        TokenKind::StarEq => Some(BinaryOp::Mul),
        TokenKind::SlashEq => Some(BinaryOp::Div),
        TokenKind::PercentEq => Some(BinaryOp::Mod),
        TokenKind::ShlEq => Some(BinaryOp::Shl),
        TokenKind::ShrEq => Some(BinaryOp::Shr),
        TokenKind::AmpEq => Some(BinaryOp::BitAnd),
        TokenKind::PipeEq => Some(BinaryOp::BitOr),
        TokenKind::CaretEq => Some(BinaryOp::BitXor),
        _ => {
            p.exit_rule();
            return left;
        }
    };
    let line = p.current_line();
    p.bump();
    let right = parse_assignment(p);

    if !p.node(left).is_assignable {
        p.error_at(DiagnosticKind::IncompatibleAssignment, line)
            .message("left-hand side of an assignment must be a variable, field, or dereference")
            .emit();
    }
    let target_ty = node_type(p, left);
    if p.type_registry.mutability(target_ty) == Mutability::Immutable {
        p.error_at(DiagnosticKind::ImmutableTypeMutation, line).emit();
    }
    let source_ty = node_type(p, right);
    if p.type_registry.is_assignable(target_ty, source_ty).is_none() {
        if p.type_registry.is_narrowing(target_ty, source_ty) {
            p.warning_at(DiagnosticKind::SubWidthNarrowing, line).emit();
        } else {
            p.error_at(DiagnosticKind::IncompatibleAssignment, line).emit();
        }
    }
    if is_constant_node(p, right) {
        if let Some(v) = constant_value(p, right) {
            let coerced = fold::coerce_constant(&v, target_ty, &p.type_registry);
            p.node_mut(right).kind = NodeKind::Constant { value: coerced };
        }
    }

    let id = p.alloc(NodeKind::Assign { compound: op }, line);
    p.node_mut(left).side = Side::Left;
    p.node_mut(right).side = Side::Right;
    p.add_child(id, left);
    p.add_child(id, right);
    p.node_mut(id).inferred_type = Some(target_ty);
    p.exit_rule();
    id
}

// ---- level 2: ternary (right-associative) ------------------------------

fn parse_ternary(p: &mut Parser) -> NodeId {
    if !p.enter_rule() {
        return p.alloc(NodeKind::Error, p.current_line());
    }
    let cond = parse_logical_or(p);
    if !p.eat(TokenKind::Question) {
        p.exit_rule();
        return cond;
    }
    let line = p.current_line();
    let cond_ty = node_type(p, cond);
    if !p.type_registry.is_valid_for_conditional(cond_ty) {
        p.error_at(DiagnosticKind::InvalidOperatorForType, line).emit();
    }
    let then_branch = parse_expression(p);
    p.expect(TokenKind::Colon, "`:` in ternary expression");
    let else_branch = parse_ternary(p);

    let then_ty = node_type(p, then_branch);
    let else_ty = node_type(p, else_branch);
    let result_ty = widen(p, line, then_ty, else_ty);

    let id = p.alloc(NodeKind::Ternary, line);
    p.add_child(id, cond);
    p.add_child(id, then_branch);
    p.add_child(id, else_branch);
    p.node_mut(id).inferred_type = Some(result_ty);
    p.exit_rule();
    id
}

macro_rules! left_assoc_level {
    ($name:ident, $next:ident, $match_op:expr) => {
        fn $name(p: &mut Parser) -> NodeId {
            if !p.enter_rule() {
                return p.alloc(NodeKind::Error, p.current_line());
            }
            let mut left = $next(p);
            loop {
                let op = $match_op(p.current().kind);
                let Some(op) = op else { break };
                let line = p.current_line();
                p.bump();
                let right = $next(p);
                let lty = node_type(p, left);
                let rty = node_type(p, right);
                let result_ty = widen(p, line, lty, rty);
                left = make_binary(p, line, op, left, right, result_ty);
            }
            p.exit_rule();
            left
        }
    };
}

left_assoc_level!(parse_logical_or, parse_logical_and, |k| match k {
    TokenKind::PipePipe => Some(BinaryOp::LogicalOr),
    _ => None,
});
left_assoc_level!(parse_logical_and, parse_bitwise_or, |k| match k {
    TokenKind::AmpAmp => Some(BinaryOp::LogicalAnd),
    _ => None,
});
left_assoc_level!(parse_bitwise_or, parse_bitwise_xor, |k| match k {
    TokenKind::Pipe => Some(BinaryOp::BitOr),
    _ => None,
});
left_assoc_level!(parse_bitwise_xor, parse_bitwise_and, |k| match k {
    TokenKind::Caret => Some(BinaryOp::BitXor),
    _ => None,
});
left_assoc_level!(parse_bitwise_and, parse_equality, |k| match k {
    TokenKind::Amp => Some(BinaryOp::BitAnd),
    _ => None,
});
left_assoc_level!(parse_equality, parse_relational, |k| match k {
    TokenKind::EqEq => Some(BinaryOp::Eq),
    TokenKind::BangEq => Some(BinaryOp::Ne),
    _ => None,
});
left_assoc_level!(parse_relational, parse_shift, |k| match k {
    TokenKind::Lt => Some(BinaryOp::Lt),
    TokenKind::LtEq => Some(BinaryOp::Le),
    TokenKind::Gt => Some(BinaryOp::Gt),
    TokenKind::GtEq => Some(BinaryOp::Ge),
    _ => None,
});
left_assoc_level!(parse_shift, parse_additive, |k| match k {
    TokenKind::Shl => Some(BinaryOp::Shl),
    TokenKind::Shr => Some(BinaryOp::Shr),
    _ => None,
});
left_assoc_level!(parse_additive, parse_multiplicative, |k| match k {
    TokenKind::Plus => Some(BinaryOp::Add),
    TokenKind::Minus => Some(BinaryOp::Sub),
    _ => None,
});
left_assoc_level!(parse_multiplicative, parse_cast, |k| match k {
    TokenKind::Star => Some(BinaryOp::Mul),
    TokenKind::Slash => Some(BinaryOp::Div),
    TokenKind::Percent => Some(BinaryOp::Mod),
    _ => None,
});

// ---- cast ---------------------------------------------------------------

/// `<Type> expr`: a prefix cast. Unlike a relational `<`, a cast can only be
/// recognized here, at an operand-parse position — `parse_relational` always
/// descends all the way to `parse_cast` for its left operand before it ever
/// looks at the current token, so a leading `<` reaching this function can
/// never be a relational operator in disguise. No lookahead/backtracking is
/// needed to tell the two apart.
fn parse_cast(p: &mut Parser) -> NodeId {
    if !p.enter_rule() {
        return p.alloc(NodeKind::Error, p.current_line());
    }
    if !p.at(TokenKind::Lt) {
        let id = parse_unary(p);
        p.exit_rule();
        return id;
    }
    let line = p.current_line();
    p.bump(); // `<`
    p.push_delimiter(GroupingKind::Angle);
    let target = super::decl::parse_type_ref(p, Mutability::Immutable);
    p.expect_close(GroupingKind::Angle, TokenKind::Gt, "`>`");
    let operand = parse_cast(p);
    let operand_ty = node_type(p, operand);

    if p.type_registry.is_void(target) || p.type_registry.is_void(operand_ty) {
        p.error_at(DiagnosticKind::VoidTypeMisuse, line).emit();
    } else if p.type_registry.is_memory_region(target) {
        p.error_at(DiagnosticKind::InvalidOperatorForType, line)
            .message("struct, union and array types are not valid cast targets")
            .emit();
    } else if p.type_registry.is_pointer(target)
        && p.type_registry.is_pointer(operand_ty)
        && p.type_registry.mutability(target) == Mutability::Mutable
        && p.type_registry.mutability(operand_ty) == Mutability::Immutable
    {
        p.error_at(DiagnosticKind::ImmutableTypeMutation, line)
            .message("cannot cast an immutable pointer to a mutable one")
            .emit();
    } else if p.type_registry.is_assignable(target, operand_ty).is_none()
        && !p.type_registry.is_narrowing(target, operand_ty)
        && !(p.type_registry.is_pointer(target) && p.type_registry.is_pointer(operand_ty))
    {
        p.error_at(DiagnosticKind::InvalidOperatorForType, line).emit();
    }

    let id = if let Some(v) = constant_value(p, operand) {
        let coerced = fold::coerce_constant(&v, target, &p.type_registry);
        p.alloc(NodeKind::Constant { value: coerced }, line)
    } else {
        let id = p.alloc(NodeKind::CastExpr { target }, line);
        p.add_child(id, operand);
        id
    };
    p.node_mut(id).inferred_type = Some(target);
    p.exit_rule();
    id
}

// ---- unary ---------------------------------------------------------------

fn parse_unary(p: &mut Parser) -> NodeId {
    if !p.enter_rule() {
        return p.alloc(NodeKind::Error, p.current_line());
    }
    let line = p.current_line();
    let result = match p.current().kind {
        TokenKind::Minus => {
            p.bump();
            let operand = parse_unary(p);
            let ty = node_type(p, operand);
            make_unary(p, line, UnaryOp::Negate, operand, ty)
        }
        TokenKind::Bang => {
            p.bump();
            let operand = parse_unary(p);
            let ty = p.type_registry.basic(crate::types::Primitive::Bool, Mutability::Immutable);
            make_unary(p, line, UnaryOp::LogicalNot, operand, ty)
        }
        TokenKind::Tilde => {
            p.bump();
            let operand = parse_unary(p);
            let ty = node_type(p, operand);
            make_unary(p, line, UnaryOp::BitwiseNot, operand, ty)
        }
        TokenKind::Amp => {
            p.bump();
            let operand = parse_unary(p);
            let pointee = node_type(p, operand);
            let mutability = p.type_registry.mutability(pointee);
            let ty = p.type_registry.pointer_to(pointee, mutability);
            if let NodeKind::Identifier { var: Some(var_id), .. } = &p.node(operand).kind {
                let var_id = *var_id;
                p.variables.get_mut(var_id).stack_variable = true;
            }
            make_unary(p, line, UnaryOp::AddressOf, operand, ty)
        }
        TokenKind::Star => {
            p.bump();
            let operand = parse_unary(p);
            let operand_ty = node_type(p, operand);
            let ty = p.type_registry.pointee(operand_ty).unwrap_or_else(|| p_void(p));
            if !p.type_registry.is_valid_for_memory_addressing(operand_ty) {
                p.error_at(DiagnosticKind::ReferenceTypeMisuse, line).emit();
            }
            make_unary(p, line, UnaryOp::Dereference, operand, ty)
        }
        TokenKind::PlusPlus => {
            p.bump();
            let operand = parse_unary(p);
            build_incdec(p, line, IncDecOp::PreIncrement, operand)
        }
        TokenKind::MinusMinus => {
            p.bump();
            let operand = parse_unary(p);
            build_incdec(p, line, IncDecOp::PreDecrement, operand)
        }
        _ => parse_postfix(p),
    };
    p.exit_rule();
    result
}

fn build_incdec(p: &mut Parser, line: u32, op: IncDecOp, operand: NodeId) -> NodeId {
    if !p.node(operand).is_assignable {
        p.error_at(DiagnosticKind::IncompatibleAssignment, line)
            .message("increment/decrement target must be a variable or field")
            .emit();
    }
    let ty = node_type(p, operand);
    let id = p.alloc(NodeKind::IncDecExpr { op }, line);
    p.add_child(id, operand);
    p.node_mut(id).inferred_type = Some(ty);
    id
}

// ---- postfix ---------------------------------------------------------------

fn parse_postfix(p: &mut Parser) -> NodeId {
    if !p.enter_rule() {
        return p.alloc(NodeKind::Error, p.current_line());
    }
    let mut expr = parse_primary(p);
    loop {
        let line = p.current_line();
        match p.current().kind {
            TokenKind::LBracket => {
                p.bump();
                p.push_delimiter(GroupingKind::Bracket);
                let index = parse_expression(p);
                p.expect_close(GroupingKind::Bracket, TokenKind::RBracket, "`]`");
                let base_ty = node_type(p, expr);
                let elem_ty = p.type_registry.pointee(base_ty).unwrap_or_else(|| p_void(p));
                let id = p.alloc(NodeKind::ArrayAccessor, line);
                p.add_child(id, expr);
                p.add_child(id, index);
                p.node_mut(id).inferred_type = Some(elem_ty);
                p.node_mut(id).is_assignable = true;
                expr = id;
            }
            TokenKind::Dot => {
                p.bump();
                expr = parse_field_access(p, expr, line, false);
            }
            TokenKind::Arrow => {
                p.bump();
                expr = parse_field_access(p, expr, line, true);
            }
            TokenKind::PlusPlus => {
                p.bump();
                expr = build_incdec(p, line, IncDecOp::PostIncrement, expr);
            }
            TokenKind::MinusMinus => {
                p.bump();
                expr = build_incdec(p, line, IncDecOp::PostDecrement, expr);
            }
            _ => break,
        }
    }
    p.exit_rule();
    expr
}

fn parse_field_access(p: &mut Parser, base: NodeId, line: u32, via_pointer: bool) -> NodeId {
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "a field name");
    let name = p.intern(&name_text);
    let base_ty = node_type(p, base);
    let struct_ty = if via_pointer {
        p.type_registry.pointee(base_ty).unwrap_or_else(|| p_void(p))
    } else {
        base_ty
    };
    let (field_ty, kind) = if let Some(ft) = p.type_registry.struct_field(struct_ty, name) {
        let kind = if via_pointer {
            NodeKind::StructPointerAccessor { field: name }
        } else {
            NodeKind::StructAccessor { field: name }
        };
        (Some(ft), kind)
    } else if let Some(ft) = p.type_registry.union_member(struct_ty, name) {
        let kind = if via_pointer {
            NodeKind::UnionPointerAccessor { field: name }
        } else {
            NodeKind::UnionAccessor { field: name }
        };
        (Some(ft), kind)
    } else {
        p.error_at(DiagnosticKind::UndeclaredIdentifier, line)
            .message(format!("no field named `{name_text}` on this type"))
            .emit();
        (None, NodeKind::StructAccessor { field: name })
    };
    let id = p.alloc(kind, line);
    p.add_child(id, base);
    p.node_mut(id).inferred_type = Some(field_ty.unwrap_or_else(|| p_void(p)));
    p.node_mut(id).is_assignable = true;
    id
}

/// `@name(args...)`: the call form. Consumes the leading `@` itself, since
/// it is recognized only as a primary expression, not as a postfix on an
/// already-parsed callee — the language has no bare `name(args)` call
/// syntax, and a plain identifier always resolves to the value it names.
fn parse_call(p: &mut Parser, line: u32) -> NodeId {
    p.bump(); // `@`
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "a function name");
    let name = p.intern(&name_text);
    p.expect(TokenKind::LParen, "`(`");
    p.push_delimiter(GroupingKind::Paren);
    let mut args = Vec::new();
    if !p.at(TokenKind::RParen) {
        loop {
            args.push(parse_ternary(p));
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");

    if let Some(func_id) = p.function_table.lookup(name) {
        let params = p.function_table.get(func_id).parameters.clone();
        let ret = p.function_table.get(func_id).return_type;
        check_argument_count(p, &name_text, params.len(), args.len(), line);
        let checked_args: Vec<NodeId> = args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| match params.get(i) {
                Some(&param_var) => {
                    let param_ty = p.variables.get(param_var).ty;
                    check_call_argument(p, param_ty, arg, line)
                }
                None => arg,
            })
            .collect();

        p.function_table.get_mut(func_id).called = true;
        let callee_node = p.function_table.get(func_id).call_graph_node;
        let caller_node = p
            .current_function()
            .map(|f| p.function_table.get(f).call_graph_node)
            .unwrap_or_else(|| p.call_graph.os());
        p.call_graph.record_call(caller_node, callee_node);

        let id = p.alloc(NodeKind::FunctionCall { callee: name, func: Some(func_id) }, line);
        for arg in &checked_args {
            p.add_child(id, *arg);
        }
        p.node_mut(id).inferred_type = Some(ret);
        return id;
    }

    if let Some(var_id) = p.variable_scopes.lookup(name) {
        let sig_ty = p.variables.get(var_id).ty;
        let ret = p.type_registry.function_return_type(sig_ty).unwrap_or_else(|| p_void(p));
        let params = p.type_registry.function_params(sig_ty).map(<[TypeId]>::to_vec).unwrap_or_default();
        check_argument_count(p, &name_text, params.len(), args.len(), line);
        let checked_args: Vec<NodeId> = args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| match params.get(i) {
                Some(&param_ty) => check_call_argument(p, param_ty, arg, line),
                None => arg,
            })
            .collect();

        let callee_id = p.alloc(NodeKind::Identifier { name, var: Some(var_id) }, line);
        p.node_mut(callee_id).inferred_type = Some(sig_ty);
        let id = p.alloc(NodeKind::IndirectFunctionCall, line);
        p.add_child(id, callee_id);
        for arg in checked_args {
            p.add_child(id, arg);
        }
        p.node_mut(id).inferred_type = Some(ret);
        return id;
    }

    p.error_at(DiagnosticKind::UndeclaredIdentifier, line)
        .message(format!("call to undeclared function `{name_text}`"))
        .emit();
    let id = p.alloc(NodeKind::FunctionCall { callee: name, func: None }, line);
    for arg in args {
        p.add_child(id, arg);
    }
    p.node_mut(id).inferred_type = Some(p_void(p));
    id
}

fn check_argument_count(p: &mut Parser, name: &str, expected: usize, found: usize, line: u32) {
    if expected != found {
        p.error_at(DiagnosticKind::ArgumentCountMismatch, line)
            .message(format!("`{name}` expects {expected} argument(s), found {found}"))
            .emit();
    }
}

/// Checks (and, for reference parameters, rewrites) one call argument
/// against its parameter type. A reference parameter accepts either an
/// existing reference of the same target type, or a plain variable of the
/// target type, which is implicitly wrapped in an address-of node and has
/// its underlying storage flagged as stack-resident. Any other parameter
/// follows the ordinary assignability rule, narrowing downgraded to a
/// warning exactly as assignment does.
fn check_call_argument(p: &mut Parser, param_ty: TypeId, arg: NodeId, line: u32) -> NodeId {
    if let Some(target) = p.type_registry.reference_target(param_ty) {
        let arg_ty = node_type(p, arg);
        if p.type_registry.is_reference(arg_ty) {
            if p.type_registry.is_assignable(param_ty, arg_ty).is_none() {
                p.error_at(DiagnosticKind::ReferenceTypeMisuse, line).emit();
            }
            return arg;
        }
        if !p.type_registry.types_equal(arg_ty, target) {
            p.error_at(DiagnosticKind::ReferenceTypeMisuse, line)
                .message("argument type does not match the reference parameter's target type")
                .emit();
            return arg;
        }
        let Some(var_id) = (match &p.node(arg).kind {
            NodeKind::Identifier { var, .. } => *var,
            _ => None,
        }) else {
            p.error_at(DiagnosticKind::ReferenceTypeMisuse, line)
                .message("a reference argument must be a variable or an existing reference")
                .emit();
            return arg;
        };
        p.variables.get_mut(var_id).stack_variable = true;
        let wrapped = p.alloc(NodeKind::UnaryExpr { op: UnaryOp::AddressOf }, line);
        p.add_child(wrapped, arg);
        p.node_mut(wrapped).inferred_type = Some(param_ty);
        return wrapped;
    }

    let arg_ty = node_type(p, arg);
    if p.type_registry.is_assignable(param_ty, arg_ty).is_none() {
        if p.type_registry.is_narrowing(param_ty, arg_ty) {
            p.warning_at(DiagnosticKind::SubWidthNarrowing, line).emit();
        } else {
            p.error_at(DiagnosticKind::IncompatibleAssignment, line).emit();
        }
    }
    if is_constant_node(p, arg) {
        if let Some(v) = constant_value(p, arg) {
            let coerced = fold::coerce_constant(&v, param_ty, &p.type_registry);
            p.node_mut(arg).kind = NodeKind::Constant { value: coerced };
        }
    }
    arg
}

// ---- primary ---------------------------------------------------------------

fn parse_primary(p: &mut Parser) -> NodeId {
    if !p.enter_rule() {
        return p.alloc(NodeKind::Error, p.current_line());
    }
    let line = p.current_line();
    let id = match p.current().kind {
        TokenKind::LParen => {
            p.bump();
            p.push_delimiter(GroupingKind::Paren);
            let inner = parse_expression(p);
            p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
            inner
        }
        TokenKind::Ident => parse_identifier(p, line),
        TokenKind::At => parse_call(p, line),
        TokenKind::LBrace => parse_initializer_list(p, line),
        k if k.is_constant() => parse_constant(p, line),
        _ => {
            p.error(DiagnosticKind::UnexpectedToken)
                .message(format!("expected an expression, found `{}`", p.current().lexeme))
                .emit();
            if !p.at_eof() {
                p.bump();
            }
            p.alloc(NodeKind::Error, line)
        }
    };
    p.exit_rule();
    id
}

fn parse_identifier(p: &mut Parser, line: u32) -> NodeId {
    let text = p.current().lexeme.clone();
    p.bump();
    let name = p.intern(&text);
    let var = p.variable_scopes.lookup(name);
    let (ty, assignable) = if let Some(var_id) = var {
        let record = p.variables.get(var_id);
        if !record.initialized && record.membership == crate::symbols::Membership::Local {
            p.warning_at(DiagnosticKind::UseBeforeInitialization, line).emit();
        }
        (record.ty, true)
    } else if p.function_table.contains(name) {
        let func_id = p.function_table.lookup(name).expect("just checked contains");
        (p.function_table.get(func_id).signature, false)
    } else {
        p.error_at(DiagnosticKind::UndeclaredIdentifier, line)
            .message(format!("`{text}` is not declared in this scope"))
            .emit();
        (p_void(p), false)
    };
    let id = p.alloc(NodeKind::Identifier { name, var }, line);
    p.node_mut(id).inferred_type = Some(ty);
    p.node_mut(id).is_assignable = assignable;
    id
}

fn parse_constant(p: &mut Parser, line: u32) -> NodeId {
    let text = p.current().lexeme.clone();
    let kind = p.current().kind;
    p.bump();
    let value = lex_constant_value(kind, &text);
    let ty = fold::default_type_for(&value, &p.type_registry);
    let id = p.alloc(NodeKind::Constant { value }, line);
    p.node_mut(id).inferred_type = Some(ty);
    id
}

fn lex_constant_value(kind: TokenKind, text: &str) -> ConstantValue {
    match kind {
        TokenKind::TrueConst => ConstantValue::Bool(true),
        TokenKind::FalseConst => ConstantValue::Bool(false),
        TokenKind::CharConst => {
            let inner = text.trim_matches('\'');
            ConstantValue::Char(unescape_byte(inner))
        }
        TokenKind::StrConst => {
            let inner = &text[1..text.len().saturating_sub(1)];
            ConstantValue::Str(unescape_str(inner))
        }
        TokenKind::HexConst => {
            let digits = &text[2..];
            ConstantValue::Int(i64::from_str_radix(digits, 16).unwrap_or(0) as i32)
        }
        TokenKind::FloatConst => ConstantValue::Float(text.trim_end_matches(['f', 'F']).parse().unwrap_or(0.0)),
        TokenKind::DoubleConst => ConstantValue::Double(text.parse().unwrap_or(0.0)),
        TokenKind::LongConstForceU => {
            let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
            ConstantValue::ULong(digits.parse().unwrap_or(0))
        }
        TokenKind::LongConst => {
            let digits = text.trim_end_matches(['l', 'L']);
            ConstantValue::Long(digits.parse().unwrap_or(0))
        }
        TokenKind::IntConstForceU => {
            let digits = text.trim_end_matches(['u', 'U']);
            ConstantValue::UInt(digits.parse().unwrap_or(0))
        }
        TokenKind::ShortConst => {
            let digits = text.trim_end_matches(['s', 'S']);
            ConstantValue::Short(digits.parse().unwrap_or(0))
        }
        TokenKind::ByteConst => {
            let digits = text.trim_end_matches(['b', 'B']);
            ConstantValue::Byte(digits.parse().unwrap_or(0))
        }
        TokenKind::IntConst => ConstantValue::Int(text.parse().unwrap_or(0)),
        _ => ConstantValue::Int(0),
    }
}

fn unescape_byte(s: &str) -> u8 {
    unescape_str(s).first().copied().unwrap_or(0)
}

fn unescape_str(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push(b'\n'),
                Some('t') => out.push(b'\t'),
                Some('r') => out.push(b'\r'),
                Some('0') => out.push(0),
                Some('\\') => out.push(b'\\'),
                Some('\'') => out.push(b'\''),
                Some('"') => out.push(b'"'),
                Some(other) => out.push(other as u8),
                None => {}
            }
        } else {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    out
}

fn parse_initializer_list(p: &mut Parser, line: u32) -> NodeId {
    p.bump();
    p.push_delimiter(GroupingKind::Brace);
    let mut elements = Vec::new();
    if !p.at(TokenKind::RBrace) {
        loop {
            elements.push(parse_expression(p));
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect_close(GroupingKind::Brace, TokenKind::RBrace, "`}`");
    // A brace list's target shape (array vs. struct) depends on the
    // declaration it initializes, which isn't in scope here; `decl.rs`
    // retags the node to `StructInitializerList` once it knows the target.
    let kind = NodeKind::ArrayInitializerList;
    let elem_ty = elements.first().map(|e| node_type(p, *e)).unwrap_or_else(|| p_void(p));
    let array_ty = p.type_registry.array_of(elem_ty, elements.len() as u32, Mutability::Immutable);
    let id = p.alloc(kind, line);
    for elem in elements {
        p.add_child(id, elem);
    }
    p.node_mut(id).inferred_type = Some(array_ty);
    id
}
