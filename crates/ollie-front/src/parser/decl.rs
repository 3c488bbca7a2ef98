//! Declaration parsing (component H): type specifiers, struct/union/enum/
//! alias definitions, function signatures and bodies, and global
//! `declare`/`let`/`static` variables. Each declaration is registered in its
//! symbol table the moment its name is seen, so a forward reference inside
//! the same top-level sequence resolves the way the teacher's single-pass
//! resolver expects.

use ollie_core::Symbol;

use crate::ast::{ConstantValue, NodeId, NodeKind};
use crate::diagnostics::DiagnosticKind;
use crate::fold;
use crate::stacks::GroupingKind;
use crate::symbols::{ConstantRecord, DeclaredVia, FunctionRecord, Membership, VariableRecord};
use crate::token::TokenKind;
use crate::types::{Class, Mutability, Primitive, TypeId};

use super::expr::parse_expression;
use super::Parser;

/// Parses a type specifier: a primitive keyword or a named type, optionally
/// followed by any mix of `*` (pointer), `&` (reference), and `[n]` (array)
/// suffixes, plus a leading `mut` that raises the base type's mutability.
pub(super) fn parse_type_ref(p: &mut Parser, default_mutability: Mutability) -> TypeId {
    let mutability = if p.eat(TokenKind::Mut) {
        Mutability::Mutable
    } else {
        default_mutability
    };
    let line = p.current_line();
    let mut ty = if p.current().kind.is_primitive_type() {
        let prim = primitive_for(p.current().kind);
        p.bump();
        p.type_registry.basic(prim, mutability)
    } else if p.at(TokenKind::Ident) {
        let text = p.current().lexeme.clone();
        p.bump();
        let name = p.intern(&text);
        match p.type_scopes.lookup(name) {
            Some(named) => named,
            None => {
                p.error_at(DiagnosticKind::UndeclaredIdentifier, line)
                    .message(format!("`{text}` does not name a type"))
                    .emit();
                p.type_registry.void()
            }
        }
    } else {
        p.error_at(DiagnosticKind::UnexpectedToken, line)
            .message("expected a type")
            .emit();
        p.type_registry.void()
    };

    loop {
        if p.eat(TokenKind::Star) {
            ty = p.type_registry.pointer_to(ty, mutability);
        } else if p.eat(TokenKind::Amp) {
            ty = p.type_registry.reference_to(ty, mutability);
        } else if p.eat(TokenKind::LBracket) {
            p.push_delimiter(GroupingKind::Bracket);
            let bound_line = p.current_line();
            let bound_expr = parse_expression(p);
            p.expect_close(GroupingKind::Bracket, TokenKind::RBracket, "`]`");
            let num_members = match &p.node(bound_expr).kind {
                NodeKind::Constant { value } => value.as_i64().unwrap_or(0),
                _ => {
                    p.error_at(DiagnosticKind::NonConstantGlobalInitializer, bound_line)
                        .message("array bound must be a compile-time constant")
                        .emit();
                    0
                }
            };
            if num_members <= 0 {
                p.error_at(DiagnosticKind::ArrayBoundNotPositive, bound_line).emit();
            }
            ty = p.type_registry.array_of(ty, num_members.max(0) as u32, mutability);
        } else {
            break;
        }
    }
    ty
}

fn primitive_for(kind: TokenKind) -> Primitive {
    match kind {
        TokenKind::Void => Primitive::Void,
        TokenKind::U8 => Primitive::U8,
        TokenKind::I8 => Primitive::I8,
        TokenKind::U16 => Primitive::U16,
        TokenKind::I16 => Primitive::I16,
        TokenKind::U32 => Primitive::U32,
        TokenKind::I32 => Primitive::I32,
        TokenKind::U64 => Primitive::U64,
        TokenKind::I64 => Primitive::I64,
        TokenKind::F32 => Primitive::F32,
        TokenKind::F64 => Primitive::F64,
        TokenKind::Char => Primitive::Char,
        TokenKind::Bool => Primitive::Bool,
        _ => Primitive::Void,
    }
}

/// A coarse grouping used only to count "class-relative" parameter order,
/// per the register/stack allocation note the spec's design section leaves
/// for the (absent) codegen stage; the front end just records the count.
fn param_class(registry: &crate::types::TypeRegistry, ty: TypeId) -> u8 {
    if registry.is_floating_point(ty) {
        1
    } else if registry.is_memory_region(ty) || registry.is_reference(ty) {
        2
    } else {
        0
    }
}

/// `main` takes either no parameters or exactly `(i32, char**)`.
fn is_main_args_shape(registry: &crate::types::TypeRegistry, param_types: &[TypeId]) -> bool {
    if param_types.is_empty() {
        return true;
    }
    if param_types.len() != 2 {
        return false;
    }
    let argc_ok = matches!(
        registry.get(registry.dealias(param_types[0])).class,
        Class::Basic(Primitive::I32)
    );
    if !argc_ok {
        return false;
    }
    let Some(level1) = registry.pointee(param_types[1]) else {
        return false;
    };
    let Some(level2) = registry.pointee(level1) else {
        return false;
    };
    matches!(registry.get(registry.dealias(level2)).class, Class::Basic(Primitive::Char))
}

/// Dispatches on the current token to the right top-level declaration
/// parser. Returns `None` (after reporting `UnexpectedToken` and consuming
/// one token) if nothing recognizable starts here, so `program.rs` can keep
/// making forward progress on malformed input.
pub(super) fn parse_top_level_decl(p: &mut Parser) -> Option<NodeId> {
    let is_public = p.eat(TokenKind::Pub);
    match p.current().kind {
        TokenKind::Fn => Some(parse_function(p, is_public)),
        TokenKind::Struct => Some(parse_struct(p)),
        TokenKind::Union => Some(parse_union(p)),
        TokenKind::Enum => Some(parse_enum(p)),
        TokenKind::Define => Some(parse_alias(p)),
        TokenKind::Declare | TokenKind::Let | TokenKind::Static => Some(parse_global_var(p)),
        _ => {
            let line = p.current_line();
            p.error_at(DiagnosticKind::UnexpectedToken, line)
                .message(format!("expected a top-level declaration, found `{}`", p.current().lexeme))
                .emit();
            if !p.at_eof() {
                p.bump();
            }
            None
        }
    }
}

// ---- functions -----------------------------------------------------------

fn parse_function(p: &mut Parser, is_public: bool) -> NodeId {
    let line = p.current_line();
    p.bump(); // `fn`
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "a function name");
    let name = p.intern(&name_text);

    if p.function_table.contains(name) {
        p.error_at(DiagnosticKind::DuplicateDeclaration, line)
            .message(format!("function `{name_text}` is already declared"))
            .emit();
    }

    p.push_block_scope();
    p.expect(TokenKind::LParen, "`(`");
    p.push_delimiter(GroupingKind::Paren);

    let mut param_names = Vec::new();
    let mut param_types = Vec::new();
    let mut absolute = 0u8;
    let mut class_counts = [0u8; 3];
    if !p.at(TokenKind::RParen) {
        loop {
            let param_line = p.current_line();
            let pname_text = p.current().lexeme.clone();
            p.expect(TokenKind::Ident, "a parameter name");
            let pname = p.intern(&pname_text);
            p.expect(TokenKind::Colon, "`:`");
            let pty = parse_type_ref(p, Mutability::Immutable);

            if p.variable_scopes.declared_in_current_scope(pname) {
                p.error_at(DiagnosticKind::DuplicateDeclaration, param_line)
                    .message(format!("parameter `{pname_text}` is already declared"))
                    .emit();
            }
            absolute += 1;
            let class = param_class(&p.type_registry, pty) as usize;
            class_counts[class] += 1;
            let var = p.variables.insert(VariableRecord {
                name: pname,
                ty: pty,
                membership: Membership::FunctionParameter,
                initialized: true,
                mutated: false,
                declared_via: DeclaredVia::Declare,
                enum_member_value: None,
                function_declared_in: None,
                line: param_line,
                absolute_param_order: Some(absolute),
                class_relative_param_order: Some(class_counts[class]),
                stack_variable: false,
            });
            p.variable_scopes.declare(pname, var);

            param_names.push((pname, var));
            param_types.push(pty);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
    if param_types.len() > p.options.max_function_params {
        p.error_at(DiagnosticKind::TooManyParameters, line).emit();
    }

    let return_type = if p.eat(TokenKind::Arrow) {
        parse_type_ref(p, Mutability::Immutable)
    } else {
        p.type_registry.void()
    };
    let signature = p.type_registry.define_function_signature(param_types.clone(), return_type, is_public);

    let is_main = name_text == "main";
    if is_main {
        let return_ok = matches!(
            p.type_registry.get(p.type_registry.dealias(return_type)).class,
            Class::Basic(Primitive::I32)
        );
        if !is_public || !return_ok || !is_main_args_shape(&p.type_registry, &param_types) {
            p.error_at(DiagnosticKind::InvalidMainSignature, line).emit();
        }
    }

    let node = p.alloc(NodeKind::FunctionDef { name, signature, func: None }, line);
    for (pname, var) in &param_names {
        let pnode = p.alloc(NodeKind::Parameter { name: *pname, var: Some(*var) }, line);
        p.add_child(node, pnode);
    }

    let call_graph_node = p.call_graph.add_function_node(name);
    let defined = p.at(TokenKind::LBrace);
    let func_id = p.function_table.insert(
        name,
        FunctionRecord {
            name,
            signature,
            is_public,
            defined,
            called: is_main,
            return_type,
            parameters: param_names.iter().map(|(_, v)| *v).collect(),
            call_graph_node,
            line,
        },
    );
    p.node_mut(node).kind = NodeKind::FunctionDef { name, signature, func: Some(func_id) };

    // Nothing in source ever literally `@main(...)`s the entry point; the
    // runtime calls it, represented here as an edge from the synthetic `os`
    // call-graph node.
    if is_main {
        let os_node = p.call_graph.os();
        p.call_graph.record_call(os_node, call_graph_node);
    }

    let previous_function = p.enter_function(func_id);
    if defined {
        let body = super::stmt::parse_function_body(p);
        p.add_child(node, body);
    } else {
        p.expect(TokenKind::Semicolon, "`;`");
    }
    p.leave_function(previous_function);
    p.pop_block_scope();
    node
}

// ---- struct / union --------------------------------------------------------

fn parse_struct(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump();
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "a struct name");
    let name = p.intern(&name_text);
    check_duplicate_type(p, name, &name_text, line);

    let (immutable, mutable) = p.type_registry.begin_struct(name);
    p.type_scopes.declare(name, immutable);

    p.expect(TokenKind::LBrace, "`{`");
    p.push_delimiter(GroupingKind::Brace);
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        let field_text = p.current().lexeme.clone();
        p.expect(TokenKind::Ident, "a field name");
        let field_name = p.intern(&field_text);
        p.expect(TokenKind::Colon, "`:`");
        let field_ty = parse_type_ref(p, Mutability::Immutable);
        p.type_registry.push_struct_field(immutable, mutable, (field_name, field_ty));
        p.expect(TokenKind::Semicolon, "`;`");
    }
    p.expect_close(GroupingKind::Brace, TokenKind::RBrace, "`}`");
    p.type_registry.finish_struct(immutable, mutable);

    p.alloc(NodeKind::StructDef { name, ty: immutable }, line)
}

fn parse_union(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump();
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "a union name");
    let name = p.intern(&name_text);
    check_duplicate_type(p, name, &name_text, line);

    let (immutable, mutable) = p.type_registry.begin_union(name);
    p.type_scopes.declare(name, immutable);

    p.expect(TokenKind::LBrace, "`{`");
    p.push_delimiter(GroupingKind::Brace);
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        let member_text = p.current().lexeme.clone();
        p.expect(TokenKind::Ident, "a member name");
        let member_name = p.intern(&member_text);
        p.expect(TokenKind::Colon, "`:`");
        let member_ty = parse_type_ref(p, Mutability::Immutable);
        p.type_registry.push_union_member(immutable, mutable, (member_name, member_ty));
        p.expect(TokenKind::Semicolon, "`;`");
    }
    p.expect_close(GroupingKind::Brace, TokenKind::RBrace, "`}`");

    p.alloc(NodeKind::UnionDef { name, ty: immutable }, line)
}

fn check_duplicate_type(p: &mut Parser, _name: Symbol, text: &str, line: u32) {
    if p.type_scopes.declared_in_current_scope(_name) {
        p.error_at(DiagnosticKind::DuplicateDeclaration, line)
            .message(format!("type `{text}` is already declared"))
            .emit();
    }
}

// ---- enum ------------------------------------------------------------------

fn parse_enum(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump();
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "an enum name");
    let name = p.intern(&name_text);
    check_duplicate_type(p, name, &name_text, line);

    p.expect(TokenKind::LBrace, "`{`");
    p.push_delimiter(GroupingKind::Brace);
    let mut members = Vec::new();
    let mut next_value = 0i64;
    if !p.at(TokenKind::RBrace) {
        loop {
            let member_line = p.current_line();
            let member_text = p.current().lexeme.clone();
            p.expect(TokenKind::Ident, "an enum member name");
            let member_name = p.intern(&member_text);
            let value = if p.eat(TokenKind::Eq) {
                let expr = parse_expression(p);
                match &p.node(expr).kind {
                    NodeKind::Constant { value } => value.as_i64().unwrap_or(0),
                    _ => {
                        p.error_at(DiagnosticKind::NonConstantGlobalInitializer, member_line)
                            .message("enum member value must be a compile-time constant")
                            .emit();
                        next_value
                    }
                }
            } else {
                next_value
            };
            if members.iter().any(|(_, v)| *v == value) {
                p.error_at(DiagnosticKind::EnumValueCollision, member_line).emit();
            }
            members.push((member_name, value));
            next_value = value + 1;
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect_close(GroupingKind::Brace, TokenKind::RBrace, "`}`");

    let repr = p.type_registry.basic(Primitive::I32, Mutability::Immutable);
    let (immutable, _mutable) = p.type_registry.define_enum(name, members.clone(), repr);
    p.type_scopes.declare(name, immutable);

    for (member_name, value) in members {
        let var = p.variables.insert(VariableRecord {
            name: member_name,
            ty: immutable,
            membership: Membership::EnumMember,
            initialized: true,
            mutated: false,
            declared_via: DeclaredVia::Declare,
            enum_member_value: Some(value),
            function_declared_in: None,
            line,
            absolute_param_order: None,
            class_relative_param_order: None,
            stack_variable: false,
        });
        p.variable_scopes.declare(member_name, var);
    }

    p.alloc(NodeKind::EnumDef { name, ty: immutable }, line)
}

// ---- alias -------------------------------------------------------------------

fn parse_alias(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `define`
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "an alias name");
    let name = p.intern(&name_text);
    check_duplicate_type(p, name, &name_text, line);
    p.expect(TokenKind::As, "`as`");
    let target = parse_type_ref(p, Mutability::Immutable);
    p.expect(TokenKind::Semicolon, "`;`");

    let mutability = p.type_registry.mutability(target);
    let alias = p.type_registry.define_alias(name, target, mutability);
    p.type_scopes.declare(name, alias);
    p.alloc(NodeKind::AliasDef { name, ty: alias }, line)
}

// ---- globals -------------------------------------------------------------------

fn parse_global_var(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    let via = match p.current().kind {
        TokenKind::Declare => DeclaredVia::Declare,
        TokenKind::Let => DeclaredVia::Let,
        TokenKind::Static => DeclaredVia::Static,
        _ => unreachable!("caller only dispatches here on declare/let/static"),
    };
    p.bump();
    let name_text = p.current().lexeme.clone();
    p.expect(TokenKind::Ident, "a variable name");
    let name = p.intern(&name_text);

    let explicit_ty = if p.eat(TokenKind::Colon) {
        Some(parse_type_ref(p, Mutability::Immutable))
    } else {
        None
    };

    let initializer = parse_initializer_clause(p, via, line);
    p.expect(TokenKind::Semicolon, "`;`");

    let ty = match (explicit_ty, initializer) {
        (Some(t), Some(expr)) => validate_initializer(p, t, expr, via != DeclaredVia::Declare, line),
        (Some(t), None) => t,
        (None, Some(expr)) => p.node(expr).inferred_type.unwrap_or_else(|| p.type_registry.void()),
        (None, None) => p.type_registry.void(),
    };

    if p.variable_scopes.declared_in_current_scope(name) {
        p.error_at(DiagnosticKind::DuplicateDeclaration, line)
            .message(format!("global `{name_text}` is already declared"))
            .emit();
    }
    let var = p.variables.insert(VariableRecord {
        name,
        ty,
        membership: Membership::GlobalVariable,
        initialized: initializer.is_some(),
        mutated: false,
        declared_via: via,
        enum_member_value: None,
        function_declared_in: None,
        line,
        absolute_param_order: None,
        class_relative_param_order: None,
        stack_variable: false,
    });
    p.variable_scopes.declare(name, var);

    if let Some(expr) = initializer {
        if matches!(p.node(expr).kind, NodeKind::Constant { .. }) {
            p.constant_table.insert(name, ConstantRecord { name, constant_node: expr, line });
        }
    }

    let kind = match via {
        DeclaredVia::Declare => NodeKind::DeclareStmt { name, var: Some(var) },
        DeclaredVia::Let => NodeKind::LetStmt { name, var: Some(var) },
        DeclaredVia::Static => NodeKind::StaticStmt { name, var: Some(var) },
    };
    let node = p.alloc(kind, line);
    if let Some(expr) = initializer {
        p.add_child(node, expr);
    }
    node
}

/// `declare` never takes an initializer — that is reserved to `let`/`static`,
/// which spell it with `:=` rather than a bare `=`. If `declare` is followed
/// by `:=` anyway, report it but still consume the expression so parsing can
/// continue.
fn parse_initializer_clause(p: &mut Parser, via: DeclaredVia, _line: u32) -> Option<NodeId> {
    if via == DeclaredVia::Declare {
        if p.at(TokenKind::ColonEq) {
            let bad_line = p.current_line();
            p.error_at(DiagnosticKind::UnexpectedToken, bad_line)
                .message("`declare` does not take an initializer; use `let` instead")
                .emit();
            p.bump();
            Some(parse_expression(p))
        } else {
            None
        }
    } else if p.eat(TokenKind::ColonEq) {
        Some(parse_expression(p))
    } else {
        None
    }
}

/// Validates (and, where the declared type leaves something to fill in,
/// rewrites) an initializer against its target's declared type. Implements:
/// array/struct initializer-list recursion (filling an incomplete array's
/// bound, retagging a brace-list that targets a struct to
/// `StructInitializerList` and checking its field order/count), a string
/// literal promoted to a `char` array, reference-to-reference rejection, and
/// the general assignable-or-narrow-or-error check every other initializer
/// falls through to. `require_constant` enforces a compile-time-constant
/// initializer (global `let`/`static`, and local `static`).
pub(super) fn validate_initializer(
    p: &mut Parser,
    target_type: TypeId,
    initializer: NodeId,
    require_constant: bool,
    line: u32,
) -> TypeId {
    let dealiased = p.type_registry.dealias(target_type);

    if matches!(p.node(initializer).kind, NodeKind::ArrayInitializerList) {
        return if matches!(p.type_registry.get(dealiased).class, Class::Struct { .. }) {
            validate_struct_initializer(p, target_type, initializer, require_constant, line)
        } else {
            validate_array_initializer(p, target_type, initializer, require_constant, line)
        };
    }

    if let NodeKind::Constant { value: ConstantValue::Str(bytes) } = p.node(initializer).kind.clone() {
        if let Some(promoted) = promote_string_initializer(p, target_type, &bytes, line) {
            p.node_mut(initializer).inferred_type = Some(promoted);
            return promoted;
        }
    }

    if p.type_registry.reference_target(target_type).is_some() {
        let init_ty = p.node(initializer).inferred_type.unwrap_or_else(|| p.type_registry.void());
        if p.type_registry.is_reference(init_ty) {
            p.error_at(DiagnosticKind::ReferenceTypeMisuse, line)
                .message("a reference cannot be initialized from another reference")
                .emit();
            return target_type;
        }
    }

    let init_ty = p.node(initializer).inferred_type.unwrap_or_else(|| p.type_registry.void());
    match p.type_registry.is_assignable(target_type, init_ty) {
        Some(_) => {}
        None if p.type_registry.is_narrowing(target_type, init_ty) => {
            p.warning_at(DiagnosticKind::SubWidthNarrowing, line).emit();
        }
        None => {
            p.error_at(DiagnosticKind::IncompatibleAssignment, line).emit();
        }
    }
    if require_constant && !matches!(p.node(initializer).kind, NodeKind::Constant { .. }) {
        p.error_at(DiagnosticKind::NonConstantGlobalInitializer, line).emit();
    }
    if let NodeKind::Constant { value } = p.node(initializer).kind.clone() {
        let coerced = fold::coerce_constant(&value, target_type, &p.type_registry);
        p.node_mut(initializer).kind = NodeKind::Constant { value: coerced };
    }
    target_type
}

fn validate_array_initializer(
    p: &mut Parser,
    target_type: TypeId,
    initializer: NodeId,
    require_constant: bool,
    line: u32,
) -> TypeId {
    let dealiased = p.type_registry.dealias(target_type);
    let elem_ty = p.type_registry.pointee(target_type).unwrap_or_else(|| p.type_registry.void());
    let children = p.node(initializer).children.clone();
    for child in &children {
        validate_initializer(p, elem_ty, *child, require_constant, line);
    }
    let filled = match &p.type_registry.get(dealiased).class {
        Class::Array { num_members, .. } if *num_members == 0 => {
            let mutability = p.type_registry.mutability(target_type);
            p.type_registry.array_of(elem_ty, children.len() as u32, mutability)
        }
        Class::Array { num_members, .. } => {
            if children.len() as u32 != *num_members {
                p.error_at(DiagnosticKind::ArrayBoundNotPositive, line)
                    .message("initializer list length does not match the declared array bound")
                    .emit();
            }
            target_type
        }
        _ => target_type,
    };
    p.node_mut(initializer).inferred_type = Some(filled);
    filled
}

fn validate_struct_initializer(
    p: &mut Parser,
    target_type: TypeId,
    initializer: NodeId,
    require_constant: bool,
    line: u32,
) -> TypeId {
    let dealiased = p.type_registry.dealias(target_type);
    let fields = match &p.type_registry.get(dealiased).class {
        Class::Struct { fields, .. } => fields.clone(),
        _ => Vec::new(),
    };
    let children = p.node(initializer).children.clone();
    if children.len() != fields.len() {
        p.error_at(DiagnosticKind::IncompatibleAssignment, line)
            .message("struct initializer list length does not match the number of fields")
            .emit();
    }
    for (child, (_, field_ty)) in children.iter().zip(fields.iter()) {
        validate_initializer(p, *field_ty, *child, require_constant, line);
    }
    p.node_mut(initializer).kind = NodeKind::StructInitializerList;
    p.node_mut(initializer).inferred_type = Some(target_type);
    target_type
}

/// Promotes a string literal into a `char` array, filling an incomplete
/// array's bound or checking it fits inside a fixed one. Returns `None` (no
/// promotion) if the target isn't a `char` array, leaving the caller to fall
/// through to the ordinary assignability check.
fn promote_string_initializer(p: &mut Parser, target_type: TypeId, bytes: &[u8], line: u32) -> Option<TypeId> {
    let dealiased = p.type_registry.dealias(target_type);
    let (member_type, num_members) = match &p.type_registry.get(dealiased).class {
        Class::Array { member_type, num_members } => (*member_type, *num_members),
        _ => return None,
    };
    let char_ty = p.type_registry.basic(Primitive::Char, Mutability::Immutable);
    if !p.type_registry.types_equal(member_type, char_ty) {
        return None;
    }
    let needed = bytes.len() as u32;
    let mutability = p.type_registry.mutability(target_type);
    if num_members == 0 {
        Some(p.type_registry.array_of(member_type, needed, mutability))
    } else {
        if needed > num_members {
            p.error_at(DiagnosticKind::ArrayBoundNotPositive, line)
                .message("string literal does not fit in the declared char array bound")
                .emit();
        }
        Some(target_type)
    }
}
