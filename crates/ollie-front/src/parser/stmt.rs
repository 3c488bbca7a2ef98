//! Statement parsing (component I): compound statements, control flow, local
//! declarations, and the handful of directive-like statements (`defer`,
//! `idle`, `#asm`). Each construct validates itself against the nesting stack
//! as it is parsed, rather than deferring control-flow validity to a
//! separate walk over the finished tree.

use crate::ast::{NodeId, NodeKind};
use crate::diagnostics::DiagnosticKind;
use crate::stacks::{GroupingKind, NestingLevel};
use crate::symbols::{DeclaredVia, Membership, VariableRecord};
use crate::token::TokenKind;
use crate::types::{Mutability, TypeId};

use super::expr::parse_expression;
use super::Parser;

fn expr_type(p: &Parser, id: NodeId) -> TypeId {
    p.node(id).inferred_type.unwrap_or_else(|| p.type_registry.void())
}

fn check_conditional_type(p: &mut Parser, cond: NodeId, line: u32) {
    let ty = expr_type(p, cond);
    if !p.type_registry.is_valid_for_conditional(ty) {
        p.error_at(DiagnosticKind::InvalidOperatorForType, line).emit();
    }
}

/// Entry point for a function's `{ ... }` body: pushes the `Function`
/// nesting level so `break`/`return`/`jump`/labels inside it validate
/// against it, independent of the block scope already pushed by
/// `decl::parse_function` around the parameter list.
pub(super) fn parse_function_body(p: &mut Parser) -> NodeId {
    p.push_nesting(NestingLevel::Function);
    let body = parse_block(p);
    p.pop_nesting();
    body
}

pub(super) fn parse_block(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.expect(TokenKind::LBrace, "`{`");
    p.push_delimiter(GroupingKind::Brace);
    p.push_block_scope();
    let mut stmts = Vec::new();
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        stmts.push(parse_statement(p));
    }
    p.pop_block_scope();
    p.expect_close(GroupingKind::Brace, TokenKind::RBrace, "`}`");
    let id = p.alloc(NodeKind::CompoundStmt, line);
    for s in stmts {
        p.add_child(id, s);
    }
    id
}

pub(super) fn parse_statement(p: &mut Parser) -> NodeId {
    if !p.enter_rule() {
        return p.alloc(NodeKind::Error, p.current_line());
    }
    while p.eat(TokenKind::Semicolon) {}
    let id = match p.current().kind {
        TokenKind::LBrace => parse_block(p),
        TokenKind::If => parse_if(p),
        TokenKind::For => parse_for(p),
        TokenKind::While => parse_while(p),
        TokenKind::Do => parse_do_while(p),
        TokenKind::Switch => parse_switch(p),
        TokenKind::Break => parse_break(p),
        TokenKind::Continue => parse_continue(p),
        TokenKind::Ret => parse_return(p),
        TokenKind::Jump => parse_jump(p),
        TokenKind::Defer => parse_defer(p),
        TokenKind::Idle => parse_idle(p),
        TokenKind::AsmDirective => parse_asm(p),
        TokenKind::Declare | TokenKind::Let | TokenKind::Static => parse_local_var(p),
        TokenKind::LabelName if p.nth(1).kind == TokenKind::Colon => parse_label_decl(p),
        _ => {
            let expr = parse_expression(p);
            p.expect(TokenKind::Semicolon, "`;`");
            expr
        }
    };
    p.exit_rule();
    id
}

// ---- if / else if / else --------------------------------------------------

fn parse_if(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `if`
    p.expect(TokenKind::LParen, "`(`");
    p.push_delimiter(GroupingKind::Paren);
    let cond = parse_expression(p);
    p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
    check_conditional_type(p, cond, line);

    p.push_nesting(NestingLevel::IfBranch);
    let body = parse_statement(p);
    p.pop_nesting();

    let id = p.alloc(NodeKind::IfStmt, line);
    p.add_child(id, cond);
    p.add_child(id, body);
    if let Some(tail) = parse_else_tail(p) {
        p.add_child(id, tail);
    }
    id
}

/// Parses the `else if (...) ... ` / `else ...` tail shared by `if` and
/// chained `else if`, returning the `ElseIfStmt`/`ElseStmt` node if an
/// `else` was present.
fn parse_else_tail(p: &mut Parser) -> Option<NodeId> {
    if !p.eat(TokenKind::Else) {
        return None;
    }
    let line = p.current_line();
    if p.at(TokenKind::If) {
        p.bump();
        p.expect(TokenKind::LParen, "`(`");
        p.push_delimiter(GroupingKind::Paren);
        let cond = parse_expression(p);
        p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
        check_conditional_type(p, cond, line);

        p.push_nesting(NestingLevel::IfBranch);
        let body = parse_statement(p);
        p.pop_nesting();

        let id = p.alloc(NodeKind::ElseIfStmt, line);
        p.add_child(id, cond);
        p.add_child(id, body);
        if let Some(tail) = parse_else_tail(p) {
            p.add_child(id, tail);
        }
        Some(id)
    } else {
        p.push_nesting(NestingLevel::IfBranch);
        let body = parse_statement(p);
        p.pop_nesting();
        let id = p.alloc(NodeKind::ElseStmt, line);
        p.add_child(id, body);
        Some(id)
    }
}

// ---- loops -----------------------------------------------------------------

fn parse_for(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `for`
    p.expect(TokenKind::LParen, "`(`");
    p.push_delimiter(GroupingKind::Paren);
    p.push_block_scope();

    let init = match p.current().kind {
        TokenKind::Semicolon => {
            p.bump();
            None
        }
        TokenKind::Declare | TokenKind::Let | TokenKind::Static => Some(parse_local_var(p)),
        _ => {
            let e = parse_expression(p);
            p.expect(TokenKind::Semicolon, "`;`");
            Some(e)
        }
    };

    let cond = if !p.at(TokenKind::Semicolon) {
        let c = parse_expression(p);
        let cond_line = p.current_line();
        check_conditional_type(p, c, cond_line);
        Some(c)
    } else {
        None
    };
    p.expect(TokenKind::Semicolon, "`;`");

    let step = if !p.at(TokenKind::RParen) {
        Some(parse_expression(p))
    } else {
        None
    };
    p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");

    p.push_nesting(NestingLevel::Loop);
    let body = parse_statement(p);
    p.pop_nesting();
    p.pop_block_scope();

    let id = p.alloc(NodeKind::ForStmt, line);
    if let Some(i) = init {
        p.add_child(id, i);
    }
    if let Some(c) = cond {
        p.add_child(id, c);
    }
    if let Some(s) = step {
        p.add_child(id, s);
    }
    p.add_child(id, body);
    id
}

fn parse_while(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `while`
    p.expect(TokenKind::LParen, "`(`");
    p.push_delimiter(GroupingKind::Paren);
    let cond = parse_expression(p);
    p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
    check_conditional_type(p, cond, line);

    p.push_nesting(NestingLevel::Loop);
    let body = parse_statement(p);
    p.pop_nesting();

    let id = p.alloc(NodeKind::WhileStmt, line);
    p.add_child(id, cond);
    p.add_child(id, body);
    id
}

fn parse_do_while(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `do`

    p.push_nesting(NestingLevel::Loop);
    let body = parse_statement(p);
    p.pop_nesting();

    p.expect(TokenKind::While, "`while`");
    p.expect(TokenKind::LParen, "`(`");
    p.push_delimiter(GroupingKind::Paren);
    let cond = parse_expression(p);
    p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
    check_conditional_type(p, cond, line);
    p.expect(TokenKind::Semicolon, "`;`");

    let id = p.alloc(NodeKind::DoWhileStmt, line);
    p.add_child(id, body);
    p.add_child(id, cond);
    id
}

// ---- switch ------------------------------------------------------------------

/// Parses `switch on EXPR { case V => STMT ... default => STMT }` (arrow
/// dialect) or `switch (EXPR) { case V: STMT ... default: STMT }` (c-style
/// dialect). Both dialects share one arm shape here: each arm's body is a
/// single statement (ordinarily a block), since the language has no implicit
/// fallthrough for the `=>` dialect to unify with.
fn parse_switch(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `switch`

    let arrow_dialect = p.eat(TokenKind::On);
    let subject = if arrow_dialect {
        p.push_nesting(NestingLevel::CaseCondition);
        let s = parse_expression(p);
        p.pop_nesting();
        s
    } else {
        p.expect(TokenKind::LParen, "`(`");
        p.push_delimiter(GroupingKind::Paren);
        p.push_nesting(NestingLevel::CaseCondition);
        let s = parse_expression(p);
        p.pop_nesting();
        p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
        s
    };
    let subject_ty = expr_type(p, subject);

    p.expect(TokenKind::LBrace, "`{`");
    p.push_delimiter(GroupingKind::Brace);

    let mut seen_arrow: Option<bool> = None;
    let mut seen_values: Vec<i64> = Vec::new();
    let mut default_seen = false;
    let mut arms = Vec::new();
    let mut lower_bound = i64::MAX;
    let mut upper_bound = i64::MIN;

    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        let arm_line = p.current_line();
        let is_default = p.eat(TokenKind::Default);
        let value = if is_default {
            None
        } else {
            p.expect(TokenKind::Case, "`case`");
            let expr = parse_expression(p);
            match &p.node(expr).kind {
                NodeKind::Constant { value } => value.as_i64(),
                _ => {
                    p.error_at(DiagnosticKind::NonConstantGlobalInitializer, arm_line)
                        .message("case value must be a compile-time constant")
                        .emit();
                    None
                }
            }
        };

        // An optional `when COND` guard. Not yet fed into exhaustiveness or
        // dispatch (`CaseArm` carries no guard slot), but parsed and kept in
        // the tree as the arm's first child so the guard expression is still
        // type-checked and not silently dropped.
        let guard = if !is_default && p.eat(TokenKind::When) {
            let g = parse_expression(p);
            let guard_line = p.current_line();
            check_conditional_type(p, g, guard_line);
            Some(g)
        } else {
            None
        };

        let this_arrow = if p.eat(TokenKind::FatArrow) {
            true
        } else {
            p.expect(TokenKind::Colon, "`:` or `=>`");
            false
        };
        match seen_arrow {
            None => seen_arrow = Some(this_arrow),
            Some(prev) if prev != this_arrow => {
                p.error_at(DiagnosticKind::SwitchMixedDialects, arm_line).emit();
            }
            _ => {}
        }

        if let Some(v) = value {
            if seen_values.contains(&v) {
                p.error_at(DiagnosticKind::SwitchDuplicateCase, arm_line).emit();
            } else {
                seen_values.push(v);
                lower_bound = lower_bound.min(v);
                upper_bound = upper_bound.max(v);
            }
        }
        if is_default {
            if default_seen {
                p.error_at(DiagnosticKind::SwitchDuplicateCase, arm_line).emit();
            }
            default_seen = true;
        }

        let nesting = if this_arrow { NestingLevel::CaseArm } else { NestingLevel::CStyleCaseArm };
        p.push_nesting(nesting);
        let body = parse_statement(p);
        p.pop_nesting();

        let arm_id = p.alloc(NodeKind::CaseArm { value, is_default }, arm_line);
        if let Some(g) = guard {
            p.add_child(arm_id, g);
        }
        p.add_child(arm_id, body);
        arms.push(arm_id);
    }
    p.expect_close(GroupingKind::Brace, TokenKind::RBrace, "`}`");

    if p.type_registry.is_exhaustive_switch_eligible(subject_ty) {
        let covered_all = if let Some(members) = p.type_registry.enum_members(subject_ty) {
            members.iter().all(|(_, v)| seen_values.contains(v))
        } else if let Some((lo, hi)) = p.type_registry.domain_range(subject_ty) {
            (lo..=hi).all(|v| seen_values.contains(&v))
        } else {
            false
        };
        if !covered_all && !default_seen {
            p.error_at(DiagnosticKind::SwitchNonExhaustive, line).emit();
        } else if covered_all && default_seen {
            p.warning_at(DiagnosticKind::SwitchUnreachableDefault, line).emit();
        }
    }

    if upper_bound >= lower_bound {
        let span = upper_bound.saturating_sub(lower_bound).saturating_add(1);
        if span > p.options.max_switch_range {
            p.error_at(DiagnosticKind::SwitchRangeTooWide, line).emit();
        }
    }

    let id = p.alloc(NodeKind::SwitchStmt { arrow_dialect: seen_arrow.unwrap_or(arrow_dialect) }, line);
    p.add_child(id, subject);
    for arm in arms {
        p.add_child(id, arm);
    }
    id
}

// ---- break / continue / return ------------------------------------------------

/// Parses an optional `when (cond)` guard, type-checking it as a condition.
/// Shared by `break`, `continue` and `jump`.
fn parse_when_guard(p: &mut Parser) -> Option<NodeId> {
    if !p.eat(TokenKind::When) {
        return None;
    }
    p.expect(TokenKind::LParen, "`(`");
    p.push_delimiter(GroupingKind::Paren);
    let cond = parse_expression(p);
    let line = p.current_line();
    p.expect_close(GroupingKind::Paren, TokenKind::RParen, "`)`");
    check_conditional_type(p, cond, line);
    Some(cond)
}

/// A synthesized constant `1`, used to represent an unconditional `jump` as
/// `jump LABEL when(1)` so every jump carries a guard child uniformly.
fn synthesize_true(p: &mut Parser, line: u32) -> NodeId {
    let ty = p.type_registry.basic(crate::types::Primitive::Bool, Mutability::Immutable);
    let id = p.alloc(NodeKind::Constant { value: crate::ast::ConstantValue::Bool(true) }, line);
    p.node_mut(id).inferred_type = Some(ty);
    id
}

fn parse_break(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump();
    if p.nesting().innermost_loop_or_switch().is_none() {
        p.error_at(DiagnosticKind::BreakOutOfContext, line).emit();
    }
    let guard = parse_when_guard(p);
    p.expect(TokenKind::Semicolon, "`;`");
    let id = p.alloc(NodeKind::BreakStmt, line);
    if let Some(g) = guard {
        p.add_child(id, g);
    }
    id
}

fn parse_continue(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump();
    if p.nesting().innermost_loop().is_none() {
        p.error_at(DiagnosticKind::ContinueOutOfContext, line).emit();
    }
    let guard = parse_when_guard(p);
    p.expect(TokenKind::Semicolon, "`;`");
    let id = p.alloc(NodeKind::ContinueStmt, line);
    if let Some(g) = guard {
        p.add_child(id, g);
    }
    id
}

fn parse_return(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `ret`
    if p.nesting().contains(NestingLevel::Defer) || !p.nesting().contains(NestingLevel::Function) {
        p.error_at(DiagnosticKind::ReturnOutOfContext, line).emit();
    }
    let value = if !p.at(TokenKind::Semicolon) {
        Some(parse_expression(p))
    } else {
        None
    };
    p.expect(TokenKind::Semicolon, "`;`");

    if let Some(func_id) = p.current_function() {
        let expected = p.function_table.get(func_id).return_type;
        match value {
            Some(v) => {
                if p.type_registry.is_void(expected) {
                    p.error_at(DiagnosticKind::VoidTypeMisuse, line)
                        .message("a void-returning function cannot `ret` a value")
                        .emit();
                } else {
                    let actual = expr_type(p, v);
                    match p.type_registry.is_assignable(expected, actual) {
                        Some(_) => {}
                        None if p.type_registry.is_narrowing(expected, actual) => {
                            p.warning_at(DiagnosticKind::SubWidthNarrowing, line).emit();
                        }
                        None => {
                            p.error_at(DiagnosticKind::IncompatibleAssignment, line)
                                .message("returned value does not match the function's declared return type")
                                .emit();
                        }
                    }
                }
            }
            None => {
                if !p.type_registry.is_void(expected) {
                    p.error_at(DiagnosticKind::IncompatibleAssignment, line)
                        .message("missing return value for a non-void function")
                        .emit();
                }
            }
        }
    }

    let id = p.alloc(NodeKind::ReturnStmt, line);
    if let Some(v) = value {
        p.add_child(id, v);
    }
    id
}

// ---- jump / label ------------------------------------------------------------

fn parse_jump(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `jump`
    if p.nesting().contains(NestingLevel::Defer) {
        p.error_at(DiagnosticKind::JumpOutOfContext, line)
            .message("jump is not allowed inside a defer block")
            .emit();
    } else if !p.nesting().contains(NestingLevel::Function) {
        p.error_at(DiagnosticKind::JumpOutOfContext, line).emit();
    }
    let label = if p.at(TokenKind::LabelName) {
        let text = p.current().lexeme.clone();
        p.bump();
        p.intern(text.trim_start_matches('#'))
    } else {
        p.error_at(DiagnosticKind::JumpTargetNotALabel, line).emit();
        p.intern("")
    };
    let guard = parse_when_guard(p);
    p.expect(TokenKind::Semicolon, "`;`");
    let guard = guard.unwrap_or_else(|| synthesize_true(p, line));
    let id = p.alloc(NodeKind::JumpStmt { label }, line);
    p.add_child(id, guard);
    p.record_jump(label, id, line);
    id
}

fn parse_label_decl(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    let text = p.current().lexeme.clone();
    p.bump();
    let name = p.intern(text.trim_start_matches('#'));
    p.expect(TokenKind::Colon, "`:`");
    if !p.nesting().contains(NestingLevel::Function) {
        p.error_at(DiagnosticKind::LabelOutOfContext, line).emit();
    }
    p.declare_label(name);
    p.alloc(NodeKind::LabelDecl { name }, line)
}

// ---- defer / idle / asm --------------------------------------------------------

fn parse_defer(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `defer`
    if p.nesting().top() != Some(NestingLevel::Function) {
        p.error_at(DiagnosticKind::DeferOutOfContext, line)
            .message("defer must be pushed directly inside a function body, not a nested block")
            .emit();
    }
    p.push_nesting(NestingLevel::Defer);
    let body = parse_statement(p);
    p.pop_nesting();
    let id = p.alloc(NodeKind::DeferStmt, line);
    p.add_child(id, body);
    id
}

fn parse_idle(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `idle`
    p.expect(TokenKind::Semicolon, "`;`");
    p.alloc(NodeKind::IdleStmt, line)
}

fn parse_asm(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `#asm`
    p.expect(TokenKind::LBrace, "`{`");
    let text = p.tokens.slurp_assembly_block();
    p.expect(TokenKind::Semicolon, "`;`");
    p.alloc(NodeKind::AsmStmt { text }, line)
}

// ---- local declare/let/static --------------------------------------------------

/// Local counterpart of `decl::parse_global_var`: same surface syntax, but
/// registered as `Membership::Local` and only `static` locals require a
/// compile-time constant initializer (a runtime `let`/`declare` local
/// doesn't need static storage, unlike its global-scope namesake).
fn parse_local_var(p: &mut Parser) -> NodeId {
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
        Some(super::decl::parse_type_ref(p, Mutability::Immutable))
    } else {
        None
    };

    // `declare` never takes an initializer — that's `let`/`static`'s `:=`.
    let initializer = if via == DeclaredVia::Declare {
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
    };
    p.expect(TokenKind::Semicolon, "`;`");

    let ty = match (explicit_ty, initializer) {
        (Some(t), Some(expr)) => {
            super::decl::validate_initializer(p, t, expr, via == DeclaredVia::Static, line)
        }
        (Some(t), None) => t,
        (None, Some(expr)) => p.node(expr).inferred_type.unwrap_or_else(|| p.type_registry.void()),
        (None, None) => p.type_registry.void(),
    };

    if p.variable_scopes.declared_in_current_scope(name) {
        p.error_at(DiagnosticKind::DuplicateDeclaration, line)
            .message(format!("variable `{name_text}` is already declared in this scope"))
            .emit();
    }
    let var = p.variables.insert(VariableRecord {
        name,
        ty,
        membership: Membership::Local,
        initialized: initializer.is_some(),
        mutated: false,
        declared_via: via,
        enum_member_value: None,
        function_declared_in: p.current_function(),
        line,
        absolute_param_order: None,
        class_relative_param_order: None,
        stack_variable: false,
    });
    p.variable_scopes.declare(name, var);

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
