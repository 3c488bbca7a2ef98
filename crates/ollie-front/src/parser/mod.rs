//! The parser (components §4.G-J folded together): a recursive-descent
//! parser that builds the AST, resolves symbols, checks types, and folds
//! constants in a single pass, rather than the teacher's CST-then-visitor
//! two-pass pipeline. `Parser` is the bundled `ParserContext` the design
//! notes call for: every helper takes `&mut self` instead of threading four
//! or five separate tables through every grammar function by hand.

mod decl;
mod expr;
mod program;
mod stmt;

#[cfg(test)]
mod tests;

use ollie_core::{Interner, Symbol};

use crate::ast::{AstArena, Node, NodeId, NodeKind};
use crate::callgraph::CallGraph;
use crate::diagnostics::{DiagnosticBuilder, DiagnosticKind, Diagnostics, Severity};
use crate::options::CompilerOptions;
use crate::results::FrontEndResults;
use crate::stacks::{GroupingKind, GroupingStack, NestingLevel, NestingStack};
use crate::symbols::{ConstantTable, FuncId, FunctionTable, ScopedTable, VarId, VariableStore};
use crate::token::{Token, TokenKind, TokenSource};
use crate::types::{TypeId, TypeRegistry};
use crate::Error;

/// Recursion depth past which we give up rather than risk a native stack
/// overflow on deeply (or maliciously) nested input.
const MAX_RECURSION_DEPTH: u32 = 256;
/// Upper bound on the number of grammar rules a single parse may enter,
/// guarding against pathological quadratic-or-worse input.
const DEFAULT_RULE_BUDGET: u32 = 2_000_000;

pub struct Parser<'src> {
    #[allow(dead_code)]
    source: &'src str,
    tokens: TokenSource,
    interner: Interner,
    diagnostics: Diagnostics,
    grouping: GroupingStack,
    nesting: NestingStack,

    ast: AstArena,
    type_registry: TypeRegistry,
    function_table: FunctionTable,
    variable_scopes: ScopedTable<VarId>,
    variables: VariableStore,
    type_scopes: ScopedTable<TypeId>,
    constant_table: ConstantTable,
    call_graph: CallGraph,

    current_function: Option<FuncId>,
    /// Labels and jumps accumulated for the function currently being
    /// parsed; validated for cross-references once the body is closed.
    pending_jumps: Vec<(Symbol, NodeId, u32)>,
    declared_labels: Vec<Symbol>,

    depth: u32,
    rule_budget: u32,
    last_diagnostic_line: Option<u32>,
    fatal: Option<Error>,

    options: CompilerOptions,
}

impl<'src> Parser<'src> {
    pub fn new(options: CompilerOptions, source: &'src str) -> Self {
        let tokens = crate::token::lex(source);
        Self {
            source,
            tokens: TokenSource::new(tokens),
            interner: Interner::new(),
            diagnostics: Diagnostics::new(),
            grouping: GroupingStack::new(),
            nesting: NestingStack::new(),
            ast: AstArena::new(),
            type_registry: TypeRegistry::new(),
            function_table: FunctionTable::new(),
            variable_scopes: ScopedTable::new(),
            variables: VariableStore::new(),
            type_scopes: ScopedTable::new(),
            constant_table: ConstantTable::new(),
            call_graph: CallGraph::new(),
            current_function: None,
            pending_jumps: Vec::new(),
            declared_labels: Vec::new(),
            depth: 0,
            rule_budget: DEFAULT_RULE_BUDGET,
            last_diagnostic_line: None,
            fatal: None,
            options,
        }
    }

    /// Runs the whole front end over the source this parser was built
    /// with, producing either a fatal [`Error`] or a complete
    /// [`FrontEndResults`] (which may itself carry non-fatal diagnostics).
    pub fn run(mut self) -> crate::Result<FrontEndResults> {
        let root = program::parse_program(&mut self);
        if let Some(err) = self.fatal {
            return Err(err);
        }
        let lines_processed = self.tokens.current_line();
        let num_errors = self.diagnostics.error_count();
        let num_warnings = self.diagnostics.warning_count();
        Ok(FrontEndResults {
            ast: self.ast,
            root,
            function_table: self.function_table,
            variable_scopes: self.variable_scopes,
            variables: self.variables,
            type_scopes: self.type_scopes,
            constant_table: self.constant_table,
            type_registry: self.type_registry,
            call_graph: self.call_graph,
            diagnostics: self.diagnostics,
            num_errors,
            num_warnings,
            lines_processed,
        })
    }

    // ---- token adapter -----------------------------------------------

    pub(crate) fn current(&self) -> &Token {
        self.tokens.peek_nth(0)
    }

    pub(crate) fn nth(&self, n: usize) -> &Token {
        self.tokens.peek_nth(n)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.at(TokenKind::Done)
    }

    pub(crate) fn current_line(&self) -> u32 {
        self.current().line
    }

    /// Consumes and returns the current token. Panics if called at EOF,
    /// matching the teacher's `bump()`: every call site must check
    /// `at_eof` (or an `eat`/`expect` wrapper) first.
    pub(crate) fn bump(&mut self) -> Token {
        debug_assert!(!self.at_eof(), "bump() called at end of input");
        self.tokens.next()
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it matches `kind`; otherwise reports
    /// `UnexpectedToken` and leaves the token stream where it is so callers
    /// can attempt error recovery.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        let found = self.current().lexeme.clone();
        self.error(DiagnosticKind::UnexpectedToken)
            .message(format!("expected {what}, found `{found}`"))
            .emit();
        false
    }

    pub(crate) fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    pub(crate) fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    // ---- diagnostics ---------------------------------------------------

    /// Emits a diagnostic at the current line.
    pub(crate) fn error(&mut self, kind: DiagnosticKind) -> DiagnosticBuilder<'_> {
        self.report(Severity::Error, kind)
    }

    pub(crate) fn warning(&mut self, kind: DiagnosticKind) -> DiagnosticBuilder<'_> {
        self.report(Severity::Warning, kind)
    }

    fn report(&mut self, severity: Severity, kind: DiagnosticKind) -> DiagnosticBuilder<'_> {
        let line = self.current_line();
        self.last_diagnostic_line = Some(line);
        self.diagnostics.report(severity, kind, line)
    }

    pub(crate) fn error_at(&mut self, kind: DiagnosticKind, line: u32) -> DiagnosticBuilder<'_> {
        self.last_diagnostic_line = Some(line);
        self.diagnostics.report(Severity::Error, kind, line)
    }

    pub(crate) fn warning_at(&mut self, kind: DiagnosticKind, line: u32) -> DiagnosticBuilder<'_> {
        self.last_diagnostic_line = Some(line);
        self.diagnostics.report(Severity::Warning, kind, line)
    }

    // ---- recursion / rule budget ---------------------------------------

    /// Entered at the top of every recursive grammar rule. Returns `false`
    /// (and sets a fatal error) once either guard trips; callers must check
    /// the return value and unwind immediately.
    #[must_use]
    pub(crate) fn enter_rule(&mut self) -> bool {
        if self.fatal.is_some() {
            return false;
        }
        self.depth += 1;
        if self.depth > MAX_RECURSION_DEPTH {
            self.fatal = Some(Error::RecursionLimitExceeded(self.current_line()));
            return false;
        }
        if self.rule_budget == 0 {
            self.fatal = Some(Error::RuleBudgetExhausted(DEFAULT_RULE_BUDGET));
            return false;
        }
        self.rule_budget -= 1;
        true
    }

    pub(crate) fn exit_rule(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn has_fatal_error(&self) -> bool {
        self.fatal.is_some()
    }

    // ---- grouping delimiters --------------------------------------------

    pub(crate) fn push_delimiter(&mut self, kind: GroupingKind) {
        let line = self.current_line();
        self.grouping.push(kind, line);
    }

    /// Expects and consumes a closing delimiter, reporting
    /// `MissingDelimiter` with the opening location if it's absent.
    pub(crate) fn expect_close(&mut self, kind: GroupingKind, token: TokenKind, what: &str) -> bool {
        if self.eat(token) {
            self.grouping.pop(kind);
            return true;
        }
        let opened_at = self.grouping.innermost().map(|(_, line)| line);
        let message = match opened_at {
            Some(line) => format!("expected {what} to close the delimiter opened at line {line}"),
            None => format!("expected {what}"),
        };
        self.error(DiagnosticKind::MissingDelimiter).message(message).emit();
        false
    }

    // ---- nesting context -------------------------------------------------

    pub(crate) fn push_nesting(&mut self, level: NestingLevel) {
        self.nesting.push(level);
    }

    pub(crate) fn pop_nesting(&mut self) {
        self.nesting.pop();
    }

    pub(crate) fn nesting(&self) -> &NestingStack {
        &self.nesting
    }

    // ---- AST arena convenience -------------------------------------------

    pub(crate) fn alloc(&mut self, kind: NodeKind, line: u32) -> NodeId {
        self.ast.alloc(Node::new(kind, line))
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.ast.add_child(parent, child);
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.ast.get_mut(id)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.ast.get(id)
    }

    // ---- scope management --------------------------------------------

    pub(crate) fn push_block_scope(&mut self) {
        self.variable_scopes.push_scope();
        self.type_scopes.push_scope();
    }

    pub(crate) fn pop_block_scope(&mut self) {
        self.variable_scopes.pop_scope();
        self.type_scopes.pop_scope();
    }

    // ---- function context ------------------------------------------------

    pub(crate) fn current_function(&self) -> Option<FuncId> {
        self.current_function
    }

    /// Enters a new function body: swaps in a fresh label/jump accumulator
    /// and returns the saved state so [`Self::leave_function`] can restore
    /// it. Labels are function-scoped, so nothing here nests across a
    /// function boundary (this language has no nested function defs).
    pub(crate) fn enter_function(&mut self, func_id: FuncId) -> FunctionContext {
        let previous = self.current_function.replace(func_id);
        FunctionContext {
            previous,
            saved_labels: std::mem::take(&mut self.declared_labels),
            saved_jumps: std::mem::take(&mut self.pending_jumps),
        }
    }

    /// Leaves a function body, validating every `jump` seen inside it
    /// against the labels declared inside it, then restores the enclosing
    /// function's context (always `None` in this language, but kept
    /// general rather than hard-coding the no-nesting assumption).
    pub(crate) fn leave_function(&mut self, ctx: FunctionContext) {
        for (label, _node, line) in std::mem::take(&mut self.pending_jumps) {
            if !self.declared_labels.contains(&label) {
                self.error_at(DiagnosticKind::JumpToNonexistentLabel, line).emit();
            }
        }
        self.current_function = ctx.previous;
        self.declared_labels = ctx.saved_labels;
        self.pending_jumps = ctx.saved_jumps;
    }

    pub(crate) fn declare_label(&mut self, name: Symbol) {
        self.declared_labels.push(name);
    }

    pub(crate) fn record_jump(&mut self, label: Symbol, node: NodeId, line: u32) {
        self.pending_jumps.push((label, node, line));
    }
}

/// Saved parser state swapped out across a function body, returned by
/// [`Parser::enter_function`] and consumed by [`Parser::leave_function`].
pub(crate) struct FunctionContext {
    previous: Option<FuncId>,
    saved_labels: Vec<Symbol>,
    saved_jumps: Vec<(Symbol, NodeId, u32)>,
}
