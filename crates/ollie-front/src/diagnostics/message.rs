//! Diagnostic message types and related structures.

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// The fixed catalog of conditions the analyzer can report, grouped the way
/// the error-handling section of the specification groups them. Each kind
/// carries a default message that `.emit()` uses unless the call site
/// overrides it with `.message(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticKind {
    // Lexical/structural shape.
    MissingDelimiter,
    UnmatchedDelimiter,
    UnexpectedToken,

    // Name resolution.
    UndeclaredIdentifier,
    DuplicateDeclaration,
    UseBeforeInitialization,

    // Type errors.
    IncompatibleAssignment,
    InvalidOperatorForType,
    SubWidthNarrowing,
    VoidTypeMisuse,
    ReferenceTypeMisuse,
    ImmutableTypeMutation,
    IncompleteTypeUse,

    // Control-flow validity.
    BreakOutOfContext,
    ContinueOutOfContext,
    ReturnOutOfContext,
    DeferOutOfContext,
    LabelOutOfContext,
    JumpOutOfContext,
    JumpToNonexistentLabel,
    JumpTargetNotALabel,
    JumpOutsideFunction,
    SwitchMixedDialects,
    SwitchNonExhaustive,
    SwitchUnreachableDefault,
    SwitchDuplicateCase,
    SwitchRangeTooWide,
    EnumValueCollision,

    // Compile-time constraints.
    DivisionByZero,
    ModuloByZero,
    NonConstantGlobalInitializer,
    ArrayBoundNotPositive,
    TooManyParameters,
    ArgumentCountMismatch,
    InvalidMainSignature,
    AssemblyParseFailure,
}

impl DiagnosticKind {
    pub fn default_message(self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            MissingDelimiter => "expected a closing delimiter",
            UnmatchedDelimiter => "unmatched closing delimiter",
            UnexpectedToken => "unexpected token",
            UndeclaredIdentifier => "use of undeclared identifier",
            DuplicateDeclaration => "duplicate declaration in this scope",
            UseBeforeInitialization => "variable used before it is initialized",
            IncompatibleAssignment => "incompatible types in assignment",
            InvalidOperatorForType => "operator is not valid for this type",
            SubWidthNarrowing => "assignment narrows a wider type without an explicit cast",
            VoidTypeMisuse => "void type used where a value is required",
            ReferenceTypeMisuse => "invalid use of a reference type",
            ImmutableTypeMutation => "attempt to mutate an immutable value",
            IncompleteTypeUse => "use of an incomplete type",
            BreakOutOfContext => "break used outside of a loop or switch",
            ContinueOutOfContext => "continue used outside of a loop",
            ReturnOutOfContext => "return used inside a defer block",
            DeferOutOfContext => "defer used outside of a function body",
            LabelOutOfContext => "label declared outside of a function body",
            JumpOutOfContext => "jump used outside of a function body",
            JumpToNonexistentLabel => "jump targets a label that does not exist",
            JumpTargetNotALabel => "jump target is not a label",
            JumpOutsideFunction => "jump target is not defined in the current function",
            SwitchMixedDialects => "switch mixes case-arrow and c-style case dialects",
            SwitchNonExhaustive => "switch over an enum is not exhaustive",
            SwitchUnreachableDefault => "default case is unreachable",
            SwitchDuplicateCase => "duplicate case value in switch",
            SwitchRangeTooWide => "switch case range exceeds the configured maximum",
            EnumValueCollision => "enum members collide on the same value",
            DivisionByZero => "division by zero in constant expression",
            ModuloByZero => "modulo by zero in constant expression",
            NonConstantGlobalInitializer => "global initializer is not a compile-time constant",
            ArrayBoundNotPositive => "array bound must be a positive constant",
            TooManyParameters => "function declares more parameters than allowed",
            ArgumentCountMismatch => "call supplies the wrong number of arguments",
            InvalidMainSignature => "`main` must be `pub`, return `i32`, and take `()` or `(i32, char**)`",
            AssemblyParseFailure => "could not parse inline assembly block",
        }
    }
}

/// A suggested fix for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fix {
    pub(crate) replacement: String,
    pub(crate) description: String,
}

impl Fix {
    pub fn new(replacement: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
            description: description.into(),
        }
    }
}

/// A diagnostic message with its source line, severity, and kind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub(crate) struct DiagnosticMessage {
    pub(crate) severity: Severity,
    pub(crate) kind: DiagnosticKind,
    pub(crate) line: u32,
    pub(crate) message: String,
    pub(crate) fix: Option<Fix>,
}

impl DiagnosticMessage {
    pub(crate) fn new(severity: Severity, kind: DiagnosticKind, line: u32) -> Self {
        Self {
            severity,
            kind,
            line,
            message: kind.default_message().to_owned(),
            fix: None,
        }
    }

    pub(crate) fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub(crate) fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Renders this message in the fixed external format:
    /// `[FILE: <file>] --> [LINE n | COMPILER <WARNING|ERROR|INFO>]: <message>`
    pub(crate) fn render(&self, file_name: &str) -> String {
        format!(
            "[FILE: {}] --> [LINE {} | COMPILER {}]: {}",
            file_name, self.line, self.severity, self.message
        )
    }
}
