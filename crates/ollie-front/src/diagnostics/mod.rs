//! Compiler diagnostics infrastructure.
//!
//! Diagnostics are the non-fatal reporting channel: everything a user can
//! fix by editing their source (syntax errors, type errors, control-flow
//! misuse) goes through here rather than through `crate::Error`, so the
//! front end can keep parsing after reporting a problem. `crate::Error` is
//! reserved for conditions that make continuing pointless (recursion limit,
//! rule budget, an internal invariant failing).

mod message;

#[cfg(test)]
mod tests;

pub use message::{DiagnosticKind, Severity};

use message::{DiagnosticMessage, Fix};

/// Collection of diagnostic messages from parsing and analysis.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

/// Builder for constructing a diagnostic message.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn report(&mut self, severity: Severity, kind: DiagnosticKind, line: u32) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::new(severity, kind, line),
        }
    }

    pub fn error(&mut self, kind: DiagnosticKind, line: u32) -> DiagnosticBuilder<'_> {
        self.report(Severity::Error, kind, line)
    }

    pub fn warning(&mut self, kind: DiagnosticKind, line: u32) -> DiagnosticBuilder<'_> {
        self.report(Severity::Warning, kind, line)
    }

    pub fn info(&mut self, kind: DiagnosticKind, line: u32) -> DiagnosticBuilder<'_> {
        self.report(Severity::Info, kind, line)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.is_warning())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    /// Renders every collected message in the fixed `[FILE: ...] --> [LINE n
    /// | COMPILER ...]: ...` format, one per line, in report order.
    pub fn render(&self, file_name: &str) -> String {
        self.messages
            .iter()
            .map(|m| m.render(file_name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Overrides the kind's default message with call-site-specific text.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message.message = msg.into();
        self
    }

    pub fn fix(mut self, description: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.message.fix = Some(Fix::new(replacement, description));
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}
