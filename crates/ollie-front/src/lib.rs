//! `ollie-front`: the front end of the Ollie systems-language compiler — a
//! recursive-descent parser fused with inline semantic analysis. A single
//! pass over the token stream builds the AST, resolves symbols across four
//! scoped/flat tables, checks and infers types, folds constant expressions,
//! and validates control flow, rather than running separate parse/resolve/
//! typecheck passes over an intermediate tree.
//!
//! Lexing, code generation, and pretty-printing are out of scope for this
//! crate; [`parse`] consumes source text and returns [`FrontEndResults`], a
//! bundle of the AST plus every symbol/type/diagnostic table a downstream
//! backend would need.
//!
//! # Example
//!
//! ```
//! use ollie_front::{parse, CompilerOptions};
//!
//! let options = CompilerOptions::new("example.ol");
//! let results = parse(&options, "fn main() -> i32 { ret 0; }").expect("no fatal error");
//! if results.has_errors() {
//!     eprintln!("{}", results.diagnostics.render(&options.file_name));
//! }
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod ast;
pub mod callgraph;
pub mod diagnostics;
pub mod fold;
pub mod options;
mod parser;
pub mod results;
pub mod stacks;
pub mod symbols;
pub mod token;
pub mod types;

pub use diagnostics::{DiagnosticKind, Diagnostics, Severity};
pub use options::CompilerOptions;
pub use results::FrontEndResults;

/// Fatal conditions that abort parsing outright, as opposed to the non-fatal
/// [`diagnostics::Diagnostics`] channel that the front end keeps parsing
/// past. Reserved for input that makes continuing pointless rather than
/// merely invalid: pathological nesting, a runaway grammar, or an internal
/// invariant violation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Recursion nested past the parser's depth guard, at the given line.
    #[error("recursion limit exceeded at line {0}")]
    RecursionLimitExceeded(u32),

    /// The parser entered more grammar rules than its rule budget allows.
    #[error("rule budget of {0} exhausted")]
    RuleBudgetExhausted(u32),

    /// An internal invariant the parser relies on did not hold.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

/// Result type for front-end operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses and semantically analyzes a complete Ollie source file, returning
/// either a fatal [`Error`] or the full [`FrontEndResults`] (which may itself
/// carry non-fatal diagnostics reachable via [`FrontEndResults::has_errors`]).
pub fn parse(options: &CompilerOptions, source: &str) -> Result<FrontEndResults> {
    let parser = parser::Parser::new(options.clone(), source);
    parser.run()
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn parses_a_minimal_function() {
        let options = CompilerOptions::new("lib_test.ol");
        let results = parse(&options, "fn main() -> i32 { ret 0; }").expect("no fatal error");
        assert!(!results.has_errors());
        assert_eq!(results.function_table.len(), 1);
    }
}
