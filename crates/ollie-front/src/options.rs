//! Compiler configuration (ambient stack, §10): the small set of knobs the
//! front end accepts from its caller. There is no configuration file format
//! to parse; the driver that embeds this crate constructs a
//! [`CompilerOptions`] directly, the way the teacher's crates take a plain
//! options struct rather than reading their own config files.

/// Options controlling a single front-end run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompilerOptions {
    /// File name reported in diagnostics, e.g. `[FILE: main.ol]`.
    pub file_name: String,
    /// When set, the parser writes a rule-by-rule trace to stderr as it
    /// descends the grammar. There is no logging crate in this stack:
    /// diagnostics are the signal channel, and this flag gates a plain
    /// `eprintln!`-based trace for interactive debugging only.
    pub enable_debug_printing: bool,
    /// Upper bound on the numeric span a single `case` arm may cover before
    /// `SwitchRangeTooWide` fires.
    pub max_switch_range: i64,
    /// Upper bound on the number of parameters a single function signature
    /// may declare before `TooManyParameters` fires.
    pub max_function_params: usize,
}

impl CompilerOptions {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            file_name: String::from("<input>"),
            enable_debug_printing: false,
            max_switch_range: 1024,
            max_function_params: 6,
        }
    }
}

#[cfg(test)]
mod options_tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_limits() {
        let opts = CompilerOptions::default();
        assert_eq!(opts.max_switch_range, 1024);
        assert_eq!(opts.max_function_params, 6);
        assert!(!opts.enable_debug_printing);
    }

    #[test]
    fn new_sets_file_name_and_keeps_other_defaults() {
        let opts = CompilerOptions::new("main.ol");
        assert_eq!(opts.file_name, "main.ol");
        assert_eq!(opts.max_switch_range, 1024);
    }
}
