//! End-to-end tests driving the whole front end (lex -> parse -> resolve ->
//! typecheck -> fold) through the public [`crate::parse`] entry point, rather
//! than poking at individual grammar functions. Fixtures are small enough to
//! read as prose; each asserts on the shape of [`crate::FrontEndResults`] or
//! on the rendered diagnostics, since `Diagnostics` does not expose its
//! messages' kinds directly.

use indoc::indoc;

use crate::{parse, CompilerOptions};

fn run(source: &str) -> crate::FrontEndResults {
    let options = CompilerOptions::new("test.ol");
    parse(&options, source).expect("no fatal error in a well-formed fixture")
}

#[test]
fn minimal_function_produces_no_diagnostics() {
    let results = run("fn main() -> i32 { ret 0; }");
    assert!(!results.has_errors());
    assert_eq!(results.function_table.len(), 1);
    assert_eq!(results.ast.get(results.root).children.len(), 1);
}

#[test]
fn expression_precedence_and_constant_folding() {
    let results = run(indoc! {"
        fn main() -> i32 {
            let x: i32 = 2 + 3 * 4;
            ret x;
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn struct_union_enum_and_alias_declarations() {
    let results = run(indoc! {"
        struct Point { x: i32; y: i32; }
        union Slot { as_int: i32; as_float: f32; }
        enum Color { Red, Green, Blue }
        define Meters as i32;

        fn main() -> i32 {
            declare p: Point;
            declare c: Color = Red;
            ret 0;
        }
    "});
    // Enum members resolve as plain identifiers declared into the global
    // scope (there is no `Color::Red`-style qualified path syntax), so this
    // whole fixture parses clean.
    assert!(!results.has_errors());
    assert_eq!(results.function_table.len(), 1);
    assert!(results.type_registry.type_count() > 26);
}

#[test]
fn duplicate_function_declaration_is_flagged() {
    let results = run(indoc! {"
        fn twice(x: i32) -> i32 { ret x * 2; }
        fn twice(x: i32) -> i32 { ret x; }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("already declared"));
}

#[test]
fn if_else_if_else_chain_parses_as_sibling_chain() {
    let results = run(indoc! {"
        fn classify(n: i32) -> i32 {
            if (n < 0) {
                ret -1;
            } else if (n == 0) {
                ret 0;
            } else {
                ret 1;
            }
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn for_while_and_do_while_loops() {
    let results = run(indoc! {"
        fn sums() -> i32 {
            declare total: i32 = 0;
            for (declare i: i32 = 0; i < 10; i += 1) {
                total += i;
            }
            while (total > 100) {
                total -= 1;
            }
            do {
                total += 1;
            } while (total < 5);
            ret total;
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn arrow_dialect_switch_is_exhaustive_over_an_enum() {
    let results = run(indoc! {"
        enum Light { Red, Yellow, Green }

        fn describe(l: Light) -> i32 {
            switch on l {
                case Red => ret 0;
                case Yellow => ret 1;
                case Green => ret 2;
            }
            ret -1;
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn non_exhaustive_enum_switch_without_default_is_flagged() {
    let results = run(indoc! {"
        enum Light { Red, Yellow, Green }

        fn describe(l: Light) -> i32 {
            switch on l {
                case Red => ret 0;
                case Yellow => ret 1;
            }
            ret -1;
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("not exhaustive"));
}

#[test]
fn unreachable_default_on_a_fully_covered_enum_switch_warns() {
    let results = run(indoc! {"
        enum Light { Red, Green }

        fn describe(l: Light) -> i32 {
            switch on l {
                case Red => ret 0;
                case Green => ret 1;
                default => ret -1;
            }
        }
    "});
    assert!(results.has_warnings());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("unreachable"));
}

#[test]
fn mixing_arrow_and_c_style_dialects_is_flagged() {
    let results = run(indoc! {"
        fn describe(n: i32) -> i32 {
            switch (n) {
                case 0 => ret 0;
                case 1: ret 1;
                default: ret -1;
            }
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("mixes case-arrow"));
}

#[test]
fn duplicate_case_value_is_flagged() {
    let results = run(indoc! {"
        fn describe(n: i32) -> i32 {
            switch (n) {
                case 0: ret 0;
                case 0: ret 1;
                default: ret -1;
            }
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("duplicate case value"));
}

#[test]
fn when_guard_on_a_case_arm_is_parsed_and_type_checked() {
    let results = run(indoc! {"
        fn classify(n: i32) -> i32 {
            switch (n) {
                case 0 when n < 0: ret -1;
                default: ret 0;
            }
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn break_and_continue_are_valid_inside_a_loop() {
    let results = run(indoc! {"
        fn scan() -> i32 {
            declare i: i32 = 0;
            while (i < 10) {
                i += 1;
                if (i == 3) {
                    continue;
                }
                if (i == 7) {
                    break;
                }
            }
            ret i;
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn break_outside_a_loop_or_switch_is_flagged() {
    let results = run(indoc! {"
        fn bad() -> i32 {
            if (1) {
                break;
            }
            ret 0;
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("outside of a loop or switch"));
}

#[test]
fn continue_reaches_through_a_switch_into_the_enclosing_loop() {
    // `continue` targets the nearest loop even through an intervening
    // `switch`, unlike `break`, which the switch would intercept.
    let results = run(indoc! {"
        fn scan(n: i32) -> i32 {
            declare i: i32 = 0;
            while (i < 10) {
                switch (n) {
                    case 0: continue;
                    default: i += 1;
                }
                i += 1;
            }
            ret i;
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn continue_outside_any_loop_is_flagged_even_inside_a_switch() {
    let results = run(indoc! {"
        fn bad(n: i32) -> i32 {
            switch (n) {
                case 0: continue;
                default: ret 0;
            }
            ret 0;
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("outside of a loop"));
}

#[test]
fn return_inside_defer_is_flagged() {
    let results = run(indoc! {"
        fn bad() -> i32 {
            defer {
                ret 1;
            }
            ret 0;
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("defer"));
}

#[test]
fn jump_to_a_declared_label_is_valid() {
    let results = run(indoc! {"
        fn loopy() -> i32 {
            declare i: i32 = 0;
            #top:
            i += 1;
            if (i < 3) {
                jump #top;
            }
            ret i;
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn jump_to_an_undeclared_label_is_flagged() {
    let results = run(indoc! {"
        fn bad() -> i32 {
            jump #nowhere;
            ret 0;
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("does not exist"));
}

#[test]
fn idle_and_asm_statements_parse() {
    let results = run(indoc! {r#"
        fn spin() -> i32 {
            idle;
            #asm {
                nop
            };
            ret 0;
        }
    "#});
    assert!(!results.has_errors());
}

#[test]
fn local_static_requires_a_constant_initializer() {
    let results = run(indoc! {"
        fn bad(n: i32) -> i32 {
            static total: i32 = n;
            ret total;
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("compile-time constant"));
}

#[test]
fn local_let_does_not_require_a_constant_initializer() {
    let results = run(indoc! {"
        fn ok(n: i32) -> i32 {
            let total: i32 = n + 1;
            ret total;
        }
    "});
    assert!(!results.has_errors());
}

#[test]
fn dependencies_and_replace_directives_parse() {
    let results = run(indoc! {r#"
        #dependencies {
            require "std/io";
            require "std/mem";
        }
        #replace "old/path" with "new/path";

        fn main() -> i32 { ret 0; }
    "#});
    assert!(!results.has_errors());
    let root_children = &results.ast.get(results.root).children;
    // Two `require` entries plus one `#replace` plus the `fn main` decl.
    assert_eq!(root_children.len(), 4);
}

#[test]
fn returning_the_wrong_type_is_flagged() {
    let results = run(indoc! {"
        fn bad() -> i32 {
            ret 3.14;
        }
    "});
    assert!(results.has_errors());
}

#[test]
fn missing_return_value_on_a_non_void_function_is_flagged() {
    let results = run(indoc! {"
        fn bad() -> i32 {
            ret;
        }
    "});
    assert!(results.has_errors());
    assert!(results
        .diagnostics
        .render("test.ol")
        .contains("missing return value"));
}

#[test]
fn too_many_parameters_is_flagged() {
    let results = run(indoc! {"
        fn many(a: i32, b: i32, c: i32, d: i32, e: i32, f: i32, g: i32) -> i32 {
            ret a;
        }
    "});
    assert!(results.has_errors());
}

#[test]
fn call_graph_records_a_direct_call() {
    let results = run(indoc! {"
        fn helper() -> i32 { ret 1; }
        fn main() -> i32 { ret helper(); }
    "});
    assert!(!results.has_errors());
    // The synthetic `os` root plus the two declared functions.
    assert_eq!(results.call_graph.node_count(), 3);
}
