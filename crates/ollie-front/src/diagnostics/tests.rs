use super::*;

#[test]
fn emit_records_default_message() {
    let mut diags = Diagnostics::new();
    diags.error(DiagnosticKind::UndeclaredIdentifier, 3).emit();
    assert_eq!(diags.len(), 1);
    assert!(diags.has_errors());
    assert!(!diags.has_warnings());
}

#[test]
fn message_override_replaces_default() {
    let mut diags = Diagnostics::new();
    diags
        .error(DiagnosticKind::UndeclaredIdentifier, 1)
        .message("`foo` is not declared in this scope")
        .emit();
    let rendered = diags.render("main.ol");
    assert!(rendered.contains("`foo` is not declared in this scope"));
}

#[test]
fn render_matches_fixed_external_format() {
    let mut diags = Diagnostics::new();
    diags.warning(DiagnosticKind::SwitchUnreachableDefault, 42).emit();
    let rendered = diags.render("main.ol");
    assert_eq!(
        rendered,
        "[FILE: main.ol] --> [LINE 42 | COMPILER WARNING]: default case is unreachable"
    );
}

#[test]
fn info_severity_renders_uppercase() {
    let mut diags = Diagnostics::new();
    diags.info(DiagnosticKind::MissingDelimiter, 7).emit();
    let rendered = diags.render("a.ol");
    assert!(rendered.contains("COMPILER INFO"));
}

#[test]
fn extend_preserves_order() {
    let mut first = Diagnostics::new();
    first.error(DiagnosticKind::DivisionByZero, 1).emit();
    let mut second = Diagnostics::new();
    second.warning(DiagnosticKind::ModuloByZero, 2).emit();
    first.extend(second);
    assert_eq!(first.len(), 2);
    assert_eq!(first.error_count(), 1);
    assert_eq!(first.warning_count(), 1);
}
