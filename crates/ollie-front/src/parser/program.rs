//! Top-level program parsing (component J entry point): the leading
//! `#dependencies { ... }` / `#replace "a" with "b";` directives, then the
//! sequence of top-level declarations that make up the rest of the file.

use crate::ast::{NodeId, NodeKind};
use crate::stacks::GroupingKind;
use crate::token::TokenKind;

use super::Parser;

pub(crate) fn parse_program(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    let root = p.alloc(NodeKind::Program, line);

    while p.at(TokenKind::Dependencies) || p.at(TokenKind::Replace) {
        if p.at(TokenKind::Dependencies) {
            for dep in parse_dependencies(p) {
                p.add_child(root, dep);
            }
        } else {
            let r = parse_replace(p);
            p.add_child(root, r);
        }
    }

    while !p.at_eof() && !p.has_fatal_error() {
        if let Some(decl) = super::decl::parse_top_level_decl(p) {
            p.add_child(root, decl);
        }
    }
    root
}

/// `#dependencies { require "path"; require "other/path"; }`
fn parse_dependencies(p: &mut Parser) -> Vec<NodeId> {
    let mut deps = Vec::new();
    p.bump(); // `#dependencies`
    p.expect(TokenKind::LBrace, "`{`");
    p.push_delimiter(GroupingKind::Brace);
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        let line = p.current_line();
        p.expect(TokenKind::Require, "`require`");
        let text = p.current().lexeme.clone();
        p.expect(TokenKind::StrConst, "a dependency path string");
        p.expect(TokenKind::Semicolon, "`;`");
        let path = text.trim_matches('"').to_owned();
        deps.push(p.alloc(NodeKind::Dependencies { path }, line));
    }
    p.expect_close(GroupingKind::Brace, TokenKind::RBrace, "`}`");
    deps
}

/// `#replace "original/path" with "replacement/path";`
fn parse_replace(p: &mut Parser) -> NodeId {
    let line = p.current_line();
    p.bump(); // `#replace`
    let original_text = p.current().lexeme.clone();
    p.expect(TokenKind::StrConst, "a replaced path string");
    p.expect(TokenKind::With, "`with`");
    let replacement_text = p.current().lexeme.clone();
    p.expect(TokenKind::StrConst, "a replacement path string");
    p.expect(TokenKind::Semicolon, "`;`");
    p.alloc(
        NodeKind::ReplaceWith {
            original: original_text.trim_matches('"').to_owned(),
            replacement: replacement_text.trim_matches('"').to_owned(),
        },
        line,
    )
}
