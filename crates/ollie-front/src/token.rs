//! Lexical tokens and the token source adapter (component A).
//!
//! The lexer itself is an external collaborator: the parser only needs a
//! `Vec<Token>` with one-token pushback, a rewind point for the occasional
//! two-pass parse, and a way to slurp a raw assembly block. `lex` below is a
//! small `logos`-based implementation good enough to drive that adapter and
//! to make the crate testable end to end; the token *shapes* it produces are
//! the part that matters to the parser, not its own internals.

use logos::Logos;

/// Token kinds the parser recognizes, matching the abridged token list in
/// the external-interfaces section of the specification.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum TokenKind {
    // Primitive type keywords.
    #[token("void")]
    Void,
    #[token("u8")]
    U8,
    #[token("i8")]
    I8,
    #[token("u16")]
    U16,
    #[token("i16")]
    I16,
    #[token("u32")]
    U32,
    #[token("i32")]
    I32,
    #[token("u64")]
    U64,
    #[token("i64")]
    I64,
    #[token("f32")]
    F32,
    #[token("f64")]
    F64,
    #[token("char")]
    Char,
    #[token("bool")]
    Bool,

    // Composite-type keywords.
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,
    #[token("fn")]
    Fn,

    // Declaration keywords.
    #[token("declare")]
    Declare,
    #[token("let")]
    Let,
    #[token("mut")]
    Mut,
    #[token("static")]
    Static,
    #[token("pub")]
    Pub,
    #[token("define")]
    Define,
    #[token("alias")]
    Alias,
    #[token("as")]
    As,

    // Control-flow keywords.
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("switch")]
    Switch,
    #[token("on")]
    On,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("jump")]
    Jump,
    #[token("when")]
    When,
    #[token("ret")]
    Ret,
    #[token("defer")]
    Defer,
    #[token("idle")]
    Idle,

    // Directives.
    #[token("#dependencies")]
    Dependencies,
    #[token("#replace")]
    Replace,
    #[token("with")]
    With,
    #[token("require")]
    Require,
    #[token("#asm")]
    AsmDirective,

    // Identifiers and labels.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    LabelName,

    // Constants, most specific suffix pattern first so `logos` prefers the
    // longer match over the bare `Int` fallback.
    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexConst,
    #[regex(r"[0-9]+\.[0-9]+[fF]")]
    FloatConst,
    #[regex(r"[0-9]+\.[0-9]+")]
    DoubleConst,
    #[regex(r"[0-9]+([uU][lL]|[lL][uU])")]
    LongConstForceU,
    #[regex(r"[0-9]+[lL]")]
    LongConst,
    #[regex(r"[0-9]+[uU]")]
    IntConstForceU,
    #[regex(r"[0-9]+[sS]")]
    ShortConst,
    #[regex(r"[0-9]+[bB]")]
    ByteConst,
    #[regex(r"[0-9]+")]
    IntConst,
    #[regex(r"'([^'\\]|\\.)'")]
    CharConst,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StrConst,
    #[token("true")]
    TrueConst,
    #[token("false")]
    FalseConst,

    // Operators.
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token(":=")]
    ColonEq,

    // Accessors.
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token("=>")]
    FatArrow,
    #[token("->")]
    Arrow,

    // Structural punctuation.
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("?")]
    Question,
    #[token("@")]
    At,
    #[token("#")]
    Hash,

    /// Produced by the lexer on malformed input; fatal at top level.
    Error,
    /// Sentinel end-of-stream token returned past the last real token.
    Done,
}

impl TokenKind {
    /// Whether this token is one of the (narrow) primitive type keywords.
    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::U8
                | TokenKind::I8
                | TokenKind::U16
                | TokenKind::I16
                | TokenKind::U32
                | TokenKind::I32
                | TokenKind::U64
                | TokenKind::I64
                | TokenKind::F32
                | TokenKind::F64
                | TokenKind::Char
                | TokenKind::Bool
        )
    }

    /// Whether this token can start a cast or type specifier.
    pub fn starts_type(self) -> bool {
        self.is_primitive_type() || matches!(self, TokenKind::Ident)
    }

    pub fn is_constant(self) -> bool {
        matches!(
            self,
            TokenKind::IntConst
                | TokenKind::IntConstForceU
                | TokenKind::LongConst
                | TokenKind::LongConstForceU
                | TokenKind::ShortConst
                | TokenKind::ByteConst
                | TokenKind::CharConst
                | TokenKind::StrConst
                | TokenKind::HexConst
                | TokenKind::FloatConst
                | TokenKind::DoubleConst
                | TokenKind::TrueConst
                | TokenKind::FalseConst
        )
    }
}

/// A single lexical item: kind, owned lexeme text, and source line.
///
/// The parser never re-slices the source, so unlike a zero-copy span-based
/// lexer the lexeme is carried on the token itself; this matches the
/// `LexItem { tok, lexeme, line_num }` shape the front end is specified to
/// consume from its lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn done(line: u32) -> Self {
        Self {
            kind: TokenKind::Done,
            lexeme: String::new(),
            line,
        }
    }
}

/// Tokenizes source text into a flat vector of [`Token`]s, terminated by a
/// sentinel `Done` token. Lexer errors become `Error` tokens rather than
/// aborting the whole lex; the parser treats `Error` as fatal wherever it is
/// encountered, per the external-interfaces section.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut line: u32 = 1;
    let mut last_end = 0usize;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[last_end..span.start].matches('\n').count() as u32;
        last_end = span.start;

        let kind = result.unwrap_or(TokenKind::Error);
        tokens.push(Token {
            kind,
            lexeme: source[span].to_owned(),
            line,
        });
    }

    line += source[last_end..].matches('\n').count() as u32;
    tokens.push(Token::done(line));
    tokens
}

/// Wraps the token vector with one-token pushback, a rewind mark, and a raw
/// assembly-line reader, matching the "token source adapter" component.
#[derive(Debug)]
pub struct TokenSource {
    tokens: Vec<Token>,
    pos: usize,
    pushback: Option<Token>,
}

impl TokenSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            pushback: None,
        }
    }

    /// Returns the next token, consuming it. Past the end of the stream this
    /// keeps returning the sentinel `Done` token.
    pub fn next(&mut self) -> Token {
        if let Some(tok) = self.pushback.take() {
            return tok;
        }
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::done(self.current_line()));
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Pushes a single token back onto the front of the stream. A
    /// depth-1 buffer is sufficient: the grammar never needs to push back
    /// twice before consuming again.
    pub fn pushback(&mut self, item: Token) {
        debug_assert!(self.pushback.is_none(), "pushback buffer already full");
        self.pushback = Some(item);
    }

    /// Non-consuming lookahead at the given distance (0 = next token).
    pub fn peek_nth(&self, n: usize) -> &Token {
        if n == 0 {
            if let Some(tok) = &self.pushback {
                return tok;
            }
        }
        let offset = if self.pushback.is_some() { n - 1 } else { n };
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().expect("token stream has a Done sentinel"))
    }

    pub fn current_line(&self) -> u32 {
        self.peek_nth(0).line
    }

    /// Saves a position that can later be restored with [`Self::reset_to`].
    ///
    /// This replaces the C original's byte-position file seek
    /// (`reconsume_tokens`/`GET_CURRENT_FILE_POSITION`): since the whole
    /// token stream already lives in memory, rewinding is just resetting an
    /// index, and the pushback buffer is always empty at a mark point by
    /// construction (callers mark only between tokens).
    pub fn mark(&self) -> usize {
        debug_assert!(self.pushback.is_none(), "mark requested mid-pushback");
        self.pos
    }

    pub fn reset_to(&mut self, mark: usize) {
        self.pos = mark;
        self.pushback = None;
    }

    /// Reads raw token text until (and including) the matching closing
    /// brace, concatenating lexemes with a single space. Used for `#asm { ... };`
    /// blocks, which are captured but never analyzed.
    pub fn slurp_assembly_block(&mut self) -> String {
        let mut text = String::new();
        let mut depth = 1u32;
        loop {
            let tok = self.next();
            match tok.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Done => break,
                _ => {}
            }
            if depth > 0 {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&tok.lexeme);
            }
        }
        text
    }
}
