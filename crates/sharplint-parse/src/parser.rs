use sharplint_errors::{Result, SyntaxError};
use sharplint_lexer::{Definitions, Lexer, Symbol, SymbolKind, SymbolManager};
use sharplint_span::Location;
use sharplint_tree::{
    CodeUnitKind, CodeUnitTree, LexicalElementKind, NodeId, Proxy, TokenKind,
};

/// One parse of one source unit. Owns the symbol stream and the tree under
/// construction; grammar functions drive it top-down and fail fast on the
/// first error.
pub(crate) struct Parser<'t> {
    symbols: SymbolManager<'t>,
    pub(crate) tree: CodeUnitTree,
    end: Location,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(text: &'t str, definitions: &Definitions) -> Result<Self> {
        let symbols = Lexer::new(text, Location::FIRST, definitions).symbols()?;

        Ok(Self {
            symbols: SymbolManager::new(symbols),
            tree: CodeUnitTree::new(text.to_string()),
            end: Location::FIRST.advanced_by(text),
        })
    }

    pub(crate) fn into_tree(self) -> CodeUnitTree {
        self.tree
    }

    /// The n-th code symbol ahead (1-based), looking through trivia.
    pub(crate) fn peek_code(&self, n: usize) -> Option<&Symbol<'t>> {
        debug_assert!(n > 0, "peek_code is 1-based");

        let mut remaining = n;
        let mut index = 1;
        loop {
            let symbol = self.symbols.peek(index)?;
            if !symbol.kind.is_trivia() {
                remaining -= 1;
                if remaining == 0 {
                    return Some(symbol);
                }
            }
            index += 1;
        }
    }

    /// Whether the next code symbol has the given kind.
    pub(crate) fn at(&self, kind: SymbolKind) -> bool {
        self.peek_code(1).is_some_and(|symbol| symbol.kind == kind)
    }

    /// Whether the next code symbol is the given identifier or keyword.
    pub(crate) fn at_word(&self, word: &str) -> bool {
        self.peek_code(1)
            .is_some_and(|symbol| symbol.kind == SymbolKind::Other && symbol.text == word)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.peek_code(1).is_none()
    }

    /// Moves pending trivia into `proxy` as lexical-element leaves, in
    /// source order. Called before every code symbol is consumed, so trivia
    /// become children of the unit whose construction reached them first.
    pub(crate) fn attach_trivia(&mut self, proxy: &mut Proxy) {
        while self.symbols.peek(1).is_some_and(|symbol| symbol.kind.is_trivia()) {
            let symbol = self.symbols.advance();
            let kind = trivia_kind(symbol.kind);
            let leaf = self.tree.alloc_leaf(
                CodeUnitKind::LexicalElement(kind),
                symbol.range(),
                symbol.location,
                symbol.generated,
            );
            proxy.push(leaf);
        }
    }

    /// Consumes the next code symbol as a token leaf under `proxy`.
    pub(crate) fn bump(&mut self, proxy: &mut Proxy) -> Result<NodeId> {
        self.attach_trivia(proxy);
        let symbol = self.advance_code()?;
        let kind = token_kind(&symbol)?;
        Ok(self.push_token(proxy, kind, symbol))
    }

    /// Consumes the next code symbol with a caller-chosen token kind. Used
    /// where classification needs parser context, like `<` opening a
    /// generic parameter list.
    pub(crate) fn bump_as(&mut self, proxy: &mut Proxy, kind: TokenKind) -> Result<NodeId> {
        self.attach_trivia(proxy);
        let symbol = self.advance_code()?;
        Ok(self.push_token(proxy, kind, symbol))
    }

    /// Consumes the next code symbol, which must have the expected kind.
    pub(crate) fn expect(&mut self, proxy: &mut Proxy, kind: SymbolKind) -> Result<NodeId> {
        self.attach_trivia(proxy);
        match self.symbols.peek(1) {
            Some(symbol) if symbol.kind == kind => self.bump(proxy),
            Some(symbol) => Err(SyntaxError::unexpected_symbol(
                symbol.text,
                symbol.location.line_number,
                symbol.range(),
            )),
            None => Err(self.end_of_file()),
        }
    }

    /// Consumes the next code symbol, which must be the expected keyword.
    pub(crate) fn expect_word(&mut self, proxy: &mut Proxy, word: &str) -> Result<NodeId> {
        self.attach_trivia(proxy);
        match self.symbols.peek(1) {
            Some(symbol) if symbol.kind == SymbolKind::Other && symbol.text == word => {
                self.bump(proxy)
            }
            Some(symbol) => Err(SyntaxError::unexpected_symbol(
                symbol.text,
                symbol.location.line_number,
                symbol.range(),
            )),
            None => Err(self.end_of_file()),
        }
    }

    pub(crate) fn seal(&mut self, proxy: Proxy, kind: CodeUnitKind) -> NodeId {
        proxy.seal(&mut self.tree, kind)
    }

    pub(crate) fn unexpected(&self) -> SyntaxError {
        match self.peek_code(1) {
            Some(symbol) => SyntaxError::unexpected_symbol(
                symbol.text,
                symbol.location.line_number,
                symbol.range(),
            ),
            None => self.end_of_file(),
        }
    }

    pub(crate) fn end_of_file(&self) -> SyntaxError {
        SyntaxError::unexpected_end_of_file(self.end.line_number, self.end.range(0.into()))
    }

    fn advance_code(&mut self) -> Result<Symbol<'t>> {
        if self.symbols.is_at_end() {
            return Err(self.end_of_file());
        }
        Ok(self.symbols.advance())
    }

    fn push_token(&mut self, proxy: &mut Proxy, kind: TokenKind, symbol: Symbol<'t>) -> NodeId {
        let leaf = self.tree.alloc_leaf(
            CodeUnitKind::Token(kind),
            symbol.range(),
            symbol.location,
            symbol.generated,
        );
        proxy.push(leaf);
        leaf
    }
}

fn trivia_kind(kind: SymbolKind) -> LexicalElementKind {
    match kind {
        SymbolKind::WhiteSpace => LexicalElementKind::WhiteSpace,
        SymbolKind::EndOfLine => LexicalElementKind::EndOfLine,
        SymbolKind::SingleLineComment => LexicalElementKind::SingleLineComment,
        SymbolKind::MultiLineComment => LexicalElementKind::MultiLineComment,
        SymbolKind::PreprocessorDirective => LexicalElementKind::PreprocessorDirective,
        SymbolKind::SkippedSection => LexicalElementKind::SkippedSection,
        _ => unreachable!("not a trivia symbol: {kind:?}"),
    }
}

fn token_kind(symbol: &Symbol<'_>) -> Result<TokenKind> {
    let kind = match symbol.kind {
        SymbolKind::Other => keyword(symbol.text),
        SymbolKind::Number => TokenKind::Number,
        SymbolKind::String => TokenKind::String,
        SymbolKind::OpenParenthesis => TokenKind::OpenParenthesis,
        SymbolKind::CloseParenthesis => TokenKind::CloseParenthesis,
        SymbolKind::OpenCurlyBracket => TokenKind::OpenCurlyBracket,
        SymbolKind::CloseCurlyBracket => TokenKind::CloseCurlyBracket,
        SymbolKind::OpenSquareBracket => TokenKind::OpenSquareBracket,
        SymbolKind::CloseSquareBracket => TokenKind::CloseSquareBracket,
        SymbolKind::Comma => TokenKind::Comma,
        SymbolKind::Semicolon => TokenKind::Semicolon,
        SymbolKind::Colon => TokenKind::Colon,
        SymbolKind::Dot => TokenKind::Dot,
        SymbolKind::Not => TokenKind::Not,
        SymbolKind::Equals => TokenKind::Equals,
        SymbolKind::ConditionalEquals => TokenKind::ConditionalEquals,
        SymbolKind::NotEquals => TokenKind::NotEquals,
        SymbolKind::ConditionalAnd => TokenKind::ConditionalAnd,
        SymbolKind::ConditionalOr => TokenKind::ConditionalOr,
        SymbolKind::LogicalAnd => TokenKind::LogicalAnd,
        SymbolKind::LogicalOr => TokenKind::LogicalOr,
        SymbolKind::Plus => TokenKind::Plus,
        SymbolKind::Minus => TokenKind::Minus,
        SymbolKind::Multiplication => TokenKind::Multiplication,
        SymbolKind::Division => TokenKind::Division,
        SymbolKind::Mod => TokenKind::Mod,
        SymbolKind::LessThan => TokenKind::LessThan,
        SymbolKind::GreaterThan => TokenKind::GreaterThan,
        SymbolKind::LessThanOrEquals => TokenKind::LessThanOrEquals,
        SymbolKind::GreaterThanOrEquals => TokenKind::GreaterThanOrEquals,
        SymbolKind::Increment => TokenKind::Increment,
        SymbolKind::Decrement => TokenKind::Decrement,
        SymbolKind::Tilde => TokenKind::Tilde,
        SymbolKind::WhiteSpace
        | SymbolKind::EndOfLine
        | SymbolKind::SingleLineComment
        | SymbolKind::MultiLineComment
        | SymbolKind::PreprocessorDirective
        | SymbolKind::SkippedSection => unreachable!("trivia consumed as a token"),
        SymbolKind::Unknown => {
            return Err(SyntaxError::unexpected_symbol(
                symbol.text,
                symbol.location.line_number,
                symbol.range(),
            ));
        }
    };

    Ok(kind)
}

/// Maps identifier text onto keyword token kinds; everything else stays a
/// plain `Literal`.
fn keyword(text: &str) -> TokenKind {
    match text {
        "abstract" => TokenKind::Abstract,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "else" => TokenKind::Else,
        "enum" => TokenKind::Enum,
        "extern" => TokenKind::Extern,
        "false" => TokenKind::False,
        "fixed" => TokenKind::Fixed,
        "if" => TokenKind::If,
        "interface" => TokenKind::Interface,
        "internal" => TokenKind::Internal,
        "namespace" => TokenKind::Namespace,
        "new" => TokenKind::New,
        "override" => TokenKind::Override,
        "partial" => TokenKind::Partial,
        "private" => TokenKind::Private,
        "protected" => TokenKind::Protected,
        "public" => TokenKind::Public,
        "readonly" => TokenKind::Readonly,
        "return" => TokenKind::Return,
        "sealed" => TokenKind::Sealed,
        "static" => TokenKind::Static,
        "struct" => TokenKind::Struct,
        "true" => TokenKind::True,
        "unsafe" => TokenKind::Unsafe,
        "using" => TokenKind::Using,
        "virtual" => TokenKind::Virtual,
        "void" => TokenKind::Void,
        "volatile" => TokenKind::Volatile,
        "while" => TokenKind::While,
        _ => TokenKind::Literal,
    }
}
