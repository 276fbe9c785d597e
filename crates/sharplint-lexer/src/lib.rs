//! Symbol stream for the analyzed language.
//!
//! The lexer turns raw text into a flat, classified symbol sequence that
//! reproduces the input byte-for-byte when concatenated. Conditional
//! compilation is resolved here: inactive branches collapse into single
//! `SkippedSection` symbols, and `#region` blocks marked as generated stamp
//! the symbols they contain.

mod cursor;
mod manager;
pub mod preprocessor;

use cursor::{Cursor, EOF_CHAR};
pub use manager::SymbolManager;
use rustc_hash::FxHashSet;
use sharplint_errors::{Result, SyntaxError};
use sharplint_span::{Location, TextLen, TextSize};

/// Preprocessor symbols considered defined for this parse.
pub type Definitions = FxHashSet<String>;

/// Classification of one lexical unit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SymbolKind {
    /// An identifier or keyword.
    Other,
    Number,
    String,

    OpenParenthesis,
    CloseParenthesis,
    OpenCurlyBracket,
    CloseCurlyBracket,
    OpenSquareBracket,
    CloseSquareBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    Not,
    Equals,
    ConditionalEquals,
    NotEquals,
    ConditionalAnd,
    ConditionalOr,
    LogicalAnd,
    LogicalOr,
    Plus,
    Minus,
    Multiplication,
    Division,
    Mod,
    LessThan,
    GreaterThan,
    LessThanOrEquals,
    GreaterThanOrEquals,
    Increment,
    Decrement,
    Tilde,

    WhiteSpace,
    EndOfLine,
    SingleLineComment,
    MultiLineComment,
    /// A whole `#...` directive line, excluding the line break.
    PreprocessorDirective,
    /// A region excluded by conditional compilation, kept as one opaque unit.
    SkippedSection,

    Unknown,
}

impl SymbolKind {
    /// Whitespace, line breaks, comments, directives and skipped sections.
    /// These never start a code construct but stay in the tree for fidelity.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WhiteSpace
                | Self::EndOfLine
                | Self::SingleLineComment
                | Self::MultiLineComment
                | Self::PreprocessorDirective
                | Self::SkippedSection
        )
    }
}

/// One classified lexical unit. Immutable once produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Symbol<'t> {
    pub kind: SymbolKind,
    pub text: &'t str,
    pub location: Location,
    /// True when the symbol lies inside a generated-code region.
    pub generated: bool,
}

impl Symbol<'_> {
    pub fn range(&self) -> sharplint_span::TextRange {
        self.location.range(self.text.text_len())
    }
}

struct Conditional {
    taken: bool,
    seen_else: bool,
}

/// Converts a text buffer into the complete ordered symbol sequence.
///
/// One lexer instance serves one source unit. `base` gives the location of
/// the buffer's first character, so sub-lexing a directive body still
/// reports whole-file coordinates.
pub struct Lexer<'t> {
    text: &'t str,
    cursor: Cursor<'t>,
    location: Location,
    consumed: usize,
    line_has_code: bool,
    definitions: Definitions,
    conditionals: Vec<Conditional>,
    regions: Vec<bool>,
}

impl<'t> Lexer<'t> {
    pub fn new(text: &'t str, base: Location, definitions: &Definitions) -> Self {
        Self {
            text,
            cursor: Cursor::new(text),
            location: base,
            consumed: 0,
            line_has_code: false,
            definitions: definitions.clone(),
            conditionals: Vec::new(),
            regions: Vec::new(),
        }
    }

    /// Produces the full symbol sequence for the buffer.
    pub fn symbols(mut self) -> Result<Vec<Symbol<'t>>> {
        let mut out = Vec::new();

        while !self.cursor.is_eof() {
            self.next_symbol(&mut out)?;
        }

        if !self.conditionals.is_empty() {
            return Err(SyntaxError::new(
                "missing `#endif` for conditional compilation directive",
                self.location.line_number,
                self.location.range(TextSize::new(0)),
            ));
        }

        if !self.regions.is_empty() {
            return Err(SyntaxError::new(
                "missing `#endregion`",
                self.location.line_number,
                self.location.range(TextSize::new(0)),
            ));
        }

        Ok(out)
    }

    fn generated(&self) -> bool {
        self.regions.iter().any(|generated| *generated)
    }

    /// Closes off the characters consumed since the previous symbol.
    fn finish_symbol(&mut self, kind: SymbolKind) -> Symbol<'t> {
        let len = usize::from(self.cursor.pos_within_token());
        let text = &self.text[self.consumed..self.consumed + len];
        let location = self.location;

        self.consumed += len;
        self.location = self.location.advanced_by(text);
        self.cursor.reset_pos_within_token();

        Symbol { kind, text, location, generated: self.generated() }
    }

    fn next_symbol(&mut self, out: &mut Vec<Symbol<'t>>) -> Result<()> {
        let kind = match self.cursor.peek() {
            '\n' => {
                self.cursor.advance();
                self.line_has_code = false;
                let symbol = self.finish_symbol(SymbolKind::EndOfLine);
                out.push(symbol);
                return Ok(());
            }
            '\r' => {
                self.cursor.advance();
                if self.cursor.peek() == '\n' {
                    self.cursor.advance();
                }
                self.line_has_code = false;
                let symbol = self.finish_symbol(SymbolKind::EndOfLine);
                out.push(symbol);
                return Ok(());
            }
            c if c.is_whitespace() => {
                self.cursor.advance_while(|c| c.is_whitespace() && c != '\n' && c != '\r');
                let symbol = self.finish_symbol(SymbolKind::WhiteSpace);
                out.push(symbol);
                return Ok(());
            }
            '/' if self.cursor.second() == '/' => {
                self.cursor.advance_while(|c| c != '\n' && c != '\r');
                SymbolKind::SingleLineComment
            }
            '/' if self.cursor.second() == '*' => {
                self.multi_line_comment();
                SymbolKind::MultiLineComment
            }
            '#' if !self.line_has_code => {
                self.cursor.advance_while(|c| c != '\n' && c != '\r');
                self.line_has_code = true;
                let symbol = self.finish_symbol(SymbolKind::PreprocessorDirective);
                out.push(symbol);
                return self.handle_directive(symbol, out);
            }
            '"' => {
                self.cursor.advance();
                self.string_literal('"', false);
                SymbolKind::String
            }
            '@' if self.cursor.second() == '"' => {
                self.cursor.advance();
                self.cursor.advance();
                self.string_literal('"', true);
                SymbolKind::String
            }
            '\'' => {
                self.cursor.advance();
                self.string_literal('\'', false);
                SymbolKind::String
            }
            c @ '0'..='9' => {
                self.cursor.advance();
                self.number(c);
                SymbolKind::Number
            }
            c if is_identifier_start(c) => {
                self.cursor.advance();
                self.cursor.advance_while(|c| c.is_alphanumeric() || c == '_');
                SymbolKind::Other
            }
            _ => self.operator_or_punctuation(),
        };

        self.line_has_code = true;
        let symbol = self.finish_symbol(kind);
        out.push(symbol);
        Ok(())
    }

    fn multi_line_comment(&mut self) {
        self.cursor.advance();
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                EOF_CHAR => break,
                '*' if self.cursor.second() == '/' => {
                    self.cursor.advance();
                    self.cursor.advance();
                    break;
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn string_literal(&mut self, quote: char, verbatim: bool) {
        loop {
            match self.cursor.peek() {
                EOF_CHAR => break,
                '\n' | '\r' if !verbatim => break,
                '\\' if !verbatim => {
                    self.cursor.advance();
                    if self.cursor.peek() != EOF_CHAR {
                        self.cursor.advance();
                    }
                }
                c if c == quote => {
                    self.cursor.advance();
                    // A doubled quote is the verbatim escape for the quote.
                    if verbatim && self.cursor.peek() == quote {
                        self.cursor.advance();
                        continue;
                    }
                    break;
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn number(&mut self, first: char) {
        if first == '0' && matches!(self.cursor.peek(), 'x' | 'X' | 'b' | 'B') {
            self.cursor.advance();
            self.cursor.advance_while(|c| c.is_ascii_hexdigit() || c == '_');
            return;
        }

        self.digits();

        if self.cursor.peek() == '.' && self.cursor.second().is_ascii_digit() {
            self.cursor.advance();
            self.digits();
        }

        if matches!(self.cursor.peek(), 'e' | 'E') {
            self.cursor.advance();
            if matches!(self.cursor.peek(), '+' | '-') {
                self.cursor.advance();
            }
            self.digits();
        }

        // Type suffixes like 1u, 2L, 0.5f.
        self.cursor.advance_while(|c| matches!(c, 'u' | 'U' | 'l' | 'L' | 'f' | 'F' | 'd' | 'D' | 'm' | 'M'));
    }

    fn digits(&mut self) {
        self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
    }

    fn operator_or_punctuation(&mut self) -> SymbolKind {
        use SymbolKind::*;

        match self.cursor.advance() {
            '(' => OpenParenthesis,
            ')' => CloseParenthesis,
            '{' => OpenCurlyBracket,
            '}' => CloseCurlyBracket,
            '[' => OpenSquareBracket,
            ']' => CloseSquareBracket,
            ',' => Comma,
            ';' => Semicolon,
            ':' => Colon,
            '.' => Dot,
            '~' => Tilde,
            '=' => self.with_equals(ConditionalEquals, Equals),
            '!' => self.with_equals(NotEquals, Not),
            '<' => self.with_equals(LessThanOrEquals, LessThan),
            '>' => self.with_equals(GreaterThanOrEquals, GreaterThan),
            '&' => self.doubled('&', ConditionalAnd, LogicalAnd),
            '|' => self.doubled('|', ConditionalOr, LogicalOr),
            '+' => self.doubled('+', Increment, Plus),
            '-' => self.doubled('-', Decrement, Minus),
            '*' => Multiplication,
            '/' => Division,
            '%' => Mod,
            _ => Unknown,
        }
    }

    fn with_equals(&mut self, doubled: SymbolKind, single: SymbolKind) -> SymbolKind {
        if self.cursor.peek() == '=' {
            self.cursor.advance();
            doubled
        } else {
            single
        }
    }

    fn doubled(&mut self, next: char, doubled: SymbolKind, single: SymbolKind) -> SymbolKind {
        if self.cursor.peek() == next {
            self.cursor.advance();
            doubled
        } else {
            single
        }
    }

    fn handle_directive(&mut self, directive: Symbol<'t>, out: &mut Vec<Symbol<'t>>) -> Result<()> {
        let line = directive.location.line_number;
        let range = directive.range();

        let content = directive.text[1..].trim_start();
        let word_len = content.chars().take_while(char::is_ascii_alphabetic).count();
        let (word, body) = content.split_at(word_len);

        match word {
            "define" => {
                let name = body.trim();
                if !name.is_empty() {
                    self.definitions.insert(name.to_string());
                }
            }
            "undef" => {
                self.definitions.remove(body.trim());
            }
            "region" => {
                self.regions.push(body.to_lowercase().contains("generated"));
            }
            "endregion" => {
                if self.regions.pop().is_none() {
                    return Err(SyntaxError::new("`#endregion` without `#region`", line, range));
                }
            }
            "if" => {
                let expression = self.directive_expression(&directive, body)?.ok_or_else(|| {
                    SyntaxError::new("expected a conditional compilation expression", line, range)
                })?;

                let live = expression.evaluate(&self.definitions);
                self.conditionals.push(Conditional { taken: live, seen_else: false });
                if !live {
                    self.skip_section(line, out)?;
                }
            }
            "elif" => {
                let Some(conditional) = self.conditionals.last() else {
                    return Err(SyntaxError::new("`#elif` without `#if`", line, range));
                };
                if conditional.seen_else {
                    return Err(SyntaxError::new("`#elif` after `#else`", line, range));
                }

                if conditional.taken {
                    self.skip_section(line, out)?;
                } else {
                    let expression =
                        self.directive_expression(&directive, body)?.ok_or_else(|| {
                            SyntaxError::new(
                                "expected a conditional compilation expression",
                                line,
                                range,
                            )
                        })?;

                    if expression.evaluate(&self.definitions) {
                        if let Some(conditional) = self.conditionals.last_mut() {
                            conditional.taken = true;
                        }
                    } else {
                        self.skip_section(line, out)?;
                    }
                }
            }
            "else" => {
                let Some(conditional) = self.conditionals.last_mut() else {
                    return Err(SyntaxError::new("`#else` without `#if`", line, range));
                };
                if conditional.seen_else {
                    return Err(SyntaxError::new("duplicate `#else`", line, range));
                }

                conditional.seen_else = true;
                let taken = conditional.taken;
                conditional.taken = true;
                if taken {
                    self.skip_section(line, out)?;
                }
            }
            "endif" => {
                if self.conditionals.pop().is_none() {
                    return Err(SyntaxError::new("`#endif` without `#if`", line, range));
                }
            }
            // #pragma, #warning, #line and friends pass through as plain
            // directive symbols.
            _ => {}
        }

        Ok(())
    }

    /// Parses the expression body of a conditional directive, with locations
    /// mapped back into the whole file.
    fn directive_expression(
        &self,
        directive: &Symbol<'t>,
        body: &'t str,
    ) -> Result<Option<preprocessor::PreprocessorExpression>> {
        let prefix = directive.text.len() - body.len();
        let base = Location::new(
            directive.location.index + TextSize::new(prefix as u32),
            directive.location.index_on_line + directive.text[..prefix].chars().count() as u32,
            directive.location.line_number,
        );

        preprocessor::parse_directive_body(body.trim_end(), base)
    }

    /// Consumes an inactive conditional branch as one `SkippedSection`,
    /// stopping at the start of the line holding the matching `#elif`,
    /// `#else` or `#endif`.
    fn skip_section(&mut self, controlling_line: u32, out: &mut Vec<Symbol<'t>>) -> Result<()> {
        let rest = self.cursor.remaining();
        let mut depth = 0usize;
        let mut pos = match rest.find('\n') {
            Some(i) => i + 1,
            None => rest.len(),
        };

        let stop = loop {
            if pos >= rest.len() {
                return Err(SyntaxError::new(
                    "missing `#endif` for conditional compilation directive",
                    controlling_line,
                    self.location.range(TextSize::new(0)),
                ));
            }

            let line_end = rest[pos..].find('\n').map_or(rest.len(), |i| pos + i + 1);
            match directive_word(&rest[pos..line_end]) {
                Some("if") => depth += 1,
                Some("endif") => {
                    if depth == 0 {
                        break pos;
                    }
                    depth -= 1;
                }
                Some("elif" | "else") if depth == 0 => break pos,
                _ => {}
            }
            pos = line_end;
        };

        self.cursor.advance_bytes(stop);
        self.line_has_code = false;

        if stop > 0 {
            let symbol = self.finish_symbol(SymbolKind::SkippedSection);
            out.push(symbol);
        }

        Ok(())
    }
}

/// The directive name of a line, if its first code character is `#`.
fn directive_word(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let content = trimmed.strip_prefix('#')?.trim_start();
    let word_len = content.chars().take_while(char::is_ascii_alphabetic).count();
    (word_len > 0).then(|| &content[..word_len])
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '@'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Vec<Symbol<'_>> {
        Lexer::new(text, Location::FIRST, &Definitions::default()).symbols().unwrap()
    }

    fn lex_with<'t>(text: &'t str, defined: &[&str]) -> Vec<Symbol<'t>> {
        let definitions = defined.iter().map(|name| (*name).to_string()).collect();
        Lexer::new(text, Location::FIRST, &definitions).symbols().unwrap()
    }

    fn kinds(symbols: &[Symbol<'_>]) -> Vec<SymbolKind> {
        symbols.iter().map(|symbol| symbol.kind).collect()
    }

    #[test]
    fn classifies_code_line() {
        use SymbolKind::*;

        let symbols = lex("public class C { }");
        assert_eq!(
            kinds(&symbols),
            vec![
                Other,
                WhiteSpace,
                Other,
                WhiteSpace,
                Other,
                WhiteSpace,
                OpenCurlyBracket,
                WhiteSpace,
                CloseCurlyBracket,
            ]
        );
        assert_eq!(symbols[0].text, "public");
        assert_eq!(symbols[4].text, "C");
    }

    #[test]
    fn longest_match_operators() {
        use SymbolKind::*;

        let symbols = lex("a==b!=c&&d||e&f");
        assert_eq!(
            kinds(&symbols),
            vec![
                Other,
                ConditionalEquals,
                Other,
                NotEquals,
                Other,
                ConditionalAnd,
                Other,
                ConditionalOr,
                Other,
                LogicalAnd,
                Other,
            ]
        );
    }

    #[test]
    fn increment_and_decrement() {
        let symbols = lex("i++ - --j");
        assert_eq!(
            kinds(&symbols),
            vec![
                SymbolKind::Other,
                SymbolKind::Increment,
                SymbolKind::WhiteSpace,
                SymbolKind::Minus,
                SymbolKind::WhiteSpace,
                SymbolKind::Decrement,
                SymbolKind::Other,
            ]
        );
    }

    #[test]
    fn comments_and_strings() {
        use SymbolKind::*;

        let symbols = lex("x = \"a \\\" b\"; // done\n/* multi\nline */");
        assert_eq!(
            kinds(&symbols),
            vec![
                Other,
                WhiteSpace,
                Equals,
                WhiteSpace,
                String,
                Semicolon,
                WhiteSpace,
                SingleLineComment,
                EndOfLine,
                MultiLineComment,
            ]
        );
        assert_eq!(symbols[4].text, "\"a \\\" b\"");
        assert_eq!(symbols[9].text, "/* multi\nline */");
    }

    #[test]
    fn numbers() {
        let symbols = lex("0x1f 123_456 1.5e-3 2u");
        let numbers: Vec<_> =
            symbols.iter().filter(|s| s.kind == SymbolKind::Number).map(|s| s.text).collect();
        assert_eq!(numbers, vec!["0x1f", "123_456", "1.5e-3", "2u"]);
    }

    #[test]
    fn locations_track_lines() {
        let symbols = lex("a\n  b");
        let b = symbols.last().unwrap();
        assert_eq!(b.text, "b");
        assert_eq!(b.location.line_number, 2);
        assert_eq!(b.location.index_on_line, 2);
        assert_eq!(b.location.index, TextSize::new(4));
    }

    #[test]
    fn round_trip_reproduces_source() {
        let text = "#if A\nclass X { int i = 1; } // c\n#else\nwhat ever\n#endif\n";
        let symbols = lex_with(text, &["A"]);
        let rebuilt: String = symbols.iter().map(|symbol| symbol.text).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn round_trip_with_skipped_section() {
        let text = "#if A\nlive();\n#else\ndead();\n#endif\n";
        let symbols = lex(text);
        let rebuilt: String = symbols.iter().map(|symbol| symbol.text).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn false_branch_becomes_skipped_section() {
        let text = "#if A\ndead();\n#endif\n";
        let symbols = lex(text);

        let skipped: Vec<_> =
            symbols.iter().filter(|s| s.kind == SymbolKind::SkippedSection).collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].text, "\ndead();\n");
        assert!(!symbols.iter().any(|s| s.kind == SymbolKind::Other && s.text == "dead"));
    }

    #[test]
    fn true_branch_stays_live() {
        let text = "#if A && !B\nclass X {}\n#endif\n";
        let symbols = lex_with(text, &["A"]);
        assert!(symbols.iter().any(|s| s.kind == SymbolKind::Other && s.text == "class"));
        assert!(!symbols.iter().any(|s| s.kind == SymbolKind::SkippedSection));

        let symbols = lex(text);
        assert!(!symbols.iter().any(|s| s.kind == SymbolKind::Other && s.text == "class"));
        assert!(symbols.iter().any(|s| s.kind == SymbolKind::SkippedSection));
    }

    #[test]
    fn elif_chain_picks_first_live_branch() {
        let text = "#if A\none\n#elif B\ntwo\n#else\nthree\n#endif\n";

        let words = |symbols: &[Symbol<'_>]| -> Vec<String> {
            symbols
                .iter()
                .filter(|s| s.kind == SymbolKind::Other)
                .map(|s| s.text.to_string())
                .collect()
        };

        assert_eq!(words(&lex_with(text, &["A"])), vec!["one"]);
        assert_eq!(words(&lex_with(text, &["B"])), vec!["two"]);
        assert_eq!(words(&lex(text)), vec!["three"]);
    }

    #[test]
    fn nested_conditionals_skip_as_a_unit() {
        let text = "#if A\n#if B\ninner\n#endif\nouter\n#endif\n";
        let symbols = lex(text);
        let skipped: Vec<_> =
            symbols.iter().filter(|s| s.kind == SymbolKind::SkippedSection).collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].text.contains("inner"));
        assert!(skipped[0].text.contains("outer"));
    }

    #[test]
    fn duplicate_else_is_an_error() {
        let text = "#if A\none\n#else\ntwo\n#else\nthree\n#endif\n";
        let error =
            Lexer::new(text, Location::FIRST, &Definitions::default()).symbols().unwrap_err();
        assert!(error.message().contains("#else"));
        assert_eq!(error.line_number(), 5);
    }

    #[test]
    fn elif_after_else_is_an_error() {
        let text = "#if A\none\n#else\ntwo\n#elif B\nthree\n#endif\n";

        for defined in [&[][..], &["A"][..]] {
            let definitions = defined.iter().map(|name| (*name).to_string()).collect();
            let error =
                Lexer::new(text, Location::FIRST, &definitions).symbols().unwrap_err();
            assert!(error.message().contains("#elif"));
        }
    }

    #[test]
    fn define_and_undef_update_the_working_set() {
        let text = "#define A\n#if A\nyes\n#endif\n#undef A\n#if A\nno\n#endif\n";
        let symbols = lex(text);
        let words: Vec<_> =
            symbols.iter().filter(|s| s.kind == SymbolKind::Other).map(|s| s.text).collect();
        assert_eq!(words, vec!["yes"]);
    }

    #[test]
    fn generated_region_stamps_symbols() {
        let text = "a\n#region Windows Form Designer generated code\nb\n#endregion\nc\n";
        let symbols = lex(text);

        let flag = |name: &str| {
            symbols.iter().find(|s| s.text == name).map(|s| s.generated).unwrap()
        };
        assert!(!flag("a"));
        assert!(flag("b"));
        assert!(!flag("c"));
    }

    #[test]
    fn missing_endif_is_an_error() {
        let error = Lexer::new("#if A\nx\n", Location::FIRST, &Definitions::default())
            .symbols()
            .unwrap_err();
        assert!(error.message().contains("#endif"));
        assert_eq!(error.line_number(), 1);
    }

    #[test]
    fn stray_endif_is_an_error() {
        let error = Lexer::new("#endif\n", Location::FIRST, &Definitions::default())
            .symbols()
            .unwrap_err();
        assert!(error.message().contains("#endif"));
    }

    #[test]
    fn hash_in_code_position_is_not_a_directive() {
        let symbols = lex("a # b");
        assert_eq!(symbols[2].kind, SymbolKind::Unknown);
    }
}
