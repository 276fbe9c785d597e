//! Expression sub-grammar for conditional compilation directives.
//!
//! The body following `#if`/`#elif` is re-lexed with a base location inside
//! the whole file and parsed by precedence climbing: each call consumes only
//! operators binding strictly tighter than `previous`, and chained operators
//! of equal precedence associate to the left through the caller's gather
//! loop.

use sharplint_errors::{Result, SyntaxError};
use sharplint_span::Location;

use crate::{Definitions, Lexer, Symbol, SymbolKind, SymbolManager};

/// A parsed conditional compilation expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PreprocessorExpression {
    /// A named preprocessor symbol; true iff the name is defined.
    Constant(Box<str>),
    /// A `true` or `false` literal.
    Literal(bool),
    Not(Box<PreprocessorExpression>),
    Parenthesized(Box<PreprocessorExpression>),
    EqualTo(Box<PreprocessorExpression>, Box<PreprocessorExpression>),
    NotEqualTo(Box<PreprocessorExpression>, Box<PreprocessorExpression>),
    ConditionalAnd(Box<PreprocessorExpression>, Box<PreprocessorExpression>),
    ConditionalOr(Box<PreprocessorExpression>, Box<PreprocessorExpression>),
}

impl PreprocessorExpression {
    /// Evaluates the expression against the set of defined symbols.
    pub fn evaluate(&self, definitions: &Definitions) -> bool {
        match self {
            Self::Constant(name) => definitions.contains(&**name),
            Self::Literal(value) => *value,
            Self::Not(operand) => !operand.evaluate(definitions),
            Self::Parenthesized(inner) => inner.evaluate(definitions),
            Self::EqualTo(left, right) => left.evaluate(definitions) == right.evaluate(definitions),
            Self::NotEqualTo(left, right) => {
                left.evaluate(definitions) != right.evaluate(definitions)
            }
            Self::ConditionalAnd(left, right) => {
                left.evaluate(definitions) && right.evaluate(definitions)
            }
            Self::ConditionalOr(left, right) => {
                left.evaluate(definitions) || right.evaluate(definitions)
            }
        }
    }
}

/// Binding strength tiers, weakest to strongest.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Precedence {
    None,
    ConditionalOr,
    ConditionalAnd,
    Equality,
    Unary,
}

/// An extension operator is admissible only when it binds strictly tighter
/// than the call that gathered the left-hand side.
fn check_precedence(previous: Precedence, current: Precedence) -> bool {
    previous == Precedence::None || current > previous
}

/// Parses the text following a conditional directive keyword.
///
/// An empty (or all-trivia) body yields `None`: the directive carries no
/// condition. A malformed body is a syntax error on the offending line.
pub fn parse_directive_body(
    body: &str,
    base: Location,
) -> Result<Option<PreprocessorExpression>> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let symbols = Lexer::new(body, base, &Definitions::default()).symbols()?;
    let mut manager = SymbolManager::new(symbols);

    let expression = next_expression(&mut manager, Precedence::None)?;

    skip_trivia(&mut manager);
    if let Some(symbol) = manager.peek(1) {
        return Err(unexpected(symbol));
    }

    Ok(expression)
}

fn skip_trivia(symbols: &mut SymbolManager<'_>) {
    while symbols.peek(1).is_some_and(|symbol| symbol.kind.is_trivia()) {
        symbols.advance();
    }
}

fn unexpected(symbol: &Symbol<'_>) -> SyntaxError {
    SyntaxError::unexpected_symbol(symbol.text, symbol.location.line_number, symbol.range())
}

fn next_expression(
    symbols: &mut SymbolManager<'_>,
    previous: Precedence,
) -> Result<Option<PreprocessorExpression>> {
    skip_trivia(symbols);

    let Some(symbol) = symbols.peek(1) else {
        return Ok(None);
    };

    let mut expression = match symbol.kind {
        SymbolKind::Other => constant_expression(symbols),
        SymbolKind::Not => not_expression(symbols)?,
        SymbolKind::OpenParenthesis => parenthesized_expression(symbols)?,
        _ => return Err(unexpected(symbol)),
    };

    // Gather up all extensions to this expression.
    loop {
        match expression_extension(symbols, expression, previous)? {
            Extension::Extended(extended) => expression = extended,
            Extension::Unchanged(unchanged) => {
                expression = unchanged;
                break;
            }
        }
    }

    Ok(Some(expression))
}

enum Extension {
    Extended(PreprocessorExpression),
    Unchanged(PreprocessorExpression),
}

/// Checks whether the expression just parsed is the left-hand side of a
/// larger binary expression admissible at the current precedence.
fn expression_extension(
    symbols: &mut SymbolManager<'_>,
    left: PreprocessorExpression,
    previous: Precedence,
) -> Result<Extension> {
    skip_trivia(symbols);

    let Some(symbol) = symbols.peek(1) else {
        return Ok(Extension::Unchanged(left));
    };

    type Constructor =
        fn(Box<PreprocessorExpression>, Box<PreprocessorExpression>) -> PreprocessorExpression;

    let (precedence, build): (Precedence, Constructor) = match symbol.kind {
        SymbolKind::ConditionalEquals => (Precedence::Equality, PreprocessorExpression::EqualTo),
        SymbolKind::NotEquals => (Precedence::Equality, PreprocessorExpression::NotEqualTo),
        SymbolKind::ConditionalAnd => {
            (Precedence::ConditionalAnd, PreprocessorExpression::ConditionalAnd)
        }
        SymbolKind::ConditionalOr => {
            (Precedence::ConditionalOr, PreprocessorExpression::ConditionalOr)
        }
        _ => return Ok(Extension::Unchanged(left)),
    };

    if !check_precedence(previous, precedence) {
        return Ok(Extension::Unchanged(left));
    }

    let line_number = symbol.location.line_number;
    let range = symbol.range();
    symbols.advance();

    let right = next_expression(symbols, precedence)?.ok_or_else(|| {
        SyntaxError::new("expected an expression after the operator", line_number, range)
    })?;

    Ok(Extension::Extended(build(Box::new(left), Box::new(right))))
}

fn constant_expression(symbols: &mut SymbolManager<'_>) -> PreprocessorExpression {
    let symbol = symbols.advance();
    match symbol.text {
        "true" => PreprocessorExpression::Literal(true),
        "false" => PreprocessorExpression::Literal(false),
        name => PreprocessorExpression::Constant(name.into()),
    }
}

fn not_expression(symbols: &mut SymbolManager<'_>) -> Result<PreprocessorExpression> {
    let operator = symbols.advance();

    let operand = next_expression(symbols, Precedence::Unary)?.ok_or_else(|| {
        SyntaxError::new(
            "expected an expression after `!`",
            operator.location.line_number,
            operator.range(),
        )
    })?;

    Ok(PreprocessorExpression::Not(Box::new(operand)))
}

fn parenthesized_expression(symbols: &mut SymbolManager<'_>) -> Result<PreprocessorExpression> {
    let open = symbols.advance();

    let inner = next_expression(symbols, Precedence::None)?.ok_or_else(|| {
        SyntaxError::new(
            "expected an expression after `(`",
            open.location.line_number,
            open.range(),
        )
    })?;

    skip_trivia(symbols);
    match symbols.peek(1) {
        Some(symbol) if symbol.kind == SymbolKind::CloseParenthesis => {
            symbols.advance();
        }
        Some(symbol) => return Err(unexpected(symbol)),
        None => {
            return Err(SyntaxError::new(
                "missing closing parenthesis",
                open.location.line_number,
                open.range(),
            ));
        }
    }

    Ok(PreprocessorExpression::Parenthesized(Box::new(inner)))
}

#[cfg(test)]
mod tests {
    use super::PreprocessorExpression::*;
    use super::*;

    fn parse(body: &str) -> PreprocessorExpression {
        parse_directive_body(body, Location::FIRST).unwrap().unwrap()
    }

    fn eval(body: &str, defined: &[&str]) -> bool {
        let definitions = defined.iter().map(|name| (*name).to_string()).collect();
        parse(body).evaluate(&definitions)
    }

    fn constant(name: &str) -> Box<PreprocessorExpression> {
        Box::new(Constant(name.into()))
    }

    #[test]
    fn empty_body_means_no_condition() {
        assert_eq!(parse_directive_body("", Location::FIRST).unwrap(), None);
        assert_eq!(parse_directive_body("   ", Location::FIRST).unwrap(), None);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("A || B && C"),
            ConditionalOr(constant("A"), Box::new(ConditionalAnd(constant("B"), constant("C"))))
        );
    }

    #[test]
    fn not_binds_tighter_than_equality() {
        assert_eq!(
            parse("!A == B"),
            EqualTo(Box::new(Not(constant("A"))), constant("B"))
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            parse("(A || B) && C"),
            ConditionalAnd(
                Box::new(Parenthesized(Box::new(ConditionalOr(constant("A"), constant("B"))))),
                constant("C")
            )
        );
    }

    #[test]
    fn chained_operators_associate_left() {
        assert_eq!(
            parse("A && B && C"),
            ConditionalAnd(
                Box::new(ConditionalAnd(constant("A"), constant("B"))),
                constant("C")
            )
        );
    }

    #[test]
    fn equality_binds_tighter_than_and() {
        assert_eq!(
            parse("A == B && C"),
            ConditionalAnd(Box::new(EqualTo(constant("A"), constant("B"))), constant("C"))
        );
        assert_eq!(
            parse("A && B == C"),
            ConditionalAnd(constant("A"), Box::new(EqualTo(constant("B"), constant("C"))))
        );
    }

    #[test]
    fn true_false_literals() {
        assert!(eval("true", &[]));
        assert!(!eval("false", &[]));
        assert!(eval("A == false", &[]));
    }

    #[test]
    fn evaluation_follows_boolean_algebra() {
        assert!(eval("A && !B", &["A"]));
        assert!(!eval("A && !B", &["A", "B"]));
        assert!(eval("A || B", &["B"]));
        assert!(eval("A != B", &["A"]));
        assert!(!eval("A != B", &["A", "B"]));
    }

    #[test]
    fn de_morgan_holds() {
        for defined in [&[][..], &["A"][..], &["B"][..], &["A", "B"][..]] {
            assert_eq!(eval("!(A && B)", defined), eval("!A || !B", defined));
            assert_eq!(eval("!(A || B)", defined), eval("!A && !B", defined));
        }
    }

    #[test]
    fn comments_inside_the_body_are_skipped() {
        assert!(eval("A /* legacy */ && true", &["A"]));
    }

    #[test]
    fn malformed_bodies_fail_with_the_line() {
        let base = Location::new(sharplint_span::TextSize::new(40), 4, 3);

        let error = parse_directive_body("A &&", base).unwrap_err();
        assert_eq!(error.line_number(), 3);

        let error = parse_directive_body("(A", base).unwrap_err();
        assert_eq!(error.line_number(), 3);

        let error = parse_directive_body("A B", base).unwrap_err();
        assert!(error.message().contains("unexpected symbol"));

        let error = parse_directive_body("&& A", base).unwrap_err();
        assert!(error.message().contains("unexpected symbol"));
    }
}
