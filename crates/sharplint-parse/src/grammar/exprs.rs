//! Expressions, built by extension gathering.
//!
//! A primary expression is parsed first, then repeatedly offered to
//! `extension`: an operator extends the expression only when it binds
//! strictly tighter than the level that gathered the left-hand side, so
//! chains of equal precedence associate left through the caller's loop.
//! The sealed left-hand side is re-parented as the first child of the
//! extension's proxy.

use sharplint_errors::Result;
use sharplint_lexer::SymbolKind;
use sharplint_tree::{CodeUnitKind, ExpressionKind, NodeId, Proxy};

use super::items;
use crate::parser::Parser;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Precedence {
    None,
    Assignment,
    ConditionalOr,
    ConditionalAnd,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Unary,
    Primary,
}

fn check_precedence(previous: Precedence, current: Precedence) -> bool {
    previous == Precedence::None || current > previous
}

pub(super) fn expression(parser: &mut Parser<'_>) -> Result<NodeId> {
    next_expression(parser, Precedence::None)
}

fn next_expression(parser: &mut Parser<'_>, previous: Precedence) -> Result<NodeId> {
    let mut node = primary(parser)?;

    // Gather up all extensions to this expression.
    loop {
        match extension(parser, node, previous)? {
            Some(extended) => node = extended,
            None => return Ok(node),
        }
    }
}

fn primary(parser: &mut Parser<'_>) -> Result<NodeId> {
    if parser.at_word("new") {
        return object_creation(parser);
    }

    let Some(symbol) = parser.peek_code(1) else {
        return Err(parser.end_of_file());
    };

    match symbol.kind {
        SymbolKind::Other | SymbolKind::Number | SymbolKind::String => {
            let mut proxy = Proxy::new();
            parser.bump(&mut proxy)?;
            Ok(parser.seal(proxy, CodeUnitKind::Expression(ExpressionKind::Literal)))
        }
        SymbolKind::OpenParenthesis => parenthesized(parser),
        SymbolKind::Not => unary(parser, ExpressionKind::Not),
        SymbolKind::Minus => unary(parser, ExpressionKind::Negative),
        SymbolKind::Plus => unary(parser, ExpressionKind::Positive),
        SymbolKind::Tilde => unary(parser, ExpressionKind::BitwiseNot),
        SymbolKind::Increment => unary(parser, ExpressionKind::Increment),
        SymbolKind::Decrement => unary(parser, ExpressionKind::Decrement),
        _ => Err(parser.unexpected()),
    }
}

fn unary(parser: &mut Parser<'_>, kind: ExpressionKind) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    parser.bump(&mut proxy)?;

    let operand = next_expression(parser, Precedence::Unary)?;
    proxy.push(operand);

    Ok(parser.seal(proxy, CodeUnitKind::Expression(kind)))
}

fn parenthesized(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    let open = parser.bump(&mut proxy)?;

    let inner = next_expression(parser, Precedence::None)?;
    proxy.push(inner);

    let close = parser.expect(&mut proxy, SymbolKind::CloseParenthesis)?;
    parser.tree.set_matching_brackets(open, close);

    Ok(parser.seal(proxy, CodeUnitKind::Expression(ExpressionKind::Parenthesized)))
}

/// `new T(...)`, shaped as an invocation of the constructed type.
fn object_creation(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    parser.expect_word(&mut proxy, "new")?;
    items::type_tokens(parser, &mut proxy)?;
    argument_list(parser, &mut proxy)?;
    Ok(parser.seal(proxy, CodeUnitKind::Expression(ExpressionKind::Invocation)))
}

/// Offers one extension to `left`. Returns the extended expression, or
/// `None` when the next symbol does not extend it at this precedence.
fn extension(
    parser: &mut Parser<'_>,
    left: NodeId,
    previous: Precedence,
) -> Result<Option<NodeId>> {
    let Some(symbol) = parser.peek_code(1) else {
        return Ok(None);
    };

    let (precedence, kind) = match symbol.kind {
        SymbolKind::Dot => (Precedence::Primary, ExpressionKind::MemberAccess),
        SymbolKind::OpenParenthesis => (Precedence::Primary, ExpressionKind::Invocation),
        SymbolKind::Increment => (Precedence::Primary, ExpressionKind::Increment),
        SymbolKind::Decrement => (Precedence::Primary, ExpressionKind::Decrement),
        SymbolKind::Multiplication => {
            (Precedence::Multiplicative, ExpressionKind::Multiplication)
        }
        SymbolKind::Division => (Precedence::Multiplicative, ExpressionKind::Division),
        SymbolKind::Mod => (Precedence::Multiplicative, ExpressionKind::Mod),
        SymbolKind::Plus => (Precedence::Additive, ExpressionKind::Addition),
        SymbolKind::Minus => (Precedence::Additive, ExpressionKind::Subtraction),
        SymbolKind::LessThan => (Precedence::Relational, ExpressionKind::LessThan),
        SymbolKind::GreaterThan => (Precedence::Relational, ExpressionKind::GreaterThan),
        SymbolKind::LessThanOrEquals => {
            (Precedence::Relational, ExpressionKind::LessThanOrEqualTo)
        }
        SymbolKind::GreaterThanOrEquals => {
            (Precedence::Relational, ExpressionKind::GreaterThanOrEqualTo)
        }
        SymbolKind::ConditionalEquals => (Precedence::Equality, ExpressionKind::EqualTo),
        SymbolKind::NotEquals => (Precedence::Equality, ExpressionKind::NotEqualTo),
        SymbolKind::ConditionalAnd => (Precedence::ConditionalAnd, ExpressionKind::ConditionalAnd),
        SymbolKind::ConditionalOr => (Precedence::ConditionalOr, ExpressionKind::ConditionalOr),
        SymbolKind::Equals => (Precedence::Assignment, ExpressionKind::Assignment),
        _ => return Ok(None),
    };

    if !check_precedence(previous, precedence) {
        return Ok(None);
    }

    let mut proxy = Proxy::new();
    proxy.push(left);

    match kind {
        ExpressionKind::MemberAccess => {
            parser.bump(&mut proxy)?;
            parser.expect(&mut proxy, SymbolKind::Other)?;
        }
        ExpressionKind::Invocation => {
            argument_list(parser, &mut proxy)?;
        }
        ExpressionKind::Increment | ExpressionKind::Decrement => {
            parser.bump(&mut proxy)?;
        }
        _ => {
            parser.bump(&mut proxy)?;
            let right = next_expression(parser, precedence)?;
            proxy.push(right);
        }
    }

    Ok(Some(parser.seal(proxy, CodeUnitKind::Expression(kind))))
}

fn argument_list(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    let open = parser.expect(proxy, SymbolKind::OpenParenthesis)?;

    if !parser.at(SymbolKind::CloseParenthesis) {
        loop {
            let argument = expression(parser)?;
            proxy.push(argument);
            if parser.at(SymbolKind::Comma) {
                parser.bump(proxy)?;
                continue;
            }
            break;
        }
    }

    let close = parser.expect(proxy, SymbolKind::CloseParenthesis)?;
    parser.tree.set_matching_brackets(open, close);
    Ok(())
}
