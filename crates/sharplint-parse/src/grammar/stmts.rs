use sharplint_errors::Result;
use sharplint_lexer::SymbolKind;
use sharplint_tree::{CodeUnitKind, NodeId, Proxy, StatementKind};

use super::{exprs, items};
use crate::parser::Parser;

pub(super) fn block(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    parser.expect(&mut proxy, SymbolKind::OpenCurlyBracket)?;

    loop {
        parser.attach_trivia(&mut proxy);
        if parser.at(SymbolKind::CloseCurlyBracket) {
            break;
        }
        if parser.at_end() {
            return Err(parser.end_of_file());
        }
        let statement = statement(parser)?;
        proxy.push(statement);
    }

    parser.expect(&mut proxy, SymbolKind::CloseCurlyBracket)?;
    Ok(parser.seal(proxy, CodeUnitKind::Statement(StatementKind::Block)))
}

fn statement(parser: &mut Parser<'_>) -> Result<NodeId> {
    if parser.at(SymbolKind::OpenCurlyBracket) {
        return block(parser);
    }
    if parser.at_word("return") {
        return return_statement(parser);
    }
    if parser.at_word("if") {
        return if_statement(parser);
    }
    if parser.at_word("while") {
        return while_statement(parser);
    }
    if parser.at_word("unsafe") {
        return unsafe_statement(parser);
    }
    if looks_like_variable_declaration(parser) {
        return variable_declaration(parser);
    }
    expression_statement(parser)
}

fn return_statement(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    parser.expect_word(&mut proxy, "return")?;

    if !parser.at(SymbolKind::Semicolon) {
        let value = exprs::expression(parser)?;
        proxy.push(value);
    }

    parser.expect(&mut proxy, SymbolKind::Semicolon)?;
    Ok(parser.seal(proxy, CodeUnitKind::Statement(StatementKind::Return)))
}

fn if_statement(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    parser.expect_word(&mut proxy, "if")?;
    condition(parser, &mut proxy)?;

    let body = statement(parser)?;
    proxy.push(body);

    if parser.at_word("else") {
        parser.expect_word(&mut proxy, "else")?;
        let alternative = statement(parser)?;
        proxy.push(alternative);
    }

    Ok(parser.seal(proxy, CodeUnitKind::Statement(StatementKind::If)))
}

fn while_statement(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    parser.expect_word(&mut proxy, "while")?;
    condition(parser, &mut proxy)?;

    let body = statement(parser)?;
    proxy.push(body);

    Ok(parser.seal(proxy, CodeUnitKind::Statement(StatementKind::While)))
}

fn unsafe_statement(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    parser.expect_word(&mut proxy, "unsafe")?;

    let body = block(parser)?;
    proxy.push(body);

    Ok(parser.seal(proxy, CodeUnitKind::Statement(StatementKind::Unsafe)))
}

fn condition(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    let open = parser.expect(proxy, SymbolKind::OpenParenthesis)?;
    let value = exprs::expression(parser)?;
    proxy.push(value);
    let close = parser.expect(proxy, SymbolKind::CloseParenthesis)?;
    parser.tree.set_matching_brackets(open, close);
    Ok(())
}

fn variable_declaration(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    items::type_tokens(parser, &mut proxy)?;
    parser.expect(&mut proxy, SymbolKind::Other)?;

    loop {
        if parser.at(SymbolKind::Equals) {
            parser.bump(&mut proxy)?;
            let value = exprs::expression(parser)?;
            proxy.push(value);
        }
        if parser.at(SymbolKind::Comma) {
            parser.bump(&mut proxy)?;
            parser.expect(&mut proxy, SymbolKind::Other)?;
            continue;
        }
        break;
    }

    parser.expect(&mut proxy, SymbolKind::Semicolon)?;
    Ok(parser.seal(proxy, CodeUnitKind::Statement(StatementKind::VariableDeclaration)))
}

fn expression_statement(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();
    let value = exprs::expression(parser)?;
    proxy.push(value);
    parser.expect(&mut proxy, SymbolKind::Semicolon)?;
    Ok(parser.seal(proxy, CodeUnitKind::Statement(StatementKind::Expression)))
}

const STATEMENT_WORDS: &[&str] = &["return", "if", "else", "while", "unsafe", "true", "false"];

/// A statement starting with an identifier is a variable declaration when
/// a type reference is followed by another identifier. Anything else at
/// that position makes it an expression statement.
fn looks_like_variable_declaration(parser: &Parser<'_>) -> bool {
    match parser.peek_code(1) {
        Some(symbol) if symbol.kind == SymbolKind::Other => {
            if STATEMENT_WORDS.contains(&symbol.text) {
                return false;
            }
        }
        _ => return false,
    }

    let mut n = 2;
    let mut angle = 0usize;
    let mut after_dot = false;
    loop {
        let Some(symbol) = parser.peek_code(n) else {
            return false;
        };
        match symbol.kind {
            SymbolKind::Dot => after_dot = true,
            SymbolKind::Other => {
                if angle == 0 && !after_dot {
                    return true;
                }
                after_dot = false;
            }
            SymbolKind::LessThan => angle += 1,
            SymbolKind::GreaterThan if angle > 0 => angle -= 1,
            SymbolKind::Comma if angle > 0 => {}
            SymbolKind::OpenSquareBracket | SymbolKind::CloseSquareBracket => {}
            _ => return false,
        }
        n += 1;
    }
}
