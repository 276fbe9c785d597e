//! Declarations: the document root, using directives, namespaces, types
//! and their members.
//!
//! Member shape is decided by lookahead over code symbols before anything
//! is consumed: the first of `(`, `{`, `=` or `;` wins unless a type
//! keyword appears first.

use sharplint_errors::{Result, SyntaxError};
use sharplint_lexer::SymbolKind;
use sharplint_tree::{CodeUnitKind, ElementKind, NodeId, Proxy, TokenKind};

use super::{exprs, stmts};
use crate::parser::Parser;

pub(crate) fn document(parser: &mut Parser<'_>) -> Result<NodeId> {
    let mut proxy = Proxy::new();

    loop {
        parser.attach_trivia(&mut proxy);
        if parser.at_end() {
            break;
        }
        declaration(parser, &mut proxy)?;
    }

    Ok(parser.seal(proxy, CodeUnitKind::Element(ElementKind::Document)))
}

fn declaration(parser: &mut Parser<'_>, parent: &mut Proxy) -> Result<()> {
    let mut prefix = Proxy::new();
    attribute_prefix(parser, &mut prefix)?;

    let element = if parser.at_word("using") {
        using_directive(parser, prefix)?
    } else if parser.at_word("namespace") {
        namespace(parser, prefix)?
    } else {
        member(parser, prefix)?
    };

    parent.push(element);
    Ok(())
}

/// Parses leading `[...]` blocks as Attribute units. They form a contiguous
/// prefix of the declaration's children.
fn attribute_prefix(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    while parser.at(SymbolKind::OpenSquareBracket) {
        let mut attribute = Proxy::new();
        let open = parser.bump(&mut attribute)?;

        let mut depth = 0usize;
        let close = loop {
            match parser.peek_code(1).map(|symbol| symbol.kind) {
                None => return Err(parser.end_of_file()),
                Some(SymbolKind::OpenSquareBracket) => {
                    depth += 1;
                    parser.bump(&mut attribute)?;
                }
                Some(SymbolKind::CloseSquareBracket) => {
                    let bracket = parser.bump(&mut attribute)?;
                    if depth == 0 {
                        break bracket;
                    }
                    depth -= 1;
                }
                Some(_) => {
                    parser.bump(&mut attribute)?;
                }
            }
        };

        parser.tree.set_matching_brackets(open, close);
        let node = parser.seal(attribute, CodeUnitKind::Attribute);
        proxy.push(node);
    }

    Ok(())
}

fn using_directive(parser: &mut Parser<'_>, mut proxy: Proxy) -> Result<NodeId> {
    parser.expect_word(&mut proxy, "using")?;
    dotted_name(parser, &mut proxy)?;
    parser.expect(&mut proxy, SymbolKind::Semicolon)?;
    Ok(parser.seal(proxy, CodeUnitKind::Element(ElementKind::UsingDirective)))
}

fn namespace(parser: &mut Parser<'_>, mut proxy: Proxy) -> Result<NodeId> {
    parser.expect_word(&mut proxy, "namespace")?;
    dotted_name(parser, &mut proxy)?;
    parser.expect(&mut proxy, SymbolKind::OpenCurlyBracket)?;

    loop {
        parser.attach_trivia(&mut proxy);
        if parser.at(SymbolKind::CloseCurlyBracket) {
            break;
        }
        if parser.at_end() {
            return Err(parser.end_of_file());
        }
        declaration(parser, &mut proxy)?;
    }

    parser.expect(&mut proxy, SymbolKind::CloseCurlyBracket)?;
    Ok(parser.seal(proxy, CodeUnitKind::Element(ElementKind::Namespace)))
}

enum MemberShape {
    Type(ElementKind),
    Method,
    Property,
    Field,
}

/// Looks ahead over code symbols to classify the upcoming member. No
/// symbol is consumed.
fn member_shape(parser: &Parser<'_>) -> Result<MemberShape> {
    let mut n = 1;
    loop {
        let Some(symbol) = parser.peek_code(n) else {
            return Err(parser.end_of_file());
        };

        match symbol.kind {
            SymbolKind::Other => match symbol.text {
                "class" => return Ok(MemberShape::Type(ElementKind::Class)),
                "struct" => return Ok(MemberShape::Type(ElementKind::Struct)),
                "interface" => return Ok(MemberShape::Type(ElementKind::Interface)),
                "enum" => return Ok(MemberShape::Type(ElementKind::Enum)),
                _ => {}
            },
            SymbolKind::OpenParenthesis => return Ok(MemberShape::Method),
            SymbolKind::OpenCurlyBracket => return Ok(MemberShape::Property),
            SymbolKind::Equals | SymbolKind::Semicolon => return Ok(MemberShape::Field),
            SymbolKind::CloseCurlyBracket => {
                return Err(SyntaxError::unexpected_symbol(
                    symbol.text,
                    symbol.location.line_number,
                    symbol.range(),
                ));
            }
            _ => {}
        }

        n += 1;
    }
}

fn member(parser: &mut Parser<'_>, prefix: Proxy) -> Result<NodeId> {
    match member_shape(parser)? {
        MemberShape::Type(kind) => type_declaration(parser, prefix, kind),
        MemberShape::Method => method(parser, prefix),
        MemberShape::Property => property(parser, prefix),
        MemberShape::Field => field(parser, prefix),
    }
}

const MODIFIER_WORDS: &[&str] = &[
    "public", "private", "protected", "internal", "new", "unsafe", "static", "readonly", "const",
    "volatile", "fixed", "sealed", "abstract", "virtual", "override", "extern", "partial",
];

fn modifiers(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    while parser
        .peek_code(1)
        .is_some_and(|symbol| symbol.kind == SymbolKind::Other && MODIFIER_WORDS.contains(&symbol.text))
    {
        parser.bump(proxy)?;
    }
    Ok(())
}

fn type_declaration(
    parser: &mut Parser<'_>,
    mut proxy: Proxy,
    kind: ElementKind,
) -> Result<NodeId> {
    modifiers(parser, &mut proxy)?;

    let word = match kind {
        ElementKind::Class => "class",
        ElementKind::Struct => "struct",
        ElementKind::Interface => "interface",
        ElementKind::Enum => "enum",
        _ => unreachable!("not a type declaration: {kind:?}"),
    };
    parser.expect_word(&mut proxy, word)?;
    parser.expect(&mut proxy, SymbolKind::Other)?;

    if kind != ElementKind::Enum && parser.at(SymbolKind::LessThan) {
        generic_bracket_list(parser, &mut proxy)?;
    }

    if parser.at(SymbolKind::Colon) {
        parser.bump(&mut proxy)?;
        type_tokens(parser, &mut proxy)?;
        while parser.at(SymbolKind::Comma) {
            parser.bump(&mut proxy)?;
            type_tokens(parser, &mut proxy)?;
        }
    }

    parser.expect(&mut proxy, SymbolKind::OpenCurlyBracket)?;

    if kind == ElementKind::Enum {
        enum_items(parser, &mut proxy)?;
    } else {
        loop {
            parser.attach_trivia(&mut proxy);
            if parser.at(SymbolKind::CloseCurlyBracket) {
                break;
            }
            if parser.at_end() {
                return Err(parser.end_of_file());
            }

            let mut prefix = Proxy::new();
            attribute_prefix(parser, &mut prefix)?;
            let node = member(parser, prefix)?;
            proxy.push(node);
        }
    }

    parser.expect(&mut proxy, SymbolKind::CloseCurlyBracket)?;
    Ok(parser.seal(proxy, CodeUnitKind::Element(kind)))
}

fn enum_items(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    loop {
        parser.attach_trivia(proxy);
        if parser.at(SymbolKind::CloseCurlyBracket) {
            return Ok(());
        }

        let mut item = Proxy::new();
        attribute_prefix(parser, &mut item)?;
        parser.expect(&mut item, SymbolKind::Other)?;
        if parser.at(SymbolKind::Equals) {
            parser.bump(&mut item)?;
            let value = exprs::expression(parser)?;
            item.push(value);
        }
        let node = parser.seal(item, CodeUnitKind::Element(ElementKind::EnumItem));
        proxy.push(node);

        if parser.at(SymbolKind::Comma) {
            parser.bump(proxy)?;
        } else {
            return Ok(());
        }
    }
}

fn method(parser: &mut Parser<'_>, mut proxy: Proxy) -> Result<NodeId> {
    modifiers(parser, &mut proxy)?;
    type_tokens(parser, &mut proxy)?;
    dotted_name(parser, &mut proxy)?;

    if parser.at(SymbolKind::LessThan) {
        generic_bracket_list(parser, &mut proxy)?;
    }
    parameter_list(parser, &mut proxy)?;

    if parser.at(SymbolKind::Semicolon) {
        // Abstract, extern or partial methods have no body.
        parser.bump(&mut proxy)?;
    } else {
        let body = stmts::block(parser)?;
        proxy.push(body);
    }

    Ok(parser.seal(proxy, CodeUnitKind::Element(ElementKind::Method)))
}

fn parameter_list(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    let open = parser.expect(proxy, SymbolKind::OpenParenthesis)?;

    while !parser.at(SymbolKind::CloseParenthesis) {
        if parser.at_end() {
            return Err(parser.end_of_file());
        }
        if parser.at(SymbolKind::Comma) {
            parser.bump(proxy)?;
            continue;
        }
        type_tokens(parser, proxy)?;
        parser.expect(proxy, SymbolKind::Other)?;
    }

    let close = parser.bump(proxy)?;
    parser.tree.set_matching_brackets(open, close);
    Ok(())
}

fn field(parser: &mut Parser<'_>, mut proxy: Proxy) -> Result<NodeId> {
    modifiers(parser, &mut proxy)?;
    type_tokens(parser, &mut proxy)?;
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
    Ok(parser.seal(proxy, CodeUnitKind::Element(ElementKind::Field)))
}

fn property(parser: &mut Parser<'_>, mut proxy: Proxy) -> Result<NodeId> {
    modifiers(parser, &mut proxy)?;
    type_tokens(parser, &mut proxy)?;
    dotted_name(parser, &mut proxy)?;
    parser.expect(&mut proxy, SymbolKind::OpenCurlyBracket)?;

    loop {
        parser.attach_trivia(&mut proxy);
        if parser.at(SymbolKind::CloseCurlyBracket) {
            break;
        }
        accessor(parser, &mut proxy)?;
    }

    parser.expect(&mut proxy, SymbolKind::CloseCurlyBracket)?;
    Ok(parser.seal(proxy, CodeUnitKind::Element(ElementKind::Property)))
}

fn accessor(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    modifiers(parser, proxy)?;
    parser.expect(proxy, SymbolKind::Other)?;

    if parser.at(SymbolKind::Semicolon) {
        parser.bump(proxy)?;
    } else {
        let body = stmts::block(parser)?;
        proxy.push(body);
    }
    Ok(())
}

fn dotted_name(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    parser.expect(proxy, SymbolKind::Other)?;
    while parser.at(SymbolKind::Dot) {
        parser.bump(proxy)?;
        parser.expect(proxy, SymbolKind::Other)?;
    }
    Ok(())
}

/// Consumes one type reference: a dotted name with optional generic
/// argument lists and array brackets.
pub(super) fn type_tokens(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    parser.expect(proxy, SymbolKind::Other)?;

    loop {
        if parser.at(SymbolKind::Dot) {
            parser.bump(proxy)?;
            parser.expect(proxy, SymbolKind::Other)?;
        } else if parser.at(SymbolKind::LessThan) {
            generic_bracket_list(parser, proxy)?;
        } else if parser.at(SymbolKind::OpenSquareBracket) {
            let open = parser.bump(proxy)?;
            let close = parser.expect(proxy, SymbolKind::CloseSquareBracket)?;
            parser.tree.set_matching_brackets(open, close);
        } else {
            return Ok(());
        }
    }
}

/// `<...>` holding type parameters or arguments. The angle symbols become
/// generic-bracket tokens and are registered as a matched pair.
fn generic_bracket_list(parser: &mut Parser<'_>, proxy: &mut Proxy) -> Result<()> {
    let open = parser.bump_as(proxy, TokenKind::OpenGenericBracket)?;

    loop {
        type_tokens(parser, proxy)?;
        if parser.at(SymbolKind::Comma) {
            parser.bump(proxy)?;
            continue;
        }
        break;
    }

    if !parser.at(SymbolKind::GreaterThan) {
        return Err(parser.unexpected());
    }
    let close = parser.bump_as(proxy, TokenKind::CloseGenericBracket)?;
    parser.tree.set_matching_brackets(open, close);
    Ok(())
}
