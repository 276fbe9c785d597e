//! The recursive-descent code parser.
//!
//! One call parses one source unit into a [`Document`]: the symbol stream
//! comes from `sharplint-lexer` with conditional compilation already
//! resolved, and the tree is built bottom-up through proxies. Parsing is
//! single-threaded and fail-fast; the first syntax error aborts the parse.

mod grammar;
mod parser;

use parser::Parser;
use sharplint_errors::Result;
use sharplint_lexer::Definitions;
use sharplint_tree::Document;

/// Parses `text` into a full-fidelity document tree.
///
/// `name` identifies the source unit in diagnostics and the document.
/// `definitions` seeds the preprocessor symbol set for conditional
/// compilation.
pub fn parse(text: &str, name: &str, definitions: &Definitions) -> Result<Document> {
    let mut parser = Parser::new(text, definitions)?;
    let root = grammar::document(&mut parser)?;

    let mut tree = parser.into_tree();
    tree.set_root(root);
    Ok(Document::new(name, tree))
}
