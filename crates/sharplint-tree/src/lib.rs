//! The full-fidelity code unit tree and its derived attributes.
//!
//! Every character of the analyzed file lives in exactly one leaf, so
//! concatenating the leaves of the root reproduces the input. Interior
//! nodes are built through [`Proxy`] staging areas and sealed bottom-up;
//! derived attributes are memoized per node and invalidated by the tree's
//! edit version.

mod arena;
mod attributes;
mod kind;
mod proxy;
mod tree;

pub use attributes::{AccessModifier, Modifiers};
pub use kind::{
    CodeUnitCategory, CodeUnitKind, ElementKind, ExpressionKind, LexicalElementKind, StatementKind,
    TokenKind,
};
pub use proxy::Proxy;
pub use tree::{CodeUnitTree, Document, NodeId};
