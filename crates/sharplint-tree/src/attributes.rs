//! Derived attributes of code units.
//!
//! Everything here is computed on demand from the tree structure and
//! memoized per node. Each cached value is stamped with the tree's edit
//! version; a structural edit bumps the version and the next read
//! recomputes. Repeated reads of an unedited tree hit the cache, which the
//! recomputation counter makes observable in tests.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use sharplint_errors::{Result, SyntaxError};

use crate::kind::{CodeUnitKind, ElementKind, TokenKind};
use crate::tree::{CodeUnitTree, NodeId};

/// The accessibility lattice.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AccessModifier {
    Public,
    ProtectedInternal,
    Protected,
    Internal,
    ProtectedAndInternal,
    Private,
}

/// The modifiers written on a declaration.
#[derive(Debug, Eq, PartialEq)]
pub struct Modifiers {
    /// The access spelled out by keywords, `None` when the declaration
    /// relies on its element kind's default.
    pub access: Option<AccessModifier>,
    tokens: FxHashSet<TokenKind>,
}

impl Modifiers {
    pub fn contains(&self, kind: TokenKind) -> bool {
        self.tokens.contains(&kind)
    }
}

/// One memoized slot, stamped by the edit version it was computed under.
pub(crate) struct CacheCell<T> {
    slot: RefCell<Option<(u64, T)>>,
}

impl<T> Default for CacheCell<T> {
    fn default() -> Self {
        Self { slot: RefCell::new(None) }
    }
}

impl<T> std::fmt::Debug for CacheCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CacheCell")
    }
}

impl<T: Clone> CacheCell<T> {
    fn get_or_compute(&self, version: u64, compute: impl FnOnce() -> T) -> T {
        if let Some((stamp, value)) = &*self.slot.borrow()
            && *stamp == version
        {
            return value.clone();
        }

        let value = compute();
        *self.slot.borrow_mut() = Some((version, value.clone()));
        value
    }
}

/// The per-node cache block embedded in every node record.
#[derive(Debug, Default)]
pub(crate) struct AttributeCaches {
    modifiers: CacheCell<Result<Rc<Modifiers>>>,
    effective_access: CacheCell<Result<AccessModifier>>,
    qualified_name: CacheCell<Option<Rc<str>>>,
}

impl CodeUnitTree {
    /// The modifiers written on an element's declaration.
    ///
    /// Scans the declaration tokens in order: access keywords compose into
    /// the declared access, tokens from the element kind's allowed set are
    /// collected, and the first token outside either group ends the scan.
    /// A second `public` or `private`, or an access keyword conflicting
    /// with one already seen, is a syntax error naming the offending line.
    pub fn declaration_modifiers(&self, element: NodeId) -> Result<Rc<Modifiers>> {
        self.caches(element).modifiers.get_or_compute(self.version(), || {
            self.note_recomputation();
            self.gather_modifiers(element).map(Rc::new)
        })
    }

    fn gather_modifiers(&self, element: NodeId) -> Result<Modifiers> {
        let Some(kind) = self.element_kind(element) else {
            return Ok(Modifiers { access: None, tokens: FxHashSet::default() });
        };

        let allowed = kind.allowed_modifiers();
        let mut access = None;
        let mut tokens = FxHashSet::default();

        for child in self.children(element) {
            if self.kind(child).is_trivia() || self.kind(child) == CodeUnitKind::Attribute {
                continue;
            }
            let Some(token) = self.token_kind(child) else { break };

            let conflict = || {
                SyntaxError::new(
                    format!("conflicting access modifier `{}`", self.text(child)),
                    self.line_number(child),
                    self.range(child),
                )
            };

            match token {
                TokenKind::Public => match access {
                    None => access = Some(AccessModifier::Public),
                    Some(_) => return Err(conflict()),
                },
                TokenKind::Private => match access {
                    None => access = Some(AccessModifier::Private),
                    Some(_) => return Err(conflict()),
                },
                TokenKind::Protected => match access {
                    None => access = Some(AccessModifier::Protected),
                    Some(AccessModifier::Internal) => {
                        access = Some(AccessModifier::ProtectedInternal);
                    }
                    Some(_) => return Err(conflict()),
                },
                TokenKind::Internal => match access {
                    None => access = Some(AccessModifier::Internal),
                    Some(AccessModifier::Protected) => {
                        access = Some(AccessModifier::ProtectedInternal);
                    }
                    Some(_) => return Err(conflict()),
                },
                _ if allowed.contains(&token) => {
                    tokens.insert(token);
                }
                _ => break,
            }
        }

        Ok(Modifiers { access, tokens })
    }

    /// The access level the declaration spells out, or the element kind's
    /// default when no access keyword is written.
    pub fn declared_access(&self, element: NodeId) -> Result<AccessModifier> {
        let default = match self.element_kind(element) {
            Some(kind) => kind.default_access(),
            None => AccessModifier::Private,
        };
        Ok(self.declaration_modifiers(element)?.access.unwrap_or(default))
    }

    /// The access level of an element as seen from outside, folding the
    /// declared access of every enclosing element through the lattice.
    pub fn effective_access(&self, element: NodeId) -> Result<AccessModifier> {
        self.caches(element).effective_access.get_or_compute(self.version(), || {
            self.note_recomputation();
            self.compute_effective_access(element)
        })
    }

    fn compute_effective_access(&self, element: NodeId) -> Result<AccessModifier> {
        if self.element_kind(element) == Some(ElementKind::Document) {
            return Ok(AccessModifier::Public);
        }

        let own = self.declared_access(element)?;
        let Some(parent) = self.parent(element).and_then(|parent| self.enclosing_element(parent))
        else {
            return Ok(own);
        };

        Ok(restrict_access(own, self.effective_access(parent)?))
    }

    /// The dotted path of an element from the top of the file, the document
    /// root excluded. `None` for unnamed elements.
    pub fn qualified_name(&self, element: NodeId) -> Option<Rc<str>> {
        self.caches(element).qualified_name.get_or_compute(self.version(), || {
            self.note_recomputation();
            self.compute_qualified_name(element)
        })
    }

    fn compute_qualified_name(&self, element: NodeId) -> Option<Rc<str>> {
        if self.element_kind(element)? == ElementKind::Document {
            return None;
        }

        let name = self.name(element)?;
        let parent = self
            .parent(element)
            .and_then(|parent| self.enclosing_element(parent))
            .and_then(|parent| self.qualified_name(parent));

        match parent {
            Some(parent) => Some(format!("{parent}.{name}").into()),
            None => Some(name.into()),
        }
    }

    /// The short name of an element, located by its kind's declaration
    /// shape. Whitespace never appears in the result because trivia are
    /// separate units.
    pub fn name(&self, element: NodeId) -> Option<String> {
        let kind = self.element_kind(element)?;

        let tokens =
            || self.children(element).filter_map(|child| Some((child, self.token_kind(child)?)));

        match kind {
            ElementKind::Document => None,
            ElementKind::Namespace | ElementKind::UsingDirective => {
                // The dotted name after the keyword.
                let mut name = String::new();
                for (child, token) in tokens().skip(1) {
                    match token {
                        TokenKind::Literal | TokenKind::Dot => name.push_str(self.text(child)),
                        _ => break,
                    }
                }
                (!name.is_empty()).then_some(name)
            }
            ElementKind::Class | ElementKind::Struct | ElementKind::Interface | ElementKind::Enum => {
                let mut seen_keyword = false;
                for (child, token) in tokens() {
                    match token {
                        TokenKind::Class
                        | TokenKind::Struct
                        | TokenKind::Interface
                        | TokenKind::Enum => seen_keyword = true,
                        TokenKind::Literal if seen_keyword => {
                            return Some(self.text(child).to_string());
                        }
                        _ => {}
                    }
                }
                None
            }
            ElementKind::Method => {
                // The identifier right before the parameter list.
                let mut last = None;
                for (child, token) in tokens() {
                    match token {
                        TokenKind::Literal => last = Some(child),
                        TokenKind::OpenParenthesis => break,
                        _ => {}
                    }
                }
                last.map(|child| self.text(child).to_string())
            }
            ElementKind::Field => {
                let mut last = None;
                for (child, token) in tokens() {
                    match token {
                        TokenKind::Literal => last = Some(child),
                        TokenKind::Equals | TokenKind::Semicolon => break,
                        _ => {}
                    }
                }
                last.map(|child| self.text(child).to_string())
            }
            ElementKind::Property => {
                let mut last = None;
                for (child, token) in tokens() {
                    match token {
                        TokenKind::Literal => last = Some(child),
                        TokenKind::OpenCurlyBracket => break,
                        _ => {}
                    }
                }
                last.map(|child| self.text(child).to_string())
            }
            ElementKind::EnumItem => tokens()
                .find(|(_, token)| *token == TokenKind::Literal)
                .map(|(child, _)| self.text(child).to_string()),
        }
    }

    /// The first token of an element's declaration, attribute blocks
    /// skipped.
    pub fn first_declaration_token(&self, element: NodeId) -> Option<NodeId> {
        self.descendant_leaves(element).find(|&leaf| {
            self.token_kind(leaf).is_some() && !self.inside_attribute(element, leaf)
        })
    }

    /// The last token of an element's declaration: the token before the
    /// body's `{`, the terminating `;`, or an initializer's `=`. Matched
    /// bracket pairs in the declaration are jumped over, so a parameter
    /// list or generic parameter list never terminates the scan early.
    pub fn last_declaration_token(&self, element: NodeId) -> Option<NodeId> {
        let mut current = self.first_declaration_token(element)?;
        let mut last = current;

        loop {
            if let Some(kind) = self.token_kind(current) {
                match kind {
                    TokenKind::OpenCurlyBracket | TokenKind::Semicolon | TokenKind::Equals => break,
                    _ => {}
                }
                last = current;
                if kind.is_open_bracket()
                    && let Some(close) = self.matching_bracket(current)
                {
                    last = close;
                    current = close;
                }
            }
            match self.next_descendant_of(element, current) {
                Some(next) => current = next,
                None => break,
            }
        }

        Some(last)
    }

    fn inside_attribute(&self, root: NodeId, leaf: NodeId) -> bool {
        std::iter::successors(self.parent(leaf), |&node| self.parent(node))
            .take_while(|&node| node != root)
            .any(|node| self.kind(node) == CodeUnitKind::Attribute)
    }

    /// Whether the element is inside an unsafe context: its own `unsafe`
    /// modifier or one inherited from an enclosing element.
    pub fn is_unsafe(&self, element: NodeId) -> Result<bool> {
        if self.declaration_modifiers(element)?.contains(TokenKind::Unsafe) {
            return Ok(true);
        }
        match self.parent(element).and_then(|parent| self.enclosing_element(parent)) {
            Some(parent) => self.is_unsafe(parent),
            None => Ok(false),
        }
    }
}

/// Folds an element's declared access through its parent's effective
/// access, producing the tightest level an outside observer sees.
fn restrict_access(own: AccessModifier, parent: AccessModifier) -> AccessModifier {
    use AccessModifier::*;

    if own == Private {
        return Private;
    }

    match parent {
        Public => own,
        ProtectedInternal => match own {
            Public => ProtectedInternal,
            _ => own,
        },
        Protected => match own {
            Public | ProtectedInternal => Protected,
            Internal => ProtectedAndInternal,
            _ => own,
        },
        Internal => match own {
            Public | ProtectedInternal => Internal,
            Protected => ProtectedAndInternal,
            _ => own,
        },
        ProtectedAndInternal => match own {
            Public | ProtectedInternal | Protected | Internal => ProtectedAndInternal,
            _ => own,
        },
        Private => Private,
    }
}

#[cfg(test)]
mod tests {
    use sharplint_span::{Location, TextRange, TextSize};

    use super::*;
    use crate::kind::LexicalElementKind;

    fn leaf(tree: &mut CodeUnitTree, kind: CodeUnitKind, start: u32, end: u32) -> NodeId {
        tree.alloc_leaf(
            kind,
            TextRange::new(TextSize::new(start), TextSize::new(end)),
            Location::new(TextSize::new(start), start, 1),
            false,
        )
    }

    fn token(tree: &mut CodeUnitTree, kind: TokenKind, start: u32, end: u32) -> NodeId {
        leaf(tree, CodeUnitKind::Token(kind), start, end)
    }

    fn space(tree: &mut CodeUnitTree, at: u32) -> NodeId {
        leaf(tree, CodeUnitKind::LexicalElement(LexicalElementKind::WhiteSpace), at, at + 1)
    }

    /// `public class C { }` with the class sealed under a document root.
    fn class_document() -> (CodeUnitTree, NodeId) {
        let mut tree = CodeUnitTree::new("public class C { }".to_string());

        let children = vec![
            token(&mut tree, TokenKind::Public, 0, 6),
            space(&mut tree, 6),
            token(&mut tree, TokenKind::Class, 7, 12),
            space(&mut tree, 12),
            token(&mut tree, TokenKind::Literal, 13, 14),
            space(&mut tree, 14),
            token(&mut tree, TokenKind::OpenCurlyBracket, 15, 16),
            space(&mut tree, 16),
            token(&mut tree, TokenKind::CloseCurlyBracket, 17, 18),
        ];
        let class = tree.seal_node(CodeUnitKind::Element(ElementKind::Class), &children);
        let root = tree.seal_node(CodeUnitKind::Element(ElementKind::Document), &[class]);
        tree.set_root(root);

        (tree, class)
    }

    #[test]
    fn declared_access_reads_the_keyword() {
        let (tree, class) = class_document();
        assert_eq!(tree.declared_access(class).unwrap(), AccessModifier::Public);
        assert_eq!(tree.effective_access(class).unwrap(), AccessModifier::Public);
        assert_eq!(tree.name(class).as_deref(), Some("C"));
        assert_eq!(tree.qualified_name(class).as_deref(), Some("C"));
    }

    #[test]
    fn repeated_reads_hit_the_cache() {
        let (tree, class) = class_document();

        tree.effective_access(class).unwrap();
        let settled = tree.recomputation_count();

        tree.effective_access(class).unwrap();
        tree.effective_access(class).unwrap();
        assert_eq!(tree.recomputation_count(), settled);
    }

    #[test]
    fn detaching_a_modifier_invalidates_the_cache() {
        let (mut tree, class) = class_document();

        assert_eq!(tree.effective_access(class).unwrap(), AccessModifier::Public);

        let public = tree.first_child(class).unwrap();
        assert_eq!(tree.token_kind(public), Some(TokenKind::Public));
        tree.detach(public);

        assert_eq!(tree.declared_access(class).unwrap(), AccessModifier::Private);
        assert_eq!(tree.effective_access(class).unwrap(), AccessModifier::Private);
    }

    #[test]
    fn conflicting_access_keywords_fail() {
        let mut tree = CodeUnitTree::new("public private class C { }".to_string());

        let children = vec![
            token(&mut tree, TokenKind::Public, 0, 6),
            space(&mut tree, 6),
            token(&mut tree, TokenKind::Private, 7, 14),
            space(&mut tree, 14),
            token(&mut tree, TokenKind::Class, 15, 20),
            space(&mut tree, 20),
            token(&mut tree, TokenKind::Literal, 21, 22),
        ];
        let class = tree.seal_node(CodeUnitKind::Element(ElementKind::Class), &children);
        let root = tree.seal_node(CodeUnitKind::Element(ElementKind::Document), &[class]);
        tree.set_root(root);

        let error = tree.declaration_modifiers(class).unwrap_err();
        assert!(error.message().contains("private"));
        assert_eq!(error.line_number(), 1);
    }

    #[test]
    fn protected_and_internal_compose_in_either_order() {
        for (first, second) in
            [(TokenKind::Protected, TokenKind::Internal), (TokenKind::Internal, TokenKind::Protected)]
        {
            let mut tree = CodeUnitTree::new("protected internal class C".to_string());
            let children = vec![
                token(&mut tree, first, 0, 9),
                space(&mut tree, 9),
                token(&mut tree, second, 10, 18),
                space(&mut tree, 18),
                token(&mut tree, TokenKind::Class, 19, 24),
                space(&mut tree, 24),
                token(&mut tree, TokenKind::Literal, 25, 26),
            ];
            let class = tree.seal_node(CodeUnitKind::Element(ElementKind::Class), &children);
            let root = tree.seal_node(CodeUnitKind::Element(ElementKind::Document), &[class]);
            tree.set_root(root);

            assert_eq!(
                tree.declared_access(class).unwrap(),
                AccessModifier::ProtectedInternal
            );
        }
    }

    #[test]
    fn restriction_follows_the_lattice() {
        use AccessModifier::*;

        assert_eq!(restrict_access(Public, Public), Public);
        assert_eq!(restrict_access(Public, Internal), Internal);
        assert_eq!(restrict_access(Public, Protected), Protected);
        assert_eq!(restrict_access(Internal, Protected), ProtectedAndInternal);
        assert_eq!(restrict_access(Protected, Internal), ProtectedAndInternal);
        assert_eq!(restrict_access(ProtectedInternal, Internal), Internal);
        assert_eq!(restrict_access(Private, Public), Private);
        assert_eq!(restrict_access(Public, Private), Private);
    }

    #[test]
    fn nesting_never_widens_access() {
        use AccessModifier::*;

        for own in [Public, ProtectedInternal, Protected, Internal, ProtectedAndInternal, Private] {
            for parent in
                [Public, ProtectedInternal, Protected, Internal, ProtectedAndInternal, Private]
            {
                let folded = restrict_access(own, parent);
                // Folding twice against the same parent changes nothing.
                assert_eq!(restrict_access(folded, parent), folded);
            }
        }
    }
}
