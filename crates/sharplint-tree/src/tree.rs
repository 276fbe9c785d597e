use std::cell::Cell;
use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use sharplint_span::{Location, TextRange};

use crate::arena::{Arena, Idx};
use crate::attributes::AttributeCaches;
use crate::kind::{CodeUnitKind, ElementKind, TokenKind};

/// Stable identifier of a code unit within its tree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(pub(crate) Idx<NodeData>);

/// The uniform record every code unit shares, whatever its kind.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: CodeUnitKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) previous_sibling: Option<NodeId>,
    pub(crate) range: TextRange,
    pub(crate) location: Location,
    pub(crate) generated: bool,
    pub(crate) caches: AttributeCaches,
}

/// A full-fidelity tree over one source unit.
///
/// Leaves are tokens and lexical elements whose text is sliced from the
/// document text by range; interior nodes span exactly their descendants.
/// Structural edits bump the edit version, which stamps every memoized
/// attribute cell.
#[derive(Debug)]
pub struct CodeUnitTree {
    nodes: Arena<NodeData>,
    root: Option<NodeId>,
    text: String,
    version: u64,
    bracket_pairs: FxHashMap<NodeId, NodeId>,
    recomputations: Cell<u64>,
}

impl CodeUnitTree {
    pub fn new(text: String) -> Self {
        Self {
            nodes: Arena::default(),
            root: None,
            text,
            version: 0,
            bracket_pairs: FxHashMap::default(),
            recomputations: Cell::new(0),
        }
    }

    /// The document root. Panics if the tree was never sealed, which is a
    /// defect in the building parser.
    pub fn root(&self) -> NodeId {
        match self.root {
            Some(root) => root,
            None => panic!("tree has no root"),
        }
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn source_text(&self) -> &str {
        &self.text
    }

    /// The version stamp invalidating memoized attributes. Bumped by every
    /// structural edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// How many attribute recomputations have run. Repeated reads of an
    /// unedited tree must not move this counter.
    pub fn recomputation_count(&self) -> u64 {
        self.recomputations.get()
    }

    pub(crate) fn note_recomputation(&self) {
        self.recomputations.set(self.recomputations.get() + 1);
    }

    pub fn kind(&self, node: NodeId) -> CodeUnitKind {
        self.nodes[node.0].kind
    }

    pub fn range(&self, node: NodeId) -> TextRange {
        self.nodes[node.0].range
    }

    pub fn location(&self, node: NodeId) -> Location {
        self.nodes[node.0].location
    }

    pub fn line_number(&self, node: NodeId) -> u32 {
        self.nodes[node.0].location.line_number
    }

    pub fn is_generated(&self, node: NodeId) -> bool {
        self.nodes[node.0].generated
    }

    /// The exact source text this unit spans.
    pub fn text(&self, node: NodeId) -> &str {
        let range = self.nodes[node.0].range;
        &self.text[usize::from(range.start())..usize::from(range.end())]
    }

    pub fn token_kind(&self, node: NodeId) -> Option<TokenKind> {
        self.kind(node).token()
    }

    pub fn element_kind(&self, node: NodeId) -> Option<ElementKind> {
        self.kind(node).element()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element_kind(node).is_some()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].first_child
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].last_child
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].next_sibling
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].previous_sibling
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.first_child(node), |&child| self.next_sibling(child))
    }

    /// The nearest enclosing element, the unit itself included.
    pub fn enclosing_element(&self, node: NodeId) -> Option<NodeId> {
        std::iter::successors(Some(node), |&unit| self.parent(unit))
            .find(|&unit| self.is_element(unit))
    }

    /// The first leaf under `node`, or `node` itself when it has no children.
    pub fn first_descendant(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(child) = self.first_child(current) {
            current = child;
        }
        current
    }

    /// The last leaf under `node`, or `node` itself when it has no children.
    pub fn last_descendant(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(child) = self.last_child(current) {
            current = child;
        }
        current
    }

    /// The next leaf in document order after `node`, staying inside the
    /// subtree rooted at `root`.
    pub fn next_descendant_of(&self, root: NodeId, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            if let Some(sibling) = self.next_sibling(current) {
                return Some(self.first_descendant(sibling));
            }
            current = self.parent(current)?;
            if current == root {
                return None;
            }
        }
    }

    /// All leaves of the subtree rooted at `node`, in document order.
    pub fn descendant_leaves(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.first_child(node).map(|_| self.first_descendant(node));
        std::iter::successors(first, move |&leaf| self.next_descendant_of(node, leaf))
    }

    /// Allocates an unlinked leaf. Tokens and lexical elements enter the
    /// tree through here and get linked when their parent's proxy seals.
    pub fn alloc_leaf(
        &mut self,
        kind: CodeUnitKind,
        range: TextRange,
        location: Location,
        generated: bool,
    ) -> NodeId {
        NodeId(self.nodes.alloc(NodeData {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            previous_sibling: None,
            range,
            location,
            generated,
            caches: AttributeCaches::default(),
        }))
    }

    /// Links `children` in order under a new node and returns its id. The
    /// node spans from the first child to the last; an empty child list
    /// yields an empty span at the start of the text.
    pub(crate) fn seal_node(&mut self, kind: CodeUnitKind, children: &[NodeId]) -> NodeId {
        let (range, location, generated) = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => (
                TextRange::new(self.range(first).start(), self.range(last).end()),
                self.location(first),
                children.iter().all(|&child| self.nodes[child.0].generated),
            ),
            _ => (TextRange::empty(0.into()), Location::FIRST, false),
        };

        let node = NodeId(self.nodes.alloc(NodeData {
            kind,
            parent: None,
            first_child: children.first().copied(),
            last_child: children.last().copied(),
            next_sibling: None,
            previous_sibling: None,
            range,
            location,
            generated,
            caches: AttributeCaches::default(),
        }));

        let mut previous: Option<NodeId> = None;
        for &child in children {
            let data = &mut self.nodes[child.0];
            debug_assert!(data.parent.is_none(), "child already linked");
            data.parent = Some(node);
            data.previous_sibling = previous;
            data.next_sibling = None;
            if let Some(previous) = previous {
                self.nodes[previous.0].next_sibling = Some(child);
            }
            previous = Some(child);
        }

        node
    }

    /// Records that `open` and `close` delimit one bracketed region.
    pub fn set_matching_brackets(&mut self, open: NodeId, close: NodeId) {
        self.bracket_pairs.insert(open, close);
        self.bracket_pairs.insert(close, open);
    }

    /// The bracket paired with `node`, if `node` is a matched bracket token.
    pub fn matching_bracket(&self, node: NodeId) -> Option<NodeId> {
        self.bracket_pairs.get(&node).copied()
    }

    /// Unlinks `node` from its parent and siblings. The subtree below it
    /// stays intact but is no longer reachable from the root. Bumps the edit
    /// version so memoized attributes recompute on next read.
    pub fn detach(&mut self, node: NodeId) {
        assert!(Some(node) != self.root, "cannot detach the root");

        let (parent, previous, next) = {
            let data = &self.nodes[node.0];
            (data.parent, data.previous_sibling, data.next_sibling)
        };

        match previous {
            Some(previous) => self.nodes[previous.0].next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.0].first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.nodes[next.0].previous_sibling = previous,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.0].last_child = previous;
                }
            }
        }

        let data = &mut self.nodes[node.0];
        data.parent = None;
        data.previous_sibling = None;
        data.next_sibling = None;

        self.version += 1;
    }

    pub(crate) fn caches(&self, node: NodeId) -> &AttributeCaches {
        &self.nodes[node.0].caches
    }
}

/// A parsed source unit: the tree plus the name it was read from.
#[derive(Debug)]
pub struct Document {
    name: String,
    tree: CodeUnitTree,
}

impl Document {
    pub fn new(name: impl Into<String>, tree: CodeUnitTree) -> Self {
        Self { name: name.into(), tree }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &CodeUnitTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CodeUnitTree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// An indented dump of the tree for tests: one line per unit, leaves
    /// followed by their quoted text.
    pub fn debug_tree(&self) -> String {
        let mut output = String::new();
        self.dump(self.tree.root(), 0, &mut output);
        output
    }

    fn dump(&self, node: NodeId, depth: usize, output: &mut String) {
        let tree = &self.tree;
        let indent = "  ".repeat(depth);

        if tree.first_child(node).is_none() && !tree.is_element(node) {
            _ = writeln!(output, "{indent}{:?} {:?}", tree.kind(node), tree.text(node));
            return;
        }

        _ = writeln!(output, "{indent}{:?}", tree.kind(node));
        for child in tree.children(node) {
            self.dump(child, depth + 1, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use sharplint_span::TextSize;

    use super::*;
    use crate::kind::CodeUnitCategory;

    fn leaf(tree: &mut CodeUnitTree, kind: TokenKind, start: u32, end: u32) -> NodeId {
        let range = TextRange::new(TextSize::new(start), TextSize::new(end));
        tree.alloc_leaf(CodeUnitKind::Token(kind), range, Location::FIRST, false)
    }

    #[test]
    fn sealing_links_children_in_order() {
        let mut tree = CodeUnitTree::new("a b".into());
        let a = leaf(&mut tree, TokenKind::Literal, 0, 1);
        let space = leaf(&mut tree, TokenKind::Literal, 1, 2);
        let b = leaf(&mut tree, TokenKind::Literal, 2, 3);
        let root = tree.seal_node(CodeUnitKind::Element(ElementKind::Document), &[a, space, b]);
        tree.set_root(root);

        assert_eq!(tree.first_child(root), Some(a));
        assert_eq!(tree.last_child(root), Some(b));
        assert_eq!(tree.next_sibling(a), Some(space));
        assert_eq!(tree.previous_sibling(b), Some(space));
        assert_eq!(tree.parent(space), Some(root));
        assert_eq!(tree.children(root).collect::<Vec<_>>(), [a, space, b]);
        assert_eq!(tree.first_descendant(root), a);
        assert_eq!(tree.last_descendant(root), b);
        assert_eq!(tree.text(b), "b");
        assert_eq!(tree.source_text(), "a b");
        assert_eq!(tree.kind(root).category(), CodeUnitCategory::Element);
        assert_eq!(tree.kind(a).category(), CodeUnitCategory::Token);
    }

    #[test]
    fn detaching_a_middle_child_relinks_its_neighbors() {
        let mut tree = CodeUnitTree::new("abc".into());
        let a = leaf(&mut tree, TokenKind::Literal, 0, 1);
        let b = leaf(&mut tree, TokenKind::Literal, 1, 2);
        let c = leaf(&mut tree, TokenKind::Literal, 2, 3);
        let root = tree.seal_node(CodeUnitKind::Element(ElementKind::Document), &[a, b, c]);
        tree.set_root(root);

        let before = tree.version();
        tree.detach(b);

        assert_eq!(tree.children(root).collect::<Vec<_>>(), [a, c]);
        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.previous_sibling(c), Some(a));
        assert_eq!(tree.parent(b), None);
        assert!(tree.version() > before);
    }

    #[test]
    fn matching_brackets_are_recorded_both_ways() {
        let mut tree = CodeUnitTree::new("()".into());
        let open = leaf(&mut tree, TokenKind::OpenParenthesis, 0, 1);
        let close = leaf(&mut tree, TokenKind::CloseParenthesis, 1, 2);
        let root = tree.seal_node(CodeUnitKind::Element(ElementKind::Document), &[open, close]);
        tree.set_root(root);
        tree.set_matching_brackets(open, close);

        assert_eq!(tree.matching_bracket(open), Some(close));
        assert_eq!(tree.matching_bracket(close), Some(open));
        assert_eq!(tree.matching_bracket(root), None);
    }
}
