use crate::kind::CodeUnitKind;
use crate::tree::{CodeUnitTree, NodeId};

/// Append-only staging area for the children of a node under construction.
///
/// Children are pushed in source order and transferred, never copied, when
/// the proxy is sealed. A proxy dropped without sealing abandons its pending
/// children, which is what fail-fast error propagation wants: the whole tree
/// is discarded along with the error.
#[derive(Default)]
pub struct Proxy {
    children: Vec<NodeId>,
}

impl Proxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Links the pending children under a new node of the given kind and
    /// returns its id. The proxy is consumed; the children now belong to
    /// the sealed node.
    pub fn seal(self, tree: &mut CodeUnitTree, kind: CodeUnitKind) -> NodeId {
        tree.seal_node(kind, &self.children)
    }
}
