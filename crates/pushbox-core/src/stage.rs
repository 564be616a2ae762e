//! Retained display tree.
//!
//! The stage is a slab of nodes with parent/child links. Components that
//! render own a [`NodeId`] and manipulate it through the stage; nothing in
//! the core ever draws. A renderer (or a test) walks the tree and interprets
//! the node kinds however it likes.
//!
//! A node is only *visible on screen* when it is attached, transitively,
//! under the root container. Detached subtrees keep their state and can be
//! re-attached later, which is how scene activation works.

use tracing::warn;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Handle to a node in the display tree.
///
/// Ids are slab indices and are reused after [`Stage::destroy`]; holders must
/// drop their handle once they destroy the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// What a display node represents.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure grouping node; carries children and a transform, draws nothing.
    Container,
    /// A textured quad showing one frame of an asset.
    Sprite {
        /// Asset name the texture comes from.
        texture: String,
        /// Frame index within the asset, for sheet-based sprites.
        frame: u32,
    },
    /// A text label.
    Text {
        /// The string currently displayed.
        content: String,
    },
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    x: f32,
    y: f32,
    visible: bool,
    alpha: f32,
}

/// The display tree. One per [`crate::context::GameContext`].
pub struct Stage {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// Create a stage containing only the root container.
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Container,
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            visible: true,
            alpha: 1.0,
        };
        Self {
            nodes: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// The root container every visible node hangs off.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a detached node of the given kind.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            visible: true,
            alpha: 1.0,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = Some(node);
                NodeId(idx)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId((self.nodes.len() - 1) as u32)
            }
        }
    }

    /// Attach `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.exists(parent) || !self.exists(child) {
            warn!(?parent, ?child, "attach: invalid node pair");
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Remove `child` from its parent, leaving the subtree intact.
    pub fn detach(&mut self, child: NodeId) {
        let parent = match self.node(child) {
            Some(n) => n.parent,
            None => return,
        };
        if let Some(p) = parent {
            if let Some(pn) = self.node_mut(p) {
                pn.children.retain(|c| *c != child);
            }
        }
        if let Some(n) = self.node_mut(child) {
            n.parent = None;
        }
    }

    /// Destroy a node and its entire subtree, returning the slots to the
    /// free list. Destroying the root is refused.
    pub fn destroy(&mut self, id: NodeId) {
        if id == self.root {
            warn!("destroy: refusing to destroy the stage root");
            return;
        }
        if !self.exists(id) {
            return;
        }
        self.detach(id);
        let mut pending = vec![id];
        while let Some(cur) = pending.pop() {
            if let Some(node) = self.nodes[cur.index()].take() {
                pending.extend(node.children);
                self.free.push(cur.0);
            }
        }
    }

    /// Whether `id` refers to a live node.
    pub fn exists(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.index())
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Whether `id` is reachable from the root, i.e. would be drawn.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.node(cur).and_then(|n| n.parent) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Position a node in its parent's coordinate space.
    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) {
        if let Some(n) = self.node_mut(id) {
            n.x = x;
            n.y = y;
        }
    }

    /// A node's position in its parent's coordinate space.
    pub fn position(&self, id: NodeId) -> (f32, f32) {
        self.node(id).map(|n| (n.x, n.y)).unwrap_or((0.0, 0.0))
    }

    /// Show or hide a node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(n) = self.node_mut(id) {
            n.visible = visible;
        }
    }

    /// Whether the node itself is flagged visible (ignores ancestors).
    pub fn visible(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.visible).unwrap_or(false)
    }

    /// Set a node's opacity in `[0, 1]`.
    pub fn set_alpha(&mut self, id: NodeId, alpha: f32) {
        if let Some(n) = self.node_mut(id) {
            n.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    /// A node's opacity.
    pub fn alpha(&self, id: NodeId) -> f32 {
        self.node(id).map(|n| n.alpha).unwrap_or(0.0)
    }

    /// Replace the frame of a sprite node. Non-sprite nodes are left alone.
    pub fn set_frame(&mut self, id: NodeId, new_frame: u32) {
        if let Some(n) = self.node_mut(id) {
            if let NodeKind::Sprite { frame, .. } = &mut n.kind {
                *frame = new_frame;
            }
        }
    }

    /// Replace the content of a text node. Non-text nodes are left alone.
    pub fn set_text(&mut self, id: NodeId, new_content: &str) {
        if let Some(n) = self.node_mut(id) {
            if let NodeKind::Text { content } = &mut n.kind {
                *content = new_content.to_owned();
            }
        }
    }

    /// A node's kind, cloned.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind.clone())
    }

    /// The children of a node, in attach order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(|slot| slot.as_mut())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_makes_nodes_reachable_from_root() {
        let mut stage = Stage::new();
        let group = stage.create(NodeKind::Container);
        let sprite = stage.create(NodeKind::Sprite {
            texture: "hero.png".into(),
            frame: 0,
        });

        stage.attach(group, sprite);
        assert!(!stage.is_attached(sprite));

        stage.attach(stage.root(), group);
        assert!(stage.is_attached(sprite));

        stage.detach(group);
        assert!(!stage.is_attached(sprite));
        // Detaching keeps the subtree intact.
        assert_eq!(stage.children(group), vec![sprite]);
    }

    #[test]
    fn reattach_moves_between_parents() {
        let mut stage = Stage::new();
        let a = stage.create(NodeKind::Container);
        let b = stage.create(NodeKind::Container);
        let child = stage.create(NodeKind::Container);

        stage.attach(a, child);
        stage.attach(b, child);

        assert!(stage.children(a).is_empty());
        assert_eq!(stage.children(b), vec![child]);
    }

    #[test]
    fn destroy_frees_the_whole_subtree() {
        let mut stage = Stage::new();
        let group = stage.create(NodeKind::Container);
        let child = stage.create(NodeKind::Container);
        stage.attach(stage.root(), group);
        stage.attach(group, child);

        stage.destroy(group);
        assert!(!stage.exists(group));
        assert!(!stage.exists(child));
        assert!(stage.children(stage.root()).is_empty());
    }

    #[test]
    fn destroyed_slots_are_reused() {
        let mut stage = Stage::new();
        let a = stage.create(NodeKind::Container);
        stage.destroy(a);
        let b = stage.create(NodeKind::Container);
        assert_eq!(a, b);
    }

    #[test]
    fn root_cannot_be_destroyed() {
        let mut stage = Stage::new();
        stage.destroy(stage.root());
        assert!(stage.exists(stage.root()));
    }

    #[test]
    fn sprite_frame_and_text_content_are_mutable() {
        let mut stage = Stage::new();
        let s = stage.create(NodeKind::Sprite {
            texture: "tiles.png".into(),
            frame: 0,
        });
        let t = stage.create(NodeKind::Text {
            content: "Moves: 0".into(),
        });

        stage.set_frame(s, 7);
        stage.set_text(t, "Moves: 3");

        assert_eq!(
            stage.kind(s),
            Some(NodeKind::Sprite {
                texture: "tiles.png".into(),
                frame: 7
            })
        );
        assert_eq!(
            stage.kind(t),
            Some(NodeKind::Text {
                content: "Moves: 3".into()
            })
        );
    }

    #[test]
    fn alpha_is_clamped() {
        let mut stage = Stage::new();
        let n = stage.create(NodeKind::Container);
        stage.set_alpha(n, 1.7);
        assert_eq!(stage.alpha(n), 1.0);
        stage.set_alpha(n, -0.2);
        assert_eq!(stage.alpha(n), 0.0);
    }
}
