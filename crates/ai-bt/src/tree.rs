//! Immutable tree assets.
//!
//! A tree is flattened into a pre-order table: every node is followed by its decorators and then
//! by its children's subtrees. The position in the table is the node's execution index.

use std::sync::atomic::{AtomicU64, Ordering};

use ai_core::Variant;
use ai_nav::NavWorldMut;

use crate::bt::{Decorator, Node, NodeId};
use crate::error::{BehaviorError, Result};
use crate::nodes::{Root, Selector, Sequence};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Metadata carried by the root of a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSettings {
    /// Declared blackboard type; `None` accepts any blackboard.
    pub blackboard_type: Option<String>,
    pub blackboard_default: Variant,
    /// Goal types the tree accepts; empty accepts every goal.
    pub goal_types: Vec<String>,
    /// Tree periods per second; `<= 0` updates once per scheduler tick.
    pub update_fps: f32,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            blackboard_type: None,
            blackboard_default: Variant::Null,
            goal_types: Vec::new(),
            update_fps: 10.0,
        }
    }
}

pub(crate) enum NodeKind<W>
where
    W: NavWorldMut + 'static,
{
    Node(Box<dyn Node<W>>),
    Decorator(Box<dyn Decorator<W>>),
}

pub(crate) struct NodeEntry<W>
where
    W: NavWorldMut + 'static,
{
    pub(crate) kind: NodeKind<W>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) decorators: Vec<NodeId>,
}

pub struct BehaviorTree<W>
where
    W: NavWorldMut + 'static,
{
    name: String,
    version: u64,
    root: RootSettings,
    nodes: Vec<NodeEntry<W>>,
}

impl<W> BehaviorTree<W>
where
    W: NavWorldMut + 'static,
{
    pub fn builder(name: impl Into<String>) -> BehaviorTreeBuilder<W> {
        BehaviorTreeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural version; unique per built tree.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn root_settings(&self) -> &RootSettings {
        &self.root
    }

    pub fn root_id(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of execution indices (nodes and decorators).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn entry(&self, id: NodeId) -> Option<&NodeEntry<W>> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&dyn Node<W>> {
        match &self.entry(id)?.kind {
            NodeKind::Node(node) => Some(node.as_ref()),
            NodeKind::Decorator(_) => None,
        }
    }

    pub(crate) fn decorator(&self, id: NodeId) -> Option<&dyn Decorator<W>> {
        match &self.entry(id)?.kind {
            NodeKind::Decorator(decorator) => Some(decorator.as_ref()),
            NodeKind::Node(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn decorators(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map(|e| e.decorators.as_slice()).unwrap_or(&[])
    }

    pub fn is_decorator(&self, id: NodeId) -> bool {
        matches!(
            self.entry(id).map(|e| &e.kind),
            Some(NodeKind::Decorator(_))
        )
    }

    pub fn node_name(&self, id: NodeId) -> Option<&'static str> {
        match &self.entry(id)?.kind {
            NodeKind::Node(node) => Some(node.name()),
            NodeKind::Decorator(decorator) => Some(decorator.name()),
        }
    }
}

/// Declarative description of a node, its decorators and children.
pub struct NodeSpec<W>
where
    W: NavWorldMut + 'static,
{
    node: Box<dyn Node<W>>,
    decorators: Vec<Box<dyn Decorator<W>>>,
    children: Vec<NodeSpec<W>>,
}

impl<W> NodeSpec<W>
where
    W: NavWorldMut + 'static,
{
    pub fn new(node: impl Node<W>) -> Self {
        Self {
            node: Box::new(node),
            decorators: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn sequence(children: Vec<NodeSpec<W>>) -> Self {
        Self::new(Sequence).with_children(children)
    }

    pub fn selector(children: Vec<NodeSpec<W>>) -> Self {
        Self::new(Selector).with_children(children)
    }

    pub fn with_child(mut self, child: NodeSpec<W>) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<NodeSpec<W>>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attach a decorator. Decorators run in attachment order.
    pub fn decorate(mut self, decorator: impl Decorator<W>) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }
}

pub struct BehaviorTreeBuilder<W>
where
    W: NavWorldMut + 'static,
{
    name: String,
    root: RootSettings,
    root_decorators: Vec<Box<dyn Decorator<W>>>,
}

impl<W> BehaviorTreeBuilder<W>
where
    W: NavWorldMut + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: RootSettings::default(),
            root_decorators: Vec::new(),
        }
    }

    pub fn update_fps(mut self, fps: f32) -> Self {
        self.root.update_fps = fps;
        self
    }

    /// Declare the blackboard type and the value new instances start with.
    pub fn blackboard(mut self, type_name: impl Into<String>, default: Variant) -> Self {
        self.root.blackboard_type = Some(type_name.into());
        self.root.blackboard_default = default;
        self
    }

    pub fn goal_type(mut self, type_name: impl Into<String>) -> Self {
        self.root.goal_types.push(type_name.into());
        self
    }

    pub fn decorate_root(mut self, decorator: impl Decorator<W>) -> Self {
        self.root_decorators.push(Box::new(decorator));
        self
    }

    /// Flatten the root and its children into a tree asset.
    pub fn build(self, children: Vec<NodeSpec<W>>) -> Result<BehaviorTree<W>> {
        let root = NodeSpec {
            node: Box::new(Root),
            decorators: self.root_decorators,
            children,
        };
        let mut nodes = Vec::new();
        flatten(root, None, &mut nodes)?;
        let version = NEXT_VERSION.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(tree = %self.name, nodes = nodes.len(), version, "behavior tree built");
        Ok(BehaviorTree {
            name: self.name,
            version,
            root: self.root,
            nodes,
        })
    }
}

fn flatten<W>(
    spec: NodeSpec<W>,
    parent: Option<NodeId>,
    nodes: &mut Vec<NodeEntry<W>>,
) -> Result<NodeId>
where
    W: NavWorldMut + 'static,
{
    if !spec.children.is_empty() && !spec.node.is_compound() {
        return Err(BehaviorError::LeafWithChildren {
            node: spec.node.name().to_string(),
            children: spec.children.len(),
        });
    }

    let id = NodeId(nodes.len() as u32);
    nodes.push(NodeEntry {
        kind: NodeKind::Node(spec.node),
        parent,
        children: Vec::new(),
        decorators: Vec::new(),
    });

    for decorator in spec.decorators {
        let decorator_id = NodeId(nodes.len() as u32);
        nodes.push(NodeEntry {
            kind: NodeKind::Decorator(decorator),
            parent: Some(id),
            children: Vec::new(),
            decorators: Vec::new(),
        });
        nodes[id.index()].decorators.push(decorator_id);
    }

    for child in spec.children {
        let child_id = flatten(child, Some(id), nodes)?;
        nodes[id.index()].children.push(child_id);
    }

    Ok(id)
}
