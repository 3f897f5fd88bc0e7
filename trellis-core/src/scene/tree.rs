//! Reference Scene Tree
//!
//! `NodeTree` is a small in-memory tree that plays the collaborator role
//! scripts expect: it owns the nodes, tells scripts when their node joins
//! the live tree, dispatches frame hooks to active scripts, and resolves
//! paths.
//!
//! # Liveness
//!
//! The tree is created with a root. A node is live when walking up its
//! parents reaches that root. Nodes created with [`NodeTree::create_node`]
//! start detached and become live when an ancestor chain to the root is
//! formed with [`NodeTree::add_child`].
//!
//! # Hosting scripts
//!
//! Every node has an optional script slot and its own [`SignalRegistry`].
//! While a script hook runs, the script is taken out of its slot so the
//! hook can borrow the tree; it is put back afterwards.

use std::rc::Rc;

use indexmap::IndexMap;

use super::node::{NodeId, SceneTree};
use crate::error::TreeError;
use crate::scripting::{ScriptLifecycle, ScriptState};
use crate::signals::{ErrorReporter, SignalRegistry};

/// A node stored in the tree.
struct TreeNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    signals: SignalRegistry,
    script: Option<Box<dyn ScriptLifecycle>>,
}

/// Which frame hook a dispatch pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameHook {
    Process,
    PhysicsProcess,
}

/// In-memory scene tree.
pub struct NodeTree {
    /// All nodes, live or not, indexed by ID.
    nodes: IndexMap<NodeId, TreeNode>,

    root: NodeId,

    /// Passed to every node's signal registry.
    reporter: Option<Rc<dyn ErrorReporter>>,
}

impl NodeTree {
    /// Create a tree whose live root is named `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::build(root_name.into(), None)
    }

    /// Like [`new`](Self::new), with every node's signals reporting
    /// observer failures to `reporter`.
    pub fn with_reporter(root_name: impl Into<String>, reporter: Rc<dyn ErrorReporter>) -> Self {
        Self::build(root_name.into(), Some(reporter))
    }

    fn build(root_name: String, reporter: Option<Rc<dyn ErrorReporter>>) -> Self {
        let root = NodeId::new();
        let mut tree = Self {
            nodes: IndexMap::new(),
            root,
            reporter,
        };
        let node = tree.make_node(root_name);
        tree.nodes.insert(root, node);
        tree
    }

    fn make_node(&self, name: String) -> TreeNode {
        let signals = match &self.reporter {
            Some(reporter) => SignalRegistry::with_reporter(Rc::clone(reporter)),
            None => SignalRegistry::new(),
        };
        TreeNode {
            name,
            parent: None,
            children: Vec::new(),
            signals,
            script: None,
        }
    }

    /// The live root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId::new();
        let node = self.make_node(name.into());
        self.nodes.insert(id, node);
        id
    }

    /// Whether `node` belongs to this tree, live or not.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Total number of nodes, live or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.name.as_str())
    }

    /// Children of `node`, in insertion order.
    pub fn children(&self, node: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(&node).map(|n| n.children.as_slice())
    }

    /// The node's signal registry.
    pub fn signals(&self, node: NodeId) -> Option<&SignalRegistry> {
        self.nodes.get(&node).map(|n| &n.signals)
    }

    /// Absolute path from the top of the node's subtree, e.g. `/Root/A/B`.
    pub fn path_of(&self, node: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = self.nodes.get(&id)?;
            segments.push(entry.name.as_str());
            current = entry.parent;
        }
        segments.reverse();
        Some(format!("/{}", segments.join("/")))
    }

    /// Make `child` the last child of `parent`.
    ///
    /// If this brings `child` into the live tree, every script in its
    /// subtree is notified, parents before children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        let existing_parent = self
            .nodes
            .get(&child)
            .ok_or(TreeError::UnknownNode(child))?
            .parent;
        if child == self.root {
            return Err(TreeError::RootReparent);
        }
        if let Some(existing) = existing_parent {
            return Err(TreeError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        tracing::debug!(target: "trellis::tree", parent = %parent, child = %child, "child added");

        if self.is_in_live_tree(child) {
            for id in self.subtree(child) {
                self.with_script(id, |script, tree| script.notify_tree_entry(tree));
            }
        }
        Ok(())
    }

    /// Detach `child` from `parent`.
    ///
    /// If `child` was live, every node in its subtree leaves the live tree:
    /// its signal observers are cleared and its script is rebound, which
    /// leaves it `Ready` until the node is live again.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_node = self.nodes.get(&parent).ok_or(TreeError::UnknownNode(parent))?;
        if !parent_node.children.contains(&child) {
            return Err(TreeError::NotAChild { parent, child });
        }
        let was_live = self.is_in_live_tree(child);

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        tracing::debug!(target: "trellis::tree", parent = %parent, child = %child, was_live, "child removed");

        if was_live {
            for id in self.subtree(child) {
                if let Some(node) = self.nodes.get(&id) {
                    node.signals.clear_all();
                }
                self.with_script(id, |script, tree| {
                    script.detach();
                    script.attach(id, tree);
                });
            }
        }
        Ok(())
    }

    /// Bind a script to `node`, returning the script it replaces.
    ///
    /// The replaced script is detached. The new one activates immediately if
    /// `node` is live.
    pub fn set_script(
        &mut self,
        node: NodeId,
        mut script: Box<dyn ScriptLifecycle>,
    ) -> Result<Option<Box<dyn ScriptLifecycle>>, TreeError> {
        if !self.contains(node) {
            return Err(TreeError::UnknownNode(node));
        }
        let previous = self.remove_script(node);

        script.attach(node, &*self);
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.script = Some(script);
        }
        Ok(previous)
    }

    /// Unbind and return the script on `node`.
    pub fn remove_script(&mut self, node: NodeId) -> Option<Box<dyn ScriptLifecycle>> {
        let mut script = self.nodes.get_mut(&node)?.script.take()?;
        script.detach();
        Some(script)
    }

    pub fn script(&self, node: NodeId) -> Option<&dyn ScriptLifecycle> {
        self.nodes.get(&node)?.script.as_deref()
    }

    pub fn script_mut(&mut self, node: NodeId) -> Option<&mut (dyn ScriptLifecycle + 'static)> {
        self.nodes.get_mut(&node)?.script.as_deref_mut()
    }

    /// Live nodes in pre-order, root first.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.subtree(self.root)
    }

    /// Run `process` on every active script in the live tree.
    pub fn process(&mut self, delta: f64) {
        self.dispatch(FrameHook::Process, delta);
    }

    /// Run `physics_process` on every active script in the live tree.
    pub fn physics_process(&mut self, delta: f64) {
        self.dispatch(FrameHook::PhysicsProcess, delta);
    }

    fn dispatch(&mut self, hook: FrameHook, delta: f64) {
        let order = self.live_nodes();
        let _span = tracing::trace_span!(target: "trellis::tree", "dispatch", ?hook, nodes = order.len()).entered();

        for id in order {
            self.with_script(id, |script, tree| {
                if script.state() != ScriptState::Active {
                    return;
                }
                match hook {
                    FrameHook::Process => script.process(delta, tree),
                    FrameHook::PhysicsProcess => script.physics_process(delta, tree),
                }
            });
        }
    }

    /// Take the script out of `node`, run `f` with it and the tree, then
    /// put it back.
    fn with_script<F>(&mut self, node: NodeId, f: F)
    where
        F: FnOnce(&mut dyn ScriptLifecycle, &dyn SceneTree),
    {
        let Some(mut script) = self.nodes.get_mut(&node).and_then(|n| n.script.take()) else {
            return;
        };
        f(&mut *script, &*self);
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.script = Some(script);
        }
    }

    /// `node` and its descendants in pre-order.
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(entry) = self.nodes.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(entry.children.iter().rev().copied());
        }
        order
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    fn top_of(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        current
    }

    fn child_named(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.nodes
            .get(&node)?
            .children
            .iter()
            .copied()
            .find(|c| self.name(*c) == Some(name))
    }
}

impl SceneTree for NodeTree {
    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    fn is_in_live_tree(&self, node: NodeId) -> bool {
        self.contains(node) && self.top_of(node) == self.root
    }

    /// Paths starting with `/` are absolute: the first segment must name
    /// the top of `from`'s subtree. Empty segments and `.` are skipped,
    /// `..` moves to the parent.
    fn resolve(&self, from: NodeId, path: &str) -> Option<NodeId> {
        if !self.contains(from) {
            return None;
        }

        let mut segments = path.split('/').filter(|s| !s.is_empty() && *s != ".");
        let mut current = if path.starts_with('/') {
            let top = self.top_of(from);
            match segments.next() {
                Some(first) if self.name(top) == Some(first) => top,
                Some(_) => return None,
                None => return Some(top),
            }
        } else {
            from
        };

        for segment in segments {
            current = match segment {
                ".." => self.parent_of(current)?,
                name => self.child_named(current, name)?,
            };
        }
        Some(current)
    }
}

impl std::fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTree")
            .field("root", &self.root)
            .field("node_count", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::{Script, ScriptComponent, ScriptContext};
    use std::cell::RefCell;

    fn sample() -> (NodeTree, NodeId, NodeId) {
        let mut tree = NodeTree::new("Root");
        let child1 = tree.create_node("Child1");
        let child2 = tree.create_node("Child2");
        tree.add_child(tree.root(), child1).unwrap();
        tree.add_child(child1, child2).unwrap();
        (tree, child1, child2)
    }

    #[test]
    fn created_nodes_start_detached() {
        let mut tree = NodeTree::new("Root");
        let node = tree.create_node("Loose");

        assert!(tree.is_in_live_tree(tree.root()));
        assert!(!tree.is_in_live_tree(node));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn add_child_links_both_ways() {
        let (tree, child1, child2) = sample();

        assert_eq!(tree.parent_of(child2), Some(child1));
        assert_eq!(tree.children(child1), Some(&[child2][..]));
        assert!(tree.is_in_live_tree(child2));
        assert_eq!(tree.path_of(child2).as_deref(), Some("/Root/Child1/Child2"));
    }

    #[test]
    fn structural_errors() {
        let (mut tree, child1, child2) = sample();
        let root = tree.root();
        let stranger = NodeId::new();

        assert_eq!(tree.add_child(root, stranger), Err(TreeError::UnknownNode(stranger)));
        assert_eq!(tree.add_child(child2, root), Err(TreeError::RootReparent));
        assert_eq!(
            tree.add_child(root, child2),
            Err(TreeError::AlreadyParented {
                child: child2,
                parent: child1
            })
        );
        assert_eq!(
            tree.remove_child(root, child2),
            Err(TreeError::NotAChild {
                parent: root,
                child: child2
            })
        );

        let loose = tree.create_node("Loose");
        let leaf = tree.create_node("Leaf");
        tree.add_child(loose, leaf).unwrap();
        assert_eq!(
            tree.add_child(leaf, loose),
            Err(TreeError::Cycle {
                parent: leaf,
                child: loose
            })
        );
    }

    #[test]
    fn resolve_paths() {
        let (tree, child1, child2) = sample();
        let root = tree.root();

        assert_eq!(tree.resolve(child1, "Child2"), Some(child2));
        assert_eq!(tree.resolve(child1, "/Root"), Some(root));
        assert_eq!(tree.resolve(child1, "../"), Some(root));
        assert_eq!(tree.resolve(child2, "../.."), Some(root));
        assert_eq!(tree.resolve(child2, "/Root/Child1/Child2"), Some(child2));
        assert_eq!(tree.resolve(child2, "./"), Some(child2));
        assert_eq!(tree.resolve(child2, "/"), Some(root));
        assert_eq!(tree.resolve(child1, "/Other"), None);
        assert_eq!(tree.resolve(child1, "Missing"), None);
        assert_eq!(tree.resolve(root, ".."), None);
    }

    #[test]
    fn removing_live_child_clears_subtree_signals() {
        let (mut tree, child1, child2) = sample();
        let hits = Rc::new(RefCell::new(0));
        let hits_clone = hits.clone();
        let signal = tree.signals(child2).unwrap().signal::<()>("child_signal").unwrap();
        signal.connect_fn(move |_| *hits_clone.borrow_mut() += 1);

        signal.emit(());
        assert_eq!(*hits.borrow(), 1);

        tree.remove_child(tree.root(), child1).unwrap();
        signal.emit(());

        assert_eq!(*hits.borrow(), 1);
        assert!(!tree.is_in_live_tree(child2));
    }

    #[derive(Default)]
    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Script for Recorder {
        fn ready(&mut self, ctx: &ScriptContext<'_>) {
            self.log.borrow_mut().push(format!("ready {}", ctx.node()));
        }

        fn process(&mut self, ctx: &ScriptContext<'_>, _delta: f64) {
            self.log.borrow_mut().push(format!("process {}", ctx.node()));
        }

        fn physics_process(&mut self, ctx: &ScriptContext<'_>, _delta: f64) {
            self.log.borrow_mut().push(format!("physics {}", ctx.node()));
        }
    }

    #[test]
    fn scripts_activate_when_subtree_goes_live() {
        let mut tree = NodeTree::new("Root");
        let parent = tree.create_node("Parent");
        let child = tree.create_node("Child");
        tree.add_child(parent, child).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        for node in [parent, child] {
            let script = ScriptComponent::new(Recorder { log: log.clone() });
            tree.set_script(node, Box::new(script)).unwrap();
        }
        assert_eq!(tree.script(child).unwrap().state(), ScriptState::Ready);
        assert!(log.borrow().is_empty());

        tree.add_child(tree.root(), parent).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![format!("ready {parent}"), format!("ready {child}")]
        );
        assert_eq!(tree.script(child).unwrap().state(), ScriptState::Active);
    }

    #[test]
    fn dispatch_skips_inactive_scripts() {
        let (mut tree, child1, child2) = sample();
        let log = Rc::new(RefCell::new(Vec::new()));
        for node in [child1, child2] {
            let script = ScriptComponent::new(Recorder { log: log.clone() });
            tree.set_script(node, Box::new(script)).unwrap();
        }
        log.borrow_mut().clear();

        tree.script_mut(child1).unwrap().set_enabled(false);
        tree.process(0.016);
        tree.physics_process(0.02);

        assert_eq!(
            *log.borrow(),
            vec![format!("process {child2}"), format!("physics {child2}")]
        );
    }

    #[test]
    fn removed_scripts_wait_in_ready_until_re_added() {
        let (mut tree, child1, child2) = sample();
        let log = Rc::new(RefCell::new(Vec::new()));
        for node in [child1, child2] {
            let script = ScriptComponent::new(Recorder { log: log.clone() });
            tree.set_script(node, Box::new(script)).unwrap();
        }
        log.borrow_mut().clear();

        tree.remove_child(tree.root(), child1).unwrap();
        assert!(!tree.is_in_live_tree(child2));
        for node in [child1, child2] {
            let script = tree.script(node).unwrap();
            assert_eq!(script.state(), ScriptState::Ready);
            assert_eq!(script.node(), Some(node));
        }

        tree.process(0.016);
        assert!(log.borrow().is_empty());

        tree.add_child(tree.root(), child1).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![format!("ready {child1}"), format!("ready {child2}")]
        );
        assert_eq!(tree.script(child2).unwrap().state(), ScriptState::Active);
    }

    #[test]
    fn removal_keeps_disabled_flag() {
        let (mut tree, child1, _) = sample();
        let script = ScriptComponent::new(Recorder::default());
        tree.set_script(child1, Box::new(script)).unwrap();
        tree.script_mut(child1).unwrap().set_enabled(false);

        tree.remove_child(tree.root(), child1).unwrap();
        assert_eq!(tree.script(child1).unwrap().state(), ScriptState::Ready);

        tree.add_child(tree.root(), child1).unwrap();
        assert_eq!(tree.script(child1).unwrap().state(), ScriptState::Disabled);
    }

    #[test]
    fn set_script_replaces_and_detaches_previous() {
        let (mut tree, child1, _) = sample();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = ScriptComponent::new(Recorder { log: log.clone() });
        assert!(tree.set_script(child1, Box::new(first)).unwrap().is_none());

        let second = ScriptComponent::new(Recorder { log: log.clone() });
        let previous = tree.set_script(child1, Box::new(second)).unwrap().unwrap();
        assert_eq!(previous.state(), ScriptState::Detached);
        assert_eq!(tree.script(child1).unwrap().state(), ScriptState::Active);

        let removed = tree.remove_script(child1).unwrap();
        assert_eq!(removed.state(), ScriptState::Detached);
        assert!(tree.script(child1).is_none());
        assert!(tree.remove_script(child1).is_none());
    }
}
