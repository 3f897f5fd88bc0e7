//! Script components.
//!
//! A [`ScriptComponent`] wraps a user behavior (anything implementing
//! [`Script`]) and tracks its lifecycle against the node it is bound to.
//! The tree drives it:
//!
//! - `attach` when the behavior is bound to a node,
//! - `notify_tree_entry` when that node joins the live tree,
//! - `detach` when the binding is removed,
//! - `process`/`physics_process` every frame, but only while the state is
//!   [`ScriptState::Active`]. The component does not check this itself.
//!
//! Every (state, transition) pair is defined. Out-of-order calls are
//! no-ops, and the readiness hook runs at most once per binding.

use std::any::Any;
use std::fmt;

use super::state::ScriptState;
use crate::scene::{NodeId, SceneTree};

/// View of the tree handed to script hooks.
#[derive(Clone, Copy)]
pub struct ScriptContext<'a> {
    node: NodeId,
    tree: &'a dyn SceneTree,
}

impl<'a> ScriptContext<'a> {
    /// Context for a script bound to `node`.
    pub fn new(node: NodeId, tree: &'a dyn SceneTree) -> Self {
        Self { node, tree }
    }

    /// The node the script is bound to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The tree the node lives in.
    pub fn tree(&self) -> &'a dyn SceneTree {
        self.tree
    }

    /// Resolve a path relative to the bound node.
    pub fn get_node(&self, path: &str) -> Option<NodeId> {
        self.tree.resolve(self.node, path)
    }

    /// Parent of the bound node, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.tree.parent_of(self.node)
    }
}

impl fmt::Debug for ScriptContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptContext").field("node", &self.node).finish()
    }
}

/// Behavior hooks. All default to doing nothing.
pub trait Script {
    /// Runs once per binding, when the bound node is first in the live tree.
    fn ready(&mut self, _ctx: &ScriptContext<'_>) {}

    /// Runs every frame while active. `delta` is in seconds.
    fn process(&mut self, _ctx: &ScriptContext<'_>, _delta: f64) {}

    /// Runs every physics tick while active. `delta` is the fixed step.
    fn physics_process(&mut self, _ctx: &ScriptContext<'_>, _delta: f64) {}
}

/// Object-safe lifecycle surface, for trees that store scripts of mixed
/// behavior types as `Box<dyn ScriptLifecycle>`.
pub trait ScriptLifecycle {
    fn attach(&mut self, node: NodeId, tree: &dyn SceneTree);
    fn detach(&mut self);
    fn notify_tree_entry(&mut self, tree: &dyn SceneTree);
    fn state(&self) -> ScriptState;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn node(&self) -> Option<NodeId>;
    fn process(&mut self, delta: f64, tree: &dyn SceneTree);
    fn physics_process(&mut self, delta: f64, tree: &dyn SceneTree);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A behavior bound to at most one node, with its activation state.
pub struct ScriptComponent<S> {
    behavior: S,

    /// Non-owning handle to the bound node.
    node: Option<NodeId>,

    /// `Detached` iff `node` is `None`.
    state: ScriptState,

    /// Owner's switch, independent of attachment.
    enabled: bool,
}

impl<S: Script> ScriptComponent<S> {
    /// Create a detached, enabled component.
    pub fn new(behavior: S) -> Self {
        Self {
            behavior,
            node: None,
            state: ScriptState::Detached,
            enabled: true,
        }
    }

    /// Bind to `node`, dropping any previous binding first.
    ///
    /// If `node` is already in the live tree the component activates
    /// before this returns.
    pub fn attach(&mut self, node: NodeId, tree: &dyn SceneTree) {
        if self.node.is_some() {
            self.detach();
        }

        self.node = Some(node);
        self.state = ScriptState::Ready;
        tracing::debug!(target: "trellis::script", node = %node, "script attached");

        if tree.is_in_live_tree(node) {
            self.activate(tree);
        }
    }

    /// Unbind. Valid from any state; runs no hook.
    pub fn detach(&mut self) {
        if let Some(node) = self.node.take() {
            tracing::debug!(
                target: "trellis::script",
                node = %node,
                from = %self.state,
                "script detached"
            );
        }
        self.state = ScriptState::Detached;
    }

    /// The bound node joined the live tree.
    pub fn notify_tree_entry(&mut self, tree: &dyn SceneTree) {
        self.activate(tree);
    }

    /// Run the readiness hook and leave `Ready`. No-op in any other state.
    ///
    /// A component switched off while it was `Ready` lands in `Disabled`.
    fn activate(&mut self, tree: &dyn SceneTree) {
        if self.state != ScriptState::Ready {
            return;
        }
        let Some(node) = self.node else {
            return;
        };

        self.behavior.ready(&ScriptContext::new(node, tree));
        self.state = if self.enabled {
            ScriptState::Active
        } else {
            ScriptState::Disabled
        };
        tracing::debug!(target: "trellis::script", node = %node, state = %self.state, "script ready");
    }

    pub fn state(&self) -> ScriptState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record the owner's switch. Only `Active` and `Disabled` react to it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;

        let next = match (self.state, enabled) {
            (ScriptState::Active, false) => ScriptState::Disabled,
            (ScriptState::Disabled, true) => ScriptState::Active,
            (state, _) => state,
        };
        if next != self.state {
            tracing::trace!(target: "trellis::script", from = %self.state, to = %next, "script toggled");
            self.state = next;
        }
    }

    /// The bound node, if any.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Resolve `path` relative to the bound node.
    ///
    /// `None` when unbound or when the tree cannot resolve the path.
    pub fn get_node(&self, path: &str, tree: &dyn SceneTree) -> Option<NodeId> {
        self.node.and_then(|node| tree.resolve(node, path))
    }

    /// Run the per-frame hook. Skipped when unbound.
    pub fn process(&mut self, delta: f64, tree: &dyn SceneTree) {
        if let Some(node) = self.node {
            self.behavior.process(&ScriptContext::new(node, tree), delta);
        }
    }

    /// Run the physics hook. Skipped when unbound.
    pub fn physics_process(&mut self, delta: f64, tree: &dyn SceneTree) {
        if let Some(node) = self.node {
            self.behavior
                .physics_process(&ScriptContext::new(node, tree), delta);
        }
    }

    pub fn behavior(&self) -> &S {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut S {
        &mut self.behavior
    }

    /// Give the behavior back. The binding is dropped with the component.
    pub fn into_inner(self) -> S {
        self.behavior
    }
}

impl<S: Script + 'static> ScriptLifecycle for ScriptComponent<S> {
    fn attach(&mut self, node: NodeId, tree: &dyn SceneTree) {
        ScriptComponent::attach(self, node, tree);
    }

    fn detach(&mut self) {
        ScriptComponent::detach(self);
    }

    fn notify_tree_entry(&mut self, tree: &dyn SceneTree) {
        ScriptComponent::notify_tree_entry(self, tree);
    }

    fn state(&self) -> ScriptState {
        self.state
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        ScriptComponent::set_enabled(self, enabled);
    }

    fn node(&self) -> Option<NodeId> {
        self.node
    }

    fn process(&mut self, delta: f64, tree: &dyn SceneTree) {
        ScriptComponent::process(self, delta, tree);
    }

    fn physics_process(&mut self, delta: f64, tree: &dyn SceneTree) {
        ScriptComponent::physics_process(self, delta, tree);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<S: fmt::Debug> fmt::Debug for ScriptComponent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptComponent")
            .field("behavior", &self.behavior)
            .field("node", &self.node)
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .finish()
    }
}
