//! Reconciler
//!
//! Diffs instance trees against the render state recorded per structural
//! path and turns every difference into a [`MutationAction`]. Requests are
//! batched in a [`RenderQueue`] and committed together at the next flush.

use crate::actions::{MutationAction, MutationSink};
use crate::error::{RenderError, RenderResult};
use crate::host::{HostNodeId, HostTree};
use crate::queue::{Completion, RenderQueue};
use crate::scheduler::{ImmediateScheduler, LocalBoxFuture, Scheduler};
use crate::state::{RenderState, StateArena};
use loom_dom::path::{self, PathCounter, DEFAULT_ROOT_KEY};
use loom_dom::{NodeData, NodeId, VNode, VTree};
use std::collections::HashSet;

/// Default cap on commit passes per flush
pub const DEFAULT_MAX_FLUSH_PASSES: usize = 16;

/// Reconciler tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Commit passes allowed before a flush gives up
    pub max_flush_passes: usize,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            max_flush_passes: DEFAULT_MAX_FLUSH_PASSES,
        }
    }
}

/// One queued render request
#[derive(Debug, Clone)]
pub struct RenderWork {
    tree: VTree,
    root: NodeId,
    root_path: String,
    deep: bool,
}

/// Summary of a flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Render requests executed
    pub rendered: usize,
    /// Host mutations committed
    pub committed: usize,
    /// Commit passes needed to drain the action queue
    pub passes: usize,
}

/// Reconciler over a host tree
pub struct Reconciler<H: HostTree> {
    host: H,
    states: StateArena,
    sink: MutationSink,
    queue: RenderQueue<String, RenderWork, HostNodeId>,
    scheduler: Box<dyn Scheduler>,
    options: ReconcilerOptions,
}

impl<H: HostTree> Reconciler<H> {
    pub fn new(host: H) -> Self {
        Self::with_scheduler(host, Box::new(ImmediateScheduler), ReconcilerOptions::default())
    }

    pub fn with_scheduler(host: H, scheduler: Box<dyn Scheduler>, options: ReconcilerOptions) -> Self {
        Self {
            host,
            states: StateArena::new(),
            sink: MutationSink::new(),
            queue: RenderQueue::new(),
            scheduler,
            options,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Shared handle to the pending action queue
    pub fn sink(&self) -> &MutationSink {
        &self.sink
    }

    pub fn states(&self) -> &StateArena {
        &self.states
    }

    pub fn options(&self) -> ReconcilerOptions {
        self.options
    }

    /// Actions waiting for the next commit
    pub fn pending_actions(&self) -> usize {
        self.sink.len()
    }

    /// Render requests waiting for the next flush
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Request a render of `root`, keyed by its structural path.
    ///
    /// `deep` re-diffs the whole subtree; otherwise only the root's own
    /// state and the placement of its children are reconciled. Resolves to
    /// the root's host node once the batch commits.
    ///
    /// Nothing runs until the owner drives [`Reconciler::flush`] or
    /// [`Reconciler::tick`]; awaiting the completion alone never resolves it.
    pub fn render_dom(&mut self, tree: &VTree, root: NodeId, deep: bool) -> Completion<HostNodeId> {
        let key = tree
            .get(root)
            .and_then(|n| n.path.clone())
            .unwrap_or_else(|| DEFAULT_ROOT_KEY.to_string());
        self.render_dom_keyed(key, tree, root, deep)
    }

    /// Request a render under an explicit dedupe key
    pub fn render_dom_keyed(
        &mut self,
        key: impl Into<String>,
        tree: &VTree,
        root: NodeId,
        deep: bool,
    ) -> Completion<HostNodeId> {
        let key = key.into();
        let root_path = tree
            .get(root)
            .and_then(|n| n.path.clone())
            .unwrap_or_else(|| key.clone());
        let work = RenderWork {
            tree: tree.clone(),
            root,
            root_path,
            deep,
        };
        self.queue.enqueue(key, work)
    }

    /// Drop a queued request before it is flushed
    pub fn cancel(&mut self, key: &str) -> bool {
        self.queue.cancel(&key.to_string())
    }

    /// Wait for the next scheduling tick, then flush.
    ///
    /// Holds the reconciler for the whole wait, so nothing can join the
    /// batch meanwhile. Callers that keep requesting renders while waiting
    /// await [`Reconciler::next_tick`] instead and call [`Reconciler::flush`]
    /// afterwards.
    pub async fn tick(&mut self) -> RenderResult<FlushReport> {
        self.scheduler.next_tick().await;
        self.flush()
    }

    /// The scheduler's next tick, detached from the reconciler
    pub fn next_tick(&self) -> LocalBoxFuture<'static, ()> {
        self.scheduler.next_tick()
    }

    /// Run every queued render, commit all resulting actions and resolve
    /// the completions of the batch.
    ///
    /// On failure every request of the batch fails and the render state of
    /// each batch root is dropped, so the next render of those paths builds
    /// a fresh host subtree instead of diffing against states the host
    /// never received.
    pub fn flush(&mut self) -> RenderResult<FlushReport> {
        let batch = self.queue.take_batch();

        let mut roots = Vec::with_capacity(batch.len());
        let mut outcome = Ok(());
        for item in &batch {
            match self.reconcile(item.work()) {
                Ok(host) => roots.push(host),
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        let outcome = outcome.and_then(|()| self.commit());
        let (committed, passes) = match outcome {
            Ok(counts) => counts,
            Err(err) => {
                let dropped = self.sink.drain();
                if !dropped.is_empty() {
                    tracing::warn!("Dropping {} uncommitted actions", dropped.len());
                }
                for item in &batch {
                    self.invalidate(&item.work().root_path);
                    item.fail(err.to_string());
                }
                return Err(err);
            }
        };

        for (item, host) in batch.iter().zip(roots) {
            item.resolve(host);
        }

        if !batch.is_empty() || committed > 0 {
            tracing::debug!(
                "Flushed {} renders: {} mutations in {} passes",
                batch.len(),
                committed,
                passes
            );
        }

        Ok(FlushReport {
            rendered: batch.len(),
            committed,
            passes,
        })
    }

    /// Drain the action queue until it stays empty. A rejected action does
    /// not stop the rest of its pass; the first rejection is returned once
    /// the pass is through.
    fn commit(&mut self) -> RenderResult<(usize, usize)> {
        let mut committed = 0;
        let mut passes = 0;

        while !self.sink.is_empty() {
            if passes == self.options.max_flush_passes {
                tracing::error!(
                    "Flush exceeded {} passes with {} actions pending",
                    self.options.max_flush_passes,
                    self.sink.len()
                );
                return Err(RenderError::FlushLimit {
                    passes: self.options.max_flush_passes,
                });
            }
            passes += 1;

            let mut rejected = None;
            for action in self.sink.drain() {
                tracing::trace!("Committing {:?}", action);
                match action.apply(&mut self.host) {
                    Ok(()) => committed += 1,
                    Err(err) => {
                        tracing::error!("Host rejected {:?}: {}", action, err);
                        rejected.get_or_insert(err);
                    }
                }
            }
            if let Some(err) = rejected {
                return Err(err.into());
            }
        }

        Ok((committed, passes))
    }

    /// Forget a render root after a failed commit. A root hanging under a
    /// host parent is detached; the parent's next render inserts its
    /// replacement.
    fn invalidate(&mut self, root_path: &str) {
        if let Some(state) = self.states.remove(root_path) {
            if state.parent.is_some() {
                if let Err(err) = self.host.remove(state.host) {
                    tracing::warn!("Could not detach {}: {}", root_path, err);
                }
            }
        }
        let dropped = self.states.remove_descendants(root_path);
        tracing::warn!("Invalidated {} and {} descendant states", root_path, dropped);
    }

    fn reconcile(&mut self, work: &RenderWork) -> RenderResult<HostNodeId> {
        let parent = self.states.get(&work.root_path).and_then(|s| s.parent);
        let mut pass = DiffPass {
            host: &mut self.host,
            states: &mut self.states,
            sink: &self.sink,
            tree: &work.tree,
            seen: HashSet::new(),
        };
        let host = pass.node(work.root, &work.root_path, parent, work.deep)?;
        pass.sweep(&work.root_path, work.deep);
        Ok(host)
    }
}

/// State of reconciling one render request
struct DiffPass<'a, H: HostTree> {
    host: &'a mut H,
    states: &'a mut StateArena,
    sink: &'a MutationSink,
    tree: &'a VTree,
    /// Paths present in this render
    seen: HashSet<String>,
}

impl<H: HostTree> DiffPass<'_, H> {
    fn node(&mut self, id: NodeId, path: &str, parent: Option<HostNodeId>, deep: bool) -> RenderResult<HostNodeId> {
        let tree = self.tree;
        let node = tree.get(id).ok_or(RenderError::MissingNode(id))?;
        self.seen.insert(path.to_string());

        let reusable = self.states.get(path).map(|s| same_identity(&s.snapshot, node));
        match reusable {
            Some(true) => self.update(id, node, path, parent, deep),
            Some(false) => {
                // Kind or tag changed under the same path
                self.discard(path);
                self.create(id, node, path, parent)
            }
            None => self.create(id, node, path, parent),
        }
    }

    /// First occurrence of a path: build everything
    fn create(&mut self, id: NodeId, node: &VNode, path: &str, parent: Option<HostNodeId>) -> RenderResult<HostNodeId> {
        let host = match &node.data {
            NodeData::Element(el) => self.host.create_element(&el.tag),
            NodeData::Text(text) => self.host.create_text(&text.content),
            NodeData::Comment(comment) => self.host.create_comment(&comment.content),
            NodeData::Fragment(_) => self.host.create_fragment(),
        };

        if let Some(attributes) = node.attributes() {
            for (name, value) in attributes.iter() {
                self.sink.push(MutationAction::SetAttribute {
                    node: host,
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        if let Some(events) = node.events() {
            for listener in events.iter() {
                self.sink.push(MutationAction::AddListener {
                    node: host,
                    listener: listener.clone(),
                });
            }
        }

        let children = self.children(id, path, host, true)?;
        place(self.sink, host, &[], &children);

        self.states.insert(
            path.to_string(),
            RenderState {
                host,
                snapshot: node.shallow_clone(),
                children,
                parent,
            },
        );
        Ok(host)
    }

    /// Repeat occurrence: diff against the snapshot
    fn update(
        &mut self,
        id: NodeId,
        node: &VNode,
        path: &str,
        parent: Option<HostNodeId>,
        deep: bool,
    ) -> RenderResult<HostNodeId> {
        let Some(state) = self.states.get_mut(path) else {
            return Err(RenderError::MissingNode(id));
        };
        let host = state.host;
        state.parent = parent;
        if diff_self(self.sink, host, &state.snapshot, node) {
            state.snapshot = node.shallow_clone();
        }
        let committed = state.children.clone();

        let children = self.children(id, path, host, deep)?;
        place(self.sink, host, &committed, &children);

        if let Some(state) = self.states.get_mut(path) {
            state.children = children;
        }
        Ok(host)
    }

    /// Host nodes for the children of `id`, in order
    fn children(&mut self, id: NodeId, path: &str, host: HostNodeId, deep: bool) -> RenderResult<Vec<HostNodeId>> {
        let tree = self.tree;
        let mut counter = PathCounter::default();
        let mut out = Vec::new();

        for &child in tree.children(id) {
            let node = tree.get(child).ok_or(RenderError::MissingNode(child))?;
            let index = counter.next(node.kind());
            let child_path = node
                .path
                .clone()
                .unwrap_or_else(|| path::child_path(path, node.kind(), index));

            let reused = if deep {
                None
            } else {
                self.states
                    .get(&child_path)
                    .filter(|s| same_identity(&s.snapshot, node))
                    .map(|s| s.host)
            };

            let child_host = match reused {
                Some(existing) => {
                    self.seen.insert(child_path);
                    existing
                }
                None => self.node(child, &child_path, Some(host), deep)?,
            };
            out.push(child_host);
        }
        Ok(out)
    }

    /// Forget a path and everything below it, removing its host node
    fn discard(&mut self, path: &str) {
        if let Some(state) = self.states.remove(path) {
            self.sink.push(MutationAction::Remove { node: state.host });
        }
        let dropped = self.states.remove_descendants(path);
        tracing::debug!("Discarded {} and {} descendant states", path, dropped);
    }

    /// Remove previously rendered paths that are absent now. Deep renders
    /// consider the whole subtree, others only direct children.
    fn sweep(&mut self, root: &str, deep: bool) {
        let candidates = if deep {
            self.states.descendants_of(root)
        } else {
            self.states.children_of(root)
        };

        for candidate in candidates {
            // Already gone with an absent ancestor
            if self.seen.contains(&candidate) || !self.states.contains(&candidate) {
                continue;
            }
            self.discard(&candidate);
        }
    }
}

fn same_identity(snapshot: &VNode, node: &VNode) -> bool {
    snapshot.kind() == node.kind() && snapshot.tag() == node.tag()
}

/// Enqueue one action per self-state difference; returns whether any
fn diff_self(sink: &MutationSink, host: HostNodeId, old: &VNode, new: &VNode) -> bool {
    let mut changed = false;

    if let (Some(before), Some(after)) = (old.attributes(), new.attributes()) {
        for (name, value) in after.iter() {
            if before.get(name) != Some(value) {
                sink.push(MutationAction::SetAttribute {
                    node: host,
                    name: name.to_string(),
                    value: value.to_string(),
                });
                changed = true;
            }
        }
        for (name, _) in before.iter() {
            if !after.contains(name) {
                sink.push(MutationAction::RemoveAttribute {
                    node: host,
                    name: name.to_string(),
                });
                changed = true;
            }
        }
    }

    if let (Some(before), Some(after)) = (old.events(), new.events()) {
        for listener in after.iter() {
            let (event_type, id) = listener.key();
            match before.get(event_type, id) {
                Some(existing) if existing.options == listener.options => {}
                _ => {
                    sink.push(MutationAction::AddListener {
                        node: host,
                        listener: listener.clone(),
                    });
                    changed = true;
                }
            }
        }
        for listener in before.iter() {
            let (event_type, id) = listener.key();
            if after.get(event_type, id).is_none() {
                sink.push(MutationAction::RemoveListener {
                    node: host,
                    event_type: event_type.to_string(),
                    id,
                });
                changed = true;
            }
        }
    }

    if let (Some(before), Some(after)) = (old.text_content(), new.text_content()) {
        if before != after {
            sink.push(MutationAction::SetText {
                node: host,
                text: after.to_string(),
            });
            changed = true;
        }
    }

    changed
}

/// Enqueue inserts that turn `committed` into `desired`.
///
/// Walks from last to first, inserting each child before its successor
/// unless it already sits there; children missing from `desired` are
/// ignored since the sweep removes them.
fn place(sink: &MutationSink, parent: HostNodeId, committed: &[HostNodeId], desired: &[HostNodeId]) {
    let mut current: Vec<HostNodeId> = committed.iter().copied().filter(|c| desired.contains(c)).collect();
    let mut next: Option<HostNodeId> = None;

    for &child in desired.iter().rev() {
        let position = current.iter().position(|&c| c == child);
        let in_place = position.is_some_and(|i| current.get(i + 1).copied() == next);

        if !in_place {
            if let Some(i) = position {
                current.remove(i);
            }
            let at = next
                .and_then(|n| current.iter().position(|&c| c == n))
                .unwrap_or(current.len());
            current.insert(at, child);
            sink.push(MutationAction::Insert {
                parent,
                child,
                before: next,
            });
        }
        next = Some(child);
    }
}
