//! Loom Render - Incremental host updates
//!
//! Reconciles instance trees produced by the template engine against a
//! [`HostTree`]. Nodes are matched by structural path; only differences are
//! turned into [`MutationAction`]s, which are coalesced per slot and
//! committed in batches at each scheduling tick.

mod actions;
mod error;
mod host;
mod queue;
mod reconciler;
mod scheduler;
mod state;

pub use actions::{ActionCategory, ActionQueue, ActionSlot, MutationAction, MutationSink};
pub use error::{RenderError, RenderResult};
pub use host::{HostError, HostMutation, HostNode, HostNodeId, HostNodeKind, HostTree, MemoryHost};
pub use queue::{Completion, CompletionError, QueuedWork, RenderQueue};
pub use reconciler::{DEFAULT_MAX_FLUSH_PASSES, FlushReport, Reconciler, ReconcilerOptions, RenderWork};
pub use scheduler::{FrameScheduler, FrameTrigger, ImmediateScheduler, LocalBoxFuture, Scheduler, TimerScheduler};
pub use state::{RenderState, StateArena};
