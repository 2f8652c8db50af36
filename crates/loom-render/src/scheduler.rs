//! Scheduling ticks
//!
//! The only suspension point of a render: waiting for the next tick before
//! committing. What a "tick" is depends on the host.

use smol::channel::{self, Receiver, Sender};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed single-threaded future
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Source of scheduling ticks
pub trait Scheduler {
    /// Future that resolves at the next tick
    fn next_tick(&self) -> LocalBoxFuture<'static, ()>;
}

/// Tick as soon as the executor gets back to the task
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn next_tick(&self) -> LocalBoxFuture<'static, ()> {
        Box::pin(smol::future::yield_now())
    }
}

/// Tick after a fixed delay
#[derive(Debug, Clone, Copy)]
pub struct TimerScheduler {
    delay: Duration,
}

impl TimerScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Scheduler for TimerScheduler {
    fn next_tick(&self) -> LocalBoxFuture<'static, ()> {
        let delay = self.delay;
        Box::pin(async move {
            smol::Timer::after(delay).await;
        })
    }
}

/// Tick when the host signals a frame
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    frames: Receiver<()>,
}

/// Host side of a [`FrameScheduler`]
#[derive(Debug, Clone)]
pub struct FrameTrigger {
    frames: Sender<()>,
}

impl FrameScheduler {
    /// Scheduler plus the trigger the host signals frames through
    pub fn pair() -> (Self, FrameTrigger) {
        let (tx, rx) = channel::unbounded();
        (Self { frames: rx }, FrameTrigger { frames: tx })
    }
}

impl FrameTrigger {
    /// Signal one frame; returns `false` once the scheduler is gone
    pub fn frame(&self) -> bool {
        self.frames.try_send(()).is_ok()
    }
}

impl Scheduler for FrameScheduler {
    fn next_tick(&self) -> LocalBoxFuture<'static, ()> {
        let frames = self.frames.clone();
        Box::pin(async move {
            // A closed trigger should not stall renders forever
            let _ = frames.recv().await;
        })
    }
}
