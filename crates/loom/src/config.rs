//! View Configuration

use loom_engine::DEFAULT_ROOT_KEY;
use loom_html::ParserOptions;
use loom_render::{
    DEFAULT_MAX_FLUSH_PASSES, FrameScheduler, FrameTrigger, ImmediateScheduler, ReconcilerOptions,
    Scheduler, TimerScheduler,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// View configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Structural path of the root fragment
    pub root_key: String,

    /// Keep whitespace-only text in templates
    pub keep_whitespace: bool,

    /// Commit passes allowed per flush
    pub max_flush_passes: usize,

    /// When queued renders are committed
    pub scheduler: SchedulerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_key: DEFAULT_ROOT_KEY.to_string(),
            keep_whitespace: false,
            max_flush_passes: DEFAULT_MAX_FLUSH_PASSES,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            keep_whitespace: self.keep_whitespace,
        }
    }

    pub fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            max_flush_passes: self.max_flush_passes,
        }
    }
}

/// Scheduler selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchedulerConfig {
    /// Commit on the next executor turn
    #[default]
    Immediate,
    /// Commit after a fixed delay
    Timer { delay_ms: u64 },
    /// Commit when the host signals a frame
    Frame,
}

impl SchedulerConfig {
    /// Build the scheduler; frame scheduling also yields the host's trigger
    pub fn build(self) -> (Box<dyn Scheduler>, Option<FrameTrigger>) {
        match self {
            SchedulerConfig::Immediate => (Box::new(ImmediateScheduler), None),
            SchedulerConfig::Timer { delay_ms } => {
                (Box::new(TimerScheduler::new(Duration::from_millis(delay_ms))), None)
            }
            SchedulerConfig::Frame => {
                let (scheduler, trigger) = FrameScheduler::pair();
                (Box::new(scheduler), Some(trigger))
            }
        }
    }
}
