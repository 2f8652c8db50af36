//! View - One mounted template
//!
//! Owns a template engine and a reconciler for a single host tree. Each
//! context change re-renders the instance tree and queues a deep render of
//! it; the host is only touched when the queue is flushed.

use crate::{Config, LoomResult};
use loom_engine::{Diagnostic, TemplateEngine};
use loom_expr::Value;
use loom_html::{Template, TemplateCache, TemplateParser};
use loom_render::{Completion, FlushReport, FrameTrigger, HostNodeId, HostTree, LocalBoxFuture, Reconciler};
use std::rc::Rc;

/// A template mounted on a host
pub struct View<H: HostTree> {
    config: Config,
    engine: TemplateEngine,
    reconciler: Reconciler<H>,
    frames: Option<FrameTrigger>,
}

impl<H: HostTree> View<H> {
    /// Parse `template` and mount it on `host`
    pub fn new(template: &str, config: Config, host: H) -> LoomResult<Self> {
        let parser = TemplateParser::with_options(config.parser_options());
        let template = parser.parse(template)?;
        Ok(Self::mount(Rc::new(template), config, host))
    }

    /// Like [`View::new`], sharing parsed templates through `cache`
    pub fn with_cache(cache: &mut TemplateCache, template: &str, config: Config, host: H) -> LoomResult<Self> {
        let template = cache.get_or_parse(template)?;
        Ok(Self::mount(template, config, host))
    }

    fn mount(template: Rc<Template>, config: Config, host: H) -> Self {
        for warning in template.warnings() {
            tracing::warn!("Template: {}", warning);
        }
        let (scheduler, frames) = config.scheduler.build();
        let engine = TemplateEngine::with_root_key(template, &config.root_key);
        let reconciler = Reconciler::with_scheduler(host, scheduler, config.reconciler_options());
        tracing::debug!("Mounted view at {}", config.root_key);

        Self {
            config,
            engine,
            reconciler,
            frames,
        }
    }

    /// Render against a new context and queue the result.
    ///
    /// The returned completion resolves to the root host node once the
    /// render is committed by [`View::flush`] or [`View::tick`]. A failed
    /// render leaves the host untouched.
    pub fn set_context(&mut self, context: Value) -> LoomResult<Completion<HostNodeId>> {
        self.engine.set_context(context)?;
        let instance = self.engine.render().ok_or(crate::LoomError::NotRendered)?;
        Ok(self.reconciler.render_dom(instance.tree(), instance.root(), true))
    }

    /// [`View::set_context`] with a JSON context
    pub fn set_context_json(&mut self, context: serde_json::Value) -> LoomResult<Completion<HostNodeId>> {
        self.set_context(Value::from(context))
    }

    /// Wait for the scheduler, then commit. The view stays borrowed while
    /// waiting; await [`View::next_tick`] to keep updating meanwhile.
    pub async fn tick(&mut self) -> LoomResult<FlushReport> {
        Ok(self.reconciler.tick().await?)
    }

    /// The scheduler's next tick, not tied to the view
    pub fn next_tick(&self) -> LocalBoxFuture<'static, ()> {
        self.reconciler.next_tick()
    }

    /// Commit queued renders now
    pub fn flush(&mut self) -> LoomResult<FlushReport> {
        Ok(self.reconciler.flush()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    pub fn reconciler(&self) -> &Reconciler<H> {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler<H> {
        &mut self.reconciler
    }

    pub fn host(&self) -> &H {
        self.reconciler.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.reconciler.host_mut()
    }

    /// Diagnostics of the latest render
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.engine.diagnostics()
    }

    /// Committed root host node
    pub fn root(&self) -> Option<HostNodeId> {
        self.reconciler.states().host(&self.config.root_key)
    }

    /// Committed host node of a structural path
    pub fn host_node(&self, path: &str) -> Option<HostNodeId> {
        self.reconciler.states().host(path)
    }

    /// Frame trigger when the view uses frame scheduling
    pub fn frame_trigger(&self) -> Option<&FrameTrigger> {
        self.frames.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_render::MemoryHost;
    use serde_json::json;

    #[test]
    fn test_nothing_committed_before_flush() {
        let mut view = View::new("<p>{{ n }}</p>", Config::default(), MemoryHost::new()).unwrap();
        let done = view.set_context_json(json!({"n": 1})).unwrap();
        assert!(!done.is_done());
        assert!(view.host().is_empty());

        view.flush().unwrap();
        let root = done.try_get().unwrap().unwrap();
        assert_eq!(view.root(), Some(root));
        assert_eq!(view.host().to_markup(root), "<p>1</p>");
    }

    #[test]
    fn test_custom_root_key() {
        let config = Config {
            root_key: "app".into(),
            ..Config::default()
        };
        let mut view = View::new("<i>x</i>", config, MemoryHost::new()).unwrap();
        view.set_context_json(json!({})).unwrap();
        view.flush().unwrap();
        assert!(view.host_node("app/element:0").is_some());
    }
}
