//! Template Engine
//!
//! Materializes a static template against a context into an instance tree.
//! Directives decide how many instance nodes each template node becomes;
//! every produced node gets the structural path the reconciler uses to find
//! its previous render state.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::directives::{self, RepeatSpec};
use crate::error::{EngineError, EngineResult};
use crate::interpolate::{self, Segment};
use loom_dom::path::{self, PathCounter, DEFAULT_ROOT_KEY};
use loom_dom::{
    AttributeBag, AttributeNode, Callback, CallbackId, Element, Event, EventNode, ListenerOptions,
    NodeData, NodeId, NodeKind, VNode, VTree,
};
use loom_expr::{EvalError, ExprError, Expression, NativeFunction, Scope, Value};
use loom_html::Template;
use std::collections::HashMap;
use std::rc::Rc;

/// Result of one render
#[derive(Debug, Clone)]
pub struct InstanceTree {
    tree: VTree,
    root: NodeId,
}

impl InstanceTree {
    pub fn tree(&self) -> &VTree {
        &self.tree
    }

    /// Root fragment; its path is the engine's root key
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Find a node by structural path
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.root)
            .into_iter()
            .find(|&id| self.tree.get(id).and_then(|n| n.path.as_deref()) == Some(path))
    }

    pub fn to_markup(&self) -> String {
        self.tree.to_markup(self.root)
    }
}

/// Outcome of evaluating one template expression
enum Evaluated {
    Value(Value),
    /// Recorded as a diagnostic; the caller skips what depended on it
    Broken,
}

/// Per-render walk state
struct RenderPass<'t> {
    template: &'t Template,
    out: VTree,
    diagnostics: Vec<Diagnostic>,
}

/// Template engine for one template
pub struct TemplateEngine {
    template: Rc<Template>,
    root_key: String,
    context: Value,
    instance: Option<InstanceTree>,
    diagnostics: Vec<Diagnostic>,
    expressions: HashMap<String, Result<Expression, ExprError>>,
}

impl TemplateEngine {
    pub fn new(template: Rc<Template>) -> Self {
        Self::with_root_key(template, DEFAULT_ROOT_KEY)
    }

    /// Engine whose instance root uses `root_key` as its path
    pub fn with_root_key(template: Rc<Template>, root_key: &str) -> Self {
        Self {
            template,
            root_key: root_key.to_string(),
            context: Value::Undefined,
            instance: None,
            diagnostics: Vec::new(),
            expressions: HashMap::new(),
        }
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    /// Context of the latest successful render
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Latest instance tree
    pub fn render(&self) -> Option<&InstanceTree> {
        self.instance.as_ref()
    }

    /// Diagnostics recorded by the latest render
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Replace the context and recompute the instance tree.
    ///
    /// On error the previous instance tree and context stay in place.
    pub fn set_context(&mut self, context: Value) -> EngineResult<()> {
        let template = Rc::clone(&self.template);
        let mut pass = RenderPass {
            template: &template,
            out: VTree::new(),
            diagnostics: Vec::new(),
        };

        let mut root_node = VNode::fragment();
        root_node.path = Some(self.root_key.clone());
        let root = pass.out.push(root_node);

        let scope = Scope::new(context.clone());
        let root_key = self.root_key.clone();
        self.render_children(&mut pass, template.root(), root, &root_key, &scope)?;

        tracing::debug!(
            "Rendered instance tree: {} nodes, {} diagnostics",
            pass.out.len(),
            pass.diagnostics.len()
        );

        self.context = context;
        self.diagnostics = pass.diagnostics;
        self.instance = Some(InstanceTree { tree: pass.out, root });
        Ok(())
    }

    fn render_children(
        &mut self,
        pass: &mut RenderPass<'_>,
        template_parent: NodeId,
        parent: NodeId,
        parent_path: &str,
        scope: &Scope,
    ) -> EngineResult<()> {
        let template = pass.template;
        let mut counter = PathCounter::default();
        for &child in template.tree().children(template_parent) {
            self.render_node(pass, child, parent, parent_path, &mut counter, scope)?;
        }
        Ok(())
    }

    fn render_node(
        &mut self,
        pass: &mut RenderPass<'_>,
        node: NodeId,
        parent: NodeId,
        parent_path: &str,
        counter: &mut PathCounter,
        scope: &Scope,
    ) -> EngineResult<()> {
        let template = pass.template;
        let Some(template_node) = template.tree().get(node) else {
            return Ok(());
        };

        match &template_node.data {
            NodeData::Element(element) => {
                match element.attributes().get(directives::FOR) {
                    Some(source) => {
                        self.render_repeat(pass, node, element, source, parent, parent_path, counter, scope)
                    }
                    None => self.render_element(pass, node, element, parent, parent_path, counter, scope),
                }
            }
            NodeData::Text(text) => {
                let path = path::child_path(parent_path, NodeKind::Text, counter.peek(NodeKind::Text));
                let Some(content) = self.interpolate(pass, &text.content, &path, scope)? else {
                    return Ok(());
                };
                counter.next(NodeKind::Text);
                self.attach(pass, VNode::text(content), parent, path)?;
                Ok(())
            }
            NodeData::Comment(comment) => {
                let path = path::child_path(parent_path, NodeKind::Comment, counter.next(NodeKind::Comment));
                self.attach(pass, VNode::comment(comment.content.as_str()), parent, path)?;
                Ok(())
            }
            // Nested fragments contribute their children in place
            NodeData::Fragment(_) => {
                for &child in template.tree().children(node) {
                    self.render_node(pass, child, parent, parent_path, counter, scope)?;
                }
                Ok(())
            }
        }
    }

    /// Expand `*for`: one clone per item, all sharing the parent's counter
    #[allow(clippy::too_many_arguments)]
    fn render_repeat(
        &mut self,
        pass: &mut RenderPass<'_>,
        node: NodeId,
        element: &Element,
        source: &str,
        parent: NodeId,
        parent_path: &str,
        counter: &mut PathCounter,
        scope: &Scope,
    ) -> EngineResult<()> {
        let path = path::child_path(parent_path, NodeKind::Element, counter.peek(NodeKind::Element));

        let Some(spec) = RepeatSpec::parse(source) else {
            self.report(
                pass,
                Diagnostic::new(
                    DiagnosticKind::InvalidRepeat,
                    &path,
                    source,
                    "expected `let NAME of EXPR`",
                ),
            );
            return Ok(());
        };

        let Evaluated::Value(iterable) = self.evaluate(pass, spec.iterable, &path, scope)? else {
            return Ok(());
        };

        let Some(items) = iterable.iterate() else {
            self.report(
                pass,
                Diagnostic::new(
                    DiagnosticKind::NotIterable,
                    &path,
                    spec.iterable,
                    format!("{} is not iterable", iterable.type_of()),
                ),
            );
            return Ok(());
        };

        for item in items {
            let item_scope = scope.with_binding(spec.binding, item);
            self.render_element(pass, node, element, parent, parent_path, counter, &item_scope)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn render_element(
        &mut self,
        pass: &mut RenderPass<'_>,
        node: NodeId,
        element: &Element,
        parent: NodeId,
        parent_path: &str,
        counter: &mut PathCounter,
        scope: &Scope,
    ) -> EngineResult<()> {
        let path = path::child_path(parent_path, NodeKind::Element, counter.peek(NodeKind::Element));

        if let Some(source) = element.attributes().get(directives::IF) {
            match self.evaluate(pass, source, &path, scope)? {
                Evaluated::Value(v) if v.is_truthy() => {}
                _ => return Ok(()),
            }
        }

        let mut attributes = AttributeBag::new();
        let mut bindings = Vec::new();
        for (name, value) in element.attributes().iter() {
            if directives::is_structural(name) {
                continue;
            }

            if let Some(bound) = AttributeBag::bound_name(name) {
                match self.evaluate(pass, value, &path, scope)? {
                    Evaluated::Value(v) if v.is_nullish() => {
                        attributes.remove(bound);
                    }
                    Evaluated::Value(v) => {
                        attributes.set(bound, v.to_display_string());
                    }
                    Evaluated::Broken => return Ok(()),
                }
            } else if let Some(event_type) = directives::event_name(name) {
                bindings.push((event_type, value));
            } else {
                attributes.set(name, value);
            }
        }

        let mut instance = Element::new(element.tag.as_str());
        *instance.attributes_mut() = attributes;

        for (event_type, source) in bindings {
            match self.evaluate(pass, source, &path, scope)? {
                Evaluated::Value(Value::Function(func)) => {
                    instance
                        .events_mut()
                        .add(event_type, listener(func), ListenerOptions::default());
                }
                Evaluated::Value(other) => self.report(
                    pass,
                    Diagnostic::new(
                        DiagnosticKind::NotAFunction,
                        &path,
                        source,
                        format!("({}) handler is {}, not a function", event_type, other.type_of()),
                    ),
                ),
                Evaluated::Broken => {}
            }
        }

        counter.next(NodeKind::Element);
        let id = self.attach(pass, VNode::new(NodeData::Element(instance)), parent, path.clone())?;
        self.render_children(pass, node, id, &path, scope)
    }

    fn attach(&mut self, pass: &mut RenderPass<'_>, mut node: VNode, parent: NodeId, path: String) -> EngineResult<NodeId> {
        node.path = Some(path);
        let id = pass.out.push(node);
        pass.out.append_child(parent, id)?;
        Ok(id)
    }

    /// Substitute every `{{ }}` span; `None` when a span is broken
    fn interpolate(
        &mut self,
        pass: &mut RenderPass<'_>,
        text: &str,
        path: &str,
        scope: &Scope,
    ) -> EngineResult<Option<String>> {
        let mut out = String::with_capacity(text.len());
        for segment in interpolate::split(text) {
            match segment {
                Segment::Literal(s) => out.push_str(&s),
                Segment::Expr(source) => match self.evaluate(pass, source, path, scope)? {
                    Evaluated::Value(v) => out.push_str(&v.to_display_string()),
                    Evaluated::Broken => return Ok(None),
                },
            }
        }
        Ok(Some(out))
    }

    /// Compile (cached) and evaluate an expression.
    ///
    /// Syntax and ordinary evaluation errors become diagnostics; errors
    /// raised by context functions abort the render.
    fn evaluate(
        &mut self,
        pass: &mut RenderPass<'_>,
        source: &str,
        path: &str,
        scope: &Scope,
    ) -> EngineResult<Evaluated> {
        let compiled = self
            .expressions
            .entry(source.to_string())
            .or_insert_with(|| Expression::compile(source))
            .clone();

        let expression = match compiled {
            Ok(expression) => expression,
            Err(err) => {
                self.report(pass, Diagnostic::new(DiagnosticKind::Syntax, path, source, err.to_string()));
                return Ok(Evaluated::Broken);
            }
        };

        match expression.evaluate(scope) {
            Ok(value) => Ok(Evaluated::Value(value)),
            Err(error @ EvalError::Thrown(_)) => Err(EngineError::Evaluation {
                path: path.to_string(),
                source_text: source.to_string(),
                error,
            }),
            Err(err) => {
                self.report(pass, Diagnostic::new(DiagnosticKind::Evaluation, path, source, err.to_string()));
                Ok(Evaluated::Broken)
            }
        }
    }

    fn report(&self, pass: &mut RenderPass<'_>, diagnostic: Diagnostic) {
        tracing::warn!("Skipping node: {}", diagnostic);
        pass.diagnostics.push(diagnostic);
    }

    /// Number of distinct expression sources compiled so far
    pub fn cached_expressions(&self) -> usize {
        self.expressions.len()
    }
}

/// Listener that forwards the event to a context function. The listener
/// takes the function's identity, so an unchanged handler is not re-bound.
fn listener(func: NativeFunction) -> Callback {
    let id = CallbackId(func.id());
    Callback::with_id(id, move |event: &Event| {
        let detail = event.detail.as_deref().map(Value::from).unwrap_or(Value::Null);
        let arg = Value::object([
            ("type", Value::from(event.event_type.as_str())),
            ("detail", detail),
        ]);
        if let Err(err) = func.call(&[arg]) {
            tracing::warn!("Event handler {} failed: {}", func.name(), err);
        }
    })
}
