//! Counter - click handling and incremental updates against the in-memory host
//!
//! Run with `RUST_LOG=debug cargo run -p loom --example counter`.

use loom::dom::Event;
use loom::{Config, MemoryHost, Value, View};
use std::cell::Cell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

const TEMPLATE: &str = r#"
<div class="counter">
  <button (click)="increment">+1</button>
  <span [data-count]="count">{{ count }} clicks</span>
  <em *if="count >= 3">that's a lot</em>
</div>
"#;

fn context(count: usize, increment: &Value) -> Value {
    Value::object([("count", Value::from(count)), ("increment", increment.clone())])
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let clicks = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&clicks);
    let increment = Value::function("increment", move |_| {
        counter.set(counter.get() + 1);
        Ok(Value::Undefined)
    });

    let mut view = View::new(TEMPLATE, Config::default(), MemoryHost::new())?;
    view.set_context(context(clicks.get(), &increment))?;
    view.flush()?;

    let root = view.root().ok_or_else(|| anyhow::anyhow!("view has no root"))?;
    let button = view
        .host_node("root/element:0/element:0")
        .ok_or_else(|| anyhow::anyhow!("button was not rendered"))?;
    println!("{}", view.host().to_markup(root));

    for _ in 0..3 {
        view.host_mut().dispatch(button, &Event::new("click"))?;
        view.host_mut().take_mutations();

        view.set_context(context(clicks.get(), &increment))?;
        let report = smol::block_on(view.tick())?;

        println!("{}", view.host().to_markup(root));
        println!("  {} mutations: {:?}", report.committed, view.host().mutations());
    }

    Ok(())
}
