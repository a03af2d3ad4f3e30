//! Example native project model.
//!
//! Registers a small native project, realizes every binary and logs the
//! names Arbor derived for it.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=arbor_registry=debug native-model
//! ```

use arbor_model::prelude::*;
use arbor_plugins::{TracingFormat, TracingPlugin};
use arbor_registry::prelude::*;
use example::{Binary, NativePlugin, register_project};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "model configuration failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut logging = TracingPlugin::new().with_format(TracingFormat::Compact);
    if let Ok(filter) = env::var("RUST_LOG") {
        logging = logging.with_env_filter(filter);
    }

    let mut registry = ModelRegistry::new();
    registry.apply_plugin(logging)?;
    registry.apply_plugin(NativePlugin)?;
    registry.configure_each::<dyn Binary, _>("report_binary", |registry, node, binary| {
        let component = registry.fully_qualified_name(node)?;
        tracing::info!(
            component,
            file = %binary.file_name(),
            "binary realized"
        );
        Ok(())
    })?;

    let nodes = register_project(&mut registry)?;
    let root = nodes[0];
    for &node in &nodes[1..] {
        registry.transition(node, ModelState::Realized)?;
        let path = registry.node(node)?.to_string();
        let qualified = registry.fully_qualified_name(node)?;
        let relative = registry.relative_name(node, root)?.unwrap_or_default();
        tracing::info!(
            %path,
            qualified,
            %relative,
            "component configured"
        );
    }

    tracing::info!(
        nodes = registry.len(),
        rules = registry.rule_count(),
        "model complete"
    );
    Ok(())
}
