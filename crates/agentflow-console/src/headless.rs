//! One-shot runner without a terminal UI.

use std::io::Write;

use agentflow_network::{StreamConnector, StreamError, StreamItem};
use agentflow_protocol::NodeRegistry;

use crate::controller::{RunOutcome, StreamController};

/// Start one run, apply items until it ends, and write each transition plus
/// a final node table to `out`.
pub async fn run_headless<C, W>(
    controller: &mut StreamController<C>,
    registry: &NodeRegistry,
    out: &mut W,
) -> Result<RunOutcome, anyhow::Error>
where
    C: StreamConnector,
    W: Write,
{
    if !controller.start() {
        anyhow::bail!("a stream is already open");
    }
    writeln!(out, "streaming from {}", controller.connector().endpoint())?;

    while controller.is_streaming() {
        let Some(item) = controller.next_item().await else {
            controller.on_error(StreamError::Closed);
            break;
        };
        match item {
            StreamItem::Event(event) => {
                let line = format_transition(&event.node, &event.status.to_string(), &event.message);
                if let Some(applied) = controller.on_event(event) {
                    writeln!(out, "{line}")?;
                    for name in &applied.deactivated {
                        writeln!(out, "{}", format_transition(name, "inactive", ""))?;
                    }
                }
            }
            StreamItem::Error(err) => {
                writeln!(out, "stream failed: {err}")?;
                controller.on_error(err);
            }
        }
    }

    write_summary(controller, registry, out)?;

    // the loop only exits once the run has finished
    let outcome = controller
        .last_outcome()
        .cloned()
        .unwrap_or_else(|| RunOutcome::Failed("run ended without an outcome".to_string()));
    Ok(outcome)
}

fn format_transition(node: &str, status: &str, message: &str) -> String {
    if message.is_empty() {
        format!("{node:<20} {status:<9}")
    } else {
        format!("{node:<20} {status:<9} {message}")
    }
}

fn write_summary<C: StreamConnector, W: Write>(
    controller: &StreamController<C>,
    registry: &NodeRegistry,
    out: &mut W,
) -> std::io::Result<()> {
    let view = controller.view();
    writeln!(out)?;
    writeln!(out, "{:<20} {:<9} MESSAGE", "NODE", "STATUS")?;
    for node in registry.iter() {
        let status = view.status_of(node.name);
        let message = view.get(node.name).map(|s| s.message.as_str()).unwrap_or("");
        writeln!(out, "{}", format_transition(&node.display_name(), status.as_str(), message))?;
    }
    for (name, state) in view.iter().filter(|(name, _)| !registry.contains(name)) {
        writeln!(
            out,
            "{} (unplaced)",
            format_transition(name, state.status.as_str(), &state.message)
        )?;
    }
    Ok(())
}
