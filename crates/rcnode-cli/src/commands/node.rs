//! `rcnode send` / `rcnode progress`: talk to the node directly.

use rcnode_core::transport::{positional_params, query_progress};
use rcnode_core::workflow::{format_command, Command};
use rcnode_core::RcNodeTransport;

use super::{print_json, NodeContext};

/// Send a single command and print the node's response.
pub async fn send(ctx: &NodeContext, command: &str, params: &[String]) -> Result<(), String> {
    let line = format_command(&Command::new(command).with_params(params.iter().cloned()));
    tracing::info!("[rcnode] Sending: {}", line);

    let response = ctx
        .client
        .send(&ctx.config, command, &positional_params(params))
        .await
        .map_err(|e| format!("Command '{}' failed: {}", line, e))?;

    print_json(&response);
    Ok(())
}

/// Query the node's progress once.
pub async fn progress(ctx: &NodeContext) -> Result<(), String> {
    let progress = query_progress(&ctx.client, &ctx.config)
        .await
        .map_err(|e| format!("Progress query failed: {}", e))?;

    match progress {
        Some(p) => print_json(&serde_json::json!({
            "progress": p.progress,
            "message": p.message,
        })),
        None => println!("No progress reported by node"),
    }
    Ok(())
}
