//! Remote session against a running browser.
//!
//! Demonstrates:
//! - Configuring a `RemoteDriver` from `PORT`
//! - Listening for notifications
//! - Sending commands and reading results
//! - Disconnecting cleanly
//!
//! Start a browser with remote debugging first:
//!   chrome --headless --remote-debugging-port=9222
//!
//! Usage:
//!   cargo run --example remote_session
//!   cargo run --example remote_session -- --debug
//!   PORT=9333 cargo run --example remote_session

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use devtools_connection::{Connection, RemoteDriver};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const PAGE_URL: &str = "https://example.com";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let debug = std::env::args().any(|a| a == "--debug");
    let filter = if debug {
        "devtools_connection=debug"
    } else {
        "devtools_connection=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    println!("=== Remote Session ===\n");

    // ========================================================================
    // Connect
    // ========================================================================

    let driver = RemoteDriver::from_env()?;
    println!("[1] Connecting to {}...", driver.discovery().base_url());
    driver
        .connect()
        .await
        .context("is a browser listening with --remote-debugging-port?")?;

    if let Some(target) = driver.target() {
        println!("    ✓ Target {} ({})\n", target.id, target.target_type);
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    driver.on_notification(|event| {
        if event.domain() == "Page" {
            println!("    [event] {}", event.method);
        }
    })?;

    driver.send_command("Page.enable", None).await?;

    // ========================================================================
    // Commands
    // ========================================================================

    println!("[2] Navigating to {PAGE_URL}...");
    let navigation = driver
        .send_command_with_timeout(
            "Page.navigate",
            Some(json!({"url": PAGE_URL})),
            Duration::from_secs(30),
        )
        .await?;
    println!("    ✓ Frame {}\n", navigation["frameId"]);

    tokio::time::sleep(Duration::from_secs(1)).await;

    println!("[3] Reading title...");
    let title = driver
        .send_command(
            "Runtime.evaluate",
            Some(json!({"expression": "document.title", "returnByValue": true})),
        )
        .await?;
    println!("    ✓ {}\n", title["result"]["value"]);

    // ========================================================================
    // Cleanup
    // ========================================================================

    let target_id = driver.target().map(|t| t.id);
    driver.disconnect().await?;
    if let Some(id) = target_id {
        driver.discovery().close_target(&id).await?;
    }

    println!("=== Done ===");
    Ok(())
}
