//! Scripted demo session.
//!
//! Adds a few items, plays with the filter and prints the resulting view.
//! The window title follows `CountChanged` notifications the way a UI would.

use anyhow::Context;
use std::time::Duration;
use tasklist_todo::{Filter, SessionConfig, TodoSession, follow_count_changes, window_title};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = SessionConfig::from_env().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Tasklist ===\n");

    let session = TodoSession::start(&config).await?;
    println!("{}", session.view().heading);

    let title_watcher = tokio::spawn(follow_count_changes(
        session.subscribe_todo_events(),
        |total| println!("  [title] {}", window_title(total)),
    ));

    for text in ["Buy milk", "   ", "Write documentation", "Deploy to production"] {
        println!("add({text:?})");
        session.add(text).await?;
    }

    let todos = session.todos();
    if let Some(first) = todos.items().first() {
        println!("toggle({})", first.id);
        session.toggle(first.id).await?;
    }
    if let Some(last) = todos.items().last() {
        println!("delete({})", last.id);
        session.delete(last.id).await?;
    }

    let filter: Filter = "active".parse()?;
    session.set_filter(filter).await?;

    let outcome = session
        .wait_for_identity(config.identity_latency + Duration::from_secs(1))
        .await
        .context("waiting for identity")?;
    if outcome.is_fallback() {
        println!("\nIdentity lookup failed, continuing as guest");
    }

    let view = session.view();
    println!("\n{}", view.heading);
    println!("Filter: {}", view.filter);
    for item in &view.items {
        let status = if item.completed { "✓" } else { " " };
        println!("  [{status}] #{} {} ({})", item.sequence_number, item.text, item.priority);
    }
    if let Some(message) = view.empty_message {
        println!("  {message}");
    }
    println!(
        "\nActive: {} / Completed: {} / Total: {}",
        view.counts.active, view.counts.completed, view.counts.total
    );
    println!("\nDebug: {}", serde_json::to_string_pretty(&view.debug)?);

    session.shutdown(Duration::from_secs(5)).await?;

    // Dropping the last store handle closes the notification channel
    drop(session);
    title_watcher.await?;

    println!("\n=== Done ===");
    Ok(())
}
