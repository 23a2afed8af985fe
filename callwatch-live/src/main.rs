//! callwatch-live - tail a booking campaign's live call progress
//!
//! Connects to the orchestrator's transcript socket for one campaign
//! group, keeps a projection of every provider call, and prints the
//! derived summary as it changes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info};

use callwatch_common::config::ClientConfig;
use callwatch_live::socket::LiveSession;
use callwatch_live::CampaignView;

#[derive(Parser)]
#[command(
    name = "callwatch-live",
    version,
    about = "Follow a booking campaign's calls as they happen"
)]
struct Args {
    /// Campaign group id to follow
    group_id: String,

    /// REST base URL of the orchestrator
    #[arg(long, env = "CALLWATCH_API_URL")]
    api_url: Option<String>,

    /// Transcript socket base URL (derived from the API URL when omitted)
    #[arg(long, env = "CALLWATCH_WS_URL")]
    ws_url: Option<String>,

    /// Confirm the best match automatically once the campaign completes
    #[arg(long)]
    confirm_best: bool,

    /// Request cancellation after this many seconds
    #[arg(long)]
    cancel_after: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!(
        "Starting callwatch-live v{} for group {}",
        env!("CARGO_PKG_VERSION"),
        args.group_id
    );

    let config = ClientConfig::resolve(args.api_url.as_deref(), args.ws_url.as_deref())?;
    info!(api = %config.api_url, socket = %config.ws_url, "resolved endpoints");

    let session = Arc::new(LiveSession::new(&config, &args.group_id)?);
    let store = session.store();

    let mut views = store.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = String::new();
        loop {
            match views.recv().await {
                Ok(view) => {
                    let line = render(&view);
                    if line != last {
                        println!("{}", line);
                        last = line;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    if let Some(secs) = args.cancel_after {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            if let Err(e) = session.cancel().await {
                error!(error = %e, "cancel request rejected");
            }
        });
    }

    session.run().await?;
    printer.abort();

    let view = store.view().await;
    println!("{}", render(&view));
    for (rank, rec) in view.booked.iter().enumerate() {
        let slot = rec
            .offered_slot
            .as_ref()
            .map(|s| format!("{} {}", s.date, s.time))
            .unwrap_or_else(|| "slot tbd".to_string());
        println!(
            "  #{} {} — {} (score {})",
            rank + 1,
            display_name(&rec.name, &rec.provider_id),
            slot,
            rec.score.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "-".into())
        );
    }

    if args.confirm_best {
        match view.best_match {
            Some(best) => match session.api().confirm(&args.group_id, &best.provider_id).await {
                Ok(()) => info!(provider_id = %best.provider_id, "booking confirmed"),
                Err(e) => error!(error = %e, "confirmation rejected"),
            },
            None => info!("no booked result to confirm"),
        }
    }

    Ok(())
}

fn display_name<'a>(name: &'a str, provider_id: &'a str) -> &'a str {
    if name.is_empty() {
        provider_id
    } else {
        name
    }
}

/// One-line campaign summary plus compact per-call statuses.
fn render(view: &CampaignView) -> String {
    let mut line = format!(
        "[{}] {}/{} done, {} active",
        view.phase, view.done, view.total, view.active
    );
    if let Some(message) = &view.message {
        line.push_str(" — ");
        line.push_str(message);
    }
    let now = Utc::now();
    for rec in &view.records {
        line.push_str(&format!(
            " | {}: {}",
            display_name(&rec.name, &rec.provider_id),
            rec.status
        ));
        if rec.status.is_active() {
            if let Some(started) = rec.started_at {
                let secs = (now - started).num_seconds().max(0);
                line.push_str(&format!(" ({}:{:02})", secs / 60, secs % 60));
            }
        }
    }
    line
}
