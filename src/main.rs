use std::env;
use std::time::Duration;

use dotenv::dotenv;
use traemon::{ScrapingContext, UsageData};

extern crate env_logger;
extern crate log;

use log::LevelFilter;

use log::{error, info, warn};

fn log_usage_summary(usage: &UsageData) {
    if !usage.plan_type.is_empty() {
        info!("Plan: {}", usage.plan_type);
    }
    if !usage.reset_date.is_empty() {
        info!(
            "Usage resets on {} ({} days remaining)",
            usage.reset_date, usage.days_remaining
        );
    }
    for item in &usage.items {
        info!("{}: {}/{} {}", item.title, item.current, item.total, item.unit);
    }
}

async fn run_login_wait_job(context: &ScrapingContext) {
    info!("Waiting for a live session on {}", context.scraping_config.base_url());
    if context.service.reset_login().await {
        info!("Session detected, usage data cached.");
    } else {
        warn!("Login wait timed out without extractable usage data.");
    }
}

async fn run_initial_fetch_job(context: &ScrapingContext) {
    match context.service.get_usage_data().await {
        Some(usage) => log_usage_summary(&usage),
        None => warn!("No usage data could be extracted; will retry on the next tick."),
    }
    if let Some(active) = context.service.get_active_days().await {
        info!("Activity board: {} day(s) tracked", active.cells.len());
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let context = match ScrapingContext::new() {
        Ok(context) => context,
        Err(e) => {
            error!("Could not build the scraping context: {e:#}");
            return;
        }
    };

    if env::args().any(|arg| arg == "--login") {
        run_login_wait_job(&context).await;
    }

    run_initial_fetch_job(&context).await;

    // the store clamps on write, but the file is hand-editable
    let interval_secs = context.service.get_config().refresh_interval_seconds.max(1);
    info!("Refreshing every {interval_secs}s");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    // the first tick completes immediately and we've already fetched
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Some(usage) = context.service.refresh_now().await {
            log_usage_summary(&usage);
        }
    }
}
