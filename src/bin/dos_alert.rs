//! Five-minute sweep of the edge request logs for DoS-like traffic. Run
//! by cron; each run covers the trailing five-minute window.

use anyhow::Result;
use chrono::Utc;
use opsdash::dos;
use opsdash::{BqCli, OpsConfig, SlackWebhook};
use tracing_subscriber::EnvFilter;

fn parse_arg(flag: &str) -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = OpsConfig::load(parse_arg("--config").as_deref())?;
    let warehouse = BqCli::new(&config.warehouse.bq_bin, &config.warehouse.project);
    let sink = SlackWebhook::new(&config.alerts.webhook_url);

    dos::run(
        &warehouse,
        &sink,
        &config.alerts.channel,
        &config.warehouse.project,
        Utc::now(),
    )
}
