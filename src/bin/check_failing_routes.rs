//! Daily check for routes that never return OK responses. Run by cron
//! once per day, reporting on the previous day by default.

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use opsdash::failing_routes;
use opsdash::{AlertSink, BqCli, OpsConfig, Ownership, SlackWebhook};
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

fn has_flag(flag: &str) -> bool {
    std::env::args().any(|arg| arg == flag)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = OpsConfig::load(parse_arg("--config").as_deref())?;
    let date = match parse_arg("--date") {
        Some(date) => NaiveDate::parse_from_str(&date, "%Y%m%d")?,
        None => (Utc::now() - Duration::days(1)).date_naive(),
    };
    let dry_run = has_flag("--dry-run") || has_flag("-n");

    let ownership = Ownership::new(&config.ownership);
    let warehouse = BqCli::new(&config.warehouse.bq_bin, &config.warehouse.project);

    if dry_run {
        failing_routes::check(&warehouse, &ownership, None, &config.warehouse.project, date)
    } else {
        let sink = SlackWebhook::new(&config.alerts.webhook_url);
        failing_routes::check(
            &warehouse,
            &ownership,
            Some((&sink as &dyn AlertSink, config.alerts.channel.as_str())),
            &config.warehouse.project,
            date,
        )
    }
}
