//! # Failing-Route Check
//!
//! Finds routes that served traffic but never returned an OK response over
//! a whole day, annotates each with its owning teams, and raises one chat
//! alert. 401/404/405/501 count as OK here: they are client mistakes, not
//! broken routes. Runs from cron once per day.

use crate::alert::AlertSink;
use crate::model::TeamId;
use crate::warehouse::{str_field, u64_field, Warehouse};
use crate::Ownership;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Routes that legitimately never return 2xx, kept out of the report.
pub const ROUTES_EXPECTED_TO_FAIL: &[&str] = &[
    "main:/crash",
    // Logged with a null status.
    "/_ah/start.*",
    // Valid GraphQL traffic carries the query name in the route; the bare
    // and method-only forms are what clients probing the endpoint produce.
    "api_main:/api/internal/graphql [POST]",
    "api_main:/api/internal/graphql",
    "api_main:/api/internal/graphql [HEAD]",
];

/// One failing route with its request breakdown and resolved owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailingRoute {
    pub route: String,
    pub owners: BTreeSet<TeamId>,
    pub total_reqs: u64,
    pub bot_reqs: u64,
    pub num_ips: u64,
}

fn day_query(project: &str, yyyymmdd: &str) -> String {
    format!(
        r#"SELECT
  route,
  ok_reqs,
  bot_reqs,
  num_ips,
  total_reqs
FROM (
  SELECT
    elog_url_route AS route,
    SUM((status >= 200 AND status < 400) OR status IN (401, 404, 405, 501))
        AS ok_reqs,
    SUM(elog_device_type IS NULL OR elog_device_type = "bot/dev")
        AS bot_reqs,
    COUNT(DISTINCT ip) AS num_ips,
    SUM(1) AS total_reqs
  FROM
    [{project}:logs.requestlogs_{yyyymmdd}]
  GROUP BY
    route)
WHERE
  ok_reqs = 0
  AND total_reqs > 0
  -- We ignore errors that are just from bots
  AND total_reqs > bot_reqs
  -- A single bad IP is likely just a broken client of some sort
  AND num_ips > 1
"#
    )
}

/// Query one day of request logs and resolve owners for every route that
/// failed all day, expected failures filtered out.
pub fn failing_routes(
    warehouse: &dyn Warehouse,
    ownership: &Ownership,
    project: &str,
    date: NaiveDate,
) -> Result<Vec<FailingRoute>> {
    let yyyymmdd = date.format("%Y%m%d").to_string();
    let rows = warehouse.query(&day_query(project, &yyyymmdd))?;

    let mut failing = Vec::new();
    for row in rows {
        let route = str_field(&row, "route")?;
        if ROUTES_EXPECTED_TO_FAIL.contains(&route) {
            continue;
        }
        failing.push(FailingRoute {
            route: route.to_string(),
            owners: ownership.route_owners(route)?,
            total_reqs: u64_field(&row, "total_reqs")?,
            bot_reqs: u64_field(&row, "bot_reqs")?,
            num_ips: u64_field(&row, "num_ips")?,
        });
    }
    Ok(failing)
}

fn plural(word: &str, count: u64) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn describe(route: &FailingRoute) -> String {
    let owners: Vec<&str> = route.owners.iter().map(TeamId::as_str).collect();
    format!(
        "`{}` owned by {} ({} {} total, {} of them bots, {} unique {})",
        route.route,
        owners.join(", "),
        route.total_reqs,
        plural("request", route.total_reqs),
        route.bot_reqs,
        route.num_ips,
        plural("IP", route.num_ips),
    )
}

/// The alert body for a non-empty set of failing routes.
pub fn render_report(failing: &[FailingRoute], date: NaiveDate) -> String {
    let lines: Vec<String> = failing.iter().map(describe).collect();
    format!(
        "{} did not return any 2xx responses on {}:\n{}",
        plural("Route", failing.len() as u64),
        date.format("%m/%d/%y"),
        lines.join("\n")
    )
}

/// Run the daily check. With an alert sink the report goes to `channel`;
/// without one (dry run) it is printed, including the all-clear case.
pub fn check(
    warehouse: &dyn Warehouse,
    ownership: &Ownership,
    alerts: Option<(&dyn AlertSink, &str)>,
    project: &str,
    date: NaiveDate,
) -> Result<()> {
    let failing = failing_routes(warehouse, ownership, project, date)?;

    match alerts {
        None => {
            if failing.is_empty() {
                println!(
                    "No routes with no 2xx requests for {}",
                    date.format("%m/%d/%y")
                );
            } else {
                println!(
                    "Routes with no 2xx requests for {}:\n{}",
                    date.format("%m/%d/%y"),
                    failing.iter().map(describe).collect::<Vec<_>>().join("\n")
                );
            }
        }
        Some((sink, channel)) => {
            if !failing.is_empty() {
                sink.send(channel, &render_report(&failing, date))?;
            }
        }
    }
    Ok(())
}
