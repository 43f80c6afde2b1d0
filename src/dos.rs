//! # DoS-Pattern Check
//!
//! Simplistic denial-of-service sweep over the edge request logs, run from
//! cron every five minutes. Two patterns only: a single client hammering
//! one URL, and scratchpad-creation spam. Hits are reported to chat so an
//! operator can blacklist the IP at the edge.
//!
//! Profile-notification polling (`countBrandNewNotifications`) is excluded:
//! some clients request it continuously and it has never been an attack.

use crate::alert::AlertSink;
use crate::warehouse::{str_field, u64_field, Warehouse};
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};

const EDGE_DATASET: &str = "fastly";
const EDGE_LOG_TABLE_PREFIX: &str = "khanacademy_dot_org_logs";

/// Alert when a single client exceeds this many requests per second.
const MAX_REQS_SEC: u64 = 4;

/// Size of the queried window, in seconds.
pub const PERIOD_SECS: i64 = 5 * 60;

/// Alert when one IP creates more than this many scratchpads per window.
const MAX_SCRATCHPADS: u64 = 50;

/// How long a log line may take to arrive in the streaming table.
const MAX_LOG_DELAY_MS: i64 = 5 * 60 * 1000;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single client requesting one URL at an implausible rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloodHit {
    pub ip: String,
    pub url: String,
    pub user_agent: String,
    pub count: u64,
}

/// An IP mass-creating scratchpads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchpadHit {
    pub ip: String,
    pub count: u64,
}

/// Streaming-table names covering `[start, end)`, shrunk with table
/// decorators so the every-five-minutes run doesn't scan the whole day.
/// Decorators force legacy SQL, so callers can't use wildcard tables.
fn edge_log_tables(project: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let latest_duration = PERIOD_SECS * 1000 + MAX_LOG_DELAY_MS;
    // A window crossing midnight spans two daily tables.
    let dates = if end.day() == start.day() {
        vec![end]
    } else {
        vec![end, start]
    };
    dates
        .iter()
        .map(|date| {
            format!(
                "[{project}.{dataset}.{prefix}_{table_date}@-{latest_duration}-]",
                dataset = EDGE_DATASET,
                prefix = EDGE_LOG_TABLE_PREFIX,
                table_date = date.format("%Y%m%d"),
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// The edge logs carry the timestamp as a string with a trailing zone
// marker the warehouse can't parse; the zone is always +0000, so the
// queries trim to the first 19 characters.

fn flood_query(project: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        r#"SELECT
  client_ip AS ip,
  url,
  request_user_agent AS user_agent,
  COUNT(*) AS count
FROM
  {tables}
WHERE
  TIMESTAMP(LEFT(timestamp, 19)) >= TIMESTAMP('{start}')
  AND TIMESTAMP(LEFT(timestamp, 19)) < TIMESTAMP('{end}')
  AND NOT(url CONTAINS 'countBrandNewNotifications')
  AND LEFT(url, 5) != '/_ah/'
  AND at_edge_node
GROUP BY
  ip,
  url,
  user_agent
HAVING
  count > {max_count}
ORDER BY
  count DESC
"#,
        tables = edge_log_tables(project, start, end),
        start = start.format(TS_FORMAT),
        end = end.format(TS_FORMAT),
        max_count = MAX_REQS_SEC * PERIOD_SECS as u64,
    )
}

fn scratchpad_query(project: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        r#"SELECT
  client_ip AS ip,
  COUNT(*) AS count
FROM
  {tables}
WHERE
  request = 'POST'
  AND url LIKE '/api/internal/scratchpads%'
  AND TIMESTAMP(LEFT(timestamp, 19)) >= TIMESTAMP('{start}')
  AND TIMESTAMP(LEFT(timestamp, 19)) < TIMESTAMP('{end}')
  AND at_edge_node
GROUP BY
  ip
HAVING
  count > {max_count}
ORDER BY
  count DESC
"#,
        tables = edge_log_tables(project, start, end),
        start = start.format(TS_FORMAT),
        end = end.format(TS_FORMAT),
        max_count = MAX_SCRATCHPADS,
    )
}

/// Clients requesting one URL more than [`MAX_REQS_SEC`] times per second
/// over the window.
pub fn detect_url_floods(
    warehouse: &dyn Warehouse,
    project: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<FloodHit>> {
    warehouse
        .query(&flood_query(project, start, end))?
        .iter()
        .map(|row| {
            Ok(FloodHit {
                ip: str_field(row, "ip")?.to_string(),
                url: str_field(row, "url")?.to_string(),
                user_agent: str_field(row, "user_agent")?.to_string(),
                count: u64_field(row, "count")?,
            })
        })
        .collect()
}

/// IPs creating more than [`MAX_SCRATCHPADS`] scratchpads over the window.
pub fn detect_scratchpad_spam(
    warehouse: &dyn Warehouse,
    project: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ScratchpadHit>> {
    warehouse
        .query(&scratchpad_query(project, start, end))?
        .iter()
        .map(|row| {
            Ok(ScratchpadHit {
                ip: str_field(row, "ip")?.to_string(),
                count: u64_field(row, "count")?,
            })
        })
        .collect()
}

fn flood_alert(hit: &FloodHit) -> String {
    format!(
        "*Possible DoS alert*\n\
         IP: <https://db-ip.com/{ip}|{ip}>\n\
         Reqs in last 5 minutes: {count}\n\
         URL: {url}\n\
         User agent: {user_agent}\n\
         \n\
         Consider blacklisting the IP at the edge: \
         \"View active configuration\", then \"IP block list\" under \"Settings\".\n\
         \n\
         Users from this IP: <https://www.khanacademy.org/devadmin/users?ip={ip}|devadmin/users>\n\
         \n\
         See requests in the {dataset}.{prefix}_YYYYMMDD table",
        ip = hit.ip,
        count = hit.count,
        url = hit.url,
        user_agent = hit.user_agent,
        dataset = EDGE_DATASET,
        prefix = EDGE_LOG_TABLE_PREFIX,
    )
}

fn scratchpad_alert(hits: &[ScratchpadHit]) -> String {
    let mut message = format!(
        "*Possible Scratchpad DoS alert*\n\
         \n\
         Below is a list of IPs which have submitted more than {MAX_SCRATCHPADS} new\n\
         scratchpads in the last 5 minutes. A link to query a user by IP is included\n\
         below.\n"
    );
    for hit in hits {
        message.push_str(&format!(
            "\nIP: <https://db-ip.com/{ip}|{ip}>\n\
             Count: {count}\n\
             User by IP: <https://www.khanacademy.org/devadmin/users?ip={ip}>\n",
            ip = hit.ip,
            count = hit.count,
        ));
    }
    message
}

/// Run both detections for the window ending at `end`: one alert per
/// flooding client, one combined alert for scratchpad spam.
pub fn run(
    warehouse: &dyn Warehouse,
    alerts: &dyn AlertSink,
    channel: &str,
    project: &str,
    end: DateTime<Utc>,
) -> Result<()> {
    let start = end - ChronoDuration::seconds(PERIOD_SECS);

    for hit in detect_url_floods(warehouse, project, start, end)? {
        alerts.send(channel, &flood_alert(&hit))?;
    }

    let spam = detect_scratchpad_spam(warehouse, project, start, end)?;
    if !spam.is_empty() {
        alerts.send(channel, &scratchpad_alert(&spam))?;
    }
    Ok(())
}
