//! Text rendering for backend payloads.
//!
//! [`render`] is a pure function: the same [`View`] and payload always give
//! the same string. Empty lists render as an explicit "none found" sentence,
//! never as an empty string, so they can't be mistaken for a failure.
//!
//! Dates are ISO-8601 (`2025-01-01`, `2025-01-01T20:00:00Z`) and sizes are
//! plain decimals with two places, independent of locale.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::config::Service;

/// Rendered for a queue with no records.
pub const EMPTY_QUEUE: &str = "Download queue is empty.";

/// Maximum number of search matches listed.
pub const SEARCH_LIMIT: usize = 10;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// What a payload represents and the request parameters that shape its text.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    /// `GET series`, filtered to entries added after `cutoff`.
    RecentSeries { days: u32, cutoff: DateTime<Utc> },
    /// `GET movie`, filtered to entries added after `cutoff`.
    RecentMovies { days: u32, cutoff: DateTime<Utc> },
    SeriesCalendar { days: u32 },
    MovieCalendar { days: u32 },
    SeriesSearch { query: &'a str },
    MovieSearch { query: &'a str },
    /// Payload is `{"status": <system/status>, "diskspace": <diskspace>}`.
    SystemStatus { service: Service },
    SeriesQueue,
    MovieQueue,
    /// Acknowledgement of a queued backend command.
    Command {
        action: &'a str,
        subject: &'a str,
        id: u64,
    },
}

/// Render `payload` as text according to `view`.
pub fn render(view: &View<'_>, payload: &Value) -> String {
    match *view {
        View::RecentSeries { days, cutoff } => {
            let recent = added_since(payload, cutoff);
            if recent.is_empty() {
                return format!("No series added in the last {days} days.");
            }
            list(
                format!("Recently added series (last {days} days):"),
                recent.into_iter().map(|(added, show)| {
                    let mut parts = vec![format!("added {}", added.format("%Y-%m-%d"))];
                    push_field(&mut parts, "network", str_field(show, "network"));
                    if let Some(n) = season_count(show) {
                        parts.push(format!("{n} seasons"));
                    }
                    push_field(&mut parts, "status", str_field(show, "status"));
                    line(&with_year(show), &parts)
                }),
            )
        }
        View::RecentMovies { days, cutoff } => {
            let recent = added_since(payload, cutoff);
            if recent.is_empty() {
                return format!("No movies added in the last {days} days.");
            }
            list(
                format!("Recently added movies (last {days} days):"),
                recent.into_iter().map(|(added, movie)| {
                    let mut parts = vec![format!("added {}", added.format("%Y-%m-%d"))];
                    push_field(&mut parts, "studio", str_field(movie, "studio"));
                    push_field(&mut parts, "status", str_field(movie, "status"));
                    line(&with_year(movie), &parts)
                }),
            )
        }
        View::SeriesCalendar { days } => {
            let episodes = items(payload);
            if episodes.is_empty() {
                return format!("No episodes airing in the next {days} days.");
            }
            list(
                format!("Upcoming episodes (next {days} days):"),
                episodes.iter().map(|ep| {
                    let series = ep
                        .get("series")
                        .and_then(|s| str_field(s, "title"))
                        .unwrap_or("Unknown series");
                    let mut head = format!(
                        "{series} - {}",
                        episode_code(ep.get("seasonNumber"), ep.get("episodeNumber"))
                    );
                    head.push_str(&format!(
                        " \"{}\"",
                        str_field(ep, "title").unwrap_or("TBA")
                    ));
                    let airs = str_field(ep, "airDateUtc")
                        .or_else(|| str_field(ep, "airDate"))
                        .map_or_else(|| "TBA".to_string(), render_timestamp);
                    line(&head, &[format!("airs {airs}")])
                }),
            )
        }
        View::MovieCalendar { days } => {
            let movies = items(payload);
            if movies.is_empty() {
                return format!("No movies releasing in the next {days} days.");
            }
            list(
                format!("Upcoming movie releases (next {days} days):"),
                movies.iter().map(|movie| {
                    let mut parts = Vec::new();
                    for (label, key) in [
                        ("in cinemas", "inCinemas"),
                        ("digital", "digitalRelease"),
                        ("physical", "physicalRelease"),
                    ] {
                        if let Some(raw) = str_field(movie, key) {
                            parts.push(format!("{label} {}", render_date(raw)));
                        }
                    }
                    if parts.is_empty() {
                        parts.push("release TBA".to_string());
                    }
                    push_field(&mut parts, "status", str_field(movie, "status"));
                    line(&with_year(movie), &parts)
                }),
            )
        }
        View::SeriesSearch { query } => search(payload, query, "series", "Series", |show| {
            let mut parts = id_part(show);
            push_field(&mut parts, "status", str_field(show, "status"));
            if let Some(n) = season_count(show) {
                parts.push(format!("{n} seasons"));
            }
            parts
        }),
        View::MovieSearch { query } => search(payload, query, "movies", "Movies", |movie| {
            let mut parts = id_part(movie);
            push_field(&mut parts, "status", str_field(movie, "status"));
            if let Some(has_file) = movie.get("hasFile").and_then(Value::as_bool) {
                parts.push(format!("downloaded {}", if has_file { "yes" } else { "no" }));
            }
            parts
        }),
        View::SystemStatus { service } => system_status(service, payload),
        View::SeriesQueue => queue(payload, |item| {
            let title = item
                .get("series")
                .and_then(|s| str_field(s, "title"))
                .or_else(|| str_field(item, "title"))
                .unwrap_or("Unknown series");
            match item.get("episode") {
                Some(ep) => format!(
                    "{title} - {}",
                    episode_code(ep.get("seasonNumber"), ep.get("episodeNumber"))
                ),
                None => title.to_string(),
            }
        }),
        View::MovieQueue => queue(payload, |item| match item.get("movie") {
            Some(movie) => with_year(movie),
            None => str_field(item, "title").unwrap_or("Unknown movie").to_string(),
        }),
        View::Command {
            action,
            subject,
            id,
        } => {
            let mut text = format!("{action} triggered for {subject} ID {id}");
            if let Some(command_id) = payload.get("id").and_then(Value::as_u64) {
                let status = str_field(payload, "status").unwrap_or("queued");
                text.push_str(&format!(" (command {command_id}, status {status})"));
            }
            text
        }
    }
}

/// List items of a payload: a bare array, or the `records` of a paged result.
fn items(payload: &Value) -> &[Value] {
    match payload {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("records")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice),
        _ => &[],
    }
}

fn added_since(payload: &Value, cutoff: DateTime<Utc>) -> Vec<(DateTime<Utc>, &Value)> {
    let mut recent: Vec<(DateTime<Utc>, &Value)> = items(payload)
        .iter()
        .filter_map(|item| {
            let added = parse_instant(str_field(item, "added")?)?;
            (added > cutoff).then_some((added, item))
        })
        .collect();
    // Newest first; stable so ties keep backend order.
    recent.sort_by(|a, b| b.0.cmp(&a.0));
    recent
}

fn search<F>(payload: &Value, query: &str, noun: &str, heading: &str, describe: F) -> String
where
    F: Fn(&Value) -> Vec<String>,
{
    let needle = query.to_lowercase();
    let matches: Vec<&Value> = items(payload)
        .iter()
        .filter(|item| {
            str_field(item, "title").is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect();
    if matches.is_empty() {
        return format!("No {noun} found matching '{query}'.");
    }
    let header = if matches.len() > SEARCH_LIMIT {
        format!(
            "{heading} matching '{query}' (showing {SEARCH_LIMIT} of {}):",
            matches.len()
        )
    } else {
        format!("{heading} matching '{query}':")
    };
    list(
        header,
        matches
            .into_iter()
            .take(SEARCH_LIMIT)
            .map(|item| line(&with_year(item), &describe(item))),
    )
}

fn system_status(service: Service, payload: &Value) -> String {
    let status = payload.get("status").unwrap_or(&Value::Null);
    let mut out = format!("{service} system status:\n");
    out.push_str(&format!(
        "  Version: {}\n",
        str_field(status, "version").unwrap_or("unknown")
    ));
    out.push_str(&format!(
        "  OS: {}\n",
        joined(status, "osName", "osVersion").unwrap_or_else(|| "unknown".into())
    ));
    out.push_str(&format!(
        "  Runtime: {}\n",
        joined(status, "runtimeName", "runtimeVersion").unwrap_or_else(|| "unknown".into())
    ));
    if let Some(branch) = str_field(status, "branch") {
        out.push_str(&format!("  Branch: {branch}\n"));
    }
    if let Some(started) = str_field(status, "startTime") {
        out.push_str(&format!("  Started: {}\n", render_timestamp(started)));
    }

    let disks = payload
        .get("diskspace")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    if disks.is_empty() {
        out.push_str("Disk space: none reported");
        return out;
    }
    out.push_str("Disk space:");
    for disk in disks {
        let path = str_field(disk, "path")
            .or_else(|| str_field(disk, "label"))
            .unwrap_or("?");
        let free = num_field(disk, "freeSpace").unwrap_or(0.0) / GIB;
        let total = num_field(disk, "totalSpace").unwrap_or(0.0) / GIB;
        out.push_str(&format!("\n- {path}: {free:.2} GB free of {total:.2} GB"));
    }
    out
}

fn queue<F>(payload: &Value, title: F) -> String
where
    F: Fn(&Value) -> String,
{
    let records = items(payload);
    if records.is_empty() {
        return EMPTY_QUEUE.to_string();
    }
    let noun = if records.len() == 1 { "item" } else { "items" };
    list(
        format!("Download queue ({} {noun}):", records.len()),
        records.iter().map(|item| {
            let mut parts = vec![str_field(item, "status").unwrap_or("unknown").to_string()];
            let left = num_field(item, "sizeleft").unwrap_or(0.0) / MIB;
            match num_field(item, "size") {
                Some(size) => parts.push(format!("{left:.2} MB of {:.2} MB remaining", size / MIB)),
                None => parts.push(format!("{left:.2} MB remaining")),
            }
            push_field(&mut parts, "eta", str_field(item, "timeleft"));
            line(&title(item), &parts)
        }),
    )
}

fn list<I>(header: String, lines: I) -> String
where
    I: Iterator<Item = String>,
{
    let mut out = header;
    for l in lines {
        out.push('\n');
        out.push_str(&l);
    }
    out
}

fn line(head: &str, parts: &[String]) -> String {
    if parts.is_empty() {
        format!("- {head}")
    } else {
        format!("- {head} | {}", parts.join(" | "))
    }
}

fn push_field(parts: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(v) = value {
        parts.push(format!("{label} {v}"));
    }
}

fn id_part(item: &Value) -> Vec<String> {
    item.get("id")
        .and_then(Value::as_u64)
        .map(|id| vec![format!("id {id}")])
        .unwrap_or_default()
}

fn str_field<'v>(item: &'v Value, key: &str) -> Option<&'v str> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn num_field(item: &Value, key: &str) -> Option<f64> {
    item.get(key).and_then(Value::as_f64)
}

fn joined(item: &Value, first: &str, second: &str) -> Option<String> {
    match (str_field(item, first), str_field(item, second)) {
        (Some(a), Some(b)) => Some(format!("{a} {b}")),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    }
}

fn season_count(show: &Value) -> Option<u64> {
    show.get("seasonCount")
        .or_else(|| show.get("statistics").and_then(|s| s.get("seasonCount")))
        .and_then(Value::as_u64)
}

fn with_year(item: &Value) -> String {
    let title = str_field(item, "title").unwrap_or("Untitled");
    match item.get("year").and_then(Value::as_u64).filter(|y| *y > 0) {
        Some(year) => format!("{title} ({year})"),
        None => title.to_string(),
    }
}

fn episode_code(season: Option<&Value>, episode: Option<&Value>) -> String {
    let n = |v: Option<&Value>| v.and_then(Value::as_u64).unwrap_or(0);
    format!("S{:02}E{:02}", n(season), n(episode))
}

/// Parse the timestamp shapes Sonarr/Radarr emit: RFC 3339, a bare
/// `YYYY-MM-DD`, or a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC).
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn render_date(raw: &str) -> String {
    parse_instant(raw).map_or_else(|| raw.to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}

fn render_timestamp(raw: &str) -> String {
    parse_instant(raw).map_or_else(
        || raw.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
