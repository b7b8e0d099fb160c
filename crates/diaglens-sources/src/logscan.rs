use chrono::{DateTime, NaiveDateTime, Utc};
use diaglens_types::{GcPause, LogLevel, LogLine};
use regex::Regex;
use std::sync::OnceLock;

fn gc_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"GC\((\d+)\)").unwrap())
}

fn gc_duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)(ms|s)\s*$").unwrap())
}

fn took_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"took\s*\[(\d+(?:\.\d+)?)(ms|s|m)\]").unwrap())
}

/// One scanned event: a direct log entry, or a garbage-collection pause
/// stitched from its start and end markers.
#[derive(Debug, Clone)]
pub enum LogEvent {
    Entry(LogLine),
    GcPause(GcPause),
}

/// Restartable scanner over one log file's text.
///
/// `scan()` hands out a fresh lazy iterator each time, so the same source
/// can be re-scanned from the start (tests rely on this). The only state
/// the iterator keeps is the GC pause window: a pause spans a start
/// marker (`gc,start` tag) and an end marker (`gc` tag, same `GC(n)` id,
/// trailing duration); one synthetic event is emitted when both have been
/// seen. Pauses whose end never appears are counted as truncated and
/// emit nothing.
pub struct LogScanner {
    text: String,
}

impl LogScanner {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Fresh scan from the start of the source.
    pub fn scan(&self) -> Scan<'_> {
        Scan {
            lines: self.text.lines(),
            open: Vec::new(),
            truncated: 0,
            finished: false,
        }
    }
}

/// Lazy iterator over one scan of the source.
pub struct Scan<'a> {
    lines: std::str::Lines<'a>,
    open: Vec<(u64, Option<DateTime<Utc>>)>,
    truncated: usize,
    finished: bool,
}

impl Scan<'_> {
    /// Pauses whose end marker never appeared. Final once the iterator is
    /// exhausted.
    pub fn truncated(&self) -> usize {
        self.truncated
    }
}

impl Iterator for Scan<'_> {
    type Item = LogEvent;

    fn next(&mut self) -> Option<LogEvent> {
        loop {
            let Some(raw) = self.lines.next() else {
                if !self.finished {
                    self.finished = true;
                    self.truncated += self.open.len();
                    self.open.clear();
                }
                return None;
            };
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Parsed::GcStart { id, timestamp } => {
                    self.open.retain(|(open_id, _)| *open_id != id);
                    self.open.push((id, timestamp));
                }
                Parsed::GcEnd {
                    id,
                    timestamp,
                    duration_ms,
                } => {
                    let start = match self.open.iter().position(|(open_id, _)| *open_id == id) {
                        Some(pos) => Some(self.open.remove(pos)),
                        None => None,
                    };
                    let duration_ms = duration_ms.or_else(|| {
                        let (_, started) = start.as_ref()?;
                        let started = (*started)?;
                        let ended = timestamp?;
                        Some((ended - started).num_milliseconds() as f64)
                    });
                    if let Some(duration_ms) = duration_ms {
                        return Some(LogEvent::GcPause(GcPause {
                            id: Some(id),
                            duration_ms,
                            timestamp,
                        }));
                    }
                }
                Parsed::Entry(entry) => return Some(LogEvent::Entry(entry)),
                Parsed::Skip => {}
            }
        }
    }
}

enum Parsed {
    GcStart {
        id: u64,
        timestamp: Option<DateTime<Utc>>,
    },
    GcEnd {
        id: u64,
        timestamp: Option<DateTime<Utc>>,
        duration_ms: Option<f64>,
    },
    Entry(LogLine),
    /// A line that belongs to an open pause record; emitted as nothing.
    Skip,
}

fn parse_line(line: &str) -> Parsed {
    let (groups, message) = leading_brackets(line);

    let timestamp = groups.iter().find_map(|g| parse_timestamp(g));
    let tags = groups
        .iter()
        .find(|g| **g == "gc" || g.starts_with("gc,"))
        .copied();

    if let Some(tags) = tags {
        if let Some(id) = gc_id_pattern()
            .captures(message)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
        {
            if tags.split(',').any(|t| t == "start") {
                return Parsed::GcStart { id, timestamp };
            }
            if tags != "gc" {
                // gc,heap / gc,phases / ... detail lines inside the pause
                // record; the synthetic event covers them.
                return Parsed::Skip;
            }
            let duration_ms = gc_duration_pattern().captures(message).and_then(|c| {
                let value: f64 = c.get(1)?.as_str().parse().ok()?;
                Some(match c.get(2)?.as_str() {
                    "s" => value * 1000.0,
                    _ => value,
                })
            });
            return Parsed::GcEnd {
                id,
                timestamp,
                duration_ms,
            };
        }
    }

    let level = groups
        .iter()
        .map(|g| LogLevel::parse(g))
        .find(|l| *l != LogLevel::Unknown)
        .unwrap_or(LogLevel::Unknown);

    let duration_ms = took_pattern().captures(message).and_then(|c| {
        let value: f64 = c.get(1)?.as_str().parse().ok()?;
        Some(match c.get(2)?.as_str() {
            "m" => value * 60_000.0,
            "s" => value * 1000.0,
            _ => value,
        })
    });

    Parsed::Entry(LogLine {
        timestamp,
        level,
        message: message.trim().to_string(),
        duration_ms,
    })
}

/// Split off the contiguous leading `[..]` groups; the rest is the message.
fn leading_brackets(line: &str) -> (Vec<&str>, &str) {
    let mut groups = Vec::new();
    let mut rest = line;
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(end) = stripped.find(']') else { break };
        groups.push(stripped[..end].trim());
        rest = &stripped[end + 1..];
    }
    (groups, rest)
}

fn parse_timestamp(token: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.with_timezone(&Utc));
    }
    // JVM unified logging: 2024-05-02T10:00:00.123+0000
    if let Ok(dt) = DateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S%.3f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    // Server log: 2024-05-02T10:00:00,123
    if let Ok(naive) = NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S,%3f") {
        return Some(naive.and_utc());
    }
    None
}
