use crate::error::ParseError;
use regex::Regex;
use std::sync::OnceLock;

/// Column separator: runs of two or more spaces, the alignment the cat
/// sources print.
fn column_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

/// One parsed row: column name → token, in header order.
///
/// A padded column (ragged source row) is present but `None`; callers can
/// tell "column missing a value" apart from "column not in this table".
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    fields: Vec<(String, Option<String>)>,
    extra: Option<String>,
}

impl TableRecord {
    /// Token for `column`; `None` when the column is absent or was padded.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    /// True when the column exists in the header but this row had no token
    /// for it.
    pub fn is_missing(&self, column: &str) -> bool {
        self.fields
            .iter()
            .any(|(name, value)| name == column && value.is_none())
    }

    /// Overflow text merged into this record, if any.
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    fn append_extra(&mut self, text: &str) {
        match &mut self.extra {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => self.extra = Some(text.to_string()),
        }
    }
}

/// Parser for whitespace-aligned text tables with a header row.
///
/// The parser never fails on value types; type interpretation happens at
/// the point of use. It only fails on structural malformation: empty
/// input or a header with no columns.
pub struct TableParser;

impl TableParser {
    /// Parse with no row-leading guard: rows with surplus tokens keep the
    /// surplus in their own `extra` field.
    pub fn parse(source: &str, text: &str) -> Result<Vec<TableRecord>, ParseError> {
        Self::parse_guarded(source, text, |_| true)
    }

    /// Parse `text`, using `leading` to decide whether an over-long row is
    /// a real record or an overflow continuation of the previous one.
    ///
    /// A row with more tokens than headers whose first token fails the
    /// guard is merged into the previous record's `extra` field rather
    /// than discarded.
    pub fn parse_guarded(
        source: &str,
        text: &str,
        leading: impl Fn(&str) -> bool,
    ) -> Result<Vec<TableRecord>, ParseError> {
        let splitter = column_splitter();

        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('['));

        let header = lines
            .next()
            .ok_or_else(|| ParseError::new(source, "empty table"))?;
        let columns: Vec<String> = splitter
            .split(header)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if columns.is_empty() {
            return Err(ParseError::new(source, "header row has no columns"));
        }

        let mut records: Vec<TableRecord> = Vec::new();

        for line in lines {
            let tokens: Vec<&str> = splitter
                .split(line)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();
            if tokens.is_empty() {
                continue;
            }

            if tokens.len() > columns.len() && !leading(tokens[0]) {
                match records.last_mut() {
                    Some(previous) => {
                        previous.append_extra(line);
                        continue;
                    }
                    // Overflow before any record: nothing to continue,
                    // treat as a malformed standalone row.
                    None => {}
                }
            }

            let mut fields = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                fields.push((column.clone(), tokens.get(i).map(|t| t.to_string())));
            }
            let extra = if tokens.len() > columns.len() {
                Some(tokens[columns.len()..].join(" "))
            } else {
                None
            };
            records.push(TableRecord { fields, extra });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES_TABLE: &str = "\
name    node.role    cpu    heap.percent
node-1  master,data  12     45
node-2  data         93     81
";

    #[test]
    fn test_parse_aligned_rows() {
        let records = TableParser::parse("cat_nodes", NODES_TABLE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("node-1"));
        assert_eq!(records[0].get("node.role"), Some("master,data"));
        assert_eq!(records[1].get("cpu"), Some("93"));
    }

    #[test]
    fn test_ragged_row_is_padded_not_misaligned() {
        let text = "\
name    cpu    heap.percent
node-1  12
";
        let records = TableParser::parse("cat_nodes", text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("cpu"), Some("12"));
        assert_eq!(records[0].get("heap.percent"), None);
        assert!(records[0].is_missing("heap.percent"));
        assert!(!records[0].is_missing("cpu"));
    }

    #[test]
    fn test_overflow_continuation_merges_into_previous() {
        let text = "\
shard  index   state
0      logs-1  UNASSIGNED
moved to  tier  data_cold  rejected
1      logs-1  STARTED
";
        let records =
            TableParser::parse_guarded("cat_shards", text, |t| t.parse::<u64>().is_ok()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].extra(),
            Some("moved to  tier  data_cold  rejected")
        );
        assert_eq!(records[1].get("shard"), Some("1"));
    }

    #[test]
    fn test_overflow_with_valid_leading_token_keeps_own_row() {
        let text = "\
shard  index   state
0      logs-1  UNASSIGNED  NODE_LEFT  node left
";
        let records =
            TableParser::parse_guarded("cat_shards", text, |t| t.parse::<u64>().is_ok()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("state"), Some("UNASSIGNED"));
        assert_eq!(records[0].extra(), Some("NODE_LEFT node left"));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(TableParser::parse("cat_health", "").is_err());
        assert!(TableParser::parse("cat_health", "\n\n").is_err());
    }

    #[test]
    fn test_timestamp_banner_lines_skipped() {
        let text = "\
[2024-05-02T10:00:00] collected
name    cpu
node-1  5
";
        // The banner is filtered; the first remaining line is the header
        let records = TableParser::parse("cat_nodes", text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("node-1"));
    }
}
