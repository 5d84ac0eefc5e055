use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Header row of a habit history table.
pub const HISTORY_HEADER: &str = "| Date | Time | Status | Action | Notes |";
pub const HISTORY_DIVIDER: &str = "|------|------|--------|--------|-------|";

/// Header and divider rows of an empty history table.
pub fn history_table_header() -> String {
    format!("{HISTORY_HEADER}\n{HISTORY_DIVIDER}")
}

static BOLD_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[-*]\s+\*\*(?P<date>[^*]+?)\*\*\s+at\s+\*\*(?P<time>[^*]+?)\*\*\s*:\s*(?P<rest>.+)$",
    )
    .unwrap()
});

static PLAIN_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[-*]\s+(?P<date>\d{4}-\d{2}-\d{2})\s+at\s+(?P<time>\d{1,2}:\d{2}(?::\d{2})?(?:\s*[AaPp]\.?[Mm]\.?)?)\s*:\s*(?P<rest>.+)$",
    )
    .unwrap()
});

// `Complete (Manual - Changed from To Do)`; the parenthetical is optional.
static OUTCOME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<status>[^(]+?)\s*(?:\((?P<action>.+?)(?:\s+-\s+(?P<notes>.*))?\))?\s*$")
        .unwrap()
});

/// One row of a habit's completion log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub time: String,
    pub status: String,
    pub action: String,
    pub notes: String,
}

impl HistoryEntry {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        status: impl Into<String>,
        action: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            status: status.into(),
            action: action.into(),
            notes: notes.into(),
        }
    }

    /// Render as a canonical table row.
    pub fn to_table_row(&self) -> String {
        let cell = |s: &str| s.trim().replace('|', "/");
        format!(
            "| {} | {} | {} | {} | {} |",
            cell(&self.date),
            cell(&self.time),
            cell(&self.status),
            cell(&self.action),
            cell(&self.notes)
        )
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::classify(&self.status)
    }

    pub fn action_class(&self) -> ActionClass {
        ActionClass::classify(&self.action)
    }
}

/// Parse one line of a history block.
///
/// Tries the table row, then the bold bullet, then the plain bullet form.
/// Lines matching none of them (and table header/divider rows) yield `None`.
pub fn parse_history_line(line: &str) -> Option<HistoryEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('|') {
        return parse_table_row(line);
    }
    if let Some(caps) = BOLD_ENTRY_RE.captures(line) {
        return entry_from_bullet(&caps["date"], &caps["time"], &caps["rest"]);
    }
    if let Some(caps) = PLAIN_ENTRY_RE.captures(line) {
        return entry_from_bullet(&caps["date"], &caps["time"], &caps["rest"]);
    }
    log::debug!("Skipping unrecognized history line: {}", line);
    None
}

/// Parse every recognizable entry of a history block, in file order.
pub fn parse_history_block(block: &str) -> Vec<HistoryEntry> {
    block.lines().filter_map(parse_history_line).collect()
}

fn parse_table_row(line: &str) -> Option<HistoryEntry> {
    let inner = line.strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let cells: Vec<&str> = inner.split('|').map(str::trim).collect();
    if cells.len() < 5 {
        return None;
    }

    let is_divider = cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')));
    if is_divider {
        return None;
    }

    let header = ["date", "time", "status", "action"];
    if cells[..4]
        .iter()
        .zip(header)
        .all(|(cell, label)| cell.to_lowercase() == label)
    {
        return None;
    }

    Some(HistoryEntry::new(
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        cells[4..].join(" | "),
    ))
}

fn entry_from_bullet(date: &str, time: &str, rest: &str) -> Option<HistoryEntry> {
    let caps = OUTCOME_RE.captures(rest.trim())?;
    Some(HistoryEntry::new(
        date.trim(),
        time.trim(),
        caps["status"].trim(),
        caps.name("action").map_or("", |m| m.as_str().trim()),
        caps.name("notes").map_or("", |m| m.as_str().trim()),
    ))
}

/// Display class of a history status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    Done,
    Failed,
    InProgress,
}

impl StatusClass {
    pub fn classify(status: &str) -> Self {
        let lower = status.to_lowercase();
        if lower.contains("complete") {
            Self::Done
        } else if lower.contains("miss") {
            Self::Failed
        } else {
            Self::InProgress
        }
    }
}

/// Display class of a history action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionClass {
    Manual,
    Auto,
    Backfill,
    Other,
}

impl ActionClass {
    pub fn classify(action: &str) -> Self {
        let lower = action.to_lowercase();
        if lower.contains("manual") {
            Self::Manual
        } else if lower.contains("auto") {
            Self::Auto
        } else if lower.contains("backfill") {
            Self::Backfill
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> HistoryEntry {
        HistoryEntry::new("2025-09-01", "8:40 PM", "Complete", "Manual", "Changed from To Do")
    }

    #[test]
    fn all_three_encodings_agree() {
        let lines = [
            "| 2025-09-01 | 8:40 PM | Complete | Manual | Changed from To Do |",
            "- **2025-09-01** at **8:40 PM**: Complete (Manual - Changed from To Do)",
            "- 2025-09-01 at 8:40 PM: Complete (Manual - Changed from To Do)",
        ];
        for line in lines {
            assert_eq!(parse_history_line(line), Some(expected()), "line: {line}");
        }
    }

    #[test]
    fn header_and_divider_rows_are_not_entries() {
        assert_eq!(parse_history_line("| Date | Time | Status | Action | Notes |"), None);
        assert_eq!(parse_history_line("| DATE | time | STATUS | action | details |"), None);
        assert_eq!(parse_history_line("|------|------|--------|--------|-------|"), None);
        assert_eq!(parse_history_line("| :--- | --- | --- | --- | --- |"), None);
    }

    #[test]
    fn garbage_lines_are_dropped() {
        assert_eq!(parse_history_line("just some words"), None);
        assert_eq!(parse_history_line("| only | three | cells |"), None);
        assert_eq!(parse_history_line(""), None);
    }

    #[test]
    fn bullet_without_parenthetical() {
        let entry = parse_history_line("- 2025-09-02 at 07:15: Missed").unwrap();
        assert_eq!(entry.status, "Missed");
        assert_eq!(entry.action, "");
        assert_eq!(entry.notes, "");
    }

    #[test]
    fn hyphenated_action_without_notes() {
        let entry =
            parse_history_line("- **2025-09-03** at **12:00 AM**: To Do (Auto-Reset)").unwrap();
        assert_eq!(entry.action, "Auto-Reset");
        assert_eq!(entry.notes, "");
    }

    #[test]
    fn block_skips_header_and_noise() {
        let block = "\
| Date | Time | Status | Action | Notes |
|------|------|--------|--------|-------|
| 2025-09-01 | 9:00 AM | To Do | Created | Initial habit creation |
random remark
- 2025-09-01 at 8:40 PM: Complete (Manual - Changed from To Do)
";
        let entries = parse_history_block(block);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "Created");
        assert_eq!(entries[1], expected());
    }

    #[test]
    fn classifiers() {
        assert_eq!(StatusClass::classify("Completed"), StatusClass::Done);
        assert_eq!(StatusClass::classify("missed"), StatusClass::Failed);
        assert_eq!(StatusClass::classify("To Do"), StatusClass::InProgress);
        assert_eq!(ActionClass::classify("MANUAL"), ActionClass::Manual);
        assert_eq!(ActionClass::classify("Auto-Reset"), ActionClass::Auto);
        assert_eq!(ActionClass::classify("Backfill"), ActionClass::Backfill);
        assert_eq!(ActionClass::classify("Created"), ActionClass::Other);
    }

    #[test]
    fn table_row_round_trips() {
        let row = expected().to_table_row();
        assert_eq!(row, "| 2025-09-01 | 8:40 PM | Complete | Manual | Changed from To Do |");
        assert_eq!(parse_history_line(&row), Some(expected()));
    }
}
