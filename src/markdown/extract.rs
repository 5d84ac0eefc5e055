use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::core::document::{HorizonDocument, Snapshots};
use crate::core::error::HorizonError;
use crate::core::history::history_table_header;
use crate::core::horizon::{
    HabitFrequency, HorizonKind, ReferenceKey, ReviewCadence, SnapshotKind, Status,
};
use crate::core::path::normalize_path;

use super::builder::placeholder;
use super::scanner::{ScannedDocument, SectionKey, scan};

// [!singleselect:area-status:watch], [!datetime:created_date_time:2025-01-01T00:00:00Z]
static FIELD_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[!(?P<widget>[a-z]+):(?P<field>[A-Za-z0-9_-]+):(?P<value>\[[^\]]*\]|[^\]]*)\]")
        .unwrap()
});

// [!areas-references:["areas/a.md","areas/b.md"]] or [!areas-references:areas/a.md, areas/b.md]
static REFERENCE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[!(?P<key>[A-Za-z&_-]+?)-references:(?P<value>\[[^\]]*\]|[^\]]*)\]").unwrap()
});

static LINK_BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*[-*+]\s+\[(?P<label>.*)\]\(\s*(?:<(?P<angle>[^>]*)>|(?P<bare>[^<\s].*?))\s*\)\s*$",
    )
    .unwrap()
});

static PLAIN_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(?P<item>.+?)\s*$").unwrap());

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[ \t]*(?P<token>\[!(?P<name>projects-list|areas-list|goals-list)(?::[^\]]*)?\])")
        .unwrap()
});

const KIND_PREFIXES: [&str; 6] = ["project", "area", "goal", "vision", "purpose", "habit"];

/// A value from the inline metadata dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Text(String),
    List(Vec<String>),
}

impl MetaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::List(_) => None,
        }
    }

    /// Items of a list value, or a comma-joined text value split apart.
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Text(s) => split_list(s),
        }
    }
}

/// Field markers collected from a document, keyed by well-known field name
/// (`status`, `review_cadence`, `stewards`, `created_at`, `due_date`,
/// `frequency`, `focus_time`, `title`, and the five reference keys).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    fields: BTreeMap<String, MetaValue>,
}

impl Metadata {
    pub fn get(&self, field: &str) -> Option<&MetaValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(MetaValue::as_text)
    }

    /// First value wins.
    fn insert(&mut self, field: String, value: MetaValue) {
        self.fields.entry(field).or_insert(value);
    }

    /// Collect markers from scanned sections. Metadata sections are read
    /// before body sections so a marker quoted inside a narrative never
    /// overrides the real field.
    pub fn collect(scanned: &ScannedDocument) -> Self {
        let mut meta = Self::default();

        for (key, block) in scanned.iter().filter(|(k, _)| !k.is_body()) {
            meta.collect_markers(block);
            if let Some(group) = key.reference_key() {
                let bullets = reference_bullets(block);
                if !bullets.is_empty() {
                    meta.insert(group.as_str().to_string(), MetaValue::List(bullets));
                }
            }
        }
        for (_, block) in scanned.iter().filter(|(k, _)| k.is_body()) {
            meta.collect_markers(block);
        }

        meta
    }

    fn collect_markers(&mut self, block: &str) {
        for caps in REFERENCE_MARKER_RE.captures_iter(block) {
            let Some(group) = ReferenceKey::from_name(&caps["key"]) else {
                log::debug!("Ignoring reference marker for unknown group: {}", &caps["key"]);
                continue;
            };
            self.insert(group.as_str().to_string(), parse_list_value(&caps["value"]));
        }
        for caps in FIELD_MARKER_RE.captures_iter(block) {
            let Some(field) = canonical_field(&caps["field"]) else {
                continue;
            };
            let value = caps["value"].trim();
            let value = if value.starts_with('[') {
                parse_list_value(value)
            } else {
                MetaValue::Text(value.to_string())
            };
            self.insert(field, value);
        }
    }
}

/// Map a marker field name onto the dictionary key.
fn canonical_field(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase().replace('-', "_");
    let stripped = KIND_PREFIXES
        .iter()
        .find_map(|p| lower.strip_prefix(p).and_then(|rest| rest.strip_prefix('_')))
        .unwrap_or(lower.as_str());

    let field = match stripped {
        "status" => "status",
        "review_cadence" | "cadence" => "review_cadence",
        "frequency" => "frequency",
        "focus_date_time" | "focus_date" | "focus_time" => "focus_time",
        "stewards" | "owners" => "stewards",
        "due_date" | "target_date" => "due_date",
        "created_date_time" | "created_date" | "created" | "created_at" => "created_at",
        "title" => "title",
        other => {
            log::debug!("Ignoring unknown metadata field: {}", other);
            return None;
        }
    };
    Some(field.to_string())
}

fn parse_list_value(raw: &str) -> MetaValue {
    let raw = raw.trim();
    if raw.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
            return MetaValue::List(items);
        }
        let inner = raw.trim_start_matches('[').trim_end_matches(']');
        return MetaValue::List(split_list(inner));
    }
    MetaValue::List(split_list(raw))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_matches('"').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Link targets (or plain items) of a bulleted reference list.
fn reference_bullets(block: &str) -> Vec<String> {
    block
        .lines()
        .filter_map(|line| {
            if let Some(caps) = LINK_BULLET_RE.captures(line) {
                let target = caps.name("angle").or_else(|| caps.name("bare"))?;
                return Some(target.as_str().trim().to_string());
            }
            PLAIN_BULLET_RE.captures(line).map(|caps| {
                let item = caps["item"].trim();
                item.strip_prefix("[[")
                    .and_then(|t| t.strip_suffix("]]"))
                    .unwrap_or(item)
                    .to_string()
            })
        })
        .collect()
}

/// Remove every snapshot directive token.
pub fn strip_directives(text: &str) -> String {
    DIRECTIVE_RE.replace_all(text, "").into_owned()
}

/// Strip trailing whitespace per line, fold runs of blank lines into one,
/// trim the result.
pub fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut pending_blank = false;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push("");
            pending_blank = false;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

/// Split a Snapshots block into directive tokens and additional content.
pub fn parse_snapshots(block: &str) -> Snapshots {
    let mut snapshots = Snapshots::default();
    for caps in DIRECTIVE_RE.captures_iter(block) {
        if let Some(kind) = SnapshotKind::from_directive(&caps["name"]) {
            snapshots
                .directives
                .entry(kind)
                .or_insert_with(|| caps["token"].to_string());
        }
    }
    snapshots.additional_content = collapse_whitespace(&strip_directives(block));
    snapshots
}

/// Parse an ISO-8601 timestamp, accepting a bare date or a datetime without
/// an offset (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Parse a calendar date, ignoring any time part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Builds structured records from document text.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract a document whose kind is known to the caller.
    ///
    /// Never fails: unknown values fall back to the kind's defaults, missing
    /// sections yield empty fields, and fields the kind does not carry are
    /// ignored.
    pub fn extract(kind: HorizonKind, path: &str, input: &str) -> HorizonDocument {
        let scanned = scan(input);
        let meta = Metadata::collect(&scanned);

        let title = scanned
            .title
            .clone()
            .or_else(|| meta.text("title").map(str::to_string))
            .unwrap_or_default();
        let created_at = meta.text("created_at").and_then(parse_timestamp);
        let mut doc = HorizonDocument::new(
            kind,
            normalize_path(path).unwrap_or_default(),
            title,
            created_at,
        );

        if kind.default_status().is_some() {
            doc.status = match meta.text("status").and_then(|raw| Status::parse(kind, raw)) {
                Some(status) => Some(status),
                None => {
                    log::debug!("{}: status missing or unknown, using default", path);
                    kind.default_status()
                }
            };
        }
        if kind.default_cadence().is_some() {
            doc.review_cadence = meta
                .text("review_cadence")
                .and_then(ReviewCadence::parse)
                .or(kind.default_cadence());
        }
        if kind.has_frequency() {
            doc.frequency = meta
                .text("frequency")
                .and_then(HabitFrequency::parse)
                .or(Some(HabitFrequency::Daily));
        }
        if kind.has_focus_time() {
            doc.focus_time = meta.text("focus_time").and_then(parse_timestamp);
        }
        if kind.has_stewards() {
            if let Some(value) = meta.get("stewards") {
                let items = value.items();
                doc.set_stewards(items.iter().map(String::as_str));
            }
        }
        if kind.has_due_date() {
            doc.due_date = meta.text("due_date").and_then(parse_date);
        }

        for group in ReferenceKey::ALL {
            let Some(value) = meta.get(group.as_str()) else {
                continue;
            };
            if !kind.holds(group) {
                log::debug!("{}: ignoring `{}` references on a {} document", path, group, kind);
                continue;
            }
            let items = value.items();
            doc.references.set(group, items.iter().map(String::as_str));
        }

        doc.description = body_field(kind, SectionKey::Description, &scanned);
        doc.supporting_notes = body_field(kind, SectionKey::SupportingNotes, &scanned);
        if kind.has_success_criteria() {
            doc.success_criteria = body_field(kind, SectionKey::SuccessCriteria, &scanned);
        }
        if kind.has_focus_metrics() {
            doc.focus_metrics = body_field(kind, SectionKey::FocusMetrics, &scanned);
        }
        if kind.has_snapshots() {
            if let Some(block) = scanned.get(SectionKey::Snapshots) {
                doc.snapshots = parse_snapshots(block);
            }
        }
        if kind == HorizonKind::Habit {
            doc.history = scanned
                .get(SectionKey::History)
                .filter(|block| *block != history_table_header())
                .unwrap_or_default()
                .to_string();
        }

        doc
    }

    /// Extract a document, deriving its kind from the workspace layout.
    pub fn extract_path(path: &str, input: &str) -> Result<HorizonDocument, HorizonError> {
        let kind = HorizonKind::from_path(path)
            .ok_or_else(|| HorizonError::UnknownHorizon(path.to_string()))?;
        Ok(Self::extract(kind, path, input))
    }
}

fn body_field(kind: HorizonKind, key: SectionKey, scanned: &ScannedDocument) -> String {
    let block = scanned.get(key).unwrap_or_default();
    match placeholder(kind, key) {
        Some(text) if block == text => String::new(),
        _ => block.to_string(),
    }
}
