use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::HorizonError;
use super::history::{HistoryEntry, history_table_header, parse_history_block};
use super::horizon::{HabitFrequency, HorizonKind, ReferenceKey, ReviewCadence, SnapshotKind, Status};
use super::path::{is_readme, normalize_path, normalize_references, normalize_steward};

/// Links from one document to others, grouped by the target's horizon.
///
/// Paths are always normalized, never README files, never duplicated, and
/// kept in insertion order. Empty groups are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGroups {
    groups: BTreeMap<ReferenceKey, Vec<String>>,
}

impl ReferenceGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ReferenceKey) -> &[String] {
        self.groups.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replace a group with the normalized form of `paths`.
    pub fn set<'a, I>(&mut self, key: ReferenceKey, paths: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let normalized = normalize_references(paths);
        if normalized.is_empty() {
            self.groups.remove(&key);
        } else {
            self.groups.insert(key, normalized);
        }
    }

    /// Append a path to a group. Returns `false` when nothing changed.
    pub fn insert(&mut self, key: ReferenceKey, path: &str) -> bool {
        let Some(path) = normalize_path(path) else {
            return false;
        };
        if is_readme(&path) {
            return false;
        }
        let group = self.groups.entry(key).or_default();
        if group.contains(&path) {
            return false;
        }
        group.push(path);
        true
    }

    /// Drop a path from a group. Returns `false` when it was not there.
    pub fn remove(&mut self, key: ReferenceKey, path: &str) -> bool {
        let Some(path) = normalize_path(path) else {
            return false;
        };
        let Some(group) = self.groups.get_mut(&key) else {
            return false;
        };
        let before = group.len();
        group.retain(|p| *p != path);
        let changed = group.len() != before;
        if group.is_empty() {
            self.groups.remove(&key);
        }
        changed
    }

    pub fn contains(&self, key: ReferenceKey, path: &str) -> bool {
        normalize_path(path).is_some_and(|p| self.get(key).contains(&p))
    }

    /// Non-empty groups in key order.
    pub fn iter(&self) -> impl Iterator<Item = (ReferenceKey, &[String])> {
        self.groups.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Live-list directives plus free text of a Snapshots section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshots {
    /// Literal directive token per kind, e.g. `[!projects-list:status=waiting]`.
    pub directives: BTreeMap<SnapshotKind, String>,
    /// Remaining text; never contains directive tokens.
    pub additional_content: String,
}

impl Snapshots {
    pub fn has(&self, kind: SnapshotKind) -> bool {
        self.directives.contains_key(&kind)
    }

    /// Enable a directive with its bare token, keeping an existing literal.
    pub fn enable(&mut self, kind: SnapshotKind) {
        self.directives
            .entry(kind)
            .or_insert_with(|| format!("[!{}]", kind.directive()));
    }

    pub fn disable(&mut self, kind: SnapshotKind) {
        self.directives.remove(&kind);
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.additional_content.trim().is_empty()
    }
}

/// A planning document in its structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonDocument {
    pub kind: HorizonKind,
    pub path: String,
    pub title: String,
    pub status: Option<Status>,
    pub review_cadence: Option<ReviewCadence>,
    pub frequency: Option<HabitFrequency>,
    /// When a habit is scheduled to be worked on.
    pub focus_time: Option<DateTime<FixedOffset>>,
    pub stewards: Vec<String>,
    /// Project due date or goal target date.
    pub due_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub references: ReferenceGroups,
    pub description: String,
    pub success_criteria: String,
    pub focus_metrics: String,
    pub supporting_notes: String,
    pub snapshots: Snapshots,
    /// Raw habit history block.
    pub history: String,
}

impl HorizonDocument {
    /// A fresh record with the kind's defaults. The creation timestamp is
    /// supplied by the caller; nothing here reads the clock.
    pub fn new(
        kind: HorizonKind,
        path: impl Into<String>,
        title: impl Into<String>,
        created_at: Option<DateTime<FixedOffset>>,
    ) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            kind.placeholder_title().to_string()
        } else {
            title.trim().to_string()
        };
        Self {
            kind,
            path: path.into(),
            title,
            status: kind.default_status(),
            review_cadence: kind.default_cadence(),
            frequency: kind.has_frequency().then_some(HabitFrequency::Daily),
            focus_time: None,
            stewards: Vec::new(),
            due_date: None,
            created_at,
            references: ReferenceGroups::new(),
            description: String::new(),
            success_criteria: String::new(),
            focus_metrics: String::new(),
            supporting_notes: String::new(),
            snapshots: Snapshots::default(),
            history: String::new(),
        }
    }

    /// Replace stewards with normalized, de-duplicated tokens.
    pub fn set_stewards<'a, I>(&mut self, raw: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.stewards.clear();
        for token in raw.into_iter().filter_map(normalize_steward) {
            if !self.stewards.contains(&token) {
                self.stewards.push(token);
            }
        }
    }

    /// Check that every populated field is one this kind carries.
    pub fn validate(&self) -> Result<(), HorizonError> {
        let kind = self.kind;
        let invalid = |field: &'static str| Err(HorizonError::InvalidField { kind, field });

        match self.status {
            Some(status) if !kind.status_domain().contains(&status) => {
                return Err(HorizonError::InvalidStatus { kind, status });
            }
            None if kind.default_status().is_some() => return invalid("status"),
            _ => {}
        }
        if self.review_cadence.is_some() != kind.default_cadence().is_some() {
            return invalid("review_cadence");
        }
        if self.frequency.is_some() != kind.has_frequency() {
            return invalid("frequency");
        }
        if self.focus_time.is_some() && !kind.has_focus_time() {
            return invalid("focus_time");
        }
        if !self.stewards.is_empty() && !kind.has_stewards() {
            return invalid("stewards");
        }
        if self.due_date.is_some() && !kind.has_due_date() {
            return invalid("due_date");
        }
        if !self.success_criteria.trim().is_empty() && !kind.has_success_criteria() {
            return invalid("success_criteria");
        }
        if !self.focus_metrics.trim().is_empty() && !kind.has_focus_metrics() {
            return invalid("focus_metrics");
        }
        if !self.snapshots.is_empty() && !kind.has_snapshots() {
            return invalid("snapshots");
        }
        if !self.history.trim().is_empty() && kind != HorizonKind::Habit {
            return invalid("history");
        }
        for (key, _) in self.references.iter() {
            if !kind.holds(key) {
                return Err(HorizonError::InvalidReferenceKey { kind, key });
            }
        }
        Ok(())
    }

    /// Apply a set of field overrides, producing a validated copy.
    pub fn with_overrides(&self, overrides: &DocumentOverrides) -> Result<Self, HorizonError> {
        let mut doc = self.clone();
        if let Some(ref title) = overrides.title {
            doc.title = if title.trim().is_empty() {
                doc.kind.placeholder_title().to_string()
            } else {
                title.trim().to_string()
            };
        }
        if let Some(status) = overrides.status {
            doc.status = Some(status);
        }
        if let Some(cadence) = overrides.review_cadence {
            doc.review_cadence = Some(cadence);
        }
        if let Some(frequency) = overrides.frequency {
            doc.frequency = Some(frequency);
        }
        if let Some(focus) = overrides.focus_time {
            doc.focus_time = focus;
        }
        if let Some(ref stewards) = overrides.stewards {
            doc.set_stewards(stewards.iter().map(String::as_str));
        }
        if let Some(due) = overrides.due_date {
            doc.due_date = due;
        }
        if let Some(created) = overrides.created_at {
            doc.created_at = Some(created);
        }
        for (key, paths) in &overrides.references {
            if !doc.kind.holds(*key) {
                return Err(HorizonError::InvalidReferenceKey {
                    kind: doc.kind,
                    key: *key,
                });
            }
            if let Some(path) = paths
                .iter()
                .find(|p| HorizonKind::from_path(p).is_some_and(|k| k != key.target_kind()))
            {
                return Err(HorizonError::MisfiledReference {
                    key: *key,
                    path: path.clone(),
                });
            }
            doc.references.set(*key, paths.iter().map(String::as_str));
        }
        if let Some(ref text) = overrides.description {
            doc.description = text.clone();
        }
        if let Some(ref text) = overrides.success_criteria {
            doc.success_criteria = text.clone();
        }
        if let Some(ref text) = overrides.focus_metrics {
            doc.focus_metrics = text.clone();
        }
        if let Some(ref text) = overrides.supporting_notes {
            doc.supporting_notes = text.clone();
        }
        if let Some(ref snapshots) = overrides.snapshots {
            doc.snapshots = snapshots.clone();
        }
        doc.validate()?;
        Ok(doc)
    }

    /// Parsed rows of the habit history block.
    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        parse_history_block(&self.history)
    }

    /// Append a row to the habit history table.
    pub fn record_history(&mut self, entry: &HistoryEntry) -> Result<(), HorizonError> {
        if self.kind != HorizonKind::Habit {
            return Err(HorizonError::InvalidField {
                kind: self.kind,
                field: "history",
            });
        }
        let trimmed = self.history.trim_end();
        let mut history = if trimmed.trim().is_empty() {
            history_table_header()
        } else {
            trimmed.to_string()
        };
        history.push('\n');
        history.push_str(&entry.to_table_row());
        self.history = history;
        Ok(())
    }
}

/// A strict subset of document fields to replace on the next build.
///
/// `due_date` and `focus_time` are doubly optional so callers can clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOverrides {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub review_cadence: Option<ReviewCadence>,
    pub frequency: Option<HabitFrequency>,
    pub focus_time: Option<Option<DateTime<FixedOffset>>>,
    pub stewards: Option<Vec<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub references: BTreeMap<ReferenceKey, Vec<String>>,
    pub description: Option<String>,
    pub success_criteria: Option<String>,
    pub focus_metrics: Option<String>,
    pub supporting_notes: Option<String>,
    pub snapshots: Option<Snapshots>,
}

impl DocumentOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
