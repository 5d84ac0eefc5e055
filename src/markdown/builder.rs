use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::core::document::{DocumentOverrides, HorizonDocument, Snapshots};
use crate::core::error::HorizonError;
use crate::core::history::history_table_header;
use crate::core::horizon::{HorizonKind, SnapshotKind, Status};
use crate::core::path::display_name;

use super::extract::{collapse_whitespace, strip_directives};
use super::scanner::{SectionKey, heading_key};

/// Renders horizon documents as canonical markdown.
pub struct MarkdownBuilder;

impl MarkdownBuilder {
    /// Render `doc` with `overrides` applied.
    ///
    /// Every canonical section of the kind is emitted in fixed order, with
    /// placeholder text for empty body fields. Output depends only on the
    /// record, so building the same record twice yields identical bytes.
    pub fn build(
        doc: &HorizonDocument,
        overrides: Option<&DocumentOverrides>,
    ) -> Result<String, HorizonError> {
        let merged;
        let doc = match overrides {
            Some(o) if !o.is_empty() => {
                merged = doc.with_overrides(o)?;
                &merged
            }
            _ => {
                doc.validate()?;
                doc
            }
        };
        Ok(Self::render(doc))
    }

    /// Initial document text for a newly created file.
    pub fn skeleton(
        kind: HorizonKind,
        title: &str,
        created_at: DateTime<FixedOffset>,
    ) -> String {
        let doc = HorizonDocument::new(kind, String::new(), title, Some(created_at));
        Self::render(&doc)
    }

    fn render(doc: &HorizonDocument) -> String {
        let mut out = String::new();
        out.push_str("# ");
        out.push_str(doc.title.trim());
        out.push('\n');

        for key in section_order(doc.kind) {
            out.push_str("\n## ");
            out.push_str(heading_for(doc.kind, key));
            out.push('\n');

            let block = Self::render_block(doc, key);
            if !block.is_empty() {
                out.push_str(&block);
                out.push('\n');
            }
        }

        out
    }

    fn render_block(doc: &HorizonDocument, key: SectionKey) -> String {
        let kind = doc.kind;
        let prefix = kind.as_str();
        match key {
            SectionKey::Status => match (kind, doc.status) {
                (HorizonKind::Habit, status) => format!(
                    "[!checkbox:habit-status:{}]",
                    status == Some(Status::Complete)
                ),
                (_, status) => format!(
                    "[!singleselect:{prefix}-status:{}]",
                    status.map(|s| s.as_str()).unwrap_or_default()
                ),
            },
            SectionKey::ReviewCadence => format!(
                "[!singleselect:{prefix}-review-cadence:{}]",
                doc.review_cadence.map(|c| c.as_str()).unwrap_or_default()
            ),
            SectionKey::Frequency => format!(
                "[!singleselect:{prefix}-frequency:{}]",
                doc.frequency.map(|f| f.as_str()).unwrap_or_default()
            ),
            SectionKey::FocusTime => format!(
                "[!datetime:focus_date_time:{}]",
                doc.focus_time
                    .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                    .unwrap_or_default()
            ),
            SectionKey::Stewards => format!(
                "[!multiselect:{prefix}-stewards:{}]",
                doc.stewards.join(",")
            ),
            SectionKey::DueDate => {
                let field = if kind == HorizonKind::Goal {
                    "target_date"
                } else {
                    "due_date"
                };
                let value = doc
                    .due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                format!("[!datetime:{field}:{value}]")
            }
            SectionKey::Created => format!(
                "[!datetime:created_date_time:{}]",
                doc.created_at
                    .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                    .unwrap_or_default()
            ),
            SectionKey::ProjectsReferences
            | SectionKey::AreasReferences
            | SectionKey::GoalsReferences
            | SectionKey::VisionReferences
            | SectionKey::PurposeReferences => {
                let Some(group) = key.reference_key() else {
                    return String::new();
                };
                doc.references
                    .get(group)
                    .iter()
                    .map(|path| format!("- [{}](<{}>)", display_name(path), path))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            SectionKey::Description => body_or_placeholder(kind, key, &doc.description),
            SectionKey::SuccessCriteria => body_or_placeholder(kind, key, &doc.success_criteria),
            SectionKey::FocusMetrics => body_or_placeholder(kind, key, &doc.focus_metrics),
            SectionKey::SupportingNotes => body_or_placeholder(kind, key, &doc.supporting_notes),
            SectionKey::Snapshots => render_snapshots(&doc.snapshots),
            SectionKey::History => {
                let history = doc.history.trim();
                if history.is_empty() {
                    history_table_header()
                } else {
                    demote_headings(history)
                }
            }
        }
    }
}

/// Canonical section order for a kind.
pub fn section_order(kind: HorizonKind) -> Vec<SectionKey> {
    let mut order = Vec::new();
    if kind.default_status().is_some() {
        order.push(SectionKey::Status);
    }
    if kind.default_cadence().is_some() {
        order.push(SectionKey::ReviewCadence);
    }
    if kind.has_frequency() {
        order.push(SectionKey::Frequency);
    }
    if kind.has_focus_time() {
        order.push(SectionKey::FocusTime);
    }
    if kind.has_stewards() {
        order.push(SectionKey::Stewards);
    }
    if kind.has_due_date() {
        order.push(SectionKey::DueDate);
    }
    order.extend(kind.reference_keys().iter().map(|k| SectionKey::for_reference(*k)));
    order.push(SectionKey::Created);
    order.push(SectionKey::Description);
    if kind.has_success_criteria() {
        order.push(SectionKey::SuccessCriteria);
    }
    if kind.has_focus_metrics() {
        order.push(SectionKey::FocusMetrics);
    }
    if kind.has_snapshots() {
        order.push(SectionKey::Snapshots);
    }
    order.push(SectionKey::SupportingNotes);
    if kind == HorizonKind::Habit {
        order.push(SectionKey::History);
    }
    order
}

fn heading_for(kind: HorizonKind, key: SectionKey) -> &'static str {
    match (kind, key) {
        (HorizonKind::Goal, SectionKey::DueDate) => "Target Date",
        _ => key.heading(),
    }
}

/// Text shown in place of an empty body field. Reading it back yields empty.
pub fn placeholder(kind: HorizonKind, key: SectionKey) -> Option<&'static str> {
    let text = match (key, kind) {
        (SectionKey::Description, HorizonKind::Project) => {
            "Describe the outcome this project delivers."
        }
        (SectionKey::Description, HorizonKind::Area) => {
            "Describe the responsibility and the standard you hold it to."
        }
        (SectionKey::Description, HorizonKind::Goal) => {
            "Describe what you want to achieve in the next one to two years."
        }
        (SectionKey::Description, HorizonKind::Vision) => {
            "Describe what success looks like three to five years from now."
        }
        (SectionKey::Description, HorizonKind::Purpose) => {
            "Describe why you do what you do and the principles that guide you."
        }
        (SectionKey::Description, HorizonKind::Habit) => "Describe the habit and why it matters.",
        (SectionKey::SuccessCriteria, _) => "List the signs that tell you this goal is achieved.",
        (SectionKey::FocusMetrics, _) => "List the measures that show this area is healthy.",
        (SectionKey::SupportingNotes, _) => "Add supporting notes, links, or context.",
        _ => return None,
    };
    Some(text)
}

fn body_or_placeholder(kind: HorizonKind, key: SectionKey, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        placeholder(kind, key).unwrap_or_default().to_string()
    } else {
        demote_headings(text)
    }
}

/// Push body lines that would open a section down one level, so free text
/// never splits the document on the next read.
fn demote_headings(text: &str) -> String {
    text.lines()
        .map(|line| match heading_key(line) {
            Some(_) => format!("#{line}"),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_snapshots(snapshots: &Snapshots) -> String {
    let directives: Vec<&str> = SnapshotKind::ALL
        .iter()
        .filter_map(|k| snapshots.directives.get(k).map(String::as_str))
        .collect();
    let content = demote_headings(&collapse_whitespace(&strip_directives(
        &snapshots.additional_content,
    )));

    let mut out = directives.join("\n");
    if !content.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&content);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::horizon::ReferenceKey;
    use chrono::TimeZone;

    fn created() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 9, 1, 20, 40, 0)
            .unwrap()
    }

    #[test]
    fn empty_habit_history_renders_table_header() {
        let text = MarkdownBuilder::skeleton(HorizonKind::Habit, "Walk", created());
        assert!(text.ends_with(
            "## History\n| Date | Time | Status | Action | Notes |\n|------|------|--------|--------|-------|\n"
        ));
        assert!(text.contains("## Status\n[!checkbox:habit-status:false]"));
        assert!(text.contains("## Frequency\n[!singleselect:habit-frequency:daily]"));
    }

    #[test]
    fn project_skeleton_is_canonical() {
        let text = MarkdownBuilder::skeleton(HorizonKind::Project, "Launch", created());
        let expected = "\
# Launch

## Status
[!singleselect:project-status:in-progress]

## Due Date
[!datetime:due_date:]

## Areas References

## Goals References

## Vision References

## Purpose & Principles References

## Created
[!datetime:created_date_time:2025-09-01T20:40:00Z]

## Description
Describe the outcome this project delivers.

## Supporting Notes
Add supporting notes, links, or context.
";
        assert_eq!(text, expected);
    }

    #[test]
    fn goal_uses_target_date_heading() {
        let text = MarkdownBuilder::skeleton(HorizonKind::Goal, "Run", created());
        assert!(text.contains("## Target Date\n[!datetime:target_date:]"));
        assert!(text.contains("## Review Cadence\n[!singleselect:goal-review-cadence:quarterly]"));
    }

    #[test]
    fn references_render_as_links_in_insertion_order() {
        let mut area = HorizonDocument::new(HorizonKind::Area, "areas of focus/Home.md", "Home", None);
        area.references.insert(ReferenceKey::Projects, "projects/Paint Walls");
        area.references.insert(ReferenceKey::Projects, "projects/Attic");
        let text = MarkdownBuilder::build(&area, None).unwrap();
        assert!(text.contains(
            "## Projects References\n- [Paint Walls](<projects/Paint Walls>)\n- [Attic](<projects/Attic>)\n"
        ));
    }

    #[test]
    fn snapshots_render_directives_before_content() {
        let mut vision = HorizonDocument::new(HorizonKind::Vision, "vision/Ten.md", "Ten", None);
        vision.snapshots.enable(SnapshotKind::Goals);
        vision
            .snapshots
            .directives
            .insert(SnapshotKind::Projects, "[!projects-list:status=waiting]".into());
        vision.snapshots.additional_content = "Keep it [!areas-list] simple.\n\n\n\nReally.".into();
        let text = MarkdownBuilder::build(&vision, None).unwrap();
        assert!(text.contains(
            "## Snapshots\n[!projects-list:status=waiting]\n[!goals-list]\n\nKeep it simple.\n\nReally.\n"
        ));
    }

    #[test]
    fn build_rejects_invalid_records() {
        let mut project = HorizonDocument::new(HorizonKind::Project, "projects/X", "X", None);
        project.status = Some(Status::Watch);
        assert!(MarkdownBuilder::build(&project, None).is_err());
    }

    #[test]
    fn overrides_do_not_touch_created() {
        let area = HorizonDocument::new(HorizonKind::Area, "areas/Home.md", "Home", Some(created()));
        let overrides = DocumentOverrides {
            title: Some("House".into()),
            ..Default::default()
        };
        let text = MarkdownBuilder::build(&area, Some(&overrides)).unwrap();
        assert!(text.starts_with("# House\n"));
        assert!(text.contains("[!datetime:created_date_time:2025-09-01T20:40:00Z]"));
    }
}
