use regex::Regex;
use std::sync::LazyLock;

use crate::core::horizon::ReferenceKey;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s+(?P<title>.+?)(?:\s+#+)?\s*$").unwrap());

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(?P<text>.+?)(?:\s+#+)?\s*$").unwrap());

/// The canonical heading vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKey {
    Status,
    ReviewCadence,
    Frequency,
    FocusTime,
    Stewards,
    DueDate,
    ProjectsReferences,
    AreasReferences,
    GoalsReferences,
    VisionReferences,
    PurposeReferences,
    Created,
    Description,
    SuccessCriteria,
    FocusMetrics,
    SupportingNotes,
    Snapshots,
    History,
}

impl SectionKey {
    pub const ALL: [Self; 18] = [
        Self::Status,
        Self::ReviewCadence,
        Self::Frequency,
        Self::FocusTime,
        Self::Stewards,
        Self::DueDate,
        Self::ProjectsReferences,
        Self::AreasReferences,
        Self::GoalsReferences,
        Self::VisionReferences,
        Self::PurposeReferences,
        Self::Created,
        Self::Description,
        Self::SuccessCriteria,
        Self::FocusMetrics,
        Self::SupportingNotes,
        Self::Snapshots,
        Self::History,
    ];

    /// Heading text written by the builder.
    pub fn heading(&self) -> &'static str {
        self.names()[0]
    }

    /// Canonical name first, then accepted legacy names.
    fn names(&self) -> &'static [&'static str] {
        match self {
            Self::Status => &["Status"],
            Self::ReviewCadence => &["Review Cadence", "Cadence"],
            Self::Frequency => &["Frequency"],
            Self::FocusTime => &["Focus Time"],
            Self::Stewards => &["Stewards", "Owners"],
            Self::DueDate => &["Due Date", "Target Date"],
            Self::ProjectsReferences => &["Projects References", "Project References"],
            Self::AreasReferences => &[
                "Areas References",
                "Areas of Focus References",
                "Area References",
            ],
            Self::GoalsReferences => &["Goals References", "Goal References"],
            Self::VisionReferences => &["Vision References"],
            Self::PurposeReferences => &["Purpose & Principles References", "Purpose References"],
            Self::Created => &["Created"],
            Self::Description => &["Description", "Area Narrative", "Narrative"],
            Self::SuccessCriteria => &["Success Criteria"],
            Self::FocusMetrics => &["Focus Metrics"],
            Self::SupportingNotes => &["Supporting Notes", "Notes"],
            Self::Snapshots => &["Snapshots"],
            Self::History => &["History"],
        }
    }

    /// Match heading text (without the `##`) against the vocabulary.
    pub fn from_heading(text: &str) -> Option<Self> {
        let folded = text
            .trim()
            .trim_end_matches(':')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Self::ALL.into_iter().find(|key| {
            key.names()
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&folded))
        })
    }

    pub fn for_reference(key: ReferenceKey) -> Self {
        match key {
            ReferenceKey::Projects => Self::ProjectsReferences,
            ReferenceKey::Areas => Self::AreasReferences,
            ReferenceKey::Goals => Self::GoalsReferences,
            ReferenceKey::Vision => Self::VisionReferences,
            ReferenceKey::Purpose => Self::PurposeReferences,
        }
    }

    pub fn reference_key(&self) -> Option<ReferenceKey> {
        match self {
            Self::ProjectsReferences => Some(ReferenceKey::Projects),
            Self::AreasReferences => Some(ReferenceKey::Areas),
            Self::GoalsReferences => Some(ReferenceKey::Goals),
            Self::VisionReferences => Some(ReferenceKey::Vision),
            Self::PurposeReferences => Some(ReferenceKey::Purpose),
            _ => None,
        }
    }

    /// Free-text sections, as opposed to metadata sections.
    pub fn is_body(&self) -> bool {
        matches!(
            self,
            Self::Description
                | Self::SuccessCriteria
                | Self::FocusMetrics
                | Self::SupportingNotes
                | Self::Snapshots
                | Self::History
        )
    }
}

/// A document split into heading-delimited blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedDocument {
    /// Text of the first-level heading, if the preamble has one.
    pub title: Option<String>,
    sections: Vec<(SectionKey, String)>,
}

impl ScannedDocument {
    /// Trimmed block under `key`, if the heading was present.
    pub fn get(&self, key: SectionKey) -> Option<&str> {
        self.sections
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, block)| block.as_str())
    }

    /// Blocks in document order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &str)> {
        self.sections.iter().map(|(k, b)| (*k, b.as_str()))
    }
}

/// Split raw document text into canonical sections.
///
/// Single pass over lines. Any recognized `##` heading closes the open block,
/// so a narrative never swallows a metadata section that follows it, even out
/// of order. Unrecognized headings stay inside the open block; text between
/// the title and the first recognized heading is dropped. Code fences are
/// not tracked: an unclosed fence in one field must not hide the sections
/// after it, and the builder demotes recognized headings inside bodies.
pub fn scan(input: &str) -> ScannedDocument {
    let mut doc = ScannedDocument::default();
    let mut current: Option<(SectionKey, Vec<&str>)> = None;

    for line in input.lines() {
        if let Some(key) = heading_key(line) {
            close_block(&mut doc, current.take());
            current = Some((key, Vec::new()));
            continue;
        }

        match current {
            Some((_, ref mut lines)) => lines.push(line),
            None => {
                if doc.title.is_none() {
                    if let Some(caps) = TITLE_RE.captures(line) {
                        doc.title = Some(caps["title"].trim().to_string());
                    }
                }
            }
        }
    }
    close_block(&mut doc, current.take());

    doc
}

/// The section a line opens, if it is a recognized `##` heading.
pub fn heading_key(line: &str) -> Option<SectionKey> {
    SECTION_RE
        .captures(line)
        .and_then(|caps| SectionKey::from_heading(&caps["text"]))
}

fn close_block(doc: &mut ScannedDocument, block: Option<(SectionKey, Vec<&str>)>) {
    let Some((key, lines)) = block else {
        return;
    };
    if doc.get(key).is_some() {
        log::debug!("Ignoring repeated section: {}", key.heading());
        return;
    }
    doc.sections.push((key, lines.join("\n").trim().to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sections_and_reads_title() {
        let input = "\
# Health

Some legacy intro text.

## Status
[!singleselect:area-status:watch]

## Area Narrative
Stay fit.

Sleep well.
";
        let doc = scan(input);
        assert_eq!(doc.title.as_deref(), Some("Health"));
        assert_eq!(doc.get(SectionKey::Status), Some("[!singleselect:area-status:watch]"));
        assert_eq!(doc.get(SectionKey::Description), Some("Stay fit.\n\nSleep well."));
        assert_eq!(doc.iter().count(), 2);
    }

    #[test]
    fn out_of_order_heading_closes_narrative() {
        let input = "\
# Home
## Description
Keep the house running.
## status
[!singleselect:area-status:steady]
";
        let doc = scan(input);
        assert_eq!(doc.get(SectionKey::Description), Some("Keep the house running."));
        assert_eq!(doc.get(SectionKey::Status), Some("[!singleselect:area-status:steady]"));
    }

    #[test]
    fn unknown_headings_stay_in_open_block() {
        let input = "\
# Goal
## Description
Intro
## Background
Details
## Created
[!datetime:created_date_time:2025-01-01T00:00:00Z]
";
        let doc = scan(input);
        assert_eq!(
            doc.get(SectionKey::Description),
            Some("Intro\n## Background\nDetails")
        );
    }

    #[test]
    fn unclosed_fence_does_not_hide_later_sections() {
        let input = "\
# Home
## Description
Example:
```rust
let x = 1;
## Focus Metrics
steps
## Supporting Notes
real notes
";
        let doc = scan(input);
        assert_eq!(doc.get(SectionKey::Description), Some("Example:\n```rust\nlet x = 1;"));
        assert_eq!(doc.get(SectionKey::FocusMetrics), Some("steps"));
        assert_eq!(doc.get(SectionKey::SupportingNotes), Some("real notes"));
    }

    #[test]
    fn recognizes_heading_lines() {
        assert_eq!(heading_key("## Notes"), Some(SectionKey::SupportingNotes));
        assert_eq!(heading_key("##   Due Date:"), Some(SectionKey::DueDate));
        assert_eq!(heading_key("### Notes"), None);
        assert_eq!(heading_key("## Background"), None);
        assert_eq!(heading_key("  ## Notes"), None);
    }

    #[test]
    fn first_repeated_section_wins() {
        let doc = scan("# T\n## Notes\nfirst\n## Supporting Notes\nsecond\n");
        assert_eq!(doc.get(SectionKey::SupportingNotes), Some("first"));
    }

    #[test]
    fn heading_aliases_are_case_insensitive() {
        assert_eq!(
            SectionKey::from_heading("areas of focus references"),
            Some(SectionKey::AreasReferences)
        );
        assert_eq!(SectionKey::from_heading("Target Date:"), Some(SectionKey::DueDate));
        assert_eq!(
            SectionKey::from_heading("Purpose  &  Principles References"),
            Some(SectionKey::PurposeReferences)
        );
        assert_eq!(SectionKey::from_heading("Background"), None);
    }
}
