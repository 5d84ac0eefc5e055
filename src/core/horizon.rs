use serde::{Deserialize, Serialize};
use std::fmt;

use super::path::{has_markdown_extension, is_readme, normalize_path, unify_path};

/// A level of the planning hierarchy. Each kind has its own document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonKind {
    Project,
    Area,
    Goal,
    Vision,
    Purpose,
    Habit,
}

impl HorizonKind {
    pub const ALL: [Self; 6] = [
        Self::Project,
        Self::Area,
        Self::Goal,
        Self::Vision,
        Self::Purpose,
        Self::Habit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Area => "area",
            Self::Goal => "goal",
            Self::Vision => "vision",
            Self::Purpose => "purpose",
            Self::Habit => "habit",
        }
    }

    /// Parse a kind name as typed by a user (`area`, `Areas`, `purpose`...).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "project" | "projects" => Some(Self::Project),
            "area" | "areas" | "areas of focus" => Some(Self::Area),
            "goal" | "goals" => Some(Self::Goal),
            "vision" | "visions" => Some(Self::Vision),
            "purpose" | "purpose & principles" | "principles" => Some(Self::Purpose),
            "habit" | "habits" => Some(Self::Habit),
            _ => None,
        }
    }

    /// Top-level workspace directory holding documents of this kind.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Project => "Projects",
            Self::Area => "Areas of Focus",
            Self::Goal => "Goals",
            Self::Vision => "Vision",
            Self::Purpose => "Purpose & Principles",
            Self::Habit => "Habits",
        }
    }

    /// Determine the kind of a workspace-relative path from its first segment.
    pub fn from_path(path: &str) -> Option<Self> {
        let normalized = normalize_path(path)?;
        let first = normalized.trim_start_matches('/').split('/').next()?;
        if first == normalized.trim_start_matches('/') {
            // A bare file name carries no layout information.
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.directory().eq_ignore_ascii_case(first))
            .or_else(|| match first {
                "areas" => Some(Self::Area),
                "purpose" => Some(Self::Purpose),
                _ => None,
            })
    }

    /// The reference group a document of this kind is listed under on the
    /// other side of a link. Habits have none.
    pub fn reference_key(&self) -> Option<ReferenceKey> {
        match self {
            Self::Project => Some(ReferenceKey::Projects),
            Self::Area => Some(ReferenceKey::Areas),
            Self::Goal => Some(ReferenceKey::Goals),
            Self::Vision => Some(ReferenceKey::Vision),
            Self::Purpose => Some(ReferenceKey::Purpose),
            Self::Habit => None,
        }
    }

    /// Reference groups valid on documents of this kind, in render order.
    pub fn reference_keys(&self) -> &'static [ReferenceKey] {
        use ReferenceKey::*;
        match self {
            Self::Project => &[Areas, Goals, Vision, Purpose],
            Self::Area => &[Projects, Goals, Vision, Purpose],
            Self::Goal => &[Projects, Areas, Vision, Purpose],
            Self::Vision => &[Projects, Areas, Goals, Purpose],
            Self::Purpose => &[Projects, Areas, Goals, Vision],
            Self::Habit => &ReferenceKey::ALL,
        }
    }

    pub fn holds(&self, key: ReferenceKey) -> bool {
        self.reference_keys().contains(&key)
    }

    /// Valid statuses; the first entry is the fallback for unknown values.
    pub fn status_domain(&self) -> &'static [Status] {
        use Status::*;
        match self {
            Self::Project | Self::Goal => &[InProgress, Waiting, Completed],
            Self::Area => &[Steady, Watch, Incubating, Delegated],
            Self::Habit => &[Todo, Complete],
            Self::Vision | Self::Purpose => &[],
        }
    }

    pub fn default_status(&self) -> Option<Status> {
        self.status_domain().first().copied()
    }

    pub fn default_cadence(&self) -> Option<ReviewCadence> {
        match self {
            Self::Area => Some(ReviewCadence::Monthly),
            Self::Goal => Some(ReviewCadence::Quarterly),
            _ => None,
        }
    }

    pub fn has_stewards(&self) -> bool {
        matches!(self, Self::Area | Self::Goal)
    }

    pub fn has_due_date(&self) -> bool {
        matches!(self, Self::Project | Self::Goal)
    }

    pub fn has_frequency(&self) -> bool {
        matches!(self, Self::Habit)
    }

    pub fn has_focus_time(&self) -> bool {
        matches!(self, Self::Habit)
    }

    pub fn has_snapshots(&self) -> bool {
        matches!(self, Self::Area | Self::Goal | Self::Vision | Self::Purpose)
    }

    pub fn has_success_criteria(&self) -> bool {
        matches!(self, Self::Goal)
    }

    pub fn has_focus_metrics(&self) -> bool {
        matches!(self, Self::Area)
    }

    pub fn placeholder_title(&self) -> &'static str {
        match self {
            Self::Project => "Untitled Project",
            Self::Area => "Untitled Area",
            Self::Goal => "Untitled Goal",
            Self::Vision => "Untitled Vision",
            Self::Purpose => "Untitled Purpose",
            Self::Habit => "Untitled Habit",
        }
    }
}

impl fmt::Display for HorizonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a reference group: which horizon the listed documents belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKey {
    Projects,
    Areas,
    Goals,
    Vision,
    Purpose,
}

impl ReferenceKey {
    pub const ALL: [Self; 5] = [
        Self::Projects,
        Self::Areas,
        Self::Goals,
        Self::Vision,
        Self::Purpose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Areas => "areas",
            Self::Goals => "goals",
            Self::Vision => "vision",
            Self::Purpose => "purpose",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "projects" | "project" => Some(Self::Projects),
            "areas" | "area" | "areas-of-focus" => Some(Self::Areas),
            "goals" | "goal" => Some(Self::Goals),
            "vision" | "visions" => Some(Self::Vision),
            "purpose" | "purpose-principles" | "principles" => Some(Self::Purpose),
            _ => None,
        }
    }

    /// The kind of document this group points at.
    pub fn target_kind(&self) -> HorizonKind {
        match self {
            Self::Projects => HorizonKind::Project,
            Self::Areas => HorizonKind::Area,
            Self::Goals => HorizonKind::Goal,
            Self::Vision => HorizonKind::Vision,
            Self::Purpose => HorizonKind::Purpose,
        }
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status. The valid subset depends on the horizon kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    InProgress,
    Waiting,
    Completed,
    Steady,
    Watch,
    Incubating,
    Delegated,
    Todo,
    Complete,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Steady => "steady",
            Self::Watch => "watch",
            Self::Incubating => "incubating",
            Self::Delegated => "delegated",
            Self::Todo => "todo",
            Self::Complete => "complete",
        }
    }

    /// Match a raw value against the kind's domain. Returns `None` for values
    /// the kind does not know; callers fall back to the kind's default.
    pub fn parse(kind: HorizonKind, raw: &str) -> Option<Self> {
        let folded = fold_token(raw);
        let candidate = match kind {
            HorizonKind::Habit => match folded.as_str() {
                "false" | "todo" | "to-do" | "pending" => Some(Self::Todo),
                "true" | "complete" | "completed" | "done" => Some(Self::Complete),
                _ => None,
            },
            _ => match folded.as_str() {
                "in-progress" | "not-started" | "active" => Some(Self::InProgress),
                "waiting" | "on-hold" => Some(Self::Waiting),
                "completed" | "complete" | "done" => Some(Self::Completed),
                "steady" => Some(Self::Steady),
                "watch" => Some(Self::Watch),
                "incubating" => Some(Self::Incubating),
                "delegated" => Some(Self::Delegated),
                _ => None,
            },
        };
        candidate.filter(|s| kind.status_domain().contains(s))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewCadence {
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

impl ReviewCadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match fold_token(raw).as_str() {
            "weekly" | "week" => Some(Self::Weekly),
            "monthly" | "month" => Some(Self::Monthly),
            "quarterly" | "quarter" => Some(Self::Quarterly),
            "annually" | "annual" | "yearly" | "year" => Some(Self::Annually),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitFrequency {
    Daily,
    Weekdays,
    Weekly,
    Biweekly,
    Monthly,
}

impl HabitFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekdays => "weekdays",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match fold_token(raw).as_str() {
            "daily" | "every-day" => Some(Self::Daily),
            "weekdays" | "weekday" => Some(Self::Weekdays),
            "weekly" => Some(Self::Weekly),
            "biweekly" | "bi-weekly" | "fortnightly" => Some(Self::Biweekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Live-list embeds a rendering layer expands inside a Snapshots section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Projects,
    Areas,
    Goals,
}

impl SnapshotKind {
    pub const ALL: [Self; 3] = [Self::Projects, Self::Areas, Self::Goals];

    /// Directive name inside `[!...]`.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Projects => "projects-list",
            Self::Areas => "areas-list",
            Self::Goals => "goals-list",
        }
    }

    pub fn from_directive(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.directive().eq_ignore_ascii_case(name))
    }
}

/// Lower-case, with spaces and underscores folded to dashes.
fn fold_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// Workspace layout

/// Reference identity for a bare project name: `projects/<name>`.
pub fn project_reference(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    normalize_path(&format!("{}/{}", HorizonKind::Project.directory(), name))
}

/// Reference identity of a document path. Project documents are their
/// directory's `README.md`; references point at the directory itself.
pub fn reference_path(kind: HorizonKind, path: &str) -> Option<String> {
    let unified = unify_path(path)?;
    if kind == HorizonKind::Project && is_readme(&unified) {
        let (dir, _) = unified.rsplit_once('/')?;
        let name = dir.rsplit('/').next()?;
        return project_reference(name);
    }
    normalize_path(&unified)
}

/// File holding the document a reference points at.
pub fn document_file(reference: &str) -> String {
    if HorizonKind::from_path(reference) == Some(HorizonKind::Project)
        && !has_markdown_extension(reference)
    {
        format!("{}/README.md", reference.trim_end_matches('/'))
    } else {
        reference.to_string()
    }
}

/// Workspace-relative path for a new document named `name`.
pub fn new_document_path(kind: HorizonKind, name: &str) -> String {
    let name = name.trim();
    match kind {
        HorizonKind::Project => format!("{}/{}/README.md", kind.directory(), name),
        _ => format!("{}/{}.md", kind.directory(), name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_path_uses_first_segment() {
        assert_eq!(HorizonKind::from_path("Areas of Focus/Health.md"), Some(HorizonKind::Area));
        assert_eq!(HorizonKind::from_path("areas/Health.md"), Some(HorizonKind::Area));
        assert_eq!(HorizonKind::from_path("projects/Launch"), Some(HorizonKind::Project));
        assert_eq!(
            HorizonKind::from_path("Purpose & Principles\\Core.md"),
            Some(HorizonKind::Purpose)
        );
        assert_eq!(HorizonKind::from_path("Inbox/Thing.md"), None);
        assert_eq!(HorizonKind::from_path("Health.md"), None);
    }

    #[test]
    fn kinds_never_hold_their_own_key_except_habits() {
        for kind in HorizonKind::ALL {
            match kind.reference_key() {
                Some(own) => assert!(!kind.holds(own), "{kind} holds its own key"),
                None => assert_eq!(kind.reference_keys().len(), 5),
            }
        }
    }

    #[test]
    fn status_parse_respects_domain() {
        assert_eq!(Status::parse(HorizonKind::Area, "Watch"), Some(Status::Watch));
        assert_eq!(Status::parse(HorizonKind::Area, "in-progress"), None);
        assert_eq!(
            Status::parse(HorizonKind::Project, "In Progress"),
            Some(Status::InProgress)
        );
        assert_eq!(Status::parse(HorizonKind::Goal, "on_hold"), Some(Status::Waiting));
        assert_eq!(Status::parse(HorizonKind::Habit, "true"), Some(Status::Complete));
        assert_eq!(Status::parse(HorizonKind::Vision, "steady"), None);
    }

    #[test]
    fn cadence_and_frequency_parse() {
        assert_eq!(ReviewCadence::parse("Yearly"), Some(ReviewCadence::Annually));
        assert_eq!(ReviewCadence::parse("fortnightly"), None);
        assert_eq!(HabitFrequency::parse("Bi-Weekly"), Some(HabitFrequency::Biweekly));
    }

    #[test]
    fn project_layout_round_trip() {
        assert_eq!(project_reference("Launch Site"), Some("projects/Launch Site".to_string()));
        assert_eq!(
            reference_path(HorizonKind::Project, "Projects/Launch Site/README.md"),
            Some("projects/Launch Site".to_string())
        );
        assert_eq!(document_file("projects/Launch Site"), "projects/Launch Site/README.md");
        assert_eq!(document_file("goals/Run.md"), "goals/Run.md");
        assert_eq!(
            new_document_path(HorizonKind::Area, "Health"),
            "Areas of Focus/Health.md"
        );
    }
}
