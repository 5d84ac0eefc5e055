pub mod store;

use chrono::Local;
use futures::future::join_all;
use std::fmt;
use thiserror::Error;

use crate::core::document::{DocumentOverrides, HorizonDocument};
use crate::core::error::HorizonError;
use crate::core::horizon::{
    HorizonKind, ReferenceKey, document_file, new_document_path, project_reference, reference_path,
};
use crate::core::path::{
    has_markdown_extension, is_readme, normalize_path, normalize_references, unify_path,
};
use crate::markdown::{MarkdownBuilder, MetadataExtractor};
use store::{DocumentStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Add,
    Remove,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// What a single reciprocal patch did to the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The target was rewritten.
    Updated,
    /// The link was already in the requested state.
    Unchanged,
    /// README targets never hold references.
    Skipped,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Horizon(#[from] HorizonError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid reference target `{0}`")]
    InvalidTarget(String),
}

/// A reciprocal patch that failed after the source document was saved.
#[derive(Debug)]
pub struct SyncWarning {
    pub target: String,
    pub action: SyncAction,
    pub error: SyncError,
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not {} backlink on {}: {}",
            self.action, self.target, self.error
        )
    }
}

/// Documents rewritten after a deletion.
#[derive(Debug, Default)]
pub struct ForgetReport {
    pub pruned: Vec<String>,
    pub warnings: Vec<SyncWarning>,
}

/// Keeps the reverse side of every reference in step with the source.
///
/// Each call is an independent read, patch and write of one counterpart
/// document. No lock spans documents: two sources patching the same target
/// at once can lose one of the additions.
pub struct ReferenceSync<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> ReferenceSync<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Add or drop `source_path` in the target's group for `source_kind`.
    ///
    /// Idempotent: repeating an add, or removing an absent link, leaves the
    /// target untouched.
    pub async fn sync(
        &self,
        source_path: &str,
        source_kind: HorizonKind,
        target_path: &str,
        action: SyncAction,
    ) -> Result<SyncOutcome, SyncError> {
        let group = source_kind
            .reference_key()
            .ok_or(HorizonError::NoReciprocalGroup { kind: source_kind })?;
        let source = reference_path(source_kind, source_path)
            .ok_or_else(|| HorizonError::InvalidPath(source_path.to_string()))?;
        let target = resolve_target(target_path)
            .ok_or_else(|| SyncError::InvalidTarget(target_path.to_string()))?;
        if is_readme(&target) {
            log::debug!("Skipping README target {}", target);
            return Ok(SyncOutcome::Skipped);
        }

        let target_kind = HorizonKind::from_path(&target)
            .ok_or_else(|| HorizonError::UnknownHorizon(target.clone()))?;
        if !target_kind.holds(group) {
            return Err(HorizonError::InvalidReferenceKey {
                kind: target_kind,
                key: group,
            }
            .into());
        }

        let file = document_file(&target);
        let text = self.store.read(&file).await?;
        let mut doc = MetadataExtractor::extract(target_kind, &file, &text);

        let changed = match action {
            SyncAction::Add => doc.references.insert(group, &source),
            SyncAction::Remove => doc.references.remove(group, &source),
        };
        if !changed {
            return Ok(SyncOutcome::Unchanged);
        }

        let updated = MarkdownBuilder::build(&doc, None)?;
        self.store.write(&file, &updated).await?;
        log::info!("Backlink {} {} on {} ({})", action, source, file, group);
        Ok(SyncOutcome::Updated)
    }

    /// Patch every target that differs between two versions of one
    /// reference group. Failures are collected, not raised.
    pub async fn reconcile(
        &self,
        source_path: &str,
        source_kind: HorizonKind,
        before: &[String],
        after: &[String],
    ) -> Vec<SyncWarning> {
        let before = normalize_references(before.iter().map(String::as_str));
        let after = normalize_references(after.iter().map(String::as_str));

        let changes: Vec<(String, SyncAction)> = after
            .iter()
            .filter(|p| !before.contains(p))
            .map(|p| (p.clone(), SyncAction::Add))
            .chain(
                before
                    .iter()
                    .filter(|p| !after.contains(p))
                    .map(|p| (p.clone(), SyncAction::Remove)),
            )
            .collect();

        let results = join_all(changes.iter().map(|(target, action)| {
            self.sync(source_path, source_kind, target, *action)
        }))
        .await;

        changes
            .into_iter()
            .zip(results)
            .filter_map(|((target, action), result)| match result {
                Ok(_) => None,
                Err(error) => {
                    let warning = SyncWarning {
                        target,
                        action,
                        error,
                    };
                    log::warn!("{}", warning);
                    Some(warning)
                }
            })
            .collect()
    }

    /// Remove a deleted document from every document that lists it.
    pub async fn forget(&self, deleted_path: &str) -> Result<ForgetReport, SyncError> {
        let deleted = normalize_path(deleted_path)
            .ok_or_else(|| SyncError::InvalidTarget(deleted_path.to_string()))?;
        let kind = HorizonKind::from_path(&deleted)
            .ok_or_else(|| HorizonError::UnknownHorizon(deleted.clone()))?;
        let Some(group) = kind.reference_key() else {
            return Ok(ForgetReport::default());
        };
        let reference = reference_path(kind, deleted_path)
            .ok_or_else(|| HorizonError::InvalidPath(deleted_path.to_string()))?;

        let candidates = self.documents(|k| k.holds(group)).await?;

        let results = join_all(
            candidates
                .iter()
                .map(|(holder, file)| self.prune(*holder, file, group, &reference)),
        )
        .await;

        let mut report = ForgetReport::default();
        for ((_, file), result) in candidates.into_iter().zip(results) {
            match result {
                Ok(true) => report.pruned.push(file),
                Ok(false) => {}
                Err(error) if error_is_missing(&error) => {}
                Err(error) => {
                    let warning = SyncWarning {
                        target: file,
                        action: SyncAction::Remove,
                        error,
                    };
                    log::warn!("{}", warning);
                    report.warnings.push(warning);
                }
            }
        }
        log::info!("Forgot {}: pruned {} documents", reference, report.pruned.len());
        Ok(report)
    }

    /// Document files of every kind accepted by `filter`, in layout order.
    pub async fn documents(
        &self,
        filter: impl Fn(HorizonKind) -> bool,
    ) -> Result<Vec<(HorizonKind, String)>, SyncError> {
        let mut files = Vec::new();
        for kind in HorizonKind::ALL.into_iter().filter(|k| filter(*k)) {
            let entries = match self.store.list(kind.directory()).await {
                Ok(entries) => entries,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let file = match kind {
                    HorizonKind::Project if entry.is_dir => document_file(&entry.path),
                    HorizonKind::Project => continue,
                    _ if entry.is_dir || !has_markdown_extension(&entry.path) => continue,
                    _ if is_readme(&entry.path) => continue,
                    _ => entry.path,
                };
                files.push((kind, file));
            }
        }
        Ok(files)
    }

    /// Reference pairs whose reverse side is missing. Never writes.
    pub async fn drift(&self) -> Result<Vec<Drift>, SyncError> {
        let sources = self.documents(|k| k.reference_key().is_some()).await?;
        let mut found = Vec::new();
        for (kind, file) in sources {
            let text = match self.store.read(&file).await {
                Ok(text) => text,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            let doc = MetadataExtractor::extract(kind, &file, &text);
            let (Some(back_key), Some(source)) = (kind.reference_key(), reference_path(kind, &file))
            else {
                continue;
            };

            for (key, targets) in doc.references.iter() {
                for target in targets {
                    let target_file = document_file(target);
                    let target_kind = key.target_kind();
                    if HorizonKind::from_path(target) != Some(target_kind) {
                        found.push(Drift {
                            source: source.clone(),
                            key,
                            target: target.clone(),
                            kind: DriftKind::MisfiledTarget,
                        });
                        continue;
                    }
                    let problem = match self.store.read(&target_file).await {
                        Ok(text) => {
                            let other = MetadataExtractor::extract(target_kind, &target_file, &text);
                            if other.references.contains(back_key, &source) {
                                continue;
                            }
                            DriftKind::MissingBacklink
                        }
                        Err(e) if e.is_not_found() => DriftKind::MissingTarget,
                        Err(e) => return Err(e.into()),
                    };
                    found.push(Drift {
                        source: source.clone(),
                        key,
                        target: target.clone(),
                        kind: problem,
                    });
                }
            }
        }
        Ok(found)
    }

    async fn prune(
        &self,
        kind: HorizonKind,
        file: &str,
        group: ReferenceKey,
        reference: &str,
    ) -> Result<bool, SyncError> {
        let text = self.store.read(file).await?;
        let mut doc = MetadataExtractor::extract(kind, file, &text);
        if !doc.references.remove(group, reference) {
            return Ok(false);
        }
        let updated = MarkdownBuilder::build(&doc, None)?;
        self.store.write(file, &updated).await?;
        Ok(true)
    }
}

fn error_is_missing(error: &SyncError) -> bool {
    matches!(error, SyncError::Store(e) if e.is_not_found())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    /// The target exists but does not list the source.
    MissingBacklink,
    /// The target document does not exist.
    MissingTarget,
    /// The target is not a document of the group's kind.
    MisfiledTarget,
}

/// One asymmetric reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub source: String,
    pub key: ReferenceKey,
    pub target: String,
    pub kind: DriftKind,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DriftKind::MissingBacklink => write!(
                f,
                "{} -> {} ({}): no backlink",
                self.source, self.target, self.key
            ),
            DriftKind::MissingTarget => write!(
                f,
                "{} -> {} ({}): target missing",
                self.source, self.target, self.key
            ),
            DriftKind::MisfiledTarget => write!(
                f,
                "{} -> {} ({}): filed under the wrong group",
                self.source, self.target, self.key
            ),
        }
    }
}

/// Normalize a reference target; a bare name is a project.
fn resolve_target(target: &str) -> Option<String> {
    let normalized = normalize_path(target)?;
    if normalized.contains('/') {
        Some(normalized)
    } else {
        project_reference(&normalized)
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Horizon(#[from] HorizonError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("document name is empty")]
    EmptyName,
}

/// Result of a saved edit. Backlink warnings never undo the save.
#[derive(Debug)]
pub struct EditReport {
    pub path: String,
    /// Whether the saved text differs from what was on disk.
    pub changed: bool,
    pub warnings: Vec<SyncWarning>,
}

/// A workspace of horizon documents on top of a store.
pub struct Workspace<S> {
    store: S,
}

impl<S: DocumentStore> Workspace<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn references(&self) -> ReferenceSync<'_, S> {
        ReferenceSync::new(&self.store)
    }

    /// Read and extract the document at `path` (a file, or a project
    /// reference such as `projects/Launch`).
    pub async fn load(&self, path: &str) -> Result<HorizonDocument, EditError> {
        let (kind, file) = locate(path)?;
        let text = self.store.read(&file).await?;
        Ok(MetadataExtractor::extract(kind, &file, &text))
    }

    /// Write the canonical skeleton for a new document. Never overwrites.
    pub async fn create(&self, kind: HorizonKind, name: &str) -> Result<String, EditError> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(EditError::EmptyName);
        }
        let path = new_document_path(kind, name);
        match self.store.read(&path).await {
            Ok(_) => return Err(EditError::AlreadyExists(path)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let created_at = Local::now().fixed_offset();
        let text = MarkdownBuilder::skeleton(kind, name, created_at);
        self.store.write(&path, &text).await?;
        log::info!("Created {} {}", kind, path);
        Ok(path)
    }

    /// Save field changes to one document, then patch the other side of
    /// every reference group that changed.
    ///
    /// Read, build and write failures on the edited document are errors.
    /// Backlink failures come back as warnings in the report.
    pub async fn apply_edit(
        &self,
        path: &str,
        overrides: &DocumentOverrides,
    ) -> Result<EditReport, EditError> {
        let (kind, file) = locate(path)?;
        let text = self.store.read(&file).await?;
        let before = MetadataExtractor::extract(kind, &file, &text);
        let after = before.with_overrides(overrides)?;
        let updated = MarkdownBuilder::build(&after, None)?;

        let changed = updated != text;
        if changed {
            self.store.write(&file, &updated).await?;
            log::info!("Saved {}", file);
        }

        let mut warnings = Vec::new();
        if kind.reference_key().is_some() {
            let sync = self.references();
            for key in kind.reference_keys() {
                let old = before.references.get(*key);
                let new = after.references.get(*key);
                if old != new {
                    warnings.extend(sync.reconcile(&file, kind, old, new).await);
                }
            }
        } else if before.references != after.references {
            log::debug!("{} references are one-way; no backlinks written", kind);
        }

        Ok(EditReport {
            path: file,
            changed,
            warnings,
        })
    }

    /// Link `source` to `target` on both sides.
    pub async fn link(&self, source: &str, target: &str) -> Result<EditReport, EditError> {
        self.toggle(source, target, SyncAction::Add).await
    }

    /// Drop the link between `source` and `target` on both sides.
    pub async fn unlink(&self, source: &str, target: &str) -> Result<EditReport, EditError> {
        self.toggle(source, target, SyncAction::Remove).await
    }

    async fn toggle(
        &self,
        source: &str,
        target: &str,
        action: SyncAction,
    ) -> Result<EditReport, EditError> {
        let target = resolve_target(target)
            .ok_or_else(|| HorizonError::InvalidPath(target.to_string()))?;
        let target_kind = HorizonKind::from_path(&target)
            .ok_or_else(|| HorizonError::UnknownHorizon(target.clone()))?;
        let key = target_kind
            .reference_key()
            .ok_or(HorizonError::NoReciprocalGroup { kind: target_kind })?;

        let doc = self.load(source).await?;
        if !doc.kind.holds(key) {
            return Err(HorizonError::InvalidReferenceKey { kind: doc.kind, key }.into());
        }
        let mut paths: Vec<String> = doc.references.get(key).to_vec();
        match action {
            SyncAction::Add => paths.push(target),
            SyncAction::Remove => paths.retain(|p| *p != target),
        }

        let mut overrides = DocumentOverrides::default();
        overrides.references.insert(key, paths);
        self.apply_edit(source, &overrides).await
    }
}

/// Kind and document file for a workspace path.
fn locate(path: &str) -> Result<(HorizonKind, String), HorizonError> {
    let unified = unify_path(path).ok_or_else(|| HorizonError::InvalidPath(path.to_string()))?;
    let kind = HorizonKind::from_path(&unified)
        .ok_or_else(|| HorizonError::UnknownHorizon(unified.clone()))?;
    Ok((kind, document_file(&unified)))
}

#[cfg(test)]
mod tests {
    use super::store::{DocumentStore, MemoryStore};
    use super::*;
    use crate::core::horizon::Status;
    use chrono::{FixedOffset, TimeZone};

    fn skeleton(kind: HorizonKind, title: &str) -> String {
        let created = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 9, 1, 9, 0, 0)
            .unwrap();
        MarkdownBuilder::skeleton(kind, title, created)
    }

    fn workspace() -> Workspace<MemoryStore> {
        let area = skeleton(HorizonKind::Area, "Home");
        let project = skeleton(HorizonKind::Project, "Paint Walls");
        let goal = skeleton(HorizonKind::Goal, "Run");
        let habit = skeleton(HorizonKind::Habit, "Walk");
        Workspace::new(MemoryStore::with_files([
            ("Areas of Focus/Home.md", area.as_str()),
            ("Projects/Paint Walls/README.md", project.as_str()),
            ("Goals/Run.md", goal.as_str()),
            ("Habits/Walk.md", habit.as_str()),
        ]))
    }

    #[tokio::test]
    async fn add_then_remove_restores_target_exactly() {
        let ws = workspace();
        let sync = ws.references();
        let original = ws.store().get("Projects/Paint Walls/README.md").unwrap();

        let outcome = sync
            .sync(
                "Areas of Focus/Home.md",
                HorizonKind::Area,
                "projects/Paint Walls",
                SyncAction::Add,
            )
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Updated);

        let project = ws.load("projects/Paint Walls").await.unwrap();
        assert_eq!(project.references.get(ReferenceKey::Areas), ["areas of focus/Home.md"]);

        let outcome = sync
            .sync(
                "Areas of Focus/Home.md",
                HorizonKind::Area,
                "projects/Paint Walls",
                SyncAction::Remove,
            )
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Updated);
        assert_eq!(ws.store().get("Projects/Paint Walls/README.md").unwrap(), original);
    }

    #[tokio::test]
    async fn repeated_toggles_are_no_ops() {
        let ws = workspace();
        let sync = ws.references();
        let add = || sync.sync("goals/Run.md", HorizonKind::Goal, "Paint Walls", SyncAction::Add);
        assert_eq!(add().await.unwrap(), SyncOutcome::Updated);
        let once = ws.store().get("Projects/Paint Walls/README.md").unwrap();
        assert_eq!(add().await.unwrap(), SyncOutcome::Unchanged);
        assert_eq!(ws.store().get("Projects/Paint Walls/README.md").unwrap(), once);

        let outcome = sync
            .sync("goals/Run.md", HorizonKind::Goal, "areas of focus/Home.md", SyncAction::Remove)
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Unchanged);
    }

    #[tokio::test]
    async fn readme_targets_are_skipped_and_habits_have_no_backlinks() {
        let ws = workspace();
        let sync = ws.references();
        let outcome = sync
            .sync("goals/Run.md", HorizonKind::Goal, "areas/README.md", SyncAction::Add)
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped);

        let err = sync
            .sync("habits/Walk.md", HorizonKind::Habit, "goals/Run.md", SyncAction::Add)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Horizon(HorizonError::NoReciprocalGroup { .. })
        ));

        let err = sync
            .sync("goals/Run.md", HorizonKind::Goal, "", SyncAction::Add)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn targets_climbing_out_of_the_workspace_are_rejected() {
        let ws = workspace();
        let before = ws.store().len();
        let err = ws
            .references()
            .sync(
                "areas of focus/Home.md",
                HorizonKind::Area,
                "goals/../../outside/Evil.md",
                SyncAction::Add,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidTarget(_)));
        assert_eq!(ws.store().len(), before);

        assert!(matches!(
            ws.load("goals/../Run.md").await,
            Err(EditError::Horizon(HorizonError::InvalidPath(_)))
        ));
    }

    #[tokio::test]
    async fn edit_saves_source_and_reports_backlink_failures_as_warnings() {
        let ws = workspace();
        let mut overrides = DocumentOverrides {
            status: Some(Status::Watch),
            ..Default::default()
        };
        overrides.references.insert(
            ReferenceKey::Projects,
            vec!["Projects/Paint Walls".into(), "projects/Missing".into()],
        );

        let report = ws.apply_edit("areas of focus/Home.md", &overrides).await.unwrap();
        assert!(report.changed);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].target, "projects/Missing");
        assert!(matches!(report.warnings[0].error, SyncError::Store(_)));

        let area = ws.load("Areas of Focus/Home.md").await.unwrap();
        assert_eq!(area.status, Some(Status::Watch));
        assert_eq!(
            area.references.get(ReferenceKey::Projects),
            ["projects/Paint Walls", "projects/Missing"]
        );
        let project = ws.load("projects/Paint Walls").await.unwrap();
        assert_eq!(project.references.get(ReferenceKey::Areas), ["areas of focus/Home.md"]);
    }

    #[tokio::test]
    async fn link_and_unlink_touch_both_sides() {
        let ws = workspace();
        let report = ws.link("goals/Run.md", "areas of focus/Home.md").await.unwrap();
        assert!(report.warnings.is_empty());
        let area = ws.load("areas of focus/Home.md").await.unwrap();
        assert_eq!(area.references.get(ReferenceKey::Goals), ["goals/Run.md"]);

        ws.unlink("goals/Run.md", "areas of focus/Home.md").await.unwrap();
        let area = ws.load("areas of focus/Home.md").await.unwrap();
        let goal = ws.load("goals/Run.md").await.unwrap();
        assert!(area.references.is_empty());
        assert!(goal.references.is_empty());
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite() {
        let ws = workspace();
        let path = ws.create(HorizonKind::Vision, "Ten Years").await.unwrap();
        assert_eq!(path, "Vision/Ten Years.md");
        let vision = ws.load(&path).await.unwrap();
        assert_eq!(vision.title, "Ten Years");
        assert!(vision.created_at.is_some());

        assert!(matches!(
            ws.create(HorizonKind::Goal, "Run").await,
            Err(EditError::AlreadyExists(_))
        ));
        assert!(matches!(
            ws.create(HorizonKind::Goal, "  ").await,
            Err(EditError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn drift_reports_one_sided_references() {
        let ws = workspace();
        ws.link("goals/Run.md", "areas of focus/Home.md").await.unwrap();
        assert!(ws.references().drift().await.unwrap().is_empty());

        let mut overrides = DocumentOverrides::default();
        overrides.references.insert(
            ReferenceKey::Projects,
            vec!["projects/Paint Walls".into(), "projects/Gone".into()],
        );
        let goal = ws.load("goals/Run.md").await.unwrap();
        let text = MarkdownBuilder::build(&goal, Some(&overrides)).unwrap();
        ws.store().write("Goals/Run.md", &text).await.unwrap();

        let drift = ws.references().drift().await.unwrap();
        assert_eq!(
            drift,
            vec![
                Drift {
                    source: "goals/Run.md".into(),
                    key: ReferenceKey::Projects,
                    target: "projects/Paint Walls".into(),
                    kind: DriftKind::MissingBacklink,
                },
                Drift {
                    source: "goals/Run.md".into(),
                    key: ReferenceKey::Projects,
                    target: "projects/Gone".into(),
                    kind: DriftKind::MissingTarget,
                },
            ]
        );
    }

    #[tokio::test]
    async fn misfiled_references_are_refused_and_reported() {
        let ws = workspace();
        let mut overrides = DocumentOverrides::default();
        overrides
            .references
            .insert(ReferenceKey::Projects, vec!["goals/Run.md".into()]);
        let err = ws
            .apply_edit("areas of focus/Home.md", &overrides)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EditError::Horizon(HorizonError::MisfiledReference {
                key: ReferenceKey::Projects,
                ..
            })
        ));
        let goal = ws.load("goals/Run.md").await.unwrap();
        assert!(goal.references.is_empty());

        // A hand-edited file can still carry one.
        let home = ws.store().get("Areas of Focus/Home.md").unwrap();
        let home = home.replace(
            "## Projects References\n",
            "## Projects References\n- [Run](<goals/Run.md>)\n",
        );
        ws.store().write("Areas of Focus/Home.md", &home).await.unwrap();
        let drift = ws.references().drift().await.unwrap();
        assert_eq!(
            drift,
            vec![Drift {
                source: "areas of focus/Home.md".into(),
                key: ReferenceKey::Projects,
                target: "goals/Run.md".into(),
                kind: DriftKind::MisfiledTarget,
            }]
        );
    }

    #[tokio::test]
    async fn forget_prunes_every_referencing_document() {
        let ws = workspace();
        ws.link("areas of focus/Home.md", "projects/Paint Walls").await.unwrap();
        ws.link("goals/Run.md", "projects/Paint Walls").await.unwrap();

        let report = ws.references().forget("Projects/Paint Walls/README.md").await.unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.pruned.len(), 2);

        let area = ws.load("areas of focus/Home.md").await.unwrap();
        let goal = ws.load("goals/Run.md").await.unwrap();
        assert!(area.references.is_empty());
        assert!(goal.references.is_empty());
    }
}
