/// Canonicalize a reference path.
///
/// Backslashes become forward slashes, surrounding whitespace and a leading
/// `./` are dropped, repeated slashes collapse, and directory segments are
/// case-folded so `Areas/Foo.md` and `areas\Foo.md` name the same document.
/// The final segment keeps its case. Returns `None` for an empty reference.
pub fn normalize_path(raw: &str) -> Option<String> {
    let unified = unify_path(raw)?;
    match unified.rsplit_once('/') {
        Some((dirs, last)) => Some(format!("{}/{}", dirs.to_lowercase(), last)),
        None => Some(unified),
    }
}

/// Like [`normalize_path`] but keeps the case of every segment.
///
/// A `..` segment anywhere makes the path unusable: workspace paths never
/// climb out of their directory.
pub fn unify_path(raw: &str) -> Option<String> {
    let unified = raw.trim().replace('\\', "/");
    let unified = unified.trim_start_matches("./");

    let segments: Vec<&str> = unified
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.is_empty() || segments.contains(&"..") {
        return None;
    }

    let joined = segments.join("/");
    if unified.starts_with('/') {
        Some(format!("/{joined}"))
    } else {
        Some(joined)
    }
}

/// Human-readable name for a path: the last segment without a markdown
/// extension.
pub fn display_name(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let last = unified
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    strip_markdown_extension(last).to_string()
}

/// Whether a path points at a README-style index file. Those are never valid
/// reference targets.
pub fn is_readme(path: &str) -> bool {
    let unified = path.trim().replace('\\', "/");
    let last = unified
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    strip_markdown_extension(last).eq_ignore_ascii_case("readme")
}

/// Whether the final segment carries a `.md` / `.markdown` extension.
pub fn has_markdown_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    strip_markdown_extension(last).len() != last.len()
}

fn strip_markdown_extension(name: &str) -> &str {
    for ext in [".markdown", ".md"] {
        if name.len() > ext.len() {
            let split = name.len() - ext.len();
            if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(ext) {
                return &name[..split];
            }
        }
    }
    name
}

/// Normalize a list of raw references: drop empties and README targets,
/// de-duplicate on the normalized form, keep first-seen order.
pub fn normalize_references<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in raw {
        let Some(path) = normalize_path(item) else {
            continue;
        };
        if is_readme(&path) {
            log::debug!("Dropping README reference: {}", path);
            continue;
        }
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}

/// Fold an owner name into a lower-kebab-case token (`Alex Kim` → `alex-kim`).
pub fn normalize_steward(raw: &str) -> Option<String> {
    let mut out = String::new();
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    (!out.is_empty()).then_some(out)
}
