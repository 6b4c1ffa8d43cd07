// Job path parsing: "job/a/job/b/job/c/" -> leaf "c", parents ["a", "b"]

use crate::models::JobPath;

const SEPARATOR: char = '/';

/// Folder marker in Jenkins-style job URLs; carries no name.
const FOLDER_MARKER: &str = "job";

/// Splits a slash-separated job path into its leaf name and parent folders.
///
/// Never fails: malformed input yields a best-effort split. A single-level
/// path has no parents.
pub fn resolve_job_path(raw: &str) -> JobPath {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(SEPARATOR).unwrap_or(trimmed);

    let (prefix, leaf) = trimmed.rsplit_once(SEPARATOR).unwrap_or(("", trimmed));

    let parent_segments = prefix
        .split(SEPARATOR)
        .filter(|s| is_named_segment(s))
        .map(str::to_string)
        .collect();

    JobPath {
        leaf_name: leaf.to_string(),
        parent_segments,
    }
}

fn is_named_segment(segment: &str) -> bool {
    segment != FOLDER_MARKER && !segment.trim().is_empty()
}
