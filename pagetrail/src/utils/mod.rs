//! Utilities for input path expansion, object copying and size formatting.

use crate::error::{PageTrailError, Result};
use lopdf::{Document, Object};
use std::path::PathBuf;

/// Expand glob patterns into filesystem paths, keeping argument order.
///
/// Each pattern expands to its matches in lexical order. A pattern without
/// glob metacharacters that matches nothing is kept as-is so the loader can
/// report it as a missing input at its position.
///
/// Errors:
/// - Propagates `glob` parse errors.
/// - Propagates filesystem errors from glob iterator.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = collect_paths_for_pattern(pattern)?;
        if paths.is_empty() && !has_glob_meta(pattern) {
            resolved_paths.push(PathBuf::from(pattern));
        } else {
            resolved_paths.extend(paths);
        }
    }

    Ok(resolved_paths)
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand a single glob pattern into filesystem paths.
fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|err| {
        PageTrailError::invalid_config(format!("Invalid input pattern '{pattern}': {err}"))
    })?;

    let mut resolved_paths = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| PageTrailError::other(err.to_string()))?;
        resolved_paths.push(path);
    }

    Ok(resolved_paths)
}

/// Copy objects referenced from `obj` out of `source` into `target`.
///
/// Follows references transitively and inserts every referenced object that
/// `target` does not hold yet. The walk uses an explicit worklist, so deep
/// reference chains cannot exhaust the stack. Object ids must already be
/// disjoint, which is what `Document::renumber_objects_with` guarantees
/// before a copy.
pub fn copy_references(target: &mut Document, source: &Document, obj: &Object) {
    let mut pending = vec![obj];
    while let Some(obj) = pending.pop() {
        match obj {
            Object::Reference(ref_id) => {
                if !target.objects.contains_key(ref_id)
                    && let Ok(referenced_obj) = source.get_object(*ref_id)
                {
                    target.objects.insert(*ref_id, referenced_obj.clone());
                    pending.push(referenced_obj);
                }
            }
            Object::Dictionary(dict) => pending.extend(dict.iter().map(|(_, value)| value)),
            Object::Array(arr) => pending.extend(arr),
            Object::Stream(stream) => pending.extend(stream.dict.iter().map(|(_, value)| value)),
            _ => {}
        }
    }
}

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
