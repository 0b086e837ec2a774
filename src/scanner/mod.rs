pub mod types;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};

use crate::stats::{FileSample, FolderStats};
use self::types::{ScanEvent, ScanRequest};

/// Run one scan session to completion, streaming events through `emit`.
///
/// Depth-first: `FolderEntered` is emitted pre-order, each directory's
/// `FolderStats` after its direct files are stat'ed. Child events may
/// interleave with the parent's stats event; parent stats cover direct
/// files only and never wait on subdirectories.
///
/// Returns the root directory's stats, or `None` when the session was
/// cancelled mid-traversal. Cancellation stops further events but is not
/// an error.
pub fn scan(
    request: &ScanRequest,
    emit: &mut dyn FnMut(ScanEvent),
    cancelled: &AtomicBool,
) -> Result<Option<FolderStats>> {
    let meta = std::fs::metadata(&request.root_path)
        .with_context(|| format!("cannot stat scan root {}", request.root_path.display()))?;
    if !meta.is_dir() {
        bail!("scan root {} is not a directory", request.root_path.display());
    }

    tracing::info!(
        session = request.session_id,
        path = %request.root_path.display(),
        max_depth = request.max_depth,
        "scan session starting"
    );

    let stats = scan_dir(request, &request.root_path, 0, emit, cancelled);

    match &stats {
        Some(s) => tracing::info!(
            session = request.session_id,
            size = s.size(),
            "scan session finished"
        ),
        None => tracing::info!(session = request.session_id, "scan session cancelled"),
    }

    Ok(stats)
}

/// Recursive worker for one directory. Returns `None` once the session is
/// cancelled; per-entry filesystem errors are skipped, never propagated.
fn scan_dir(
    request: &ScanRequest,
    path: &Path,
    depth: u32,
    emit: &mut dyn FnMut(ScanEvent),
    cancelled: &AtomicBool,
) -> Option<FolderStats> {
    if cancelled.load(Ordering::Relaxed) {
        return None;
    }

    emit(ScanEvent::FolderEntered {
        session_id: request.session_id,
        path: path.to_path_buf(),
    });

    // First pass: recurse into subdirectories while the depth bound allows.
    if request.allows_depth(depth) {
        for entry_path in list_dir(request.session_id, path) {
            if cancelled.load(Ordering::Relaxed) {
                return None;
            }
            if is_dir_no_follow(&entry_path) {
                scan_dir(request, &entry_path, depth + 1, emit, cancelled)?;
            }
        }
    }

    // Second pass: stat direct files. A directory that cannot be listed
    // degrades to a present-but-empty node with zero aggregates.
    let mut samples = Vec::new();
    for entry_path in list_dir(request.session_id, path) {
        if is_dir_no_follow(&entry_path) {
            continue;
        }
        match std::fs::metadata(&entry_path) {
            Ok(meta) => samples.push(FileSample {
                size: meta.len(),
                mtime: time_secs(meta.modified()),
                atime: time_secs(meta.accessed()),
                ctime: time_secs(meta.created()),
            }),
            Err(e) => {
                tracing::warn!(
                    session = request.session_id,
                    path = %entry_path.display(),
                    error = %e,
                    "skipping unreadable entry"
                );
            }
        }
    }

    let stats = FolderStats::from_files(path.to_path_buf(), &samples);
    tracing::debug!(
        session = request.session_id,
        path = %path.display(),
        files = samples.len(),
        size = stats.size(),
        "folder stats computed"
    );

    if cancelled.load(Ordering::Relaxed) {
        return None;
    }
    emit(ScanEvent::FolderStats {
        session_id: request.session_id,
        path: path.to_path_buf(),
        stats: stats.clone(),
    });

    Some(stats)
}

/// List a directory, logging and swallowing per-call errors so one bad
/// entry never aborts the session.
fn list_dir(session: u64, path: &Path) -> Vec<std::path::PathBuf> {
    let reader = match std::fs::read_dir(path) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(
                session,
                path = %path.display(),
                error = %e,
                "cannot list directory"
            );
            return Vec::new();
        }
    };

    let mut paths: Vec<_> = reader
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.path()),
            Err(e) => {
                tracing::warn!(session, path = %path.display(), error = %e, "skipping entry");
                None
            }
        })
        .collect();
    // Stable order keeps event streams deterministic for a given tree.
    paths.sort();
    paths
}

/// Directory check that does not follow symlinks, so a link cycle cannot
/// defeat the depth ceiling.
fn is_dir_no_follow(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

fn time_secs(t: std::io::Result<SystemTime>) -> f64 {
    t.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
