use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::stats::FolderStats;

/// Hard recursion ceiling, applied even when a request asks for unlimited
/// depth.
pub const MAX_SCAN_DEPTH: u32 = 100;

/// One scan session's immutable request. Wire tag `folderdeepsync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "folderdeepsync")]
pub struct ScanRequest {
    #[serde(rename = "id")]
    pub session_id: u64,
    pub root_path: PathBuf,
    /// 0 = unlimited (still capped at [`MAX_SCAN_DEPTH`]).
    pub max_depth: u32,
}

impl ScanRequest {
    /// Whether the worker may descend into a child of a directory at
    /// `depth` (root = 0).
    pub fn allows_depth(&self, depth: u32) -> bool {
        if depth >= MAX_SCAN_DEPTH {
            return false;
        }
        self.max_depth == 0 || depth < self.max_depth
    }
}

/// Event stream produced by the scan worker, correlated by session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScanEvent {
    /// A directory was visited, before its children were scanned.
    #[serde(rename = "foldersync")]
    FolderEntered {
        #[serde(rename = "id")]
        session_id: u64,
        path: PathBuf,
    },
    /// All direct files of a directory have been stat'ed.
    #[serde(rename = "folderstats")]
    FolderStats {
        #[serde(rename = "id")]
        session_id: u64,
        path: PathBuf,
        stats: FolderStats,
    },
}

impl ScanEvent {
    pub fn session_id(&self) -> u64 {
        match self {
            ScanEvent::FolderEntered { session_id, .. } => *session_id,
            ScanEvent::FolderStats { session_id, .. } => *session_id,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanEvent::FolderEntered { path, .. } => path,
            ScanEvent::FolderStats { path, .. } => path,
        }
    }
}
