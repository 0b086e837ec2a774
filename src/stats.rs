use std::collections::HashMap;
use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Attribute keys recognized by the folder aggregator.
pub const ATTR_SIZE: &str = "size";
pub const ATTR_MTIME: &str = "mtime";
pub const ATTR_ATIME: &str = "atime";
pub const ATTR_CTIME: &str = "ctime";

/// Sum the values. Identity element 0 for empty input.
pub fn aggregate_sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean of the values. Defined as 0 for empty input.
pub fn aggregate_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// How an attribute is combined across the direct files of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
    Sum,
    CentralTendency,
}

/// One aggregated attribute value for a folder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub value: f64,
    pub kind: AggregateKind,
}

/// Metadata sample for a single direct file, timestamps in seconds since
/// the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSample {
    pub size: u64,
    pub mtime: f64,
    pub atime: f64,
    pub ctime: f64,
}

/// Aggregated statistics for one folder, computed over its *direct* files
/// only (subdirectories never contribute).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderStats {
    pub path: PathBuf,
    pub attributes: HashMap<CompactString, Aggregate>,
}

impl FolderStats {
    /// Build the full attribute set from the direct-file samples of `path`.
    ///
    /// `size` is a plain sum; the three timestamps are arithmetic means
    /// over the file count. An empty sample set yields all-zero attributes,
    /// which is also how an unreadable directory degrades.
    pub fn from_files(path: PathBuf, files: &[FileSample]) -> Self {
        let sizes: Vec<f64> = files.iter().map(|f| f.size as f64).collect();
        let mtimes: Vec<f64> = files.iter().map(|f| f.mtime).collect();
        let atimes: Vec<f64> = files.iter().map(|f| f.atime).collect();
        let ctimes: Vec<f64> = files.iter().map(|f| f.ctime).collect();

        let mut attributes = HashMap::with_capacity(4);
        attributes.insert(
            CompactString::new(ATTR_SIZE),
            Aggregate {
                value: aggregate_sum(&sizes),
                kind: AggregateKind::Sum,
            },
        );
        for (key, values) in [
            (ATTR_MTIME, &mtimes),
            (ATTR_ATIME, &atimes),
            (ATTR_CTIME, &ctimes),
        ] {
            attributes.insert(
                CompactString::new(key),
                Aggregate {
                    value: aggregate_mean(values),
                    kind: AggregateKind::CentralTendency,
                },
            );
        }

        FolderStats { path, attributes }
    }

    /// Convenience accessor for a single attribute value.
    pub fn value(&self, attr: &str) -> Option<f64> {
        self.attributes.get(attr).map(|a| a.value)
    }

    /// The summed byte size of the folder's direct files.
    pub fn size(&self) -> f64 {
        self.value(ATTR_SIZE).unwrap_or(0.0)
    }
}
