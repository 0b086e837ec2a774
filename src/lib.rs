// Core library for the canopy folder-overview canvas:
// scan sessions stream per-folder stats into an arena tree that a
// constrained force simulation lays out column by column.

pub mod channel;
pub mod layout;
pub mod overview;
pub mod scanner;
pub mod stats;
pub mod tree;
