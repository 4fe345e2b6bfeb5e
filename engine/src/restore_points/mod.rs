//! Restore points: full copies of the live default theme plus the manifest
//! that describes them.

pub mod files;
pub mod operations;
pub mod runtime;
pub mod scripts;
pub mod service;
pub mod state_paths;
pub mod state_store;
pub mod tree;
pub mod types;

pub use service::{Collaborators, RestorePointService};
pub use state_paths::{build_restore_point_id, is_path_in_directory, is_trusted_restore_point_id};
pub use state_store::{RestorePointStateStore, SnapshotRequest, WriteOptions};
pub use types::{
    RestorePointEntry, RestorePointTreeNode, RestorePointType, RestorePointsState, TreeNodeType,
};
