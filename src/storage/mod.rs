//! Local persistence of snapshots.

pub mod data_dir;

pub use data_dir::DataDir;
