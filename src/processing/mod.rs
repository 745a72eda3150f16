//! Post-processing of finished captures: repair or move, secondary upload,
//! retention pruning, and recovery of leftovers from an unclean shutdown.

pub mod pipeline;
pub mod prune;
pub mod repair;
pub mod upload;

pub use pipeline::PostProcessor;
pub use prune::{prune_old_files, PruneReport};
pub use repair::{Ffmpeg, RepairExit, RepairTool};
pub use upload::{move_file, upload_to_secondary};
