pub mod poll_loop;
pub mod status;

pub use poll_loop::PollLoop;
pub use status::{CycleReport, LoopState, ERROR_BACKOFF};
