//! Recording sessions: naming, launching and supervising the capture tool.

pub mod capture;
pub mod filename;
pub mod session;

pub use capture::{CaptureExit, CaptureProgress, CaptureTool, Streamlink};
pub use filename::RecordingNamer;
pub use session::{RecordingSession, SessionController, SessionOutcome};
