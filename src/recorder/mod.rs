//! Capture/record session
//!
//! - StudioSession drives the Idle / Recording / Live state machine
//! - MediaRecorder cuts a composite stream into ordered chunks
//! - SessionClock and Ticker keep elapsed time and the viewer walk

pub mod clock;
pub mod composite;
pub mod coordinator;
pub mod events;
pub mod live;
pub mod media_recorder;
pub mod state;
pub mod ticker;

pub use clock::{SessionClock, TickReport};
pub use composite::CompositeStream;
pub use coordinator::StudioSession;
pub use events::SessionEvent;
pub use live::{LiveDetails, LiveSession, StreamCredentials};
pub use media_recorder::{ChunkBuffer, MediaRecorder, RecordedMedia, RecordedTrack};
pub use state::{LiveSummary, RecordingOutput, SessionMode, SessionSnapshot};
