//! Media Engine - sequential verse playback for Tilawah
//!
//! [`PlaybackSession`] owns the playback state machine. It is driven through
//! the [`AudioBackend`]/[`AudioResource`] capability traits; [`DeviceBackend`]
//! is the implementation that talks to real speakers.

mod decoder;
mod device;
mod error;
mod navigation;
mod output;
mod resampler;
mod resource;
mod scheduler;
mod session;
mod state;
mod volume;

pub use decoder::{AudioDecoder, DecodedTrack};
pub use device::{DeviceBackend, DeviceResource};
pub use error::{PlaybackError, PlaybackResult};
pub use navigation::{next_step, previous_step, NextStep, PreviousStep};
pub use output::output_device_names;
pub use resource::{AudioBackend, AudioResource, ResourceEvent, ResourceListener};
pub use session::{
    PlaybackSession, PositionHook, SessionBuilder, SessionConfig, DEFAULT_ADVANCE_DELAY,
    DEFAULT_RESTART_THRESHOLD,
};
pub use state::{SessionSnapshot, SessionState};
pub use volume::{clamp_volume, VolumeControl, DEFAULT_UNMUTE_VOLUME};
