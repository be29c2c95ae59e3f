//! Gencam-Capture: an acquisition driver for GenICam-style industrial cameras
//!
//! This library manages the lifecycle of one camera connection: resolving
//! a device, applying per-model-family configuration, gating streaming
//! through an acquisition state machine, and decoding raw sensor frames
//! into images tagged with a well-known pixel encoding. The vendor
//! transport is consumed through trait-based abstractions, enabling both
//! production vendor bindings and testing with mock devices.

pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod mock;
pub mod profile;
pub mod traits;

pub use camera::Camera;
pub use config::{CameraConfig, LEVEL_RECONFIGURE_RUNNING, LEVEL_RECONFIGURE_STOP};
pub use error::{CameraError, Result, TransportError};
pub use frame::{ImageBuffer, PixelEncoding, Timestamp};
pub use profile::{ParameterProfile, ProfileRegistry};
pub use traits::{
    CameraSession, DeviceTransport, LinkSpeed, NodeAccess, RawFrame, TransportKind,
};
