//! Error types for transport faults and driver operations.
//!
//! Transport implementations report [`TransportError`]; the driver wraps
//! those into [`CameraError`] at the operation that triggered them, so a
//! caller always sees which stage of the pipeline failed.

use thiserror::Error;

/// Faults reported by the underlying device transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No devices were enumerated on the transport.
    #[error("no camera devices enumerated")]
    NoDevices,

    /// No enumerated device carries the requested serial.
    #[error("no device with serial {0} present, is that camera plugged in?")]
    SerialNotFound(u32),

    /// The named configuration node does not exist or is currently unavailable.
    #[error("node \"{0}\" is unavailable")]
    NodeUnavailable(String),

    /// The named configuration node cannot be read.
    #[error("node \"{0}\" is not readable")]
    NodeNotReadable(String),

    /// The named configuration node cannot be written.
    #[error("node \"{0}\" is not writable")]
    NodeNotWritable(String),

    /// An enumeration node has no entry with the requested name.
    #[error("enumeration \"{node}\" has no entry \"{entry}\"")]
    NoSuchEntry {
        /// Enumeration node name.
        node: String,
        /// Requested entry name.
        entry: String,
    },

    /// The device did not respond within the transport's timeout.
    #[error("timed out waiting for the device")]
    Timeout,

    /// Any other fault surfaced by the vendor layer.
    #[error("device fault: {0}")]
    Device(String),
}

/// Driver-level error taxonomy.
///
/// Every hardware fault is wrapped with the operation that hit it. Only
/// [`CameraError::NotRunning`] is routine: a caller polling for frames
/// before streaming has started should retry later rather than treat it
/// as a fault.
#[derive(Error, Debug)]
pub enum CameraError {
    /// The target device could not be resolved by serial or enumeration.
    #[error("could not resolve camera with serial {serial}: {source}")]
    DeviceResolution {
        /// Serial the driver attempted to bind to (0 = first device).
        serial: u32,
        /// Underlying transport fault.
        source: TransportError,
    },

    /// Session initialization or model detection failed.
    #[error("failed to connect to camera: {source}")]
    Connect {
        /// Underlying transport fault.
        source: TransportError,
    },

    /// Session teardown failed; the in-memory handle is cleared regardless.
    #[error("failed to disconnect camera: {source}")]
    Disconnect {
        /// Underlying transport fault.
        source: TransportError,
    },

    /// The hardware begin-streaming call failed; the controller stays stopped.
    #[error("failed to start acquisition: {source}")]
    AcquisitionStart {
        /// Underlying transport fault.
        source: TransportError,
    },

    /// The hardware stop call failed; the controller is logically stopped anyway.
    #[error("failed to stop acquisition: {source}")]
    AcquisitionStop {
        /// Underlying transport fault.
        source: TransportError,
    },

    /// The operation requires an open connection.
    #[error("not connected to the camera")]
    NotConnected,

    /// Frames were requested while acquisition is stopped. Routine when a
    /// caller polls before streaming starts; retry after `start()`.
    #[error("camera is not running, start acquisition before grabbing frames")]
    NotRunning,

    /// The device delivered a partial frame; no data is forwarded.
    #[error("frame received from camera {serial} is incomplete")]
    IncompleteFrame {
        /// Serial of the delivering device.
        serial: u32,
    },

    /// The sensor reports a color filter the decoder does not know.
    #[error("color filter \"{filter}\" not recognized for {bits_per_pixel}-bit frames")]
    UnknownBayerPattern {
        /// Color filter entry reported by the device.
        filter: String,
        /// Bit depth of the offending frame.
        bits_per_pixel: u32,
    },

    /// Pulling or interpreting the raw buffer failed.
    #[error("failed to retrieve frame: {source}")]
    FrameRetrieval {
        /// Underlying transport fault.
        source: TransportError,
    },

    /// The chunk-metadata mode toggle or selector could not be driven.
    #[error("failed to configure chunk data: {source}")]
    MetadataConfig {
        /// Underlying transport fault.
        source: TransportError,
    },

    /// A configuration node write failed while applying settings.
    #[error("failed to apply \"{node}\": {source}")]
    Configuration {
        /// Node the profile was writing.
        node: String,
        /// Underlying transport fault.
        source: TransportError,
    },
}

impl CameraError {
    /// Whether a caller should treat this error as routine and retry
    /// later instead of surfacing a fault.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotRunning)
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, CameraError>;
