//! Core traits and types for the camera transport boundary.
//!
//! The vendor acquisition stack is consumed as an opaque capability
//! surface: enumerate devices, open a session, read/write named
//! configuration nodes, start/stop streaming, and pull raw frames. The
//! driver is generic over these traits, enabling both production vendor
//! bindings and testing with mock devices.

use crate::error::TransportResult;

/// Transport-layer interface class of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// USB3 Vision device.
    Usb3Vision,
    /// GigE Vision device.
    GigEVision,
    /// Any other or unreported interface.
    Other,
}

/// Negotiated link speed of a device connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSpeed {
    /// USB 3.x SuperSpeed, the expected maximum for USB3 Vision.
    SuperSpeed,
    /// USB 2.0 HighSpeed fallback, typically a bad cable or hub.
    HighSpeed,
    /// USB 1.x FullSpeed.
    FullSpeed,
    /// Speed not reported by the transport.
    Unknown,
}

/// Capability flags of a named configuration node.
///
/// Real devices expose partial node sets; callers check availability and
/// writability before acting, and skip otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeAccess {
    /// The node exists and is currently implemented by the device.
    pub available: bool,
    /// The node value can be read.
    pub readable: bool,
    /// The node value can be written.
    pub writable: bool,
}

/// One raw sensor frame as delivered by the transport.
///
/// The buffer layout is described by the device: `stride_bytes` may
/// exceed `width` times the pixel size due to alignment padding and must
/// be carried through verbatim. The sensor's color filter arrangement is
/// not part of the frame; it is read from the device's configuration at
/// decode time because it can change across reconfiguration.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Device timestamp in nanoseconds.
    pub timestamp_ns: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Byte length of one row, including any alignment padding.
    pub stride_bytes: u32,
    /// Bit depth of one pixel as reported by the device.
    pub bits_per_pixel: u32,
    /// Whether the device delivered the full payload.
    pub complete: bool,
    /// Raw pixel bytes, at least `stride_bytes * height` long.
    pub data: Vec<u8>,
}

/// Device enumeration and session opening.
pub trait DeviceTransport {
    /// Session type produced by this transport.
    type Session: CameraSession;

    /// Number of devices currently enumerated.
    fn device_count(&self) -> usize;

    /// Open a session on the first enumerated device.
    fn open_first(&mut self) -> TransportResult<Self::Session>;

    /// Open a session on the device with the given serial.
    fn open_by_serial(&mut self, serial: u32) -> TransportResult<Self::Session>;
}

/// One open connection to a physical camera.
///
/// Sessions are not presumed safe for concurrent use; the driver
/// serializes every call behind one lock. Calls block for their hardware
/// round-trip, and `next_frame` is additionally bounded by the
/// transport's own timeout.
pub trait CameraSession {
    /// Serial number of the connected device.
    fn serial(&self) -> u32;

    /// Transport interface class, read from transport-layer metadata.
    fn transport_kind(&self) -> TransportResult<TransportKind>;

    /// Negotiated link speed, read from transport-layer metadata.
    fn link_speed(&self) -> TransportResult<LinkSpeed>;

    /// Initialize the low-level session. Must precede node access.
    fn initialize(&mut self) -> TransportResult<()>;

    /// Tear the low-level session down.
    fn teardown(&mut self) -> TransportResult<()>;

    /// Issue the hardware begin-streaming call.
    fn begin_acquisition(&mut self) -> TransportResult<()>;

    /// Issue the hardware end-streaming call.
    fn end_acquisition(&mut self) -> TransportResult<()>;

    /// Pull the next raw frame, blocking up to the transport timeout.
    fn next_frame(&mut self) -> TransportResult<RawFrame>;

    /// Capability flags of a named node. Missing nodes report all-false.
    fn node_access(&self, node: &str) -> NodeAccess;

    /// Read a string node.
    fn read_string(&self, node: &str) -> TransportResult<String>;

    /// Read the current entry name of an enumeration node.
    fn read_enum(&self, node: &str) -> TransportResult<String>;

    /// Set an enumeration node to the named entry.
    fn write_enum(&mut self, node: &str, entry: &str) -> TransportResult<()>;

    /// List the entry names of an enumeration node.
    fn enum_entries(&self, node: &str) -> TransportResult<Vec<String>>;

    /// Read a boolean node.
    fn read_bool(&self, node: &str) -> TransportResult<bool>;

    /// Write a boolean node.
    fn write_bool(&mut self, node: &str, value: bool) -> TransportResult<()>;

    /// Read an integer node.
    fn read_int(&self, node: &str) -> TransportResult<i64>;

    /// Write an integer node.
    fn write_int(&mut self, node: &str, value: i64) -> TransportResult<()>;

    /// Write a float node.
    fn write_float(&mut self, node: &str, value: f64) -> TransportResult<()>;
}
