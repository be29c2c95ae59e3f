//! Mock transport implementation for testing without hardware.
//!
//! [`MockTransport`] emulates one enumerable device with a configurable
//! node map, a scriptable frame queue, and switchable fault injection.
//! Cloning the transport shares the underlying device state, so a test
//! can keep a probe handle after moving the transport into the driver.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{TransportError, TransportResult};
use crate::traits::{
    CameraSession, DeviceTransport, LinkSpeed, NodeAccess, RawFrame, TransportKind,
};

const FULL_ACCESS: NodeAccess = NodeAccess {
    available: true,
    readable: true,
    writable: true,
};

#[derive(Debug, Clone)]
enum NodeValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Enum { current: String, entries: Vec<String> },
}

/// One named configuration node of the mock device.
#[derive(Debug, Clone)]
pub struct MockNode {
    value: NodeValue,
    access: NodeAccess,
}

impl MockNode {
    /// String node.
    #[must_use]
    pub fn string(value: &str) -> Self {
        Self {
            value: NodeValue::Str(value.to_owned()),
            access: FULL_ACCESS,
        }
    }

    /// Boolean node.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self {
            value: NodeValue::Bool(value),
            access: FULL_ACCESS,
        }
    }

    /// Integer node.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self {
            value: NodeValue::Int(value),
            access: FULL_ACCESS,
        }
    }

    /// Float node.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self {
            value: NodeValue::Float(value),
            access: FULL_ACCESS,
        }
    }

    /// Enumeration node with a current entry and its full entry list.
    #[must_use]
    pub fn enumeration(current: &str, entries: &[&str]) -> Self {
        Self {
            value: NodeValue::Enum {
                current: current.to_owned(),
                entries: entries.iter().map(|&entry| entry.to_owned()).collect(),
            },
            access: FULL_ACCESS,
        }
    }

    /// Strip write access.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.access.writable = false;
        self
    }

    /// Mark the node unimplemented on this device.
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.access.available = false;
        self
    }
}

fn render(value: &NodeValue) -> String {
    match value {
        NodeValue::Str(value) => value.clone(),
        NodeValue::Bool(value) => value.to_string(),
        NodeValue::Int(value) => value.to_string(),
        NodeValue::Float(value) => format!("{value}"),
        NodeValue::Enum { current, .. } => current.clone(),
    }
}

#[derive(Debug)]
struct Hardware {
    nodes: HashMap<String, MockNode>,
    frames: VecDeque<RawFrame>,
    kind: TransportKind,
    speed: LinkSpeed,
    initialized: bool,
    streaming: bool,
    init_calls: u32,
    begin_calls: u32,
    end_calls: u32,
    fail_begin: bool,
    fail_end: bool,
    fail_teardown: bool,
    writes: Vec<(String, String)>,
}

impl Hardware {
    fn node(&self, name: &str) -> TransportResult<&MockNode> {
        let node = self
            .nodes
            .get(name)
            .ok_or_else(|| TransportError::NodeUnavailable(name.to_owned()))?;
        if !node.access.available {
            return Err(TransportError::NodeUnavailable(name.to_owned()));
        }
        Ok(node)
    }

    fn readable(&self, name: &str) -> TransportResult<&MockNode> {
        let node = self.node(name)?;
        if !node.access.readable {
            return Err(TransportError::NodeNotReadable(name.to_owned()));
        }
        Ok(node)
    }

    fn writable(&mut self, name: &str) -> TransportResult<&mut MockNode> {
        let access = self.node(name)?.access;
        if !access.writable {
            return Err(TransportError::NodeNotWritable(name.to_owned()));
        }
        self.nodes
            .get_mut(name)
            .ok_or_else(|| TransportError::NodeUnavailable(name.to_owned()))
    }

    fn log_write(&mut self, name: &str) {
        if let Some(node) = self.nodes.get(name) {
            self.writes.push((name.to_owned(), render(&node.value)));
        }
    }
}

fn default_nodes() -> HashMap<String, MockNode> {
    let filter_entries = ["None", "BayerRG", "BayerGR", "BayerGB", "BayerBG"];
    let auto_entries = ["Off", "Once", "Continuous"];
    let chunk_entries = ["FrameID", "Timestamp", "ExposureTime", "Gain"];

    let nodes = [
        ("DeviceModelName", MockNode::string("Blackfly S BFS-U3-31S4C").read_only()),
        ("PixelColorFilter", MockNode::enumeration("None", &filter_entries).read_only()),
        ("WidthMax", MockNode::integer(2048).read_only()),
        ("HeightMax", MockNode::integer(1536).read_only()),
        ("Width", MockNode::integer(2048)),
        ("Height", MockNode::integer(1536)),
        ("OffsetX", MockNode::integer(0)),
        ("OffsetY", MockNode::integer(0)),
        ("ExposureAuto", MockNode::enumeration("Continuous", &auto_entries)),
        ("ExposureTime", MockNode::float(10_000.0)),
        ("GainAuto", MockNode::enumeration("Continuous", &auto_entries)),
        ("Gain", MockNode::float(0.0)),
        ("BalanceWhiteAuto", MockNode::enumeration("Continuous", &auto_entries)),
        ("AcquisitionFrameRateEnable", MockNode::boolean(false)),
        ("AcquisitionFrameRate", MockNode::float(30.0)),
        ("AcquisitionFrameRateAuto", MockNode::enumeration("Continuous", &auto_entries)),
        ("AcquisitionFrameRateEnabled", MockNode::boolean(false)),
        ("ChunkModeActive", MockNode::boolean(false)),
        ("ChunkSelector", MockNode::enumeration("FrameID", &chunk_entries)),
        ("ChunkEnable", MockNode::boolean(false)),
    ];

    nodes
        .into_iter()
        .map(|(name, node)| (name.to_owned(), node))
        .collect()
}

/// Mock device transport for testing without hardware.
#[derive(Clone)]
pub struct MockTransport {
    serials: Vec<u32>,
    hw: Arc<Mutex<Hardware>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Serial of the single device enumerated by [`MockTransport::new`].
    pub const DEFAULT_SERIAL: u32 = 18_060_270;

    /// One enumerable USB3 SuperSpeed device with a full default node map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            serials: vec![Self::DEFAULT_SERIAL],
            hw: Arc::new(Mutex::new(Hardware {
                nodes: default_nodes(),
                frames: VecDeque::new(),
                kind: TransportKind::Usb3Vision,
                speed: LinkSpeed::SuperSpeed,
                initialized: false,
                streaming: false,
                init_calls: 0,
                begin_calls: 0,
                end_calls: 0,
                fail_begin: false,
                fail_end: false,
                fail_teardown: false,
                writes: Vec::new(),
            })),
        }
    }

    /// Transport with nothing plugged in.
    #[must_use]
    pub fn no_devices(mut self) -> Self {
        self.serials.clear();
        self
    }

    /// Replace the enumerated device's serial.
    #[must_use]
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serials = vec![serial];
        self
    }

    /// Replace the reported model name.
    #[must_use]
    pub fn with_model(self, model: &str) -> Self {
        self.hw
            .lock()
            .nodes
            .insert("DeviceModelName".to_owned(), MockNode::string(model).read_only());
        self
    }

    /// Force the current color-filter entry, bypassing entry validation.
    #[must_use]
    pub fn with_color_filter(self, filter: &str) -> Self {
        if let Some(node) = self.hw.lock().nodes.get_mut("PixelColorFilter") {
            if let NodeValue::Enum { current, .. } = &mut node.value {
                *current = filter.to_owned();
            }
        }
        self
    }

    /// Insert or replace a named node.
    #[must_use]
    pub fn with_node(self, name: &str, node: MockNode) -> Self {
        self.hw.lock().nodes.insert(name.to_owned(), node);
        self
    }

    /// Remove a named node entirely.
    #[must_use]
    pub fn without_node(self, name: &str) -> Self {
        self.hw.lock().nodes.remove(name);
        self
    }

    /// Override the transport interface class.
    #[must_use]
    pub fn with_transport_kind(self, kind: TransportKind) -> Self {
        self.hw.lock().kind = kind;
        self
    }

    /// Override the negotiated link speed.
    #[must_use]
    pub fn with_link_speed(self, speed: LinkSpeed) -> Self {
        self.hw.lock().speed = speed;
        self
    }

    /// Queue a raw frame for delivery.
    #[must_use]
    pub fn with_frame(self, frame: RawFrame) -> Self {
        self.hw.lock().frames.push_back(frame);
        self
    }

    /// Make the hardware begin-streaming call fail.
    #[must_use]
    pub fn fail_begin_acquisition(self) -> Self {
        self.hw.lock().fail_begin = true;
        self
    }

    /// Make the hardware end-streaming call fail.
    #[must_use]
    pub fn fail_end_acquisition(self) -> Self {
        self.hw.lock().fail_end = true;
        self
    }

    /// Make session teardown fail.
    #[must_use]
    pub fn fail_teardown(self) -> Self {
        self.hw.lock().fail_teardown = true;
        self
    }

    /// Number of hardware begin-streaming calls issued so far.
    #[must_use]
    pub fn begin_calls(&self) -> u32 {
        self.hw.lock().begin_calls
    }

    /// Number of hardware end-streaming calls issued so far.
    #[must_use]
    pub fn end_calls(&self) -> u32 {
        self.hw.lock().end_calls
    }

    /// Number of session initializations issued so far.
    #[must_use]
    pub fn init_calls(&self) -> u32 {
        self.hw.lock().init_calls
    }

    /// Whether the device believes it is streaming.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.hw.lock().streaming
    }

    /// Whether the device session is initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.hw.lock().initialized
    }

    /// All node writes so far, as (node, rendered value) pairs.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String)> {
        self.hw.lock().writes.clone()
    }

    /// Whether a node was written with the given rendered value.
    #[must_use]
    pub fn wrote(&self, node: &str, value: &str) -> bool {
        self.hw
            .lock()
            .writes
            .iter()
            .any(|(written, rendered)| written == node && rendered == value)
    }
}

impl DeviceTransport for MockTransport {
    type Session = MockSession;

    fn device_count(&self) -> usize {
        self.serials.len()
    }

    fn open_first(&mut self) -> TransportResult<Self::Session> {
        match self.serials.first() {
            Some(&serial) => Ok(MockSession {
                serial,
                hw: Arc::clone(&self.hw),
            }),
            None => Err(TransportError::NoDevices),
        }
    }

    fn open_by_serial(&mut self, serial: u32) -> TransportResult<Self::Session> {
        if self.serials.contains(&serial) {
            Ok(MockSession {
                serial,
                hw: Arc::clone(&self.hw),
            })
        } else {
            Err(TransportError::SerialNotFound(serial))
        }
    }
}

/// Session on the mock device; state is shared with the owning transport.
#[derive(Debug)]
pub struct MockSession {
    serial: u32,
    hw: Arc<Mutex<Hardware>>,
}

impl CameraSession for MockSession {
    fn serial(&self) -> u32 {
        self.serial
    }

    fn transport_kind(&self) -> TransportResult<TransportKind> {
        Ok(self.hw.lock().kind)
    }

    fn link_speed(&self) -> TransportResult<LinkSpeed> {
        Ok(self.hw.lock().speed)
    }

    fn initialize(&mut self) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        hw.init_calls += 1;
        hw.initialized = true;
        Ok(())
    }

    fn teardown(&mut self) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        if hw.fail_teardown {
            return Err(TransportError::Device("deinit rejected by the device".to_owned()));
        }
        hw.initialized = false;
        hw.streaming = false;
        Ok(())
    }

    fn begin_acquisition(&mut self) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        hw.begin_calls += 1;
        if hw.fail_begin {
            return Err(TransportError::Device("begin acquisition rejected".to_owned()));
        }
        hw.streaming = true;
        Ok(())
    }

    fn end_acquisition(&mut self) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        hw.end_calls += 1;
        if hw.fail_end {
            return Err(TransportError::Device("end acquisition rejected".to_owned()));
        }
        hw.streaming = false;
        Ok(())
    }

    fn next_frame(&mut self) -> TransportResult<RawFrame> {
        let mut hw = self.hw.lock();
        if !hw.streaming {
            return Err(TransportError::Device(
                "acquisition is not running on the device".to_owned(),
            ));
        }
        hw.frames.pop_front().ok_or(TransportError::Timeout)
    }

    fn node_access(&self, node: &str) -> NodeAccess {
        self.hw
            .lock()
            .nodes
            .get(node)
            .map_or_else(NodeAccess::default, |found| found.access)
    }

    fn read_string(&self, node: &str) -> TransportResult<String> {
        let hw = self.hw.lock();
        match &hw.readable(node)?.value {
            NodeValue::Str(value) => Ok(value.clone()),
            _ => Err(TransportError::Device(format!("node \"{node}\" is not a string"))),
        }
    }

    fn read_enum(&self, node: &str) -> TransportResult<String> {
        let hw = self.hw.lock();
        match &hw.readable(node)?.value {
            NodeValue::Enum { current, .. } => Ok(current.clone()),
            _ => Err(TransportError::Device(format!(
                "node \"{node}\" is not an enumeration"
            ))),
        }
    }

    fn write_enum(&mut self, node: &str, entry: &str) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        match &mut hw.writable(node)?.value {
            NodeValue::Enum { current, entries } => {
                if !entries.iter().any(|known| known == entry) {
                    return Err(TransportError::NoSuchEntry {
                        node: node.to_owned(),
                        entry: entry.to_owned(),
                    });
                }
                *current = entry.to_owned();
            }
            _ => {
                return Err(TransportError::Device(format!(
                    "node \"{node}\" is not an enumeration"
                )))
            }
        }
        hw.log_write(node);
        Ok(())
    }

    fn enum_entries(&self, node: &str) -> TransportResult<Vec<String>> {
        let hw = self.hw.lock();
        match &hw.readable(node)?.value {
            NodeValue::Enum { entries, .. } => Ok(entries.clone()),
            _ => Err(TransportError::Device(format!(
                "node \"{node}\" is not an enumeration"
            ))),
        }
    }

    fn read_bool(&self, node: &str) -> TransportResult<bool> {
        let hw = self.hw.lock();
        match hw.readable(node)?.value {
            NodeValue::Bool(value) => Ok(value),
            _ => Err(TransportError::Device(format!("node \"{node}\" is not a boolean"))),
        }
    }

    fn write_bool(&mut self, node: &str, value: bool) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        match &mut hw.writable(node)?.value {
            NodeValue::Bool(stored) => *stored = value,
            _ => {
                return Err(TransportError::Device(format!(
                    "node \"{node}\" is not a boolean"
                )))
            }
        }
        hw.log_write(node);
        Ok(())
    }

    fn read_int(&self, node: &str) -> TransportResult<i64> {
        let hw = self.hw.lock();
        match hw.readable(node)?.value {
            NodeValue::Int(value) => Ok(value),
            _ => Err(TransportError::Device(format!("node \"{node}\" is not an integer"))),
        }
    }

    fn write_int(&mut self, node: &str, value: i64) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        match &mut hw.writable(node)?.value {
            NodeValue::Int(stored) => *stored = value,
            _ => {
                return Err(TransportError::Device(format!(
                    "node \"{node}\" is not an integer"
                )))
            }
        }
        hw.log_write(node);
        Ok(())
    }

    fn write_float(&mut self, node: &str, value: f64) -> TransportResult<()> {
        let mut hw = self.hw.lock();
        match &mut hw.writable(node)?.value {
            NodeValue::Float(stored) => *stored = value,
            _ => {
                return Err(TransportError::Device(format!("node \"{node}\" is not a float")))
            }
        }
        hw.log_write(node);
        Ok(())
    }
}

/// Complete raw frame with a deterministic byte pattern.
#[must_use]
pub fn frame(width: u32, height: u32, stride_bytes: u32, bits_per_pixel: u32) -> RawFrame {
    let len = stride_bytes as usize * height as usize;
    #[allow(clippy::cast_possible_truncation)]
    let data = (0..len).map(|i| (i % 251) as u8).collect();
    RawFrame {
        timestamp_ns: 2_000_000_123,
        width,
        height,
        stride_bytes,
        bits_per_pixel,
        complete: true,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_by_unknown_serial_fails() {
        let mut transport = MockTransport::new();
        let err = transport.open_by_serial(1).expect_err("unknown serial");
        assert!(matches!(err, TransportError::SerialNotFound(1)));
    }

    #[test]
    fn test_no_devices_transport_is_empty() {
        let mut transport = MockTransport::new().no_devices();
        assert_eq!(transport.device_count(), 0);
        let err = transport.open_first().expect_err("nothing enumerated");
        assert!(matches!(err, TransportError::NoDevices));
    }

    #[test]
    fn test_enum_write_validates_entries() {
        let mut transport = MockTransport::new();
        let mut session = transport.open_first().expect("device present");
        let err = session
            .write_enum("ExposureAuto", "Sometimes")
            .expect_err("bad entry");
        assert!(matches!(err, TransportError::NoSuchEntry { .. }));
        session
            .write_enum("ExposureAuto", "Off")
            .expect("valid entry");
        assert!(transport.wrote("ExposureAuto", "Off"));
    }

    #[test]
    fn test_frame_queue_drains_to_timeout() {
        let mut transport = MockTransport::new().with_frame(frame(8, 8, 8, 8));
        let mut session = transport.open_first().expect("device present");
        session.begin_acquisition().expect("streaming starts");
        let delivered = session.next_frame().expect("queued frame");
        assert_eq!(delivered.width, 8);
        let err = session.next_frame().expect_err("queue empty");
        assert!(matches!(err, TransportError::Timeout));
    }

    #[test]
    fn test_read_only_node_rejects_writes() {
        let mut transport = MockTransport::new();
        let mut session = transport.open_first().expect("device present");
        let err = session
            .write_int("WidthMax", 1)
            .expect_err("read-only node");
        assert!(matches!(err, TransportError::NodeNotWritable(_)));
    }
}
