//! Camera session lifecycle and acquisition control.
//!
//! [`Camera`] owns the connection to one physical device and gates every
//! hardware interaction behind a single exclusive lock: acquisition
//! start/stop, configuration application, and frame pulls never
//! interleave. The vendor session is not presumed safe for concurrent
//! use, so the whole session is one critical section per operation;
//! finer-grained locking is an intentional non-goal.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{CameraConfig, LEVEL_RECONFIGURE_STOP};
use crate::error::{CameraError, Result, TransportError};
use crate::frame::{fill_image, resolve_encoding, ImageBuffer};
use crate::profile::{ParameterProfile, ProfileRegistry};
use crate::traits::{CameraSession, DeviceTransport, LinkSpeed, TransportKind};

const MODEL_NAME_NODE: &str = "DeviceModelName";
const COLOR_FILTER_NODE: &str = "PixelColorFilter";
const CHUNK_MODE_NODE: &str = "ChunkModeActive";
const CHUNK_SELECTOR_NODE: &str = "ChunkSelector";
const CHUNK_ENABLE_NODE: &str = "ChunkEnable";

struct Active<S> {
    session: S,
    profile: Box<dyn ParameterProfile>,
}

struct Inner<T: DeviceTransport> {
    transport: T,
    active: Option<Active<T::Session>>,
    running: bool,
}

/// Acquisition driver for one physical camera.
///
/// The device is resolved lazily: `serial` is fixed at construction and
/// binding happens on the first `connect` (explicit or implied by a
/// configuration request). A serial of 0 binds the first enumerated
/// device.
pub struct Camera<T: DeviceTransport> {
    serial: u32,
    registry: ProfileRegistry,
    inner: Mutex<Inner<T>>,
}

impl<T: DeviceTransport> Camera<T> {
    /// Create a driver bound to `serial` (0 = first enumerated device).
    #[must_use]
    pub fn new(transport: T, serial: u32) -> Self {
        Self {
            serial,
            registry: ProfileRegistry::builtin(),
            inner: Mutex::new(Inner {
                transport,
                active: None,
                running: false,
            }),
        }
    }

    /// Replace the model-family registry. Takes effect on the next connect.
    #[must_use]
    pub fn with_registry(mut self, registry: ProfileRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Serial this driver binds to (0 = first enumerated device).
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Whether a session is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    /// Whether acquisition is logically running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Open a session on the target device. Idempotent.
    ///
    /// Resolves the device by serial (or takes the first one), checks the
    /// negotiated link speed on USB3 Vision transports, initializes the
    /// session, and selects a parameter profile from the reported model
    /// name. A degraded link only warns; streaming still proceeds.
    pub fn connect(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        self.connect_locked(&mut inner)
    }

    fn connect_locked(&self, inner: &mut Inner<T>) -> Result<()> {
        if inner.active.is_some() {
            return Ok(());
        }

        info!(
            devices = inner.transport.device_count(),
            serial = self.serial,
            "resolving camera"
        );
        let resolved = if self.serial == 0 {
            inner.transport.open_first()
        } else {
            inner.transport.open_by_serial(self.serial)
        };
        let mut session = resolved.map_err(|source| CameraError::DeviceResolution {
            serial: self.serial,
            source,
        })?;

        // Advisory only: a degraded link still streams, just slower.
        // Non-USB3 transports are left unchecked.
        if let Ok(TransportKind::Usb3Vision) = session.transport_kind() {
            match session.link_speed() {
                Ok(LinkSpeed::SuperSpeed) | Err(_) => {}
                Ok(speed) => warn!(
                    ?speed,
                    "USB3 Vision device is not running at SuperSpeed, check cables"
                ),
            }
        }

        session
            .initialize()
            .map_err(|source| CameraError::Connect { source })?;
        let model = session
            .read_string(MODEL_NAME_NODE)
            .map_err(|source| CameraError::Connect { source })?;
        let profile = self.registry.select(&model);
        info!(model = %model, family = profile.family(), "connected to camera");

        inner.active = Some(Active { session, profile });
        Ok(())
    }

    /// Close the session, forcing the logical state to stopped first.
    ///
    /// The in-memory handle is cleared even when the hardware teardown
    /// fails, so a dead device cannot wedge the driver.
    pub fn disconnect(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.running = false;
        if let Some(mut active) = inner.active.take() {
            active
                .session
                .teardown()
                .map_err(|source| CameraError::Disconnect { source })?;
        }
        Ok(())
    }

    /// Begin streaming. No-op unless connected and currently stopped.
    ///
    /// The running flag flips only after the hardware call succeeds.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::start_locked(&mut inner)
    }

    fn start_locked(inner: &mut Inner<T>) -> Result<()> {
        if inner.running {
            return Ok(());
        }
        if let Some(active) = inner.active.as_mut() {
            active
                .session
                .begin_acquisition()
                .map_err(|source| CameraError::AcquisitionStart { source })?;
            inner.running = true;
        }
        Ok(())
    }

    /// End streaming. No-op unless connected and currently running.
    ///
    /// The running flag flips before the hardware call: a failing stop
    /// must not leave the controller convinced it is still streaming.
    pub fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::stop_locked(&mut inner)
    }

    fn stop_locked(inner: &mut Inner<T>) -> Result<()> {
        if !inner.running {
            return Ok(());
        }
        if let Some(active) = inner.active.as_mut() {
            inner.running = false;
            active
                .session
                .end_acquisition()
                .map_err(|source| CameraError::AcquisitionStop { source })?;
        }
        Ok(())
    }

    /// Apply a configuration request, connecting first if needed.
    ///
    /// At or above [`LEVEL_RECONFIGURE_STOP`] the driver cycles
    /// acquisition before applying: some settings only latch once
    /// acquisition has run since the connect, so it starts and stops
    /// unconditionally, applies the configuration, and restarts only if
    /// streaming was active when the request arrived. Apply failures
    /// propagate as-is; the bracketing is not rolled back, so acquisition
    /// can end up stopped when a disruptive apply fails.
    pub fn set_new_configuration(&self, config: &CameraConfig, level: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        self.connect_locked(&mut inner)?;

        if level >= LEVEL_RECONFIGURE_STOP {
            let was_running = inner.running;
            debug!(level, was_running, "disruptive reconfiguration, cycling acquisition");
            Self::start_locked(&mut inner)?;
            Self::stop_locked(&mut inner)?;
            Self::apply_locked(&mut inner, config, level)?;
            if was_running {
                Self::start_locked(&mut inner)?;
            }
        } else {
            debug!(level, "applying configuration in place");
            Self::apply_locked(&mut inner, config, level)?;
        }
        Ok(())
    }

    fn apply_locked(inner: &mut Inner<T>, config: &CameraConfig, level: u32) -> Result<()> {
        let active = inner.active.as_mut().ok_or(CameraError::NotConnected)?;
        active.profile.apply(&mut active.session, config, level)
    }

    /// Switch the device to manual gain at `gain_db`.
    pub fn set_gain(&self, gain_db: f64) -> Result<()> {
        let mut inner = self.inner.lock();
        let active = inner.active.as_mut().ok_or(CameraError::NotConnected)?;
        active.profile.set_gain(&mut active.session, gain_db)
    }

    /// Maximum sensor width, or 0 when disconnected or unreported.
    #[must_use]
    pub fn max_width(&self) -> u32 {
        let inner = self.inner.lock();
        inner
            .active
            .as_ref()
            .map_or(0, |active| active.profile.max_width(&active.session))
    }

    /// Maximum sensor height, or 0 when disconnected or unreported.
    #[must_use]
    pub fn max_height(&self) -> u32 {
        let inner = self.inner.lock();
        inner
            .active
            .as_ref()
            .map_or(0, |active| active.profile.max_height(&active.session))
    }

    /// Pull one frame and decode it into `image`.
    ///
    /// Requires a connected, running camera: connected-but-stopped fails
    /// with the routine [`CameraError::NotRunning`] so a caller may poll
    /// before streaming starts. The color-filter node is read on every
    /// grab because reconfiguration can change it. On any failure the
    /// caller's `image` is left untouched.
    pub fn grab_frame(&self, frame_id: &str, image: &mut ImageBuffer) -> Result<()> {
        let mut inner = self.inner.lock();
        let running = inner.running;
        let Some(active) = inner.active.as_mut() else {
            return Err(CameraError::NotConnected);
        };
        if !running {
            return Err(CameraError::NotRunning);
        }

        let raw = active
            .session
            .next_frame()
            .map_err(|source| CameraError::FrameRetrieval { source })?;
        if !raw.complete {
            return Err(CameraError::IncompleteFrame {
                serial: active.session.serial(),
            });
        }

        let color_filter = active
            .session
            .read_enum(COLOR_FILTER_NODE)
            .map_err(|source| CameraError::FrameRetrieval { source })?;
        let encoding = resolve_encoding(&color_filter, raw.bits_per_pixel)?;
        fill_image(image, &raw, encoding, frame_id)
    }

    /// Enable every chunk-metadata field the device offers. Idempotent.
    ///
    /// Fails only when the chunk mode toggle cannot be driven or the
    /// selector cannot be read; individual fields that are unavailable,
    /// already enabled, or not writable are skipped. Not part of the
    /// normal connect flow.
    pub fn configure_chunk_data(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let active = inner.active.as_mut().ok_or(CameraError::NotConnected)?;
        enable_all_chunks(&mut active.session)
    }
}

fn enable_all_chunks(session: &mut dyn CameraSession) -> Result<()> {
    let mode = session.node_access(CHUNK_MODE_NODE);
    if !mode.available || !mode.writable {
        return Err(CameraError::MetadataConfig {
            source: TransportError::NodeNotWritable(CHUNK_MODE_NODE.to_owned()),
        });
    }
    session
        .write_bool(CHUNK_MODE_NODE, true)
        .map_err(|source| CameraError::MetadataConfig { source })?;

    let selector = session.node_access(CHUNK_SELECTOR_NODE);
    if !selector.available || !selector.readable {
        return Err(CameraError::MetadataConfig {
            source: TransportError::NodeNotReadable(CHUNK_SELECTOR_NODE.to_owned()),
        });
    }
    let entries = session
        .enum_entries(CHUNK_SELECTOR_NODE)
        .map_err(|source| CameraError::MetadataConfig { source })?;

    for entry in entries {
        if session.write_enum(CHUNK_SELECTOR_NODE, &entry).is_err() {
            debug!(field = %entry, "chunk field unavailable, skipping");
            continue;
        }
        let enable = session.node_access(CHUNK_ENABLE_NODE);
        if !enable.available {
            debug!(field = %entry, "chunk enable node unavailable, skipping");
            continue;
        }
        if session.read_bool(CHUNK_ENABLE_NODE).unwrap_or(false) {
            debug!(field = %entry, "chunk field already enabled");
            continue;
        }
        if !enable.writable {
            debug!(field = %entry, "chunk enable node not writable, skipping");
            continue;
        }
        match session.write_bool(CHUNK_ENABLE_NODE, true) {
            Ok(()) => debug!(field = %entry, "chunk field enabled"),
            Err(source) => debug!(field = %entry, %source, "chunk field rejected the enable"),
        }
    }
    Ok(())
}
