//! Device-specific parameter profiles and model-family dispatch.
//!
//! Camera families expose different node sets for the same logical
//! setting, so configuration writes go through a per-family
//! [`ParameterProfile`]. Families are picked by a [`ProfileRegistry`] of
//! match-predicate/constructor pairs evaluated in registration order,
//! with a default profile as the fallback.

use tracing::{debug, warn};

use crate::config::{CameraConfig, LEVEL_RECONFIGURE_STOP};
use crate::error::{CameraError, Result};
use crate::traits::CameraSession;

/// Applies configuration requests to one camera family's node set.
pub trait ParameterProfile: Send {
    /// Short family label used in logs.
    fn family(&self) -> &'static str;

    /// Apply a configuration request at the given reconfiguration level.
    fn apply(&self, session: &mut dyn CameraSession, config: &CameraConfig, level: u32)
        -> Result<()>;

    /// Switch to manual gain at the given value in dB.
    fn set_gain(&self, session: &mut dyn CameraSession, gain_db: f64) -> Result<()>;

    /// Maximum sensor width, or 0 when the device does not report one.
    fn max_width(&self, session: &dyn CameraSession) -> u32;

    /// Maximum sensor height, or 0 when the device does not report one.
    fn max_height(&self, session: &dyn CameraSession) -> u32;
}

fn set_enum(session: &mut dyn CameraSession, node: &str, entry: &str) -> Result<()> {
    session
        .write_enum(node, entry)
        .map_err(|source| CameraError::Configuration {
            node: node.to_owned(),
            source,
        })
}

fn set_bool(session: &mut dyn CameraSession, node: &str, value: bool) -> Result<()> {
    session
        .write_bool(node, value)
        .map_err(|source| CameraError::Configuration {
            node: node.to_owned(),
            source,
        })
}

fn set_int(session: &mut dyn CameraSession, node: &str, value: i64) -> Result<()> {
    session
        .write_int(node, value)
        .map_err(|source| CameraError::Configuration {
            node: node.to_owned(),
            source,
        })
}

fn set_float(session: &mut dyn CameraSession, node: &str, value: f64) -> Result<()> {
    session
        .write_float(node, value)
        .map_err(|source| CameraError::Configuration {
            node: node.to_owned(),
            source,
        })
}

fn auto_entry(auto: bool) -> &'static str {
    if auto {
        "Continuous"
    } else {
        "Off"
    }
}

fn apply_exposure(session: &mut dyn CameraSession, config: &CameraConfig) -> Result<()> {
    set_enum(session, "ExposureAuto", auto_entry(config.auto_exposure))?;
    if !config.auto_exposure {
        set_float(session, "ExposureTime", config.exposure_time_us)?;
    }
    Ok(())
}

fn apply_gain(session: &mut dyn CameraSession, config: &CameraConfig) -> Result<()> {
    set_enum(session, "GainAuto", auto_entry(config.auto_gain))?;
    if !config.auto_gain {
        set_float(session, "Gain", config.gain_db)?;
    }
    Ok(())
}

fn apply_white_balance(session: &mut dyn CameraSession, config: &CameraConfig) -> Result<()> {
    // Mono models do not implement the node at all; skip rather than fail.
    let access = session.node_access("BalanceWhiteAuto");
    if !access.available || !access.writable {
        debug!("BalanceWhiteAuto not implemented on this model, skipping");
        return Ok(());
    }
    set_enum(session, "BalanceWhiteAuto", auto_entry(config.auto_white_balance))
}

fn sensor_max(session: &dyn CameraSession, node: &str) -> u32 {
    session
        .read_int(node)
        .ok()
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0)
}

fn apply_roi(session: &mut dyn CameraSession, config: &CameraConfig) -> Result<()> {
    let width = if config.width == 0 {
        sensor_max(session, "WidthMax")
    } else {
        config.width
    };
    let height = if config.height == 0 {
        sensor_max(session, "HeightMax")
    } else {
        config.height
    };
    set_int(session, "Width", i64::from(width))?;
    set_int(session, "Height", i64::from(height))?;
    set_int(session, "OffsetX", i64::from(config.offset_x))?;
    set_int(session, "OffsetY", i64::from(config.offset_y))
}

fn apply_manual_gain(session: &mut dyn CameraSession, gain_db: f64) -> Result<()> {
    set_enum(session, "GainAuto", "Off")?;
    set_float(session, "Gain", gain_db)
}

/// Profile for current-generation models and the fallback for unknown ones.
pub struct StandardProfile;

impl ParameterProfile for StandardProfile {
    fn family(&self) -> &'static str {
        "standard"
    }

    fn apply(
        &self,
        session: &mut dyn CameraSession,
        config: &CameraConfig,
        level: u32,
    ) -> Result<()> {
        set_bool(session, "AcquisitionFrameRateEnable", config.frame_rate_enable)?;
        if config.frame_rate_enable {
            set_float(session, "AcquisitionFrameRate", config.frame_rate)?;
        }
        apply_exposure(session, config)?;
        apply_gain(session, config)?;
        apply_white_balance(session, config)?;
        if level >= LEVEL_RECONFIGURE_STOP {
            apply_roi(session, config)?;
        }
        Ok(())
    }

    fn set_gain(&self, session: &mut dyn CameraSession, gain_db: f64) -> Result<()> {
        apply_manual_gain(session, gain_db)
    }

    fn max_width(&self, session: &dyn CameraSession) -> u32 {
        sensor_max(session, "WidthMax")
    }

    fn max_height(&self, session: &dyn CameraSession) -> u32 {
        sensor_max(session, "HeightMax")
    }
}

/// Profile for the Chameleon3 family, which gates the fixed frame rate
/// behind an auto mode and names the enable node differently.
pub struct Cm3Profile;

impl ParameterProfile for Cm3Profile {
    fn family(&self) -> &'static str {
        "chameleon3"
    }

    fn apply(
        &self,
        session: &mut dyn CameraSession,
        config: &CameraConfig,
        level: u32,
    ) -> Result<()> {
        set_enum(session, "AcquisitionFrameRateAuto", "Off")?;
        set_bool(session, "AcquisitionFrameRateEnabled", config.frame_rate_enable)?;
        if config.frame_rate_enable {
            set_float(session, "AcquisitionFrameRate", config.frame_rate)?;
        }
        apply_exposure(session, config)?;
        apply_gain(session, config)?;
        apply_white_balance(session, config)?;
        if level >= LEVEL_RECONFIGURE_STOP {
            apply_roi(session, config)?;
        }
        Ok(())
    }

    fn set_gain(&self, session: &mut dyn CameraSession, gain_db: f64) -> Result<()> {
        apply_manual_gain(session, gain_db)
    }

    fn max_width(&self, session: &dyn CameraSession) -> u32 {
        sensor_max(session, "WidthMax")
    }

    fn max_height(&self, session: &dyn CameraSession) -> u32 {
        sensor_max(session, "HeightMax")
    }
}

type ProfileCtor = fn() -> Box<dyn ParameterProfile>;
type ModelMatcher = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Ordered registry mapping model-name predicates to profile constructors.
///
/// New families are added with [`register`](Self::register) without
/// touching dispatch; the first matching predicate wins and the fallback
/// constructor covers everything else.
pub struct ProfileRegistry {
    entries: Vec<(ModelMatcher, ProfileCtor)>,
    fallback: ProfileCtor,
}

impl ProfileRegistry {
    /// Empty registry with the given fallback constructor.
    #[must_use]
    pub fn new(fallback: ProfileCtor) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    /// Registry preloaded with the known camera families.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new(|| Box::new(StandardProfile));
        registry.register_substring("Blackfly S", || Box::new(StandardProfile));
        registry.register_substring("Chameleon3", || Box::new(Cm3Profile));
        registry
    }

    /// Append a predicate/constructor pair. Earlier registrations win.
    pub fn register<M>(&mut self, matcher: M, ctor: ProfileCtor)
    where
        M: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.entries.push((Box::new(matcher), ctor));
    }

    /// Append a substring match on the reported model name.
    pub fn register_substring(&mut self, pattern: &'static str, ctor: ProfileCtor) {
        self.register(move |model| model.contains(pattern), ctor);
    }

    /// Select a profile for the reported model name, falling back (with a
    /// warning) when no registered family matches.
    #[must_use]
    pub fn select(&self, model_name: &str) -> Box<dyn ParameterProfile> {
        for (matcher, ctor) in &self.entries {
            if matcher(model_name) {
                return ctor();
            }
        }
        let profile = (self.fallback)();
        warn!(
            model = model_name,
            family = profile.family(),
            "could not detect camera model family, using fallback profile"
        );
        profile
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
