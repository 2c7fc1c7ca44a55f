//! Control preferences and steering conversion
//!
//! Persisted separately from runs in LocalStorage. Both input modes end up as
//! a screen-space offset from the player sprite, which becomes the
//! direction-plus-intensity signal the simulation consumes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::TickInput;

/// Offsets shorter than this (pixels) are ignored
pub const POINTER_DEAD_ZONE_PX: f32 = 10.0;
/// Offset (pixels) at which steering reaches full intensity
pub const POINTER_FULL_PX: f32 = 100.0;

/// How steering input is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InputMode {
    /// Mouse or touch position relative to the player
    #[default]
    Pointer,
    /// Device orientation acting as a virtual pointer
    Tilt,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Pointer => "pointer",
            InputMode::Tilt => "tilt",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pointer" | "touch" | "mouse" => Some(InputMode::Pointer),
            "tilt" | "gyro" => Some(InputMode::Tilt),
            _ => None,
        }
    }
}

/// Device attitude treated as "level"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TiltNeutral {
    /// Front-back tilt in degrees
    pub beta: f32,
    /// Left-right tilt in degrees
    pub gamma: f32,
}

/// One frame of steering
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Steering {
    /// Unit direction in maze space (+y is south), zero when idle
    pub dir: Vec2,
    /// 0..=1
    pub intensity: f32,
}

impl Steering {
    /// Copy into the per-frame simulation input
    pub fn apply(self, input: &mut TickInput) {
        input.steer = self.dir;
        input.intensity = self.intensity;
    }
}

/// Input preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub input_mode: InputMode,

    // === Tilt ===
    /// Tilt (degrees) that maps to a full-length virtual offset
    pub tilt_max_deg: f32,
    pub tilt_sensitivity: f32,
    /// Length of the virtual pointer offset at full tilt
    pub tilt_radius_px: f32,
    /// Calibrated rest attitude
    pub tilt_neutral: Option<TiltNeutral>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Pointer,
            tilt_max_deg: 25.0,
            tilt_sensitivity: 1.0,
            tilt_radius_px: 170.0,
            tilt_neutral: None,
        }
    }
}

impl ControlSettings {
    /// Pull every value back into its usable range
    pub fn sanitized(mut self) -> Self {
        let fix = |v: f32, lo: f32, hi: f32, default: f32| {
            if v.is_finite() { v.clamp(lo, hi) } else { default }
        };
        let d = Self::default();
        self.tilt_max_deg = fix(self.tilt_max_deg, 5.0, 90.0, d.tilt_max_deg);
        self.tilt_sensitivity = fix(self.tilt_sensitivity, 0.2, 3.0, d.tilt_sensitivity);
        self.tilt_radius_px = fix(self.tilt_radius_px, 60.0, 320.0, d.tilt_radius_px);
        self
    }

    /// Steering from a pointer position and the player's on-screen position
    pub fn pointer_steering(&self, pointer: Vec2, player: Vec2) -> Steering {
        offset_steering(pointer - player)
    }

    /// Steering from device orientation angles (degrees)
    pub fn tilt_steering(&self, beta: f32, gamma: f32) -> Steering {
        let neutral = self.tilt_neutral.unwrap_or_default();
        let n = Vec2::new(gamma - neutral.gamma, beta - neutral.beta) / self.tilt_max_deg
            * self.tilt_sensitivity;
        let n = n.clamp(Vec2::NEG_ONE, Vec2::ONE);
        offset_steering(n * self.tilt_radius_px)
    }

    /// Use the current attitude as level
    pub fn calibrate_tilt(&mut self, beta: f32, gamma: f32) {
        self.tilt_neutral = Some(TiltNeutral { beta, gamma });
        log::info!("Tilt calibrated at beta {beta:.1} gamma {gamma:.1}");
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "maze_chase_controls";

    /// Load controls from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str::<Self>(&json) {
                    log::info!("Loaded control settings from LocalStorage");
                    return settings.sanitized();
                }
            }
        }

        log::info!("Using default control settings");
        Self::default()
    }

    /// Save controls to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Control settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

fn offset_steering(offset: Vec2) -> Steering {
    let dist = offset.length();
    if !dist.is_finite() || dist <= POINTER_DEAD_ZONE_PX {
        return Steering::default();
    }
    Steering {
        dir: offset / dist,
        intensity: (dist / POINTER_FULL_PX).min(1.0),
    }
}
