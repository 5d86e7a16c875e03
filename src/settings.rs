//! User preferences
//!
//! Persisted separately from game progression in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_SEGMENTS, DEFAULT_MAX_SENTENCE, DEFAULT_TILE_HEIGHT};

/// Which fractal backend the user asked for.
///
/// The GPU path is the default; when the adapter cannot be initialized the
/// effective backend silently falls back to the CPU tile renderer. That
/// fallback is the only user-visible failure mode in the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenderBackend {
    #[default]
    Gpu,
    Cpu,
}

impl RenderBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderBackend::Gpu => "gpu",
            RenderBackend::Cpu => "cpu",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gpu" | "webgpu" => Some(RenderBackend::Gpu),
            "cpu" | "tiles" => Some(RenderBackend::Cpu),
            _ => None,
        }
    }

    /// Resolve the requested backend against what the platform offers.
    pub fn effective(&self, gpu_available: bool) -> Self {
        match self {
            RenderBackend::Gpu if !gpu_available => RenderBackend::Cpu,
            other => *other,
        }
    }

    /// The other backend, for the user-facing toggle.
    pub fn toggled(self) -> Self {
        match self {
            RenderBackend::Gpu => RenderBackend::Cpu,
            RenderBackend::Cpu => RenderBackend::Gpu,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Requested fractal backend (may be downgraded at runtime)
    pub backend: RenderBackend,
    /// CPU render strip height in pixels
    pub tile_height: u32,
    /// Branch segment cap per growth pass
    pub max_segments: usize,
    /// Rewritten sentence length cap
    pub max_sentence_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: RenderBackend::Gpu,
            tile_height: DEFAULT_TILE_HEIGHT,
            max_segments: DEFAULT_MAX_SEGMENTS,
            max_sentence_length: DEFAULT_MAX_SENTENCE,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "fractal_grove_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_fallback() {
        assert_eq!(RenderBackend::Gpu.effective(true), RenderBackend::Gpu);
        assert_eq!(RenderBackend::Gpu.effective(false), RenderBackend::Cpu);
        // An explicit CPU choice never upgrades on its own
        assert_eq!(RenderBackend::Cpu.effective(true), RenderBackend::Cpu);
    }

    #[test]
    fn test_backend_toggle_flips_and_persists() {
        assert_eq!(RenderBackend::Gpu.toggled(), RenderBackend::Cpu);
        assert_eq!(RenderBackend::Cpu.toggled(), RenderBackend::Gpu);

        // The toggled choice survives the settings round trip
        let settings = Settings {
            backend: Settings::default().backend.toggled(),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend, RenderBackend::Cpu);
    }

    #[test]
    fn test_backend_round_trip() {
        for backend in [RenderBackend::Gpu, RenderBackend::Cpu] {
            assert_eq!(RenderBackend::from_str(backend.as_str()), Some(backend));
        }
        assert_eq!(RenderBackend::from_str("vulkan"), None);
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = Settings {
            backend: RenderBackend::Cpu,
            tile_height: 16,
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
