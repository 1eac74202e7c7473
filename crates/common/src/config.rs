//! Ball pit configuration.
//!
//! Every section has sensible defaults, so a YAML file only needs the keys it
//! wants to override. Hosts apply CLI overrides on top and call
//! [`PitConfig::validate`] before handing the config to the frame driver.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::GridDims;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("grid dimensions must be at least 1x1x1, got {0:?}")]
    EmptyGrid(GridDims),
    #[error("invalid range for {field}: min ({min}) > max ({max})")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },
}

/// Top-level configuration for one ball pit session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitConfig {
    pub grid: GridDims,
    pub spawn: SpawnConfig,
    pub physics: PhysicsConfig,
    pub highlight: HighlightConfig,
    pub drag: DragConfig,
    pub camera: CameraConfig,
    pub bloom: BloomConfig,
    pub assets: AssetConfig,
    /// Seed for spawn randomness. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl PitConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&data)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.is_empty() {
            return Err(ConfigError::EmptyGrid(self.grid));
        }
        for (field, value) in self.float_fields() {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if self.spawn.scale_min > self.spawn.scale_max {
            return Err(ConfigError::InvalidRange {
                field: "spawn.scale",
                min: self.spawn.scale_min,
                max: self.spawn.scale_max,
            });
        }
        for (field, value) in [
            ("spawn.spacing", self.spawn.spacing),
            ("spawn.base_radius", self.spawn.base_radius),
            ("spawn.scale_min", self.spawn.scale_min),
            ("spawn.mass_per_scale", self.spawn.mass_per_scale),
            ("physics.fixed_timestep", self.physics.fixed_timestep),
            ("camera.reference_distance", self.camera.reference_distance),
            ("camera.fov_degrees", self.camera.fov_degrees),
            ("drag.min_distance", self.drag.min_distance),
            ("drag.reference_view_height", self.drag.reference_view_height),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("spawn.jitter", self.spawn.jitter),
            ("spawn.bounds_padding", self.spawn.bounds_padding),
            ("physics.linear_damping", self.physics.linear_damping),
            ("physics.angular_damping", self.physics.angular_damping),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }

    fn float_fields(&self) -> [(&'static str, f32); 30] {
        let (spawn, physics, drag, camera, bloom) = (
            &self.spawn,
            &self.physics,
            &self.drag,
            &self.camera,
            &self.bloom,
        );
        [
            ("spawn.spacing", spawn.spacing),
            ("spawn.jitter", spawn.jitter),
            ("spawn.base_radius", spawn.base_radius),
            ("spawn.scale_min", spawn.scale_min),
            ("spawn.scale_max", spawn.scale_max),
            ("spawn.mass_per_scale", spawn.mass_per_scale),
            ("spawn.friction", spawn.friction),
            ("spawn.restitution", spawn.restitution),
            ("spawn.bounds_padding", spawn.bounds_padding),
            ("physics.gravity.x", physics.gravity.x),
            ("physics.gravity.y", physics.gravity.y),
            ("physics.gravity.z", physics.gravity.z),
            ("physics.fixed_timestep", physics.fixed_timestep),
            ("physics.default_contact.friction", physics.default_contact.friction),
            ("physics.default_contact.restitution", physics.default_contact.restitution),
            ("physics.linear_damping", physics.linear_damping),
            ("physics.angular_damping", physics.angular_damping),
            ("highlight.peak_intensity", self.highlight.peak_intensity),
            ("drag.strength", drag.strength),
            ("drag.max_distance", drag.max_distance),
            ("drag.min_distance", drag.min_distance),
            ("drag.min_upward_bias", drag.min_upward_bias),
            ("drag.reference_view_height", drag.reference_view_height),
            ("camera.fov_degrees", camera.fov_degrees),
            ("camera.reference_distance", camera.reference_distance),
            ("camera.near", camera.near),
            ("camera.far", camera.far),
            ("bloom.strength", bloom.strength),
            ("bloom.radius", bloom.radius),
            ("bloom.threshold", bloom.threshold),
        ]
    }
}

/// Grid layout and per-sphere randomization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Distance between neighbouring cell centers.
    pub spacing: f32,
    /// Maximum per-axis offset from the cell center.
    pub jitter: f32,
    /// Radius of a sphere at scale 1.0.
    pub base_radius: f32,
    pub scale_min: f32,
    pub scale_max: f32,
    /// Body mass is `mass_per_scale * scale`.
    pub mass_per_scale: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Free space between the outermost cells and the container walls.
    pub bounds_padding: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            spacing: 2.0,
            jitter: 0.1,
            base_radius: 1.0,
            scale_min: 0.5,
            scale_max: 0.9,
            mass_per_scale: 1.0,
            friction: 0.3,
            restitution: 0.5,
            bounds_padding: 2.0,
        }
    }
}

/// Friction/restitution pair used when resolving a contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.4,
        }
    }
}

/// Rigid-body world parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    pub solver_iterations: u32,
    /// Nominal simulation step in seconds.
    pub fixed_timestep: f32,
    /// Upper bound on catch-up substeps per frame.
    pub max_substeps: u32,
    pub default_contact: ContactMaterial,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            solver_iterations: 10,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 3,
            default_contact: ContactMaterial::default(),
            linear_damping: 0.01,
            angular_damping: 0.01,
        }
    }
}

/// Hover glow animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub duration_ms: u64,
    /// Emissive intensity reached at the end of the fade-in.
    pub peak_intensity: f32,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            peak_intensity: 2.0,
        }
    }
}

impl HighlightConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Drag impulse heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Impulse magnitude at unit distance and unit force scale.
    pub strength: f32,
    /// Only bodies closer than this to the camera are pushed.
    pub max_distance: f32,
    /// Distances below this are clamped before the inverse-square falloff.
    pub min_distance: f32,
    /// Floor for the y component of the push direction.
    pub min_upward_bias: f32,
    /// Visible view height that maps to a force scale of 1.0.
    pub reference_view_height: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            strength: 40.0,
            max_distance: 30.0,
            min_distance: 1.0,
            min_upward_bias: 0.2,
            reference_view_height: 12.0,
        }
    }
}

/// Camera framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    /// Distance at aspect >= 1; narrower viewports back the camera off.
    pub reference_distance: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            reference_distance: 15.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

/// Selective glow post-process parameters, live-tunable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    /// 0..=3
    pub strength: f32,
    /// 0..=1
    pub radius: f32,
    /// 0..=1
    pub threshold: f32,
    pub enabled: bool,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 1.5,
            radius: 0.4,
            threshold: 0.1,
            enabled: true,
        }
    }
}

impl BloomConfig {
    pub const STRENGTH_MAX: f32 = 3.0;

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength.clamp(0.0, Self::STRENGTH_MAX);
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.clamp(0.0, 1.0);
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    /// Copy of this config with every parameter forced into its valid range.
    pub fn clamped(mut self) -> Self {
        self.set_strength(self.strength);
        self.set_radius(self.radius);
        self.set_threshold(self.threshold);
        self
    }
}

/// Asset locations and load policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub environment_map: PathBuf,
    /// Give up on the environment map after this long and fall back to flat
    /// lighting. `None` waits forever.
    pub load_timeout_ms: Option<u64>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            environment_map: PathBuf::from("assets/environment.hdr"),
            load_timeout_ms: Some(10_000),
        }
    }
}

impl AssetConfig {
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PitConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = PitConfig::from_yaml_str(
            "grid:\n  width: 2\n  height: 3\n  depth: 1\nbloom:\n  enabled: false\n",
        )
        .unwrap();
        assert_eq!(config.grid, GridDims::new(2, 3, 1));
        assert!(!config.bloom.enabled);
        assert_eq!(config.bloom.strength, BloomConfig::default().strength);
        assert_eq!(config.physics, PhysicsConfig::default());
    }

    #[test]
    fn empty_grid_rejected() {
        let err = PitConfig::from_yaml_str("grid:\n  width: 0\n  height: 1\n  depth: 1\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyGrid(_)));
    }

    #[test]
    fn inverted_scale_range_rejected() {
        let mut config = PitConfig::default();
        config.spawn.scale_min = 2.0;
        config.spawn.scale_max = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { .. })
        ));
    }

    #[test]
    fn infinite_jitter_rejected() {
        let err = PitConfig::from_yaml_str("spawn:\n  jitter: .inf\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonFinite {
                field: "spawn.jitter",
                ..
            }
        ));
    }

    #[test]
    fn nan_scale_rejected() {
        let err = PitConfig::from_yaml_str("spawn:\n  scale_max: .nan\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonFinite {
                field: "spawn.scale_max",
                ..
            }
        ));
    }

    #[test]
    fn non_finite_gravity_and_bloom_rejected() {
        let mut config = PitConfig::default();
        config.physics.gravity.y = f32::NEG_INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::NonFinite { .. })));

        let mut config = PitConfig::default();
        config.bloom.strength = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::NonFinite { .. })));
    }

    #[test]
    fn negative_jitter_and_padding_rejected() {
        let mut config = PitConfig::default();
        config.spawn.jitter = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "spawn.jitter",
                ..
            })
        ));

        let mut config = PitConfig::default();
        config.spawn.bounds_padding = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "spawn.bounds_padding",
                ..
            })
        ));
    }

    #[test]
    fn zero_jitter_accepted() {
        let mut config = PitConfig::default();
        config.spawn.jitter = 0.0;
        config.spawn.bounds_padding = 0.0;
        config.validate().unwrap();
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let mut config = PitConfig::default();
        config.seed = Some(9);
        config.grid = GridDims::new(4, 2, 3);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), config.to_yaml().unwrap()).unwrap();
        let loaded = PitConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn bloom_setters_clamp() {
        let mut bloom = BloomConfig::default();
        bloom.set_strength(7.0);
        bloom.set_radius(-1.0);
        bloom.set_threshold(1.5);
        assert_eq!(bloom.strength, 3.0);
        assert_eq!(bloom.radius, 0.0);
        assert_eq!(bloom.threshold, 1.0);
    }

    #[test]
    fn highlight_duration_from_millis() {
        assert_eq!(
            HighlightConfig::default().duration(),
            Duration::from_millis(1000)
        );
    }
}
