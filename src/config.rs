//! Simulation configuration
//!
//! Every tunable constant of the simulation lives in [`SimConfig`]. Defaults
//! reproduce the stock look; files may override any subset of fields.
//! Configs are read from YAML (`.yaml`, `.yml`) or JSON (`.json`) based on the
//! file extension.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spatial::DEFAULT_CELL_SIZE;
use crate::viewport::{Viewport, ZoneConfig};

/// Errors that can occur while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file format is not supported
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine config format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML could not be parsed or produced
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value the simulation cannot run with
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub viewport: Viewport,
    pub zone: ZoneConfig,
    pub scene: SceneConfig,
    pub grid: GridConfig,
    pub forces: ForceConfig,
    pub integrator: IntegratorConfig,
}

/// Parameters for one-time scene generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Number of cluster seeds
    pub cluster_count: usize,
    /// Number of nodes
    pub node_count: usize,
    /// Probability that a node is placed around a cluster seed
    pub clustered_probability: f32,
    /// Smallest cluster spread radius
    pub cluster_spread_min: f32,
    /// Largest cluster spread radius
    pub cluster_spread_max: f32,
    /// Distance from the viewport border inside which seeds are placed
    pub cluster_inset: f32,
    /// Exclusion-zone padding applied when placing cluster seeds
    pub cluster_zone_padding: f32,
    /// Exclusion-zone padding applied when placing unclustered nodes
    pub scatter_zone_padding: f32,
    /// Full width of the per-channel colour jitter
    pub color_jitter: f32,
    /// Base distance under which an edge may be created
    pub edge_base_threshold: f32,
    /// Extra edge distance allowed per unit of source radius
    pub edge_radius_factor: f32,
    /// Rest length is the seeded distance times a factor in this range
    pub rest_length_factor_min: f32,
    pub rest_length_factor_max: f32,
    /// Range of spring stiffness
    pub stiffness_min: f32,
    pub stiffness_max: f32,
    /// Rejection-sampling budget per placement before giving up
    pub max_placement_attempts: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cluster_count: 20,
            node_count: 600,
            clustered_probability: 0.7,
            cluster_spread_min: 40.0,
            cluster_spread_max: 150.0,
            cluster_inset: 100.0,
            cluster_zone_padding: 90.0,
            scatter_zone_padding: 50.0,
            color_jitter: 30.0,
            edge_base_threshold: 120.0,
            edge_radius_factor: 3.0,
            rest_length_factor_min: 0.8,
            rest_length_factor_max: 1.2,
            stiffness_min: 0.0002,
            stiffness_max: 0.0005,
            max_placement_attempts: 10_000,
        }
    }
}

/// Spatial index parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

/// Switches for each force; disabled forces contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnabledForces {
    pub springs: bool,
    pub repulsion: bool,
    pub flow: bool,
    pub pointer: bool,
    pub exclusion: bool,
    pub centering: bool,
}

impl EnabledForces {
    pub const fn all() -> Self {
        Self {
            springs: true,
            repulsion: true,
            flow: true,
            pointer: true,
            exclusion: true,
            centering: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            springs: false,
            repulsion: false,
            flow: false,
            pointer: false,
            exclusion: false,
            centering: false,
        }
    }
}

impl Default for EnabledForces {
    fn default() -> Self {
        Self::all()
    }
}

/// Ambient flow field shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowConfig {
    /// Spatial frequency
    pub scale: f32,
    /// Temporal frequency (per frame)
    pub time_scale: f32,
    /// Peak velocity delta per frame
    pub strength: f32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            scale: 0.003,
            time_scale: 0.0004,
            strength: 0.012,
        }
    }
}

/// Force engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForceConfig {
    pub enabled: EnabledForces,
    /// Spring deltas are divided by `1 + mass * spring_mass_factor`
    pub spring_mass_factor: f32,
    /// Minimum separation is `(r_a + r_b) * repulsion_radius_scale + repulsion_padding`
    pub repulsion_radius_scale: f32,
    pub repulsion_padding: f32,
    /// Repulsion at full overlap
    pub repulsion_strength: f32,
    pub flow: FlowConfig,
    /// Pointer influence radius
    pub pointer_radius: f32,
    /// Pointer push at zero distance
    pub pointer_strength: f32,
    /// Padding added around the exclusion zone at runtime
    pub exclusion_padding: f32,
    /// Fixed magnitude of the exclusion push
    pub exclusion_strength: f32,
    /// Pull toward the viewport centre per unit of displacement
    pub centering_strength: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            enabled: EnabledForces::all(),
            spring_mass_factor: 0.01,
            repulsion_radius_scale: 1.8,
            repulsion_padding: 8.0,
            repulsion_strength: 0.15,
            flow: FlowConfig::default(),
            pointer_radius: 160.0,
            pointer_strength: 0.6,
            exclusion_padding: 25.0,
            exclusion_strength: 0.2,
            centering_strength: 0.00003,
        }
    }
}

/// Integration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegratorConfig {
    /// Velocity multiplier applied once per frame
    pub damping: f32,
    /// Distance past the viewport edge before a node wraps around
    pub wrap_margin: f32,
    /// Speed clamp applied after damping
    pub max_speed: f32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            damping: 0.95,
            wrap_margin: 40.0,
            max_speed: 25.0,
        }
    }
}

impl SimConfig {
    /// Load a configuration file, dispatching on its extension
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnknownExtension(path.display().to_string()))?;

        let text = std::fs::read_to_string(path)?;
        let config = Self::parse(&text, ext)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text in the given format (`yaml`, `yml` or `json`)
    pub fn parse(text: &str, format: &str) -> ConfigResult<Self> {
        match format.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(serde_yaml::from_str(text)?),
            "json" => Ok(serde_json::from_str(text)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Render the configuration as YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> ConfigResult<()> {
        positive("viewport.width", self.viewport.width)?;
        positive("viewport.height", self.viewport.height)?;
        non_negative("zone.half_width_fraction", self.zone.half_width_fraction)?;
        non_negative("zone.half_height_fraction", self.zone.half_height_fraction)?;

        let scene = &self.scene;
        probability("scene.clustered_probability", scene.clustered_probability)?;
        non_negative("scene.cluster_spread_min", scene.cluster_spread_min)?;
        ordered(
            "scene.cluster_spread_max",
            scene.cluster_spread_min,
            scene.cluster_spread_max,
        )?;
        non_negative("scene.cluster_inset", scene.cluster_inset)?;
        non_negative("scene.cluster_zone_padding", scene.cluster_zone_padding)?;
        non_negative("scene.scatter_zone_padding", scene.scatter_zone_padding)?;
        non_negative("scene.color_jitter", scene.color_jitter)?;
        non_negative("scene.edge_base_threshold", scene.edge_base_threshold)?;
        non_negative("scene.edge_radius_factor", scene.edge_radius_factor)?;
        positive("scene.rest_length_factor_min", scene.rest_length_factor_min)?;
        ordered(
            "scene.rest_length_factor_max",
            scene.rest_length_factor_min,
            scene.rest_length_factor_max,
        )?;
        positive("scene.stiffness_min", scene.stiffness_min)?;
        ordered(
            "scene.stiffness_max",
            scene.stiffness_min,
            scene.stiffness_max,
        )?;
        if scene.max_placement_attempts == 0 {
            return Err(invalid("scene.max_placement_attempts", "must be at least 1"));
        }

        positive("grid.cell_size", self.grid.cell_size)?;

        let forces = &self.forces;
        non_negative("forces.spring_mass_factor", forces.spring_mass_factor)?;
        non_negative("forces.repulsion_radius_scale", forces.repulsion_radius_scale)?;
        non_negative("forces.repulsion_padding", forces.repulsion_padding)?;
        non_negative("forces.repulsion_strength", forces.repulsion_strength)?;
        finite("forces.flow.scale", forces.flow.scale)?;
        finite("forces.flow.time_scale", forces.flow.time_scale)?;
        non_negative("forces.flow.strength", forces.flow.strength)?;
        non_negative("forces.pointer_radius", forces.pointer_radius)?;
        non_negative("forces.pointer_strength", forces.pointer_strength)?;
        non_negative("forces.exclusion_padding", forces.exclusion_padding)?;
        non_negative("forces.exclusion_strength", forces.exclusion_strength)?;
        non_negative("forces.centering_strength", forces.centering_strength)?;

        let integrator = &self.integrator;
        positive("integrator.damping", integrator.damping)?;
        if integrator.damping > 1.0 {
            return Err(invalid("integrator.damping", "must not exceed 1"));
        }
        non_negative("integrator.wrap_margin", integrator.wrap_margin)?;
        positive("integrator.max_speed", integrator.max_speed)?;

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not finite")))
    }
}

fn positive(field: &'static str, value: f32) -> ConfigResult<()> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be positive")))
    }
}

fn non_negative(field: &'static str, value: f32) -> ConfigResult<()> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must not be negative")))
    }
}

fn probability(field: &'static str, value: f32) -> ConfigResult<()> {
    finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> ConfigResult<()> {
    finite(field, max)?;
    if max >= min {
        Ok(())
    } else {
        Err(invalid(field, format!("{max} is below the minimum {min}")))
    }
}
