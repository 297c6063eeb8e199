//! Configuration types for mxmend processing.
//!
//! This module provides configuration structures that control calibration
//! and repair. All types implement [`serde::Deserialize`] for loading from
//! external sources; every field is optional and falls back to its default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining calibration and repair settings.
//! - [`CalibrationConfig`] - Grid, row and spacing parameters for layout calibration.
//! - [`ConnectorConfig`] - Stroke settings applied to every connector.
//! - [`RepairConfig`] - Model runtime and retry bound for model-assisted repair.
//!
//! # Example
//!
//! ```
//! # use mxmend::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert_eq!(config.calibration().grid_size(), 8.0);
//! assert_eq!(config.repair().max_attempts(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Default grid size used when none is configured or the configured one is unusable.
pub const DEFAULT_GRID_SIZE: f64 = 8.0;

/// Top-level application configuration combining calibration and repair settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Calibration configuration section.
    #[serde(default)]
    calibration: CalibrationConfig,

    /// Repair configuration section.
    #[serde(default)]
    repair: RepairConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    ///
    /// # Arguments
    ///
    /// * `calibration` - Layout calibration parameters.
    /// * `repair` - Model-assisted repair settings.
    pub fn new(calibration: CalibrationConfig, repair: RepairConfig) -> Self {
        Self {
            calibration,
            repair,
        }
    }

    /// Returns the calibration configuration.
    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    /// Returns the repair configuration.
    pub fn repair(&self) -> &RepairConfig {
        &self.repair
    }
}

/// Parameters of the calibration pass.
///
/// Each field is also accepted under its camelCase wire name, so
/// `gridSize = 10` and `grid_size = 10` are equivalent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Grid that vertex positions snap to.
    #[serde(alias = "gridSize")]
    grid_size: f64,

    /// Largest distance between a vertex's `y` and a row's running average
    /// for the vertex to join that row.
    #[serde(alias = "rowTolerance")]
    row_tolerance: f64,

    /// Minimum space between neighbours in a row.
    #[serde(alias = "horizontalGap")]
    horizontal_gap: f64,

    /// Minimum space between the tallest member of a row and the next row.
    #[serde(alias = "verticalGap")]
    vertical_gap: f64,

    /// Smallest `x` and `y` of the first row and the first column.
    #[serde(alias = "rowPadding")]
    row_padding: f64,

    /// Connector stroke settings.
    connector: ConnectorConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            row_tolerance: 18.0,
            horizontal_gap: 40.0,
            vertical_gap: 36.0,
            row_padding: 32.0,
            connector: ConnectorConfig::default(),
        }
    }
}

impl CalibrationConfig {
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_row_tolerance(mut self, row_tolerance: f64) -> Self {
        self.row_tolerance = row_tolerance;
        self
    }

    pub fn with_horizontal_gap(mut self, horizontal_gap: f64) -> Self {
        self.horizontal_gap = horizontal_gap;
        self
    }

    pub fn with_vertical_gap(mut self, vertical_gap: f64) -> Self {
        self.vertical_gap = vertical_gap;
        self
    }

    pub fn with_row_padding(mut self, row_padding: f64) -> Self {
        self.row_padding = row_padding;
        self
    }

    pub fn with_connector(mut self, connector: ConnectorConfig) -> Self {
        self.connector = connector;
        self
    }

    /// Returns the configured grid size, which may be unusable.
    ///
    /// Calibration falls back to [`DEFAULT_GRID_SIZE`] for non-finite or
    /// non-positive values.
    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn row_tolerance(&self) -> f64 {
        self.row_tolerance
    }

    pub fn horizontal_gap(&self) -> f64 {
        self.horizontal_gap
    }

    pub fn vertical_gap(&self) -> f64 {
        self.vertical_gap
    }

    pub fn row_padding(&self) -> f64 {
        self.row_padding
    }

    pub fn connector(&self) -> &ConnectorConfig {
        &self.connector
    }
}

/// Stroke applied to connectors during calibration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Stroke color, as written into the `strokeColor` style key.
    #[serde(alias = "strokeColor")]
    stroke_color: String,

    /// Stroke width, as written into the `strokeWidth` style key.
    #[serde(alias = "strokeWidth")]
    stroke_width: f64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            stroke_color: "#4D4D4D".to_string(),
            stroke_width: 1.5,
        }
    }
}

impl ConnectorConfig {
    pub fn new(stroke_color: impl Into<String>, stroke_width: f64) -> Self {
        Self {
            stroke_color: stroke_color.into(),
            stroke_width,
        }
    }

    pub fn stroke_color(&self) -> &str {
        &self.stroke_color
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }
}

/// Settings for model-assisted repair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Runtime descriptor sent with every repair request.
    runtime: ModelRuntime,

    /// Most model round-trips one repair may take.
    #[serde(alias = "maxAttempts")]
    max_attempts: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            runtime: ModelRuntime::default(),
            max_attempts: 2,
        }
    }
}

impl RepairConfig {
    pub fn new(runtime: ModelRuntime, max_attempts: usize) -> Self {
        Self {
            runtime,
            max_attempts,
        }
    }

    pub fn runtime(&self) -> &ModelRuntime {
        &self.runtime
    }

    /// Returns the attempt bound, never less than one.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts.max(1)
    }
}

/// Describes which model the invocation layer should use for a repair.
///
/// mxmend never calls a model itself; the descriptor is handed to the
/// [`RepairModel`](crate::repair::RepairModel) implementation as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelRuntime {
    provider: String,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "max_output_tokens")]
    max_output_tokens: Option<u32>,
}

impl Default for ModelRuntime {
    fn default() -> Self {
        Self {
            provider: "default".to_string(),
            model: "default".to_string(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl ModelRuntime {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }
}
