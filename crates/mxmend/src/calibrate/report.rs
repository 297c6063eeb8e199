//! The calibration report.

use std::time::Duration;

use serde::Serialize;

/// Statistics over the horizontal gaps between neighbours in a row, measured
/// after placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GapStats {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
}

impl GapStats {
    /// Folds one observed gap into the statistics.
    pub fn record(&mut self, gap: f64) {
        if self.count == 0 {
            self.min = gap;
            self.max = gap;
        } else {
            self.min = self.min.min(gap);
            self.max = self.max.max(gap);
        }
        self.count += 1;
        self.mean += (gap - self.mean) / self.count as f64;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }
}

/// What a calibration run changed.
///
/// Produced on every run, including runs that change nothing or skip the
/// document entirely; a skipped run carries a [`warning`](Self::warning).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    pub(super) nodes_adjusted: usize,
    pub(super) rows_detected: usize,
    pub(super) overlaps_resolved: usize,
    pub(super) row_spacing_adjustments: usize,
    pub(super) connectors_restyled: usize,
    pub(super) connector_waypoints_cleared: usize,
    pub(super) gaps: GapStats,
    pub(super) elapsed_ms: f64,
    pub(super) grid_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) warning: Option<String>,
}

impl CalibrationReport {
    pub(super) fn new(grid_size: f64) -> Self {
        Self {
            grid_size,
            ..Self::default()
        }
    }

    /// A report for a run that left the document untouched.
    pub(super) fn skipped(grid_size: f64, warning: impl Into<String>) -> Self {
        Self {
            grid_size,
            warning: Some(warning.into()),
            ..Self::default()
        }
    }

    pub(super) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    }

    /// Appends a warning, keeping any earlier one.
    pub(super) fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        self.warning = Some(match self.warning.take() {
            Some(existing) => format!("{existing}; {warning}"),
            None => warning,
        });
    }

    /// Vertices whose position changed.
    pub fn nodes_adjusted(&self) -> usize {
        self.nodes_adjusted
    }

    pub fn rows_detected(&self) -> usize {
        self.rows_detected
    }

    /// Vertices pushed right to clear their left neighbour.
    pub fn overlaps_resolved(&self) -> usize {
        self.overlaps_resolved
    }

    /// Rows pushed down to clear the row above.
    pub fn row_spacing_adjustments(&self) -> usize {
        self.row_spacing_adjustments
    }

    pub fn connectors_restyled(&self) -> usize {
        self.connectors_restyled
    }

    pub fn connector_waypoints_cleared(&self) -> usize {
        self.connector_waypoints_cleared
    }

    pub fn gaps(&self) -> &GapStats {
        &self.gaps
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// The grid size actually used.
    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Returns `true` when the run moved, restyled and cleared nothing.
    pub fn is_noop(&self) -> bool {
        self.nodes_adjusted == 0
            && self.overlaps_resolved == 0
            && self.row_spacing_adjustments == 0
            && self.connectors_restyled == 0
            && self.connector_waypoints_cleared == 0
    }
}
