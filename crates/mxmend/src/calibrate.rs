//! Geometric calibration of diagram layouts.
//!
//! Calibration re-lays out vertex positions so generated diagrams look
//! aligned regardless of where the model placed them, and gives every
//! connector the same routing and stroke:
//!
//! 1. Vertices are grouped by parent container and clustered into rows
//!    by `y` ([`rows`]).
//! 2. Rows are stacked with at least the vertical gap between them, and
//!    members are spread with at least the horizontal gap, snapping to the
//!    grid ([`grid`]).
//! 3. Connectors get the canonical style and lose stale waypoints
//!    ([`connectors`]).
//!
//! Calibration never fails. Markup it cannot use is returned unchanged with
//! a [`CalibrationReport`] carrying a warning.

mod connectors;
mod grid;
mod report;
mod rows;

pub use grid::{grid_snap, grid_snap_up};
pub use report::{CalibrationReport, GapStats};

use std::time::Instant;

use indexmap::IndexMap;
use log::{debug, info, warn};

use mxmend_core::document::Document;
use mxmend_parser::{build_document, normalize};

use crate::config::{CalibrationConfig, DEFAULT_GRID_SIZE};

use connectors::{canonical_style, normalize_connector};
use rows::{Spacing, VertexBox, cluster_rows, place_rows};

/// Calibrated markup and the report describing the run.
#[derive(Debug, Clone)]
pub struct CalibrationOutput {
    xml: String,
    report: CalibrationReport,
}

impl CalibrationOutput {
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn report(&self) -> &CalibrationReport {
        &self.report
    }

    pub fn into_parts(self) -> (String, CalibrationReport) {
        (self.xml, self.report)
    }
}

/// Calibrates markup.
///
/// The markup is expected to be valid; markup that cannot be built into a
/// document is returned unchanged with a warning in the report.
pub fn calibrate(xml: &str, config: &CalibrationConfig) -> CalibrationOutput {
    let started = Instant::now();
    match build_document(&normalize(xml)) {
        Ok(document) => {
            let (calibrated, report) = calibrate_document(&document, config);
            CalibrationOutput {
                xml: calibrated.to_xml(),
                report,
            }
        }
        Err(err) => {
            warn!("Skipping calibration of unparseable markup: {err}");
            let (grid_size, _) = effective_grid_size(config);
            let mut report =
                CalibrationReport::skipped(grid_size, format!("markup could not be parsed: {err}"));
            report.set_elapsed(started.elapsed());
            CalibrationOutput {
                xml: xml.to_string(),
                report,
            }
        }
    }
}

/// Calibrates a document, returning the new document value.
///
/// The input is left untouched. Cell ids, parents and edge endpoints are
/// never changed.
pub fn calibrate_document(
    document: &Document,
    config: &CalibrationConfig,
) -> (Document, CalibrationReport) {
    let started = Instant::now();
    let (grid_size, grid_warning) = effective_grid_size(config);

    let skip_reason = if !document.has_root() {
        Some("document has no root")
    } else if vertex_groups(document).is_empty() {
        Some("document has no vertices to calibrate")
    } else {
        None
    };
    if let Some(reason) = skip_reason {
        warn!(reason; "Skipping calibration");
        let mut report = CalibrationReport::skipped(grid_size, reason);
        if let Some(grid_warning) = grid_warning {
            report.add_warning(grid_warning);
        }
        report.set_elapsed(started.elapsed());
        return (document.clone(), report);
    }

    let mut report = CalibrationReport::new(grid_size);
    if let Some(grid_warning) = grid_warning {
        warn!(grid_size = config.grid_size(); "Unusable grid size, using default");
        report.add_warning(grid_warning);
    }

    let mut calibrated = document.clone();
    let spacing = Spacing {
        grid_size,
        horizontal_gap: config.horizontal_gap(),
        vertical_gap: config.vertical_gap(),
        row_padding: config.row_padding(),
    };

    for (parent, boxes) in vertex_groups(document) {
        let rows = cluster_rows(&boxes, config.row_tolerance());
        debug!(parent, vertices = boxes.len(), rows = rows.len(); "Clustered rows");

        for placement in place_rows(&boxes, &rows, spacing, &mut report) {
            let Some(geometry) = calibrated.cell_mut(placement.handle).geometry_mut() else {
                continue;
            };
            let mut moved = false;
            if geometry.x().unwrap_or(0.0) != placement.x {
                geometry.set_x(placement.x);
                moved = true;
            }
            if geometry.y().unwrap_or(0.0) != placement.y {
                geometry.set_y(placement.y);
                moved = true;
            }
            if moved {
                report.nodes_adjusted += 1;
            }
        }
    }

    let canonical = canonical_style(config.connector());
    for handle in calibrated.handles() {
        let cell = calibrated.cell_mut(handle);
        if !cell.is_edge() {
            continue;
        }
        let change = normalize_connector(cell, &canonical);
        if change.restyled {
            report.connectors_restyled += 1;
        }
        if change.waypoints_cleared {
            report.connector_waypoints_cleared += 1;
        }
    }

    report.set_elapsed(started.elapsed());
    info!(
        nodes_adjusted = report.nodes_adjusted,
        rows_detected = report.rows_detected,
        overlaps_resolved = report.overlaps_resolved,
        row_spacing_adjustments = report.row_spacing_adjustments,
        connectors_restyled = report.connectors_restyled,
        connector_waypoints_cleared = report.connector_waypoints_cleared;
        "Calibrated document"
    );
    (calibrated, report)
}

/// The grid size to use, with a warning when the configured one is unusable.
fn effective_grid_size(config: &CalibrationConfig) -> (f64, Option<String>) {
    let grid_size = config.grid_size();
    if grid::is_usable_grid(grid_size) {
        (grid_size, None)
    } else {
        (
            DEFAULT_GRID_SIZE,
            Some(format!(
                "grid size {grid_size} is not a positive number, using {DEFAULT_GRID_SIZE}"
            )),
        )
    }
}

/// Vertices with absolute geometry, grouped by parent id in document order.
fn vertex_groups(document: &Document) -> IndexMap<String, Vec<VertexBox>> {
    let mut groups: IndexMap<String, Vec<VertexBox>> = IndexMap::new();
    for handle in document.handles() {
        let cell = document.cell(handle);
        if !cell.is_vertex() {
            continue;
        }
        let Some(geometry) = cell.geometry().filter(|geometry| !geometry.is_relative()) else {
            continue;
        };
        groups
            .entry(cell.parent().unwrap_or_default().to_string())
            .or_default()
            .push(VertexBox {
                handle,
                x: geometry.x().unwrap_or(0.0),
                y: geometry.y().unwrap_or(0.0),
                width: geometry.width().unwrap_or(0.0),
                height: geometry.height().unwrap_or(0.0),
            });
    }
    groups
}
