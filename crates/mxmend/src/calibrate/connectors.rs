//! Connector normalization.

use mxmend_core::{cell::Cell, geometry::format_number};

use crate::config::ConnectorConfig;

/// The style keys every connector is given, in the order they are applied.
pub fn canonical_style(config: &ConnectorConfig) -> Vec<(&'static str, String)> {
    vec![
        ("edgeStyle", "orthogonalEdgeStyle".to_string()),
        ("rounded", "1".to_string()),
        ("jettySize", "auto".to_string()),
        ("endArrow", "block".to_string()),
        ("endFill", "1".to_string()),
        ("strokeColor", config.stroke_color().to_string()),
        ("strokeWidth", format_number(config.stroke_width())),
    ]
}

/// What normalizing one connector changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectorChange {
    pub restyled: bool,
    pub waypoints_cleared: bool,
}

/// Applies the canonical style to an edge and drops its waypoint list.
///
/// The style is always rewritten in sorted key order; `restyled` is only set
/// when some key's value actually changed.
pub fn normalize_connector(
    cell: &mut Cell,
    canonical: &[(&'static str, String)],
) -> ConnectorChange {
    let mut style = cell.style();
    let mut restyled = false;
    for (key, value) in canonical {
        restyled |= style.set(key, value);
    }
    cell.set_style(&style);

    let waypoints_cleared = cell
        .geometry_mut()
        .and_then(|geometry| geometry.take_waypoints())
        .is_some();

    ConnectorChange {
        restyled,
        waypoints_cleared,
    }
}
