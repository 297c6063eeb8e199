//! Row clustering and placement.
//!
//! Vertices sharing a parent are grouped into rows by their `y`, rows are
//! stacked top to bottom and members are spread left to right. Clustering
//! is greedy and order-dependent: a vertex joins the first row whose
//! running average is close enough, and the average is updated
//! incrementally as members join.

use log::trace;

use mxmend_core::document::CellHandle;

use super::{
    grid::{grid_snap, grid_snap_up},
    report::CalibrationReport,
};

/// The original bounds of a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexBox {
    pub handle: CellHandle,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Vertices clustered by `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    members: Vec<usize>,
    average_y: f64,
}

impl Row {
    fn new(index: usize, y: f64) -> Self {
        Self {
            members: vec![index],
            average_y: y,
        }
    }

    fn push(&mut self, index: usize, y: f64) {
        self.members.push(index);
        self.average_y += (y - self.average_y) / self.members.len() as f64;
    }

    /// Indices into the clustered slice, in joining order.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn average_y(&self) -> f64 {
        self.average_y
    }
}

/// Where a vertex ends up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub handle: CellHandle,
    pub x: f64,
    pub y: f64,
}

/// Spacing parameters for [`place_rows`].
#[derive(Debug, Clone, Copy)]
pub struct Spacing {
    pub grid_size: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    pub row_padding: f64,
}

/// Clusters vertices into rows, returned in ascending average `y`.
pub fn cluster_rows(boxes: &[VertexBox], tolerance: f64) -> Vec<Row> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| boxes[a].y.total_cmp(&boxes[b].y));

    let mut rows: Vec<Row> = Vec::new();
    for index in order {
        let y = boxes[index].y;
        match rows
            .iter_mut()
            .find(|row| (row.average_y - y).abs() <= tolerance)
        {
            Some(row) => row.push(index, y),
            None => rows.push(Row::new(index, y)),
        }
    }

    rows.sort_by(|a, b| a.average_y.total_cmp(&b.average_y));
    rows
}

/// Places clustered rows, counting adjustments into `report`.
pub fn place_rows(
    boxes: &[VertexBox],
    rows: &[Row],
    spacing: Spacing,
    report: &mut CalibrationReport,
) -> Vec<Placement> {
    let grid = spacing.grid_size;
    let mut placements = Vec::with_capacity(boxes.len());
    // Target y and tallest member of the previous row.
    let mut previous: Option<(f64, f64)> = None;

    for row in rows {
        let snapped = grid_snap(row.average_y, grid);
        let target_y = match previous {
            None => spacing.row_padding.max(snapped),
            Some((previous_y, previous_height)) => {
                let minimum = previous_y + previous_height + spacing.vertical_gap;
                if minimum > snapped {
                    report.row_spacing_adjustments += 1;
                    grid_snap_up(minimum, grid)
                } else {
                    snapped
                }
            }
        };

        let mut members = row.members.clone();
        members.sort_by(|&a, &b| boxes[a].x.total_cmp(&boxes[b].x));

        // Right edge of the previous member.
        let mut previous_right: Option<f64> = None;
        for &index in &members {
            let vertex = &boxes[index];
            let snapped = grid_snap(vertex.x, grid);
            let target_x = match previous_right {
                None => spacing.row_padding.max(snapped),
                Some(right) => {
                    let minimum = right + spacing.horizontal_gap;
                    let x = if minimum > snapped {
                        report.overlaps_resolved += 1;
                        grid_snap_up(minimum, grid)
                    } else {
                        snapped
                    };
                    report.gaps.record(x - right);
                    x
                }
            };

            trace!(
                index = vertex.handle.index(),
                x = target_x,
                y = target_y;
                "Placed vertex"
            );
            placements.push(Placement {
                handle: vertex.handle,
                x: target_x,
                y: target_y,
            });
            previous_right = Some(target_x + vertex.width);
        }

        let tallest = members
            .iter()
            .map(|&index| boxes[index].height)
            .fold(0.0, f64::max);
        previous = Some((target_y, tallest));
    }

    report.rows_detected += rows.len();
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxmend_core::document::Document;

    fn boxes(bounds: &[(f64, f64, f64, f64)]) -> Vec<VertexBox> {
        let handles: Vec<CellHandle> = Document::placeholder().handles().collect();
        bounds
            .iter()
            .enumerate()
            .map(|(i, &(x, y, width, height))| VertexBox {
                // Handles only identify placements here.
                handle: handles[i % handles.len()],
                x,
                y,
                width,
                height,
            })
            .collect()
    }

    fn spacing() -> Spacing {
        Spacing {
            grid_size: 8.0,
            horizontal_gap: 40.0,
            vertical_gap: 36.0,
            row_padding: 32.0,
        }
    }

    #[test]
    fn test_cluster_by_running_average() {
        // 0 and 15 share a row (average 7.5); 30 is 22.5 away and starts a new one.
        let boxes = boxes(&[
            (0.0, 30.0, 10.0, 10.0),
            (0.0, 0.0, 10.0, 10.0),
            (0.0, 15.0, 10.0, 10.0),
        ]);
        let rows = cluster_rows(&boxes, 18.0);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].members(), &[1, 2]);
        assert_eq!(rows[0].average_y(), 7.5);
        assert_eq!(rows[1].members(), &[0]);
    }

    #[test]
    fn test_cluster_is_order_dependent() {
        // 0 and 18 join; the average moves to 9 so 27 joins too, though it is
        // 27 away from the first member.
        let boxes = boxes(&[
            (0.0, 0.0, 1.0, 1.0),
            (0.0, 18.0, 1.0, 1.0),
            (0.0, 27.0, 1.0, 1.0),
        ]);
        let rows = cluster_rows(&boxes, 18.0);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].average_y(), 15.0);
    }

    #[test]
    fn test_place_overlapping_pair() {
        let boxes = boxes(&[(100.0, 100.0, 120.0, 60.0), (100.0, 100.0, 120.0, 60.0)]);
        let rows = cluster_rows(&boxes, 18.0);
        let mut report = CalibrationReport::new(8.0);

        let placements = place_rows(&boxes, &rows, spacing(), &mut report);

        assert_eq!((placements[0].x, placements[0].y), (104.0, 104.0));
        assert_eq!((placements[1].x, placements[1].y), (264.0, 104.0));
        assert_eq!(report.overlaps_resolved, 1);
        assert_eq!(report.rows_detected, 1);
        assert_eq!(report.gaps.count(), 1);
        assert_eq!(report.gaps.min(), 40.0);
    }

    #[test]
    fn test_place_pushes_crowded_row_down() {
        let boxes = boxes(&[(40.0, 40.0, 100.0, 80.0), (40.0, 80.0, 100.0, 40.0)]);
        let rows = cluster_rows(&boxes, 18.0);
        let mut report = CalibrationReport::new(8.0);

        let placements = place_rows(&boxes, &rows, spacing(), &mut report);

        assert_eq!(placements[0].y, 40.0);
        // 40 + 80 + 36 = 156, snapped up to the next grid line.
        assert_eq!(placements[1].y, 160.0);
        assert_eq!(report.row_spacing_adjustments, 1);
    }

    #[test]
    fn test_place_respects_padding() {
        let boxes = boxes(&[(3.0, 2.0, 10.0, 10.0)]);
        let rows = cluster_rows(&boxes, 18.0);
        let mut report = CalibrationReport::new(8.0);

        let placements = place_rows(&boxes, &rows, spacing(), &mut report);

        assert_eq!((placements[0].x, placements[0].y), (32.0, 32.0));
        assert_eq!(report.overlaps_resolved, 0);
    }
}
