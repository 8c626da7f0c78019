use crate::density::grid::DensityGrid;
use crate::detection::DetectionPoint;
use crate::prelude::OverlayConfig;

/// Kernel-density estimator converting a filtered point batch into a
/// normalized grid sized to the viewport.
///
/// Contributions use a Gaussian falloff `exp(-d^2 / (2 r^2))` cut off at
/// `2 r` from the point. The cutoff leaves a visible residual at the edge;
/// that is the product's established look and must not be renormalized.
pub struct DensityEstimator;

impl DensityEstimator {
    /// Accumulates every point into the grid, then normalizes by the grid
    /// maximum so the hottest cell is exactly 1.0 whenever any positive
    /// weight contributed.
    ///
    /// Malformed input is sanitized rather than rejected: coordinates are
    /// clamped into `[0,1]`, non-finite or negative weights contribute
    /// nothing, and the result never carries a NaN.
    pub fn estimate(
        points: &[DetectionPoint],
        width: u32,
        height: u32,
        config: &OverlayConfig,
    ) -> DensityGrid {
        let mut grid = DensityGrid::zeros(width, height, config.cell_size);
        if grid.is_empty() {
            return grid;
        }

        let radius = config.influence_radius.max(f32::EPSILON);
        let cutoff = 2.0 * radius;
        let cutoff_sq = cutoff * cutoff;
        let falloff_denom = 2.0 * radius * radius;
        let cell = grid.cell_size() as f32;
        let frame_width = width as f32;
        let frame_height = height as f32;
        let last_col = grid.cols() - 1;
        let last_row = grid.rows() - 1;

        for point in points {
            let weight = point.weight;
            if !weight.is_finite() || weight <= 0.0 {
                continue;
            }
            let px = point.x.clamp(0.0, 1.0) * frame_width;
            let py = point.y.clamp(0.0, 1.0) * frame_height;

            // Only cells whose center can fall inside the cutoff are
            // visited; a full-grid scan per point does not scale to many
            // simultaneous tiles.
            let col_min = (((px - cutoff) / cell).floor().max(0.0)) as usize;
            let col_max = ((((px + cutoff) / cell).ceil().max(0.0)) as usize).min(last_col);
            let row_min = (((py - cutoff) / cell).floor().max(0.0)) as usize;
            let row_max = ((((py + cutoff) / cell).ceil().max(0.0)) as usize).min(last_row);

            for row in row_min..=row_max {
                for col in col_min..=col_max {
                    let (cx, cy) = grid.cell_center(row, col);
                    let dx = cx - px;
                    let dy = cy - py;
                    let dist_sq = dx * dx + dy * dy;
                    if dist_sq <= cutoff_sq {
                        grid.accumulate(row, col, weight * (-dist_sq / falloff_denom).exp());
                    }
                }
            }
        }

        grid.normalize();
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OverlayConfig {
        OverlayConfig::default()
    }

    fn person(x: f32, y: f32, weight: f32) -> DetectionPoint {
        DetectionPoint::new(x, y, "person", weight)
    }

    #[test]
    fn empty_input_yields_all_zero_grid() {
        let grid = DensityEstimator::estimate(&[], 400, 200, &config());
        assert_eq!(grid.max_value(), 0.0);
        assert!(grid.argmax().is_none());
    }

    #[test]
    fn zero_area_viewport_yields_empty_grid() {
        let points = vec![person(0.5, 0.5, 1.0)];
        let grid = DensityEstimator::estimate(&points, 0, 200, &config());
        assert!(grid.is_empty());
    }

    #[test]
    fn peak_cell_is_exactly_one_after_normalization() {
        let points = vec![person(0.5, 0.5, 0.37)];
        let grid = DensityEstimator::estimate(&points, 400, 200, &config());
        assert!((grid.max_value() - 1.0).abs() < 1e-6);
        for (_, _, value) in grid.iter_cells() {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn invalid_weights_contribute_nothing() {
        let points = vec![
            person(0.5, 0.5, f32::NAN),
            person(0.3, 0.3, -2.0),
            person(0.7, 0.7, 0.0),
        ];
        let grid = DensityEstimator::estimate(&points, 400, 200, &config());
        assert_eq!(grid.max_value(), 0.0);
        for (_, _, value) in grid.iter_cells() {
            assert!(value.is_finite());
        }
    }

    #[test]
    fn out_of_range_coordinates_clamp_into_frame() {
        let points = vec![person(1.5, -0.5, 1.0)];
        let grid = DensityEstimator::estimate(&points, 400, 200, &config());
        let (row, col) = grid.argmax().unwrap();
        let (cx, cy) = grid.cell_center(row, col);
        // Clamped to the top-right corner of the frame.
        assert!((cx - 400.0).abs() <= grid.cell_size() as f32);
        assert!(cy <= grid.cell_size() as f32);
    }

    #[test]
    fn cells_beyond_cutoff_stay_zero() {
        let points = vec![person(0.5, 0.5, 1.0)];
        let grid = DensityEstimator::estimate(&points, 400, 200, &config());
        let cutoff = 2.0 * config().influence_radius;
        for (row, col, value) in grid.iter_cells() {
            let (cx, cy) = grid.cell_center(row, col);
            let dist = ((cx - 200.0).powi(2) + (cy - 100.0).powi(2)).sqrt();
            if dist > cutoff {
                assert_eq!(value, 0.0, "cell ({row},{col}) past the cutoff is hot");
            }
        }
    }

    #[test]
    fn filtered_scenario_peaks_near_remaining_point() {
        // 400x200 viewport; the car at (0.1, 0.1) has been excluded by the
        // class filter upstream, so only the person contributes.
        let points = vec![person(0.5, 0.5, 1.0)];
        let grid = DensityEstimator::estimate(&points, 400, 200, &config());

        let (row, col) = grid.argmax().unwrap();
        let (cx, cy) = grid.cell_center(row, col);
        assert!((cx - 200.0).abs() <= grid.cell_size() as f32);
        assert!((cy - 100.0).abs() <= grid.cell_size() as f32);

        // No accumulation anywhere near the excluded car at pixel (40, 20).
        let car_col = (40.0 / grid.cell_size() as f32) as usize;
        let car_row = (20.0 / grid.cell_size() as f32) as usize;
        assert_eq!(grid.value(car_row, car_col), 0.0);
    }

    #[test]
    fn class_exclusion_difference_is_local_to_the_point() {
        let both = vec![person(0.5, 0.5, 1.0), DetectionPoint::new(0.1, 0.1, "car", 1.0)];
        let person_only = vec![person(0.5, 0.5, 1.0)];
        let with_car = DensityEstimator::estimate(&both, 400, 200, &config());
        let without_car = DensityEstimator::estimate(&person_only, 400, 200, &config());

        let cutoff = 2.0 * config().influence_radius;
        for (row, col, value) in with_car.iter_cells() {
            let diff = (value - without_car.value(row, col)).abs();
            let (cx, cy) = with_car.cell_center(row, col);
            let dist_to_car = ((cx - 40.0).powi(2) + (cy - 20.0).powi(2)).sqrt();
            if dist_to_car > cutoff {
                assert!(diff < 1e-6, "cell ({row},{col}) changed away from the car");
            }
        }
    }

    #[test]
    fn normalization_is_invariant_to_absolute_weight() {
        let heavy = vec![person(0.5, 0.5, 2.0)];
        let light = vec![person(0.5, 0.5, 1.0)];
        let heavy_grid = DensityEstimator::estimate(&heavy, 400, 200, &config());
        let light_grid = DensityEstimator::estimate(&light, 400, 200, &config());

        assert!((heavy_grid.max_value() - 1.0).abs() < 1e-6);
        assert!((light_grid.max_value() - 1.0).abs() < 1e-6);
        for (row, col, value) in heavy_grid.iter_cells() {
            assert!((value - light_grid.value(row, col)).abs() < 1e-6);
        }
    }

    #[test]
    fn peak_moves_proportionally_when_viewport_doubles() {
        let points = vec![person(0.25, 0.75, 1.0)];
        let small = DensityEstimator::estimate(&points, 400, 200, &config());
        let large = DensityEstimator::estimate(&points, 800, 400, &config());

        let (small_row, small_col) = small.argmax().unwrap();
        let (large_row, large_col) = large.argmax().unwrap();
        let (sx, sy) = small.cell_center(small_row, small_col);
        let (lx, ly) = large.cell_center(large_row, large_col);

        let tolerance = small.cell_size() as f32 * 2.0;
        assert!((lx - sx * 2.0).abs() <= tolerance);
        assert!((ly - sy * 2.0).abs() <= tolerance);
    }
}
