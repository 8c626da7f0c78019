use ndarray::Array2;

/// Normalized 2-D density grid sized to the current viewport.
///
/// Dimensions are `ceil(W / cell_size) x ceil(H / cell_size)`. The grid is
/// transient: rebuilt in full on every render, never cached across renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    cells: Array2<f32>,
    cell_size: u32,
}

impl DensityGrid {
    pub fn zeros(width: u32, height: u32, cell_size: u32) -> Self {
        let cell = cell_size.max(1);
        let cols = width.div_ceil(cell) as usize;
        let rows = height.div_ceil(cell) as usize;
        Self {
            cells: Array2::zeros((rows, cols)),
            cell_size: cell,
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.cells[[row, col]]
    }

    pub(crate) fn accumulate(&mut self, row: usize, col: usize, amount: f32) {
        self.cells[[row, col]] += amount;
    }

    /// Pixel-space center of a cell.
    pub fn cell_center(&self, row: usize, col: usize) -> (f32, f32) {
        let cell = self.cell_size as f32;
        (
            (col as f32 + 0.5) * cell,
            (row as f32 + 0.5) * cell,
        )
    }

    pub fn max_value(&self) -> f32 {
        self.cells.iter().copied().fold(0.0, f32::max)
    }

    /// Self-relative normalization: divides by the grid maximum so the
    /// hottest cell lands at exactly 1.0. A zero max leaves the grid as-is.
    pub(crate) fn normalize(&mut self) {
        let max = self.max_value();
        if max > 0.0 {
            self.cells.mapv_inplace(|value| value / max);
        }
    }

    /// Row/col/value triples in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), &value)| (row, col, value))
    }

    /// Row-major copy of the cell values, for wire models.
    pub fn to_row_major(&self) -> Vec<f32> {
        self.cells.iter().copied().collect()
    }

    /// Index of the hottest cell, if any cell is positive.
    pub fn argmax(&self) -> Option<(usize, usize)> {
        let mut best = None;
        let mut best_value = 0.0;
        for (row, col, value) in self.iter_cells() {
            if value > best_value {
                best_value = value;
                best = Some((row, col));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_round_up_to_whole_cells() {
        let grid = DensityGrid::zeros(400, 200, 20);
        assert_eq!(grid.cols(), 20);
        assert_eq!(grid.rows(), 10);

        let ragged = DensityGrid::zeros(401, 199, 20);
        assert_eq!(ragged.cols(), 21);
        assert_eq!(ragged.rows(), 10);
    }

    #[test]
    fn zero_viewport_yields_empty_grid() {
        let grid = DensityGrid::zeros(0, 0, 20);
        assert!(grid.is_empty());
        assert_eq!(grid.max_value(), 0.0);
    }

    #[test]
    fn normalize_is_identity_on_all_zero_grid() {
        let mut grid = DensityGrid::zeros(100, 100, 20);
        grid.normalize();
        assert_eq!(grid.max_value(), 0.0);
    }

    #[test]
    fn normalize_scales_peak_to_one() {
        let mut grid = DensityGrid::zeros(100, 100, 20);
        grid.accumulate(1, 1, 4.0);
        grid.accumulate(2, 2, 2.0);
        grid.normalize();
        assert!((grid.value(1, 1) - 1.0).abs() < 1e-6);
        assert!((grid.value(2, 2) - 0.5).abs() < 1e-6);
        assert_eq!(grid.argmax(), Some((1, 1)));
    }
}
