//! Scalar potential field
//!
//! A coarse grid of values in [0, 1] laid over the world. Every write goes
//! through `set_clamped`, so no cell ever leaves that range.

use crate::consts::{CELL_SIZE, DIFFUSION_BLEND, DISTURB_WAVE};

/// Grid of potential values
#[derive(Debug, Clone)]
pub struct ScalarField {
    width: f32,
    height: f32,
    cols: usize,
    rows: usize,
    cells: Vec<f32>,
    /// Scratch buffer for diffusion
    back: Vec<f32>,
}

impl ScalarField {
    /// Create a zeroed field covering `width` x `height` world units
    pub fn new(width: f32, height: f32) -> Self {
        let width = width.max(0.0);
        let height = height.max(0.0);
        let cols = ((width / CELL_SIZE).ceil() as usize).max(1);
        let rows = ((height / CELL_SIZE).ceil() as usize).max(1);
        Self {
            width,
            height,
            cols,
            rows,
            cells: vec![0.0; cols * rows],
            back: vec![0.0; cols * rows],
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Raw cell values, row-major
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Value of a cell (indices clipped into the grid)
    pub fn get(&self, col: usize, row: usize) -> f32 {
        let col = col.min(self.cols - 1);
        let row = row.min(self.rows - 1);
        self.cells[row * self.cols + col]
    }

    /// Value under a world position
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let (col, row) = self.cell_of(x, y);
        self.cells[row * self.cols + col]
    }

    /// Mean cell value
    pub fn average(&self) -> f32 {
        self.total() / self.cells.len() as f32
    }

    /// Sum of all cells
    pub fn total(&self) -> f32 {
        self.cells.iter().sum()
    }

    #[inline]
    fn set_clamped(&mut self, idx: usize, value: f32) {
        self.cells[idx] = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }

    /// Grid cell containing a world position, clipped into range
    fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        let col = (x / CELL_SIZE).floor().clamp(0.0, (self.cols - 1) as f32) as usize;
        let row = (y / CELL_SIZE).floor().clamp(0.0, (self.rows - 1) as f32) as usize;
        (col, row)
    }

    /// Blend every cell toward the mean of its (up to 8) neighbours.
    ///
    /// The blend factor is fixed; callers apply this once per tick.
    pub fn diffuse(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.back.copy_from_slice(&self.cells);
        let (cols, rows) = (self.cols as isize, self.rows as isize);

        for row in 0..rows {
            for col in 0..cols {
                let mut sum = 0.0;
                let mut count = 0u32;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let (c, r) = (col + dx, row + dy);
                        if c < 0 || r < 0 || c >= cols || r >= rows {
                            continue;
                        }
                        sum += self.back[(r * cols + c) as usize];
                        count += 1;
                    }
                }
                let idx = (row * cols + col) as usize;
                let own = self.back[idx];
                let mean = if count > 0 { sum / count as f32 } else { own };
                self.set_clamped(idx, own * (1.0 - DIFFUSION_BLEND) + mean * DIFFUSION_BLEND);
            }
        }
    }

    /// Add a decaying sinusoidal ripple centred on (x, y)
    pub fn disturb(&mut self, x: f32, y: f32, radius: f32, intensity: f32) {
        self.apply_radial_effect(x, y, radius, |factor| {
            let dist = (1.0 - factor) * radius;
            intensity * factor * (0.5 + 0.5 * (dist * DISTURB_WAVE).sin())
        });
    }

    /// Paint `amount(distance_factor)` into every cell whose centre lies
    /// within `radius` of (x, y). `distance_factor` is `1 - dist / radius`.
    pub fn apply_radial_effect<F>(&mut self, x: f32, y: f32, radius: f32, amount: F)
    where
        F: Fn(f32) -> f32,
    {
        if !(radius > 0.0) || !x.is_finite() || !y.is_finite() {
            return;
        }
        let min_col = ((x - radius) / CELL_SIZE).floor().max(0.0) as usize;
        let min_row = ((y - radius) / CELL_SIZE).floor().max(0.0) as usize;
        let max_col = ((x + radius) / CELL_SIZE).ceil().max(0.0) as usize;
        let max_row = ((y + radius) / CELL_SIZE).ceil().max(0.0) as usize;
        let max_col = max_col.min(self.cols - 1);
        let max_row = max_row.min(self.rows - 1);
        if min_col > max_col || min_row > max_row {
            return;
        }

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let cx = (col as f32 + 0.5) * CELL_SIZE;
                let cy = (row as f32 + 0.5) * CELL_SIZE;
                let dist = ((cx - x).powi(2) + (cy - y).powi(2)).sqrt();
                if dist >= radius {
                    continue;
                }
                let idx = row * self.cols + col;
                let value = self.cells[idx] + amount(1.0 - dist / radius);
                self.set_clamped(idx, value);
            }
        }
    }
}
