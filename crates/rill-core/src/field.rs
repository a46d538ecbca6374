use serde::{Deserialize, Serialize};

/// A dense 2D scalar grid, row-major (`index = y * width + x`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub data: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

impl Field {
    /// Create a new Field filled with the given value.
    pub fn new(width: usize, height: usize, fill: f64) -> Self {
        Self { data: vec![fill; width * height], width, height }
    }

    pub fn zeros(width: usize, height: usize) -> Self {
        Self::new(width, height, 0.0)
    }

    /// Build a field by evaluating `f(x, y)` at every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { data, width, height }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, val: f64) {
        self.data[y * self.width + x] = val;
    }

    /// Bilinear sample at fractional grid position `(fx, fy)`.
    ///
    /// The position is first clamped to `[0.01, dim − 1.01]` on each axis so
    /// the four enclosing samples always exist and the outer half-cell margin
    /// is never read. The result is a convex combination of those samples.
    pub fn sample_clamped(&self, fx: f64, fy: f64) -> f64 {
        let fx = clamp_sample_coord(fx, self.width);
        let fy = clamp_sample_coord(fy, self.height);

        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        let v00 = self.get(x0, y0);
        let v10 = self.get(x1, y0);
        let v01 = self.get(x0, y1);
        let v11 = self.get(x1, y1);

        let top = v00 + (v10 - v00) * tx;
        let bottom = v01 + (v11 - v01) * tx;
        top + (bottom - top) * ty
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn min_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Clamp a sample coordinate into the interior band `[0.01, dim − 1.01]`.
#[inline]
pub fn clamp_sample_coord(v: f64, dim: usize) -> f64 {
    v.clamp(0.01, dim as f64 - 1.01)
}

/// Fill `out` row by row with `f(y, row)`.
///
/// Rows are independent, so with the `threading` feature they are filled in
/// parallel; the result is identical either way.
pub(crate) fn fill_rows<T, F>(out: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(width).enumerate().for_each(|(y, row)| f(y, row));
    }
    #[cfg(not(feature = "threading"))]
    {
        out.chunks_mut(width).enumerate().for_each(|(y, row)| f(y, row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let f = Field::from_fn(3, 2, |x, y| (y * 10 + x) as f64);
        assert_eq!(f.data, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(f.get(2, 1), 12.0);
        assert_eq!(f.index(2, 1), 5);
    }

    #[test]
    fn sample_at_interior_grid_point_is_exact() {
        let f = Field::from_fn(4, 4, |x, y| (x * x + y) as f64);
        assert!((f.sample_clamped(2.0, 1.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn sample_interpolates_linearly() {
        let f = Field::from_fn(4, 4, |x, _| x as f64 * 2.0);
        assert!((f.sample_clamped(1.25, 2.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn sample_clamps_outside_positions() {
        let f = Field::from_fn(4, 4, |x, y| (x + y) as f64);
        // Clamped to (0.01, 0.01) and (2.99, 2.99).
        assert!((f.sample_clamped(-50.0, -50.0) - 0.02).abs() < 1e-9);
        assert!((f.sample_clamped(99.0, 99.0) - 5.98).abs() < 1e-9);
    }

    #[test]
    fn sample_stays_within_input_range() {
        let f = Field::from_fn(5, 5, |x, y| ((x * 7 + y * 3) % 5) as f64 - 1.0);
        let (lo, hi) = (f.min_value(), f.max_value());
        for i in 0..200 {
            let fx = i as f64 * 0.037 - 1.0;
            let fy = 6.0 - i as f64 * 0.031;
            let v = f.sample_clamped(fx, fy);
            assert!(v >= lo - 1e-12 && v <= hi + 1e-12, "sample {v} outside [{lo}, {hi}]");
        }
    }

    #[test]
    fn fill_rows_visits_every_row() {
        let mut out = vec![0usize; 12];
        fill_rows(&mut out, 4, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                *v = y * 4 + x;
            }
        });
        assert_eq!(out, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn fill_rows_matches_serial_loop() {
        let (w, h) = (37, 211);
        let cell = |x: usize, y: usize| ((x as f64 * 0.37).sin() * (y as f64).sqrt()).exp() - (x ^ y) as f64 * 1e-3;

        let mut rows = vec![0.0; w * h];
        fill_rows(&mut rows, w, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                *v = cell(x, y);
            }
        });

        let serial = Field::from_fn(w, h, cell);
        assert!(
            rows.iter().zip(&serial.data).all(|(a, b)| a.to_bits() == b.to_bits()),
            "row-wise fill differs from the serial loop"
        );
    }
}
