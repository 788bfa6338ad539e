/// Population mean and variance of a sample window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VectorStats {
    pub mean: f64,
    /// Mean squared deviation from `mean` (divisor N, not N - 1).
    pub variance: f64,
}

impl VectorStats {
    /// Statistics over `values`. An empty slice yields zero mean and variance.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self { mean, variance }
    }
}

/// Fixed-capacity ring buffer of the most recent scalar samples.
///
/// Slots start at zero rather than empty, so statistics taken before the
/// window has wrapped once include the zero fill.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularWindow {
    values: Vec<f64>,
    cursor: usize,
}

impl CircularWindow {
    pub fn new(size: usize) -> Self {
        Self {
            values: vec![0.0; size.max(1)],
            cursor: 0,
        }
    }

    /// Overwrite the oldest slot with `value` and advance the cursor.
    pub fn push(&mut self, value: f64) {
        self.values[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.values.len();
    }

    /// Index of the slot the next `push` writes to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn stats(&self) -> VectorStats {
        VectorStats::of(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_variance() {
        let stats = VectorStats::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        // Sample variance would be 32 / 7.
        assert!((stats.variance - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(VectorStats::of(&[]), VectorStats::default());
    }

    #[test]
    fn window_wraps_and_overwrites_oldest() {
        let mut window = CircularWindow::new(3);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.cursor(), 2);
        window.push(3.0);
        assert_eq!(window.cursor(), 0);
        window.push(4.0);
        assert_eq!(window.values(), &[4.0, 2.0, 3.0]);
    }

    #[test]
    fn zero_fill_biases_early_statistics() {
        let mut window = CircularWindow::new(4);
        window.push(8.0);
        let stats = window.stats();
        assert!((stats.mean - 2.0).abs() < 1e-12);
        // [8, 0, 0, 0]: (36 + 4 + 4 + 4) / 4
        assert!((stats.variance - 12.0).abs() < 1e-12);
    }
}
