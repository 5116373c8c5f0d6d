//! Fixed-length rolling input window for autoregressive prediction.

use ndarray::{s, Array1, ArrayView1};

/// Scaled model-input values, oldest first.
///
/// Windows are immutable: `slide` returns a new window, so one forecasting
/// step is a pure function of the previous window and the prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    values: Array1<f64>,
}

impl RollingWindow {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: Array1::from_vec(values),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// Most recent value.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Drop the oldest value and append `next`. Length is preserved.
    pub fn slide(&self, next: f64) -> Self {
        let len = self.values.len();
        if len == 0 {
            return self.clone();
        }
        let mut values = Array1::zeros(len);
        values
            .slice_mut(s![..len - 1])
            .assign(&self.values.slice(s![1..]));
        values[len - 1] = next;
        Self { values }
    }
}
