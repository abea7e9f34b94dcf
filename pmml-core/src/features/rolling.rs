//! Sequential features over a time-ordered price series.
//!
//! - `first_difference`: `x[t] - x[t-1]`, undefined at t = 0.
//! - `rolling_sample_std`: sample stddev (divide by n - 1) over a trailing
//!   window of rows. Missing values inside the window are skipped; the window
//!   must be full (t >= window - 1) and hold at least two values.
//!
//! With the 7-row volatility window, row 7 is the first defined value and is
//! computed from the six returns it covers.

/// Rows in the `vol_7` window.
pub const VOL_WINDOW: usize = 7;

/// One-step differences. The first element is always `None`.
pub fn first_difference(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for (i, v) in values.iter().enumerate() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(Some(v - values[i - 1]));
        }
    }
    out
}

/// Trailing sample standard deviation over `window` rows.
pub fn rolling_sample_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    assert!(window >= 1, "rolling window must be >= 1");
    (0..values.len())
        .map(|t| {
            if t + 1 < window {
                return None;
            }
            let present: Vec<f64> = values[t + 1 - window..=t].iter().flatten().copied().collect();
            sample_std(&present)
        })
        .collect()
}

fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}
