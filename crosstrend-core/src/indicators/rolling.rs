//! Rolling-window and exponentially weighted primitives over raw `f64` series.
//!
//! Windows follow the "full window required" rule: output at `i` is defined
//! only when `values[i+1-window..=i]` are all defined.

/// Exponentially weighted mean, recursive form.
///
/// `s[first] = x[first]`, `s[t] = alpha * x[t] + (1 - alpha) * s[t-1]`, where
/// `first` is the first defined input. Output stays NaN until `min_periods`
/// defined observations have been consumed. A NaN after the seed taints the
/// rest of the series.
pub fn ewm_mean(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    let first = match values.iter().position(|v| !v.is_nan()) {
        Some(idx) => idx,
        None => return result,
    };

    let mut prev = values[first];
    let mut observed = 1;
    if observed >= min_periods {
        result[first] = prev;
    }

    for i in (first + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        observed += 1;
        if observed >= min_periods {
            result[i] = prev;
        }
    }

    result
}

fn window_slices(
    values: &[f64],
    window: usize,
    mut f: impl FnMut(&[f64]) -> f64,
) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = f(slice);
    }
    result
}

pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    window_slices(values, window, |w| w.iter().sum())
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    window_slices(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Sample standard deviation (n-1 denominator). Undefined for a window of 1.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    window_slices(values, window, |w| {
        let len = w.len();
        if len < 2 {
            return f64::NAN;
        }
        let mean = w.iter().sum::<f64>() / len as f64;
        let ss: f64 = w.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (len - 1) as f64).sqrt()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ewm_masks_until_min_periods() {
        let out = ewm_mean(&[10.0, 11.0, 12.0, 13.0], 0.5, 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        // s0=10, s1=10.5, s2=11.25, s3=12.125
        assert_approx(out[2], 11.25, DEFAULT_EPSILON);
        assert_approx(out[3], 12.125, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_seeds_at_first_defined_value() {
        let out = ewm_mean(&[f64::NAN, f64::NAN, 4.0, 8.0], 0.5, 2);
        assert!(out[2].is_nan());
        assert_approx(out[3], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_all_nan_stays_nan() {
        let out = ewm_mean(&[f64::NAN; 4], 0.5, 1);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_sum_and_mean() {
        let sum = rolling_sum(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(sum[1].is_nan());
        assert_approx(sum[2], 6.0, DEFAULT_EPSILON);
        assert_approx(sum[3], 9.0, DEFAULT_EPSILON);

        let mean = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_approx(mean[1], 1.5, DEFAULT_EPSILON);
        assert_approx(mean[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_is_sample_std() {
        // values 2,4,4,4,5,5,7,9: sample variance = 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = rolling_std(&values, 8);
        assert_approx(std[7], (32.0_f64 / 7.0).sqrt(), 1e-12);
    }

    #[test]
    fn rolling_window_with_nan_is_undefined() {
        let std = rolling_std(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(std[1].is_nan());
        assert!(std[2].is_nan());
        assert!(!std[3].is_nan());
    }
}
