//! Sequence aggregates over a single ordered series.
//!
//! Every function returns one value per input element. Near the start of the
//! series the window is truncated to the elements that exist, so no row is
//! ever undefined.

/// Mean over the trailing window `s[max(0, i - window + 1) ..= i]`.
///
/// `window` must be at least 1.
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..series.len())
        .map(|i| {
            let slice = &series[(i + 1).saturating_sub(window)..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Exponentially weighted mean: `ema[0] = s[0]`, `ema[i] = a*s[i] + (1-a)*ema[i-1]`.
pub fn exponential_moving_average(series: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    for &x in series {
        let ema = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(ema);
        prev = Some(ema);
    }
    out
}

/// Relative strength index over the trailing window of `window` values.
///
/// Uses the consecutive differences inside the window ending at `i`:
/// `100 - 100 / (1 + avg_gain / avg_loss)`. With no differences or no
/// movement the value is the neutral `50`; with gains but no losses it is `100`.
pub fn relative_strength_index(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let mut gain = 0.0;
            let mut loss = 0.0;
            for j in (start + 1)..=i {
                let diff = series[j] - series[j - 1];
                if diff > 0.0 {
                    gain += diff;
                } else {
                    loss -= diff;
                }
            }

            // both sums share the same divisor, so it cancels out of the ratio
            if gain == 0.0 && loss == 0.0 {
                50.0
            } else if loss == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + gain / loss)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_moving_average_partial_windows() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_close(&ma, &[1.0, 1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_moving_average_window_one_is_identity() {
        let s = [3.0, -1.0, 7.5];
        assert_close(&moving_average(&s, 1), &s);
    }

    #[test]
    fn test_moving_average_window_longer_than_series() {
        let ma = moving_average(&[2.0, 4.0], 10);
        assert_close(&ma, &[2.0, 3.0]);
    }

    #[test]
    fn test_moving_average_recovers_after_large_value() {
        let ma = moving_average(&[1e17, 1.0, 1.0, 1.0, 1.0], 3);
        assert!((ma[0] - 1e17).abs() < 1.0);
        assert_close(&ma[3..], &[1.0, 1.0]);
    }

    #[test]
    fn test_ema() {
        let ema = exponential_moving_average(&[1.0, 2.0, 3.0, 4.0], 0.5);
        assert_close(&ema, &[1.0, 1.5, 2.25, 3.125]);
    }

    #[test]
    fn test_ema_alpha_one_is_identity() {
        let s = [5.0, 1.0, 9.0];
        assert_close(&exponential_moving_average(&s, 1.0), &s);
    }

    #[test]
    fn test_empty_series() {
        assert!(moving_average(&[], 3).is_empty());
        assert!(exponential_moving_average(&[], 0.5).is_empty());
        assert!(relative_strength_index(&[], 3).is_empty());
    }

    #[test]
    fn test_rsi_edge_values() {
        let rising = relative_strength_index(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_close(&rising, &[50.0, 100.0, 100.0, 100.0]);

        let flat = relative_strength_index(&[2.0, 2.0, 2.0], 3);
        assert_close(&flat, &[50.0, 50.0, 50.0]);

        let falling = relative_strength_index(&[3.0, 2.0, 1.0], 3);
        assert_close(&falling, &[50.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rsi_mixed() {
        // window [1, 3, 2]: gain 2, loss 1
        let rsi = relative_strength_index(&[1.0, 3.0, 2.0], 3);
        assert!((rsi[2] - (100.0 - 100.0 / 3.0)).abs() < 1e-9);
    }
}
