//! Rolling-window statistics.
//!
//! Both kernels return one slot per input element. Slots inside the warm-up
//! prefix (indices below `window - 1`) and degenerate window sizes come back
//! as `None` — absent values stay absent, never NaN and never sentinel zeros.

/// Rolling mean over a fixed window.
///
/// Maintains a running sum: each step adds the entering element, subtracts
/// the element that left the window, then divides the sum by `window`.
/// Returns all `None` when `window == 0`.
pub fn rolling_mean(xs: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = xs.len();
    let mut out = vec![None; n];
    if window == 0 {
        return out;
    }

    let mut sum = 0.0;
    for (i, &x) in xs.iter().enumerate() {
        sum += x;
        if i >= window {
            sum -= xs[i - window];
        }
        if i + 1 >= window {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

/// Rolling sample standard deviation over a fixed window.
///
/// Uses the Bessel divisor `window - 1`. Each window recomputes its own mean
/// and variance directly from the window slice, so every defined slot is
/// identical to a from-scratch recomputation of that window.
/// Returns all `None` when `window <= 1`.
pub fn rolling_std(xs: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = xs.len();
    let mut out = vec![None; n];
    if window <= 1 || n < window {
        return out;
    }

    for i in (window - 1)..n {
        let win = &xs[i + 1 - window..=i];
        let mean = win.iter().sum::<f64>() / window as f64;
        let var = win.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        out[i] = Some(var.sqrt());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn mean_window_3_basic() {
        let out = rolling_mean(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_approx(out[2].unwrap(), 11.0);
        assert_approx(out[3].unwrap(), 12.0);
        assert_approx(out[4].unwrap(), 13.0);
    }

    #[test]
    fn mean_window_1_is_identity() {
        let out = rolling_mean(&[100.0, 200.0, 300.0], 1);
        assert_approx(out[0].unwrap(), 100.0);
        assert_approx(out[1].unwrap(), 200.0);
        assert_approx(out[2].unwrap(), 300.0);
    }

    #[test]
    fn mean_window_0_all_none() {
        let out = rolling_mean(&[1.0, 2.0, 3.0], 0);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn mean_window_larger_than_series_all_none() {
        let out = rolling_mean(&[1.0, 2.0, 3.0], 4);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn mean_window_equal_to_series_defines_last_only() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 4);
        assert!(out[..3].iter().all(Option::is_none));
        assert_approx(out[3].unwrap(), 2.5);
    }

    #[test]
    fn mean_empty_series() {
        assert!(rolling_mean(&[], 3).is_empty());
    }

    #[test]
    fn mean_matches_direct_recompute() {
        let xs = [3.5, -1.25, 7.0, 0.5, 2.75, -4.0, 9.125, 1.0];
        let w = 4;
        let out = rolling_mean(&xs, w);
        for i in (w - 1)..xs.len() {
            let direct = xs[i + 1 - w..=i].iter().sum::<f64>() / w as f64;
            assert_approx(out[i].unwrap(), direct);
        }
    }

    #[test]
    fn std_window_2_basic() {
        let out = rolling_std(&[1.0, 2.0, 4.0, 8.0], 2);
        assert_eq!(out[0], None);
        // sample std of [1,2] = sqrt(0.5)
        assert_approx(out[1].unwrap(), 0.5f64.sqrt());
        assert_approx(out[2].unwrap(), 2.0f64.sqrt());
        assert_approx(out[3].unwrap(), 8.0f64.sqrt());
    }

    #[test]
    fn std_uses_bessel_divisor() {
        // mean 5, squared deviations sum to 32, sample variance 32/7
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_std(&xs, 8);
        assert_approx(out[7].unwrap(), (32.0f64 / 7.0).sqrt());
    }

    #[test]
    fn std_constant_series_is_zero() {
        let out = rolling_std(&[5.0; 6], 3);
        for slot in &out[2..] {
            assert_approx(slot.unwrap(), 0.0);
        }
    }

    #[test]
    fn std_window_1_all_none() {
        assert!(rolling_std(&[1.0, 2.0, 3.0], 1).iter().all(Option::is_none));
    }

    #[test]
    fn std_window_0_all_none() {
        assert!(rolling_std(&[1.0, 2.0, 3.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn std_window_larger_than_series_all_none() {
        assert!(rolling_std(&[1.0, 2.0, 3.0], 4).iter().all(Option::is_none));
    }

    #[test]
    fn std_window_equal_to_series_defines_last_only() {
        let out = rolling_std(&[1.0, 2.0, 3.0], 3);
        assert!(out[..2].iter().all(Option::is_none));
        assert_approx(out[2].unwrap(), 1.0);
    }
}
