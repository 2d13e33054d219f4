//! Peak finding with distance and prominence constraints.

/// Finds local maxima of `x`.
///
/// 1. Local maxima are samples strictly greater than both neighbours; flat
///    tops report their midpoint (rounded down).
/// 2. Peaks closer than `distance` samples to a higher peak are removed,
///    highest first. A `distance` of 0 or 1 keeps everything.
/// 3. Peaks whose topographic prominence is below `min_prominence` are
///    removed.
///
/// Returned indices are ascending. `x` must not contain NaN.
pub fn find_peaks(x: &[f64], distance: usize, min_prominence: f64) -> Vec<usize> {
    let mut peaks = local_maxima(x);
    if distance > 1 {
        peaks = select_by_distance(x, &peaks, distance);
    }
    peaks
        .into_iter()
        .filter(|&p| prominence(x, p) >= min_prominence)
        .collect()
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left = i;
                let right = ahead - 1;
                peaks.push((left + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let mut keep = vec![true; n];
    let mut by_height: Vec<usize> = (0..n).collect();
    by_height.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Height of the peak above the higher of the two lowest points reachable
/// on either side before climbing above the peak.
fn prominence(x: &[f64], peak: usize) -> f64 {
    let height = x[peak];

    let mut left_min = height;
    let mut i = peak;
    loop {
        if x[i] > height {
            break;
        }
        left_min = left_min.min(x[i]);
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = height;
    for &v in &x[peak..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}
