//! Rounding of the published number of ballots.

/// Rounds a ballot count on the 2, 5, 10, 20, 50, 100, ... scale.
///
/// The count is compared to the two values of the scale that bracket it and the
/// closer one is returned. On an exact midpoint, the lower value is returned.
/// Zero stays zero, and any count up to 2 is reported as 2.
pub fn blur(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    if n <= 2 {
        return 2;
    }
    let mut lower: u64 = 2;
    let mut upper: u64 = 2;
    let mut step: usize = 0;
    while upper < n {
        lower = upper;
        upper = next_step(upper, step).unwrap_or(u64::MAX);
        step += 1;
    }
    if n - lower <= upper - n {
        lower
    } else {
        upper
    }
}

// 2 -> 5 -> 10 -> 20 -> 50 -> ...
fn next_step(value: u64, step: usize) -> Option<u64> {
    match step % 3 {
        0 => value.checked_mul(5).map(|v| v / 2),
        _ => value.checked_mul(2),
    }
}
