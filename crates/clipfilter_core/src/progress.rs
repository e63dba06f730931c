/// Normalizes frame counters into a whole percentage in `0..=100`.
///
/// A zero `total` yields 0 because the backend reports frame counts only
/// once decoding has started. `done > total` clamps to 100.
pub fn percentage(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    // round(done / total * 100), half away from zero, in integer arithmetic.
    let scaled = (u128::from(done) * 200 + u128::from(total)) / (u128::from(total) * 2);
    scaled.min(100) as u8
}
