/// Round a GINI value to the nearest integer.
///
/// Ties go to the even neighbour, matching the x87 FPU default rounding
/// mode (`fistp` with the control word untouched). Out-of-range values
/// saturate and NaN becomes 0.
#[no_mangle]
pub extern "C" fn process_gini_float(gini_value: f32) -> i32 {
    gini_value.round_ties_even() as i32
}
