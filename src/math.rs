use num_traits::Float;

/// Rounds half away from zero to `places` decimal digits.
pub fn round_dp<T: Float>(x: T, places: i32) -> T {
    let Some(ten) = T::from(10.0) else {
        return x;
    };
    let scale = ten.powi(places);

    (x * scale).round() / scale
}
