/// US national median household income used as the reference point.
pub const NATIONAL_MEDIAN_INCOME: f64 = 74_580.0;

const MIN_MULTIPLIER: f64 = 0.6;
const MAX_MULTIPLIER: f64 = 1.4;

/// Local price level relative to the national reference.
///
/// `1 + 0.5 * ln(income / national)`, clamped to [0.6, 1.4]. Unknown or
/// non-positive income is treated as the national level.
pub fn geography_multiplier(median_income: Option<f64>) -> f64 {
    match median_income {
        Some(income) if income > 0.0 => {
            (1.0 + 0.5 * (income / NATIONAL_MEDIAN_INCOME).ln()).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
        }
        _ => 1.0,
    }
}
