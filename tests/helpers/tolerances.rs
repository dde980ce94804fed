//! Comparison thresholds shared by the integration suites.

/// Gain and passthrough results are exact up to float rounding.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Peak level (about -80 dB) below which a channel counts as silent.
pub const SILENCE_THRESHOLD: f32 = 1e-4;
