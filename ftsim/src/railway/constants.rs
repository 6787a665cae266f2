//! Physical constants of the simulated railway.

/// Standard gravity (m/s^2).
pub const G: f64 = 9.81;

/// Track length needed ahead of a block entry to warn with a distant signal (m).
pub const BRAKE_DISTANCE: f64 = 20.0;

pub const DEFAULT_SECTION_LENGTH: f64 = 1.0;

pub const MAX_TRAIN_DECELERATION: f64 = -9.0 * (G / 100.0);
pub const NORMAL_TRAIN_DECELERATION: f64 = -7.0 * (G / 100.0);
pub const NORMAL_TRAIN_ACCELERATION: f64 = 1.0;

/// Speed a train creeps at when rolling up to a stopping point (m/s).
pub const ROLLING_SPEED: f64 = 1.0;
pub const DEFAULT_SET_OFF_SPEED: f64 = 10.0;

/// Positive values over-estimate the distance travelled.
pub const TRAIN_DISTANCE_MEASUREMENT_INACCURACY_RATE: f64 = 0.01;

pub const ACCELERATION_COEFFICIENT: f64 = 1.0;
pub const DECELERATION_COEFFICIENT: f64 = 1.0;

/// Extra distance kept when braking for a stopping point (m).
pub const STOP_MARGIN: f64 = 1.0;
