use super::constants::*;
use super::track::LineCondition;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrainObjective {
    Proceed,
    Stop,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DistanceVelocity {
    pub dx: f64,
    pub v: f64,
}

/// Constant-acceleration update over `dt` seconds. The distance is the
/// plain integral, so a tick braking past standstill reports less than the
/// stopping distance and may be negative. Velocity never goes below zero.
pub fn dynamic_update(velocity: f64, acceleration: f64, dt: f64) -> DistanceVelocity {
    DistanceVelocity {
        dx: velocity * dt + 0.5 * acceleration * dt * dt,
        v: (velocity + acceleration * dt).max(0.0),
    }
}

/// Kinematic state of one train.
#[derive(Debug, Clone)]
pub struct Engine {
    max_deceleration: f64,
    normal_acceleration: f64,
    normal_deceleration: f64,

    speed: f64,
    acceleration: f64,
    target_speed: f64,

    last_distance_travelled: f64,
    total_distance_travelled: f64,
    measured_distance_travelled: f64,

    objective: TrainObjective,
    last_advisory_speed: f64,
    inaccuracy_rate: f64,
    line_condition: LineCondition,
    radio: bool,
}

impl Default for Engine {
    fn default() -> Engine {
        Engine {
            max_deceleration: MAX_TRAIN_DECELERATION,
            normal_acceleration: NORMAL_TRAIN_ACCELERATION,
            normal_deceleration: NORMAL_TRAIN_DECELERATION,
            speed: 0.0,
            acceleration: 0.0,
            target_speed: 0.0,
            last_distance_travelled: 0.0,
            total_distance_travelled: 0.0,
            measured_distance_travelled: 0.0,
            objective: TrainObjective::Proceed,
            last_advisory_speed: DEFAULT_SET_OFF_SPEED,
            inaccuracy_rate: TRAIN_DISTANCE_MEASUREMENT_INACCURACY_RATE,
            line_condition: LineCondition::default(),
            radio: false,
        }
    }
}

impl Engine {
    pub fn new() -> Engine {
        Default::default()
    }

    /// Advances the engine by `time` seconds.
    pub fn tick(&mut self, time: f64) {
        let update = dynamic_update(self.speed, self.acceleration, time);
        self.last_distance_travelled += update.dx;
        self.total_distance_travelled += update.dx;
        self.measured_distance_travelled += update.dx * (1.0 + self.inaccuracy_rate);

        self.speed = update.v;
        if self.speed == 0.0 && self.acceleration < 0.0 {
            self.acceleration = 0.0;
        }
        self.update_acceleration();
    }

    fn update_acceleration(&mut self) {
        let difference = self.target_speed - self.speed;
        if self.target_speed > 0.0 && difference.abs() < 0.5 {
            self.acceleration = 0.0;
        } else if difference < 0.0 && self.acceleration >= 0.0 {
            self.acceleration = self.normal_deceleration * self.line_condition.deceleration;
        } else if difference > 0.0 && self.acceleration <= 0.0 {
            self.acceleration = self.normal_acceleration * self.line_condition.acceleration;
        }
    }

    pub fn set_target_speed(&mut self, target_speed: f64) {
        self.target_speed = target_speed;
        self.update_acceleration();
    }

    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    pub fn roll(&mut self) {
        self.set_target_speed(ROLLING_SPEED);
    }

    pub fn emergency_break(&mut self) {
        self.target_speed = 0.0;
        self.acceleration = self.max_deceleration;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn set_acceleration_rate(&mut self, a: f64) {
        self.normal_acceleration = a;
    }

    /// The rate is stored negative whatever sign it is given with.
    pub fn set_breaking_rate(&mut self, a: f64) {
        self.normal_deceleration = -a.abs();
    }

    pub fn normal_deceleration(&self) -> f64 {
        self.normal_deceleration * self.line_condition.deceleration
    }

    pub fn max_deceleration(&self) -> f64 {
        self.max_deceleration
    }

    pub fn set_line_condition(&mut self, line_condition: LineCondition) {
        self.line_condition = line_condition;
    }

    /// Distance travelled since the last call.
    pub fn last_distance_travelled(&mut self) -> f64 {
        let dist = self.last_distance_travelled;
        self.last_distance_travelled = 0.0;
        dist
    }

    pub fn total_distance_travelled(&self) -> f64 {
        self.total_distance_travelled
    }

    /// Distance as the train's odometry believes it, drifting by the
    /// inaccuracy rate since the last calibration.
    pub fn measured_distance_travelled(&self) -> f64 {
        self.measured_distance_travelled
    }

    pub fn calibrate(&mut self) {
        self.measured_distance_travelled = self.total_distance_travelled;
    }

    /// Stopping distance at normal deceleration from the current speed.
    pub fn braking_distance(&self) -> f64 {
        self.speed * self.speed / (2.0 * -self.normal_deceleration())
    }

    pub fn is_breaking(&self) -> bool {
        self.acceleration < 0.0
    }

    pub fn is_accelerating(&self) -> bool {
        self.acceleration > 0.0
    }

    pub fn is_still(&self) -> bool {
        self.acceleration == 0.0
    }

    pub fn is_stopped(&self) -> bool {
        self.is_still() && self.speed == 0.0
    }

    pub fn set_objective(&mut self, objective: TrainObjective) {
        self.objective = objective;
    }

    pub fn objective(&self) -> TrainObjective {
        self.objective
    }

    pub fn last_advisory_speed(&self) -> f64 {
        self.last_advisory_speed
    }

    pub fn set_last_advisory_speed(&mut self, speed: f64) {
        self.last_advisory_speed = speed;
    }

    pub fn inaccuracy_rate(&self) -> f64 {
        self.inaccuracy_rate
    }

    pub fn set_inaccuracy_rate(&mut self, rate: f64) {
        self.inaccuracy_rate = rate;
    }

    pub fn connect_radio(&mut self) {
        self.radio = true;
    }

    pub fn has_radio(&self) -> bool {
        self.radio
    }
}
