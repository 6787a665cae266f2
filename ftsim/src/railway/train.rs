use super::engine::{Engine, TrainObjective};
use super::journey::JourneyId;
use super::radio::RadioSignal;

pub type TrainId = usize;

/// Where a train is along its journey route.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Location {
    /// Index into the directed route.
    pub step: usize,
    /// Distance into the node at `step`.
    pub offset: f64,
    /// Distance from the start of the route.
    pub travelled: f64,
}

impl Location {
    pub fn start() -> Location {
        Location { step: 0, offset: 0.0, travelled: 0.0 }
    }
}

#[derive(Debug, Clone)]
pub struct Train {
    pub id: i64,
    pub num_cars: usize,
    pub engine: Engine,
    pub journey: Option<JourneyId>,
    pub location: Option<Location>,
    /// Time spent stopped at the current station (s).
    pub dwell: f64,
    pub finished: bool,
    /// Stopping for a red block ahead.
    pub held: bool,
    /// Emergency braked; proceeds on sight once stopped.
    pub alerted: bool,
    inbox: Vec<RadioSignal>,
}

impl Train {
    pub fn new(num_cars: usize) -> Train {
        Train {
            id: 0,
            num_cars: num_cars,
            engine: Engine::new(),
            journey: None,
            location: None,
            dwell: 0.0,
            finished: false,
            held: false,
            alerted: false,
            inbox: Vec::new(),
        }
    }

    /// Receives a radio message.
    pub fn ping(&mut self, signal: RadioSignal) {
        self.inbox.push(signal);
        match signal {
            RadioSignal::EmergencyStop => {
                self.engine.emergency_break();
                self.engine.set_objective(TrainObjective::Stop);
                self.alerted = true;
            }
            RadioSignal::Proceed => {
                if !self.held && !self.finished {
                    self.alerted = false;
                    self.engine.set_objective(TrainObjective::Proceed);
                    let speed = self.engine.last_advisory_speed();
                    self.engine.set_target_speed(speed);
                }
            }
        }
    }

    pub fn inbox(&self) -> &[RadioSignal] {
        &self.inbox
    }
}
