//! Nodes of the track network.

use smallvec::SmallVec;

use super::signalling::ControllerId;
use super::track::TrackId;
use super::train::TrainId;

pub type StationId = usize;
pub type SwitchId = usize;

/// Handle to a network node owned by the `GlobalMap`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Connectable {
    Track(TrackId),
    Station(StationId),
    Switch(SwitchId),
}

impl Connectable {
    pub fn track(&self) -> Option<TrackId> {
        match *self {
            Connectable::Track(t) => Some(t),
            _ => None,
        }
    }

    pub fn station(&self) -> Option<StationId> {
        match *self {
            Connectable::Station(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_track(&self) -> bool {
        self.track().is_some()
    }
}

#[derive(Debug)]
pub struct Station {
    pub id: i64,
    pub capacity: usize,
    /// Dwell time before a stopped train may leave (s).
    pub wait: f64,
    trains: SmallVec<[TrainId; 4]>,
    next_block: Option<(ControllerId, TrackId)>,
}

impl Station {
    pub fn new(capacity: usize, wait: f64) -> Station {
        Station {
            id: 0,
            capacity: capacity,
            wait: wait,
            trains: SmallVec::new(),
            next_block: None,
        }
    }

    pub fn length(&self) -> f64 {
        0.0
    }

    pub fn entered_train(&mut self, train: TrainId) {
        if !self.trains.contains(&train) {
            self.trains.push(train);
        }
    }

    pub fn left_train(&mut self, train: TrainId) {
        self.trains.retain(|t| *t != train);
    }

    pub fn trains(&self) -> &[TrainId] {
        &self.trains
    }

    pub fn is_full(&self) -> bool {
        self.trains.len() >= self.capacity
    }

    pub fn set_next_block_signal_controller(&mut self, controller: ControllerId, track: TrackId) {
        self.next_block = Some((controller, track));
    }

    pub fn next_block_signal_controller(&self) -> Option<(ControllerId, TrackId)> {
        self.next_block
    }
}

/// A switch joining tracks. Each leg lists candidate tracks; the status
/// selects the one currently connected.
#[derive(Debug)]
pub struct Switch {
    pub id: i64,
    pub left: Vec<TrackId>,
    pub right: Vec<TrackId>,
    pub status_left: usize,
    pub status_right: usize,
}

impl Switch {
    pub fn new(left: Vec<TrackId>, right: Vec<TrackId>, status_left: usize, status_right: usize)
        -> Switch {
        Switch {
            id: 0,
            left: left,
            right: right,
            status_left: status_left,
            status_right: status_right,
        }
    }

    pub fn length(&self) -> f64 {
        0.0
    }

    pub fn current_left(&self) -> Option<TrackId> {
        self.left.get(self.status_left).cloned()
    }

    pub fn current_right(&self) -> Option<TrackId> {
        self.right.get(self.status_right).cloned()
    }
}
