use crate::railway::connectable::StationId;
use crate::railway::signalling::{ControllerId, SignalStatus};
use crate::railway::train::TrainId;

/// Something observable happened in the world during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum MapLogEvent {
    SignalStatus(ControllerId, SignalStatus),
    Arrived(TrainId, StationId),
    Departed(TrainId, StationId),
    EmergencyStop(TrainId),
    Relayed { from: TrainId, to: TrainId },
    RelayDropped { from: TrainId },
    Finished(TrainId),
}

pub type MapLogger = Box<dyn Fn(MapLogEvent)>;

/// Collected events, one list per tick.
#[derive(Debug, Default)]
pub struct History {
    pub ticks: Vec<(f64, Vec<MapLogEvent>)>,
}

impl History {
    pub fn events(&self) -> impl Iterator<Item = &MapLogEvent> + '_ {
        self.ticks.iter().flat_map(|(_, evs)| evs.iter())
    }

    /// Total simulated time covered by the history.
    pub fn duration(&self) -> f64 {
        self.ticks.iter().map(|(dt, _)| *dt).sum()
    }
}
