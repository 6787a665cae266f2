use ordered_float::OrderedFloat;

use super::connectable::Connectable;
use super::train::{Train, TrainId};

pub type JourneyId = usize;
pub type JourneyPathId = usize;

/// Ordered sequence of network nodes. The nodes are owned by the map.
#[derive(Debug, Clone)]
pub struct JourneyPath {
    pub id: i64,
    pub path: Vec<Connectable>,
    pub is_dual: bool,
}

#[derive(Debug, Clone)]
pub struct Journey {
    pub id: i64,
    pub train: TrainId,
    pub path: JourneyPathId,
    pub forward: bool,
}

impl Journey {
    /// The path in the direction of travel.
    pub fn route(&self, paths: &[JourneyPath]) -> Vec<Connectable> {
        let path = &paths[self.path].path;
        if self.forward {
            path.clone()
        } else {
            path.iter().rev().cloned().collect()
        }
    }

    pub fn start(&self, paths: &[JourneyPath]) -> Option<Connectable> {
        let path = &paths[self.path].path;
        if self.forward { path.first().cloned() } else { path.last().cloned() }
    }
}

/// The train closest behind `train` travelling the same path in the same
/// direction, if any.
pub fn train_behind(trains: &[Train], journeys: &[Journey], train: TrainId) -> Option<TrainId> {
    let journey = &journeys[trains[train].journey?];
    let position = trains[train].location?.travelled;
    trains.iter()
        .enumerate()
        .filter(|&(i, t)| i != train && !t.finished)
        .filter_map(|(i, t)| {
            let other = &journeys[t.journey?];
            let loc = t.location?;
            if other.path == journey.path && other.forward == journey.forward
                && loc.travelled < position {
                Some((OrderedFloat(loc.travelled), i))
            } else {
                None
            }
        })
        .max()
        .map(|(_, i)| i)
}
