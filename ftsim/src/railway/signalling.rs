//! Block signalling.
//!
//! Every block (a track whose entry is gated) has one controller with a
//! main signal at the block entry and, in fixed-block mode, a distant
//! signal on the preceding track, placed so that a train passing it at
//! speed can still stop before the main signal.

use failure::Fail;
use log::*;

use crate::output::history::MapLogEvent;
use super::config::SignallingMode;
use super::connectable::Connectable;
use super::constants::BRAKE_DISTANCE;
use super::graph::GraphError;
use super::map::GlobalMap;
use super::track::{PlacementError, TrackId};

pub type ControllerId = usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignalStatus {
    Green,
    Red,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignalKind {
    Main,
    Distant,
}

/// A physical signal head showing the status of its controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SignalUnit {
    pub kind: SignalKind,
    pub controller: ControllerId,
}

#[derive(Debug, Clone)]
pub struct SignalController {
    pub track: TrackId,
    status: SignalStatus,
    main: SignalUnit,
    distant: Option<SignalUnit>,
}

impl SignalController {
    pub fn new(id: ControllerId, track: TrackId) -> SignalController {
        SignalController {
            track: track,
            status: SignalStatus::Green,
            main: SignalUnit { kind: SignalKind::Main, controller: id },
            distant: None,
        }
    }

    pub fn main_signal(&self) -> SignalUnit {
        self.main
    }

    pub fn distant_signal(&self) -> Option<SignalUnit> {
        self.distant
    }

    pub fn new_distant_signal(&mut self) -> SignalUnit {
        let unit = SignalUnit { kind: SignalKind::Distant, controller: self.main.controller };
        self.distant = Some(unit);
        unit
    }

    pub fn status(&self) -> SignalStatus {
        self.status
    }

    /// Returns true if the status changed.
    pub fn set_status(&mut self, status: SignalStatus) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }
}

#[derive(Debug, Fail)]
pub enum SignallingError {
    #[fail(display = "a station cannot be connected to non-tracks (station {}, next {:?})", station, next)]
    StationToNonTrack { station: i64, next: Connectable },
    #[fail(display = "track {} already has a signal controller", track)]
    DuplicateController { track: i64 },
    #[fail(display = "track {} of length {} is not long enough for placing distant signals", track, length)]
    TrackTooShort { track: i64, length: f64 },
    #[fail(display = "{}", _0)]
    Graph(#[cause] GraphError),
    #[fail(display = "{}", _0)]
    Placement(#[cause] PlacementError),
}

impl From<GraphError> for SignallingError {
    fn from(e: GraphError) -> SignallingError {
        SignallingError::Graph(e)
    }
}

impl From<PlacementError> for SignallingError {
    fn from(e: PlacementError) -> SignallingError {
        SignallingError::Placement(e)
    }
}

/// Section index of the distant signal on a track of the given length.
pub fn distant_signal_index(length: f64) -> usize {
    ((length - BRAKE_DISTANCE).floor() - 1.0).max(0.0) as usize
}

pub fn set_signals(map: &mut GlobalMap) -> Result<(), SignallingError> {
    if !map.graph.is_built() {
        return Err(GraphError::NotBuilt.into());
    }
    match map.configuration.signalling_mode() {
        SignallingMode::FixedBlock => {
            place_block_signals(map)?;
            place_switch_signals(map)?;
            place_station_signals(map)?;
        }
        SignallingMode::VariableBlock => {
            place_station_signals(map)?;
        }
    }
    Ok(())
}

fn attach_controller(map: &mut GlobalMap, track: TrackId, controller: ControllerId)
    -> Result<(), SignallingError> {
    let main = map.controllers[controller].main_signal();
    map.tracks[track].add_block_signal(main, 0)?;
    if map.tracks[track].add_signal_controller(controller).is_err() {
        return Err(SignallingError::DuplicateController { track: map.names.tracks.id(track) });
    }
    if map.track_has_train(track) {
        map.controllers[controller].set_status(SignalStatus::Red);
        info!("set track-{}'s signal controller status to RED", map.names.tracks.id(track));
    }
    Ok(())
}

pub fn place_block_signals(map: &mut GlobalMap) -> Result<(), SignallingError> {
    let roots = map.graph.root_connectables()?;
    debug!("roots: {:?}", roots);
    for root in roots {
        let track = map.graph.first_track(root)?.and_then(|c| c.track());
        add_block_signals_on_path(map, track, &mut Vec::new())?;
    }
    Ok(())
}

/// `walk` holds the tracks entered on the way here from the root. Coming
/// back to one of them is a loop.
fn add_block_signals_on_path(map: &mut GlobalMap, track: Option<TrackId>, walk: &mut Vec<TrackId>)
    -> Result<(), SignallingError> {
    let track = match track {
        Some(t) => t,
        None => return Ok(()),
    };
    if walk.contains(&track) {
        return Err(GraphError::Cycle { node: Connectable::Track(track) }.into());
    }
    walk.push(track);
    let result = add_block_signals_after(map, track, walk);
    walk.pop();
    result
}

fn add_block_signals_after(map: &mut GlobalMap, track: TrackId, walk: &mut Vec<TrackId>)
    -> Result<(), SignallingError> {
    let next = match map.graph.first_child(Connectable::Track(track))? {
        Some(n) => n,
        None => return Ok(()),
    };
    let next_track = match next {
        Connectable::Track(t) => t,
        other => {
            let children = map.graph.children(other)?.to_vec();
            for c in children {
                let first = map.graph.first_track(c)?.and_then(|c| c.track());
                add_block_signals_on_path(map, first, walk)?;
            }
            return Ok(());
        }
    };
    if !map.tracks[next_track].block_signals().is_empty() {
        // Paths reconverge; the block is already signalled.
        return Ok(());
    }

    let length = map.tracks[track].length();
    if length <= BRAKE_DISTANCE {
        return Err(SignallingError::TrackTooShort { track: map.names.tracks.id(track), length: length });
    }
    let controller = map.new_signal_controller(next_track);
    let distant = map.controllers[controller].new_distant_signal();
    let index = distant_signal_index(length);
    map.tracks[track].add_block_signal(distant, index)?;
    info!("added distant signal on section {} on track {}", index, map.names.tracks.id(track));
    attach_controller(map, next_track, controller)?;

    add_block_signals_on_path(map, Some(next_track), walk)
}

/// Extension point for signals guarding switches. Switch-aware
/// signalling is not modelled, so nothing is placed.
pub fn place_switch_signals(map: &mut GlobalMap) -> Result<(), SignallingError> {
    debug!("no switch signals placed for {} switches", map.switches.len());
    Ok(())
}

pub fn place_station_signals(map: &mut GlobalMap) -> Result<(), SignallingError> {
    for station in 0..map.stations.len() {
        let next = match map.graph.children(Connectable::Station(station)) {
            Ok(children) => children.first().cloned(),
            // Stations outside every journey path are not in the graph.
            Err(GraphError::UnknownNode { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        let next_track = match next {
            None => continue,
            Some(Connectable::Track(t)) => t,
            Some(other) => {
                return Err(SignallingError::StationToNonTrack {
                    station: map.names.stations.id(station),
                    next: other,
                })
            }
        };
        if map.tracks[next_track].signal_controller().is_some() {
            return Err(SignallingError::DuplicateController { track: map.names.tracks.id(next_track) });
        }
        let controller = map.new_signal_controller(next_track);
        attach_controller(map, next_track, controller)?;
        map.stations[station].set_next_block_signal_controller(controller, next_track);
        debug!("added signal controller after station {}", map.names.stations.id(station));
    }
    Ok(())
}

/// Sets every controller from block occupancy: red while a train is on
/// the guarded track, green otherwise.
pub fn update_signals(map: &mut GlobalMap) {
    let occupied = map.occupied_tracks();
    for c in 0..map.controllers.len() {
        let status = if occupied.contains(&map.controllers[c].track) {
            SignalStatus::Red
        } else {
            SignalStatus::Green
        };
        if map.controllers[c].set_status(status) {
            map.log(MapLogEvent::SignalStatus(c, status));
        }
    }
}

/// Status of the controller guarding a track, if it has one.
pub fn block_status(map: &GlobalMap, track: TrackId) -> Option<SignalStatus> {
    map.tracks[track].signal_controller().map(|c| map.controllers[c].status())
}
