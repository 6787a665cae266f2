use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::output::history::{MapLogEvent, MapLogger};
use super::config::Configuration;
use super::connectable::{Connectable, Station, StationId, Switch, SwitchId};
use super::disruptor::Disruptor;
use super::graph::MapGraph;
use super::journey::{Journey, JourneyId, JourneyPath, JourneyPathId};
use super::placeable::{Placeable, PlaceableId};
use super::radio::{RadioMast, RadioSignal, Relay};
use super::signalling::{ControllerId, SignalController, SignalStatus, SignalUnit};
use super::track::{PlacementError, Track, TrackId};
use super::train::{Location, Train, TrainId};

/// Declared ids of one kind of entity and the arena handles they map to.
#[derive(Debug, Default, Clone)]
pub struct NameMap {
    by_id: BTreeMap<i64, usize>,
    ids: Vec<i64>,
}

impl NameMap {
    fn insert(&mut self, id: i64) -> usize {
        let handle = self.ids.len();
        self.ids.push(id);
        self.by_id.insert(id, handle);
        handle
    }

    pub fn get(&self, id: i64) -> Option<usize> {
        self.by_id.get(&id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Declared id of a handle.
    pub fn id(&self, handle: usize) -> i64 {
        self.ids[handle]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Smallest positive id above all declared ids.
    pub fn next_free_id(&self) -> i64 {
        self.by_id.keys().next_back().map(|m| (*m).max(0) + 1).unwrap_or(1)
    }

    /// (declared id, handle) in ascending id order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (i64, usize)> + 'a {
        self.by_id.iter().map(|(i, h)| (*i, *h))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MapNames {
    pub tracks: NameMap,
    pub stations: NameMap,
    pub switches: NameMap,
    pub placeables: NameMap,
    pub trains: NameMap,
    pub journeys: NameMap,
    pub journey_paths: NameMap,
}

/// Outcome of the per-root layout computations of world assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub balise_positions_complete: bool,
    pub active_balises_complete: bool,
    /// Roots whose run branches or loops.
    pub degraded_roots: Vec<Connectable>,
}

impl Default for BuildReport {
    fn default() -> BuildReport {
        BuildReport {
            balise_positions_complete: true,
            active_balises_complete: true,
            degraded_roots: Vec::new(),
        }
    }
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.balise_positions_complete && self.active_balises_complete
    }
}

/// The simulated world. Owns every entity; everything else refers to
/// entities by arena handle.
pub struct GlobalMap {
    pub name: String,
    pub configuration: Configuration,
    pub tracks: Vec<Track>,
    pub stations: Vec<Station>,
    pub switches: Vec<Switch>,
    pub placeables: Vec<Placeable>,
    pub trains: Vec<Train>,
    pub journeys: Vec<Journey>,
    pub journey_paths: Vec<JourneyPath>,
    pub controllers: Vec<SignalController>,
    pub graph: MapGraph,
    pub names: MapNames,
    /// Dual-line pairing records, applied at the end of assembly.
    pub track_pairs: BTreeMap<TrackId, TrackId>,
    pub disruptor: Disruptor,
    pub radio_mast: RadioMast,
    pub report: BuildReport,
    logger: Option<MapLogger>,
}

impl fmt::Debug for GlobalMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "GlobalMap {{ name: {:?}, tracks: {}, stations: {}, switches: {}, trains: {}, journeys: {} }}",
               self.name,
               self.tracks.len(),
               self.stations.len(),
               self.switches.len(),
               self.trains.len(),
               self.journeys.len())
    }
}

impl GlobalMap {
    pub fn new(name: &str, configuration: Configuration) -> GlobalMap {
        let seed = configuration.get_int("seed").unwrap_or(0) as u64;
        GlobalMap {
            name: name.to_string(),
            configuration: configuration,
            tracks: Vec::new(),
            stations: Vec::new(),
            switches: Vec::new(),
            placeables: Vec::new(),
            trains: Vec::new(),
            journeys: Vec::new(),
            journey_paths: Vec::new(),
            controllers: Vec::new(),
            graph: MapGraph::new(),
            names: MapNames::default(),
            track_pairs: BTreeMap::new(),
            disruptor: Disruptor::new(seed),
            radio_mast: RadioMast::default(),
            report: BuildReport::default(),
            logger: None,
        }
    }

    pub fn set_logger(&mut self, logger: MapLogger) {
        self.logger = Some(logger);
    }

    pub(crate) fn log(&self, event: MapLogEvent) {
        if let Some(ref logger) = self.logger {
            logger(event);
        }
    }

    pub fn is_configuration(&self, key: &str, value: &str) -> bool {
        self.configuration.is_configuration(key, value)
    }

    pub fn add_track(&mut self, id: i64, track: Track) -> TrackId {
        self.tracks.push(track);
        self.names.tracks.insert(id)
    }

    pub fn add_station(&mut self, id: i64, station: Station) -> StationId {
        self.stations.push(station);
        self.names.stations.insert(id)
    }

    pub fn add_switch(&mut self, id: i64, switch: Switch) -> SwitchId {
        self.switches.push(switch);
        self.names.switches.insert(id)
    }

    pub fn add_train(&mut self, id: i64, train: Train) -> TrainId {
        self.trains.push(train);
        self.names.trains.insert(id)
    }

    pub fn add_journey_path(&mut self, id: i64, path: Vec<Connectable>, is_dual: bool)
        -> JourneyPathId {
        self.journey_paths.push(JourneyPath { id: id, path: path, is_dual: is_dual });
        self.names.journey_paths.insert(id)
    }

    /// Binds a train to a path and puts it at the start of its route.
    pub fn add_journey(&mut self, id: i64, path: JourneyPathId, train: TrainId, forward: bool)
        -> JourneyId {
        self.journeys.push(Journey { id: id, train: train, path: path, forward: forward });
        let handle = self.names.journeys.insert(id);
        self.trains[train].journey = Some(handle);
        self.trains[train].location = Some(Location::start());
        handle
    }

    pub fn add_track_pair(&mut self, track: TrackId, pair: TrackId) {
        self.track_pairs.insert(track, pair);
    }

    /// Pairing record for a track in either direction.
    pub fn track_pair_of(&self, track: TrackId) -> Option<TrackId> {
        self.track_pairs.get(&track).cloned().or_else(|| {
            self.track_pairs.iter().find(|&(_, p)| *p == track).map(|(t, _)| *t)
        })
    }

    /// Adds a placeable to the arena and places it on a track section.
    pub fn add_placeable(&mut self, id: i64, placeable: Placeable, track: TrackId, section: usize)
        -> Result<PlaceableId, PlacementError> {
        let handle = self.placeables.len();
        self.tracks[track].place_placeable_on_section_index(handle, section)?;
        self.placeables.push(placeable);
        self.names.placeables.insert(id);
        Ok(handle)
    }

    pub fn new_signal_controller(&mut self, track: TrackId) -> ControllerId {
        let id = self.controllers.len();
        self.controllers.push(SignalController::new(id, track));
        id
    }

    pub fn signal_status(&self, unit: SignalUnit) -> SignalStatus {
        self.controllers[unit.controller].status()
    }

    pub fn track(&self, id: i64) -> Option<&Track> {
        self.names.tracks.get(id).map(|h| &self.tracks[h])
    }

    pub fn station(&self, id: i64) -> Option<&Station> {
        self.names.stations.get(id).map(|h| &self.stations[h])
    }

    pub fn switch(&self, id: i64) -> Option<&Switch> {
        self.names.switches.get(id).map(|h| &self.switches[h])
    }

    pub fn train(&self, id: i64) -> Option<&Train> {
        self.names.trains.get(id).map(|h| &self.trains[h])
    }

    pub fn journey(&self, id: i64) -> Option<&Journey> {
        self.names.journeys.get(id).map(|h| &self.journeys[h])
    }

    pub fn placeable(&self, id: i64) -> Option<&Placeable> {
        self.names.placeables.get(id).map(|h| &self.placeables[h])
    }

    pub fn connectable_length(&self, c: Connectable) -> f64 {
        match c {
            Connectable::Track(t) => self.tracks[t].length(),
            Connectable::Station(s) => self.stations[s].length(),
            Connectable::Switch(s) => self.switches[s].length(),
        }
    }

    /// The node a train is currently on.
    pub fn train_connectable(&self, train: TrainId) -> Option<Connectable> {
        let t = &self.trains[train];
        let journey = &self.journeys[t.journey?];
        let loc = t.location?;
        journey.route(&self.journey_paths).get(loc.step).cloned()
    }

    /// Tracks holding a train that is still on its journey.
    pub fn occupied_tracks(&self) -> HashSet<TrackId> {
        (0..self.trains.len())
            .filter(|t| !self.trains[*t].finished)
            .filter_map(|t| self.train_connectable(t).and_then(|c| c.track()))
            .collect()
    }

    pub fn track_has_train(&self, track: TrackId) -> bool {
        (0..self.trains.len()).any(|t| {
            !self.trains[t].finished && self.train_connectable(t) == Some(Connectable::Track(track))
        })
    }

    pub fn train_behind(&self, train: TrainId) -> Option<TrainId> {
        super::journey::train_behind(&self.trains, &self.journeys, train)
    }

    /// Sends a message through the radio mast to the train following
    /// `train` on its path.
    pub fn relay_to_train_behind(&mut self, train: TrainId, signal: RadioSignal) -> Relay {
        let relay = {
            let GlobalMap { ref mut radio_mast, ref mut trains, ref journeys, ref mut disruptor, .. } =
                *self;
            radio_mast.pass_message_to_train_behind(train, signal, trains, journeys, disruptor)
        };
        match relay {
            Relay::Delivered(to) => self.log(MapLogEvent::Relayed { from: train, to: to }),
            Relay::Dropped => self.log(MapLogEvent::RelayDropped { from: train }),
            Relay::NoTrainBehind => {}
        }
        relay
    }
}
