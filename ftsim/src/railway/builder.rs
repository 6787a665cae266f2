//! World assembly.
//!
//! Turns a `WorldDescription` into a fully initialised `GlobalMap`. Groups
//! are read in a fixed order, each entity referring only to entities of
//! earlier groups, and then the derived layout is computed: seating,
//! topology, signals, balises, track pairs, radio and ids.

use failure::Fail;
use log::*;

use crate::input::description::*;
use super::config::{Configuration, SignallingMode};
use super::connectable::{Connectable, Station, Switch};
use super::constants::DEFAULT_SET_OFF_SPEED;
use super::engine::TrainObjective;
use super::graph::GraphError;
use super::map::GlobalMap;
use super::placeable::Placeable;
use super::signalling::{set_signals, SignallingError};
use super::track::{LineCondition, PlacementError, Track, TrackId};
use super::train::Train;

#[derive(Debug, Fail)]
pub enum BuildError {
    #[fail(display = "invalid id \"{}\" in group {}", id, group)]
    InvalidId { group: &'static str, id: String },
    #[fail(display = "{} {}: {}", group, id, error)]
    Attribute {
        group: &'static str,
        id: i64,
        #[cause]
        error: AttributeError,
    },
    #[fail(display = "invalid journeyPath path-element type: {}", _0)]
    UnknownElementType(String),
    #[fail(display = "unknown placeable type: {}", _0)]
    UnknownPlaceableType(String),
    #[fail(display = "{} {} refers to unknown {} {}", group, id, kind, reference)]
    UnknownReference {
        group: &'static str,
        id: i64,
        kind: &'static str,
        reference: i64,
    },
    #[fail(display = "journey {} runs on journey path {}, which is empty", journey, path)]
    EmptyJourneyPath { journey: i64, path: i64 },
    #[fail(display = "journey {} is for train {}, which already has a journey", journey, train)]
    TrainAlreadyAssigned { journey: i64, train: i64 },
    #[fail(display = "journey {} has repeat {}, only single journeys are supported", journey, repeat)]
    UnsupportedRepeat { journey: i64, repeat: i64 },
    #[fail(display = "placing placeable {} on track {}: {}", placeable, track, error)]
    Placement {
        placeable: i64,
        track: i64,
        #[cause]
        error: PlacementError,
    },
    #[fail(display = "{}", _0)]
    Signalling(#[cause] SignallingError),
    #[fail(display = "{}", _0)]
    Graph(#[cause] GraphError),
}

impl From<SignallingError> for BuildError {
    fn from(e: SignallingError) -> BuildError {
        BuildError::Signalling(e)
    }
}

impl From<GraphError> for BuildError {
    fn from(e: GraphError) -> BuildError {
        BuildError::Graph(e)
    }
}

fn attr<T>(group: &'static str, id: i64, r: Result<T, AttributeError>) -> Result<T, BuildError> {
    r.map_err(|e| BuildError::Attribute { group: group, id: id, error: e })
}

/// Non-negative integer attribute.
fn get_count(attrs: &Attributes, key: &str) -> Result<usize, AttributeError> {
    let n = get_int(attrs, key)?;
    if n < 0 {
        return Err(AttributeError::WrongType {
            key: key.to_string(),
            expected: "a non-negative integer",
            found: Value::Int(n),
        });
    }
    Ok(n as usize)
}

/// Group entries with parsed ids. Explicit entries (positive ids) come
/// first, then template entries, each in ascending id order.
fn entries<'a>(name: &'static str, group: &'a Group) -> Result<Vec<(i64, &'a Attributes)>, BuildError> {
    let mut list = group.iter()
        .map(|(key, attrs)| match key.trim().parse::<i64>() {
            Ok(id) => Ok((id, attrs)),
            Err(_) => Err(BuildError::InvalidId { group: name, id: key.clone() }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    list.sort_by_key(|&(id, _)| (id <= 0, id));
    Ok(list)
}

fn kind_name(kind: &str) -> &'static str {
    match kind {
        "track" => "track",
        "switch" => "switch",
        _ => "station",
    }
}

pub struct MapBuilder {
    map: GlobalMap,
}

impl MapBuilder {
    /// Assembles a world. Any configuration or topology error aborts the
    /// build; branching roots only degrade the balise layout, recorded in
    /// `GlobalMap::report`.
    pub fn build(name: &str, description: &WorldDescription) -> Result<GlobalMap, BuildError> {
        let mut configuration = Configuration::default();
        for (key, value) in &description.simulation {
            configuration.add_configuration(key, value.clone());
        }
        let mut builder = MapBuilder { map: GlobalMap::new(name, configuration) };

        info!("Loading map {}", name);
        builder.create_tracks(&description.tracks)?;
        builder.create_stations(&description.stations)?;
        builder.create_placeables(&description.placeables)?;
        builder.create_switches(&description.switches)?;
        builder.create_journey_paths(&description.journey_paths)?;
        builder.create_trains(&description.trains)?;
        builder.create_journeys(&description.journeys)?;

        builder.setup_world()?;
        info!("Map {} assembled: {:?}", name, builder.map);
        Ok(builder.map)
    }

    fn track_ref(&self, group: &'static str, id: i64, reference: i64) -> Result<TrackId, BuildError> {
        self.map.names.tracks.get(reference).ok_or(BuildError::UnknownReference {
            group: group,
            id: id,
            kind: "track",
            reference: reference,
        })
    }

    fn create_tracks(&mut self, group: &Group) -> Result<(), BuildError> {
        let mut pairs = Vec::new();
        for (id, attrs) in entries("tracks", group)? {
            let num_sections = attr("tracks", id, get_count(attrs, "numSections"))?;
            let mut track = Track::new(num_sections);
            track.line_condition = LineCondition {
                acceleration: attr("tracks", id, get_float_or(attrs, "acceleration", track.line_condition.acceleration))?,
                deceleration: attr("tracks", id, get_float_or(attrs, "deceleration", track.line_condition.deceleration))?,
            };
            let handle = self.map.add_track(id, track);
            let pair = attr("tracks", id, get_int_or(attrs, "pairID", 0))?;
            if pair > 0 {
                pairs.push((id, handle, pair));
            }
        }
        for (id, handle, pair) in pairs {
            let other = self.track_ref("tracks", id, pair)?;
            self.map.add_track_pair(handle, other);
        }
        debug!("created {} tracks", self.map.tracks.len());
        Ok(())
    }

    fn create_stations(&mut self, group: &Group) -> Result<(), BuildError> {
        for (id, attrs) in entries("stations", group)? {
            let capacity = attr("stations", id, get_count(attrs, "capacity"))?;
            let wait = attr("stations", id, get_float(attrs, "wait"))?;
            self.map.add_station(id, Station::new(capacity, wait));
        }
        Ok(())
    }

    fn create_placeables(&mut self, group: &Group) -> Result<(), BuildError> {
        for (declared, attrs) in entries("placeables", group)? {
            let id = if declared == 0 || self.map.names.placeables.contains(declared) {
                self.map.names.placeables.next_free_id()
            } else {
                declared
            };
            let kind = attr("placeables", declared, get_str_or(attrs, "type", "fixedBalise"))?;
            let mut placeable = match kind {
                "fixedBalise" => {
                    let speed = attr("placeables", declared, get_float(attrs, "advisorySpeed"))?;
                    Placeable::passive_balise(id, speed)
                }
                "obstacle" => Placeable::obstacle(id),
                "activeBalise" => Placeable::active_balise(id),
                other => return Err(BuildError::UnknownPlaceableType(other.to_string())),
            };
            placeable.set_broken(attr("placeables", declared, get_bool_or(attrs, "broken", false))?);

            let place_on = attr("placeables", declared, get_map(attrs, "placeOn"))?;
            let track_id = attr("placeables", declared, get_int(place_on, "track"))?;
            let section = attr("placeables", declared, get_count(place_on, "section"))?;
            let track = self.track_ref("placeables", declared, track_id)?;
            self.place(id, placeable, track, section)?;
        }
        Ok(())
    }

    fn place(&mut self, id: i64, placeable: Placeable, track: TrackId, section: usize)
        -> Result<(), BuildError> {
        if let Some(old) = self.map.tracks[track].placeable_at(section) {
            warn!("placeable {} replaces placeable {} on track {} section {}",
                  id, self.map.placeables[old].id, self.map.names.tracks.id(track), section);
        }
        self.map.add_placeable(id, placeable, track, section).map_err(|e| BuildError::Placement {
            placeable: id,
            track: self.map.names.tracks.id(track),
            error: e,
        })?;
        Ok(())
    }

    fn create_switches(&mut self, group: &Group) -> Result<(), BuildError> {
        for (id, attrs) in entries("switches", group)? {
            let mut legs = Vec::new();
            for key in &["left", "right"] {
                let leg = attr("switches", id, get_int_list(attrs, key))?
                    .into_iter()
                    .map(|t| self.track_ref("switches", id, t))
                    .collect::<Result<Vec<_>, _>>()?;
                legs.push(leg);
            }
            let status_left = attr("switches", id, get_count(attrs, "statusLeft"))?;
            let status_right = attr("switches", id, get_count(attrs, "statusRight"))?;
            let right = legs.pop().unwrap_or_default();
            let left = legs.pop().unwrap_or_default();
            self.map.add_switch(id, Switch::new(left, right, status_left, status_right));
        }
        Ok(())
    }

    fn create_journey_paths(&mut self, group: &Group) -> Result<(), BuildError> {
        for (id, attrs) in entries("journeyPaths", group)? {
            let mut path = Vec::new();
            for element in attr("journeyPaths", id, get_list(attrs, "path"))? {
                let element = match element.as_map() {
                    Some(m) => m,
                    None => {
                        return Err(BuildError::Attribute {
                            group: "journeyPaths",
                            id: id,
                            error: AttributeError::WrongType {
                                key: "path".to_string(),
                                expected: "a list of maps",
                                found: element.clone(),
                            },
                        })
                    }
                };
                let reference = attr("journeyPaths", id, get_int(element, "id"))?;
                let kind = attr("journeyPaths", id, get_str_or(element, "type", ""))?;
                let names = &self.map.names;
                let connectable = match kind {
                    "track" => names.tracks.get(reference).map(Connectable::Track),
                    "switch" => names.switches.get(reference).map(Connectable::Switch),
                    "station" => names.stations.get(reference).map(Connectable::Station),
                    other => return Err(BuildError::UnknownElementType(other.to_string())),
                };
                path.push(connectable.ok_or(BuildError::UnknownReference {
                    group: "journeyPaths",
                    id: id,
                    kind: kind_name(kind),
                    reference: reference,
                })?);
            }
            let is_dual = attr("journeyPaths", id, get_bool_or(attrs, "isDual", false))?;
            self.map.add_journey_path(id, path, is_dual);
        }
        Ok(())
    }

    fn create_trains(&mut self, group: &Group) -> Result<(), BuildError> {
        for (id, attrs) in entries("trains", group)? {
            let num_cars = attr("trains", id, get_count(attrs, "numCars"))?;
            if id < 0 {
                let count = attr("trains", id, get_count(attrs, "count"))?;
                for _ in 0..count {
                    let new_id = self.map.names.trains.next_free_id();
                    self.map.add_train(new_id, Train::new(num_cars));
                }
                debug!("spawned {} trains from template {}", count, id);
            } else {
                self.map.add_train(id, Train::new(num_cars));
            }
        }
        Ok(())
    }

    fn create_journeys(&mut self, group: &Group) -> Result<(), BuildError> {
        for (id, attrs) in entries("journeys", group)? {
            let path_id = attr("journeys", id, get_int(attrs, "path"))?;
            let path = self.map.names.journey_paths.get(path_id).ok_or(BuildError::UnknownReference {
                group: "journeys",
                id: id,
                kind: "journey path",
                reference: path_id,
            })?;
            if self.map.journey_paths[path].path.is_empty() {
                return Err(BuildError::EmptyJourneyPath { journey: id, path: path_id });
            }
            let forward = attr("journeys", id, get_bool_or(attrs, "isForward", true))?;

            if id <= 0 {
                let repeat = attr("journeys", id, get_int_or(attrs, "repeat", 1))?;
                if repeat != 1 {
                    return Err(BuildError::UnsupportedRepeat { journey: id, repeat: repeat });
                }
                let ratio = attr("journeys", id, get_float_or(attrs, "ratio", 1.0))?;
                let limit = (self.map.trains.len() as f64 * ratio).round().max(0.0) as usize;
                let free: Vec<_> = self.map.names.trains.iter()
                    .map(|(_, handle)| handle)
                    .filter(|h| self.map.trains[*h].journey.is_none())
                    .take(limit)
                    .collect();
                for train in free {
                    let journey_id = self.map.names.journeys.next_free_id();
                    debug!("journey {} on path {} for train {}, forward {}",
                           journey_id, path_id, self.map.names.trains.id(train), forward);
                    self.map.add_journey(journey_id, path, train, forward);
                }
            } else {
                let train_id = attr("journeys", id, get_int(attrs, "train"))?;
                let train = self.map.names.trains.get(train_id).ok_or(BuildError::UnknownReference {
                    group: "journeys",
                    id: id,
                    kind: "train",
                    reference: train_id,
                })?;
                if self.map.trains[train].journey.is_some() {
                    return Err(BuildError::TrainAlreadyAssigned { journey: id, train: train_id });
                }
                self.map.add_journey(id, path, train, forward);
            }
        }
        Ok(())
    }

    fn setup_world(&mut self) -> Result<(), BuildError> {
        self.set_trains_at_stations();
        self.build_graph();
        set_signals(&mut self.map)?;
        if self.map.configuration.signalling_mode() == SignallingMode::VariableBlock {
            self.create_active_balises()?;
        }
        self.init_balise_positions()?;
        self.pair_tracks();
        self.set_radio_mast();
        self.set_ids();
        Ok(())
    }

    /// Trains starting at a station wait there; the others set off.
    fn set_trains_at_stations(&mut self) {
        for j in 0..self.map.journeys.len() {
            let train = self.map.journeys[j].train;
            match self.map.journeys[j].start(&self.map.journey_paths) {
                Some(Connectable::Station(s)) => {
                    self.map.stations[s].entered_train(train);
                    self.map.trains[train].engine.set_objective(TrainObjective::Stop);
                }
                Some(c) => {
                    if let Connectable::Track(t) = c {
                        let condition = self.map.tracks[t].line_condition;
                        self.map.trains[train].engine.set_line_condition(condition);
                    }
                    self.map.trains[train].engine.set_target_speed(DEFAULT_SET_OFF_SPEED);
                }
                None => warn!("journey {} has an empty path", self.map.journeys[j].id),
            }
        }
    }

    fn build_graph(&mut self) {
        let GlobalMap { ref mut graph, ref journey_paths, .. } = self.map;
        for path in journey_paths {
            let mut previous = None;
            for c in &path.path {
                graph.add_edge(previous, *c);
                previous = Some(*c);
            }
        }
        graph.build_graph();
    }

    fn degrade(&mut self, root: Connectable, error: &GraphError) {
        error!("Map {} has an unsupported topology from {:?}: {}", self.map.name, root, error);
        if !self.map.report.degraded_roots.contains(&root) {
            self.map.report.degraded_roots.push(root);
        }
    }

    fn create_active_balises(&mut self) -> Result<(), BuildError> {
        let spacing = self.map.configuration.get_int("ferromone_distance").unwrap_or(0);
        if spacing <= 0 {
            warn!("ferromone_distance {} leaves the line without active balises", spacing);
            return Ok(());
        }
        let failure = self.map.configuration.get_int("gsm_failure_rate").unwrap_or(0).max(0).min(100) as u32;

        for root in self.map.graph.root_connectables()? {
            let run: Vec<_> = self.map.graph.iter(root)?.collect();
            let mut length = 0.0;
            for node in run {
                let node = match node {
                    Ok(n) => n,
                    Err(e) => {
                        self.map.report.active_balises_complete = false;
                        self.degrade(root, &e);
                        break;
                    }
                };
                if let Connectable::Track(t) = node {
                    let track = &self.map.tracks[t];
                    if track.length() > spacing as f64
                        && track.active_balises(&self.map.placeables).is_empty() {
                        match self.map.track_pair_of(t) {
                            Some(pair) if !self.map.tracks[pair].active_balises(&self.map.placeables).is_empty() => {
                                self.copy_active_balises(pair, t)?;
                            }
                            _ => {
                                let broken = failure > 0 && self.map.disruptor.should_disrupt(failure);
                                self.place_active_balises_on_track(t, length == 0.0, spacing as usize, broken)?;
                            }
                        }
                    }
                }
                length += self.map.connectable_length(node);
            }
        }
        Ok(())
    }

    /// One active balise every `spacing` sections. The first slot of a
    /// run is left empty.
    fn place_active_balises_on_track(&mut self, track: TrackId, run_start: bool, spacing: usize, broken: bool)
        -> Result<(), BuildError> {
        let sections = self.map.tracks[track].sections().len();
        for index in (0..sections).step_by(spacing) {
            if run_start && index == 0 {
                continue;
            }
            if self.map.tracks[track].placeable_at(index).is_some() {
                continue;
            }
            let id = self.map.names.placeables.next_free_id();
            let mut balise = Placeable::active_balise(id);
            balise.set_broken(broken);
            self.place(id, balise, track, index)?;
            debug!("placed active balise on track {} section {}", self.map.names.tracks.id(track), index);
        }
        Ok(())
    }

    /// Mirrors the active balise layout of `from` onto its pair.
    fn copy_active_balises(&mut self, from: TrackId, to: TrackId) -> Result<(), BuildError> {
        let layout: Vec<(usize, bool)> = self.map.tracks[from].placeables()
            .filter(|&(_, p)| self.map.placeables[p].is_active_balise())
            .map(|(index, p)| (index, self.map.placeables[p].is_broken()))
            .collect();
        let sections = self.map.tracks[to].sections().len();
        for (index, broken) in layout {
            if index >= sections || self.map.tracks[to].placeable_at(index).is_some() {
                continue;
            }
            let id = self.map.names.placeables.next_free_id();
            let mut balise = Placeable::active_balise(id);
            balise.set_broken(broken);
            self.place(id, balise, to, index)?;
        }
        debug!("copied active balises from track {} to track {}",
               self.map.names.tracks.id(from), self.map.names.tracks.id(to));
        Ok(())
    }

    fn init_balise_positions(&mut self) -> Result<(), BuildError> {
        for root in self.map.graph.root_connectables()? {
            let run: Vec<_> = self.map.graph.iter(root)?.collect();
            let mut length = 0.0;
            for node in run {
                let node = match node {
                    Ok(n) => n,
                    Err(e) => {
                        self.map.report.balise_positions_complete = false;
                        self.degrade(root, &e);
                        break;
                    }
                };
                if let Connectable::Track(t) = node {
                    let track = &self.map.tracks[t];
                    let positions: Vec<_> = track.placeables()
                        .filter(|&(_, p)| self.map.placeables[p].is_balise())
                        .map(|(index, p)| (p, length + track.section_offset(index)))
                        .collect();
                    for (p, position) in positions {
                        self.map.placeables[p].position = Some(position);
                    }
                }
                length += self.map.connectable_length(node);
            }
        }
        if self.map.report.balise_positions_complete {
            info!("Balises initialised successfully for map {}", self.map.name);
        }
        Ok(())
    }

    fn pair_tracks(&mut self) {
        let pairs: Vec<_> = self.map.track_pairs.iter().map(|(a, b)| (*a, *b)).collect();
        for (a, b) in pairs {
            self.map.tracks[a].pair = Some(b);
            self.map.tracks[b].pair = Some(a);
        }
    }

    fn set_radio_mast(&mut self) {
        let ratio = self.map.configuration.get_int("gsm_failure_rate").unwrap_or(0).max(0).min(100);
        self.map.radio_mast.set_failure_ratio(ratio as u32);
        for train in &mut self.map.trains {
            train.engine.connect_radio();
        }
    }

    fn set_ids(&mut self) {
        let GlobalMap { ref names, ref mut trains, ref mut stations, ref mut tracks, ref mut switches, .. } =
            self.map;
        for (h, t) in trains.iter_mut().enumerate() {
            t.id = names.trains.id(h);
        }
        for (h, s) in stations.iter_mut().enumerate() {
            s.id = names.stations.id(h);
        }
        for (h, t) in tracks.iter_mut().enumerate() {
            t.id = names.tracks.id(h);
        }
        for (h, s) in switches.iter_mut().enumerate() {
            s.id = names.switches.id(h);
        }
    }
}
