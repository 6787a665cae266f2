//! Advancing the world by one time step.
//!
//! Each train is driven along its directed route: the engine integrates,
//! the distance covered moves the train through the route nodes, and
//! trackside equipment passed on the way is read. Signals are then set
//! from the new block occupancy.

use log::*;
use ordered_float::OrderedFloat;

use crate::output::history::MapLogEvent;
use super::connectable::{Connectable, StationId};
use super::constants::*;
use super::engine::TrainObjective;
use super::map::GlobalMap;
use super::placeable::{PlaceableId, PlaceableKind};
use super::radio::RadioSignal;
use super::signalling::{block_status, update_signals, SignalStatus};
use super::track::TrackId;
use super::train::{Location, TrainId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StopReason {
    Station,
    RouteEnd,
    Signal,
}

impl GlobalMap {
    /// Advances every train by `dt` seconds in handle order, then sets
    /// each controller from block occupancy.
    pub fn tick(&mut self, dt: f64) {
        for train in 0..self.trains.len() {
            self.tick_train(train, dt);
        }
        update_signals(self);
    }

    fn tick_train(&mut self, train: TrainId, dt: f64) {
        let route = match (self.trains[train].journey, self.trains[train].location) {
            (Some(j), Some(l)) if !self.trains[train].finished => {
                let route = self.journeys[j].route(&self.journey_paths);
                if l.step < route.len() { Some((j, l, route)) } else { None }
            }
            _ => None,
        };
        let (journey, mut loc, route) = match route {
            Some(r) => r,
            None => {
                let engine = &mut self.trains[train].engine;
                engine.tick(dt);
                engine.last_distance_travelled();
                return;
            }
        };
        let forward = self.journeys[journey].forward;

        let dwelling = self.dwell(train, &route, loc.step, dt);
        // Braking past standstill integrates to less than the stopping
        // distance; the train never moves backwards.
        let mut dx = {
            let engine = &mut self.trains[train].engine;
            engine.tick(dt);
            engine.last_distance_travelled().max(0.0)
        };
        if dwelling {
            return;
        }

        loop {
            let node = route[loc.step];
            let length = self.connectable_length(node);
            let from = loc.offset;
            if dx >= length - loc.offset {
                dx -= length - loc.offset;
                loc.travelled += length - loc.offset;
                loc.offset = length;
            } else {
                loc.offset += dx;
                loc.travelled += dx;
                dx = 0.0;
            }
            self.trains[train].location = Some(loc);
            if let Connectable::Track(track) = node {
                self.pass_placeables(train, track, forward, from, loc.offset);
            }
            if loc.offset < length {
                break;
            }

            if loc.step + 1 >= route.len() {
                self.finish(train);
                break;
            }
            if let Connectable::Track(next) = route[loc.step + 1] {
                if block_status(self, next) == Some(SignalStatus::Red) {
                    self.stop_at_signal(train);
                    break;
                }
            }

            loc.step += 1;
            loc.offset = 0.0;
            self.trains[train].location = Some(loc);
            match route[loc.step] {
                Connectable::Station(station) => {
                    self.arrive(train, station);
                    if loc.step + 1 >= route.len() {
                        self.finish(train);
                    }
                    break;
                }
                Connectable::Track(track) => {
                    let condition = self.tracks[track].line_condition;
                    self.trains[train].engine.set_line_condition(condition);
                }
                Connectable::Switch(_) => {}
            }
        }

        if !self.trains[train].finished {
            self.supervise(train, &route, loc);
        }
    }

    /// Dwell handling for a train stopped at a station. Returns true while
    /// the train stays; departs it once the wait is over and the next
    /// block is clear. A train whose route ends here finishes instead.
    fn dwell(&mut self, train: TrainId, route: &[Connectable], step: usize, dt: f64) -> bool {
        let station = match route[step] {
            Connectable::Station(s) => s,
            _ => return false,
        };
        if self.trains[train].engine.objective() != TrainObjective::Stop {
            return false;
        }
        if step + 1 >= route.len() {
            // The route ends where the train stands.
            self.finish(train);
            return true;
        }
        self.trains[train].dwell += dt;
        if self.trains[train].dwell < self.stations[station].wait {
            return true;
        }
        let clear = match route.get(step + 1) {
            Some(&Connectable::Track(t)) => block_status(self, t) != Some(SignalStatus::Red),
            _ => true,
        };
        if !clear {
            return true;
        }

        let t = &mut self.trains[train];
        t.dwell = 0.0;
        t.alerted = false;
        t.engine.set_objective(TrainObjective::Proceed);
        let speed = t.engine.last_advisory_speed();
        t.engine.set_target_speed(speed);
        self.stations[station].left_train(train);
        info!("train {} departed station {}", self.trains[train].id, self.stations[station].id);
        self.log(MapLogEvent::Departed(train, station));
        false
    }

    fn arrive(&mut self, train: TrainId, station: StationId) {
        if self.stations[station].is_full() {
            warn!("station {} is over capacity", self.stations[station].id);
        }
        self.stations[station].entered_train(train);
        let t = &mut self.trains[train];
        t.engine.emergency_break();
        t.engine.set_objective(TrainObjective::Stop);
        t.dwell = 0.0;
        t.held = false;
        info!("train {} arrived at station {}", self.trains[train].id, self.stations[station].id);
        self.log(MapLogEvent::Arrived(train, station));
    }

    fn finish(&mut self, train: TrainId) {
        let t = &mut self.trains[train];
        t.finished = true;
        t.held = false;
        t.engine.set_objective(TrainObjective::Stop);
        t.engine.set_target_speed(0.0);
        info!("train {} finished its journey", t.id);
        self.log(MapLogEvent::Finished(train));
    }

    /// The train has reached a red main signal.
    fn stop_at_signal(&mut self, train: TrainId) {
        let t = &mut self.trains[train];
        if t.engine.speed() > 0.0 {
            debug!("train {} stopped at a red signal at speed {}", t.id, t.engine.speed());
            t.engine.emergency_break();
        }
        t.engine.set_objective(TrainObjective::Stop);
        t.held = true;
    }

    /// Reads the placeables whose position along the direction of travel
    /// lies in `[from, to)`.
    fn pass_placeables(&mut self, train: TrainId, track: TrackId, forward: bool, from: f64, to: f64) {
        if to <= from {
            return;
        }
        let t = &self.tracks[track];
        let mut passed: Vec<(OrderedFloat<f64>, PlaceableId)> = t.placeables()
            .filter_map(|(index, p)| {
                let start = t.section_offset(index);
                let at = if forward {
                    start
                } else {
                    t.length() - (start + t.sections()[index].length)
                };
                if at >= from && at < to { Some((OrderedFloat(at), p)) } else { None }
            })
            .collect();
        passed.sort();
        for (_, p) in passed {
            self.read_placeable(train, p);
        }
    }

    fn read_placeable(&mut self, train: TrainId, placeable: PlaceableId) {
        match self.placeables[placeable].kind {
            PlaceableKind::PassiveBalise { advisory_speed } => {
                let t = &mut self.trains[train];
                t.engine.set_last_advisory_speed(advisory_speed);
                if t.engine.objective() == TrainObjective::Proceed && !t.held {
                    t.engine.set_target_speed(advisory_speed);
                }
            }
            PlaceableKind::ActiveBalise { broken: false } => {
                self.trains[train].engine.calibrate();
            }
            PlaceableKind::ActiveBalise { broken: true } => {
                debug!("train {} passed broken balise {}", self.trains[train].id,
                       self.placeables[placeable].id);
            }
            PlaceableKind::Obstacle => {
                warn!("train {} ran onto obstacle {}", self.trains[train].id,
                      self.placeables[placeable].id);
                let t = &mut self.trains[train];
                t.engine.emergency_break();
                t.engine.set_objective(TrainObjective::Stop);
                t.alerted = true;
                let radio = t.engine.has_radio();
                self.log(MapLogEvent::EmergencyStop(train));
                if radio {
                    self.relay_to_train_behind(train, RadioSignal::EmergencyStop);
                }
            }
        }
    }

    fn stop_reason(&self, route: &[Connectable], step: usize) -> Option<StopReason> {
        match route.get(step + 1) {
            None => Some(StopReason::RouteEnd),
            Some(&Connectable::Station(_)) => Some(StopReason::Station),
            Some(&Connectable::Track(t)) if block_status(self, t) == Some(SignalStatus::Red) => {
                Some(StopReason::Signal)
            }
            Some(_) => None,
        }
    }

    /// Stop-point supervision after the train has moved.
    fn supervise(&mut self, train: TrainId, route: &[Connectable], loc: Location) {
        let node = route[loc.step];
        if node.station().is_some()
            && self.trains[train].engine.objective() == TrainObjective::Stop {
            return;
        }
        let remaining = self.connectable_length(node) - loc.offset;
        let reason = self.stop_reason(route, loc.step);
        let t = &mut self.trains[train];

        if t.held && reason != Some(StopReason::Signal) {
            debug!("train {} released", t.id);
            t.held = false;
            t.engine.set_objective(TrainObjective::Proceed);
            let speed = t.engine.last_advisory_speed();
            t.engine.set_target_speed(speed);
        }
        if t.alerted && t.engine.speed() == 0.0 {
            debug!("train {} proceeds on sight", t.id);
            t.alerted = false;
            t.engine.set_objective(TrainObjective::Proceed);
            t.engine.roll();
        }

        let reason = match reason {
            Some(r) => r,
            None => return,
        };
        if remaining > t.engine.braking_distance() + STOP_MARGIN {
            return;
        }
        match reason {
            StopReason::Signal => {
                if !t.held {
                    t.held = true;
                    t.engine.set_objective(TrainObjective::Stop);
                    t.engine.set_target_speed(0.0);
                }
            }
            StopReason::Station | StopReason::RouteEnd => {
                if t.engine.speed() > ROLLING_SPEED {
                    if t.engine.target_speed() != 0.0 {
                        t.engine.set_target_speed(0.0);
                    }
                } else if !t.alerted && t.engine.target_speed() != ROLLING_SPEED {
                    t.engine.roll();
                }
            }
        }
    }
}
