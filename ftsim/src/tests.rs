use crate::*;
use crate::input::description::*;
use crate::output::history::MapLogEvent;
use crate::railway::builder::{BuildError, MapBuilder};
use crate::railway::connectable::Connectable;
use crate::railway::constants::DEFAULT_SET_OFF_SPEED;
use crate::railway::engine::TrainObjective;
use crate::railway::graph::GraphError;
use crate::railway::signalling::{SignalKind, SignalStatus, SignallingError};
use crate::railway::track::PlacementError;
use maplit::hashmap;

fn s(x: &str) -> String {
    x.to_string()
}

fn track(sections: i64) -> Attributes {
    hashmap!{ s("numSections") => Value::Int(sections) }
}

fn element(kind: &str, id: i64) -> Value {
    Value::Map(hashmap!{ s("id") => Value::Int(id), s("type") => Value::from(kind) })
}

fn path(elements: Vec<Value>) -> Attributes {
    hashmap!{ s("path") => Value::List(elements) }
}

fn fixed_block() -> std::collections::HashMap<String, Value> {
    hashmap!{ s("mode") => Value::from("fixed_block") }
}

#[test]
fn distant_signal_needs_long_track() {
    let mut desc = WorldDescription {
        simulation: fixed_block(),
        tracks: hashmap!{ s("1") => track(15), s("2") => track(25) },
        journey_paths: hashmap!{
            s("1") => path(vec![element("track", 1), element("track", 2)]),
        },
        ..Default::default()
    };
    match MapBuilder::build("short", &desc) {
        Err(BuildError::Signalling(SignallingError::TrackTooShort { track, .. })) => assert_eq!(track, 1),
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }

    desc.tracks = hashmap!{ s("1") => track(25), s("2") => track(25) };
    let map = MapBuilder::build("long", &desc).unwrap();
    let first = map.track(1).unwrap();
    let signals: Vec<_> = first.block_signals().iter().map(|(i, u)| (*i, u.kind)).collect();
    assert_eq!(signals, vec![(4, SignalKind::Distant)]);
    let second = map.track(2).unwrap();
    assert!(second.signal_controller().is_some());
    assert_eq!(second.block_signals()[0].0, 0);
    assert_eq!(second.block_signals()[0].1.kind, SignalKind::Main);
}

#[test]
fn branching_root_is_degraded() {
    let desc = WorldDescription {
        tracks: hashmap!{
            s("1") => track(30), s("2") => track(30), s("3") => track(30),
            s("4") => track(30), s("5") => track(30),
        },
        placeables: hashmap!{
            s("1") => hashmap!{
                s("advisorySpeed") => Value::Int(20),
                s("placeOn") => Value::Map(hashmap!{ s("track") => Value::Int(1), s("section") => Value::Int(3) }),
            },
            s("2") => hashmap!{
                s("advisorySpeed") => Value::Float(12.5),
                s("placeOn") => Value::Map(hashmap!{ s("track") => Value::Int(5), s("section") => Value::Int(10) }),
            },
        },
        journey_paths: hashmap!{
            s("1") => path(vec![element("track", 1), element("track", 2), element("track", 3)]),
            s("2") => path(vec![element("track", 2), element("track", 4)]),
            s("3") => path(vec![element("track", 5)]),
        },
        ..Default::default()
    };
    let map = MapBuilder::build("branching", &desc).unwrap();
    assert!(!map.report.is_complete());
    assert!(!map.report.balise_positions_complete);
    assert_eq!(map.report.degraded_roots, vec![Connectable::Track(0)]);

    assert_eq!(map.placeable(1).unwrap().position, Some(3.0));
    assert_eq!(map.placeable(2).unwrap().position, Some(10.0));
    let t5 = map.track(5).unwrap();
    let active: Vec<_> = t5.placeables()
        .filter(|&(_, p)| map.placeables[p].is_active_balise())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(active, vec![5, 15, 20, 25]);
}

fn shuttle_line() -> WorldDescription {
    WorldDescription {
        tracks: hashmap!{ s("1") => track(30) },
        journey_paths: hashmap!{ s("1") => path(vec![element("track", 1)]) },
        trains: hashmap!{
            s("-1") => hashmap!{ s("numCars") => Value::Int(3), s("count") => Value::Int(10) },
        },
        ..Default::default()
    }
}

#[test]
fn template_journeys_take_unassigned_trains() {
    let mut desc = shuttle_line();
    desc.journeys = hashmap!{
        s("0") => hashmap!{ s("path") => Value::Int(1), s("ratio") => Value::Float(0.5) },
    };
    let map = MapBuilder::build("auto", &desc).unwrap();
    assert_eq!(map.trains.len(), 10);
    assert_eq!(map.journeys.len(), 5);
    let mut trains: Vec<_> = map.journeys.iter().map(|j| j.train).collect();
    trains.sort();
    trains.dedup();
    assert_eq!(trains.len(), 5);
    assert_eq!(map.trains.iter().filter(|t| t.journey.is_some()).count(), 5);

    desc.journeys = hashmap!{
        s("1") => hashmap!{ s("path") => Value::Int(1), s("train") => Value::Int(3) },
        s("0") => hashmap!{ s("path") => Value::Int(1), s("ratio") => Value::Float(0.5) },
    };
    let map = MapBuilder::build("mixed", &desc).unwrap();
    assert_eq!(map.journeys.len(), 6);
    let assigned: Vec<i64> = (2..7).map(|j| map.trains[map.journey(j).unwrap().train].id).collect();
    assert_eq!(assigned, vec![1, 2, 4, 5, 6]);
    assert_eq!(map.trains[map.journey(1).unwrap().train].id, 3);

    let train = map.train(1).unwrap();
    assert_eq!(train.engine.objective(), TrainObjective::Proceed);
    assert_eq!(train.engine.target_speed(), DEFAULT_SET_OFF_SPEED);
    assert!(train.engine.has_radio());
}

#[test]
fn repeated_template_journey_is_fatal() {
    let mut desc = shuttle_line();
    desc.journeys = hashmap!{
        s("0") => hashmap!{ s("path") => Value::Int(1), s("repeat") => Value::Int(2) },
    };
    match MapBuilder::build("repeat", &desc) {
        Err(BuildError::UnsupportedRepeat { journey: 0, repeat: 2 }) => {}
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn invalid_path_element_is_fatal() {
    let desc = WorldDescription {
        tracks: hashmap!{ s("1") => track(30) },
        journey_paths: hashmap!{ s("1") => path(vec![element("track", 1), element("signal", 1)]) },
        ..Default::default()
    };
    match MapBuilder::build("bad", &desc) {
        Err(BuildError::UnknownElementType(ref kind)) => assert_eq!(kind, "signal"),
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn placeable_out_of_range_is_fatal() {
    let desc = WorldDescription {
        tracks: hashmap!{ s("1") => track(10) },
        placeables: hashmap!{
            s("1") => hashmap!{
                s("type") => Value::from("obstacle"),
                s("placeOn") => Value::Map(hashmap!{ s("track") => Value::Int(1), s("section") => Value::Int(10) }),
            },
        },
        ..Default::default()
    };
    match MapBuilder::build("range", &desc) {
        Err(BuildError::Placement { placeable: 1, track: 1, error }) => {
            assert_eq!(error, PlacementError::SectionOutOfRange { index: 10, sections: 10 });
        }
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn colliding_placeable_id_is_reassigned() {
    let on = |section| Value::Map(hashmap!{ s("track") => Value::Int(1), s("section") => Value::Int(section) });
    let desc = WorldDescription {
        tracks: hashmap!{ s("1") => track(10) },
        placeables: hashmap!{
            s("0") => hashmap!{ s("type") => Value::from("obstacle"), s("placeOn") => on(4) },
            s("1") => hashmap!{ s("advisorySpeed") => Value::Int(8), s("placeOn") => on(2) },
        },
        ..Default::default()
    };
    let map = MapBuilder::build("ids", &desc).unwrap();
    assert!(map.placeable(1).unwrap().is_balise());
    assert!(!map.placeable(2).unwrap().is_balise());
    assert_eq!(map.track(1).unwrap().placeable_at(4), map.names.placeables.get(2));
}

#[test]
fn station_before_switch_is_fatal() {
    let desc = WorldDescription {
        tracks: hashmap!{ s("1") => track(30), s("2") => track(30) },
        stations: hashmap!{ s("1") => hashmap!{ s("capacity") => Value::Int(1), s("wait") => Value::Int(2) } },
        switches: hashmap!{
            s("1") => hashmap!{
                s("left") => Value::List(vec![Value::Int(1)]),
                s("right") => Value::List(vec![Value::Int(2)]),
                s("statusLeft") => Value::Int(0),
                s("statusRight") => Value::Int(0),
            },
        },
        journey_paths: hashmap!{
            s("1") => path(vec![element("station", 1), element("switch", 1), element("track", 1)]),
        },
        ..Default::default()
    };
    match MapBuilder::build("switch", &desc) {
        Err(BuildError::Signalling(SignallingError::StationToNonTrack { station: 1, next })) => {
            assert_eq!(next, Connectable::Switch(0));
        }
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn paired_track_copies_active_balises() {
    let desc = WorldDescription {
        tracks: hashmap!{
            s("1") => hashmap!{ s("numSections") => Value::Int(20), s("pairID") => Value::Int(2) },
            s("2") => track(20),
        },
        journey_paths: hashmap!{
            s("1") => path(vec![element("track", 1)]),
            s("2") => path(vec![element("track", 2)]),
        },
        ..Default::default()
    };
    let map = MapBuilder::build("dual", &desc).unwrap();
    assert!(map.report.is_complete());
    let layout = |id| -> Vec<usize> {
        map.track(id).unwrap().placeables().map(|(i, _)| i).collect()
    };
    assert_eq!(layout(1), vec![5, 10, 15]);
    assert_eq!(layout(2), vec![5, 10, 15]);
    assert_eq!(map.track(1).unwrap().pair, map.names.tracks.get(2));
    assert_eq!(map.track(2).unwrap().pair, map.names.tracks.get(1));
    let positions: Vec<_> = map.placeables.iter().map(|p| p.position).collect();
    assert!(positions.iter().all(|p| p.is_some()));
}

#[test]
fn failure_rate_breaks_balises_and_radio() {
    let mut desc = shuttle_line();
    desc.simulation = hashmap!{ s("gsm_failure_rate") => Value::Int(100), s("seed") => Value::Int(7) };
    let map = MapBuilder::build("faulty", &desc).unwrap();
    assert_eq!(map.radio_mast.failure_ratio(), 100);
    assert!(!map.placeables.is_empty());
    assert!(map.placeables.iter().all(|p| p.is_broken()));

    desc.simulation = hashmap!{ s("mode") => Value::from("fixed_block") };
    let map = MapBuilder::build("fixed", &desc).unwrap();
    assert!(map.placeables.is_empty());
}

#[test]
fn station_to_station_run() {
    let desc = WorldDescription {
        simulation: fixed_block(),
        tracks: hashmap!{ s("1") => track(25), s("2") => track(25) },
        stations: hashmap!{ s("1") => station(), s("2") => station() },
        journey_paths: hashmap!{
            s("1") => path(vec![element("station", 1), element("track", 1),
                                element("track", 2), element("station", 2)]),
        },
        trains: hashmap!{ s("1") => hashmap!{ s("numCars") => Value::Int(4) } },
        journeys: hashmap!{ s("1") => hashmap!{ s("path") => Value::Int(1), s("train") => Value::Int(1) } },
        ..Default::default()
    };
    let mut map = build_world("run", &desc).unwrap();
    assert_eq!(map.station(1).unwrap().trains(), &[0]);
    assert_eq!(map.train(1).unwrap().engine.objective(), TrainObjective::Stop);
    assert_eq!(map.controllers.len(), 2);

    let history = simulate(&mut map, 1.0, 200);
    assert_eq!(history.duration(), 200.0);
    let events: Vec<_> = history.events().cloned().collect();
    use crate::railway::signalling::SignalStatus::*;
    assert_eq!(events, vec![
        MapLogEvent::Departed(0, 0),
        MapLogEvent::SignalStatus(1, Red),
        MapLogEvent::SignalStatus(0, Red),
        MapLogEvent::SignalStatus(1, Green),
        MapLogEvent::Arrived(0, 1),
        MapLogEvent::Finished(0),
        MapLogEvent::SignalStatus(0, Green),
    ]);
    let train = map.train(1).unwrap();
    assert!(train.finished);
    assert_eq!(train.id, 1);
    assert_eq!(map.station(2).unwrap().trains(), &[0]);
}

fn station() -> Attributes {
    hashmap!{ s("capacity") => Value::Int(1), s("wait") => Value::Int(2) }
}

#[test]
fn journey_on_empty_path_is_fatal() {
    let mut desc = shuttle_line();
    desc.journey_paths.insert(s("2"), path(vec![]));
    desc.journeys = hashmap!{ s("1") => hashmap!{ s("path") => Value::Int(2), s("train") => Value::Int(1) } };
    match MapBuilder::build("empty", &desc) {
        Err(BuildError::EmptyJourneyPath { journey: 1, path: 2 }) => {}
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn second_journey_for_train_is_fatal() {
    let mut desc = shuttle_line();
    desc.journeys = hashmap!{
        s("1") => hashmap!{ s("path") => Value::Int(1), s("train") => Value::Int(3) },
        s("2") => hashmap!{ s("path") => Value::Int(1), s("train") => Value::Int(3), s("isForward") => Value::Bool(false) },
    };
    match MapBuilder::build("twice", &desc) {
        Err(BuildError::TrainAlreadyAssigned { journey: 2, train: 3 }) => {}
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn loop_through_switch_is_fatal() {
    let desc = WorldDescription {
        simulation: fixed_block(),
        tracks: hashmap!{ s("1") => track(30), s("2") => track(30) },
        stations: hashmap!{ s("1") => station() },
        switches: hashmap!{
            s("1") => hashmap!{
                s("left") => Value::List(vec![Value::Int(1)]),
                s("right") => Value::List(vec![Value::Int(2)]),
                s("statusLeft") => Value::Int(0),
                s("statusRight") => Value::Int(0),
            },
        },
        journey_paths: hashmap!{
            s("1") => path(vec![element("station", 1), element("track", 1),
                                element("switch", 1), element("track", 1)]),
        },
        ..Default::default()
    };
    match MapBuilder::build("loop", &desc) {
        Err(BuildError::Signalling(SignallingError::Graph(GraphError::Cycle { node }))) => {
            assert_eq!(node, Connectable::Track(0));
        }
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn station_after_block_signal_is_fatal() {
    let desc = WorldDescription {
        simulation: fixed_block(),
        tracks: hashmap!{ s("1") => track(25), s("2") => track(25) },
        stations: hashmap!{ s("1") => station() },
        journey_paths: hashmap!{
            s("1") => path(vec![element("track", 1), element("track", 2)]),
            s("2") => path(vec![element("station", 1), element("track", 2)]),
        },
        ..Default::default()
    };
    match MapBuilder::build("duplicate", &desc) {
        Err(BuildError::Signalling(SignallingError::DuplicateController { track: 2 })) => {}
        x => panic!("unexpected {:?}", x.map(|_| ())),
    }
}

#[test]
fn station_signal_is_red_over_occupied_block() {
    let mut desc = WorldDescription {
        tracks: hashmap!{ s("1") => track(30) },
        stations: hashmap!{ s("1") => station() },
        journey_paths: hashmap!{
            s("1") => path(vec![element("station", 1), element("track", 1)]),
            s("2") => path(vec![element("track", 1)]),
        },
        trains: hashmap!{ s("1") => hashmap!{ s("numCars") => Value::Int(2) } },
        journeys: hashmap!{ s("1") => hashmap!{ s("path") => Value::Int(2), s("train") => Value::Int(1) } },
        ..Default::default()
    };
    let map = MapBuilder::build("occupied", &desc).unwrap();
    assert_eq!(map.controllers.len(), 1);
    assert_eq!(map.controllers[0].track, 0);
    assert_eq!(map.track(1).unwrap().signal_controller(), Some(0));
    assert_eq!(map.controllers[0].status(), SignalStatus::Red);

    desc.journeys.clear();
    let map = MapBuilder::build("free", &desc).unwrap();
    assert_eq!(map.controllers[0].status(), SignalStatus::Green);
}
