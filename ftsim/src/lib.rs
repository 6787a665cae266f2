pub mod input;
pub mod output;
pub mod railway;

use std::cell::RefCell;
use std::rc::Rc;

use crate::input::description::WorldDescription;
use crate::output::history::History;
use crate::railway::builder::MapBuilder;
use crate::railway::map::GlobalMap;

pub type AppResult<T> = Result<T, failure::Error>;

pub fn build_world(name: &str, description: &WorldDescription) -> AppResult<GlobalMap> {
    Ok(MapBuilder::build(name, description)?)
}

/// Runs `ticks` steps of `dt` seconds and collects the events of each.
pub fn simulate(map: &mut GlobalMap, dt: f64, ticks: usize) -> History {
    let log = Rc::new(RefCell::new(Vec::new()));
    let map_log = log.clone();
    map.set_logger(Box::new(move |e| map_log.borrow_mut().push(e)));

    let mut history = History::default();
    for _ in 0..ticks {
        map.tick(dt);
        let events = log.borrow_mut().drain(..).collect();
        history.ticks.push((dt, events));
    }
    history
}

#[cfg(test)]
mod tests;
