//! Railway simulation.

pub mod constants;
pub mod placeable;
pub mod track;
pub mod connectable;
pub mod graph;
pub mod config;
pub mod signalling;
pub mod engine;
pub mod train;
pub mod journey;
pub mod disruptor;
pub mod radio;
pub mod map;
pub mod driver;
pub mod builder;
