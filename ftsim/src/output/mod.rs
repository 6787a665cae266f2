//! What the simulation hands back to reporting collaborators.

pub mod history;
