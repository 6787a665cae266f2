//! Data handed to the simulation by outside collaborators.

pub mod description;
