//! Core rust implementation of asmodel, a crate for compiling kinetic models of
//! biochemical systems into ODEs and simulating them with fixed-step integrators.

pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod simulate;
