//! Module providing the Model struct for representing a kinetic model.

pub mod component;
pub mod model;
pub mod reaction;
