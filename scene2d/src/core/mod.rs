//! Entity store, components, hierarchy and transform math

pub mod entity;
pub mod math;
