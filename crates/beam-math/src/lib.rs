//! Geometric primitives for beam pointing.

pub mod disk;
pub mod rotation;
