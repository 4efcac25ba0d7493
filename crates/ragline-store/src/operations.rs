//! Database operations on chunks and their vectors.

pub mod chunks;
pub mod vectors;
