pub mod serialize;
pub mod statistics;
