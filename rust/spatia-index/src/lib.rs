//! Static, bulk-loaded bounding box index.
//!
//! Boxes are added to a [builder::SpatialIndexBuilder], sorted along a Hilbert
//! curve and packed bottom-up into a [index::PackedHilbertIndex]. The built index
//! is immutable and can be searched from many threads at once.

pub mod builder;
pub mod hilbert;
pub mod index;

pub use builder::SpatialIndexBuilder;
pub use index::{IndexBox, PackedHilbertIndex, SpatialIndex};
