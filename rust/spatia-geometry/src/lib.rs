pub mod bounds;
pub mod error;
pub mod extent;
pub mod geohash;
pub mod types;
pub mod wkb_factory;
pub mod wkb_reader;
pub mod wkt_reader;
pub mod wkt_writer;
