//! Scalar functions converting and inspecting geometry blobs in Arrow batches.
//!
//! Every function accepts scalar or array arguments. When all arguments are
//! scalars the result is a scalar as well.

pub mod executor;
pub mod register;
pub mod st_astext;
pub mod st_extent;
pub mod st_geohash;
pub mod st_geomfromtext;
pub mod st_makeline;
pub mod st_point;
pub mod st_wkb;

pub use register::{register_spatia_functions, spatia_scalar_udfs};
