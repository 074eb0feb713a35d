//! Serializable output schemas.
//!
//! Each schema revision lives in its own module so consumers pinned to an
//! older revision can keep decoding while the engine only targets the latest.
pub mod v0;

pub use v0::{AlignedInfo, Alignment, Allocation, ResourceDetails, UnalignedInfo};
