//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod imagery;

pub use imagery::ImagerySource;
