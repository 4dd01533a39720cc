//! Imagery source adapters

pub mod http;

pub use http::HttpImagerySource;
