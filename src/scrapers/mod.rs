//! Job boards the finder can search

pub mod usnlx;

pub use usnlx::UsnlxSite;
