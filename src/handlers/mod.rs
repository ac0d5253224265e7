//! Queue batch handlers

pub mod batch;

pub use batch::BatchHandler;
