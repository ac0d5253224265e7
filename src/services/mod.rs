//! Business logic services

pub mod classifier;
pub mod extraction;
pub mod sheets;
pub mod sqs_poller;
pub mod webhook;
