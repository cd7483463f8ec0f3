#![deny(missing_docs)]

//! Client SDK for the Debugattor pipeline debugging server.
//!
//! A [`Tracker`] records executions, their steps, and the artifacts produced along the way.
//! Arbitrary values are turned into JSON by [`normalize`], and images are accepted in any
//! of the forms listed by [`ImageInput`].

/// HTTP client for the Debugattor REST API.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Image classification, normalization, and encoding.
pub mod imaging;
/// Structured logging and tracing setup.
pub mod logging;
/// Best-effort JSON normalization of arbitrary values.
pub mod normalize;
/// Failure-tolerant tracking operations.
pub mod tracker;

pub use imaging::{Figure, ImageInput, PixelArray, PixelData};
pub use normalize::{Loggable, Normalizer, SerializedForm, normalize};
pub use tracker::Tracker;
