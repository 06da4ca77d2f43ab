//! Audio analysis and playback
//!
//! Bottom-up, the analysis path is:
//! - buffer admission ([`throttle`])
//! - FFT magnitudes ([`spectrum`])
//! - frame loudness ([`loudness`])
//! - band grouping and smoothing ([`banding`])
//! - the per-buffer composition of the above ([`pipeline`])
//!
//! Playback is modelled by [`transport`] and [`clock`], and [`engine`] ties
//! everything to a render thread that publishes [`events`].

pub mod banding;
pub mod clock;
pub mod engine;
pub mod events;
pub mod loudness;
pub mod pipeline;
pub mod spectrum;
pub mod throttle;
pub mod transport;
