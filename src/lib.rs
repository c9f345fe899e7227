//! # target-encoding
//!
//! Target encoding of categorical columns: each category is replaced by a
//! numeric summary of the response observed for it during training.
//!
//! ## Core Design Principles
//!
//! - **Leakage-aware training**: training rows can be encoded out of fold
//!   (`KFold`) or without their own label (`LeaveOneOut`), computed as a pure
//!   function of immutable aggregates.
//! - **Portable artifact**: the fitted state is an [`artifact::EncodingArtifact`]
//!   with a plain-text section layout, read by a [`scorer::Scorer`] that needs
//!   no training engine.
//! - **Deterministic**: aggregation merges partitions in a fixed order and
//!   noise comes from a seeded generator, so identical inputs give identical
//!   artifacts and encodings.
//!
//! ## Quick Start
//!
//! ```rust
//! use target_encoding::artifact::{write_artifact, MemoryStore};
//! use target_encoding::config::TargetEncoderConfig;
//! use target_encoding::dataset::{Frame, Row, Value};
//! use target_encoding::encoding::{LeakageStrategy, TargetEncoder};
//! use target_encoding::scorer::Scorer;
//! use target_encoding::traits::Transformer;
//!
//! let frame = Frame::new()
//!     .with_categorical("city", &[Some("Oslo"), Some("Rome"), Some("Oslo"), Some("Rome")])
//!     .unwrap()
//!     .with_numeric("clicked", vec![1.0, 0.0, 1.0, 1.0])
//!     .unwrap();
//!
//! let config = TargetEncoderConfig::new("clicked")
//!     .with_data_leakage_handling(LeakageStrategy::LeaveOneOut)
//!     .with_blending(true);
//! let fitted = TargetEncoder::new(config).fit(&frame).unwrap();
//!
//! // Persist, reload, and score a new row.
//! let mut store = MemoryStore::new();
//! write_artifact(fitted.artifact(), &mut store).unwrap();
//! let scorer = Scorer::from_reader(&store).unwrap();
//!
//! let mut row = Row::new();
//! row.insert("city".to_string(), Value::from("Oslo"));
//! let scored = scorer.score_row(&row);
//! assert!(scored.contains_key("city_te"));
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: table abstraction, in-memory frame, CSV input/output
//! - `encoding`: aggregation, leakage handling, blending, noise, the encoder
//! - `artifact`: the fitted artifact and its text sections
//! - `scorer`: standalone scoring from an artifact
//! - `config`: encoder hyperparameters, TOML loading
//! - `traits`: fit/transform traits shared by encoders
//! - `serialization`: binary snapshots of fitted parameters

/// Engine-independent artifact and its text layout.
pub mod artifact;

/// Encoder hyperparameters.
pub mod config;

/// Tabular data abstractions.
pub mod dataset;

/// Target encoding components.
pub mod encoding;

pub mod error;

/// Tracing subscriber setup for the binary.
pub mod logging;

/// Standalone scoring from a persisted artifact.
pub mod scorer;

/// Binary snapshots of fitted parameters.
pub mod serialization;

pub mod traits;

pub use artifact::EncodingArtifact;
pub use config::TargetEncoderConfig;
pub use dataset::{Frame, Row, TableSource, Value};
pub use encoding::{FittedTargetEncoder, LeakageStrategy, TargetEncoder};
pub use error::EncodingError;
pub use scorer::Scorer;
pub use traits::{FittedTransformer, Transformer};
