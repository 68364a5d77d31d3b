//! Intermediate Representation (IR) for pentoref.
//!
//! This module defines the format-agnostic shapes every stage works on:
//! decoded timelines ([`Interval`], [`Tier`], [`Recording`]) on the input
//! side and the five record kinds ([`Word`], [`Utterance`], [`Reference`],
//! [`SceneObject`], [`Action`]) on the output side. The `io_*` modules are
//! the decoders that turn files on disk into the input side.
//!
//! # Design Principles
//!
//! 1. **Permissive Construction**: decoders do not validate tier contents.
//!    Overlapping or unsorted intervals are represented as they are.
//!
//! 2. **One Record Shape per Kind**: records carry every field any corpus
//!    variant fills; tables decide which fields a variant exports.
//!
//! # Example
//!
//! ```
//! use pentoref::ir::{Interval, Recording, Tier};
//!
//! let recording = Recording::new(
//!     "r1",
//!     vec![Tier::new("Episode", vec![Interval::new(0.0, 12.5, "1")])],
//! );
//! assert_eq!(recording.intervals("Episode").len(), 1);
//! ```

mod ids;
mod interval;
pub mod io_eaf;
pub mod io_scene_xml;
pub mod io_textgrid;
mod model;
mod recording;

// Re-export core types for convenient access
pub use ids::{GameId, RefId, UttId};
pub use interval::{Interval, Tier};
pub use io_scene_xml::{SceneDocument, SceneElement};
pub use model::{Action, CorpusRecords, Hand, Reference, SceneObject, Utterance, Word};
pub use recording::Recording;
