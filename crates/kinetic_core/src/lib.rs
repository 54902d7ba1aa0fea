//! Kinetic Core
//!
//! Foundational types shared by the Kinetic motion engine:
//!
//! - **Geometry**: [`BoundingBox`] snapshots and [`TransformDelta`] inversions
//! - **Host Contract**: [`LayoutHost`], the geometry/style collaborator the
//!   engine drives, plus [`MemoryHost`] for headless use
//! - **Style Properties**: [`StyleProperty`] slots and their compositor
//!   classification
//! - **Errors**: [`MotionError`] and the crate-wide [`Result`] alias
//!
//! The engine itself never paints. Everything it knows about elements comes
//! through a [`LayoutHost`].

pub mod element;
pub mod error;
pub mod geometry;
pub mod host;

pub use element::{is_hardware_accelerated, ElementId, StyleProperty, TransformComponent};
pub use error::{MotionError, Result};
pub use geometry::{BoundingBox, TransformDelta};
pub use host::{LayoutHost, MemoryHost, StyleWrite};
