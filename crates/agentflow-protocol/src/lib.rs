//! Agent flow protocol - wire types and the static node layout.
//!
//! The stream producer emits one JSON object per server-sent event:
//! `{"node": "...", "status": "...", "message": "..."}`. This crate owns
//! that shape, the compiled-in node registry and the rule that decides
//! when a run is over.

pub mod constants;
pub mod error;
pub mod registry;
pub mod types;

pub use constants::*;
pub use error::*;
pub use registry::{NodeRegistry, NodeSpec, Position};
pub use types::*;
