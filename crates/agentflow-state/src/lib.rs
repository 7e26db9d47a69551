//! Agent flow state - the node status map owned by the view controller.
//!
//! Applying an event is a pure function of the current map and the event,
//! so the same reducer drives the terminal canvas, the headless runner and
//! the tests.

pub mod view;

pub use view::{Applied, NodeState, ViewState};
