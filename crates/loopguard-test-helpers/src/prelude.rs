//! Convenience re-exports for tests.

pub use crate::must::{must, must_async, must_some, must_with};
pub use crate::rig::{
    answer_control_law, concrete_control_law, concrete_observation, read_control_law,
    read_observation, send_observation, SessionRig, DEFAULT_PIPE_CAPACITY,
};
