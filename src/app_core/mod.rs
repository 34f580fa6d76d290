//! Shared application core: selection, identification flow, state, input
//! types and the reducer. Nothing in here performs I/O.

pub mod fingerprint;
pub mod input;
pub mod progress;
pub mod reducer;
pub mod selection;
pub mod state;
