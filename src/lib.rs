//! jarscope library: catalog model, response cache and the runtime-agnostic
//! application core behind the terminal browser.

pub mod app_core;
pub mod catalog;
pub mod digest;
pub mod model;
pub mod runtime;
pub mod theme;
pub mod ui;
