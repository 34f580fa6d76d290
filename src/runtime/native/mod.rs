//! Terminal runtime support: HTTP access and background workers.

pub mod data;
pub mod worker;
