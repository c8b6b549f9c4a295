//! Wire types and helpers shared by the kidcheck server and its clients.

pub mod api;
pub mod domain;
