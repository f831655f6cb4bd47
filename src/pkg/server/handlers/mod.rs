pub mod auth;
pub mod evaluations;
pub mod probes;
pub mod ui;
