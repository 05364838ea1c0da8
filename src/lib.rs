#![deny(unused_variables)]

pub mod artifact;
pub mod config;
pub mod train;
pub mod types;

#[path = "../prepare/mod.rs"]
pub mod prepare;

#[path = "../network/mod.rs"]
pub mod network;

#[path = "../predict/mod.rs"]
pub mod predict;
