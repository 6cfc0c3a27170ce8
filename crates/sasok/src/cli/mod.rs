//! Thin command line client for a running SASOK server

pub mod client;
pub mod commands;
pub mod display;
