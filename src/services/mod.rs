//! Service layer
//!
//! `SimpleServices` is the lightweight container handed to every command
//! handler. It owns the loaded configuration and builds the network-facing
//! collaborators on demand.

pub mod simple_container;

pub use simple_container::SimpleServices;
