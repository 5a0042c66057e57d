//! Custom commands built on the base commands' option surfaces
//!
//! `myimages` and `mychat` inherit every option of `images` and `chat`
//! and add their own on top.

pub mod chat;
pub mod images;

use crate::cli::core;
use crate::cli::inherit::inherit_command;
use crate::cli::registry::CommandRegistry;

/// Register the custom commands after the base ones
pub fn register(registry: &mut CommandRegistry) {
    registry.register(inherit_command(&core::images::spec(), images::NAME, images::custom()));
    registry.register(inherit_command(&core::chat::spec(), chat::NAME, chat::custom()));
}
