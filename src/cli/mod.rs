//! Command Line Interface module
//!
//! - `options`, `arguments`: the declarative option model and parsed values
//! - `registry`: the ordered command dispatcher
//! - `inherit`: building commands on another command's option surface
//! - `core`: base search commands (text, images, news, chat)
//! - `custom`: commands inheriting from the base ones (myimages, mychat)

pub mod arguments;
pub mod core;
pub mod custom;
pub mod inherit;
pub mod options;
pub mod registry;

use registry::CommandRegistry;

/// Every command of the binary: base commands first, custom ones after
pub fn build_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    core::register(&mut registry);
    custom::register(&mut registry);
    registry
}
