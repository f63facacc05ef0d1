//! CLI subcommand implementations.

pub mod collapse;
pub mod drag;
pub mod header;
pub mod lanes;
pub mod layout;
pub mod resources;
pub mod select;
pub mod util;
