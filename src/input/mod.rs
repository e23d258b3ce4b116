pub mod remap;
pub mod source;
pub mod state;
pub mod target;
