//! HTTP handlers, one module per resource.

pub mod music;
pub mod quota;
pub mod video;
