//! Shared helpers: logging setup and text normalization.

pub mod logging;
pub mod text;
