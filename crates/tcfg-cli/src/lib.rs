//! Library side of the `tcfg` binary: logging setup and table rendering.

pub mod logging;
pub mod summary;
