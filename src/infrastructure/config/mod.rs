//! Infrastructure configuration modules.

pub mod keeper;
pub mod logging;
pub mod protocol;
pub mod settings;
