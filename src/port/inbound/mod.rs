//! Inbound ports (driving side): contracts the application implements for
//! external drivers such as schedulers and the CLI.

pub mod automation;
