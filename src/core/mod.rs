//! Core engine: discovery, term matching, identifier generation and the
//! backup-guarded mutation contract shared by every format adapter.

pub mod backup;
pub mod config;
pub mod console;
pub mod descriptor;
pub mod error;
pub mod ident;
pub mod locate;
pub mod lock;
pub mod orchestrate;
pub mod outcome;
pub mod store;
pub mod terms;
