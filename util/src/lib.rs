//! Utility library for the drive software
//!
//! Provides the ambient services shared by the executables: logging, session
//! directories, parameter loading, CSV archives and a few maths helpers.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod session;
pub mod time;
