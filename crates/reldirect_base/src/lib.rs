/* 📖 # Why have reldirect_base as a core library?
reldirect_base provides the error type, tracing setup and the platform abstraction
layer (files and HTTP serving) used by the engine and the CLI.
Keeping them here lets the engine stay free of any direct I/O.
*/

pub mod error;
mod error_tests;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ReldirectError, ReldirectResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
