/* 📖 # What is the Platform Abstraction Layer?

The PAL hides the two kinds of I/O the redirector performs: reading its configuration
file and serving HTTP. Engine code depends on the Pal trait only, so the same service
runs against tiny_http in production (RealPal) and against in-memory requests in
tests (MockPal).
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle};
