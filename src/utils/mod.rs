pub mod fs;
pub mod platform;

pub use platform::Platform;
