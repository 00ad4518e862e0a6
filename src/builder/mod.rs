//! Driving the native build.
//!
//! The build context carries the resolved toolchain and the collaborators
//! every build step needs; the CMake adapter turns it into commands.

pub mod cmake;
pub mod context;

pub use cmake::CMakeBuilder;
pub use context::BuildContext;
