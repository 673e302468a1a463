/// Caption rendering module
///
/// Flattens a caption layer onto a source photo on the CPU.
/// The output is a plain RGBA buffer, ready for on-screen preview
/// or for the persistence pipeline.

pub mod compositor;

pub use compositor::{render, CompositeImage};
