//! # Material Module
//!
//! Material selection state and the matcap texture library.
//!
//! The viewer renders every node with one of three materials: the baked
//! color parsed from its MTL file, the holographic shader, or one of the
//! matcap textures. [`MaterialSelector`] holds the current choice;
//! [`matcap::MatcapLibrary`] owns the matcap textures on the GPU.

pub mod matcap;
pub mod selector;

pub use matcap::{MatcapLibrary, PROCEDURAL_STYLES};
pub use selector::{MaterialKind, MaterialSelector, NodeMaterial};
