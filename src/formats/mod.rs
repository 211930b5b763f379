//! Low-level container format access.

pub mod elf;
