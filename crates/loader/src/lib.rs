//! Homebrew executable loader for the PS Vita.
//!
//! Takes a path to an on-disk image (plain ELF or an SCE-wrapped SELF),
//! validates it against the platform, reclaims the fixed load window, maps
//! the program segments, binds imported NIDs through a [`Resolver`], and
//! returns the program's entry point. Kernel services are consumed through
//! [`psp2::Kernel`].
#![no_std]

#[cfg(test)]
extern crate std;

mod addr;
pub mod consts;
mod elf_object;
mod error;
mod exe;
mod image;
mod module_info;
mod reclaim;
mod resolve;
mod segment;

pub use addr::{FileOff, Vaddr};
pub use elf_object::{ElfExe, SegmentDescriptor};
pub use error::Error;
pub use exe::load_executable;
pub use image::RawImage;
pub use module_info::{rebase_table, SceModuleExports, SceModuleImports, SceModuleInfo};
pub use reclaim::free_load_window;
pub use resolve::{find_entry_point, resolve_module_imports, Resolver};
pub use segment::{load_segments, MappedImage, MappedSegment};

pub type Result<T> = core::result::Result<T, Error>;
