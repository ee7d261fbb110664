//! Platform service contracts for the PS Vita kernel.
//!
//! The loader core never talks to the kernel directly; everything it needs
//! (file I/O, named memory blocks, the module manager, write-protection
//! toggling) goes through the [`Kernel`] trait so the core can be driven
//! against a mock on the host.
#![no_std]

mod error;
mod kernel;
mod uid;

pub use error::{SceError, SceResult};
pub use kernel::{
    Kernel, LoadedModuleInfo, MemBlockType, ModuleListFlags, OpenFlags, SegmentInfo,
    MODULE_NAME_LEN, MODULE_SEGMENT_COUNT,
};
pub use uid::SceUid;
