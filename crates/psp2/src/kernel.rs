use bitflags::bitflags;

use crate::{SceResult, SceUid};

bitflags! {
    /// Open mode for `Kernel::open`.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct OpenFlags: u32 {
        const RDONLY = 0x0001;
        const WRONLY = 0x0002;
        const APPEND = 0x0100;
        const CREAT = 0x0200;
        const TRUNC = 0x0400;
    }
}

bitflags! {
    /// Selector for the loaded-module enumeration.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct ModuleListFlags: u32 {
        /// Every module the kernel will report to us.
        const ALL = 0xFF;
    }
}

/// Memory block type tag passed to the data allocator.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MemBlockType(pub u32);

impl MemBlockType {
    /// Plain user-visible read/write memory.
    pub const USER_RW: Self = Self(0x0C20_D060);
}

pub const MODULE_NAME_LEN: usize = 28;
pub const MODULE_SEGMENT_COUNT: usize = 3;

/// One mapped region of a loaded module.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct SegmentInfo {
    pub vaddr: usize,
    pub memsz: usize,
}

/// Answer to a module-info query: the module's name and up to three
/// resident segments.
#[derive(Copy, Clone, Debug)]
pub struct LoadedModuleInfo {
    pub name: [u8; MODULE_NAME_LEN],
    pub segments: [SegmentInfo; MODULE_SEGMENT_COUNT],
}

impl LoadedModuleInfo {
    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        core::str::from_utf8(&self.name[..len]).unwrap_or("<invalid>")
    }
}

impl Default for LoadedModuleInfo {
    fn default() -> Self {
        Self {
            name: [0; MODULE_NAME_LEN],
            segments: [SegmentInfo::default(); MODULE_SEGMENT_COUNT],
        }
    }
}

/// The kernel services the loader consumes.
///
/// Every call blocks until the underlying service returns; none of them are
/// cancellable. Implementations for the real platform are thin wrappers over
/// the corresponding syscalls.
pub trait Kernel {
    /// Opens `path` and returns a file descriptor.
    fn open(&mut self, path: &str, flags: OpenFlags) -> SceResult<SceUid>;
    /// Reads up to `buf.len()` bytes, returning the count actually read.
    fn read(&mut self, fd: SceUid, buf: &mut [u8]) -> SceResult<usize>;
    fn close(&mut self, fd: SceUid) -> SceResult<()>;

    /// Allocates a named data block of `size` bytes.
    fn alloc_data(&mut self, name: &str, kind: MemBlockType, size: usize) -> SceResult<SceUid>;
    /// Allocates a named block that may hold executable code.
    fn alloc_code(&mut self, name: &str, size: usize) -> SceResult<SceUid>;
    /// Base address of an allocated block.
    fn block_base(&mut self, block: SceUid) -> SceResult<usize>;
    /// Looks up the block containing `addr`.
    fn find_block_by_addr(&mut self, addr: usize) -> SceResult<SceUid>;
    fn free(&mut self, block: SceUid) -> SceResult<()>;

    /// Fills `out` with the UIDs of currently loaded modules, returning the
    /// count written.
    fn loaded_modules(&mut self, flags: ModuleListFlags, out: &mut [SceUid]) -> SceResult<usize>;
    fn module_info(&mut self, module: SceUid) -> SceResult<LoadedModuleInfo>;
    /// Stops and unloads a resident module.
    fn unload(&mut self, module: SceUid) -> SceResult<()>;

    /// Drops write protection on loader-owned memory. Must be paired with
    /// `lock_mem`; the loader brackets every segment copy with the pair.
    fn unlock_mem(&mut self);
    fn lock_mem(&mut self);
}
