//! Platform constants shared by the pipeline stages.

/// Magic of a plain ELF image.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Magic of a vendor-wrapped (SELF) image.
pub const SCE_MAGIC: [u8; 4] = [b'S', b'C', b'E', 0];

/// Length of the SCE envelope sitting in front of the embedded ELF.
pub const SCE_HEADER_LEN: usize = 0x1000;

/// `e_type` of a non-relocatable platform executable.
pub const ET_SCE_EXEC: u16 = 0xFE00;

/// Section carrying a module's `SceModuleInfo` record.
pub const MODINFO_SECTION: &str = ".sceModuleInfo.rodata";

/// Export attribute of the module-info export library.
pub const ATTR_MODULE_INFO: u16 = 0x8000;

/// NID reserved for `module_start`, the program entry point.
pub const ENTRY_NID: u32 = 0x935C_D196;

/// Capacity of the staging block a whole image is read into. Larger files
/// are truncated, not rejected.
pub const MAX_BIN_SIZE: usize = 0x100_0000;

/// Base of the fixed window homebrew is linked to load at. The reclaimer
/// frees any resident module with a segment based exactly here.
pub const LOAD_WINDOW_BASE: usize = 0x8100_0000;

/// Allocation granularity for mapped segments.
pub const SEGMENT_ALIGN: usize = 0x10_0000;

/// Upper bound on the loaded-module query.
pub const MAX_LOADED_MODS: usize = 128;

/// Most loadable program headers we accept in one image.
pub const MAX_SEGMENTS: usize = 16;
