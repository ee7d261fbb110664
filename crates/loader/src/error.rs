use core::fmt::Display;

use psp2::SceError;

/// Everything that can abort an in-progress load.
///
/// There is no retry policy anywhere in the loader: a failed load is
/// reported upward and the caller decides what to do with the partially
/// touched address space.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Error {
    /// File open/read/close failure.
    Io(SceError),
    /// Memory block allocation failure.
    Alloc(SceError),
    /// The staging block could not be located or freed.
    Release(SceError),
    /// The image starts with neither an ELF nor an SCE magic.
    UnrecognizedFormat,
    /// One of the mandatory ELF header checks failed.
    InvalidHeader(&'static str),
    /// The image is structurally broken below the header level.
    ElfParser(&'static str),
    /// No `.sceModuleInfo.rodata` section, or its name resolves to index 0.
    ModuleInfoNotFound,
    /// The loaded-module enumeration failed.
    ModuleQuery(SceError),
    /// A module occupying the load window could not be unloaded.
    ModuleUnload(SceError),
    /// The image has no loadable program headers.
    NoSegments,
    /// The resolver could not bind a descriptor whose dependency loaded.
    Resolution(&'static str),
    /// No module-info export carries the entry NID.
    EntryNotFound,
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Alloc(e) => write!(f, "allocation error: {}", e),
            Error::Release(e) => write!(f, "release error: {}", e),
            Error::UnrecognizedFormat => write!(f, "not an ELF or SELF image"),
            Error::InvalidHeader(reason) => write!(f, "invalid ELF header: {}", reason),
            Error::ElfParser(source) => write!(f, "ELF parse error: {}", source),
            Error::ModuleInfoNotFound => write!(f, "module info section not found"),
            Error::ModuleQuery(e) => write!(f, "module list query failed: {}", e),
            Error::ModuleUnload(e) => write!(f, "module unload failed: {}", e),
            Error::NoSegments => write!(f, "no program segments to load"),
            Error::Resolution(reason) => write!(f, "import resolution failed: {}", reason),
            Error::EntryNotFound => write!(f, "entry point not found"),
        }
    }
}

impl From<&'static str> for Error {
    fn from(source: &'static str) -> Self {
        Error::ElfParser(source)
    }
}
