//! ELF view: header validation, module-info location, segment descriptors.

use xmas_elf::header;
use xmas_elf::program::Type;
use xmas_elf::ElfFile;

use crate::addr::{FileOff, Vaddr};
use crate::consts::{ELF_MAGIC, ET_SCE_EXEC, MAX_SEGMENTS, MODINFO_SECTION};
use crate::error::Error;
use crate::module_info::SceModuleInfo;
use crate::Result;

/// One loadable program-header entry.
#[derive(Copy, Clone, Debug)]
pub struct SegmentDescriptor {
    /// Link-time virtual address the segment wants to live at.
    pub vaddr: Vaddr,
    pub file_off: FileOff,
    pub file_size: usize,
    pub mem_size: usize,
    pub executable: bool,
}

/// A candidate executable image, wrapping the parsed ELF.
pub struct ElfExe<'a> {
    elf: ElfFile<'a>,
}

impl<'a> ElfExe<'a> {
    /// Wraps the parsed ELF. The magic bytes are checked here rather than
    /// in [`Self::check_header`] so a corrupt magic reports as a header
    /// violation instead of whatever the parser trips over first.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < 4 || data[..4] != ELF_MAGIC {
            return Err(Error::InvalidHeader("bad ELF magic"));
        }
        let elf = ElfFile::new(data).map_err(Error::ElfParser)?;
        Ok(ElfExe { elf })
    }

    /// Validates the header against what this platform can run.
    ///
    /// Together with the magic check at construction these are the nine
    /// mandatory checks; any single violation is fatal for the whole load.
    pub fn check_header(&self) -> Result<()> {
        let header = &self.elf.header;
        if header.pt1.class() != header::Class::ThirtyTwo {
            return Err(Error::InvalidHeader("not a 32-bit executable"));
        }
        if header.pt1.data() != header::Data::LittleEndian {
            return Err(Error::InvalidHeader("not a little-endian executable"));
        }
        if header.pt1.version() != header::Version::Current {
            return Err(Error::InvalidHeader("unsupported ELF ident version"));
        }
        match header.pt2.type_().as_type() {
            header::Type::Executable => {}
            header::Type::ProcessorSpecific(ET_SCE_EXEC) => {}
            _ => return Err(Error::InvalidHeader("only executable images can be loaded")),
        }
        if header.pt2.machine().as_machine() != header::Machine::Arm {
            return Err(Error::InvalidHeader("not an ARM executable"));
        }
        if header.pt2.version() != 1 {
            return Err(Error::InvalidHeader("unsupported ELF version"));
        }
        if header.pt2.sh_offset() == 0 || header.pt2.ph_offset() == 0 {
            return Err(Error::InvalidHeader("missing table header(s)"));
        }
        if header.pt2.sh_str_index() == 0 {
            return Err(Error::InvalidHeader("missing section name string table"));
        }
        Ok(())
    }

    /// Locates `.sceModuleInfo.rodata` through the section-name string table
    /// and copies the record out of the matching section.
    ///
    /// A name landing at string-table index 0 is treated as absent: index 0
    /// is the reserved empty name, and a section claiming it would match
    /// every unnamed section in the image.
    pub fn module_info(&self) -> Result<SceModuleInfo> {
        let strtab = self
            .elf
            .section_header(self.elf.header.pt2.sh_str_index())
            .map_err(Error::ElfParser)?;
        let strings = strtab.raw_data(&self.elf);
        log::debug!(
            "string table at {:#x} for {:#x}",
            strtab.offset(),
            strtab.size()
        );

        let name_idx = match memstr(strings, MODINFO_SECTION.as_bytes()) {
            Some(idx) if idx > 0 => idx as u32,
            _ => {
                log::error!("cannot find section {} in string table", MODINFO_SECTION);
                return Err(Error::ModuleInfoNotFound);
            }
        };
        log::debug!("index of {}: {}", MODINFO_SECTION, name_idx);

        for i in 0..self.elf.header.pt2.sh_count() {
            let section = self.elf.section_header(i).map_err(Error::ElfParser)?;
            if section.name() == name_idx {
                log::debug!(
                    "found module info section {} at offset {:#x}, size {}",
                    i,
                    section.offset(),
                    section.size()
                );
                return SceModuleInfo::read(section.raw_data(&self.elf))
                    .ok_or(Error::ElfParser("module info section too short"));
            }
        }
        Err(Error::ModuleInfoNotFound)
    }

    /// Collects the loadable program headers, skipping entries that are not
    /// `PT_LOAD` or that want the null address.
    pub fn segments(&self) -> Result<heapless::Vec<SegmentDescriptor, MAX_SEGMENTS>> {
        if self.elf.header.pt2.ph_count() < 1 {
            log::error!("no program sections to load");
            return Err(Error::NoSegments);
        }

        let mut segments = heapless::Vec::new();
        for (i, ph) in self.elf.program_iter().enumerate() {
            if ph.get_type() != Ok(Type::Load) || ph.virtual_addr() == 0 {
                log::debug!("segment {} is not loadable, skipping", i);
                continue;
            }
            if ph.mem_size() < ph.file_size() {
                return Err(Error::ElfParser("segment memory size below file size"));
            }
            segments
                .push(SegmentDescriptor {
                    vaddr: Vaddr(ph.virtual_addr() as usize),
                    file_off: FileOff(ph.offset() as usize),
                    file_size: ph.file_size() as usize,
                    mem_size: ph.mem_size() as usize,
                    executable: ph.flags().is_execute(),
                })
                .map_err(|_| Error::ElfParser("too many loadable segments"))?;
        }
        Ok(segments)
    }
}

/// Byte-level substring search, the way the section name is actually found:
/// the table is raw bytes, not a list of strings.
fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
