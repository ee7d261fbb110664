//! Import resolution driving and entry-point location.
//!
//! Both walks run over *resident* memory: the import and export descriptor
//! tables live inside the first loadable segment, located by the offsets in
//! the module-info record. Absolute addresses inside the descriptors are
//! link-time addresses and go through [`MappedImage::translate`] before
//! being dereferenced.

use core::mem::align_of;

use crate::addr::Vaddr;
use crate::consts::{ATTR_MODULE_INFO, ENTRY_NID};
use crate::error::Error;
use crate::module_info::{SceModuleExports, SceModuleImports, SceModuleInfo};
use crate::segment::MappedImage;
use crate::Result;

/// Longest library name we will read out of an image.
const MAX_LIB_NAME: usize = 256;

/// The symbol-binding collaborator.
///
/// The loader drives resolution per import descriptor; how a NID is turned
/// into a live address (and any caching of previous lookups) is entirely the
/// resolver's business.
pub trait Resolver {
    /// Makes the module providing `lib_name` resident. The default does
    /// nothing: with every dependency already loaded, binding can proceed
    /// from the resolver's own tables.
    fn load_module_for_library(&mut self, lib_name: &str) -> core::result::Result<(), &'static str> {
        let _ = lib_name;
        Ok(())
    }

    /// Binds every NID in the descriptor's function/variable/TLS tables,
    /// writing the resolved addresses into the entry tables in place.
    /// `lib_name` is the descriptor's library name, already read out of
    /// resident memory.
    fn resolve_imports(
        &mut self,
        lib_name: &str,
        imports: &mut SceModuleImports,
    ) -> core::result::Result<(), &'static str>;
}

/// Walks the import-descriptor run and binds each descriptor.
///
/// A dependency that fails to load is logged and its descriptor skipped:
/// resolution may still succeed later from already-cached bindings. A
/// resolver failure for a descriptor whose dependency did load is fatal; an
/// executable with unresolved imports cannot run.
pub fn resolve_module_imports<R: Resolver>(
    resolver: &mut R,
    mapped: &MappedImage,
    info: &SceModuleInfo,
) -> Result<()> {
    let mut cur = mapped.base.add(info.stub_top as usize);
    let end = mapped.base.add(info.stub_end as usize);

    while cur < end {
        if cur.0 % align_of::<SceModuleImports>() != 0 {
            return Err(Error::ElfParser("misaligned import descriptor"));
        }
        let imports = unsafe { &mut *cur.as_mut_ptr::<SceModuleImports>() };
        if imports.size == 0 {
            return Err(Error::ElfParser("import descriptor with zero size"));
        }

        let lib_name = unsafe { cstr_at(mapped.translate(imports.lib_name)) };
        log::debug!("loading module for {}", lib_name);
        if let Err(e) = resolver.load_module_for_library(lib_name) {
            log::warn!(
                "cannot load required module for {}: {}; may still be possible to resolve with cached entries, continuing",
                lib_name,
                e
            );
            cur = cur.add(imports.size as usize);
            continue;
        }

        log::debug!("resolving imports for {}", lib_name);
        resolver.resolve_imports(lib_name, imports).map_err(|e| {
            log::error!("failed to resolve imports for {}: {}", lib_name, e);
            Error::Resolution(e)
        })?;
        cur = cur.add(imports.size as usize);
    }
    Ok(())
}

/// Scans the export-descriptor run for the module-info export and returns
/// the resident address bound to the entry-point NID.
pub fn find_entry_point(mapped: &MappedImage, info: &SceModuleInfo) -> Result<Vaddr> {
    let mut cur = mapped.base.add(info.ent_top as usize);
    let end = mapped.base.add(info.ent_end as usize);

    while cur < end {
        if cur.0 % align_of::<SceModuleExports>() != 0 {
            return Err(Error::ElfParser("misaligned export descriptor"));
        }
        let exports = unsafe { &*cur.as_ptr::<SceModuleExports>() };
        if exports.size == 0 {
            return Err(Error::ElfParser("export descriptor with zero size"));
        }
        if exports.attributes != ATTR_MODULE_INFO {
            cur = cur.add(exports.size as usize);
            continue;
        }

        let nids = mapped.translate(exports.nid_table).as_ptr::<u32>();
        let entries = mapped.translate(exports.entry_table).as_ptr::<u32>();
        for j in 0..exports.num_functions as usize {
            let nid = unsafe { nids.add(j).read_unaligned() };
            if nid == ENTRY_NID {
                let entry = mapped.translate(unsafe { entries.add(j).read_unaligned() });
                log::debug!("found application entry at {}", entry);
                return Ok(entry);
            }
        }
        cur = cur.add(exports.size as usize);
    }

    log::error!("cannot find application entry");
    Err(Error::EntryNotFound)
}

/// Reads a NUL-terminated string out of resident memory, bounded at
/// [`MAX_LIB_NAME`] bytes.
unsafe fn cstr_at<'a>(addr: Vaddr) -> &'a str {
    let base = addr.as_ptr::<u8>();
    let mut len = 0;
    while len < MAX_LIB_NAME && *base.add(len) != 0 {
        len += 1;
    }
    let bytes = core::slice::from_raw_parts(base, len);
    core::str::from_utf8(bytes).unwrap_or("<invalid>")
}
