//! Load-window reclamation.

use psp2::{Kernel, ModuleListFlags, SceUid};

use crate::consts::{LOAD_WINDOW_BASE, MAX_LOADED_MODS};
use crate::elf_object::SegmentDescriptor;
use crate::error::Error;
use crate::Result;

/// Unloads every resident module occupying the fixed load window.
///
/// The window the image wants is computed from its segment descriptors for
/// diagnostics, but occupancy is decided by comparing each resident
/// segment's base against [`LOAD_WINDOW_BASE`] exactly, the address all
/// homebrew links at. A module whose info cannot be read is skipped; a
/// module that cannot be unloaded aborts the load, since mapping over it
/// would corrupt the address space.
pub fn free_load_window<K: Kernel>(kernel: &mut K, segments: &[SegmentDescriptor]) -> Result<()> {
    let mut min_addr = usize::MAX;
    let mut max_addr = 0usize;
    for seg in segments {
        min_addr = min_addr.min(seg.vaddr.0);
        max_addr = max_addr.max(seg.vaddr.0 + seg.mem_size);
    }
    log::debug!(
        "lowest load address: {:#x}, highest: {:#x}",
        min_addr,
        max_addr
    );

    let mut modules = [SceUid::default(); MAX_LOADED_MODS];
    let count = kernel
        .loaded_modules(ModuleListFlags::ALL, &mut modules)
        .map_err(|e| {
            log::error!("failed to get module list: {}", e);
            Error::ModuleQuery(e)
        })?;
    log::debug!("found {} loaded modules", count);

    for &module in &modules[..count] {
        let info = match kernel.module_info(module) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("error getting info for module {}: {}, continuing", module, e);
                continue;
            }
        };
        for (j, seg) in info.segments.iter().enumerate() {
            if seg.vaddr == LOAD_WINDOW_BASE {
                log::debug!(
                    "module {} segment {} ({:#x}, size {}) is in our address space, unloading",
                    info.name(),
                    j,
                    seg.vaddr,
                    seg.memsz
                );
                kernel.unload(module).map_err(|e| {
                    log::error!("error unloading {}: {}", info.name(), e);
                    Error::ModuleUnload(e)
                })?;
                break;
            }
        }
    }
    Ok(())
}
