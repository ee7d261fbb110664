//! Vendor metadata records.
//!
//! These are the raw layouts the toolchain embeds in a homebrew image: the
//! module-info record found through the section table, and the import/export
//! descriptors it points at. The descriptors live in *resident* memory once
//! segments are mapped; all table addresses inside them are 32-bit link-time
//! addresses.

use core::mem::size_of;

/// Leading fields of the `.sceModuleInfo.rodata` record.
///
/// The on-disk record is longer; nothing past `module_nid` is read by the
/// loader. `ent_*`/`stub_*` are byte offsets relative to the first loadable
/// segment's base.
#[derive(Copy, Clone, Debug)]
#[repr(C)]
pub struct SceModuleInfo {
    pub attributes: u16,
    pub version: u16,
    pub name: [u8; 27],
    pub kind: u8,
    pub gp_value: u32,
    pub ent_top: u32,
    pub ent_end: u32,
    pub stub_top: u32,
    pub stub_end: u32,
    pub module_nid: u32,
}

impl SceModuleInfo {
    /// Copies the record out of a section's bytes. Section data has no
    /// alignment guarantee in the file, hence the unaligned read.
    pub fn read(data: &[u8]) -> Option<Self> {
        if data.len() < size_of::<Self>() {
            return None;
        }
        Some(unsafe { core::ptr::read_unaligned(data.as_ptr() as *const Self) })
    }

    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        core::str::from_utf8(&self.name[..len]).unwrap_or("<invalid>")
    }
}

/// One import descriptor: everything the image expects one external library
/// to provide, as parallel NID/entry tables (0x34 bytes on disk).
#[derive(Copy, Clone, Debug)]
#[repr(C)]
pub struct SceModuleImports {
    pub size: u16,
    pub version: u16,
    pub flags: u16,
    pub num_functions: u16,
    pub num_vars: u16,
    pub num_tls_vars: u16,
    pub reserved1: u32,
    pub module_nid: u32,
    pub lib_name: u32,
    pub reserved2: u32,
    pub func_nid_table: u32,
    pub func_entry_table: u32,
    pub var_nid_table: u32,
    pub var_entry_table: u32,
    pub tls_nid_table: u32,
    pub tls_entry_table: u32,
}

impl SceModuleImports {
    /// Re-expresses the seven pointer-valued header fields by `addend`.
    ///
    /// Used when a descriptor is processed at an address other than its
    /// resident one (resolving in a staging buffer before final placement).
    /// Applying `+k` then `-k` restores every field. Entry-table contents
    /// are adjusted separately by [`Self::rebase_entries`].
    pub fn rebase(&mut self, addend: i32) {
        log::debug!(
            "rebasing import table for {:#x} by {:#x}",
            self.module_nid,
            addend
        );
        self.lib_name = offset_ptr(self.lib_name, addend);
        self.func_nid_table = offset_ptr(self.func_nid_table, addend);
        self.func_entry_table = offset_ptr(self.func_entry_table, addend);
        self.var_nid_table = offset_ptr(self.var_nid_table, addend);
        self.var_entry_table = offset_ptr(self.var_entry_table, addend);
        self.tls_nid_table = offset_ptr(self.tls_nid_table, addend);
        self.tls_entry_table = offset_ptr(self.tls_entry_table, addend);
    }

    /// Adds `addend` to every element of the function, variable and TLS
    /// entry tables, bounded by the descriptor's own counts.
    ///
    /// # Safety
    ///
    /// The three entry-table pointers must reference valid, writable,
    /// word-aligned tables at their literal addresses, i.e. [`Self::rebase`]
    /// must already have re-expressed them for the address space this runs
    /// in.
    pub unsafe fn rebase_entries(&mut self, addend: i32) {
        rebase_table(table_mut(self.func_entry_table, self.num_functions), addend);
        rebase_table(table_mut(self.var_entry_table, self.num_vars), addend);
        rebase_table(table_mut(self.tls_entry_table, self.num_tls_vars), addend);
    }
}

/// Adds `addend` to every element of an entry table. Like
/// [`SceModuleImports::rebase`], applying `+k` then `-k` restores the table.
pub fn rebase_table(entries: &mut [u32], addend: i32) {
    for entry in entries {
        *entry = offset_ptr(*entry, addend);
    }
}

unsafe fn table_mut<'a>(table: u32, count: u16) -> &'a mut [u32] {
    core::slice::from_raw_parts_mut(table as usize as *mut u32, count as usize)
}

/// One export descriptor (0x20 bytes on disk). The descriptor tagged with
/// the module-info attribute carries the entry-point NID.
#[derive(Copy, Clone, Debug)]
#[repr(C)]
pub struct SceModuleExports {
    pub size: u16,
    pub lib_version: [u8; 2],
    pub attributes: u16,
    pub num_functions: u16,
    pub num_vars: u32,
    pub num_tls_vars: u32,
    pub module_nid: u32,
    pub lib_name: u32,
    pub nid_table: u32,
    pub entry_table: u32,
}

fn offset_ptr(ptr: u32, addend: i32) -> u32 {
    ptr.wrapping_add(addend as u32)
}
