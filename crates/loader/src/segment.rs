//! Segment mapping: allocation, copy-in, zero-fill.

use psp2::{Kernel, MemBlockType, SceUid};

use crate::addr::Vaddr;
use crate::align_up;
use crate::consts::{MAX_SEGMENTS, SEGMENT_ALIGN};
use crate::elf_object::SegmentDescriptor;
use crate::error::Error;
use crate::Result;

/// One segment in its resident location.
#[derive(Copy, Clone, Debug)]
pub struct MappedSegment {
    pub block: SceUid,
    /// Address the image was linked for.
    pub link_base: Vaddr,
    /// Address the allocator actually granted.
    pub base: Vaddr,
    /// Rounded allocation length.
    pub len: usize,
}

/// The image after all segments are copied to their resident locations.
///
/// `base`/`link_base` describe the first loadable segment; every table
/// offset in the module-info record is relative to it, and every absolute
/// address baked into the image is expressed in the link-time space, so the
/// delta between the two re-expresses baked addresses for where the image
/// actually landed. When the allocator honors the fixed load address the
/// delta is zero and translation is the identity.
#[derive(Debug)]
pub struct MappedImage {
    pub segments: heapless::Vec<MappedSegment, MAX_SEGMENTS>,
    pub base: Vaddr,
    pub link_base: Vaddr,
}

impl MappedImage {
    /// Re-expresses a 32-bit link-time address as a resident address.
    pub fn translate(&self, addr: u32) -> Vaddr {
        Vaddr(
            (addr as usize)
                .wrapping_add(self.base.0)
                .wrapping_sub(self.link_base.0),
        )
    }

    /// `true` if `addr` falls inside one of the mapped segments.
    pub fn contains(&self, addr: Vaddr) -> bool {
        self.segments
            .iter()
            .any(|s| addr >= s.base && addr.0 < s.base.0 + s.len)
    }
}

/// Write-protection bracket around a segment copy. Protection is restored
/// when the guard drops, on every exit path.
struct MemUnlock<'a, K: Kernel> {
    kernel: &'a mut K,
}

impl<'a, K: Kernel> MemUnlock<'a, K> {
    fn new(kernel: &'a mut K) -> Self {
        kernel.unlock_mem();
        MemUnlock { kernel }
    }
}

impl<K: Kernel> Drop for MemUnlock<'_, K> {
    fn drop(&mut self) {
        self.kernel.lock_mem();
    }
}

/// Allocates and populates a resident region for every loadable segment.
///
/// Executable segments get a code-capable block, the rest plain data, both
/// rounded up to the 1 MiB allocation granularity. The allocator is expected
/// to honor the fixed link address but a mismatch is only logged; the walk
/// of the import/export tables later uses the granted base.
pub fn load_segments<K: Kernel>(
    kernel: &mut K,
    image: &[u8],
    segments: &[SegmentDescriptor],
) -> Result<MappedImage> {
    if segments.is_empty() {
        log::error!("no program sections to load");
        return Err(Error::NoSegments);
    }
    log::debug!("loading {} program sections", segments.len());

    let mut mapped = heapless::Vec::new();
    for (i, seg) in segments.iter().enumerate() {
        let length = align_up!(seg.mem_size, SEGMENT_ALIGN);
        let block = if seg.executable {
            kernel.alloc_code("UVLHomebrew", length)
        } else {
            kernel.alloc_data("UVLHomebrew", MemBlockType::USER_RW, length)
        }
        .map_err(|e| {
            log::error!("error allocating memory: {}", e);
            Error::Alloc(e)
        })?;
        let base = kernel.block_base(block).map_err(|e| {
            log::error!("error getting memory block address: {}", e);
            Error::Alloc(e)
        })?;
        if base != seg.vaddr.0 {
            log::warn!(
                "section {} wants to be loaded to {} but we allocated {:#x}",
                i,
                seg.vaddr,
                base
            );
        }
        log::debug!("allocated memory at {:#x}, loading section {}", base, i);

        {
            let _unlock = MemUnlock::new(kernel);
            let src = seg
                .file_off
                .0
                .checked_add(seg.file_size)
                .and_then(|end| image.get(seg.file_off.0..end))
                .ok_or(Error::ElfParser("segment data outside the image"))?;
            log::debug!("zeroing {} remainder bytes", seg.mem_size - seg.file_size);
            unsafe {
                let dst = core::slice::from_raw_parts_mut(base as *mut u8, seg.mem_size);
                dst[..seg.file_size].copy_from_slice(src);
                dst[seg.file_size..].fill(0);
            }
        }

        mapped
            .push(MappedSegment {
                block,
                link_base: seg.vaddr,
                base: Vaddr(base),
                len: length,
            })
            .map_err(|_| Error::ElfParser("too many loadable segments"))?;
    }

    let first = mapped[0];
    Ok(MappedImage {
        segments: mapped,
        base: first.base,
        link_base: first.link_base,
    })
}
