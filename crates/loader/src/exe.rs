//! The load pipeline.

use psp2::Kernel;

use crate::addr::Vaddr;
use crate::consts::{ELF_MAGIC, SCE_HEADER_LEN, SCE_MAGIC};
use crate::elf_object::ElfExe;
use crate::error::Error;
use crate::image::RawImage;
use crate::resolve::{self, Resolver};
use crate::{reclaim, segment, Result};

/// Loads the executable at `path` and returns its entry point.
///
/// This is the loader's single produced operation. The staging image is
/// released whether the pipeline succeeds or not; a release failure on the
/// success path still fails the load, since leaked staging blocks eat the
/// small pool homebrew has to live in.
///
/// The fixed load window is a process-wide singleton: callers must not run
/// two loads concurrently.
pub fn load_executable<K: Kernel, R: Resolver>(
    kernel: &mut K,
    resolver: &mut R,
    path: &str,
) -> Result<Vaddr> {
    log::debug!("opening {} for reading", path);
    let image = RawImage::acquire(kernel, path)?;
    let result = dispatch(kernel, resolver, &image);
    // When the pipeline already failed its error is the one worth
    // reporting; release logs its own failure before returning it.
    match image.release(kernel) {
        Ok(()) => result,
        Err(e) => result.and(Err(e)),
    }
}

/// Classifies the acquired image by magic and hands the embedded ELF to the
/// pipeline.
fn dispatch<K: Kernel, R: Resolver>(
    kernel: &mut K,
    resolver: &mut R,
    image: &RawImage,
) -> Result<Vaddr> {
    let bytes = image.bytes();
    if bytes.len() < 4 {
        log::error!("image too short for a magic number");
        return Err(Error::UnrecognizedFormat);
    }
    log::debug!(
        "magic number: {:#04x} {:#04x} {:#04x} {:#04x}",
        bytes[0],
        bytes[1],
        bytes[2],
        bytes[3]
    );

    if bytes[..4] == ELF_MAGIC {
        log::debug!("found an ELF, loading");
        load_elf(kernel, resolver, bytes)
    } else if bytes[..4] == SCE_MAGIC {
        log::debug!("found a SELF, stripping the {:#x}-byte envelope", SCE_HEADER_LEN);
        let inner = bytes
            .get(SCE_HEADER_LEN..)
            .ok_or(Error::UnrecognizedFormat)?;
        load_elf(kernel, resolver, inner)
    } else {
        log::error!("invalid magic");
        Err(Error::UnrecognizedFormat)
    }
}

/// Validate, locate metadata, reclaim, map, bind, find the entry. The order
/// is load-bearing: tables are only trustworthy after validation, the window
/// must be free before segments land in it, and the import/export walks read
/// resident memory, so every segment must be mapped first.
fn load_elf<K: Kernel, R: Resolver>(kernel: &mut K, resolver: &mut R, data: &[u8]) -> Result<Vaddr> {
    log::debug!("checking headers");
    let exe = ElfExe::new(data)?;
    exe.check_header()?;

    log::debug!("getting module info");
    let info = exe.module_info()?;
    log::debug!(
        "module name: {}, export table offset: {:#x}, import table offset: {:#x}",
        info.name(),
        info.ent_top,
        info.stub_top
    );

    let segments = exe.segments()?;

    log::debug!("cleaning up memory");
    reclaim::free_load_window(kernel, &segments)?;

    let mapped = segment::load_segments(kernel, data, &segments)?;

    resolve::resolve_module_imports(resolver, &mapped, &info)?;

    resolve::find_entry_point(&mapped, &info)
}
