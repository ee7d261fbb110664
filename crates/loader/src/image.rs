//! Raw image acquisition.

use psp2::{Kernel, MemBlockType, OpenFlags};

use crate::consts::MAX_BIN_SIZE;
use crate::error::Error;
use crate::Result;

/// A whole executable image read into a freshly allocated staging block.
///
/// The block is a fixed [`MAX_BIN_SIZE`] bytes; files at least that large
/// are read truncated with a warning rather than rejected. Every later
/// structure in the pipeline is a view into this buffer until segments are
/// copied to their resident locations, after which the image is released.
pub struct RawImage {
    base: usize,
    len: usize,
}

impl RawImage {
    pub fn acquire<K: Kernel>(kernel: &mut K, path: &str) -> Result<Self> {
        let fd = kernel.open(path, OpenFlags::RDONLY).map_err(|e| {
            log::error!("failed to open {} for reading: {}", path, e);
            Error::Io(e)
        })?;

        let block = match kernel.alloc_data("UVLTemp", MemBlockType::USER_RW, MAX_BIN_SIZE) {
            Ok(block) => block,
            Err(e) => {
                log::error!("failed to allocate {:#x} bytes of memory: {}", MAX_BIN_SIZE, e);
                let _ = kernel.close(fd);
                return Err(Error::Alloc(e));
            }
        };
        let base = match kernel.block_base(block) {
            Ok(base) => base,
            Err(e) => {
                log::error!("failed to locate base for staging block: {}", e);
                let _ = kernel.close(fd);
                let _ = kernel.free(block);
                return Err(Error::Alloc(e));
            }
        };

        let buf = unsafe { core::slice::from_raw_parts_mut(base as *mut u8, MAX_BIN_SIZE) };
        let len = match kernel.read(fd, buf) {
            Ok(len) => len,
            Err(e) => {
                log::error!("failed to read {}: {}", path, e);
                let _ = kernel.close(fd);
                let _ = kernel.free(block);
                return Err(Error::Io(e));
            }
        };
        if len >= MAX_BIN_SIZE {
            log::warn!(
                "max homebrew size of {:#x} bytes reached, file may be truncated",
                MAX_BIN_SIZE
            );
        }
        log::debug!("read {} bytes from {}", len, path);

        if let Err(e) = kernel.close(fd) {
            // The bytes already read stay valid, but a kernel that cannot
            // close a descriptor is in no state to run homebrew.
            log::error!("failed to close file: {}", e);
            let _ = kernel.free(block);
            return Err(Error::Io(e));
        }

        Ok(RawImage { base, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn bytes(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.base as *const u8, self.len) }
    }

    /// Frees the staging block. The owning block is located by address, not
    /// by the handle returned at allocation time.
    pub fn release<K: Kernel>(self, kernel: &mut K) -> Result<()> {
        let block = kernel.find_block_by_addr(self.base).map_err(|e| {
            log::error!("cannot find staging block by address: {}", e);
            Error::Release(e)
        })?;
        kernel.free(block).map_err(|e| {
            log::error!("cannot free staging block: {}", e);
            Error::Release(e)
        })
    }
}
