//! Typed addresses.
//!
//! Offsets into the raw file image and resident virtual addresses are easy
//! to mix up in a loader that does its own pointer arithmetic; keeping them
//! as distinct types means the only conversion point is the segment mapping
//! step.

use core::fmt::Display;

/// Resident virtual address.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct Vaddr(pub usize);

impl Display for Vaddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Vaddr {
    pub fn add(self, offset: usize) -> Self {
        Self(self.0 + offset)
    }

    pub fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    pub fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

/// Offset into the raw file image, before segments are mapped.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct FileOff(pub usize);

impl Display for FileOff {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[macro_export]
macro_rules! align_up {
    ($addr:expr, $align:expr) => {
        ($addr + $align - 1) & !($align - 1)
    };
}
