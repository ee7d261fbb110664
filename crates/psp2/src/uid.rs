use core::fmt::Display;

/// Kernel object handle (file descriptor, memory block, loaded module).
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Default)]
pub struct SceUid(pub i32);

impl Display for SceUid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

impl From<i32> for SceUid {
    fn from(v: i32) -> Self {
        Self(v)
    }
}
