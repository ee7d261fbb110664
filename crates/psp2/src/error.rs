use core::fmt::Display;

/// Raw error code reported by a kernel service.
///
/// The platform reports failures as negative 32-bit codes; the loader never
/// interprets individual codes, it only carries them into its own error type
/// for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SceError(pub i32);

impl Display for SceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

pub type SceResult<T> = Result<T, SceError>;
