//! RAM mirror over an erase-before-write flash region
//!
//! Reads are served from the mirror. A write that changes the mirror erases
//! and reprograms the whole region. The mirror only claims to match flash
//! after a successful load or program.

use super::error::{DriverError, DriverResult};

/// A flash region that can only be rewritten as a whole
pub trait FlashRegion {
    /// Read the whole region into `image`
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Hardware` if the flash controller fails.
    fn load(&mut self, image: &mut [u8]) -> DriverResult<()>;

    /// Erase the region and program `image` into it
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Hardware` if the erase or the program fails.
    /// The region contents are then unknown.
    fn program(&mut self, image: &[u8]) -> DriverResult<()>;
}

/// RAM image of an `N`-byte flash region
pub struct FlashMirror<F, const N: usize> {
    region: F,
    image: [u8; N],
    in_sync: bool,
}

impl<F: FlashRegion, const N: usize> FlashMirror<F, N> {
    /// Wrap a region; nothing is read until [`FlashMirror::load`]
    #[must_use]
    pub const fn new(region: F) -> Self {
        Self {
            region,
            image: [0xFF; N],
            in_sync: false,
        }
    }

    /// Fill the mirror from flash
    ///
    /// # Errors
    ///
    /// Propagates the region's read error.
    pub fn load(&mut self) -> DriverResult<()> {
        self.in_sync = false;
        self.region.load(&mut self.image)?;
        self.in_sync = true;
        Ok(())
    }

    /// Whether the mirror is known to match flash
    #[must_use]
    pub const fn in_sync(&self) -> bool {
        self.in_sync
    }

    /// The underlying region
    #[must_use]
    pub const fn region(&self) -> &F {
        &self.region
    }

    /// The underlying region, mutably
    pub fn region_mut(&mut self) -> &mut F {
        &mut self.region
    }

    fn range(offset: usize, len: usize) -> DriverResult<core::ops::Range<usize>> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= N)
            .ok_or(DriverError::InvalidArgument)?;
        Ok(offset..end)
    }

    /// Copy bytes out of the mirror
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` if the range exceeds the region.
    pub fn read(&self, offset: usize, buffer: &mut [u8]) -> DriverResult<()> {
        let range = Self::range(offset, buffer.len())?;
        buffer.copy_from_slice(&self.image[range]);
        Ok(())
    }

    /// Write bytes through to flash
    ///
    /// A write that leaves an in-sync mirror unchanged does not touch flash.
    /// On a failed program the mirror is reloaded from flash, so it never
    /// reports bytes that were not stored.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` if the range exceeds the region,
    /// or the region's error if the program fails.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> DriverResult<()> {
        let range = Self::range(offset, data.len())?;
        if self.in_sync && self.image[range.clone()] == *data {
            return Ok(());
        }
        self.image[range].copy_from_slice(data);

        if let Err(error) = self.region.program(&self.image) {
            self.in_sync = self.region.load(&mut self.image).is_ok();
            return Err(error);
        }
        self.in_sync = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Region that fails the next `failures` programs without storing them
    struct Flaky {
        stored: [u8; 8],
        failures: u32,
        programs: u32,
        loads_fail: bool,
    }

    impl Flaky {
        fn new() -> Self {
            Self {
                stored: [0xFF; 8],
                failures: 0,
                programs: 0,
                loads_fail: false,
            }
        }
    }

    impl FlashRegion for Flaky {
        fn load(&mut self, image: &mut [u8]) -> DriverResult<()> {
            if self.loads_fail {
                return Err(DriverError::Hardware);
            }
            image.copy_from_slice(&self.stored);
            Ok(())
        }

        fn program(&mut self, image: &[u8]) -> DriverResult<()> {
            self.programs += 1;
            if self.failures > 0 {
                self.failures -= 1;
                return Err(DriverError::Hardware);
            }
            self.stored.copy_from_slice(image);
            Ok(())
        }
    }

    fn loaded() -> FlashMirror<Flaky, 8> {
        let mut mirror = FlashMirror::new(Flaky::new());
        mirror.load().expect("load");
        mirror
    }

    #[test]
    fn unchanged_write_skips_flash() {
        let mut mirror = loaded();
        mirror.write(0, &[1, 2]).expect("write");
        mirror.write(0, &[1, 2]).expect("write");
        assert_eq!(mirror.region().programs, 1);
    }

    #[test]
    fn failed_program_keeps_old_bytes() {
        let mut mirror = loaded();
        mirror.region_mut().failures = 1;

        assert_eq!(mirror.write(2, &[7, 7]), Err(DriverError::Hardware));

        let mut buffer = [0u8; 2];
        mirror.read(2, &mut buffer).expect("read");
        assert_eq!(buffer, [0xFF, 0xFF]);
        assert!(mirror.in_sync());
    }

    #[test]
    fn retry_after_failure_reaches_flash() {
        let mut mirror = loaded();
        mirror.region_mut().failures = 1;

        assert!(mirror.write(2, &[7, 7]).is_err());
        mirror.write(2, &[7, 7]).expect("retry");

        assert_eq!(mirror.region().programs, 2);
        assert_eq!(mirror.region().stored[2..4], [7, 7]);
    }

    #[test]
    fn unreadable_flash_forces_reprogram() {
        let mut mirror = loaded();
        mirror.region_mut().failures = 1;
        mirror.region_mut().loads_fail = true;

        assert!(mirror.write(0, &[9]).is_err());
        assert!(!mirror.in_sync());

        mirror.write(0, &[9]).expect("retry");
        assert_eq!(mirror.region().programs, 2);
        assert!(mirror.in_sync());
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut mirror = loaded();
        assert_eq!(mirror.write(7, &[0, 0]), Err(DriverError::InvalidArgument));
        let mut buffer = [0u8; 9];
        assert_eq!(mirror.read(0, &mut buffer), Err(DriverError::InvalidArgument));
    }
}
