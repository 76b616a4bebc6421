use crate::error::{Error, Result};
use crate::memory::ProcessHandle;

/// Byte-level access to another address space.
///
/// Implementors only provide `read_bytes`; the typed reads are little-endian
/// views over it. A read either returns the full width or fails: there is no
/// retrying and no caching at this level.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Base address of the main module
    fn base_address(&self) -> u64;

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes(to_array(&bytes, address)?))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(f32::from_le_bytes(to_array(&bytes, address)?))
    }

    fn read_i16(&self, address: u64) -> Result<i16> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(i16::from_le_bytes(to_array(&bytes, address)?))
    }

    /// Read a 64-bit pointer. The value is not validated.
    fn read_pointer(&self, address: u64) -> Result<u64> {
        self.read_u64(address)
    }

    /// Read exactly `max_len` bytes and cut at the first NUL.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; names in the target
    /// are ASCII, so replacement characters only show up on garbage reads.
    fn read_cstring(&self, address: u64, max_len: usize) -> Result<String> {
        let bytes = self.read_bytes(address, max_len)?;
        let end = memchr::memchr(0, &bytes).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

fn to_array<const N: usize>(bytes: &[u8], address: u64) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::read_failed(
            address,
            format!("expected {} bytes, got {}", N, bytes.len()),
        )
    })
}

/// Reads from a live process opened through `ProcessHandle`
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }
}

impl ReadMemory for MemoryReader<'_> {
    #[cfg(target_os = "windows")]
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        use std::ffi::c_void;
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;

        // SAFETY: the buffer is valid for `size` bytes and the handle stays open
        // for the lifetime of `self.process`.
        unsafe {
            ReadProcessMemory(
                self.process.raw_handle(),
                address as *const c_void,
                buffer.as_mut_ptr().cast::<c_void>(),
                size,
                Some(&mut bytes_read as *mut usize),
            )
        }
        .map_err(|e| Error::read_failed(address, e.to_string()))?;

        if bytes_read != size {
            return Err(Error::read_failed(
                address,
                format!("partial read: {} of {} bytes", bytes_read, size),
            ));
        }

        Ok(buffer)
    }

    #[cfg(not(target_os = "windows"))]
    fn read_bytes(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
        Err(Error::read_failed(
            address,
            "process memory reading is only supported on Windows",
        ))
    }

    fn base_address(&self) -> u64 {
        self.process.base_address
    }
}
