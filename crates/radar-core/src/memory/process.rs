//! Process attachment.
//!
//! Finds the target by executable name, opens it with read-only rights and
//! resolves the base address of its main module. The handle is closed when
//! the `ProcessHandle` is dropped.

#[cfg(target_os = "windows")]
use tracing::debug;

use crate::error::{Error, Result};

/// An opened target process
#[derive(Debug)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
    /// Base address of the module named `name`
    pub base_address: u64,
    pub module_size: u32,
    #[cfg(target_os = "windows")]
    handle: windows::Win32::Foundation::HANDLE,
}

/// Compare executable names the way Windows does (case-insensitive).
pub fn is_same_executable(candidate: &str, target: &str) -> bool {
    candidate.eq_ignore_ascii_case(target)
}

#[cfg(target_os = "windows")]
fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Find a running process by executable name and open it.
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = find_process_id(name)?;
        Self::open(pid, name)
    }

    /// Open a process by id and resolve the base of `module_name`.
    pub fn open(pid: u32, module_name: &str) -> Result<Self> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        // SAFETY: OpenProcess has no memory-safety preconditions; failure is
        // reported through the returned Result.
        let handle = unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("PID {}: {}", pid, e)))?;

        // Build the value first so the handle is closed if module lookup fails
        let mut process = Self {
            pid,
            name: module_name.to_string(),
            base_address: 0,
            module_size: 0,
            handle,
        };

        let (base_address, module_size) = find_module(pid, module_name)?;
        process.base_address = base_address;
        process.module_size = module_size;

        debug!(
            "Opened {} (PID {}), module base {:#x}, size {:#x}",
            process.name, pid, base_address, module_size
        );

        Ok(process)
    }

    pub(crate) fn raw_handle(&self) -> windows::Win32::Foundation::HANDLE {
        self.handle
    }
}

#[cfg(target_os = "windows")]
fn find_process_id(name: &str) -> Result<u32> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };

    // SAFETY: snapshot creation has no preconditions.
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map_err(|e| Error::ProcessNotFound(format!("{} (snapshot failed: {})", name, e)))?;

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut found = None;
    // SAFETY: `entry` is initialized with the correct dwSize and the snapshot
    // handle is valid until closed below.
    unsafe {
        let mut next = Process32FirstW(snapshot, &mut entry);
        while next.is_ok() {
            if is_same_executable(&wide_to_string(&entry.szExeFile), name) {
                found = Some(entry.th32ProcessID);
                break;
            }
            next = Process32NextW(snapshot, &mut entry);
        }
        let _ = CloseHandle(snapshot);
    }

    found.ok_or_else(|| Error::ProcessNotFound(name.to_string()))
}

#[cfg(target_os = "windows")]
fn find_module(pid: u32, module_name: &str) -> Result<(u64, u32)> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW,
        TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32,
    };

    // SAFETY: snapshot creation has no preconditions.
    let snapshot =
        unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) }
            .map_err(|e| Error::ModuleNotFound(format!("{} (snapshot failed: {})", module_name, e)))?;

    let mut entry = MODULEENTRY32W {
        dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
        ..Default::default()
    };

    let mut found = None;
    // SAFETY: same contract as the process walk above.
    unsafe {
        let mut next = Module32FirstW(snapshot, &mut entry);
        while next.is_ok() {
            if is_same_executable(&wide_to_string(&entry.szModule), module_name) {
                found = Some((entry.modBaseAddr as u64, entry.modBaseSize));
                break;
            }
            next = Module32NextW(snapshot, &mut entry);
        }
        let _ = CloseHandle(snapshot);
    }

    match found {
        Some((0, _)) | None => Err(Error::ModuleNotFound(module_name.to_string())),
        Some(module) => Ok(module),
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        use windows::Win32::Foundation::CloseHandle;

        // SAFETY: the handle was returned by OpenProcess and is closed once.
        if let Err(e) = unsafe { CloseHandle(self.handle) } {
            debug!("CloseHandle failed for PID {}: {}", self.pid, e);
        }
    }
}

// --- Non-Windows stubs ---

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn find_and_open(name: &str) -> Result<Self> {
        Err(Error::ProcessNotFound(format!(
            "{} (process attachment is only supported on Windows)",
            name
        )))
    }

    pub fn open(pid: u32, _module_name: &str) -> Result<Self> {
        Err(Error::ProcessOpenFailed(format!(
            "PID {} (process attachment is only supported on Windows)",
            pid
        )))
    }
}
