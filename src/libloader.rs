//! L3: library injector/uninjector. Builds on the syscall and call
//! injectors plus the symbol resolver to load or unload a shared library
//! inside the tracee via glibc's internal `__libc_dlopen_mode` /
//! `__libc_dlclose` entry points.

use crate::error::{DlcloseError, DlopenError, MmapError, Result};
use crate::inject::{call, syscall};
use crate::process::Process;

/// `RTLD_NOW`, the `dlopen` resolution-mode flag this crate always uses.
const RTLD_NOW: u64 = libc::RTLD_NOW as u64;

/// Size of the scratch mapping used to hold the library path and to serve
/// as the stack frame for the injected `dlopen` call.
const SCRATCH_SIZE: u64 = 8192;

/// Loads `lib_path` into the tracee by calling `__libc_dlopen_mode`
/// (resolved against `libc_path`), and returns the nonzero handle it
/// returns.
pub fn load_library(process: &mut Process, libc_path: &str, lib_path: &str) -> Result<u64> {
    let prot = (libc::PROT_READ | libc::PROT_WRITE) as u64;
    let flags = (libc::MAP_ANONYMOUS | libc::MAP_PRIVATE) as u64;

    let mapping = syscall::syscall(
        process,
        libc::SYS_mmap as u64,
        &[0, SCRATCH_SIZE, prot, flags, 0, 0],
    )?;
    if mapping == 0 {
        return Err(MmapError {
            pid: process.pid().as_raw(),
        }
        .into());
    }

    let mut path_bytes = lib_path.as_bytes().to_vec();
    path_bytes.push(0);
    process.write_mem_array(mapping, &path_bytes)?;

    let dlopen_addr = process.get_sym_addr(libc_path, "__libc_dlopen_mode")?;
    let handler = call::call(
        process,
        dlopen_addr,
        &[mapping, RTLD_NOW],
        Some(mapping + SCRATCH_SIZE / 2),
    )?;

    syscall::syscall(process, libc::SYS_munmap as u64, &[mapping, SCRATCH_SIZE])?;

    if handler == 0 {
        return Err(DlopenError {
            pid: process.pid().as_raw(),
            lib_path: lib_path.to_string(),
        }
        .into());
    }

    Ok(handler)
}

/// Unloads a library previously loaded with [`load_library`] by calling
/// `__libc_dlclose` (resolved against `libc_path`) on `handler`.
pub fn unload_library(process: &mut Process, libc_path: &str, handler: u64) -> Result<()> {
    let dlclose_addr = process.get_sym_addr(libc_path, "__libc_dlclose")?;
    let ret = call::call(process, dlclose_addr, &[handler], None)?;

    if ret != 0 {
        return Err(DlcloseError {
            pid: process.pid().as_raw(),
            handler,
            ret,
        }
        .into());
    }

    Ok(())
}
