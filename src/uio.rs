//! L0: cross-process bulk memory transfer (`process_vm_readv`/`writev`).
//!
//! One (local, remote) I/O-vector pair per call, flags=0, exactly as the
//! kernel call is documented. Obeys page permissions, unlike the
//! word-granule `ptrace` path in [`crate::ptrace`].

use nix::sys::uio::{process_vm_readv, process_vm_writev, IoVec, RemoteIoVec};
use nix::unistd::Pid;

use crate::error::VmError;

type Result<T> = std::result::Result<T, VmError>;

/// Reads `size` bytes from `addr` in `pid`'s address space.
pub fn read_vm(pid: Pid, addr: u64, size: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; size];
    let remote = RemoteIoVec {
        base: addr as usize,
        len: size,
    };

    let got = process_vm_readv(pid, &[IoVec::from_mut_slice(&mut buf)], &[remote]).map_err(
        |source| VmError::Transfer {
            op: "readv",
            pid: pid.as_raw(),
            source,
        },
    )?;

    if got != size {
        return Err(VmError::ShortTransfer {
            op: "readv",
            pid: pid.as_raw(),
            got,
            expected: size,
        });
    }

    Ok(buf)
}

/// Writes `data` to `addr` in `pid`'s address space.
pub fn write_vm(pid: Pid, addr: u64, data: &[u8]) -> Result<()> {
    let remote = RemoteIoVec {
        base: addr as usize,
        len: data.len(),
    };

    let put = process_vm_writev(pid, &[IoVec::from_slice(data)], &[remote]).map_err(|source| {
        VmError::Transfer {
            op: "writev",
            pid: pid.as_raw(),
            source,
        }
    })?;

    if put != data.len() {
        return Err(VmError::ShortTransfer {
            op: "writev",
            pid: pid.as_raw(),
            got: put,
            expected: data.len(),
        });
    }

    Ok(())
}
