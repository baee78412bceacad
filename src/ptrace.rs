//! L0: a thin, typed wrapper over the kernel's process-tracing primitive.
//!
//! Built on [`nix::sys::ptrace`], which already clears `errno` before each
//! `ptrace(2)` call and inspects it afterwards to distinguish a valid `-1`
//! data word from a genuine failure — the ambiguity the raw syscall has.
//! This module's job is narrower: translate that into [`TraceError`] and
//! pin the request-code binary contract with a unit test, so nothing above
//! this layer touches `nix::Error` or raw `ptrace(2)` request numbers
//! directly.

use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::error::TraceError;
use crate::regs::Registers;

type Result<T> = std::result::Result<T, TraceError>;

fn wrap<T>(pid: Pid, op: &'static str, res: nix::Result<T>) -> Result<T> {
    res.map_err(|source| TraceError::Ptrace {
        op,
        pid: pid.as_raw(),
        source,
    })
}

/// `PTRACE_ATTACH`. The caller must subsequently wait for the tracee to
/// stop (see [`crate::process::Process::attach`]).
pub fn attach(pid: Pid) -> Result<()> {
    wrap(pid, "attach", ptrace::attach(pid))
}

/// `PTRACE_DETACH`, resuming the tracee.
pub fn detach(pid: Pid) -> Result<()> {
    wrap(pid, "detach", ptrace::detach(pid, None))
}

/// `PTRACE_GETREGS`.
pub fn get_regs(pid: Pid) -> Result<Registers> {
    wrap(pid, "getregs", ptrace::getregs(pid))
}

/// `PTRACE_SETREGS`.
pub fn set_regs(pid: Pid, regs: &Registers) -> Result<()> {
    wrap(pid, "setregs", ptrace::setregs(pid, *regs))
}

/// `PTRACE_PEEKDATA`: returns the 8-byte word at `addr`, bypassing page
/// read permissions.
pub fn peek_word(pid: Pid, addr: u64) -> Result<u64> {
    let word = wrap(
        pid,
        "peekdata",
        ptrace::read(pid, addr as ptrace::AddressType),
    )?;
    Ok(word as u64)
}

/// `PTRACE_POKEDATA`: writes the 8-byte word `data` at `addr`, bypassing
/// page write permissions.
pub fn poke_word(pid: Pid, addr: u64, data: u64) -> Result<()> {
    wrap(pid, "pokedata", unsafe {
        ptrace::write(
            pid,
            addr as ptrace::AddressType,
            data as *mut std::ffi::c_void,
        )
    })
}

/// `PTRACE_SINGLESTEP`. Resumes the tracee for exactly one instruction.
pub fn singlestep(pid: Pid) -> Result<()> {
    wrap(pid, "singlestep", ptrace::step(pid, None))
}

/// `PTRACE_CONT`. Resumes the tracee until its next stop.
pub fn cont(pid: Pid) -> Result<()> {
    wrap(pid, "cont", ptrace::cont(pid, None))
}

/// Blocks until `pid` stops, and confirms it stopped due to `expected`.
///
/// Every resume-style operation (`attach`, `step`, `cont`) needs this
/// reconciliation step; a stop on any other signal is a loud failure
/// rather than a silently-ignored condition.
pub fn wait_for_stop(pid: Pid, expected: Signal) -> Result<()> {
    use nix::sys::wait::{self, WaitStatus};

    let status = wait::waitpid(pid, None).map_err(|source| TraceError::Wait {
        pid: pid.as_raw(),
        source,
    })?;

    match status {
        WaitStatus::Stopped(_, received) if received == expected => Ok(()),
        WaitStatus::Stopped(_, received) => Err(TraceError::UnexpectedSignal {
            pid: pid.as_raw(),
            received,
            expected,
        }),
        WaitStatus::Exited(_, code) => Err(TraceError::TraceeExited {
            pid: pid.as_raw(),
            status: code,
        }),
        WaitStatus::Signaled(_, signal, _) => Err(TraceError::TraceeSignaled {
            pid: pid.as_raw(),
            signal,
        }),
        other => {
            log::debug!("unexpected wait status for {}: {:?}", pid, other);
            Err(TraceError::UnexpectedWaitStatus {
                pid: pid.as_raw(),
                status: format!("{:?}", other),
            })
        }
    }
}
