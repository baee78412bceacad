//! L1: the process controller — the core engine.
//!
//! Owns the tracee PID, enforces the attach/detach lifecycle, and exposes
//! register I/O, three memory I/O modes, and the three scoped-restore
//! operations the rest of the crate builds on.

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::error::{Result, UsageError};
use crate::maps::{self, Mapping};
use crate::procmem;
use crate::ptrace;
use crate::regs::Registers;
use crate::scope::{ArrayGuard, RegsGuard, WordsGuard};
use crate::uio;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Detached,
    Attached,
}

/// A handle to a traced process. The handle is the exclusive tracer for
/// its PID for as long as it is [`State::Attached`]; no register or memory
/// mutation may be issued while [`State::Detached`].
pub struct Process {
    pid: Pid,
    state: State,
}

impl Process {
    /// Creates a handle for `pid`. The handle starts `Detached`; call
    /// [`Process::attach`] before issuing any other operation.
    pub fn new(pid: i32) -> Self {
        Self {
            pid: Pid::from_raw(pid),
            state: State::Detached,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_attached(&self) -> bool {
        self.state == State::Attached
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.state != State::Attached {
            return Err(UsageError::NotAttached.into());
        }
        Ok(())
    }

    /// Attaches to the tracee and waits for it to stop with `SIGSTOP`.
    pub fn attach(&mut self) -> Result<()> {
        ptrace::attach(self.pid)?;
        ptrace::wait_for_stop(self.pid, Signal::SIGSTOP)?;
        self.state = State::Attached;
        log::debug!("attached to pid {}", self.pid);
        Ok(())
    }

    /// Detaches from the tracee, resuming it.
    pub fn detach(&mut self) -> Result<()> {
        self.ensure_attached()?;
        ptrace::detach(self.pid)?;
        self.state = State::Detached;
        log::debug!("detached from pid {}", self.pid);
        Ok(())
    }

    /// Executes exactly one instruction, then waits for the resulting
    /// `SIGTRAP`.
    pub fn step(&mut self) -> Result<()> {
        self.ensure_attached()?;
        ptrace::singlestep(self.pid)?;
        ptrace::wait_for_stop(self.pid, Signal::SIGTRAP)?;
        Ok(())
    }

    /// Resumes the tracee, expecting it to stop again on `SIGTRAP` (e.g.
    /// a planted `int3`).
    pub fn continue_(&mut self) -> Result<()> {
        self.ensure_attached()?;
        ptrace::cont(self.pid)?;
        ptrace::wait_for_stop(self.pid, Signal::SIGTRAP)?;
        Ok(())
    }

    /// Returns a fresh snapshot of the register frame.
    pub fn get_regs(&self) -> Result<Registers> {
        self.ensure_attached()?;
        Ok(ptrace::get_regs(self.pid)?)
    }

    /// Fills `regs` with the current register frame, avoiding an
    /// allocation when the caller already has a frame to reuse.
    pub fn get_regs_into(&self, regs: &mut Registers) -> Result<()> {
        self.ensure_attached()?;
        *regs = ptrace::get_regs(self.pid)?;
        Ok(())
    }

    /// Installs `regs` as the tracee's register frame.
    pub fn set_regs(&mut self, regs: &Registers) -> Result<()> {
        self.ensure_attached()?;
        ptrace::set_regs(self.pid, regs)?;
        Ok(())
    }

    /// Word mode: reads `n` 8-byte words (`8*n` bytes) starting at `addr`.
    /// Bypasses page read permissions.
    pub fn read_mem_words(&self, addr: u64, n: usize) -> Result<Vec<u8>> {
        self.ensure_attached()?;
        let mut out = Vec::with_capacity(n * 8);
        for i in 0..n {
            let word = ptrace::peek_word(self.pid, addr + 8 * i as u64)?;
            out.extend_from_slice(&word.to_le_bytes());
        }
        Ok(out)
    }

    /// Word mode: writes `data` (length must be a multiple of 8) starting
    /// at `addr`. Bypasses page write permissions.
    pub fn write_mem_words(&mut self, addr: u64, data: &[u8]) -> Result<()> {
        self.ensure_attached()?;
        if data.len() % 8 != 0 {
            return Err(UsageError::UnalignedWordData(data.len()).into());
        }
        for (i, word) in data.chunks_exact(8).enumerate() {
            let word = u64::from_le_bytes(word.try_into().unwrap());
            ptrace::poke_word(self.pid, addr + 8 * i as u64, word)?;
        }
        Ok(())
    }

    /// Array mode: reads `size` bytes starting at `addr` in one bulk
    /// transfer. Obeys page read permissions.
    pub fn read_mem_array(&self, addr: u64, size: usize) -> Result<Vec<u8>> {
        self.ensure_attached()?;
        Ok(uio::read_vm(self.pid, addr, size)?)
    }

    /// Array mode: writes `data` starting at `addr` in one bulk transfer.
    /// Obeys page write permissions.
    pub fn write_mem_array(&mut self, addr: u64, data: &[u8]) -> Result<()> {
        self.ensure_attached()?;
        Ok(uio::write_vm(self.pid, addr, data)?)
    }

    /// Proc-mem mode: reads `size` bytes at virtual address `addr` via a
    /// fresh `/proc/<pid>/mem` open-seek-read-close, read-only.
    pub fn read_mem_proc(&self, addr: u64, size: usize) -> Result<Vec<u8>> {
        self.ensure_attached()?;
        Ok(procmem::read(self.pid.as_raw(), addr, size)?)
    }

    /// Snapshots the register frame, yields a guard the caller can use to
    /// mutate and install new registers, and restores the original frame
    /// when the guard is dropped.
    pub fn get_regs_and_restore(&mut self) -> Result<RegsGuard<'_>> {
        let original = self.get_regs()?;
        Ok(RegsGuard::new(self, original))
    }

    /// Reads the current word-mode memory at `addr`, writes `data` in its
    /// place, and restores the original bytes when the guard is dropped.
    pub fn write_mem_words_and_restore(&mut self, addr: u64, data: &[u8]) -> Result<WordsGuard<'_>> {
        if data.len() % 8 != 0 {
            return Err(UsageError::UnalignedWordData(data.len()).into());
        }
        let original = self.read_mem_words(addr, data.len() / 8)?;
        self.write_mem_words(addr, data)?;
        Ok(WordsGuard::new(self, addr, original))
    }

    /// Reads the current array-mode memory at `addr`, writes `data` in its
    /// place, and restores the original bytes when the guard is dropped.
    pub fn write_mem_array_and_restore(&mut self, addr: u64, data: &[u8]) -> Result<ArrayGuard<'_>> {
        let original = self.read_mem_array(addr, data.len())?;
        self.write_mem_array(addr, data)?;
        Ok(ArrayGuard::new(self, addr, original))
    }

    /// Returns this process's memory mappings, optionally filtered.
    pub fn get_maps(&self, filter: Option<&dyn Fn(&Mapping) -> bool>) -> Result<Vec<Mapping>> {
        Ok(maps::get_maps(self.pid.as_raw(), filter)?)
    }
}
