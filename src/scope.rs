//! RAII scoped-restore guards.
//!
//! "Runs on every exit path, including panics" is exactly what `Drop`
//! gives for free — these guards snapshot in their constructor and
//! restore in `drop`, so a panicking caller still gets the restoration as
//! the stack unwinds through the guard.
//!
//! Each guard holds `&mut Process` for its lifetime. That's what the
//! "at-most-one scoped-restore nests correctly" invariant reduces to at
//! compile time: the borrow checker already refuses a second overlapping
//! mutable borrow of the same `Process`, so two interleaved register
//! restorations are a compile error, not a runtime usage error, for any
//! caller who doesn't reach for interior mutability to defeat it.

use crate::process::Process;
use crate::regs::Registers;

/// Restores the register frame that was live when the guard was created.
///
/// Constructed by [`crate::process::Process::get_regs_and_restore`]. The
/// current frame is reachable and mutable through the guard itself.
pub struct RegsGuard<'p> {
    process: &'p mut Process,
    original: Registers,
}

impl<'p> RegsGuard<'p> {
    pub(crate) fn new(process: &'p mut Process, original: Registers) -> Self {
        Self { process, original }
    }

    /// The `Process` this guard is scoped over, for issuing further calls
    /// (e.g. `set_regs`, or acquiring a nested memory guard) while the
    /// register restore is pending.
    pub fn process_mut(&mut self) -> &mut Process {
        self.process
    }
}

impl Drop for RegsGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.process.set_regs(&self.original) {
            log::error!(
                "failed to restore registers for pid {} on scope exit: {}",
                self.process.pid(),
                e
            );
        }
    }
}

/// Restores the 8-byte-granule memory that was live when the guard was
/// created. Constructed by
/// [`crate::process::Process::write_mem_words_and_restore`].
pub struct WordsGuard<'p> {
    process: &'p mut Process,
    addr: u64,
    original: Vec<u8>,
}

impl<'p> WordsGuard<'p> {
    pub(crate) fn new(process: &'p mut Process, addr: u64, original: Vec<u8>) -> Self {
        Self {
            process,
            addr,
            original,
        }
    }

    pub fn process_mut(&mut self) -> &mut Process {
        self.process
    }
}

impl Drop for WordsGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.process.write_mem_words(self.addr, &self.original) {
            log::error!(
                "failed to restore word-mode memory at {:#x} for pid {} on scope exit: {}",
                self.addr,
                self.process.pid(),
                e
            );
        }
    }
}

/// Restores the bulk-transfer memory that was live when the guard was
/// created. Constructed by
/// [`crate::process::Process::write_mem_array_and_restore`].
pub struct ArrayGuard<'p> {
    process: &'p mut Process,
    addr: u64,
    original: Vec<u8>,
}

impl<'p> ArrayGuard<'p> {
    pub(crate) fn new(process: &'p mut Process, addr: u64, original: Vec<u8>) -> Self {
        Self {
            process,
            addr,
            original,
        }
    }

    pub fn process_mut(&mut self) -> &mut Process {
        self.process
    }
}

impl Drop for ArrayGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.process.write_mem_array(self.addr, &self.original) {
            log::error!(
                "failed to restore array-mode memory at {:#x} for pid {} on scope exit: {}",
                self.addr,
                self.process.pid(),
                e
            );
        }
    }
}
