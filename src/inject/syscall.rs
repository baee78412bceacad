//! The syscall injector: sets up syscall-ABI registers, plants the
//! `syscall` opcode at `rip`, single-steps over exactly that one
//! instruction, and reads back `rax`.

use crate::error::{Result, UsageError};
use crate::process::Process;
use crate::regs::{CallAbi, MAX_ARGS};

/// `syscall` opcode (`0f 05`) followed by padding so the word-mode write
/// has a full 8-byte granule; only the first two bytes ever execute.
pub const SYSCALL_STUB: [u8; 8] = [0x0f, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Injects `syscall_number(args...)` into `process` and returns the
/// syscall's return value (`rax` after the single step).
pub fn syscall(process: &mut Process, syscall_number: u64, args: &[u64]) -> Result<u64> {
    if args.len() > MAX_ARGS {
        return Err(UsageError::TooManyArguments(args.len()).into());
    }

    let mut guard = process.get_regs_and_restore()?;
    let p = guard.process_mut();

    let mut regs = p.get_regs()?;
    regs.rax = syscall_number;
    regs.set_syscall_args(args);
    p.set_regs(&regs)?;

    let ret = {
        let mut mem_guard = p.write_mem_words_and_restore(regs.rip, &SYSCALL_STUB)?;
        let p = mem_guard.process_mut();
        p.step()?;
        p.get_regs()?.rax
    };

    Ok(ret)
}
