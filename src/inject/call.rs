//! The call injector: sets up System V call-ABI registers (and optionally
//! a scratch stack), plants `call rax; int3` at `rip`, continues until the
//! planted trap, and reads back `rax`.
//!
//! `int3`, not a single step, is used so the called function runs to
//! completion and traps on its own return rather than stopping one
//! instruction in.

use crate::error::{Result, UsageError};
use crate::process::Process;
use crate::regs::{CallAbi, MAX_ARGS};

/// `call rax` (`ff d0`), `int3` (`cc`), then padding to fill the 8-byte
/// word-mode granule.
pub const CALL_STUB: [u8; 8] = [0xff, 0xd0, 0xcc, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Injects a call to `fct_addr(args...)` into `process` and returns its
/// return value (`rax` once the planted `int3` traps).
///
/// If `stack_frame_addr` is given, `rsp` and `rbp` are both set to it
/// before the call — needed when the tracee's own stack isn't a suitable
/// place to run from, e.g. immediately after an injected `mmap`.
pub fn call(
    process: &mut Process,
    fct_addr: u64,
    args: &[u64],
    stack_frame_addr: Option<u64>,
) -> Result<u64> {
    if args.len() > MAX_ARGS {
        return Err(UsageError::TooManyArguments(args.len()).into());
    }

    let mut guard = process.get_regs_and_restore()?;
    let p = guard.process_mut();

    let mut regs = p.get_regs()?;
    regs.rax = fct_addr;
    regs.set_call_args(args);
    if let Some(frame) = stack_frame_addr {
        regs.rsp = frame;
        regs.rbp = frame;
    }
    p.set_regs(&regs)?;

    let ret = {
        let mut mem_guard = p.write_mem_words_and_restore(regs.rip, &CALL_STUB)?;
        let p = mem_guard.process_mut();
        p.continue_()?;
        p.get_regs()?.rax
    };

    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_is_call_rax_then_int3_then_padding() {
        assert_eq!(CALL_STUB, [0xff, 0xd0, 0xcc, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn too_many_args_is_a_usage_error() {
        let mut process = Process::new(std::process::id() as i32);
        let err = call(&mut process, 0x1000, &[1, 2, 3, 4, 5, 6, 7], None).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProcError::Usage(UsageError::TooManyArguments(7))
        ));
    }
}
