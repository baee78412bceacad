//! The x86-64 general-purpose register frame.
//!
//! This is a binary contract with the kernel: rather than hand-declaring a
//! parallel struct that could drift from `PTRACE_GETREGS`'s actual layout,
//! we reuse `libc::user_regs_struct` directly. `Registers` is a transparent
//! alias so the field names (`r15, ..., rsp, ss, fs_base, gs_base, ds, es,
//! fs, gs`) are exactly the kernel's.

/// The full register frame exchanged by `PTRACE_GETREGS`/`PTRACE_SETREGS`.
pub type Registers = libc::user_regs_struct;

/// Registers used to pass the first six integer arguments, in order, for
/// the Linux syscall ABI and the System V `call` ABI respectively.
///
/// Note the syscall ABI uses `r10` where the `call` ABI uses `rcx` — the
/// kernel clobbers `rcx` and `r11` on the `syscall` instruction itself, so
/// the fourth argument is relocated to `r10`.
pub trait CallAbi {
    /// Writes `args` (at most 6) into the syscall-ABI argument registers
    /// (`rdi, rsi, rdx, r10, r8, r9`).
    fn set_syscall_args(&mut self, args: &[u64]);

    /// Writes `args` (at most 6) into the System V `call`-ABI argument
    /// registers (`rdi, rsi, rdx, rcx, r8, r9`).
    fn set_call_args(&mut self, args: &[u64]);
}

impl CallAbi for Registers {
    fn set_syscall_args(&mut self, args: &[u64]) {
        let slots = [
            &mut self.rdi,
            &mut self.rsi,
            &mut self.rdx,
            &mut self.r10,
            &mut self.r8,
            &mut self.r9,
        ];
        for (slot, arg) in slots.into_iter().zip(args) {
            *slot = *arg;
        }
    }

    fn set_call_args(&mut self, args: &[u64]) {
        let slots = [
            &mut self.rdi,
            &mut self.rsi,
            &mut self.rdx,
            &mut self.rcx,
            &mut self.r8,
            &mut self.r9,
        ];
        for (slot, arg) in slots.into_iter().zip(args) {
            *slot = *arg;
        }
    }
}

/// Maximum number of integer arguments either ABI this crate models can
/// pass in registers.
pub const MAX_ARGS: usize = 6;
