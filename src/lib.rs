//! A toolbox for inspecting and manipulating another live Linux process:
//! reading/writing its registers and virtual memory, forcing it to
//! execute arbitrary syscalls or call arbitrary functions, and — built on
//! those primitives — loading or unloading a shared library into it.
//!
//! x86-64 Linux only, single-threaded tracees only.

pub mod error;
pub mod inject;
pub mod libloader;
pub mod maps;
pub mod procmem;
pub mod process;
pub mod ptrace;
pub mod regs;
pub mod scope;
pub mod symbol;
pub mod uio;

pub use error::{ProcError, Result};
pub use process::Process;
