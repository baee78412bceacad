//! Typed error kinds for the process-control engine.
//!
//! Each kind models one of the failure modes named in the design: a failed
//! kernel tracing call, a short/failed bulk memory transfer, a symbol that
//! couldn't be resolved, API misuse, or a sentinel-valued failure of one of
//! the injected library-loading steps. They are composed into [`ProcError`],
//! the single error type the crate's public API returns.

use nix::sys::signal::Signal;
use thiserror::Error;

/// A failure of the kernel's process-tracing primitive.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("ptrace({op}) on pid {pid} failed: {source}")]
    Ptrace {
        op: &'static str,
        pid: i32,
        #[source]
        source: nix::Error,
    },
    #[error("waitpid on pid {pid} failed: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: nix::Error,
    },
    #[error("tracee {pid} stopped with unexpected signal {received:?} (expected {expected:?})")]
    UnexpectedSignal {
        pid: i32,
        received: Signal,
        expected: Signal,
    },
    #[error("tracee {pid} exited with status {status} while a stop was expected")]
    TraceeExited { pid: i32, status: i32 },
    #[error("tracee {pid} was terminated by signal {signal:?} while a stop was expected")]
    TraceeSignaled { pid: i32, signal: Signal },
    #[error("waitpid on pid {pid} returned an unhandled status while a stop was expected: {status}")]
    UnexpectedWaitStatus { pid: i32, status: String },
}

/// A failure of the cross-process bulk memory-transfer primitive.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("process_vm_{op} on pid {pid} failed: {source}")]
    Transfer {
        op: &'static str,
        pid: i32,
        #[source]
        source: nix::Error,
    },
    #[error("short process_vm_{op} on pid {pid}: transferred {got} of {expected} bytes")]
    ShortTransfer {
        op: &'static str,
        pid: i32,
        got: usize,
        expected: usize,
    },
}

/// No matching mapping was found while resolving a symbol's remote address.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no writable mapping for {path} found in the local process")]
    LocalAnchorNotFound { path: String },
    #[error("no writable mapping for {path} found in the tracee")]
    RemoteAnchorNotFound { path: String },
    #[error("failed to load {path} in the local process: {source}")]
    LocalLoad {
        path: String,
        #[source]
        source: libloading::Error,
    },
    #[error("symbol {sym} not found in {path}: {source}")]
    SymbolNotFound {
        path: String,
        sym: String,
        #[source]
        source: libloading::Error,
    },
}

/// API misuse: something the caller could have avoided without kernel state.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("data length {0} is not a multiple of the word size (8)")]
    UnalignedWordData(usize),
    #[error("operation requires an attached process, but the handle is detached")]
    NotAttached,
    #[error("at most 6 arguments are supported, got {0}")]
    TooManyArguments(usize),
}

/// The injected `mmap` returned a null pointer.
#[derive(Debug, Error)]
#[error("mmap in tracee {pid} returned NULL")]
pub struct MmapError {
    pub pid: i32,
}

/// `__libc_dlopen_mode` returned a null handle.
#[derive(Debug, Error)]
#[error("dlopen of {lib_path} in tracee {pid} returned NULL (is the path valid inside the tracee?)")]
pub struct DlopenError {
    pub pid: i32,
    pub lib_path: String,
}

/// `__libc_dlclose` returned nonzero.
#[derive(Debug, Error)]
#[error("dlclose of handle {handler:#x} in tracee {pid} failed (returned {ret})")]
pub struct DlcloseError {
    pub pid: i32,
    pub handler: u64,
    pub ret: u64,
}

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum ProcError {
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Mmap(#[from] MmapError),
    #[error(transparent)]
    Dlopen(#[from] DlopenError),
    #[error(transparent)]
    Dlclose(#[from] DlcloseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProcError>;
