//! End-to-end tests against a real tracee: a `sleep` child this test
//! spawns and attaches to directly (not via `PTRACE_TRACEME`), mirroring
//! how the `inject`/`get_sym_addr` binaries attach to an arbitrary PID.

use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use proctrace::error::{ProcError, TraceError, UsageError, VmError};
use proctrace::inject::syscall;
use proctrace::maps;
use proctrace::Process;

fn spawn_sleeper() -> Child {
    let child = Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("failed to spawn sleep(1) as a test tracee");
    // give it a moment to get past exec before we attach.
    thread::sleep(Duration::from_millis(50));
    child
}

fn kill_child(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn attach_and_detach_roundtrip() {
    let child = spawn_sleeper();
    let mut process = Process::new(child.id() as i32);

    assert!(!process.is_attached());
    process.attach().expect("attach should succeed");
    assert!(process.is_attached());

    process.detach().expect("detach should succeed");
    assert!(!process.is_attached());

    kill_child(child);
}

#[test]
fn operations_on_a_detached_handle_are_a_usage_error() {
    let child = spawn_sleeper();
    let process = Process::new(child.id() as i32);

    let err = process.get_regs().unwrap_err();
    assert!(matches!(err, ProcError::Usage(UsageError::NotAttached)));

    kill_child(child);
}

#[test]
fn register_restore_roundtrips_to_the_original_frame() {
    let child = spawn_sleeper();
    let mut process = Process::new(child.id() as i32);
    process.attach().unwrap();

    let before = process.get_regs().unwrap();
    {
        let mut guard = process.get_regs_and_restore().unwrap();
        let p = guard.process_mut();
        let mut regs = p.get_regs().unwrap();
        regs.rax = 0x1234_5678;
        p.set_regs(&regs).unwrap();
        assert_eq!(p.get_regs().unwrap().rax, 0x1234_5678);
    }
    let after = process.get_regs().unwrap();
    assert_eq!(before.rax, after.rax);
    assert_eq!(before.rip, after.rip);

    process.detach().unwrap();
    kill_child(child);
}

#[test]
fn word_mode_memory_restores_after_scope_exit() {
    let child = spawn_sleeper();
    let mut process = Process::new(child.id() as i32);
    process.attach().unwrap();

    let mappings = process.get_maps(Some(&maps::has_perms("w"))).unwrap();
    let target = mappings
        .first()
        .expect("tracee should have at least one writable mapping")
        .start_address;

    let original = process.read_mem_words(target, 1).unwrap();
    let payload = [0xAAu8, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x00, 0x11];
    {
        let mut guard = process
            .write_mem_words_and_restore(target, &payload)
            .unwrap();
        assert_eq!(
            guard.process_mut().read_mem_words(target, 1).unwrap(),
            payload
        );
    }
    assert_eq!(process.read_mem_words(target, 1).unwrap(), original);

    process.detach().unwrap();
    kill_child(child);
}

#[test]
fn getpid_syscall_injection_returns_the_tracees_own_pid() {
    let child = spawn_sleeper();
    let pid = child.id();
    let mut process = Process::new(pid as i32);
    process.attach().unwrap();

    let rip_before = process.get_regs().unwrap().rip;
    let ret = syscall::syscall(&mut process, libc::SYS_getpid as u64, &[]).unwrap();
    let rip_after = process.get_regs().unwrap().rip;

    assert_eq!(ret, pid as u64);
    assert_eq!(rip_before, rip_after);

    process.detach().unwrap();
    kill_child(child);
}

#[test]
fn unexpected_signal_is_reported_with_both_signals() {
    let child = spawn_sleeper();
    let pid = child.id() as i32;
    let mut process = Process::new(pid);
    process.attach().unwrap();

    signal::kill(Pid::from_raw(pid), Signal::SIGUSR1).unwrap();
    let err = process.continue_().unwrap_err();

    match err {
        ProcError::Trace(TraceError::UnexpectedSignal {
            received, expected, ..
        }) => {
            assert_eq!(received, Signal::SIGUSR1);
            assert_eq!(expected, Signal::SIGTRAP);
        }
        other => panic!("expected TraceError::UnexpectedSignal, got {:?}", other),
    }

    // The tracee is now stopped on the delivered SIGUSR1; detach lets it
    // run again before we tear it down.
    process.detach().unwrap();
    kill_child(child);
}

#[test]
fn unaligned_word_write_is_rejected_and_issues_no_write() {
    let child = spawn_sleeper();
    let mut process = Process::new(child.id() as i32);
    process.attach().unwrap();

    let mappings = process.get_maps(Some(&maps::has_perms("w"))).unwrap();
    let target = mappings
        .first()
        .expect("tracee should have at least one writable mapping")
        .start_address;

    let original = process.read_mem_words(target, 1).unwrap();
    let err = process.write_mem_words(target, &[1, 2, 3]).unwrap_err();
    assert!(matches!(
        err,
        ProcError::Usage(UsageError::UnalignedWordData(3))
    ));
    assert_eq!(process.read_mem_words(target, 1).unwrap(), original);

    process.detach().unwrap();
    kill_child(child);
}

#[test]
fn array_mode_write_and_restore_round_trip() {
    let child = spawn_sleeper();
    let mut process = Process::new(child.id() as i32);
    process.attach().unwrap();

    let mappings = process.get_maps(Some(&maps::has_perms("w"))).unwrap();
    let target = mappings
        .first()
        .expect("tracee should have at least one writable mapping")
        .start_address;

    let original = process.read_mem_array(target, 4).unwrap();
    let payload = [0x01u8, 0x02, 0x03, 0x04];
    {
        let mut guard = process
            .write_mem_array_and_restore(target, &payload)
            .unwrap();
        assert_eq!(
            guard.process_mut().read_mem_array(target, 4).unwrap(),
            payload
        );
    }
    assert_eq!(process.read_mem_array(target, 4).unwrap(), original);

    process.detach().unwrap();
    kill_child(child);
}

#[test]
fn word_mode_bypasses_permissions_array_mode_obeys_them() {
    let child = spawn_sleeper();
    let mut process = Process::new(child.id() as i32);
    process.attach().unwrap();

    let mappings = process.get_maps(Some(&maps::has_perms("w"))).unwrap();
    let target = mappings
        .first()
        .expect("tracee should have at least one writable mapping")
        .start_address;
    let page_size = 4096u64;

    let original = process.read_mem_words(target, 1).unwrap();

    syscall::syscall(
        &mut process,
        libc::SYS_mprotect as u64,
        &[target, page_size, libc::PROT_NONE as u64],
    )
    .expect("injecting mprotect(PROT_NONE) should succeed");

    // Word mode goes through the tracing primitive and bypasses page
    // permissions entirely.
    assert_eq!(process.read_mem_words(target, 1).unwrap(), original);

    // Array mode goes through process_vm_readv, which obeys them.
    let err = process.read_mem_array(target, 8).unwrap_err();
    assert!(matches!(err, ProcError::Vm(VmError::Transfer { .. })));

    syscall::syscall(
        &mut process,
        libc::SYS_mprotect as u64,
        &[
            target,
            page_size,
            (libc::PROT_READ | libc::PROT_WRITE) as u64,
        ],
    )
    .expect("restoring page permissions should succeed");

    process.detach().unwrap();
    kill_child(child);
}
