//! `get_sym_addr <pid> <lib_path> <sym_name>` — resolves a symbol's
//! address inside a running process and prints it in hex.

use anyhow::{Context, Result};
use clap::{App, Arg};

use proctrace::Process;

fn run() -> Result<()> {
    let matches = App::new("get-sym-addr")
        .about("Resolve a symbol's address inside a running process")
        .arg(Arg::with_name("pid").required(true).index(1))
        .arg(Arg::with_name("lib").required(true).index(2))
        .arg(Arg::with_name("sym").required(true).index(3))
        .get_matches();

    let pid: i32 = matches
        .value_of("pid")
        .unwrap()
        .parse()
        .context("pid must be an integer")?;
    let lib_path = matches.value_of("lib").unwrap();
    let sym_name = matches.value_of("sym").unwrap();

    let mut process = Process::new(pid);
    process.attach().context("failed to attach to the target")?;

    let result = process.get_sym_addr(lib_path, sym_name);

    process.detach().context("failed to detach from the target")?;

    let addr = result.context("failed to resolve symbol")?;
    println!("Address of {} ({}): {:#x}.", sym_name, lib_path, addr);
    Ok(())
}

fn main() {
    env_logger::init();

    std::process::exit(match run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Fatal: {:#}", e);
            1
        }
    });
}
