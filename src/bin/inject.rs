//! `inject <pid> load <libc_path> <lib_path>` / `inject <pid> unload
//! <libc_path> <handler_hex>` — load or unload a shared library into a
//! running process, built on the same `clap`/`anyhow`/`env_logger` stack
//! the rest of this crate's binaries use.

use anyhow::{Context, Result};
use clap::{App, Arg, SubCommand};

use proctrace::{libloader, Process};

fn run() -> Result<()> {
    let matches = App::new("inject")
        .about("Load or unload a shared library into a running process")
        .arg(
            Arg::with_name("pid")
                .help("The pid to inject into")
                .required(true)
                .index(1),
        )
        .subcommand(
            SubCommand::with_name("load")
                .about("Load a library")
                .arg(Arg::with_name("libc").required(true).index(1))
                .arg(Arg::with_name("lib").required(true).index(2)),
        )
        .subcommand(
            SubCommand::with_name("unload")
                .about("Unload a library")
                .arg(Arg::with_name("libc").required(true).index(1))
                .arg(Arg::with_name("handler").required(true).index(2)),
        )
        .get_matches();

    let pid: i32 = matches
        .value_of("pid")
        .unwrap()
        .parse()
        .context("pid must be an integer")?;

    let mut process = Process::new(pid);
    process.attach().context("failed to attach to the target")?;

    let result = match matches.subcommand() {
        ("load", Some(sub)) => {
            let libc_path = sub.value_of("libc").unwrap();
            let lib_path = sub.value_of("lib").unwrap();
            libloader::load_library(&mut process, libc_path, lib_path).map(|handler| {
                println!("Library successfully loaded (handler: {:#x}).", handler);
            })
        }
        ("unload", Some(sub)) => {
            let libc_path = sub.value_of("libc").unwrap();
            let handler = u64::from_str_radix(
                sub.value_of("handler").unwrap().trim_start_matches("0x"),
                16,
            )
            .context("handler must be a hexadecimal number")?;
            libloader::unload_library(&mut process, libc_path, handler).map(|_| {
                println!("Library successfully unloaded.");
            })
        }
        _ => {
            process.detach().ok();
            anyhow::bail!("expected a `load` or `unload` subcommand");
        }
    };

    process.detach().context("failed to detach from the target")?;
    result.context("injection failed")
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
