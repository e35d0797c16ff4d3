// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Prologue analysis and unwinding of a function in an ELF file
//!
//!     Usage: backtrace [--config FILE] [--sp ADDR] [--debug] ELF-file address
//!
//! This program analyses the prologue of the function containing the given
//! address in the supplied ELF file. It then simulates a stop at the end of
//! that prologue with an otherwise empty stack and unwinds from there.
//! Optionally, a [`DebugConfig`] may be supplied in the form of a TOML file.
//!
//! If run with `--debug` or the environment variable `DEBUG` set to `1`, the
//! library's debug log is printed to stderr.

use std::path::PathBuf;

use riscv_debug_arch::arch::{Architecture, Riscv};
use riscv_debug_arch::breakpoint;
use riscv_debug_arch::config::DebugConfig;
use riscv_debug_arch::registers::{RegisterFile, riscv as regs};
use riscv_debug_arch::scan::{self, PrologueCache};
use riscv_debug_arch::target::{self, Memory, Symbols};
use riscv_debug_arch::unwind::{RegisterLocation, Session, Unwinder};

/// Size of the simulated stack
const STACK_SIZE: usize = 0x1000;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn parse_address(s: &str) -> Result<u64, std::num::ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn main() {
    let matches = clap::Command::new("Backtrace")
        .arg(clap::arg!(<elf> "Path to the ELF file").value_parser(clap::value_parser!(PathBuf)))
        .arg(clap::arg!(<address> "Address within the function").value_parser(parse_address))
        .arg(
            clap::arg!(-c --config <FILE> "Debugger configuration")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(--sp <ADDR> "Stack pointer at the end of the prologue")
                .value_parser(parse_address)
                .default_value("0x7fff0000"),
        )
        .arg(
            clap::arg!(-d --debug "Enable additional debug output")
                .env("DEBUG")
                .action(clap::ArgAction::SetTrue)
                .value_parser(clap::builder::FalseyValueParser::new()),
        )
        .get_matches();

    if matches.get_flag("debug") {
        log::set_logger(&LOGGER).expect("Could not install logger");
        log::set_max_level(log::LevelFilter::Trace);
    }

    let config: DebugConfig = matches
        .get_one::<PathBuf>("config")
        .map(|p| {
            let config = std::fs::read_to_string(p).expect("Could not load configuration");
            toml::from_str(config.as_ref()).expect("Could not parse configuration")
        })
        .unwrap_or_default();
    log::debug!("Configuration: {config:?}");

    // We need the program ...
    let elf_path = matches.get_one::<PathBuf>("elf").expect("No ELF file specified");
    let elf_data = std::fs::read(elf_path).expect("Could not load ELF file");
    let elf = elf::ElfBytes::<elf::endian::AnyEndian>::minimal_parse(elf_data.as_ref())
        .expect("Could not parse ELF file");

    // ... to know what we are dealing with ...
    let arch = Riscv::from_elf(&elf).expect("Could not recognize target");
    println!("Target: {:?}", arch.features());

    // ... and where its functions are.
    let mut symbols = target::elf::ElfSymbols::new(&elf).expect("Could not read symbols");
    let address = *matches.get_one::<u64>("address").expect("No address specified");
    let function = symbols
        .find_function(address)
        .expect("No function found at address");
    println!(
        "Function {} at {:#x}..{:#x}",
        function.name.as_deref().unwrap_or("<unknown>"),
        function.start,
        function.end,
    );

    // The stack is simulated, the code is served from the ELF file.
    let sp = *matches.get_one::<u64>("sp").expect("No stack pointer specified");
    let stack_base = sp.saturating_sub(STACK_SIZE as u64 / 2);
    let mut memory = (
        target::elf::Elf::new(&elf).boxed(),
        target::from_segment_mut(vec![0u8; STACK_SIZE])
            .with_offset(stack_base)
            .boxed(),
    );

    let limit = scan::limit(&config, &mut symbols, function.start, function.end);
    let mut cache = PrologueCache::default();
    let end = scan::scan_prologue(
        &arch,
        &config,
        &mut memory,
        function.start,
        limit,
        Some(&mut cache),
    )
    .expect("Could not scan prologue");
    println!("Prologue ends at {end:#x}, frame size {}", cache.frame_size);
    for (reg, offset) in &cache.saved {
        let name = arch.registers().name(*reg).unwrap_or("?");
        println!("  {name} saved at entry sp {offset:+}");
    }

    let kind = breakpoint::breakpoint_kind(&config, &mut memory, end);
    println!(
        "Breakpoint at {end:#x}: {:02x?}",
        breakpoint::breakpoint_bytes(kind)
    );

    // Stop at the end of the prologue and unwind
    let mut registers = RegisterFile::new(arch.registers());
    registers.set(regs::PC, end).expect("Could not set pc");
    registers.set(regs::SP, sp).expect("Could not set sp");

    let session = Session::new(arch, config);
    let mut unwinder = Unwinder::new(&session, memory, registers, symbols);
    let ra = session.arch().return_address();
    for (level, frame) in unwinder.backtrace().enumerate() {
        match frame {
            Ok(frame) => println!(
                "#{level} pc {:#x} base {:#x} function {:x?}",
                frame.pc, frame.base, frame.function
            ),
            Err(e) => {
                eprintln!("#{level} {e}");
                break;
            }
        }
    }
    match unwinder.unwind_register(0, ra) {
        Ok(RegisterLocation::Address(address)) => println!("Return address saved at {address:#x}"),
        Ok(location) => println!("Return address: {location:?}"),
        Err(e) => eprintln!("Could not unwind return address: {e}"),
    }
}
