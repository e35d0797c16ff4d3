// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Recognition of RISC-V ELF files

use elf::ElfBytes;
use elf::endian::EndianParse;
use elf::file::{Class, FileHeader};

use crate::config::{Endian, Features};

use super::{RecognitionError, Riscv};

/// Object uses compressed instructions
pub const EF_RISCV_RVC: u32 = 0x0001;
/// Mask of the floating point ABI field
pub const EF_RISCV_FLOAT_ABI: u32 = 0x0006;
pub const EF_RISCV_FLOAT_ABI_SOFT: u32 = 0x0000;
pub const EF_RISCV_FLOAT_ABI_SINGLE: u32 = 0x0002;
pub const EF_RISCV_FLOAT_ABI_DOUBLE: u32 = 0x0004;
pub const EF_RISCV_FLOAT_ABI_QUAD: u32 = 0x0006;
/// Object uses the embedded ABI
pub const EF_RISCV_RVE: u32 = 0x0008;

/// Derive the ABI [`Features`] of a program from its ELF header
///
/// The floating point registers are assumed to be exactly as wide as the
/// floating point ABI requires. A 64bit ELF file with the `RVE` flag set is
/// treated as a 32bit one.
pub fn features<P: EndianParse>(header: &FileHeader<P>) -> Result<Features, RecognitionError> {
    if header.e_machine != elf::abi::EM_RISCV {
        return Err(RecognitionError::WrongMachine(header.e_machine));
    }
    if !header.endianness.is_little() {
        return Err(RecognitionError::UnsupportedEndianess);
    }

    let flags = header.e_flags;
    let mut xlen = match header.class {
        Class::ELF32 => 4,
        Class::ELF64 => 8,
    };
    let embedded = flags & EF_RISCV_RVE != 0;
    if embedded && xlen == 8 {
        log::warn!("64-bit ELF with RV32E flag set, assuming 32-bit");
        xlen = 4;
    }
    let flen = match flags & EF_RISCV_FLOAT_ABI {
        EF_RISCV_FLOAT_ABI_SINGLE => 4,
        EF_RISCV_FLOAT_ABI_DOUBLE => 8,
        EF_RISCV_FLOAT_ABI_QUAD => 16,
        _ => 0,
    };

    Ok(Features {
        xlen,
        flen,
        abi_flen: flen,
        embedded,
        compressed: flags & EF_RISCV_RVC != 0,
        zcmp: false,
        endian: Endian::Little,
    })
}

impl Riscv {
    /// Create a RISC-V architecture for the program in the given ELF file
    ///
    /// See [`features`] for how the target's [`Features`] are derived.
    pub fn from_elf<P: EndianParse>(elf: &ElfBytes<'_, P>) -> Result<Self, RecognitionError> {
        let features = features(&elf.ehdr)?;
        log::debug!("Recognized {features:?}");
        Self::try_new(features)
    }
}
