// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! RISC-V registers
//!
//! Raw registers are numbered `x0`-`x31` (0-31), `pc` (32), `f0`-`f31`
//! (33-64) and `fcsr` (65). Floating point registers and `fcsr` are absent on
//! targets without them, the upper half of the integer registers is absent on
//! RVE targets. Pseudo registers follow: `fflags` (66) and `frm` (67) if
//! there are floating point registers, the 32bit views `<name>.w` of the
//! integer registers on RV64 and the single precision views `<name>.s` of the
//! floating point registers if those are 64bit wide.

use alloc::format;

use crate::config::Features;

use super::{Composition, Group, RegNum, Register, RegisterModel};

pub const ZERO: RegNum = 0;
pub const RA: RegNum = 1;
pub const SP: RegNum = 2;
pub const GP: RegNum = 3;
pub const TP: RegNum = 4;
pub const T0: RegNum = 5;
pub const FP: RegNum = 8;
pub const S1: RegNum = 9;
pub const A0: RegNum = 10;
pub const A1: RegNum = 11;
pub const PC: RegNum = 32;
pub const F0: RegNum = 33;
pub const FA0: RegNum = F0 + 10;
pub const FCSR: RegNum = 65;
pub const FFLAGS: RegNum = 66;
pub const FRM: RegNum = 67;

/// Number of integer registers, including `x0`
pub const INTEGER_REGS: usize = 32;

/// ABI names of the integer registers
pub const X_NAMES: [&str; INTEGER_REGS] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "fp", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// ABI names of the floating point registers
pub const F_NAMES: [&str; 32] = [
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7", "fs0", "fs1", "fa0", "fa1", "fa2",
    "fa3", "fa4", "fa5", "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7", "fs8", "fs9",
    "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];

/// Build the [`RegisterModel`] for a target with the given [`Features`]
pub fn model(features: &Features) -> RegisterModel {
    let mut model = RegisterModel::new(features.endian);
    let int_regs = usize::from(features.int_registers());

    for (n, name) in X_NAMES.iter().enumerate() {
        let register = Register::raw(name, features.xlen, Group::General)
            .with_alias(&format!("x{n}"));
        let register = match n {
            0 => register.read_only(),
            8 => register.with_alias("s0"),
            _ => register,
        };
        if n < int_regs {
            model.push(register);
        } else {
            model.push_absent();
        }
    }
    model.push(Register::raw("pc", features.xlen, Group::General));

    let has_fp = features.flen > 0;
    for (n, name) in F_NAMES.iter().enumerate() {
        if has_fp {
            let register = Register::raw(name, features.flen, Group::Float);
            model.push(register.with_alias(&format!("f{n}")));
        } else {
            model.push_absent();
        }
    }

    if has_fp {
        model.push(Register::raw("fcsr", 4, Group::System));
        let fflags = Composition::Bitfield {
            raw: FCSR,
            shift: 0,
            bits: 5,
        };
        model.push(Register::pseudo("fflags", 1, Group::System, fflags));
        let frm = Composition::Bitfield {
            raw: FCSR,
            shift: 5,
            bits: 3,
        };
        model.push(Register::pseudo("frm", 1, Group::System, frm));
    } else {
        model.push_absent();
    }

    if features.xlen == 8 {
        for (n, name) in X_NAMES.iter().enumerate().take(int_regs) {
            let raw = n as RegNum;
            let composition = Composition::Truncate { raw, signed: true };
            let register = Register::pseudo(&format!("{name}.w"), 4, Group::Pseudo, composition);
            model.push(if n == 0 { register.read_only() } else { register });
        }
    }

    if features.flen == 8 {
        for (n, name) in F_NAMES.iter().enumerate() {
            let raw = F0 + n as RegNum;
            let composition = Composition::Half { raw, high: false };
            model.push(Register::pseudo(
                &format!("{name}.s"),
                4,
                Group::Pseudo,
                composition,
            ));
        }
    }

    let model = model.with_dwarf(0, ZERO, INTEGER_REGS as u16);
    if has_fp {
        model.with_dwarf(32, F0, 32)
    } else {
        model
    }
}

/// Retrieve the [`RegNum`] of an integer register
pub const fn x(n: u8) -> RegNum {
    n as RegNum
}

/// Retrieve the [`RegNum`] of a floating point register
pub const fn f(n: u8) -> RegNum {
    F0 + n as RegNum
}
