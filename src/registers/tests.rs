// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

use crate::config::Features;

#[test]
fn rv64gc_layout() {
    let model = riscv::model(&Features::RV64GC);
    assert_eq!(model.raw_count(), 66);
    assert_eq!(model.len(), 68 + 32 + 32);
    assert_eq!(model.find("sp"), Some(riscv::SP));
    assert_eq!(model.find("x2"), Some(riscv::SP));
    assert_eq!(model.find("s0"), Some(riscv::FP));
    assert_eq!(model.find("fp"), Some(riscv::FP));
    assert_eq!(model.find("f10"), Some(riscv::FA0));
    assert_eq!(model.find("fcsr"), Some(riscv::FCSR));
    assert_eq!(model.find("frm"), Some(riscv::FRM));
    assert_eq!(model.find("a0.w"), Some(68 + 10));
    assert_eq!(model.find("fa0.s"), Some(68 + 32 + 10));
    assert_eq!(model.find("x32"), None);
    assert_eq!(model.name(riscv::FFLAGS), Some("fflags"));
    assert_eq!(model.name(riscv::x(31)), Some("t6"));
    assert_eq!(model.width(riscv::PC), Some(8));
    assert_eq!(model.width(riscv::f(0)), Some(8));
    assert_eq!(model.width(riscv::FCSR), Some(4));
    assert!(model.is_pseudo(riscv::FRM));
    assert!(!model.is_pseudo(riscv::FCSR));
    assert!(model.is_read_only(riscv::ZERO));
    assert!(!model.is_read_only(riscv::RA));
    assert_eq!(model.group(Group::Float).count(), 32);
    assert_eq!(model.group(Group::General).count(), 33);
    assert_eq!(model.group(Group::Pseudo).count(), 64);
}

#[test]
fn rv32e_layout() {
    let features = Features {
        embedded: true,
        ..Features::RV32IMAC
    };
    let model = riscv::model(&features);
    assert_eq!(model.raw_count(), 66);
    assert_eq!(model.len(), 66);
    assert_eq!(model.find("a5"), Some(15));
    assert_eq!(model.find("a6"), None);
    assert_eq!(model.find("ft0"), None);
    assert_eq!(model.find("frm"), None);
    assert_eq!(model.width(riscv::PC), Some(4));

    let mut regs = RegisterFile::new(&model);
    assert_eq!(regs.set(16, 1), Err(Error::NoRegister(16)));
    assert_eq!(regs.set(riscv::FCSR, 1), Err(Error::NoRegister(riscv::FCSR)));
    assert_eq!(regs.set(riscv::A0, 0x1_0000_0001), Ok(()));
    assert_eq!(regs.get(riscv::A0), Some(1));
}

#[test]
fn dwarf() {
    let model = riscv::model(&Features::RV64GC);
    assert_eq!(model.from_dwarf(2), Some(riscv::SP));
    assert_eq!(model.from_dwarf(42), Some(riscv::FA0));
    assert_eq!(model.from_dwarf(64), None);

    let model = riscv::model(&Features::RV32I);
    assert_eq!(model.from_dwarf(31), Some(riscv::x(31)));
    assert_eq!(model.from_dwarf(32), None);
}

#[test]
fn fcsr_fields() {
    let model = riscv::model(&Features::RV64GC);
    let mut regs = RegisterFile::new(&model);
    regs.set(riscv::FCSR, 0xff).unwrap();
    assert_eq!(model.read_value(&mut regs, riscv::FFLAGS), Ok(0x1f));
    assert_eq!(model.read_value(&mut regs, riscv::FRM), Ok(0x7));

    model.write_value(&mut regs, riscv::FFLAGS, 0x35).unwrap();
    assert_eq!(regs.get(riscv::FCSR), Some(0xf5));
    model.write_value(&mut regs, riscv::FRM, 0x2).unwrap();
    assert_eq!(regs.get(riscv::FCSR), Some(0x55));
}

#[test]
fn word_views() {
    let model = riscv::model(&Features::RV64GC);
    let mut regs = RegisterFile::new(&model);
    let a0w = model.find("a0.w").unwrap();

    model.write_value(&mut regs, a0w, 0x8000_0000).unwrap();
    assert_eq!(regs.get(riscv::A0), Some(0xffff_ffff_8000_0000));
    assert_eq!(model.read_value(&mut regs, a0w), Ok(0x8000_0000));

    model.write_value(&mut regs, a0w, 0x7fff_ffff).unwrap();
    assert_eq!(regs.get(riscv::A0), Some(0x7fff_ffff));

    regs.set(riscv::A0, 0x1234_5678_9abc_def0).unwrap();
    assert_eq!(model.read_value(&mut regs, a0w), Ok(0x9abc_def0));

    let zero = model.find("zero.w").unwrap();
    assert_eq!(
        model.write_value(&mut regs, zero, 1),
        Err(Error::ReadOnly(zero))
    );
}

#[test]
fn single_views() {
    let model = riscv::model(&Features::RV64GC);
    let mut regs = RegisterFile::new(&model);
    let fa0s = model.find("fa0.s").unwrap();

    regs.set(riscv::FA0, 0xffff_ffff_3f80_0000).unwrap();
    assert_eq!(model.read_value(&mut regs, fa0s), Ok(0x3f80_0000));

    model.write_value(&mut regs, fa0s, 0x4000_0000).unwrap();
    assert_eq!(regs.get(riscv::FA0), Some(0xffff_ffff_4000_0000));
}

#[test]
fn pseudo_roundtrip() {
    const VALUES: [u64; 6] = [0, 1, 0x5a, 0x7fff_ffff, 0x8000_0000, 0xffff_ffff];

    for features in [Features::RV64GC, Features::RV64GC.with_endian(Endian::Big)] {
        let model = riscv::model(&features);
        let mut regs = RegisterFile::new(&model);
        for regnum in model.raw_count() as RegNum..model.len() as RegNum {
            let Some(Layout::Pseudo(composition)) = model.get(regnum).map(|r| r.layout) else {
                panic!("Not a pseudo register: {regnum}");
            };
            if model.is_read_only(regnum) {
                continue;
            }
            let bits = match composition {
                Composition::Bitfield { bits, .. } => bits.into(),
                _ => 8 * model.width(regnum).unwrap() as u32,
            };
            for value in VALUES.iter().map(|v| v & ((1 << bits) - 1)) {
                model.write_value(&mut regs, regnum, value).unwrap();
                assert_eq!(model.read_value(&mut regs, regnum), Ok(value), "{regnum}");
            }
        }
    }
}

#[test]
fn read_only() {
    let model = riscv::model(&Features::RV32I);
    let mut regs = RegisterFile::new(&model);
    assert_eq!(
        model.write_value(&mut regs, riscv::ZERO, 1),
        Err(Error::ReadOnly(riscv::ZERO))
    );
    assert_eq!(model.read_value(&mut regs, riscv::ZERO), Ok(0));
}

#[test]
fn width_mismatch() {
    let model = riscv::model(&Features::RV64GC);
    let mut regs = RegisterFile::new(&model);
    let mut buf = [0u8; 4];
    assert_eq!(
        model.read(&mut regs, riscv::SP, &mut buf),
        Err(Error::Width {
            regnum: riscv::SP,
            expected: 8,
            actual: 4,
        })
    );
    assert_eq!(
        regs.write_register(riscv::SP, &buf),
        Err(Error::Width {
            regnum: riscv::SP,
            expected: 8,
            actual: 4,
        })
    );
}

#[test]
fn error_display() {
    use alloc::string::ToString;

    let width = Error::<Infallible>::Width {
        regnum: riscv::SP,
        expected: 8,
        actual: 4,
    };
    assert_eq!(
        width.to_string(),
        "Register 2 is 8 bytes wide, buffer holds 4"
    );
    assert_eq!(
        Error::<Infallible>::ReadOnly(riscv::ZERO).to_string(),
        "Register 0 is read-only"
    );
    assert_eq!(Error::<Infallible>::NoRegister(300).to_string(), "No register 300");
}

fn pair_model(endian: Endian) -> RegisterModel {
    let mut model = RegisterModel::new(endian);
    let low = model.push(Register::raw("lo", 4, Group::General));
    let high = model.push(Register::raw("hi", 4, Group::General));
    model.push(Register::raw("wide", 8, Group::General));
    model.push(Register::pseudo(
        "pair",
        8,
        Group::Pseudo,
        Composition::Concat { low, high },
    ));
    model.push(Register::pseudo(
        "upper",
        4,
        Group::Pseudo,
        Composition::Half { raw: 2, high: true },
    ));
    model
}

#[test]
fn concat() {
    for endian in [Endian::Little, Endian::Big] {
        let model = pair_model(endian);
        assert_eq!(model.raw_count(), 3);
        let mut regs = RegisterFile::new(&model);
        let pair = model.find("pair").unwrap();

        model
            .write_value(&mut regs, pair, 0x1122_3344_5566_7788)
            .unwrap();
        assert_eq!(regs.get(0), Some(0x5566_7788));
        assert_eq!(regs.get(1), Some(0x1122_3344));
        assert_eq!(
            model.read_value(&mut regs, pair),
            Ok(0x1122_3344_5566_7788)
        );
    }
}

#[test]
fn high_half() {
    for endian in [Endian::Little, Endian::Big] {
        let model = pair_model(endian);
        let mut regs = RegisterFile::new(&model);
        let upper = model.find("upper").unwrap();

        regs.set(2, 0x1122_3344_5566_7788).unwrap();
        assert_eq!(model.read_value(&mut regs, upper), Ok(0x1122_3344));
        model.write_value(&mut regs, upper, 0xaabb_ccdd).unwrap();
        assert_eq!(regs.get(2), Some(0xaabb_ccdd_5566_7788));
    }
}
