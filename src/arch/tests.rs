// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

use alloc::string::ToString;

use crate::config::Features;
use crate::instruction::bits::Bits;
use crate::instruction::decode::Decode;
use crate::registers::riscv as regs;

fn rv64() -> Riscv {
    Riscv::new(Features::RV64GC.with_zcmp(true))
}

fn decode(arch: &Riscv, bits: Bits) -> crate::instruction::Instruction {
    arch.decoder().decode_bits(bits)
}

macro_rules! effect_test {
    ($n:ident, $b:expr, $e:expr) => {
        effect_test!($n, $b, 0x1000, $e);
    };
    ($n:ident, $b:expr, $pc:literal, $e:expr) => {
        #[test]
        fn $n() {
            let arch = rv64();
            let insn = decode(&arch, $b);
            assert_eq!(arch.prologue_effect(&insn, $pc), $e);
        }
    };
}

effect_test!(
    addi_sp,
    Bits::Bit32(0xfe010113),
    Effect::AddImm {
        dst: regs::SP,
        src: regs::SP,
        imm: -32
    }
);
effect_test!(
    c_addi16sp,
    Bits::Bit16(0x7155),
    Effect::AddImm {
        dst: regs::SP,
        src: regs::SP,
        imm: -208
    }
);
effect_test!(
    sd_ra,
    Bits::Bit32(0x00113c23),
    Effect::Store {
        src: regs::RA,
        base: regs::SP,
        offset: 24,
        width: 8
    }
);
effect_test!(
    fsd_fs0,
    Bits::Bit32(0x00813427),
    Effect::Store {
        src: regs::f(8),
        base: regs::SP,
        offset: 8,
        width: 8
    }
);
effect_test!(
    c_mv,
    Bits::Bit16(0x840a),
    Effect::Add {
        dst: regs::FP,
        lhs: regs::ZERO,
        rhs: regs::SP
    }
);
effect_test!(
    c_ldsp,
    Bits::Bit16(0x6422),
    Effect::Load {
        dst: regs::FP,
        base: regs::SP,
        offset: 8,
        width: 8
    }
);
effect_test!(
    lui,
    Bits::Bit32(0xfff0f8b7),
    Effect::Constant {
        dst: 17,
        value: 0xffff_ffff_fff0_f000
    }
);
effect_test!(
    auipc,
    Bits::Bit32(0x00001297),
    0x2000,
    Effect::Constant {
        dst: regs::T0,
        value: 0x3000
    }
);
effect_test!(
    cm_push,
    Bits::Bit16(0xb862),
    Effect::Push {
        registers: &[1, 8, 9],
        slot: 8,
        adjust: 32
    }
);
effect_test!(nop, Bits::Bit32(0x00000013), Effect::Nop);
effect_test!(c_nop, Bits::Bit16(0x0001), Effect::Nop);
effect_test!(ret, Bits::Bit16(0x8082), Effect::ControlTransfer);
effect_test!(call, Bits::Bit32(0x1030d0ef), Effect::ControlTransfer);
effect_test!(beqz, Bits::Bit16(0xca4d), Effect::ControlTransfer);
effect_test!(
    store_elsewhere,
    Bits::Bit32(0x00b52023),
    Effect::Other { dst: None }
);
effect_test!(
    mul,
    Bits::Bit32(0x02b50533),
    Effect::Other { dst: None }
);
effect_test!(
    xori,
    Bits::Bit32(0xfff54513),
    Effect::Other {
        dst: Some(regs::A0)
    }
);

macro_rules! epilogue_test {
    ($n:ident, $b:expr, $e:expr) => {
        #[test]
        fn $n() {
            let arch = rv64();
            let insn = decode(&arch, $b);
            assert_eq!(arch.epilogue_step(&insn), $e);
        }
    };
}

epilogue_test!(release, Bits::Bit16(0x6105), EpilogueStep::Release(32));
epilogue_test!(grow, Bits::Bit16(0x1101), EpilogueStep::Other);
epilogue_test!(
    reload_ra,
    Bits::Bit16(0x60e2),
    EpilogueStep::Reload { dst: regs::RA }
);
epilogue_test!(
    restore_sp,
    Bits::Bit32(0xfe040113),
    EpilogueStep::RestoreSp
);
epilogue_test!(mv_sp_fp, Bits::Bit16(0x8122), EpilogueStep::RestoreSp);
epilogue_test!(
    epilogue_ret,
    Bits::Bit32(0x00008067),
    EpilogueStep::Return { release: 0 }
);
epilogue_test!(
    popret,
    Bits::Bit16(0xbe62),
    EpilogueStep::Return { release: 32 }
);
epilogue_test!(pop, Bits::Bit16(0xba62), EpilogueStep::Release(32));
epilogue_test!(epilogue_nop, Bits::Bit16(0x0001), EpilogueStep::Nop);
epilogue_test!(jump, Bits::Bit16(0xab91), EpilogueStep::Other);

macro_rules! atomic_test {
    ($n:ident, $b:expr, $e:expr) => {
        #[test]
        fn $n() {
            let arch = rv64();
            let insn = decode(&arch, $b);
            assert_eq!(arch.atomic_step(&insn, 0x1000), $e);
        }
    };
}

atomic_test!(
    lr_w,
    Bits::Bit32(0x100527af),
    AtomicStep::LoadReserved { width: 4 }
);
atomic_test!(
    sc_d,
    Bits::Bit32(0x18b5372f),
    AtomicStep::StoreConditional { width: 8 }
);
atomic_test!(
    bnez,
    Bits::Bit16(0xe6cd),
    AtomicStep::Branch {
        target: Some(0x10aa),
        conditional: true
    }
);
atomic_test!(
    j,
    Bits::Bit16(0xab91),
    AtomicStep::Branch {
        target: Some(0x1554),
        conditional: false
    }
);
atomic_test!(add, Bits::Bit16(0x952e), AtomicStep::Arithmetic);
atomic_test!(amo, Bits::Bit32(0x00b6252f), AtomicStep::Other);
atomic_test!(load, Bits::Bit16(0x6422), AtomicStep::Other);

#[test]
fn classification() {
    let arch = rv64();
    let ret = decode(&arch, Bits::Bit16(0x8082));
    assert!(arch.is_return(&ret));
    assert!(arch.is_control_transfer(&ret));
    assert!(arch.is_compact_branch(&ret));
    assert!(!arch.has_delay_slot(&ret));
    assert_eq!(arch.length(&ret), 2);

    let addi = decode(&arch, Bits::Bit32(0xfe010113));
    assert!(!arch.is_control_transfer(&addi));
    assert!(!arch.is_compact_branch(&addi));
    assert_eq!(arch.length(&addi), 4);

    assert_eq!(arch.insn_alignment(), 2);
    assert_eq!(Riscv::new(Features::RV32I).insn_alignment(), 4);
    assert_eq!(arch.address_size(), 8);
    assert_eq!(arch.stack_pointer(), regs::SP);
    assert_eq!(arch.frame_pointer(), Some(regs::FP));
    assert_eq!(arch.return_address(), regs::RA);
    assert_eq!(arch.program_counter(), regs::PC);
    assert_eq!(arch.zero_register(), Some(regs::ZERO));
}

#[test]
fn decode_from_memory() {
    let arch = rv64();
    let code = b"\x01\x11\x06\xec\x13\x00\x00\x00";
    let mut memory = crate::target::from_segment(code).with_offset(0x1000);
    let first = arch.decode(&mut memory, 0x1000).unwrap();
    assert_eq!(first.to_string(), "addi x2, x2, -32");
    let second = arch.decode(&mut memory, 0x1002).unwrap();
    assert_eq!(second.to_string(), "sd x1, 24(x2)");
    assert!(arch.decode(&mut memory, 0x1008).is_err());
}

#[test]
fn recognition() {
    assert!(Riscv::try_new(Features::RV64GC).is_ok());
    assert_eq!(
        Riscv::try_new(Features {
            xlen: 2,
            ..Features::RV32I
        })
        .err(),
        Some(RecognitionError::UnsupportedXlen(2))
    );
    assert_eq!(
        Riscv::try_new(Features {
            abi_flen: 8,
            ..Features::RV32I
        })
        .err(),
        Some(RecognitionError::FloatAbi {
            required: 8,
            available: 0
        })
    );

    let program = Features {
        abi_flen: 4,
        ..Features::RV64GC
    };
    let arch = Riscv::for_target(&program, &Features::RV64GC).unwrap();
    assert_eq!(arch.features().abi_flen, 4);
    assert_eq!(arch.features().flen, 8);
    assert_eq!(
        Riscv::for_target(&Features::RV64GC, &Features::RV64I).err(),
        Some(RecognitionError::FloatAbi {
            required: 8,
            available: 0
        })
    );
    assert_eq!(
        Riscv::for_target(&Features::RV32IMAC, &Features::RV64GC).err(),
        Some(RecognitionError::XlenMismatch {
            program: 4,
            target: 8
        })
    );
}
