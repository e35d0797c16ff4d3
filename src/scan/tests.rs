// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

use alloc::vec;
use alloc::vec::Vec;

use crate::arch::Riscv;
use crate::config::{DEBUG_CONFIG, Features};
use crate::instruction::bits::Bits;
use crate::registers::riscv as regs;
use crate::target::{self, Function, NoSymbols};
use crate::tests::{assemble, code};

const NOP: u32 = 0x00000013;
const RET: u32 = 0x00008067;
const MUL: u32 = 0x02b50533;
const ADD_A5: u32 = 0x00b787b3;
const LR_W: u32 = 0x100527af;
const SC_W: u32 = 0x18f5272f;

fn scan(arch: &Riscv, insns: &[u32], limit: u64) -> (u64, PrologueCache) {
    let mut memory = code(0x1000, insns);
    let mut cache = PrologueCache::default();
    let end = scan_prologue(arch, &DEBUG_CONFIG, &mut memory, 0x1000, limit, Some(&mut cache))
        .expect("Could not scan prologue");
    (end, cache)
}

#[test]
fn rv32_frame() {
    let arch = Riscv::new(Features::RV32IMAC);
    // addi sp,sp,-32; sw ra,28(sp); sw s0,24(sp); call
    let insns = [0xfe010113, 0x00112e23, 0x00812c23, 0x100000ef];
    let (end, cache) = scan(&arch, &insns, 0x1100);
    assert_eq!(end, 0x100c);
    assert_eq!(cache.end, 0x100c);
    assert_eq!(cache.saved(regs::RA), Some(-4));
    assert_eq!(cache.sp_offset(regs::RA), Some(28));
    assert_eq!(cache.saved(regs::FP), Some(-8));
    assert_eq!(cache.sp_offset(regs::FP), Some(24));
    assert_eq!(cache.saved(regs::S1), None);
    assert_eq!(cache.frame_size, 32);
    assert_eq!(cache.base_register, regs::SP);
    assert_eq!(cache.base_offset, 32);
    assert!(!cache.dynamic);
}

#[test]
fn fp_frame() {
    let arch = Riscv::new(Features::RV64GC);
    // addi sp,sp,-32; sd ra,24(sp); sd s0,16(sp); addi s0,sp,32; call
    let insns = [0xfe010113, 0x00113c23, 0x00813823, 0x02010413, 0x100000ef];
    let (end, cache) = scan(&arch, &insns, 0x1100);
    assert_eq!(end, 0x1010);
    assert_eq!(cache.saved(regs::RA), Some(-8));
    assert_eq!(cache.saved(regs::FP), Some(-16));
    assert_eq!(cache.frame_size, 32);
    assert_eq!(cache.base_register, regs::FP);
    assert_eq!(cache.base_offset, 0);
}

#[test]
fn first_save_wins() {
    let arch = Riscv::new(Features::RV64GC);
    // addi sp,sp,-16; sd ra,8(sp); sd ra,0(sp)
    let (end, cache) = scan(&arch, &[0xff010113, 0x00113423, 0x00113023], 0x1100);
    assert_eq!(end, 0x100c);
    assert_eq!(cache.saved(regs::RA), Some(-8));
}

#[test]
fn tolerance() {
    let arch = Riscv::new(Features::RV64GC);
    // addi sp,sp,-16; mul; sd ra,8(sp); mul; sd s0,0(sp)
    let insns = [0xff010113, MUL, 0x00113423, MUL, 0x00813023];
    let (end, cache) = scan(&arch, &insns, 0x1100);
    assert_eq!(end, 0x100c);
    assert_eq!(cache.saved(regs::RA), Some(-8));
    assert_eq!(cache.saved(regs::FP), None);
}

#[test]
fn zcmp_push() {
    let arch = Riscv::new(Features::RV32IMAC.with_zcmp(true));
    // cm.push {ra, s0-s1}, -16
    let mut memory = assemble(0x1000, &[Bits::Bit16(0xb862), Bits::Bit32(0x100000ef)]);
    let mut cache = PrologueCache::default();
    let end = scan_prologue(&arch, &DEBUG_CONFIG, &mut memory, 0x1000, 0x1100, Some(&mut cache));
    assert_eq!(end, Ok(0x1002));
    assert_eq!(cache.saved(regs::RA), Some(-12));
    assert_eq!(cache.saved(regs::FP), Some(-8));
    assert_eq!(cache.saved(regs::S1), Some(-4));
    assert_eq!(cache.frame_size, 16);
    assert_eq!(cache.base_register, regs::SP);
    assert_eq!(cache.base_offset, 16);
}

#[test]
fn dynamic_sp_restart() {
    let arch = Riscv::new(Features::RV64GC);
    // addi sp,sp,-16; sub sp,sp,a0; add s0,sp,zero; sd ra,8(s0)
    let insns = [0xff010113, 0x40a10133, 0x00010433, 0x00143423];
    let (end, cache) = scan(&arch, &insns, 0x1100);
    assert_eq!(end, 0x1010);
    assert_eq!(cache.saved(regs::RA), Some(-8));
    assert_eq!(cache.base_register, regs::FP);
    assert_eq!(cache.base_offset, 16);
    assert!(cache.dynamic);
}

#[test]
fn float_save() {
    let arch = Riscv::new(Features::RV64GC);
    // addi sp,sp,-16; fsd fs0,8(sp)
    let (end, cache) = scan(&arch, &[0xff010113, 0x00813427], 0x1100);
    assert_eq!(end, 0x1008);
    assert_eq!(cache.saved(regs::f(8)), Some(-8));
}

#[test]
fn partial_save() {
    let arch = Riscv::new(Features::RV64GC);
    // addi sp,sp,-16; sw ra,8(sp)
    let (end, cache) = scan(&arch, &[0xff010113, 0x00112423], 0x1100);
    assert_eq!(end, 0x1008);
    assert_eq!(cache.saved(regs::RA), None);
}

#[test]
fn save_through_copy() {
    let arch = Riscv::new(Features::RV64GC);
    // addi sp,sp,-16; mv s1,ra; sd s1,8(sp)
    let (_, cache) = scan(&arch, &[0xff010113, 0x001004b3, 0x00913423], 0x1100);
    assert_eq!(cache.saved(regs::RA), Some(-8));
    assert_eq!(cache.saved(regs::S1), None);
}

#[test]
fn scan_limit() {
    let arch = Riscv::new(Features::RV64GC);
    let insns = [0xfe010113, 0x00113c23, 0x00813823];
    let (end, cache) = scan(&arch, &insns, 0x1008);
    assert_eq!(end, 0x1008);
    assert_eq!(cache.saved(regs::RA), Some(-8));
    assert_eq!(cache.saved(regs::FP), None);
}

#[test]
fn deterministic() {
    let arch = Riscv::new(Features::RV64GC);
    let insns = [0xfe010113, 0x00113c23, 0x00813823, 0x02010413, RET];
    assert_eq!(scan(&arch, &insns, 0x1100), scan(&arch, &insns, 0x1100));
}

#[test]
fn truncated_code() {
    let arch = Riscv::new(Features::RV64GC);
    let (end, cache) = scan(&arch, &[0xff010113], 0x1100);
    assert_eq!(end, 0x1004);
    assert_eq!(cache.frame_size, 16);
}

#[test]
fn unreadable_start() {
    let arch = Riscv::new(Features::RV64GC);
    let mut memory = code(0x1000, &[0xff010113]);
    let res = scan_prologue(&arch, &DEBUG_CONFIG, &mut memory, 0x2000, 0x2100, None);
    assert!(matches!(res, Err(Error::Memory(_, 0x2000))));
}

/// [`Symbols`] with line information for a single function
struct LineInfo;

impl target::Symbols for LineInfo {
    fn find_function(&mut self, address: u64) -> Option<Function> {
        let function = Function {
            start: 0x1000,
            end: 0x1100,
            name: None,
        };
        function.contains(address).then_some(function)
    }

    fn prologue_end(&mut self, function_start: u64) -> Option<u64> {
        (function_start == 0x1000).then_some(0x1008)
    }
}

#[test]
fn skip_with_line_info() {
    let arch = Riscv::new(Features::RV32IMAC);
    let mut memory = code(0x1000, &[0xfe010113, 0x00112e23, 0x00812c23, 0x100000ef]);
    let mut symbols = LineInfo;
    let res = skip_prologue(&arch, &DEBUG_CONFIG, &mut memory, &mut symbols, 0x1000);
    assert_eq!(res, Ok(0x1008));
    let res = skip_prologue(&arch, &DEBUG_CONFIG, &mut memory, &mut symbols, 0x1010);
    assert_eq!(res, Ok(0x1010));
}

#[test]
fn skip_by_scanning() {
    let arch = Riscv::new(Features::RV32IMAC);
    let mut memory = code(0x1000, &[0xfe010113, 0x00112e23, 0x00812c23, 0x100000ef]);

    let mut symbols = target::from_functions([(0x1000u64, 0x1010u64, "f")]);
    let res = skip_prologue(&arch, &DEBUG_CONFIG, &mut memory, &mut symbols, 0x1000);
    assert_eq!(res, Ok(0x100c));

    let mut symbols = target::from_functions([(0x1000u64, 0x1008u64, "f")]);
    let res = skip_prologue(&arch, &DEBUG_CONFIG, &mut memory, &mut symbols, 0x1000);
    assert_eq!(res, Ok(0x1008));

    let res = skip_prologue(&arch, &DEBUG_CONFIG, &mut memory, &mut NoSymbols, 0x1000);
    assert_eq!(res, Ok(0x100c));
}

#[test]
fn prologue_limit() {
    let mut symbols = LineInfo;
    assert_eq!(limit(&DEBUG_CONFIG, &mut symbols, 0x1000, 0x1100), 0x1008);
    assert_eq!(limit(&DEBUG_CONFIG, &mut symbols, 0x1000, 0x1004), 0x1004);
    assert_eq!(limit(&DEBUG_CONFIG, &mut NoSymbols, 0x2000, 0x3000), 0x2064);
}

macro_rules! epilogue_test {
    ($n:ident, [$($i:expr),*], $pc:literal, $e:expr) => {
        #[test]
        fn $n() {
            let arch = Riscv::new(Features::RV64GC);
            let mut memory = code(0x1000, &[$($i),*]);
            let expected: Option<Epilogue> = $e;
            assert_eq!(scan_epilogue(&arch, &DEBUG_CONFIG, &mut memory, $pc), expected);
            assert_eq!(
                is_in_epilogue(&arch, &DEBUG_CONFIG, &mut memory, $pc),
                expected.is_some(),
            );
        }
    };
}

// ld ra,24(sp); ld s0,16(sp); addi sp,sp,32; ret
epilogue_test!(
    epilogue_start,
    [0x01813083, 0x01013403, 0x02010113, RET],
    0x1000,
    Some(Epilogue {
        release: Some(32),
        ret: 0x100c
    })
);
epilogue_test!(
    epilogue_ret,
    [0x01813083, 0x01013403, 0x02010113, RET],
    0x100c,
    Some(Epilogue {
        release: Some(0),
        ret: 0x100c
    })
);
// addi sp,s0,-32; ld ra,24(sp); ret
epilogue_test!(
    epilogue_restore,
    [0xfe040113, 0x01813083, RET],
    0x1000,
    Some(Epilogue {
        release: None,
        ret: 0x1008
    })
);
epilogue_test!(epilogue_mul, [MUL, 0x02010113, RET], 0x1000, None);
epilogue_test!(epilogue_truncated, [0x01813083, 0x02010113], 0x1000, None);
epilogue_test!(
    epilogue_budget,
    [NOP, NOP, NOP, NOP, NOP, NOP, NOP, RET],
    0x1000,
    Some(Epilogue {
        release: Some(0),
        ret: 0x101c
    })
);
epilogue_test!(
    epilogue_exceeded,
    [NOP, NOP, NOP, NOP, NOP, NOP, NOP, NOP, NOP, RET],
    0x1000,
    None
);

macro_rules! atomic_test {
    ($n:ident, [$($i:expr),*], $e:expr) => {
        atomic_test!($n, [$($i),*], 0x1000, $e);
    };
    ($n:ident, [$($i:expr),*], $pc:literal, $e:expr) => {
        #[test]
        fn $n() {
            let arch = Riscv::new(Features::RV64GC);
            let mut memory = code(0x1000, &[$($i),*]);
            let expected: Vec<u64> = $e;
            let breakpoints = atomic_sequence_breakpoints(&arch, &DEBUG_CONFIG, &mut memory, $pc);
            assert_eq!(breakpoints, expected);
        }
    };
}

// lr.w a5,(a0); add a5,a5,a1; sc.w a4,a5,(a0); bnez a4,-12
atomic_test!(atomic_simple, [LR_W, ADD_A5, SC_W, 0xfe071ae3], vec![0x100c]);
// lr.d a5,(a0); sc.d a4,a5,(a0)
atomic_test!(atomic_double, [0x100537af, 0x18f5372f], vec![0x1008]);
// lr.w a5,(a0); bne a5,a2,+12; sc.w a4,a5,(a0); bnez a4,-12
atomic_test!(
    atomic_exit,
    [LR_W, 0x00c79663, SC_W, 0xfe071ae3],
    vec![0x1010, 0x100c]
);
// lr.w a5,(a0); beq a5,a2,+8; add; add; sc.w a4,a5,(a0)
atomic_test!(
    atomic_inner_branch,
    [LR_W, 0x00c78463, ADD_A5, ADD_A5, SC_W],
    vec![0x1014]
);
atomic_test!(
    atomic_two_branches,
    [LR_W, 0x00c79663, 0x00c79663, SC_W],
    vec![]
);
atomic_test!(atomic_backward, [LR_W, 0xfe071ae3, SC_W], vec![]);
atomic_test!(atomic_width, [LR_W, 0x18f5372f], vec![]);
atomic_test!(atomic_no_sc, [LR_W, ADD_A5], vec![]);
atomic_test!(atomic_mul, [LR_W, MUL, SC_W], vec![]);
atomic_test!(atomic_not_lr, [ADD_A5, LR_W, SC_W], vec![]);
atomic_test!(atomic_later, [ADD_A5, LR_W, SC_W], 0x1004, vec![0x100c]);

#[test]
fn atomic_limit() {
    let arch = Riscv::new(Features::RV64GC);
    let mut insns = vec![LR_W];
    insns.extend([ADD_A5; 14]);
    insns.push(SC_W);
    let mut memory = code(0x1000, &insns);
    let breakpoints = atomic_sequence_breakpoints(&arch, &DEBUG_CONFIG, &mut memory, 0x1000);
    assert_eq!(breakpoints, vec![0x1040]);

    insns.insert(1, ADD_A5);
    let mut memory = code(0x1000, &insns);
    let breakpoints = atomic_sequence_breakpoints(&arch, &DEBUG_CONFIG, &mut memory, 0x1000);
    assert!(breakpoints.is_empty());
}
