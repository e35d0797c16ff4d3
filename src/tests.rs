// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Fake targets shared by tests and end-to-end scenarios

use alloc::vec::Vec;

use crate::instruction::bits::Bits;
use crate::target::basic::{Segment, SegmentMut};
use crate::target::{self, Memory, Offset};

pub type Code = Offset<Segment<Vec<u8>>>;
pub type Stack = Offset<SegmentMut<Vec<u8>>>;

/// Place 32bit instructions at the given address
pub fn code(base: u64, insns: &[u32]) -> Code {
    let data = insns.iter().flat_map(|i| i.to_le_bytes()).collect();
    target::from_segment(data).with_offset(base)
}

/// Place instructions of any size at the given address
pub fn assemble(base: u64, insns: &[Bits]) -> Code {
    let mut data = Vec::new();
    for bits in insns {
        let mut buf = [0u8; 8];
        let len = bits.write_le_bytes(&mut buf).expect("Could not assemble");
        data.extend_from_slice(&buf[..len]);
    }
    target::from_segment(data).with_offset(base)
}

/// Zero-filled, writable memory covering `len` bytes at the given address
pub fn stack(base: u64, len: usize) -> Stack {
    target::from_segment_mut(alloc::vec![0u8; len]).with_offset(base)
}

mod scenarios {
    use super::*;

    use alloc::vec;

    use crate::arch::{Architecture, Riscv};
    use crate::call::{Argument, Convention, DummyCall, Struct, Type};
    use crate::config::{ABI_OVERRIDE, DEBUG_CONFIG, Features};
    use crate::registers::RegisterFile;
    use crate::registers::riscv as regs;
    use crate::scan::{PrologueCache, scan_prologue};
    use crate::unwind::{FrameId, RegisterLocation, Session, Unwinder};

    const NOP: u32 = 0x00000013;
    const RET: u32 = 0x00008067;
    const MUL: u32 = 0x02b50533;

    fn put(stack: &mut Stack, address: u64, data: &[u8]) {
        stack
            .write_memory(address, data)
            .expect("Could not write stack");
    }

    #[test]
    fn rv32_saved_return_address() {
        let arch = Riscv::new(Features::RV32IMAC);
        // addi sp,sp,-32; sw ra,28(sp); sw s0,24(sp); mul a0,a0,a1; ret
        let insns = [0xfe010113, 0x00112e23, 0x00812c23, MUL, RET];

        let mut cache = PrologueCache::default();
        let end = scan_prologue(
            &arch,
            &DEBUG_CONFIG,
            &mut code(0x1000, &insns),
            0x1000,
            0x1014,
            Some(&mut cache),
        );
        assert_eq!(end, Ok(0x100c));
        assert_eq!(cache.sp_offset(regs::RA), Some(28));
        assert_eq!(cache.sp_offset(regs::FP), Some(24));

        let mut stack = stack(0x7fff_f000, 0x100);
        put(&mut stack, 0x7fff_f01c, &0x2000u32.to_le_bytes());
        let mut registers = RegisterFile::new(arch.registers());
        registers.set(regs::PC, 0x100c).expect("Could not set pc");
        registers.set(regs::SP, 0x7fff_f000).expect("Could not set sp");

        let session = Session::new(arch, DEBUG_CONFIG);
        let symbols = target::from_functions([(0x1000u64, 0x1014u64, "f")]);
        let memory = (code(0x1000, &insns), stack);
        let mut unwinder = Unwinder::new(&session, memory, registers, symbols);
        assert_eq!(
            unwinder.unwind_register(0, regs::RA),
            Ok(RegisterLocation::Address(0x7fff_f01c))
        );
        assert_eq!(unwinder.frame_base(0), Ok(0x7fff_f020));
        assert_eq!(unwinder.prev_register(0, regs::PC), Ok(0x2000));
    }

    #[test]
    fn rv64_saved_return_address() {
        let arch = Riscv::new(Features::RV64GC);
        // addi sp,sp,-32; sd ra,28(sp); sd s0,24(sp); mul a0,a0,a1; ret
        let insns = [0xfe010113, 0x00113e23, 0x00813c23, MUL, RET];

        let mut cache = PrologueCache::default();
        let end = scan_prologue(
            &arch,
            &DEBUG_CONFIG,
            &mut code(0x1000, &insns),
            0x1000,
            0x1014,
            Some(&mut cache),
        );
        assert_eq!(end, Ok(0x100c));
        assert_eq!(cache.sp_offset(regs::RA), Some(28));
        assert_eq!(cache.sp_offset(regs::FP), Some(24));

        let mut stack = stack(0x7fff_f000, 0x100);
        put(&mut stack, 0x7fff_f01c, &0x1234_5678_0000_2000u64.to_le_bytes());
        let mut registers = RegisterFile::new(arch.registers());
        registers.set(regs::PC, 0x100c).expect("Could not set pc");
        registers.set(regs::SP, 0x7fff_f000).expect("Could not set sp");

        let session = Session::new(arch, DEBUG_CONFIG);
        let symbols = target::from_functions([(0x1000u64, 0x1014u64, "f")]);
        let memory = (code(0x1000, &insns), stack);
        let mut unwinder = Unwinder::new(&session, memory, registers, symbols);
        assert_eq!(
            unwinder.unwind_register(0, regs::RA),
            Ok(RegisterLocation::Address(0x7fff_f01c))
        );
        assert_eq!(unwinder.frame_base(0), Ok(0x7fff_f020));
        assert_eq!(
            unwinder.prev_register(0, regs::RA),
            Ok(0x1234_5678_0000_2000)
        );
    }

    #[test]
    fn nop_extends_prologue() {
        let arch = Riscv::new(Features::RV32IMAC);
        // addi sp,sp,-32; sw ra,28(sp); sw s0,24(sp); nop; ret
        let insns = [0xfe010113, 0x00112e23, 0x00812c23, NOP, RET];
        let end = scan_prologue(
            &arch,
            &DEBUG_CONFIG,
            &mut code(0x1000, &insns),
            0x1000,
            0x1014,
            None,
        );
        assert_eq!(end, Ok(0x1010));
    }

    #[test]
    fn recursion() {
        let arch = Riscv::new(Features::RV64I);
        // addi sp,sp,-16; sd ra,8(sp); addi a0,a0,-1; nop; call f;
        // ld ra,8(sp); addi sp,sp,16; ret
        let insns = [
            0xff010113, 0x00113423, 0xfff50513, NOP, 0xff1ff0ef, 0x00813083, 0x01010113, RET,
        ];
        let mut stack = stack(0x7fff_ff00, 0x100);
        put(&mut stack, 0x7fff_ffc8, &0x1014u64.to_le_bytes());
        put(&mut stack, 0x7fff_ffd8, &0x1014u64.to_le_bytes());
        put(&mut stack, 0x7fff_ffe8, &0x4000u64.to_le_bytes());
        let mut registers = RegisterFile::new(arch.registers());
        registers.set(regs::PC, 0x1008).expect("Could not set pc");
        registers.set(regs::SP, 0x7fff_ffc0).expect("Could not set sp");
        registers.set(regs::RA, 0x1014).expect("Could not set ra");

        let session = Session::new(arch, DEBUG_CONFIG);
        let symbols = target::from_functions([(0x1000u64, 0x1020u64, "f")]);
        let memory = (code(0x1000, &insns), stack);
        let mut unwinder = Unwinder::new(&session, memory, registers, symbols);

        let ids: Result<Vec<_>, _> = (0..3).map(|level| unwinder.frame_id(level)).collect();
        let expected = [0x7fff_ffd0, 0x7fff_ffe0, 0x7fff_fff0].map(|base| FrameId {
            base,
            function: 0x1000,
        });
        assert_eq!(ids, Ok(expected.to_vec()));

        let pcs: Result<Vec<_>, _> = unwinder.backtrace().map(|f| f.map(|f| f.pc)).collect();
        assert_eq!(pcs, Ok(vec![0x1008, 0x1014, 0x1014, 0x4000]));
        assert!(session.has_warned());
    }

    #[test]
    fn two_register_call() {
        let arch = Riscv::new(Features::RV64GC);
        let config = DEBUG_CONFIG.with_abi(ABI_OVERRIDE.with_int_arg_regs(2));
        let convention = Convention::for_arch(&arch, &config);
        let mut registers = RegisterFile::new(arch.registers());
        let mut stack = stack(0x7fff_f000, 0x1000);

        let pair = Type::from(Struct::new([Type::signed(4), Type::signed(4)]));
        let b = [1i32.to_le_bytes(), 2i32.to_le_bytes()].concat();
        let call = DummyCall {
            sp: 0x8000_0000,
            return_address: 0x1000,
            struct_return: None,
        };
        let sp = convention.push_dummy_call(
            &mut stack,
            &mut registers,
            &call,
            &[
                Argument::new(Type::signed(8), &5i64.to_le_bytes()),
                Argument::new(pair, &b),
            ],
        );

        assert_eq!(sp, Ok(0x8000_0000));
        assert_eq!(registers.get(regs::A0), Some(5));
        assert_eq!(registers.get(regs::A1), Some(0x0000_0002_0000_0001));
        let mut top = [0u8; 0x100];
        stack
            .read_memory(0x7fff_ff00, &mut top)
            .expect("Could not read stack");
        assert!(top.iter().all(|b| *b == 0));
    }
}
