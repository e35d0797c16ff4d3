// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
#![allow(clippy::unusual_byte_groupings)]


use super::*;

use decode::{Decode, Decoder};
use format::{TypeB, TypeI, TypeJ, TypeP, TypeR, TypeS, TypeU};

#[test]
fn type_r() {
    assert_eq!(
        TypeR::from(0x00000f80u32),
        TypeR {
            rd: 0x1f,
            rs1: 0x00,
            rs2: 0x00,
        },
    );
    assert_eq!(
        TypeR::from(0x000f8000u32),
        TypeR {
            rd: 0x00,
            rs1: 0x1f,
            rs2: 0x00,
        },
    );
    assert_eq!(
        TypeR::from(0x01f00000u32),
        TypeR {
            rd: 0x00,
            rs1: 0x00,
            rs2: 0x1f,
        },
    );
}

#[test]
fn type_i() {
    assert_eq!(
        TypeI::from(0x7ff00f80u32),
        TypeI {
            rd: 0x1f,
            rs1: 0x00,
            imm: 0x7ff,
        },
    );
    assert_eq!(
        TypeI::from(0xfff00000u32),
        TypeI {
            rd: 0x00,
            rs1: 0x00,
            imm: -1,
        },
    );
    assert_eq!(
        TypeI {
            rd: 2,
            rs1: 2,
            imm: -32,
        }
        .encode()
            | 0x13,
        0xfe010113,
    );
}

#[test]
fn type_s() {
    assert_eq!(
        TypeS::from(0x00000f80u32),
        TypeS {
            rs1: 0x00,
            rs2: 0x00,
            imm: 0x01f,
        },
    );
    assert_eq!(
        TypeS::from(0xfe000000u32),
        TypeS {
            rs1: 0x00,
            rs2: 0x00,
            imm: -0x020,
        },
    );
    assert_eq!(
        TypeS {
            rs1: 2,
            rs2: 1,
            imm: 24,
        }
        .encode()
            | 0x3023,
        0x00113c23,
    );
}

#[test]
fn type_b() {
    assert_eq!(
        TypeB::from(0x00000f00u32),
        TypeB {
            rs1: 0x00,
            rs2: 0x00,
            imm: 0x001e,
        },
    );
    assert_eq!(
        TypeB::from(0x00000080u32),
        TypeB {
            rs1: 0x00,
            rs2: 0x00,
            imm: 0x0800,
        },
    );
    assert_eq!(
        TypeB::from(0x80000000u32),
        TypeB {
            rs1: 0x00,
            rs2: 0x00,
            imm: -0x1000,
        },
    );
    let b = TypeB {
        rs1: 12,
        rs2: 3,
        imm: -3402,
    };
    assert_eq!(TypeB::from(b.encode()), b);
}

#[test]
fn type_u() {
    assert_eq!(
        TypeU::from(0xfffff000u32),
        TypeU {
            rd: 0x00,
            imm: -0x00001000,
        },
    );
    assert_eq!(
        TypeU {
            rd: 13,
            imm: -223662080,
        }
        .encode()
            | 0x17,
        0xf2ab3697,
    );
}

#[test]
fn type_j() {
    assert_eq!(
        TypeJ::from(0x1030d66fu32),
        TypeJ {
            rd: 12,
            imm: 55554,
        },
    );
    let j = TypeJ {
        rd: 1,
        imm: -1048576,
    };
    assert_eq!(TypeJ::from(j.encode()), j);
}

#[test]
fn type_p() {
    let p = TypeP::from(0xb8f2u16);
    assert_eq!(p, TypeP { rlist: 15, spimm: 0 });
    assert_eq!(p.registers(), &[1, 8, 9, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27]);
    assert_eq!(p.stack_adjustment(4), 64);
    assert_eq!(p.stack_adjustment(8), 112);

    let p = TypeP { rlist: 5, spimm: 1 };
    assert_eq!(p.registers(), &[1, 8]);
    assert_eq!(p.stack_adjustment(4), 32);
    assert_eq!(p.stack_adjustment(8), 32);
    assert_eq!(TypeP::from(p.encode()), p);

    assert!(TypeP { rlist: 3, spimm: 0 }.registers().is_empty());
}

macro_rules! size_test {
    ($n:ident, $b:literal, $s:expr) => {
        #[test]
        fn $n() {
            assert_eq!(Size::from_low_byte($b), $s);
        }
    };
}

size_test!(size_compressed, 0b000_00_01, Size::Compressed);
size_test!(size_normal, 0b000_11_11, Size::Normal);
size_test!(size_wide, 0b001_11_11, Size::Wide);
size_test!(size_extra_wide, 0b011_11_11, Size::ExtraWide);
size_test!(size_unsupported, 0b111_11_11, Size::Compressed);

#[test]
fn bits_extract() {
    let data = [0x01, 0x11, 0x13, 0x01, 0x01, 0xfe, 0x5f];
    let (bits, rest) = bits::Bits::extract(&data).expect("No bits");
    assert_eq!(bits, bits::Bits::Bit16(0x1101));
    let (bits, rest) = bits::Bits::extract(rest).expect("No bits");
    assert_eq!(bits, bits::Bits::Bit32(0xfe010113));
    assert_eq!(bits::Bits::extract(rest), None);
}

#[test]
fn bits_write() {
    let mut buf = [0u8; 4];
    assert_eq!(bits::Bits::Bit16(0x9002).write_le_bytes(&mut buf), Some(2));
    assert_eq!(buf, [0x02, 0x90, 0, 0]);
    assert_eq!(bits::Bits::Bit32(0x00100073).write_le_bytes(&mut buf), Some(4));
    assert_eq!(buf, [0x73, 0x00, 0x10, 0x00]);
    assert_eq!(bits::Bits::Bit48(0).write_le_bytes(&mut buf), None);
}

#[test]
fn fetch() {
    let decoder = Decoder::new(8);
    let mut memory =
        crate::target::from_segment(b"\x13\x01\x01\xfe\x82\x80\x13").with_offset(0x100);
    assert_eq!(
        Instruction::fetch(&mut memory, 0x100, &decoder),
        Ok(Instruction::new(
            Size::Normal,
            Opcode::Addi,
            Operands::I(TypeI {
                rd: 2,
                rs1: 2,
                imm: -32,
            }),
        )),
    );
    let ret = Instruction::fetch(&mut memory, 0x104, &decoder).expect("Could not fetch");
    assert!(ret.is_return());
    assert_eq!(ret.size, Size::Compressed);
    assert!(Instruction::fetch(&mut memory, 0x106, &decoder).is_err());
}

#[test]
fn classification() {
    let decoder = Decoder::new(4);
    let call = decoder.decode_32(0x008000ef);
    assert!(call.is_call());
    assert!(call.is_control_transfer());
    assert_eq!(call.branch_target(0x1000), Some(0x1008));

    let branch = decoder.decode_32(0xaa360b63);
    assert!(!branch.is_call());
    assert_eq!(branch.branch_target(0x2000), Some(0x2000 - 3402));

    let nop = decoder.decode_16(0x0001);
    assert!(nop.is_nop());
    assert!(!nop.is_control_transfer());
    assert!(decoder.decode_32(0x00000013).is_nop());

    let jr = decoder.decode_16(0x8602);
    assert!(jr.is_control_transfer());
    assert!(!jr.is_return());
    assert_eq!(jr.branch_target(0x1000), None);
}

#[test]
fn display() {
    let decoder = Decoder::new(8);
    assert_eq!(
        alloc::format!("{}", decoder.decode_32(0xfe010113)),
        "addi x2, x2, -32"
    );
    assert_eq!(
        alloc::format!("{}", decoder.decode_16(0xec06)),
        "sd x1, 24(x2)"
    );
}
