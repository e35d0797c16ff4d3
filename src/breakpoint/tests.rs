// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

use crate::config::DEBUG_CONFIG;
use crate::instruction::bits::Bits;
use crate::target::Empty;
use crate::tests::assemble;

// c.nop; c.nop; addi a0,a0,1; c.nop
fn code() -> crate::tests::Code {
    assemble(
        0x1000,
        &[
            Bits::Bit16(0x0001),
            Bits::Bit16(0x0001),
            Bits::Bit32(0x00150513),
            Bits::Bit16(0x0001),
        ],
    )
}

macro_rules! kind_test {
    ($n:ident, $mode:ident, $pc:literal, $k:ident) => {
        #[test]
        fn $n() {
            let config = DEBUG_CONFIG.with_compressed_breakpoints(CompressedBreakpoints::$mode);
            assert_eq!(breakpoint_kind(&config, &mut code(), $pc), Kind::$k);
        }
    };
}

kind_test!(auto_compressed, Auto, 0x1000, Compressed);
kind_test!(auto_unaligned, Auto, 0x1002, Compressed);
kind_test!(auto_normal, Auto, 0x1004, Normal);
kind_test!(auto_trailing, Auto, 0x1008, Compressed);
kind_test!(auto_unreadable, Auto, 0x2000, Normal);
kind_test!(auto_unreadable_unaligned, Auto, 0x2002, Compressed);
kind_test!(on, On, 0x1004, Compressed);
kind_test!(on_unreadable, On, 0x2000, Compressed);
kind_test!(off, Off, 0x1000, Normal);
kind_test!(off_unaligned, Off, 0x1002, Normal);

#[test]
fn empty_memory() {
    assert_eq!(breakpoint_kind(&DEBUG_CONFIG, &mut Empty, 0x1000), Kind::Normal);
}

#[test]
fn bytes() {
    assert_eq!(breakpoint_bytes(Kind::Normal), &[0x73, 0x00, 0x10, 0x00]);
    assert_eq!(breakpoint_bytes(Kind::Compressed), &[0x02, 0x90]);
    for kind in [Kind::Normal, Kind::Compressed] {
        assert_eq!(breakpoint_bytes(kind).len(), kind.width());
        assert_eq!(Kind::try_from(kind.width()), Ok(kind));
    }
    assert_eq!(Kind::try_from(3), Err(3));
}
