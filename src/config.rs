// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Configuration and target features
//!
//! This module holds the user tunable knobs of a debug session
//! ([`DebugConfig`]), overrides for the calling convention ([`AbiOverride`])
//! and the [`Features`] describing the target processor.

/// Debug session configuration
///
/// A configuration holds the heuristics' limits and the user's choices
/// affecting breakpoints and inferior calls. It is shared by all frames of a
/// session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebugConfig {
    /// Number of bytes scanned for a prologue if its end is not known
    pub prologue_limit: u64,
    /// Number of non-prologue instructions tolerated within a prologue
    pub prologue_tolerance: u8,
    /// Maximum number of instructions between an address and a return for
    /// the address to be considered part of an epilogue
    pub epilogue_limit: u8,
    /// Maximum number of instructions in an atomic sequence
    pub atomic_limit: u8,
    /// Number of bytes searched backwards for a function's start
    ///
    /// A value of `0` disables the search.
    pub heuristic_fence: u64,
    /// Maximum number of frames unwound
    pub max_depth: usize,
    /// Use of compressed breakpoint instructions
    pub compressed_breakpoints: CompressedBreakpoints,
    /// Calling convention overrides
    pub abi: AbiOverride,
}

impl DebugConfig {
    /// Set the number of bytes scanned for a prologue
    pub const fn with_prologue_limit(self, prologue_limit: u64) -> Self {
        Self {
            prologue_limit,
            ..self
        }
    }

    /// Set the number of bytes searched backwards for a function's start
    pub const fn with_heuristic_fence(self, heuristic_fence: u64) -> Self {
        Self {
            heuristic_fence,
            ..self
        }
    }

    /// Set the maximum number of frames unwound
    pub const fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    /// Set the use of compressed breakpoint instructions
    pub const fn with_compressed_breakpoints(self, mode: CompressedBreakpoints) -> Self {
        Self {
            compressed_breakpoints: mode,
            ..self
        }
    }

    /// Set the calling convention overrides
    pub const fn with_abi(self, abi: AbiOverride) -> Self {
        Self { abi, ..self }
    }
}

/// See [`DEBUG_CONFIG`] for default values of individual fields
impl Default for DebugConfig {
    fn default() -> Self {
        DEBUG_CONFIG
    }
}

/// Default [`DebugConfig`]
pub const DEBUG_CONFIG: DebugConfig = DebugConfig {
    prologue_limit: 100,
    prologue_tolerance: 1,
    epilogue_limit: 8,
    atomic_limit: 16,
    heuristic_fence: 0,
    max_depth: 1024,
    compressed_breakpoints: CompressedBreakpoints::Auto,
    abi: ABI_OVERRIDE,
};

/// Choice of breakpoint instruction width
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CompressedBreakpoints {
    /// Use compressed breakpoints where the replaced instruction is compressed
    #[default]
    Auto,
    /// Always use compressed breakpoints
    On,
    /// Never use compressed breakpoints
    Off,
}

/// Calling convention overrides
///
/// Every field left at [`None`] is derived from the target's [`Features`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbiOverride {
    /// Number of integer argument registers
    pub int_arg_regs: Option<u8>,
    /// Number of floating point argument registers
    pub float_arg_regs: Option<u8>,
    /// Width of floating point values passed in registers, in bytes
    ///
    /// A value of `0` selects a soft-float convention.
    pub float_abi: Option<u8>,
    /// Whether the reduced (embedded) register set is in use
    pub embedded: Option<bool>,
}

impl AbiOverride {
    /// Force a number of integer argument registers
    pub const fn with_int_arg_regs(self, count: u8) -> Self {
        Self {
            int_arg_regs: Some(count),
            ..self
        }
    }

    /// Force a number of floating point argument registers
    pub const fn with_float_arg_regs(self, count: u8) -> Self {
        Self {
            float_arg_regs: Some(count),
            ..self
        }
    }

    /// Force the width of floating point values passed in registers
    pub const fn with_float_abi(self, width: u8) -> Self {
        Self {
            float_abi: Some(width),
            ..self
        }
    }

    /// Force use of the embedded ABI
    pub const fn with_embedded(self, embedded: bool) -> Self {
        Self {
            embedded: Some(embedded),
            ..self
        }
    }
}

/// Default [`AbiOverride`], not overriding anything
pub const ABI_OVERRIDE: AbiOverride = AbiOverride {
    int_arg_regs: None,
    float_arg_regs: None,
    float_abi: None,
    embedded: None,
};

/// Target processor features
///
/// Widths are given in bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Features {
    /// Width of integer registers and addresses
    pub xlen: u8,
    /// Width of floating point registers, `0` if there are none
    pub flen: u8,
    /// Width of floating point values the ABI passes in registers
    pub abi_flen: u8,
    /// Whether only 16 integer registers exist
    pub embedded: bool,
    /// Whether compressed instructions may appear
    pub compressed: bool,
    /// Whether Zcmp push/pop instructions may appear
    pub zcmp: bool,
    /// Data byte order
    pub endian: Endian,
}

impl Features {
    /// RV32I without extensions relevant to debugging
    pub const RV32I: Self = Self {
        xlen: 4,
        flen: 0,
        abi_flen: 0,
        embedded: false,
        compressed: false,
        zcmp: false,
        endian: Endian::Little,
    };

    /// RV32IMAC
    pub const RV32IMAC: Self = Self {
        compressed: true,
        ..Self::RV32I
    };

    /// RV64I without extensions relevant to debugging
    pub const RV64I: Self = Self {
        xlen: 8,
        ..Self::RV32I
    };

    /// RV64GC with the LP64D ABI
    pub const RV64GC: Self = Self {
        xlen: 8,
        flen: 8,
        abi_flen: 8,
        compressed: true,
        ..Self::RV32I
    };

    /// Enable or disable Zcmp push/pop instructions
    pub const fn with_zcmp(self, zcmp: bool) -> Self {
        Self { zcmp, ..self }
    }

    /// Set the data byte order
    pub const fn with_endian(self, endian: Endian) -> Self {
        Self { endian, ..self }
    }

    /// Width of integer registers in bits
    pub const fn xlen_bits(&self) -> u32 {
        self.xlen as u32 * 8
    }

    /// Minimum alignment of instructions in bytes
    pub const fn insn_alignment(&self) -> u64 {
        if self.compressed { 2 } else { 4 }
    }

    /// Number of integer registers
    pub const fn int_registers(&self) -> u8 {
        if self.embedded { 16 } else { 32 }
    }
}

/// See [`Features::RV64GC`]
impl Default for Features {
    fn default() -> Self {
        Self::RV64GC
    }
}

/// Byte order of data
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Interpret up to 8 bytes as an unsigned value
    pub fn read(self, bytes: &[u8]) -> u64 {
        let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
        match self {
            Self::Little => bytes.iter().take(8).rev().fold(0, fold),
            Self::Big => bytes.iter().take(8).fold(0, fold),
        }
    }

    /// Interpret up to 8 bytes as a signed value
    pub fn read_signed(self, bytes: &[u8]) -> i64 {
        let len = bytes.len().min(8);
        let value = self.read(bytes);
        if len == 0 || len == 8 {
            value as i64
        } else {
            let shift = 64 - 8 * len as u32;
            ((value << shift) as i64) >> shift
        }
    }

    /// Write the lower `buf.len()` bytes of a value into a buffer
    ///
    /// Bytes beyond the 8th are filled with `fill`.
    pub fn write(self, value: u64, buf: &mut [u8], fill: u8) {
        let len = buf.len();
        for (n, b) in buf.iter_mut().enumerate() {
            let significance = match self {
                Self::Little => n,
                Self::Big => len - 1 - n,
            };
            *b = if significance < 8 {
                (value >> (8 * significance)) as u8
            } else {
                fill
            };
        }
    }

    /// Determine the sub-range of a `width` wide buffer holding the `len`
    /// least significant bytes
    pub fn low_bytes(self, width: usize, len: usize) -> core::ops::Range<usize> {
        let len = len.min(width);
        match self {
            Self::Little => 0..len,
            Self::Big => width - len..width,
        }
    }
}
