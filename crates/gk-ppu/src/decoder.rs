//! PPU instruction decoder
//!
//! Bits are numbered MSB-first: bit 0 is the most significant bit of the word.

use crate::instruction::*;
use crate::instructions::branch::bo_bits;
use crate::instructions::integer::{sign_extend_14, sign_extend_16, sign_extend_24};
use crate::instructions::system::Spr;
use gk_core::error::PpuError;

/// Extract bits `start..=end` of `word`
#[inline]
pub fn get_bits(word: u32, start: u32, end: u32) -> u32 {
    debug_assert!(start <= end && end < 32);
    let width = end - start + 1;
    let value = word >> (31 - end);
    if width == 32 {
        value
    } else {
        value & ((1 << width) - 1)
    }
}

/// Extract bit `pos` of `word` as 0 or 1
#[inline]
pub fn get_bit(word: u32, pos: u32) -> u32 {
    get_bits(word, pos, pos)
}

/// I-form: b
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IForm {
    pub li: u32,
    pub aa: bool,
    pub lk: bool,
}

/// B-form: bc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BForm {
    pub bo: u8,
    pub bi: u8,
    pub bd: u32,
    pub aa: bool,
    pub lk: bool,
}

/// D-form: immediates and displacement loads/stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DForm {
    pub rt: u8,
    pub ra: u8,
    pub d: u32,
}

/// DS-form: 64-bit displacement loads/stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DsForm {
    pub rt: u8,
    pub ra: u8,
    pub ds: u32,
    pub xo: u8,
}

/// X-form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XForm {
    pub rt: u8,
    pub ra: u8,
    pub rb: u8,
    pub xo: u16,
    pub rc: bool,
}

/// XO-form: integer arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XoForm {
    pub rt: u8,
    pub ra: u8,
    pub rb: u8,
    pub oe: bool,
    pub xo: u16,
    pub rc: bool,
}

/// XL-form: branch to LR/CTR and CR logical operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XlForm {
    /// BT or BO
    pub bt: u8,
    /// BA or BI
    pub ba: u8,
    pub bb: u8,
    pub xo: u16,
    pub lk: bool,
}

/// XFX-form: move to/from special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XfxForm {
    pub rt: u8,
    /// Raw field, halves still swapped
    pub spr: u16,
    pub xo: u16,
}

/// XFL-form: move to FPSCR fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XflForm {
    pub flm: u8,
    pub frb: u8,
    pub xo: u16,
    pub rc: bool,
}

/// M-form: rotate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MForm {
    pub rs: u8,
    pub ra: u8,
    /// RB or SH
    pub rb: u8,
    pub mb: u8,
    pub me: u8,
    pub rc: bool,
}

/// PPU instruction decoder
pub struct PpuDecoder;

impl PpuDecoder {
    /// Primary opcode (bits 0-5)
    #[inline]
    pub fn primary(word: u32) -> u8 {
        get_bits(word, 0, 5) as u8
    }

    #[inline]
    fn reg(word: u32, start: u32) -> u8 {
        get_bits(word, start, start + 4) as u8
    }

    /// Extract I-form fields
    #[inline]
    pub fn i_form(word: u32) -> IForm {
        IForm {
            li: get_bits(word, 6, 29),
            aa: get_bit(word, 30) != 0,
            lk: get_bit(word, 31) != 0,
        }
    }

    /// Extract B-form fields
    #[inline]
    pub fn b_form(word: u32) -> BForm {
        BForm {
            bo: Self::reg(word, 6),
            bi: Self::reg(word, 11),
            bd: get_bits(word, 16, 29),
            aa: get_bit(word, 30) != 0,
            lk: get_bit(word, 31) != 0,
        }
    }

    /// Extract D-form fields
    #[inline]
    pub fn d_form(word: u32) -> DForm {
        DForm {
            rt: Self::reg(word, 6),
            ra: Self::reg(word, 11),
            d: get_bits(word, 16, 31),
        }
    }

    /// Extract DS-form fields
    #[inline]
    pub fn ds_form(word: u32) -> DsForm {
        DsForm {
            rt: Self::reg(word, 6),
            ra: Self::reg(word, 11),
            ds: get_bits(word, 16, 29),
            xo: get_bits(word, 30, 31) as u8,
        }
    }

    /// Extract X-form fields
    #[inline]
    pub fn x_form(word: u32) -> XForm {
        XForm {
            rt: Self::reg(word, 6),
            ra: Self::reg(word, 11),
            rb: Self::reg(word, 16),
            xo: get_bits(word, 21, 30) as u16,
            rc: get_bit(word, 31) != 0,
        }
    }

    /// Extract XO-form fields
    #[inline]
    pub fn xo_form(word: u32) -> XoForm {
        XoForm {
            rt: Self::reg(word, 6),
            ra: Self::reg(word, 11),
            rb: Self::reg(word, 16),
            oe: get_bit(word, 21) != 0,
            xo: get_bits(word, 22, 30) as u16,
            rc: get_bit(word, 31) != 0,
        }
    }

    /// Extract XL-form fields
    #[inline]
    pub fn xl_form(word: u32) -> XlForm {
        XlForm {
            bt: Self::reg(word, 6),
            ba: Self::reg(word, 11),
            bb: Self::reg(word, 16),
            xo: get_bits(word, 21, 30) as u16,
            lk: get_bit(word, 31) != 0,
        }
    }

    /// Extract XFX-form fields
    #[inline]
    pub fn xfx_form(word: u32) -> XfxForm {
        XfxForm {
            rt: Self::reg(word, 6),
            spr: get_bits(word, 11, 20) as u16,
            xo: get_bits(word, 21, 30) as u16,
        }
    }

    /// Extract XFL-form fields
    #[inline]
    pub fn xfl_form(word: u32) -> XflForm {
        XflForm {
            flm: get_bits(word, 7, 14) as u8,
            frb: Self::reg(word, 16),
            xo: get_bits(word, 21, 30) as u16,
            rc: get_bit(word, 31) != 0,
        }
    }

    /// Extract M-form fields
    #[inline]
    pub fn m_form(word: u32) -> MForm {
        MForm {
            rs: Self::reg(word, 6),
            ra: Self::reg(word, 11),
            rb: Self::reg(word, 16),
            mb: Self::reg(word, 21),
            me: Self::reg(word, 26),
            rc: get_bit(word, 31) != 0,
        }
    }

    /// Decode a 32-bit instruction word
    pub fn decode(word: u32) -> Result<Instruction, PpuError> {
        let primary = Self::primary(word);

        match primary {
            7 | 8 | 12 | 13 | 14 | 15 => {
                let DForm { rt, ra, d } = Self::d_form(word);
                let op = match primary {
                    7 => ImmArithOp::Mulli,
                    8 => ImmArithOp::Subfic,
                    12 => ImmArithOp::Addic,
                    13 => ImmArithOp::AddicRecord,
                    14 => ImmArithOp::Addi,
                    _ => ImmArithOp::Addis,
                };
                Ok(Instruction::ArithmeticImmediate {
                    op,
                    rt,
                    ra,
                    imm: sign_extend_16(d),
                })
            }
            10 | 11 => {
                let DForm { rt, ra, d } = Self::d_form(word);
                let (kind, imm) = if primary == 10 {
                    (CompareKind::Logical, d)
                } else {
                    (CompareKind::Signed, sign_extend_16(d))
                };
                Ok(Instruction::Compare {
                    kind,
                    bf: rt >> 2,
                    ra,
                    rhs: Operand::Immediate(imm),
                })
            }
            16 => {
                let BForm { bo, bi, bd, aa, lk } = Self::b_form(word);
                Ok(Instruction::BranchConditional {
                    bo,
                    bi,
                    offset: sign_extend_14(bd) << 2,
                    aa,
                    lk,
                })
            }
            18 => {
                let IForm { li, aa, lk } = Self::i_form(word);
                Ok(Instruction::Branch {
                    offset: sign_extend_24(li) << 2,
                    aa,
                    lk,
                })
            }
            19 => Self::decode_19(word),
            20 | 21 | 23 => {
                let MForm { rs, ra, rb, mb, me, rc } = Self::m_form(word);
                let op = match primary {
                    20 => RotateOp::Rlwimi,
                    21 => RotateOp::Rlwinm,
                    _ => RotateOp::Rlwnm,
                };
                Ok(Instruction::Rotate {
                    op,
                    rs,
                    ra,
                    sh: rb,
                    mb,
                    me,
                    rc,
                })
            }
            24..=29 => {
                let DForm { rt, ra, d } = Self::d_form(word);
                let op = match primary {
                    24 => LogicalImmOp::Ori,
                    25 => LogicalImmOp::Oris,
                    26 => LogicalImmOp::Xori,
                    27 => LogicalImmOp::Xoris,
                    28 => LogicalImmOp::Andi,
                    _ => LogicalImmOp::Andis,
                };
                Ok(Instruction::LogicalImmediate {
                    op,
                    rs: rt,
                    ra,
                    imm: d,
                })
            }
            31 => Self::decode_31(word),
            32..=45 => Self::decode_load_store_d(word, primary),
            46 => {
                let DForm { rt, ra, d } = Self::d_form(word);
                if ra >= rt {
                    return Err(invalid(word, "lmw requires RA < RT"));
                }
                Ok(Instruction::LoadMultiple {
                    rt,
                    ra,
                    d: sign_extend_16(d),
                })
            }
            47 => {
                let DForm { rt, ra, d } = Self::d_form(word);
                Ok(Instruction::StoreMultiple {
                    rs: rt,
                    ra,
                    d: sign_extend_16(d),
                })
            }
            _ => Err(unsupported(word, primary, None)),
        }
    }

    /// Opcode 19: secondary opcode in bits 21-30
    fn decode_19(word: u32) -> Result<Instruction, PpuError> {
        let XlForm { bt, ba, bb, xo, lk } = Self::xl_form(word);

        let cr_op = |op| Instruction::CrLogical { op, bt, ba, bb };
        match xo {
            0 => Ok(Instruction::MoveCrField {
                bf: bt >> 2,
                bfa: ba >> 2,
            }),
            16 => Ok(Instruction::BranchConditionalToLr { bo: bt, bi: ba, lk }),
            528 => {
                if bt & bo_bits::SKIP_CTR == 0 {
                    return Err(invalid(word, "bcctr cannot decrement CTR"));
                }
                Ok(Instruction::BranchConditionalToCtr { bo: bt, bi: ba, lk })
            }
            33 => Ok(cr_op(CrLogicalOp::Nor)),
            129 => Ok(cr_op(CrLogicalOp::Andc)),
            193 => Ok(cr_op(CrLogicalOp::Xor)),
            225 => Ok(cr_op(CrLogicalOp::Nand)),
            257 => Ok(cr_op(CrLogicalOp::And)),
            289 => Ok(cr_op(CrLogicalOp::Eqv)),
            417 => Ok(cr_op(CrLogicalOp::Orc)),
            449 => Ok(cr_op(CrLogicalOp::Or)),
            150 => Ok(Instruction::Isync),
            _ => Err(unsupported(word, 19, Some(xo))),
        }
    }

    /// Opcode 31: X-form table (bits 21-30) first, then XO-form (bits 22-30)
    fn decode_31(word: u32) -> Result<Instruction, PpuError> {
        if let Some(result) = Self::decode_31_x(word) {
            return result;
        }

        let XoForm {
            rt,
            ra,
            rb,
            oe,
            xo,
            rc,
        } = Self::xo_form(word);
        let op = match xo {
            8 => ArithOp::Subfc,
            10 => ArithOp::Addc,
            11 => ArithOp::Mulhwu,
            40 => ArithOp::Subf,
            75 => ArithOp::Mulhw,
            104 => ArithOp::Neg,
            136 => ArithOp::Subfe,
            138 => ArithOp::Adde,
            200 => ArithOp::Subfze,
            202 => ArithOp::Addze,
            232 => ArithOp::Subfme,
            234 => ArithOp::Addme,
            235 => ArithOp::Mullw,
            266 => ArithOp::Add,
            459 => ArithOp::Divwu,
            491 => ArithOp::Divw,
            _ => {
                return Err(unsupported(word, 31, Some(get_bits(word, 21, 30) as u16)));
            }
        };
        Ok(Instruction::Arithmetic {
            op,
            rt,
            ra,
            rb,
            oe,
            rc,
        })
    }

    fn decode_31_x(word: u32) -> Option<Result<Instruction, PpuError>> {
        let XForm { rt, ra, rb, xo, rc } = Self::x_form(word);

        let logical = |op| Instruction::Logical {
            op,
            rs: rt,
            ra,
            rb,
            rc,
        };
        let unary = |op| Instruction::Unary { op, rs: rt, ra, rc };
        let shift = |op| Instruction::Shift {
            op,
            rs: rt,
            ra,
            rb,
            rc,
        };
        let compare = |kind| Instruction::Compare {
            kind,
            bf: rt >> 2,
            ra,
            rhs: Operand::Register(rb),
        };
        let indexed = EffectiveAddress::Indexed { ra, rb };
        let load = |kind, update| load_form(word, kind, rt, indexed, update);
        let store = |kind, update| store_form(word, kind, rt, indexed, update);

        let result = match xo {
            0 => Ok(compare(CompareKind::Signed)),
            32 => Ok(compare(CompareKind::Logical)),

            28 => Ok(logical(LogicalOp::And)),
            60 => Ok(logical(LogicalOp::Andc)),
            124 => Ok(logical(LogicalOp::Nor)),
            284 => Ok(logical(LogicalOp::Eqv)),
            316 => Ok(logical(LogicalOp::Xor)),
            412 => Ok(logical(LogicalOp::Orc)),
            444 => Ok(logical(LogicalOp::Or)),
            476 => Ok(logical(LogicalOp::Nand)),

            26 => Ok(unary(UnaryOp::Cntlzw)),
            922 => Ok(unary(UnaryOp::Extsh)),
            954 => Ok(unary(UnaryOp::Extsb)),

            24 => Ok(shift(ShiftOp::Slw)),
            536 => Ok(shift(ShiftOp::Srw)),
            792 => Ok(shift(ShiftOp::Sraw)),
            824 => Ok(Instruction::ShiftRightAlgebraicImmediate {
                rs: rt,
                ra,
                sh: rb,
                rc,
            }),

            19 => Ok(Instruction::MoveFromCr { rt }),
            144 => Ok(Instruction::MoveToCrFields {
                fxm: get_bits(word, 12, 19) as u8,
                rs: rt,
            }),
            339 => {
                let XfxForm { rt, spr, .. } = Self::xfx_form(word);
                Spr::from_field(spr).map(|spr| Instruction::MoveFromSpr { rt, spr })
            }
            467 => {
                let XfxForm { rt, spr, .. } = Self::xfx_form(word);
                Spr::from_field(spr).map(|spr| Instruction::MoveToSpr { spr, rs: rt })
            }
            598 => Ok(Instruction::Sync),

            87 => load(LoadKind::Byte, false),
            119 => load(LoadKind::Byte, true),
            279 => load(LoadKind::Halfword, false),
            311 => load(LoadKind::Halfword, true),
            343 => load(LoadKind::HalfwordAlgebraic, false),
            375 => load(LoadKind::HalfwordAlgebraic, true),
            23 => load(LoadKind::Word, false),
            55 => load(LoadKind::Word, true),
            790 => load(LoadKind::HalfwordByteReversed, false),
            534 => load(LoadKind::WordByteReversed, false),

            215 => store(StoreKind::Byte, false),
            247 => store(StoreKind::Byte, true),
            407 => store(StoreKind::Halfword, false),
            439 => store(StoreKind::Halfword, true),
            151 => store(StoreKind::Word, false),
            183 => store(StoreKind::Word, true),
            918 => store(StoreKind::HalfwordByteReversed, false),
            662 => store(StoreKind::WordByteReversed, false),

            _ => return None,
        };
        Some(result)
    }

    /// Primary opcodes 32-45: D-form loads and stores
    fn decode_load_store_d(word: u32, primary: u8) -> Result<Instruction, PpuError> {
        let DForm { rt, ra, d } = Self::d_form(word);
        let ea = EffectiveAddress::Displacement {
            ra,
            d: sign_extend_16(d),
        };
        let update = primary % 2 == 1;

        match primary {
            32 | 33 => load_form(word, LoadKind::Word, rt, ea, update),
            34 | 35 => load_form(word, LoadKind::Byte, rt, ea, update),
            36 | 37 => store_form(word, StoreKind::Word, rt, ea, update),
            38 | 39 => store_form(word, StoreKind::Byte, rt, ea, update),
            40 | 41 => load_form(word, LoadKind::Halfword, rt, ea, update),
            42 | 43 => load_form(word, LoadKind::HalfwordAlgebraic, rt, ea, update),
            _ => store_form(word, StoreKind::Halfword, rt, ea, update),
        }
    }
}

fn invalid(word: u32, reason: &'static str) -> PpuError {
    PpuError::InvalidInstructionForm { word, reason }
}

fn unsupported(word: u32, primary: u8, secondary: Option<u16>) -> PpuError {
    PpuError::UnsupportedOpcode {
        word,
        primary,
        secondary,
    }
}

fn load_form(
    word: u32,
    kind: LoadKind,
    rt: u8,
    ea: EffectiveAddress,
    update: bool,
) -> Result<Instruction, PpuError> {
    if update && (ea.ra() == 0 || ea.ra() == rt) {
        return Err(invalid(word, "load with update requires RA != 0 and RA != RT"));
    }
    Ok(Instruction::Load {
        kind,
        rt,
        ea,
        update,
    })
}

fn store_form(
    word: u32,
    kind: StoreKind,
    rs: u8,
    ea: EffectiveAddress,
    update: bool,
) -> Result<Instruction, PpuError> {
    if update && ea.ra() == 0 {
        return Err(invalid(word, "store with update requires RA != 0"));
    }
    Ok(Instruction::Store {
        kind,
        rs,
        ea,
        update,
    })
}
