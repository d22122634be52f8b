//! Decoded PPU instructions
//!
//! Every supported opcode decodes to one [`Instruction`] value. Related
//! opcodes share a variant and are told apart by an operation selector.
//! Immediates are stored already extended to 32 bits and branch
//! displacements already scaled by four.

use crate::instructions::branch::bo_bits;
use crate::instructions::system::Spr;
use std::fmt;

/// Second operand of a compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    Immediate(u32),
}

/// Signed or unsigned compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    Signed,
    Logical,
}

/// D-form arithmetic with a sign-extended immediate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmArithOp {
    Addi,
    Addis,
    Addic,
    AddicRecord,
    Subfic,
    Mulli,
}

/// XO-form arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Addc,
    Adde,
    Addze,
    Addme,
    Subf,
    Subfc,
    Subfe,
    Subfze,
    Subfme,
    Neg,
    Mullw,
    Mulhw,
    Mulhwu,
    Divw,
    Divwu,
}

/// D-form logical with a zero-extended immediate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalImmOp {
    Ori,
    Oris,
    Xori,
    Xoris,
    Andi,
    Andis,
}

/// X-form register-register logical
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Andc,
    Or,
    Orc,
    Xor,
    Nand,
    Nor,
    Eqv,
}

/// X-form single-source operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Extsb,
    Extsh,
    Cntlzw,
}

/// X-form shifts by register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Slw,
    Srw,
    Sraw,
}

/// M-form rotates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateOp {
    Rlwimi,
    Rlwinm,
    Rlwnm,
}

/// XL-form condition register logical operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrLogicalOp {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Eqv,
    Andc,
    Orc,
}

/// Load flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Byte,
    Halfword,
    HalfwordAlgebraic,
    Word,
    HalfwordByteReversed,
    WordByteReversed,
}

/// Store flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Byte,
    Halfword,
    Word,
    HalfwordByteReversed,
    WordByteReversed,
}

/// Addressing mode of a load or store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveAddress {
    /// `(RA|0) + d`
    Displacement { ra: u8, d: u32 },
    /// `(RA|0) + RB`
    Indexed { ra: u8, rb: u8 },
}

impl EffectiveAddress {
    /// Base register
    #[inline]
    pub fn ra(&self) -> u8 {
        match *self {
            Self::Displacement { ra, .. } | Self::Indexed { ra, .. } => ra,
        }
    }
}

/// A decoded PPU instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// b, ba, bl, bla
    Branch { offset: u32, aa: bool, lk: bool },
    /// bc, bca, bcl, bcla
    BranchConditional {
        bo: u8,
        bi: u8,
        offset: u32,
        aa: bool,
        lk: bool,
    },
    /// bclr, bclrl
    BranchConditionalToLr { bo: u8, bi: u8, lk: bool },
    /// bcctr, bcctrl
    BranchConditionalToCtr { bo: u8, bi: u8, lk: bool },
    /// crand, cror, crxor, ...
    CrLogical {
        op: CrLogicalOp,
        bt: u8,
        ba: u8,
        bb: u8,
    },
    /// mcrf
    MoveCrField { bf: u8, bfa: u8 },
    /// cmp, cmpl, cmpi, cmpli
    Compare {
        kind: CompareKind,
        bf: u8,
        ra: u8,
        rhs: Operand,
    },
    ArithmeticImmediate {
        op: ImmArithOp,
        rt: u8,
        ra: u8,
        imm: u32,
    },
    Arithmetic {
        op: ArithOp,
        rt: u8,
        ra: u8,
        rb: u8,
        oe: bool,
        rc: bool,
    },
    LogicalImmediate {
        op: LogicalImmOp,
        rs: u8,
        ra: u8,
        imm: u32,
    },
    Logical {
        op: LogicalOp,
        rs: u8,
        ra: u8,
        rb: u8,
        rc: bool,
    },
    Unary {
        op: UnaryOp,
        rs: u8,
        ra: u8,
        rc: bool,
    },
    Shift {
        op: ShiftOp,
        rs: u8,
        ra: u8,
        rb: u8,
        rc: bool,
    },
    /// srawi
    ShiftRightAlgebraicImmediate { rs: u8, ra: u8, sh: u8, rc: bool },
    /// `sh` is the RB index for rlwnm
    Rotate {
        op: RotateOp,
        rs: u8,
        ra: u8,
        sh: u8,
        mb: u8,
        me: u8,
        rc: bool,
    },
    Load {
        kind: LoadKind,
        rt: u8,
        ea: EffectiveAddress,
        update: bool,
    },
    Store {
        kind: StoreKind,
        rs: u8,
        ea: EffectiveAddress,
        update: bool,
    },
    /// lmw
    LoadMultiple { rt: u8, ra: u8, d: u32 },
    /// stmw
    StoreMultiple { rs: u8, ra: u8, d: u32 },
    MoveFromSpr { rt: u8, spr: Spr },
    MoveToSpr { spr: Spr, rs: u8 },
    /// mfcr
    MoveFromCr { rt: u8 },
    /// mtcrf
    MoveToCrFields { fxm: u8, rs: u8 },
    Sync,
    Isync,
}

impl Instruction {
    /// Render with branch targets resolved against `address`
    pub fn disassemble(&self, address: u32) -> String {
        self.render(Some(address))
    }

    fn render(&self, address: Option<u32>) -> String {
        let (mnemonic, operands) = self.parts(address);
        if operands.is_empty() {
            mnemonic
        } else {
            format!("{} {}", mnemonic, operands)
        }
    }

    fn parts(&self, address: Option<u32>) -> (String, String) {
        match *self {
            Self::Branch { offset, aa, lk } => {
                let mnem = format!("b{}{}", suffix(lk, "l"), suffix(aa, "a"));
                (mnem, target(offset, aa, address))
            }
            Self::BranchConditional {
                bo,
                bi,
                offset,
                aa,
                lk,
            } => {
                let tail = format!("{}{}", suffix(lk, "l"), suffix(aa, "a"));
                let target = target(offset, aa, address);
                match conditional_mnemonic(bo, bi, "") {
                    Some((mnem, cr)) if cr.is_empty() => (mnem + &tail, target),
                    Some((mnem, cr)) => (mnem + &tail, format!("{}, {}", cr, target)),
                    None => (format!("bc{}", tail), format!("{}, {}, {}", bo, bi, target)),
                }
            }
            Self::BranchConditionalToLr { bo, bi, lk } => {
                register_branch_parts(bo, bi, "lr", lk)
            }
            Self::BranchConditionalToCtr { bo, bi, lk } => {
                register_branch_parts(bo, bi, "ctr", lk)
            }
            Self::CrLogical { op, bt, ba, bb } => {
                let mnem = match op {
                    CrLogicalOp::And => "crand",
                    CrLogicalOp::Or => "cror",
                    CrLogicalOp::Xor => "crxor",
                    CrLogicalOp::Nand => "crnand",
                    CrLogicalOp::Nor => "crnor",
                    CrLogicalOp::Eqv => "creqv",
                    CrLogicalOp::Andc => "crandc",
                    CrLogicalOp::Orc => "crorc",
                };
                (mnem.to_string(), format!("{}, {}, {}", bt, ba, bb))
            }
            Self::MoveCrField { bf, bfa } => ("mcrf".to_string(), format!("cr{}, cr{}", bf, bfa)),
            Self::Compare { kind, bf, ra, rhs } => {
                let (mnem, rhs) = match (kind, rhs) {
                    (CompareKind::Signed, Operand::Register(rb)) => ("cmpw", format!("r{}", rb)),
                    (CompareKind::Logical, Operand::Register(rb)) => ("cmplw", format!("r{}", rb)),
                    (CompareKind::Signed, Operand::Immediate(si)) => ("cmpwi", (si as i32).to_string()),
                    (CompareKind::Logical, Operand::Immediate(ui)) => ("cmplwi", ui.to_string()),
                };
                (mnem.to_string(), format!("cr{}, r{}, {}", bf, ra, rhs))
            }
            Self::ArithmeticImmediate { op, rt, ra, imm } => {
                let simm = imm as i32;
                match op {
                    ImmArithOp::Addi if ra == 0 => ("li".to_string(), format!("r{}, {}", rt, simm)),
                    ImmArithOp::Addis if ra == 0 => {
                        ("lis".to_string(), format!("r{}, 0x{:x}", rt, imm & 0xFFFF))
                    }
                    ImmArithOp::Addis => (
                        "addis".to_string(),
                        format!("r{}, r{}, 0x{:x}", rt, ra, imm & 0xFFFF),
                    ),
                    _ => {
                        let mnem = match op {
                            ImmArithOp::Addi => "addi",
                            ImmArithOp::Addic => "addic",
                            ImmArithOp::AddicRecord => "addic.",
                            ImmArithOp::Subfic => "subfic",
                            ImmArithOp::Mulli => "mulli",
                            ImmArithOp::Addis => "addis",
                        };
                        (mnem.to_string(), format!("r{}, r{}, {}", rt, ra, simm))
                    }
                }
            }
            Self::Arithmetic {
                op,
                rt,
                ra,
                rb,
                oe,
                rc,
            } => {
                let (base, operands) = match op {
                    ArithOp::Add => ("add", 3),
                    ArithOp::Addc => ("addc", 3),
                    ArithOp::Adde => ("adde", 3),
                    ArithOp::Addze => ("addze", 2),
                    ArithOp::Addme => ("addme", 2),
                    ArithOp::Subf => ("subf", 3),
                    ArithOp::Subfc => ("subfc", 3),
                    ArithOp::Subfe => ("subfe", 3),
                    ArithOp::Subfze => ("subfze", 2),
                    ArithOp::Subfme => ("subfme", 2),
                    ArithOp::Neg => ("neg", 2),
                    ArithOp::Mullw => ("mullw", 3),
                    ArithOp::Mulhw => ("mulhw", 3),
                    ArithOp::Mulhwu => ("mulhwu", 3),
                    ArithOp::Divw => ("divw", 3),
                    ArithOp::Divwu => ("divwu", 3),
                };
                let mnem = format!("{}{}{}", base, suffix(oe, "o"), suffix(rc, "."));
                if operands == 3 {
                    (mnem, format!("r{}, r{}, r{}", rt, ra, rb))
                } else {
                    (mnem, format!("r{}, r{}", rt, ra))
                }
            }
            Self::LogicalImmediate { op, rs, ra, imm } => {
                if op == LogicalImmOp::Ori && rs == 0 && ra == 0 && imm == 0 {
                    return ("nop".to_string(), String::new());
                }
                let mnem = match op {
                    LogicalImmOp::Ori => "ori",
                    LogicalImmOp::Oris => "oris",
                    LogicalImmOp::Xori => "xori",
                    LogicalImmOp::Xoris => "xoris",
                    LogicalImmOp::Andi => "andi.",
                    LogicalImmOp::Andis => "andis.",
                };
                (mnem.to_string(), format!("r{}, r{}, 0x{:x}", ra, rs, imm))
            }
            Self::Logical { op, rs, ra, rb, rc } => {
                if op == LogicalOp::Or && rs == rb {
                    return (format!("mr{}", suffix(rc, ".")), format!("r{}, r{}", ra, rs));
                }
                let base = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Andc => "andc",
                    LogicalOp::Or => "or",
                    LogicalOp::Orc => "orc",
                    LogicalOp::Xor => "xor",
                    LogicalOp::Nand => "nand",
                    LogicalOp::Nor => "nor",
                    LogicalOp::Eqv => "eqv",
                };
                (
                    format!("{}{}", base, suffix(rc, ".")),
                    format!("r{}, r{}, r{}", ra, rs, rb),
                )
            }
            Self::Unary { op, rs, ra, rc } => {
                let base = match op {
                    UnaryOp::Extsb => "extsb",
                    UnaryOp::Extsh => "extsh",
                    UnaryOp::Cntlzw => "cntlzw",
                };
                (format!("{}{}", base, suffix(rc, ".")), format!("r{}, r{}", ra, rs))
            }
            Self::Shift { op, rs, ra, rb, rc } => {
                let base = match op {
                    ShiftOp::Slw => "slw",
                    ShiftOp::Srw => "srw",
                    ShiftOp::Sraw => "sraw",
                };
                (
                    format!("{}{}", base, suffix(rc, ".")),
                    format!("r{}, r{}, r{}", ra, rs, rb),
                )
            }
            Self::ShiftRightAlgebraicImmediate { rs, ra, sh, rc } => (
                format!("srawi{}", suffix(rc, ".")),
                format!("r{}, r{}, {}", ra, rs, sh),
            ),
            Self::Rotate {
                op,
                rs,
                ra,
                sh,
                mb,
                me,
                rc,
            } => {
                let (base, shift) = match op {
                    RotateOp::Rlwimi => ("rlwimi", sh.to_string()),
                    RotateOp::Rlwinm => ("rlwinm", sh.to_string()),
                    RotateOp::Rlwnm => ("rlwnm", format!("r{}", sh)),
                };
                (
                    format!("{}{}", base, suffix(rc, ".")),
                    format!("r{}, r{}, {}, {}, {}", ra, rs, shift, mb, me),
                )
            }
            Self::Load {
                kind,
                rt,
                ea,
                update,
            } => {
                let base = match kind {
                    LoadKind::Byte => "lbz",
                    LoadKind::Halfword => "lhz",
                    LoadKind::HalfwordAlgebraic => "lha",
                    LoadKind::Word => "lwz",
                    LoadKind::HalfwordByteReversed => "lhbr",
                    LoadKind::WordByteReversed => "lwbr",
                };
                memory_parts(base, rt, ea, update)
            }
            Self::Store {
                kind,
                rs,
                ea,
                update,
            } => {
                let base = match kind {
                    StoreKind::Byte => "stb",
                    StoreKind::Halfword => "sth",
                    StoreKind::Word => "stw",
                    StoreKind::HalfwordByteReversed => "sthbr",
                    StoreKind::WordByteReversed => "stwbr",
                };
                memory_parts(base, rs, ea, update)
            }
            Self::LoadMultiple { rt, ra, d } => {
                ("lmw".to_string(), format!("r{}, {}(r{})", rt, d as i32, ra))
            }
            Self::StoreMultiple { rs, ra, d } => {
                ("stmw".to_string(), format!("r{}, {}(r{})", rs, d as i32, ra))
            }
            Self::MoveFromSpr { rt, spr } => (format!("mf{}", spr.name()), format!("r{}", rt)),
            Self::MoveToSpr { spr, rs } => (format!("mt{}", spr.name()), format!("r{}", rs)),
            Self::MoveFromCr { rt } => ("mfcr".to_string(), format!("r{}", rt)),
            Self::MoveToCrFields { fxm: 0xFF, rs } => ("mtcr".to_string(), format!("r{}", rs)),
            Self::MoveToCrFields { fxm, rs } => {
                ("mtcrf".to_string(), format!("0x{:02x}, r{}", fxm, rs))
            }
            Self::Sync => ("sync".to_string(), String::new()),
            Self::Isync => ("isync".to_string(), String::new()),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

#[inline]
fn suffix(flag: bool, text: &'static str) -> &'static str {
    if flag {
        text
    } else {
        ""
    }
}

/// Branch target text. Relative targets without an address print as `.+n`.
fn target(offset: u32, aa: bool, address: Option<u32>) -> String {
    match (aa, address) {
        (true, _) => format!("0x{:08x}", offset),
        (false, Some(address)) => format!("0x{:08x}", address.wrapping_add(offset)),
        (false, None) => {
            let offset = offset as i32;
            if offset < 0 {
                format!(".-0x{:x}", offset.unsigned_abs())
            } else {
                format!(".+0x{:x}", offset)
            }
        }
    }
}

/// Extended mnemonic for a BO/BI pair, with its CR field operand
fn conditional_mnemonic(bo: u8, bi: u8, tail: &str) -> Option<(String, String)> {
    let skip = bo & (bo_bits::SKIP_CONDITION | bo_bits::SKIP_CTR);
    let cr = format!("cr{}", bi / 4);

    if skip == bo_bits::SKIP_CONDITION | bo_bits::SKIP_CTR {
        return Some((format!("b{}", tail), String::new()));
    }

    if skip == bo_bits::SKIP_CTR {
        let names = if bo & bo_bits::CONDITION_TRUE != 0 {
            ["lt", "gt", "eq", "so"]
        } else {
            ["ge", "le", "ne", "ns"]
        };
        return Some((format!("b{}{}", names[(bi % 4) as usize], tail), cr));
    }

    if skip == bo_bits::SKIP_CONDITION {
        let name = if bo & bo_bits::CTR_ZERO != 0 {
            "dz"
        } else {
            "dnz"
        };
        return Some((format!("b{}{}", name, tail), String::new()));
    }

    None
}

fn register_branch_parts(bo: u8, bi: u8, register: &str, lk: bool) -> (String, String) {
    let lk = suffix(lk, "l");
    match conditional_mnemonic(bo, bi, register) {
        Some((mnem, cr)) => (mnem + lk, cr),
        None => (format!("bc{}{}", register, lk), format!("{}, {}", bo, bi)),
    }
}

fn memory_parts(base: &str, reg: u8, ea: EffectiveAddress, update: bool) -> (String, String) {
    let update = suffix(update, "u");
    match ea {
        EffectiveAddress::Displacement { ra, d } => (
            format!("{}{}", base, update),
            format!("r{}, {}(r{})", reg, d as i32, ra),
        ),
        EffectiveAddress::Indexed { ra, rb } => (
            format!("{}{}x", base, update),
            format!("r{}, r{}, r{}", reg, ra, rb),
        ),
    }
}
