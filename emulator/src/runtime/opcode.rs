//! The instruction set of the machine.
//!
//! The opcode numbering, the mnemonics and the operand counts are shared with the assemblers and
//! disassemblers working with this machine, and must not change. Everything known about an opcode
//! comes from a single table, [`Opcode::info`].

use std::cmp::Ordering;

use thiserror::Error;

/// Register bank an instruction works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Int,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equ,
    Neq,
    Lth,
    Lte,
    Gth,
    Gte,
}

impl Comparison {
    /// Check if the comparison holds for the given ordering.
    ///
    /// Unordered operands (a NaN on either side) are only ever "not equal".
    #[must_use]
    pub fn holds(self, ordering: Option<Ordering>) -> bool {
        use Ordering::{Equal, Greater, Less};

        match self {
            Self::Equ => ordering == Some(Equal),
            Self::Neq => ordering != Some(Equal),
            Self::Lth => ordering == Some(Less),
            Self::Lte => matches!(ordering, Some(Less | Equal)),
            Self::Gth => ordering == Some(Greater),
            Self::Gte => matches!(ordering, Some(Greater | Equal)),
        }
    }
}

/// What the operands of a relational instruction refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    Int,
    Float,
    /// Indices in the string table
    Str,
}

/// The semantic effect of an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Halt,
    Noop,
    Arithmetic(ArithOp, Bank),
    Relational(Comparison, CompareKind),
    Jump,
    /// Relative branch, taken if the condition register holds the given truth value
    Branch(bool),
    LoadWord(Bank),
    LoadImmediate(Bank),
    StoreWord(Bank),
    StoreString,
    Syscall,
}

/// Static informations about an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,

    /// Number of meaningful operands
    pub arity: usize,

    pub operation: Operation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Halt,
    Noop,
    AddI,
    AddF,
    SubI,
    SubF,
    MulI,
    MulF,
    DivI,
    DivF,
    ModI,
    ModF,
    EquI,
    EquF,
    EquS,
    NeqI,
    NeqF,
    NeqS,
    LthI,
    LthF,
    LthS,
    LteI,
    LteF,
    LteS,
    GthI,
    GthF,
    GthS,
    GteI,
    GteF,
    GteS,
    Jump,
    BotB,
    BofB,
    LdwI,
    LdwF,
    LdiI,
    LdiF,
    StwI,
    StwF,
    Sstr,
    Call,
}

impl Opcode {
    /// All opcodes, in numbering order
    #[allow(clippy::enum_glob_use)]
    pub const ALL: [Opcode; 41] = {
        use Opcode::*;
        [
            Halt, Noop, AddI, AddF, SubI, SubF, MulI, MulF, DivI, DivF, ModI, ModF, EquI, EquF,
            EquS, NeqI, NeqF, NeqS, LthI, LthF, LthS, LteI, LteF, LteS, GthI, GthF, GthS, GteI,
            GteF, GteS, Jump, BotB, BofB, LdwI, LdwF, LdiI, LdiF, StwI, StwF, Sstr, Call,
        ]
    };

    #[must_use]
    #[allow(clippy::enum_glob_use)]
    pub const fn info(self) -> OpcodeInfo {
        use self::{ArithOp as A, Bank as B, CompareKind as K, Comparison as C, Operation as O};
        use Opcode::*;

        const fn i(mnemonic: &'static str, arity: usize, operation: Operation) -> OpcodeInfo {
            OpcodeInfo {
                mnemonic,
                arity,
                operation,
            }
        }

        match self {
            Halt => i("HALT", 0, O::Halt),
            Noop => i("NOOP", 0, O::Noop),

            AddI => i("ADDi", 3, O::Arithmetic(A::Add, B::Int)),
            AddF => i("ADDf", 3, O::Arithmetic(A::Add, B::Float)),
            SubI => i("SUBi", 3, O::Arithmetic(A::Sub, B::Int)),
            SubF => i("SUBf", 3, O::Arithmetic(A::Sub, B::Float)),
            MulI => i("MULi", 3, O::Arithmetic(A::Mul, B::Int)),
            MulF => i("MULf", 3, O::Arithmetic(A::Mul, B::Float)),
            DivI => i("DIVi", 3, O::Arithmetic(A::Div, B::Int)),
            DivF => i("DIVf", 3, O::Arithmetic(A::Div, B::Float)),
            ModI => i("MODi", 3, O::Arithmetic(A::Mod, B::Int)),
            ModF => i("MODf", 3, O::Arithmetic(A::Mod, B::Float)),

            EquI => i("EQUi", 3, O::Relational(C::Equ, K::Int)),
            EquF => i("EQUf", 3, O::Relational(C::Equ, K::Float)),
            EquS => i("EQUs", 3, O::Relational(C::Equ, K::Str)),
            NeqI => i("NEQi", 3, O::Relational(C::Neq, K::Int)),
            NeqF => i("NEQf", 3, O::Relational(C::Neq, K::Float)),
            NeqS => i("NEQs", 3, O::Relational(C::Neq, K::Str)),
            LthI => i("LTHi", 3, O::Relational(C::Lth, K::Int)),
            LthF => i("LTHf", 3, O::Relational(C::Lth, K::Float)),
            LthS => i("LTHs", 3, O::Relational(C::Lth, K::Str)),
            LteI => i("LTEi", 3, O::Relational(C::Lte, K::Int)),
            LteF => i("LTEf", 3, O::Relational(C::Lte, K::Float)),
            LteS => i("LTEs", 3, O::Relational(C::Lte, K::Str)),
            GthI => i("GTHi", 3, O::Relational(C::Gth, K::Int)),
            GthF => i("GTHf", 3, O::Relational(C::Gth, K::Float)),
            GthS => i("GTHs", 3, O::Relational(C::Gth, K::Str)),
            GteI => i("GTEi", 3, O::Relational(C::Gte, K::Int)),
            GteF => i("GTEf", 3, O::Relational(C::Gte, K::Float)),
            GteS => i("GTEs", 3, O::Relational(C::Gte, K::Str)),

            Jump => i("JUMP", 1, O::Jump),
            BotB => i("BOTb", 2, O::Branch(true)),
            BofB => i("BOFb", 2, O::Branch(false)),

            LdwI => i("LDWi", 2, O::LoadWord(B::Int)),
            LdwF => i("LDWf", 2, O::LoadWord(B::Float)),
            LdiI => i("LDIi", 2, O::LoadImmediate(B::Int)),
            LdiF => i("LDIf", 2, O::LoadImmediate(B::Float)),
            StwI => i("STWi", 2, O::StoreWord(B::Int)),
            StwF => i("STWf", 2, O::StoreWord(B::Float)),

            Sstr => i("SSTR", 1, O::StoreString),

            Call => i("CALL", 2, O::Syscall),
        }
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    #[must_use]
    pub const fn arity(self) -> usize {
        self.info().arity
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.mnemonic())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown opcode {0}")]
pub struct UnknownOpcode(pub u8);

impl TryFrom<u8> for Opcode {
    type Error = UnknownOpcode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(UnknownOpcode(code))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mnemonic {0:?}")]
pub struct UnknownMnemonic(String);

impl std::str::FromStr for Opcode {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| UnknownMnemonic(s.to_owned()))
    }
}
