use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use strum::EnumIter;

/// The instruction table. Discriminants are the opcodes emitted into the
/// object stream; lookup is by exact mnemonic text.
#[repr(u8)]
#[derive(EnumIter, FromPrimitive, ToPrimitive, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Mov = 0x01,
    Add = 0x02,
}

impl Mnemonic {
    pub fn parse(name: &str) -> Option<Self> {
        let mnemonic = match name {
            "MOV" => Self::Mov,
            "ADD" => Self::Add,
            _ => return None,
        };

        Some(mnemonic)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Mov => "MOV",
            Self::Add => "ADD",
        }
    }

    pub fn opcode(self) -> u8 {
        self as u8
    }

    /// The addressing modes this instruction accepts. A resolved mode
    /// outside this set is a translation error.
    pub fn allowed_modes(self) -> ModeSet {
        match self {
            // all two-operand data-movement shapes
            Self::Mov => {
                ModeSet::REG_IMM
                    | ModeSet::REG_REG
                    | ModeSet::MEM_IMM
                    | ModeSet::MEM_REG
                    | ModeSet::REG_MEM
            }
            // implied/accumulator forms plus the explicit two-operand ones;
            // ADD never stores into a memory operand
            Self::Add => {
                ModeSet::NO_OPERAND
                    | ModeSet::IMMEDIATE
                    | ModeSet::REGISTER
                    | ModeSet::REG_IMM
                    | ModeSet::REG_REG
                    | ModeSet::REG_MEM
            }
        }
    }
}

/// The register table. Discriminants are the indices emitted for register
/// operands; unknown names resolve to `None`, never to a sentinel index.
#[repr(u8)]
#[derive(EnumIter, FromPrimitive, ToPrimitive, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
}

impl Register {
    pub fn parse(name: &str) -> Option<Self> {
        let register = match name {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            "D" => Self::D,
            _ => return None,
        };

        Some(register)
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// One of the eight fixed operand-shape grammars an instruction occurrence
/// can use. The discriminant is the mode tag written after the opcode byte.
#[repr(u8)]
#[derive(EnumIter, FromPrimitive, ToPrimitive, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    NoOperand = 0,
    /// `imm`
    Immediate = 1,
    /// `reg`
    Register = 2,
    /// `reg, imm`
    RegImm = 3,
    /// `reg, reg`
    RegReg = 4,
    /// `[reg+imm], imm`
    MemImm = 5,
    /// `[reg+imm], reg`
    MemReg = 6,
    /// `reg, [reg+imm]`
    RegMem = 7,
}

impl AddressingMode {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn flag(self) -> ModeSet {
        ModeSet::from_bits_truncate(1 << self.tag())
    }

    /// Operand bytes following the mode byte. A decoder must replay this
    /// table to find instruction boundaries.
    pub fn operand_count(self) -> usize {
        match self {
            Self::NoOperand => 0,
            Self::Immediate | Self::Register => 1,
            Self::RegImm | Self::RegReg => 2,
            Self::MemImm | Self::MemReg | Self::RegMem => 3,
        }
    }
}

bitflags! {
    /// A set of addressing modes; bit `n` is mode tag `n`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ModeSet: u8 {
        const NO_OPERAND = 1 << 0;
        const IMMEDIATE = 1 << 1;
        const REGISTER = 1 << 2;
        const REG_IMM = 1 << 3;
        const REG_REG = 1 << 4;
        const MEM_IMM = 1 << 5;
        const MEM_REG = 1 << 6;
        const REG_MEM = 1 << 7;
    }
}

#[cfg(test)]
mod tests {
    use num_traits::FromPrimitive;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn mode_flags_match_their_tags() {
        for mode in AddressingMode::iter() {
            assert_eq!(mode.flag().bits(), 1 << mode.tag());
        }
    }

    #[test]
    fn mode_tags_round_trip_through_the_byte_encoding() {
        for mode in AddressingMode::iter() {
            assert_eq!(AddressingMode::from_u8(mode.tag()), Some(mode));
        }
        assert_eq!(AddressingMode::from_u8(8), None);
    }

    #[test]
    fn opcodes_match_the_instruction_table() {
        assert_eq!(Mnemonic::Mov.opcode(), 0x01);
        assert_eq!(Mnemonic::Add.opcode(), 0x02);
    }

    #[test]
    fn mnemonic_lookup_is_case_sensitive() {
        assert_eq!(Mnemonic::parse("MOV"), Some(Mnemonic::Mov));
        assert_eq!(Mnemonic::parse("mov"), None);
        assert_eq!(Mnemonic::parse("NOP"), None);
    }

    #[test]
    fn register_lookup_has_no_sentinel() {
        assert_eq!(Register::parse("A"), Some(Register::A));
        assert_eq!(Register::parse("Z"), None);
        for register in Register::iter() {
            assert!(register.index() < 4);
        }
    }

    #[test]
    fn whitelists_cover_the_required_modes() {
        assert!(
            Mnemonic::Mov
                .allowed_modes()
                .contains(AddressingMode::RegImm.flag())
        );
        assert!(
            Mnemonic::Add
                .allowed_modes()
                .contains(AddressingMode::RegReg.flag())
        );
        assert!(
            !Mnemonic::Add
                .allowed_modes()
                .contains(AddressingMode::MemImm.flag())
        );
    }

    #[test]
    fn some_mnemonic_accepts_the_zero_operand_form() {
        assert!(
            Mnemonic::iter()
                .any(|m| m.allowed_modes().contains(AddressingMode::NoOperand.flag()))
        );
    }
}
