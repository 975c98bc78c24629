use tracing::debug;

use super::{
    fault::FaultKind,
    opcode::{ArithOp, Bank, CompareKind, Opcode, Operation},
    syscall::{Console, Syscall},
    Computer,
};
use crate::constants::{Address, Operand, Word};

/// An instruction, as stored in the instruction memory
///
/// The opcode is kept as its raw numeric code: an invalid one is only detected when the
/// instruction is decoded. The meaning of the three operands depends on the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instruction {
    pub op: u8,
    pub o1: Operand,
    pub o2: Operand,
    pub o3: Operand,
}

impl Instruction {
    #[must_use]
    pub const fn new(opcode: Opcode, o1: Operand, o2: Operand, o3: Operand) -> Self {
        Self {
            op: opcode.code(),
            o1,
            o2,
            o3,
        }
    }

    /// Get the opcode of the instruction
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::InvalidOpcode`] if the opcode is not part of the instruction set.
    pub fn opcode(&self) -> Result<Opcode, FaultKind> {
        Opcode::try_from(self.op).map_err(|e| FaultKind::InvalidOpcode(e.0))
    }

    /// Decode the instruction, keeping only the operands meaningful for its opcode
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::InvalidOpcode`] if the opcode is not part of the instruction set.
    pub fn decode(&self) -> Result<Decoded, FaultKind> {
        let opcode = self.opcode()?;
        let mut operands = [0; 3];
        let arity = opcode.arity();
        operands[..arity].copy_from_slice(&[self.o1, self.o2, self.o3][..arity]);
        Ok(Decoded { opcode, operands })
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.decode() {
            Ok(decoded) => write!(f, "{decoded}"),
            Err(_) => write!(
                f,
                "<invalid opcode {}> {}, {}, {}",
                self.op, self.o1, self.o2, self.o3
            ),
        }
    }
}

/// What to do with the program counter after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Go to the next instruction
    Next,

    /// Go to the given address
    Jump(Address),

    /// Stop the computer
    Halt,
}

/// A decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub opcode: Opcode,

    /// Operands, the ones past the arity of the opcode are always zero
    pub operands: [Operand; 3],
}

impl std::fmt::Display for Decoded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode)?;

        let arity = self.opcode.arity();
        for (i, operand) in self.operands[..arity].iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{operand}")?;
        }

        Ok(())
    }
}

fn int_arithmetic(op: ArithOp, a: i32, b: i32) -> Result<i32, FaultKind> {
    Ok(match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::Div if b == 0 => return Err(FaultKind::DivisionByZero),
        ArithOp::Div => a.wrapping_div(b),
        ArithOp::Mod if b == 0 => return Err(FaultKind::DivisionByZero),
        ArithOp::Mod => a.wrapping_rem(b),
    })
}

/// Floating point arithmetic never fails, a division by zero gives an infinity or a NaN
fn float_arithmetic(op: ArithOp, a: f32, b: f32) -> f32 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Mod => a % b,
    }
}

impl Decoded {
    /// Execute the instruction
    ///
    /// `pc` is the address of the instruction being executed, to compute relative branch
    /// targets.
    #[tracing::instrument(skip(computer, console))]
    pub(crate) fn execute(
        &self,
        pc: Address,
        computer: &mut Computer,
        console: &mut dyn Console,
    ) -> Result<Flow, FaultKind> {
        let [o1, o2, o3] = self.operands;

        match self.opcode.info().operation {
            Operation::Halt => return Ok(Flow::Halt),

            Operation::Noop => {}

            Operation::Arithmetic(op, Bank::Int) => {
                let a = computer.registers.read_int(o2)?;
                let b = computer.registers.read_int(o3)?;
                let res = int_arithmetic(op, a, b)?;
                debug!("{:?}({}, {}) = {}", op, a, b, res);
                computer.registers.write_int(o1, res)?;
            }

            Operation::Arithmetic(op, Bank::Float) => {
                let a = computer.registers.read_float(o2)?;
                let b = computer.registers.read_float(o3)?;
                let res = float_arithmetic(op, a, b);
                debug!("{:?}({}, {}) = {}", op, a, b, res);
                computer.registers.write_float(o1, res)?;
            }

            Operation::Relational(cmp, kind) => {
                let ordering = match kind {
                    CompareKind::Int => {
                        let a = computer.registers.read_int(o2)?;
                        let b = computer.registers.read_int(o3)?;
                        Some(a.cmp(&b))
                    }
                    CompareKind::Float => {
                        let a = computer.registers.read_float(o2)?;
                        let b = computer.registers.read_float(o3)?;
                        a.partial_cmp(&b)
                    }
                    CompareKind::Str => Some(computer.strings.compare(o2, o3)?),
                };
                let res = cmp.holds(ordering);
                debug!("{:?}({:?}) => {}", cmp, ordering, res);
                computer.registers.write_int(o1, i32::from(res))?;
            }

            Operation::Jump => {
                let target = Address::from(o1);
                debug!("Jumping to address {}", target);
                return Ok(Flow::Jump(target));
            }

            Operation::Branch(condition) => {
                let value = match computer.registers.read_int(o1)? {
                    0 => false,
                    1 => true,
                    other => return Err(FaultKind::InvalidBooleanValue(other)),
                };

                if value == condition {
                    let target = pc + Address::from(o2);
                    debug!("Branching to address {}", target);
                    return Ok(Flow::Jump(target));
                }
            }

            Operation::LoadWord(Bank::Int) => {
                let value = computer.memory.load_word_as_int(o2)?;
                computer.registers.write_int(o1, value)?;
            }

            Operation::LoadWord(Bank::Float) => {
                let value = computer.memory.load_word_as_float(o2)?;
                computer.registers.write_float(o1, value)?;
            }

            Operation::LoadImmediate(Bank::Int) => {
                computer.registers.write_int(o1, o2)?;
            }

            Operation::LoadImmediate(Bank::Float) => {
                // The float constant is carried by its bit pattern
                #[allow(clippy::cast_sign_loss)]
                let value = f32::from_bits(o2 as Word);
                computer.registers.write_float(o1, value)?;
            }

            Operation::StoreWord(Bank::Int) => {
                let value = computer.registers.read_int(o2)?;
                computer.memory.store_word_as_int(o1, value)?;
            }

            Operation::StoreWord(Bank::Float) => {
                let value = computer.registers.read_float(o2)?;
                computer.memory.store_word_as_float(o1, value)?;
            }

            Operation::StoreString => {
                let text = usize::try_from(o1)
                    .ok()
                    .and_then(|i| computer.constants.get(i))
                    .ok_or(FaultKind::StringIndexOutOfRange(o1))?;
                debug!("Storing {:?} in string slot {}", text, o1);
                computer.strings.set(o1, text)?;
            }

            Operation::Syscall => {
                Syscall::try_from(o1)?.execute(o2, computer, console)?;
            }
        }

        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::runtime::StdConsole;

    fn execute(computer: &mut Computer, instruction: Instruction) -> Result<Flow, FaultKind> {
        let mut console = StdConsole::new(&b""[..], Vec::new());
        instruction.decode()?.execute(5, computer, &mut console)
    }

    #[test]
    fn decode_test() {
        let decoded = Instruction::new(Opcode::Halt, 1, 2, 3).decode().unwrap();
        assert_eq!(decoded.operands, [0, 0, 0]);

        let decoded = Instruction::new(Opcode::Jump, 1, 2, 3).decode().unwrap();
        assert_eq!(decoded.operands, [1, 0, 0]);

        let decoded = Instruction::new(Opcode::Call, 1, 2, 3).decode().unwrap();
        assert_eq!(decoded.operands, [1, 2, 0]);

        let decoded = Instruction::new(Opcode::GteS, 1, 2, 3).decode().unwrap();
        assert_eq!(decoded.operands, [1, 2, 3]);

        let invalid = Instruction {
            op: 41,
            o1: 0,
            o2: 0,
            o3: 0,
        };
        assert_eq!(invalid.decode(), Err(FaultKind::InvalidOpcode(41)));
    }

    #[test]
    fn display_test() {
        assert_eq!(Instruction::new(Opcode::Halt, 7, 7, 7).to_string(), "HALT");
        assert_eq!(Instruction::new(Opcode::AddI, 2, 0, 1).to_string(), "ADDi 2, 0, 1");
        assert_eq!(Instruction::new(Opcode::BotB, 0, -3, 9).to_string(), "BOTb 0, -3");
        assert_eq!(
            Instruction {
                op: 200,
                o1: 1,
                o2: 2,
                o3: 3
            }
            .to_string(),
            "<invalid opcode 200> 1, 2, 3"
        );
    }

    #[test]
    fn int_arithmetic_test() {
        let mut computer = Computer::default();
        computer.registers.write_int(0, 17).unwrap();
        computer.registers.write_int(1, 5).unwrap();

        for (opcode, expected) in [
            (Opcode::AddI, 22),
            (Opcode::SubI, 12),
            (Opcode::MulI, 85),
            (Opcode::DivI, 3),
            (Opcode::ModI, 2),
        ] {
            let flow = execute(&mut computer, Instruction::new(opcode, 2, 0, 1));
            assert_eq!(flow, Ok(Flow::Next));
            assert_eq!(computer.registers.read_int(2), Ok(expected), "{opcode}");
        }

        // Wraps on overflow
        computer.registers.write_int(3, i32::MAX).unwrap();
        computer.registers.write_int(4, 1).unwrap();
        execute(&mut computer, Instruction::new(Opcode::AddI, 5, 3, 4)).unwrap();
        assert_eq!(computer.registers.read_int(5), Ok(i32::MIN));
    }

    #[test]
    fn int_min_by_minus_one_test() {
        let mut computer = Computer::default();
        computer.registers.write_int(0, i32::MIN).unwrap();
        computer.registers.write_int(1, -1).unwrap();

        for (opcode, expected) in [
            (Opcode::DivI, i32::MIN),
            (Opcode::ModI, 0),
            (Opcode::MulI, i32::MIN),
            (Opcode::AddI, i32::MAX),
        ] {
            let flow = execute(&mut computer, Instruction::new(opcode, 2, 0, 1));
            assert_eq!(flow, Ok(Flow::Next));
            assert_eq!(computer.registers.read_int(2), Ok(expected), "{opcode}");
        }
    }

    #[test]
    fn division_by_zero_test() {
        let mut computer = Computer::default();
        computer.registers.write_int(1, 10).unwrap();

        assert_eq!(
            execute(&mut computer, Instruction::new(Opcode::DivI, 0, 1, 2)),
            Err(FaultKind::DivisionByZero)
        );
        assert_eq!(
            execute(&mut computer, Instruction::new(Opcode::ModI, 0, 1, 2)),
            Err(FaultKind::DivisionByZero)
        );

        // Floats don't fault
        computer.registers.write_float(1, 1.0).unwrap();
        execute(&mut computer, Instruction::new(Opcode::DivF, 0, 1, 2)).unwrap();
        assert_eq!(computer.registers.read_float(0), Ok(f32::INFINITY));

        execute(&mut computer, Instruction::new(Opcode::ModF, 0, 1, 2)).unwrap();
        assert!(computer.registers.read_float(0).unwrap().is_nan());

        execute(&mut computer, Instruction::new(Opcode::DivF, 0, 2, 2)).unwrap();
        assert!(computer.registers.read_float(0).unwrap().is_nan());
    }

    #[test]
    fn float_arithmetic_test() {
        let mut computer = Computer::default();
        computer.registers.write_float(0, 7.5).unwrap();
        computer.registers.write_float(1, 2.0).unwrap();

        for (opcode, expected) in [
            (Opcode::AddF, 9.5),
            (Opcode::SubF, 5.5),
            (Opcode::MulF, 15.0),
            (Opcode::DivF, 3.75),
            (Opcode::ModF, 1.5),
        ] {
            execute(&mut computer, Instruction::new(opcode, 2, 0, 1)).unwrap();
            assert_eq!(computer.registers.read_float(2), Ok(expected), "{opcode}");
        }

        // The integer bank is untouched
        assert_eq!(computer.registers.read_int(2), Ok(0));
    }

    #[test]
    fn relational_test() {
        let mut computer = Computer::default();
        computer.registers.write_int(0, 3).unwrap();
        computer.registers.write_int(1, 4).unwrap();
        computer.registers.write_float(0, 1.5).unwrap();
        computer.registers.write_float(1, f32::NAN).unwrap();
        computer.strings.set(0, "abc").unwrap();
        computer.strings.set(1, "abd").unwrap();

        let cases = [
            (Opcode::EquI, 0, 1, 0),
            (Opcode::NeqI, 0, 1, 1),
            (Opcode::LthI, 0, 1, 1),
            (Opcode::LteI, 1, 1, 1),
            (Opcode::GthI, 0, 1, 0),
            (Opcode::GteI, 1, 0, 1),
            (Opcode::EquF, 0, 0, 1),
            (Opcode::EquF, 1, 1, 0),
            (Opcode::NeqF, 1, 1, 1),
            (Opcode::LthF, 0, 1, 0),
            (Opcode::EquS, 0, 0, 1),
            (Opcode::LthS, 0, 1, 1),
            (Opcode::GthS, 0, 1, 0),
            (Opcode::GteS, 1, 0, 1),
            (Opcode::NeqS, 0, 1, 1),
        ];

        for (opcode, a, b, expected) in cases {
            execute(&mut computer, Instruction::new(opcode, 10, a, b)).unwrap();
            assert_eq!(
                computer.registers.read_int(10),
                Ok(expected),
                "{opcode} {a}, {b}"
            );
        }

        assert_eq!(
            execute(&mut computer, Instruction::new(Opcode::EquS, 10, 0, 5000)),
            Err(FaultKind::StringIndexOutOfRange(5000))
        );
    }

    #[test]
    fn control_flow_test() {
        let mut computer = Computer::default();
        computer.registers.write_int(0, 1).unwrap();
        computer.registers.write_int(1, 0).unwrap();
        computer.registers.write_int(2, 2).unwrap();

        // The instruction is executed at address 5
        let cases = [
            (Instruction::new(Opcode::Halt, 0, 0, 0), Ok(Flow::Halt)),
            (Instruction::new(Opcode::Noop, 0, 0, 0), Ok(Flow::Next)),
            (Instruction::new(Opcode::Jump, 42, 0, 0), Ok(Flow::Jump(42))),
            (Instruction::new(Opcode::Jump, -1, 0, 0), Ok(Flow::Jump(-1))),
            (Instruction::new(Opcode::BotB, 0, -2, 0), Ok(Flow::Jump(3))),
            (Instruction::new(Opcode::BotB, 1, -2, 0), Ok(Flow::Next)),
            (Instruction::new(Opcode::BofB, 1, 10, 0), Ok(Flow::Jump(15))),
            (Instruction::new(Opcode::BofB, 0, 10, 0), Ok(Flow::Next)),
            (
                Instruction::new(Opcode::BotB, 2, 1, 0),
                Err(FaultKind::InvalidBooleanValue(2)),
            ),
            (
                Instruction::new(Opcode::BofB, 2, 1, 0),
                Err(FaultKind::InvalidBooleanValue(2)),
            ),
        ];

        for (instruction, expected) in cases {
            assert_eq!(execute(&mut computer, instruction), expected, "{instruction}");
        }
    }

    #[test]
    fn load_store_test() {
        let mut computer = Computer::default();

        execute(&mut computer, Instruction::new(Opcode::LdiI, 0, -12, 0)).unwrap();
        assert_eq!(computer.registers.read_int(0), Ok(-12));

        #[allow(clippy::cast_possible_wrap)]
        let bits = 1.5f32.to_bits() as i32;
        execute(&mut computer, Instruction::new(Opcode::LdiF, 3, bits, 0)).unwrap();
        assert_eq!(computer.registers.read_float(3), Ok(1.5));

        execute(&mut computer, Instruction::new(Opcode::StwI, 100, 0, 0)).unwrap();
        execute(&mut computer, Instruction::new(Opcode::StwF, 101, 3, 0)).unwrap();
        assert_eq!(computer.memory.load_word_as_int(100), Ok(-12));
        assert_eq!(computer.memory.load_word_as_float(101), Ok(1.5));

        // Loading the float cell as an integer gives its bit pattern
        execute(&mut computer, Instruction::new(Opcode::LdwI, 5, 101, 0)).unwrap();
        assert_eq!(computer.registers.read_int(5), Ok(bits));
        execute(&mut computer, Instruction::new(Opcode::LdwF, 5, 101, 0)).unwrap();
        assert_eq!(computer.registers.read_float(5), Ok(1.5));

        assert_eq!(
            execute(&mut computer, Instruction::new(Opcode::StwI, 1024, 0, 0)),
            Err(FaultKind::DataAddressOutOfRange(1024))
        );
        assert_eq!(
            execute(&mut computer, Instruction::new(Opcode::LdwF, 32, 0, 0)),
            Err(FaultKind::OperandOutOfRange(32))
        );
    }

    #[test]
    fn store_string_test() {
        let mut computer = Computer::default();
        computer.constants = vec!["first".to_owned(), "second".to_owned()];

        execute(&mut computer, Instruction::new(Opcode::Sstr, 1, 0, 0)).unwrap();
        assert_eq!(computer.strings.get(1), Ok("second"));
        assert!(computer.strings.is_empty_slot(0));

        assert_eq!(
            execute(&mut computer, Instruction::new(Opcode::Sstr, 2, 0, 0)),
            Err(FaultKind::StringIndexOutOfRange(2))
        );
    }

    #[test]
    fn syscall_test() {
        let mut computer = Computer::default();
        computer.registers.write_int(4, 99).unwrap();

        let mut console = StdConsole::new(&b"12"[..], Vec::new());
        Instruction::new(Opcode::Call, 0, 1, 0)
            .decode()
            .unwrap()
            .execute(0, &mut computer, &mut console)
            .unwrap();
        Instruction::new(Opcode::Call, 4, 4, 0)
            .decode()
            .unwrap()
            .execute(1, &mut computer, &mut console)
            .unwrap();

        assert_eq!(computer.registers.read_int(1), Ok(12));
        assert_eq!(console.into_output(), b"99\n");

        assert_eq!(
            execute(&mut computer, Instruction::new(Opcode::Call, 9, 0, 0)),
            Err(FaultKind::InvalidSyscall(9))
        );
    }
}
