//! Whitespace lexer and assembler.
//!
//! Whitespace's concrete syntax is a three-token alphabet — space, tab,
//! linefeed — interleaved with arbitrary other bytes that are comments and
//! are simply dropped. This is the only module that knows that alphabet;
//! everywhere else in the crate programs are already a flat [`Instruction`]
//! list.

use thiserror::Error;

use crate::instruction::{Instruction, Label};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input while reading an instruction")]
    UnexpectedEof,
    #[error("unrecognized instruction-modification-parameter prefix")]
    UnknownImp,
    #[error("unrecognized opcode within an instruction-modification-parameter family")]
    UnknownOpcode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bit {
    Space,
    Tab,
    Lf,
}

/// A cursor over the token stream with non-whitespace bytes already dropped.
struct Tokens {
    bits: Vec<Bit>,
    pos: usize,
}

impl Tokens {
    fn new(source: &[u8]) -> Self {
        let bits = source
            .iter()
            .filter_map(|b| match b {
                b' ' => Some(Bit::Space),
                b'\t' => Some(Bit::Tab),
                b'\n' => Some(Bit::Lf),
                _ => None,
            })
            .collect();
        Self { bits, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bits.len()
    }

    fn advance(&mut self) -> Option<Bit> {
        let bit = *self.bits.get(self.pos)?;
        self.pos += 1;
        Some(bit)
    }

    fn expect(&mut self) -> Result<Bit, ParseError> {
        self.advance().ok_or(ParseError::UnexpectedEof)
    }

    /// A `Push`/`Copy`/`Slide` operand: a sign bit then a run of magnitude
    /// bits, terminated by `Lf`. `Space` = 0, `Tab` = 1; `Space` as the sign
    /// means non-negative.
    fn number(&mut self) -> Result<i64, ParseError> {
        let negative = match self.expect()? {
            Bit::Space => false,
            Bit::Tab => true,
            Bit::Lf => return Ok(0),
        };
        let mut magnitude: i64 = 0;
        loop {
            match self.expect()? {
                Bit::Space => magnitude = magnitude.wrapping_shl(1),
                Bit::Tab => magnitude = magnitude.wrapping_shl(1) | 1,
                Bit::Lf => break,
            }
        }
        Ok(if negative { -magnitude } else { magnitude })
    }

    /// A label: an unsigned bitstring terminated by `Lf`, kept as raw bits
    /// (see [`Label`]'s doc comment for why we don't decode it).
    fn label(&mut self) -> Result<Label, ParseError> {
        let mut bits = Vec::new();
        loop {
            match self.expect()? {
                Bit::Space => bits.push(false),
                Bit::Tab => bits.push(true),
                Bit::Lf => break,
            }
        }
        Ok(Label(bits))
    }
}

/// Lex and assemble a Whitespace source file into its flat instruction list.
///
/// Label references (`Call`/`Jump`/`JumpZero`/`JumpNegative`) are returned
/// unresolved, as [`Label`] bitstrings rather than indices — index resolution
/// happens once, over the whole program, when [`crate::state::State`] scans
/// for `Mark` instructions at entry-state construction, so forward
/// references need no second parser pass.
pub fn parse(source: &[u8]) -> Result<Vec<Instruction>, ParseError> {
    let mut tokens = Tokens::new(source);
    let mut program = Vec::new();
    while !tokens.is_at_end() {
        program.push(instruction(&mut tokens)?);
    }
    Ok(program)
}

fn instruction(tokens: &mut Tokens) -> Result<Instruction, ParseError> {
    match tokens.expect()? {
        Bit::Space => stack_manipulation(tokens),
        Bit::Tab => match tokens.expect()? {
            Bit::Space => arithmetic(tokens),
            Bit::Tab => heap_access(tokens),
            Bit::Lf => io(tokens),
        },
        Bit::Lf => flow_control(tokens),
    }
}

fn stack_manipulation(tokens: &mut Tokens) -> Result<Instruction, ParseError> {
    match tokens.expect()? {
        Bit::Space => Ok(Instruction::Push(tokens.number()?)),
        Bit::Tab => Ok(Instruction::Copy(tokens.number()?)),
        Bit::Lf => match tokens.expect()? {
            Bit::Space => Ok(Instruction::Duplicate),
            Bit::Tab => Ok(Instruction::Swap),
            Bit::Lf => Ok(Instruction::Discard),
        },
    }
}

fn arithmetic(tokens: &mut Tokens) -> Result<Instruction, ParseError> {
    match tokens.expect()? {
        Bit::Space => match tokens.expect()? {
            Bit::Space => Ok(Instruction::Add),
            Bit::Tab => Ok(Instruction::Sub),
            Bit::Lf => Ok(Instruction::Mul),
        },
        Bit::Tab => match tokens.expect()? {
            Bit::Space => Ok(Instruction::Div),
            Bit::Tab => Ok(Instruction::Mod),
            Bit::Lf => Err(ParseError::UnknownOpcode),
        },
        Bit::Lf => Err(ParseError::UnknownOpcode),
    }
}

fn heap_access(tokens: &mut Tokens) -> Result<Instruction, ParseError> {
    match tokens.expect()? {
        Bit::Space => Ok(Instruction::Store),
        Bit::Tab => Ok(Instruction::Retrieve),
        Bit::Lf => Err(ParseError::UnknownOpcode),
    }
}

fn flow_control(tokens: &mut Tokens) -> Result<Instruction, ParseError> {
    match tokens.expect()? {
        Bit::Space => match tokens.expect()? {
            Bit::Space => Ok(Instruction::Mark(tokens.label()?)),
            Bit::Tab => Ok(Instruction::Call(tokens.label()?)),
            Bit::Lf => Ok(Instruction::Jump(tokens.label()?)),
        },
        Bit::Tab => match tokens.expect()? {
            Bit::Space => Ok(Instruction::JumpZero(tokens.label()?)),
            Bit::Tab => Ok(Instruction::JumpNegative(tokens.label()?)),
            Bit::Lf => Ok(Instruction::Return),
        },
        Bit::Lf => match tokens.expect()? {
            Bit::Lf => Ok(Instruction::Exit),
            _ => Err(ParseError::UnknownOpcode),
        },
    }
}

fn io(tokens: &mut Tokens) -> Result<Instruction, ParseError> {
    match tokens.expect()? {
        Bit::Space => match tokens.expect()? {
            Bit::Space => Ok(Instruction::OutChar),
            Bit::Tab => Ok(Instruction::OutNum),
            Bit::Lf => Err(ParseError::UnknownOpcode),
        },
        Bit::Tab => match tokens.expect()? {
            Bit::Space => Ok(Instruction::ReadChar),
            Bit::Tab => Ok(Instruction::ReadNum),
            Bit::Lf => Err(ParseError::UnknownOpcode),
        },
        Bit::Lf => Err(ParseError::UnknownOpcode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `SSSTLTLS\n` style literals are hard to read, so tests spell bits out
    /// with these three one-letter helpers and build byte strings directly.
    const S: u8 = b' ';
    const T: u8 = b'\t';
    const L: u8 = b'\n';

    #[test]
    fn push_positive_number() {
        // push: [Space][Space], number: sign Space, magnitude "101" = 5, Lf
        let src = [S, S, S, S, T, S, T, L];
        let program = parse(&src).unwrap();
        assert_eq!(program, vec![Instruction::Push(5)]);
    }

    #[test]
    fn push_negative_number() {
        // push: [Space][Space], number: sign Tab (negative), magnitude "101" = 5, Lf
        let src = [S, S, T, T, S, T, L];
        let program = parse(&src).unwrap();
        assert_eq!(program, vec![Instruction::Push(-5)]);
    }

    #[test]
    fn comments_outside_the_three_token_alphabet_are_ignored() {
        // push 0: [Space][Space], sign Space, Lf; then exit: [Lf][Lf][Lf]
        let src = [b'#', b'h', b'i', S, S, S, L, L, L, L];
        let program = parse(&src).unwrap();
        assert_eq!(program, vec![Instruction::Push(0), Instruction::Exit]);
    }

    #[test]
    fn full_io_and_flow_round_trip() {
        // out_char: [Tab][Lf][Space][Space]
        // mark "S": [Lf][Space][Space], label "S" = Space, Lf
        // exit: [Lf][Lf][Lf]
        let src = [T, L, S, S, L, S, S, S, L, L, L, L];
        let program = parse(&src).unwrap();
        assert_eq!(
            program,
            vec![Instruction::OutChar, Instruction::Mark(Label(vec![false])), Instruction::Exit]
        );
    }

    #[test]
    fn truncated_instruction_is_an_error() {
        let src = [T];
        assert!(matches!(parse(&src), Err(ParseError::UnexpectedEof)));
    }

    #[test]
    fn unknown_arithmetic_opcode_is_rejected() {
        // [Tab][Space] selects arithmetic, then [Lf][Lf] has no meaning there
        let src = [T, S, L, L];
        assert!(matches!(parse(&src), Err(ParseError::UnknownOpcode)));
    }
}
