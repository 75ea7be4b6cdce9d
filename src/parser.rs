//! Line-oriented assembly parser.
//!
//! One statement per line; `;` starts a comment; a line holding only
//! `name:` declares a label bound to the PC index of the next
//! instruction line. Operands are separated by commas and/or
//! whitespace. Registers are written `r<N>` or `x<N>`
//! (case-insensitive), immediates are signed decimal, branch targets
//! are identifiers.

use std::collections::HashMap;

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while, take_while1};
use nom::character::complete::{char, digit1, satisfy, space0, space1};
use nom::combinator::{all_consuming, opt, recognize};
use nom::multi::separated_list0;
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::IResult;

use crate::error::ProgramError;
use crate::instruction::{Instruction, OpCode, Reg, Src};
use crate::program::Program;

/// One classified operand token.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Register(Reg),
    Immediate(i32),
    Label(&'a str),
}

fn register(input: &str) -> IResult<&str, Reg> {
    let (rest, digits) = preceded(
        alt((tag_no_case("r"), tag_no_case("x"))),
        digit1,
    )(input)?;
    match digits.parse() {
        Ok(reg) => Ok((rest, reg)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::MapRes,
        ))),
    }
}

fn immediate(input: &str) -> IResult<&str, i32> {
    let (rest, digits) = recognize(pair(opt(char('-')), digit1))(input)?;
    match digits.parse() {
        Ok(value) => Ok((rest, value)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::MapRes,
        ))),
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn operand_token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ',' && !c.is_whitespace())(input)
}

fn operand_separator(input: &str) -> IResult<&str, &str> {
    alt((delimited(space0, tag(","), space0), space1))(input)
}

fn operand_list(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(
        space0,
        separated_list0(operand_separator, operand_token),
        space0,
    )(input)
}

fn statement(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    pair(preceded(space0, identifier), operand_list)(input)
}

fn label_declaration(input: &str) -> IResult<&str, &str> {
    delimited(
        space0,
        terminated(identifier, preceded(space0, char(':'))),
        space0,
    )(input)
}

fn classify(token: &str) -> Option<Token> {
    if let Ok((_, reg)) = all_consuming(register)(token) {
        return Some(Token::Register(reg));
    }
    if let Ok((_, value)) = all_consuming(immediate)(token) {
        return Some(Token::Immediate(value));
    }
    if let Ok((_, label)) = all_consuming(identifier)(token) {
        return Some(Token::Label(label));
    }
    None
}

fn expect_register(token: Token, line: usize) -> Result<Reg, ProgramError> {
    match token {
        Token::Register(reg) => Ok(reg),
        Token::Immediate(value) => Err(ProgramError::BadOperand {
            line,
            token: value.to_string(),
        }),
        Token::Label(label) => Err(ProgramError::BadOperand {
            line,
            token: label.to_string(),
        }),
    }
}

fn expect_src(token: Token, line: usize) -> Result<Src, ProgramError> {
    match token {
        Token::Register(reg) => Ok(Src::Reg(reg)),
        Token::Immediate(value) => Ok(Src::Imm(value)),
        Token::Label(label) => Err(ProgramError::BadOperand {
            line,
            token: label.to_string(),
        }),
    }
}

fn expect_immediate(token: Token, line: usize) -> Result<i32, ProgramError> {
    match token {
        Token::Immediate(value) => Ok(value),
        Token::Register(reg) => Err(ProgramError::BadOperand {
            line,
            token: format!("r{}", reg),
        }),
        Token::Label(label) => Err(ProgramError::BadOperand {
            line,
            token: label.to_string(),
        }),
    }
}

fn expect_label(token: Token, line: usize) -> Result<String, ProgramError> {
    match token {
        Token::Label(label) => Ok(label.to_string()),
        Token::Register(reg) => Err(ProgramError::BadOperand {
            line,
            token: format!("r{}", reg),
        }),
        Token::Immediate(value) => Err(ProgramError::BadOperand {
            line,
            token: value.to_string(),
        }),
    }
}

fn build_instruction(
    op: OpCode,
    tokens: &[Token],
    line: usize,
) -> Result<Instruction, ProgramError> {
    let malformed = |expected: &'static str| ProgramError::MalformedOperands {
        line,
        op: op.name(),
        expected,
    };

    match op {
        OpCode::RXor | OpCode::RAdd | OpCode::RSwap => {
            if tokens.len() != 2 {
                return Err(malformed("rd, rs1"));
            }
            let rd = expect_register(tokens[0], line)?;
            let rs1 = expect_register(tokens[1], line)?;
            Ok(match op {
                OpCode::RXor => Instruction::RXor { rd, rs1 },
                OpCode::RAdd => Instruction::RAdd { rd, rs1 },
                _ => Instruction::RSwap { rd, rs1 },
            })
        }
        OpCode::Beq => {
            if tokens.len() != 3 {
                return Err(malformed("rs1, rs2, label"));
            }
            Ok(Instruction::Beq {
                rs1: expect_register(tokens[0], line)?,
                rs2: expect_register(tokens[1], line)?,
                label: expect_label(tokens[2], line)?,
            })
        }
        OpCode::Add | OpCode::Sub => {
            if tokens.len() != 3 {
                return Err(malformed("rd, rs1, (rs2|imm)"));
            }
            let rd = expect_register(tokens[0], line)?;
            let rs1 = expect_register(tokens[1], line)?;
            let src = expect_src(tokens[2], line)?;
            Ok(match op {
                OpCode::Add => Instruction::Add { rd, rs1, src },
                _ => Instruction::Sub { rd, rs1, src },
            })
        }
        OpCode::Load => {
            if tokens.len() < 2 || tokens.len() > 3 {
                return Err(malformed("rd, rs1 [, offset]"));
            }
            Ok(Instruction::Load {
                rd: expect_register(tokens[0], line)?,
                rs1: expect_register(tokens[1], line)?,
                offset: match tokens.get(2) {
                    Some(&token) => expect_immediate(token, line)?,
                    None => 0,
                },
            })
        }
        OpCode::Store => {
            if tokens.len() < 2 || tokens.len() > 3 {
                return Err(malformed("rs1, rs2 [, offset]"));
            }
            Ok(Instruction::Store {
                rs1: expect_register(tokens[0], line)?,
                rs2: expect_register(tokens[1], line)?,
                offset: match tokens.get(2) {
                    Some(&token) => expect_immediate(token, line)?,
                    None => 0,
                },
            })
        }
        OpCode::Halt => {
            if !tokens.is_empty() {
                return Err(malformed("no operands"));
            }
            Ok(Instruction::Halt)
        }
    }
}

/// Parse assembly source into a [`Program`]. The label map binds each
/// declaration to the PC index of the instruction that follows it.
pub fn parse_program(source: &str) -> Result<Program, ProgramError> {
    let mut labels: HashMap<String, usize> = HashMap::new();
    let mut pending: Vec<(usize, &str)> = Vec::new();
    let mut pc = 0;

    // first pass: bind labels to PC indices
    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if line.ends_with(':') {
            let label = match all_consuming(label_declaration)(line) {
                Ok((_, label)) => label,
                Err(_) => {
                    return Err(ProgramError::InvalidLabel {
                        line: line_number,
                        label: line.trim_end_matches(':').trim().to_string(),
                    });
                }
            };
            if labels.insert(label.to_string(), pc).is_some() {
                return Err(ProgramError::DuplicateLabel {
                    line: line_number,
                    label: label.to_string(),
                });
            }
            continue;
        }

        pending.push((line_number, line));
        pc += 1;
    }

    // second pass: decode statements
    let mut instructions = Vec::with_capacity(pending.len());
    for (line_number, line) in pending {
        let (mnemonic, operands) = match all_consuming(statement)(line) {
            Ok((_, parsed)) => parsed,
            Err(_) => {
                return Err(ProgramError::BadOperand {
                    line: line_number,
                    token: line.to_string(),
                });
            }
        };

        let op = OpCode::from_mnemonic(mnemonic).ok_or_else(|| {
            ProgramError::UnknownMnemonic {
                line: line_number,
                mnemonic: mnemonic.to_string(),
            }
        })?;

        let mut tokens = Vec::with_capacity(operands.len());
        for operand in operands {
            match classify(operand) {
                Some(token) => tokens.push(token),
                None => {
                    return Err(ProgramError::BadOperand {
                        line: line_number,
                        token: operand.to_string(),
                    });
                }
            }
        }

        instructions.push(build_instruction(op, &tokens, line_number)?);
    }

    Ok(Program::new(instructions, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operands_split_by_commas_or_spaces() {
        let program = parse_program("RADD r1, r2\nRXOR r1 r2\nHALT\n").unwrap();
        assert_eq!(
            program.instructions(),
            &[
                Instruction::RAdd { rd: 1, rs1: 2 },
                Instruction::RXor { rd: 1, rs1: 2 },
                Instruction::Halt,
            ]
        );
    }

    #[test]
    fn labels_bind_to_the_next_instruction() {
        let source = "\
; countdown
ADD r1, r0, 2
top:
SUB r1, r1, 1
BEQ r1, r0, done
BEQ r0, r0, top
done:
HALT
";
        let program = parse_program(source).unwrap();
        assert_eq!(program.label_target("top"), Some(1));
        assert_eq!(program.label_target("done"), Some(4));
        assert_eq!(program.len(), 5);
    }

    #[test]
    fn x_registers_and_mixed_case_are_accepted() {
        let program = parse_program("add X1, x0, 7\n").unwrap();
        assert_eq!(
            program.instructions(),
            &[Instruction::Add { rd: 1, rs1: 0, src: Src::Imm(7) }]
        );
    }

    #[test]
    fn negative_immediates_parse() {
        let program = parse_program("ADD r1, r0, -3\nLOAD r2, r1, -4\n").unwrap();
        assert_eq!(
            program.instructions(),
            &[
                Instruction::Add { rd: 1, rs1: 0, src: Src::Imm(-3) },
                Instruction::Load { rd: 2, rs1: 1, offset: -4 },
            ]
        );
    }

    #[test]
    fn load_and_store_offsets_default_to_zero() {
        let program = parse_program("LOAD r1, r2\nSTORE r2, r3\n").unwrap();
        assert_eq!(
            program.instructions(),
            &[
                Instruction::Load { rd: 1, rs1: 2, offset: 0 },
                Instruction::Store { rs1: 2, rs2: 3, offset: 0 },
            ]
        );
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        let err = parse_program("FROB r1, r2\n").unwrap_err();
        assert_eq!(
            err,
            ProgramError::UnknownMnemonic { line: 1, mnemonic: "FROB".into() }
        );
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let err = parse_program("top:\nHALT\ntop:\nHALT\n").unwrap_err();
        assert_eq!(err, ProgramError::DuplicateLabel { line: 3, label: "top".into() });
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let err = parse_program("RADD r1\n").unwrap_err();
        assert_eq!(
            err,
            ProgramError::MalformedOperands { line: 1, op: "RADD", expected: "rd, rs1" }
        );
    }

    #[test]
    fn register_where_label_expected_is_an_error() {
        let err = parse_program("BEQ r1, r2, r3\n").unwrap_err();
        assert_eq!(err, ProgramError::BadOperand { line: 1, token: "r3".into() });
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let program = parse_program("\n; nothing here\nHALT ; stop\n\n").unwrap();
        assert_eq!(program.instructions(), &[Instruction::Halt]);
    }

    #[test]
    fn halt_takes_no_operands() {
        let err = parse_program("HALT r1\n").unwrap_err();
        assert_eq!(
            err,
            ProgramError::MalformedOperands { line: 1, op: "HALT", expected: "no operands" }
        );
    }
}
