use std::borrow::Cow;
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while1};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, opt, value};
use nom::sequence::{delimited, preceded, terminated};
use nom::IResult;

/// Commands understood by the interactive debugger prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(String),
    Step(u64),
    Back(u64),
    Run(Option<u64>),
    Regs,
    Log,
    Watch { register: u8, expected: u32 },
    Diagnose,
    Info,
    Repeat,
    Exit,
}

fn number<T: FromStr>(input: &str) -> IResult<&str, T> {
    let (rest, digits) = digit1(input)?;
    match digits.parse() {
        Ok(value) => Ok((rest, value)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::MapRes,
        ))),
    }
}

fn register(input: &str) -> IResult<&str, u8> {
    preceded(
        opt(alt((tag_no_case("r"), tag_no_case("x")))),
        number,
    )(input)
}

fn filename(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while1(|c| c != '"'), char('"')),
        take_while1(|c: char| !c.is_whitespace()),
    ))(input)
}

fn load(input: &str) -> IResult<&str, Command> {
    let (rest, _) = tag("load")(input)?;
    let (rest, path) = preceded(space1, filename)(rest)?;
    Ok((rest, Command::Load(path.to_string())))
}

fn step(input: &str) -> IResult<&str, Command> {
    let (rest, _) = alt((tag("step"), tag("s")))(input)?;
    let (rest, count) = opt(preceded(space1, number))(rest)?;
    Ok((rest, Command::Step(count.unwrap_or(1))))
}

fn back(input: &str) -> IResult<&str, Command> {
    let (rest, _) = alt((tag("back"), tag("b")))(input)?;
    let (rest, count) = opt(preceded(space1, number))(rest)?;
    Ok((rest, Command::Back(count.unwrap_or(1))))
}

fn run(input: &str) -> IResult<&str, Command> {
    let (rest, _) = alt((tag("run"), tag("r")))(input)?;
    let (rest, cap) = opt(preceded(space1, number))(rest)?;
    Ok((rest, Command::Run(cap)))
}

fn watch(input: &str) -> IResult<&str, Command> {
    let (rest, _) = tag("watch")(input)?;
    let (rest, register) = preceded(space1, register)(rest)?;
    let (rest, expected) = preceded(space1, number)(rest)?;
    Ok((rest, Command::Watch { register, expected }))
}

fn exit(input: &str) -> IResult<&str, Command> {
    value(Command::Exit, alt((tag("exit"), tag("quit"), tag("q"))))(input)
}

fn diagnose(input: &str) -> IResult<&str, Command> {
    value(Command::Diagnose, alt((tag("diagnose"), tag("diag"), tag("d"))))(input)
}

fn regs(input: &str) -> IResult<&str, Command> {
    value(Command::Regs, alt((tag("registers"), tag("regs"))))(input)
}

fn log(input: &str) -> IResult<&str, Command> {
    value(Command::Log, alt((tag("log"), tag("l"))))(input)
}

fn info(input: &str) -> IResult<&str, Command> {
    value(Command::Info, alt((tag("info"), tag("i"))))(input)
}

fn repeat(input: &str) -> IResult<&str, Command> {
    value(Command::Repeat, space0)(input)
}

// ordering matters where one command's short form prefixes another:
// `load` before `l`, `regs` before `r`
fn command(input: &str) -> IResult<&str, Command> {
    preceded(
        space0,
        alt((exit, diagnose, watch, load, log, regs, run, step, back, info, repeat)),
    )(input)
}

impl FromStr for Command {
    type Err = Cow<'static, str>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match all_consuming(terminated(command, space0))(s) {
            Ok((_, command)) => Ok(command),
            Err(_) => Err(format!("Unrecognized command '{}'.", s.trim()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_forms_parse() {
        assert_eq!("step".parse(), Ok(Command::Step(1)));
        assert_eq!("s 12".parse(), Ok(Command::Step(12)));
        assert_eq!("back 3".parse(), Ok(Command::Back(3)));
        assert_eq!("run".parse(), Ok(Command::Run(None)));
        assert_eq!("r 500".parse(), Ok(Command::Run(Some(500))));
        assert_eq!("regs".parse(), Ok(Command::Regs));
        assert_eq!("l".parse(), Ok(Command::Log));
        assert_eq!("quit".parse(), Ok(Command::Exit));
    }

    #[test]
    fn watch_takes_a_register_and_a_value() {
        assert_eq!(
            "watch r2 55".parse(),
            Ok(Command::Watch { register: 2, expected: 55 })
        );
        assert_eq!(
            "watch 1 18".parse(),
            Ok(Command::Watch { register: 1, expected: 18 })
        );
    }

    #[test]
    fn load_accepts_quoted_and_bare_paths() {
        assert_eq!(
            "load demo.asm".parse(),
            Ok(Command::Load("demo.asm".to_string()))
        );
        assert_eq!(
            "load \"with space.asm\"".parse(),
            Ok(Command::Load("with space.asm".to_string()))
        );
    }

    #[test]
    fn blank_input_repeats_the_last_command() {
        assert_eq!("".parse(), Ok(Command::Repeat));
        assert_eq!("   ".parse(), Ok(Command::Repeat));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("frobnicate".parse::<Command>().is_err());
        assert!("step five".parse::<Command>().is_err());
    }
}
