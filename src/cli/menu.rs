//! Interactive analysis menu.
//!
//! Kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the menu provides the "run `fephase` and pick a number" UX

use std::io::{BufRead, Write};

use crate::error::AppError;
use crate::report::format_section_header;

/// What the user picked from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    PartA,
    PartB,
    Both,
    Exit,
}

const OPTIONS: [&str; 4] = [
    "1. Part A: Carbon Steel Design (Fe-C Binary System)",
    "2. Part B: Stainless Steel Design (Fe-Cr-C Ternary System)",
    "3. Run Both Parts",
    "4. Exit",
];

/// Parse one line of menu input. Anything but `1`-`4` is exit code 1.
pub fn parse_choice(input: &str) -> Result<MenuChoice, AppError> {
    match input.trim() {
        "1" => Ok(MenuChoice::PartA),
        "2" => Ok(MenuChoice::PartB),
        "3" => Ok(MenuChoice::Both),
        "4" => Ok(MenuChoice::Exit),
        _ => Err(AppError::new(1, "Invalid choice. Please run again.")),
    }
}

/// Print the menu to `out` and read a single choice from `input`.
///
/// There is no retry loop: one bad answer ends the run.
pub fn prompt<R: BufRead, W: Write>(mut input: R, mut out: W) -> Result<MenuChoice, AppError> {
    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write menu: {e}"));

    write!(out, "{}", format_section_header("Select Analysis")).map_err(io_err)?;
    for option in OPTIONS {
        writeln!(out, "{option}").map_err(io_err)?;
    }
    write!(out, "\nEnter choice (1-4): ").map_err(io_err)?;
    out.flush().map_err(io_err)?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
    parse_choice(&line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_to_choices() {
        assert_eq!(parse_choice("1").unwrap(), MenuChoice::PartA);
        assert_eq!(parse_choice(" 2\n").unwrap(), MenuChoice::PartB);
        assert_eq!(parse_choice("3").unwrap(), MenuChoice::Both);
        assert_eq!(parse_choice("4").unwrap(), MenuChoice::Exit);
    }

    #[test]
    fn anything_else_exits_with_code_one() {
        for bad in ["", "5", "0", "a", "1 2"] {
            let err = parse_choice(bad).unwrap_err();
            assert_eq!(err.exit_code(), 1);
            assert_eq!(err.message(), "Invalid choice. Please run again.");
        }
    }

    #[test]
    fn prompt_prints_options_and_reads_one_line() {
        let mut out = Vec::new();
        let choice = prompt("3\nignored\n".as_bytes(), &mut out).unwrap();
        assert_eq!(choice, MenuChoice::Both);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Select Analysis"));
        assert!(text.contains("4. Exit"));
        assert!(text.ends_with("Enter choice (1-4): "));
    }

    #[test]
    fn empty_input_is_invalid() {
        assert_eq!(prompt("".as_bytes(), Vec::new()).unwrap_err().exit_code(), 1);
    }
}
