use std::fmt;
use std::io::{self, BufRead, Write};

const TOKEN_PROMPT: &str = "Enter your API key: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationChoice {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

pub fn print_auth_banner(configured: bool) {
    println!("🔐 Causerie Authentication Setup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    if configured {
        println!("An API key is already stored; entering a new one replaces it.");
    } else {
        println!("No API key is stored yet.");
    }
}

pub fn prompt_token(input: &mut impl BufRead) -> Result<String, UiError> {
    let line = prompt_line(TOKEN_PROMPT, input)?;
    let token = line.trim().to_string();
    if token.is_empty() {
        return Err(UiError::new("API key cannot be empty"));
    }
    Ok(token)
}

pub fn prompt_confirmation(
    question: &str,
    input: &mut impl BufRead,
) -> Result<ConfirmationChoice, UiError> {
    let line = prompt_line(&format!("{question} [y/N]: "), input)?;
    parse_confirmation(&line)
}

pub fn parse_confirmation(input: &str) -> Result<ConfirmationChoice, UiError> {
    match input.trim().to_lowercase().as_str() {
        "" | "n" | "no" => Ok(ConfirmationChoice::No),
        "y" | "yes" => Ok(ConfirmationChoice::Yes),
        _ => Err(UiError::new("Invalid confirmation response")),
    }
}

fn prompt_line(prompt: &str, input: &mut impl BufRead) -> Result<String, UiError> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|err| UiError::new(err.to_string()))?;
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|err| UiError::new(err.to_string()))?;
    if read == 0 {
        return Err(UiError::new("Input closed"));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn confirmation_defaults_to_no() {
        assert_eq!(
            parse_confirmation("").expect("choice"),
            ConfirmationChoice::No
        );
        assert_eq!(
            parse_confirmation(" n ").expect("choice"),
            ConfirmationChoice::No
        );
    }

    #[test]
    fn token_prompt_trims_and_rejects_empty() {
        let mut input = Cursor::new("  xai-123  \n");
        assert_eq!(prompt_token(&mut input).expect("token"), "xai-123");

        let mut blank = Cursor::new("\n");
        assert!(prompt_token(&mut blank).is_err());

        let mut closed = Cursor::new("");
        assert_eq!(
            prompt_token(&mut closed).expect_err("eof").to_string(),
            "Input closed"
        );
    }

    #[test]
    fn confirmation_accepts_yes_variants() {
        let mut input = Cursor::new("YES\n");
        assert_eq!(
            prompt_confirmation("Remove?", &mut input).expect("choice"),
            ConfirmationChoice::Yes
        );
        assert!(parse_confirmation("maybe").is_err());
    }
}
