use clap::{Parser, Subcommand};

/// One line typed at the console prompt.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the session keypair with a fresh random one.
    Generate,
    /// Ask the faucet to fund the current public key.
    Fund,
    /// Set the custom asset code; omit the value to clear it.
    Asset { name: Option<String> },
    /// Set the maximum native amount to deposit.
    AmountA { value: Option<String> },
    /// Set the maximum custom-asset amount to deposit.
    AmountB { value: Option<String> },
    /// Set the amount of pool shares to withdraw.
    WithdrawAmount { value: Option<String> },
    /// Trust the pool share and deposit both amounts.
    CreatePool,
    /// Withdraw from the current pool.
    Withdraw,
    /// Print keypair, pool, form and busy flags.
    Status,
    #[command(alias = "exit")]
    Quit,
}

/// `Ok(None)` for blank lines. Errors carry clap's rendered message,
/// including the help text for `help`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    Line::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|err| err.render().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("   \t "), Ok(None));
    }

    #[test]
    fn action_commands_parse() {
        assert_eq!(parse_command("generate"), Ok(Some(Command::Generate)));
        assert_eq!(parse_command(" fund "), Ok(Some(Command::Fund)));
        assert_eq!(parse_command("create-pool"), Ok(Some(Command::CreatePool)));
        assert_eq!(parse_command("withdraw"), Ok(Some(Command::Withdraw)));
        assert_eq!(parse_command("exit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn form_commands_carry_their_value() {
        assert_eq!(
            parse_command("asset ARST"),
            Ok(Some(Command::Asset {
                name: Some("ARST".into())
            }))
        );
        assert_eq!(
            parse_command("amount-a 12.5"),
            Ok(Some(Command::AmountA {
                value: Some("12.5".into())
            }))
        );
        assert_eq!(
            parse_command("withdraw-amount"),
            Ok(Some(Command::WithdrawAmount { value: None }))
        );
    }

    #[test]
    fn unknown_commands_and_help_render_messages() {
        let err = parse_command("deposit 5").unwrap_err();
        assert!(err.contains("deposit"), "{err}");

        let help = parse_command("help").unwrap_err();
        assert!(help.contains("create-pool"), "{help}");
    }
}
