use std::str::FromStr;

use crate::events::Company;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Switch the company questions are asked about
    Company,
    /// Clear the conversation
    Clear,
    /// Save the conversation as a transcript
    Save,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.keyword(),
            description: command.description(),
        })
        .collect()
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Target company for `/company <name>`, accepting short aliases.
    pub fn company_target(&self) -> Option<Company> {
        if self.command != SlashCommand::Company {
            return None;
        }

        let arg = self.argument()?.trim().to_lowercase();
        Company::from_str(&arg).ok().or_else(|| match arg.as_str() {
            "rel" => Some(Company::Reliance),
            "axisbank" => Some(Company::Axis),
            _ => None,
        })
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Company => "switch company (bajaj, tcs, axis, godrej, reliance)",
            SlashCommand::Clear => "clear the conversation",
            SlashCommand::Save => "save the conversation to a transcript",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn keyword(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].split_whitespace();
    let head = parts.next()?;
    let rest: Vec<String> = parts.map(|s| s.to_string()).collect();

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "exit" | "bye" => Some(SlashCommand::Quit),
            "c" | "co" => Some(SlashCommand::Company),
            "h" => Some(SlashCommand::Help),
            "s" => Some(SlashCommand::Save),
            _ => None,
        })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for entry in command_entries() {
        help.push_str(&format!("/{} - {}\n", entry.keyword, entry.description));
    }
    help.push_str("\nAliases: /q for /quit, /c for /company, /h for /help, /s for /save.");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_company_switch_with_argument() {
        let parsed = parse_slash_command("/company tcs").unwrap();
        assert_eq!(parsed.command, SlashCommand::Company);
        assert_eq!(parsed.company_target(), Some(Company::Tcs));
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(
            parse_slash_command("/q").unwrap().command,
            SlashCommand::Quit
        );
        assert_eq!(
            parse_slash_command("/c reliance").unwrap().company_target(),
            Some(Company::Reliance)
        );
    }

    #[test]
    fn unknown_company_has_no_target() {
        let parsed = parse_slash_command("/company acme").unwrap();
        assert_eq!(parsed.company_target(), None);
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert!(parse_slash_command("what was revenue?").is_none());
        assert!(parse_slash_command("/unknowncmd").is_none());
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(entry.keyword));
        }
    }
}
