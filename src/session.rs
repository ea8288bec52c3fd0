//! Interactive session commands.
//!
//! In `--interactive` mode every stdin line is either a prompt for the
//! panel or a `:`-prefixed command that runs a demo, changes the agent
//! selection or shows the session state.

use crate::models::Agent;
use std::str::FromStr;

/// Help text printed by `:help`.
pub const HELP: &str = "\
Commands:
   <prompt>          Ask the panel
   :demo [prompt]    Run the demo with canned answers
   :toggle <agent>   Enable or disable one agent
   :all              Enable every agent
   :none             Disable every agent
   :models           Show which agents are enabled
   :stats            Show session statistics
   :check            Test the API connection
   :help             Show this help
   :quit             Leave the session";

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Demo(Option<String>),
    Toggle(Agent),
    SelectAll,
    DeselectAll,
    Models,
    Stats,
    Check,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Command::Ask(line.to_string()));
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "demo" => Ok(Command::Demo(
                Some(argument.to_string()).filter(|a| !a.is_empty()),
            )),
            "toggle" | "t" => {
                if argument.is_empty() {
                    return Err("Usage: :toggle <agent>".to_string());
                }
                argument.parse().map(Command::Toggle)
            }
            "all" => Ok(Command::SelectAll),
            "none" => Ok(Command::DeselectAll),
            "models" | "m" => Ok(Command::Models),
            "stats" | "s" => Ok(Command::Stats),
            "check" => Ok(Command::Check),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command ':{}'. Type :help for commands.", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_a_prompt() {
        assert_eq!(
            "  compare vector databases ".parse::<Command>(),
            Ok(Command::Ask("compare vector databases".to_string()))
        );
    }

    #[test]
    fn test_demo_with_and_without_prompt() {
        assert_eq!(":demo".parse::<Command>(), Ok(Command::Demo(None)));
        assert_eq!(
            ":demo  what is RAG?".parse::<Command>(),
            Ok(Command::Demo(Some("what is RAG?".to_string())))
        );
    }

    #[test]
    fn test_toggle_parses_agent() {
        assert_eq!(
            ":toggle deepSeek".parse::<Command>(),
            Ok(Command::Toggle(Agent::DeepSeek))
        );
        assert_eq!(":t GROQ".parse::<Command>(), Ok(Command::Toggle(Agent::Groq)));
        assert!(":toggle".parse::<Command>().is_err());
        assert!(":toggle mistral".parse::<Command>().is_err());
    }

    #[test]
    fn test_selection_and_session_commands() {
        assert_eq!(":all".parse::<Command>(), Ok(Command::SelectAll));
        assert_eq!(":none".parse::<Command>(), Ok(Command::DeselectAll));
        assert_eq!(":models".parse::<Command>(), Ok(Command::Models));
        assert_eq!(":STATS".parse::<Command>(), Ok(Command::Stats));
        assert_eq!(":check".parse::<Command>(), Ok(Command::Check));
        assert_eq!(":q".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_unknown_command() {
        let err = ":retry".parse::<Command>().unwrap_err();
        assert!(err.contains(":retry"));
    }
}
