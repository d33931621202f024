//! Command-line argument parsing and processing.
//!
//! Arguments are reduced to a single `CliAction`. Version beats help, help
//! beats everything else, and any unknown option or missing value turns into
//! `ShowHelpDueToError` so the binary can print usage and exit with failure.

use crate::logger::Log;
use crate::theme::Theme;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the live dashboard loop
    Run { debug_enabled: bool },
    /// Print one snapshot and exit
    Status { debug_enabled: bool },
    /// Flip the current theme until the next automatic switch
    Toggle { debug_enabled: bool },
    /// Force a theme until the next automatic switch
    SetTheme { debug_enabled: bool, theme: Theme },
    /// Drop any manual theme choice
    ClearTheme { debug_enabled: bool },
    /// Save a note, or print the saved one when no text is given
    Note {
        debug_enabled: bool,
        text: Option<String>,
    },
    /// Render the movie gallery
    Movies { debug_enabled: bool },
    /// Render a configured records list
    List { debug_enabled: bool, name: String },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

impl CliAction {
    pub fn debug_enabled(&self) -> bool {
        match self {
            CliAction::Run { debug_enabled }
            | CliAction::Status { debug_enabled }
            | CliAction::Toggle { debug_enabled }
            | CliAction::SetTheme { debug_enabled, .. }
            | CliAction::ClearTheme { debug_enabled }
            | CliAction::Note { debug_enabled, .. }
            | CliAction::Movies { debug_enabled }
            | CliAction::List { debug_enabled, .. } => *debug_enabled,
            CliAction::ShowHelp | CliAction::ShowVersion | CliAction::ShowHelpDueToError => false,
        }
    }
}

/// The command requested on the line; at most one is allowed.
#[derive(Debug)]
enum Command {
    Status,
    Toggle,
    SetTheme(Theme),
    ClearTheme,
    Note(Option<String>),
    Movies,
    List(String),
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut commands: Vec<Command> = Vec::new();
        let mut unknown_arg_found = false;

        // Convert to vector for easier indexed access
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            let arg_str = &args_vec[i];
            let next_value = args_vec.get(i + 1).filter(|next| !next.starts_with('-'));

            match arg_str.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--status" | "-s" => commands.push(Command::Status),
                "--toggle" | "-t" => commands.push(Command::Toggle),
                "--auto" => commands.push(Command::ClearTheme),
                "--movies" | "-m" => commands.push(Command::Movies),
                "--theme" => match next_value {
                    Some(value) => {
                        match value.parse::<Theme>() {
                            Ok(theme) => commands.push(Command::SetTheme(theme)),
                            Err(e) => {
                                Log::log_warning(&e.to_string());
                                unknown_arg_found = true;
                            }
                        }
                        i += 1;
                    }
                    None => {
                        Log::log_warning("Missing value for --theme. Usage: --theme <day|night>");
                        unknown_arg_found = true;
                    }
                },
                "--list" | "-l" => match next_value {
                    Some(name) => {
                        commands.push(Command::List(name.clone()));
                        i += 1;
                    }
                    None => {
                        Log::log_warning("Missing value for --list. Usage: --list <name>");
                        unknown_arg_found = true;
                    }
                },
                "--note" | "-n" => {
                    // The text is optional; without it the saved note is shown
                    let text = next_value.cloned();
                    if text.is_some() {
                        i += 1;
                    }
                    commands.push(Command::Note(text));
                }
                _ => {
                    if arg_str.starts_with('-') {
                        Log::log_warning(&format!("Unknown option: {}", arg_str));
                    } else {
                        Log::log_warning(&format!("Unexpected argument: {}", arg_str));
                    }
                    unknown_arg_found = true;
                }
            }
            i += 1;
        }

        if commands.len() > 1 {
            Log::log_warning("Only one command can be given at a time");
            unknown_arg_found = true;
        }

        // Determine the action based on parsed flags
        let action = if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if display_help {
            CliAction::ShowHelp
        } else {
            match commands.pop() {
                None => CliAction::Run { debug_enabled },
                Some(Command::Status) => CliAction::Status { debug_enabled },
                Some(Command::Toggle) => CliAction::Toggle { debug_enabled },
                Some(Command::SetTheme(theme)) => CliAction::SetTheme {
                    debug_enabled,
                    theme,
                },
                Some(Command::ClearTheme) => CliAction::ClearTheme { debug_enabled },
                Some(Command::Note(text)) => CliAction::Note {
                    debug_enabled,
                    text,
                },
                Some(Command::Movies) => CliAction::Movies { debug_enabled },
                Some(Command::List(name)) => CliAction::List {
                    debug_enabled,
                    name,
                },
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    Log::log_version();
    Log::log_pipe();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    Log::log_version();
    Log::log_block_start(env!("CARGO_PKG_DESCRIPTION"));
    Log::log_block_start("Usage: together [OPTIONS]");
    Log::log_block_start("Options:");
    Log::log_indented("-s, --status              Print the dashboard once and exit");
    Log::log_indented("-t, --toggle              Flip the theme until the next switch");
    Log::log_indented("    --theme <day|night>   Force a theme until the next switch");
    Log::log_indented("    --auto                Follow the day/night schedule again");
    Log::log_indented("-n, --note [text]         Save a note, or show the saved one");
    Log::log_indented("                          (text starting with '-' is read as an option)");
    Log::log_indented("-m, --movies              Show the movie gallery");
    Log::log_indented("-l, --list <name>         Show a configured records list");
    Log::log_indented("-d, --debug               Enable detailed debug output");
    Log::log_indented("-h, --help                Print help information");
    Log::log_indented("-V, --version             Print version information");
    Log::log_end();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        let mut full = vec!["together"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full).action
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(
            parse(&[]),
            CliAction::Run {
                debug_enabled: false
            }
        );
    }

    #[test]
    fn test_parse_debug_flags() {
        assert_eq!(
            parse(&["--debug"]),
            CliAction::Run {
                debug_enabled: true
            }
        );
        assert_eq!(
            parse(&["-d"]),
            CliAction::Run {
                debug_enabled: true
            }
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-h"]), CliAction::ShowHelp);
        assert_eq!(parse(&["--version"]), CliAction::ShowVersion);
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        assert_eq!(parse(&["-v"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_version_takes_precedence() {
        assert_eq!(
            parse(&["--version", "--help", "--debug"]),
            CliAction::ShowVersion
        );
        assert_eq!(parse(&["--status", "--help"]), CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_status_and_toggle() {
        assert_eq!(
            parse(&["-s"]),
            CliAction::Status {
                debug_enabled: false
            }
        );
        assert_eq!(
            parse(&["--toggle", "--debug"]),
            CliAction::Toggle {
                debug_enabled: true
            }
        );
    }

    #[test]
    fn test_parse_theme_values() {
        assert_eq!(
            parse(&["--theme", "night"]),
            CliAction::SetTheme {
                debug_enabled: false,
                theme: Theme::Night
            }
        );
        assert_eq!(parse(&["--theme", "dusk"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--theme"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--theme", "-d"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_auto() {
        assert_eq!(
            parse(&["--auto"]),
            CliAction::ClearTheme {
                debug_enabled: false
            }
        );
    }

    #[test]
    fn test_parse_note_with_and_without_text() {
        assert_eq!(
            parse(&["--note", "miss you"]),
            CliAction::Note {
                debug_enabled: false,
                text: Some("miss you".to_string())
            }
        );
        assert_eq!(
            parse(&["-n"]),
            CliAction::Note {
                debug_enabled: false,
                text: None
            }
        );
        assert_eq!(
            parse(&["-n", "-d"]),
            CliAction::Note {
                debug_enabled: true,
                text: None
            }
        );
    }

    #[test]
    fn test_note_text_with_leading_dash_is_an_option() {
        assert_eq!(parse(&["--note", "-see you"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_movies_and_list() {
        assert_eq!(
            parse(&["-m"]),
            CliAction::Movies {
                debug_enabled: false
            }
        );
        assert_eq!(
            parse(&["--list", "dates"]),
            CliAction::List {
                debug_enabled: false,
                name: "dates".to_string()
            }
        );
        assert_eq!(parse(&["-l"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(&["--unknown"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--debug", "--invalid"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["stray"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--status", "--toggle"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_debug_enabled_accessor() {
        assert!(parse(&["-m", "-d"]).debug_enabled());
        assert!(!parse(&["-m"]).debug_enabled());
        assert!(!CliAction::ShowHelp.debug_enabled());
    }
}
