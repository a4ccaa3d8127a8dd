//! Command-line argument parsing.
//!
//! ddcbright takes only a handful of flags, so arguments are parsed by
//! hand rather than pulling in a CLI framework. Unknown flags show the
//! help text with an error note instead of being silently ignored.

/// What the parsed command line asks the binary to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon.
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Display help and exit.
    ShowHelp,
    /// Display version and exit.
    ShowVersion,
    /// Unknown arguments: show help and exit non-zero.
    ShowHelpDueToError,
}

pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments (excluding the program name).
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut config_dir = None;
        let mut log_file = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" | "--help" => return ParsedArgs { action: CliAction::ShowHelp },
                "-V" | "--version" => return ParsedArgs { action: CliAction::ShowVersion },
                "-d" | "--debug" => debug_enabled = true,
                "--config-dir" => match args.next() {
                    Some(dir) => config_dir = Some(dir.as_ref().to_string()),
                    None => return ParsedArgs { action: CliAction::ShowHelpDueToError },
                },
                "--log" => match args.next() {
                    Some(path) => log_file = Some(path.as_ref().to_string()),
                    None => return ParsedArgs { action: CliAction::ShowHelpDueToError },
                },
                _ => return ParsedArgs { action: CliAction::ShowHelpDueToError },
            }
        }

        ParsedArgs {
            action: CliAction::Run {
                debug_enabled,
                config_dir,
                log_file,
            },
        }
    }
}

/// Print the help text.
pub fn display_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!("ddcbright v{version} - automatic DDC/CI monitor brightness control");
    println!();
    println!("USAGE:");
    println!("    ddcbright [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -d, --debug             Enable verbose operational logging");
    println!("        --config-dir <DIR>  Use an alternate configuration directory");
    println!("        --log <FILE>        Route log output to a file");
    println!("    -h, --help              Print this help and exit");
    println!("    -V, --version           Print the version and exit");
}

/// Print the version line.
pub fn display_version() {
    println!("ddcbright v{}", env!("CARGO_PKG_VERSION"));
}
