use std::time::Duration;

use argh::FromArgs;

use crate::parser::Limits;

pub const DEFAULT_PROMPT: &str = "mini-shell>>> ";
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_MAX_LINE: usize = 80;
pub const DEFAULT_MAX_ARGS: usize = 15;

#[derive(FromArgs, Debug)]
/// A small interactive command interpreter with five built-ins and single-pipe pipelines.
pub struct Args {
    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// text printed before each line is read.
    pub prompt: String,

    #[argh(option, default = "DEFAULT_TIMEOUT_SECS")]
    /// seconds after start-up at which the session ends on its own; 0 disables it.
    pub timeout: u64,

    #[argh(option, default = "DEFAULT_MAX_LINE")]
    /// longest accepted input line in bytes, line terminator included.
    pub max_line: usize,

    #[argh(option, default = "DEFAULT_MAX_ARGS")]
    /// most tokens accepted in a single command.
    pub max_args: usize,

    #[argh(switch, short = 'v')]
    /// log debug events to standard error.
    pub verbose: bool,
}

/// Runtime settings of an [`Interpreter`](crate::Interpreter).
#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    /// `None` disables the idle-timeout alarm.
    pub idle_timeout: Option<Duration>,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            idle_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            limits: Limits {
                max_line: DEFAULT_MAX_LINE,
                max_args: DEFAULT_MAX_ARGS,
            },
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            prompt: args.prompt.clone(),
            idle_timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
            limits: Limits {
                // room for at least one byte plus the terminator
                max_line: args.max_line.max(2),
                max_args: args.max_args.max(1),
            },
        }
    }
}
