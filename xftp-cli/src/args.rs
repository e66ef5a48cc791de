use argh::FromArgs;

#[derive(FromArgs)]
#[argh(description = "Interactive FTP/FTPS client")]
pub struct Args {
    #[argh(switch, short = 'D', description = "enable TRACE log level")]
    pub debug: bool,
    #[argh(switch, short = 'v', description = "verbose mode")]
    pub verbose: bool,
    #[argh(switch, short = 'V', description = "print version")]
    pub version: bool,
    #[argh(switch, short = 's', description = "secure the connection to `host` with explicit FTPS")]
    pub secure: bool,
    #[argh(
        switch,
        short = 't',
        description = "trace commands and replies through protocol listeners"
    )]
    pub trace_commands: bool,
    #[argh(positional, description = "host to connect to")]
    pub host: Option<String>,
}
