//! # xftp
//!
//! An interactive client to connect and work with FTP servers
//!

// -- mods
mod actions;
mod args;
mod command;

use std::io;
use std::io::Write;
use std::str::FromStr;

use actions::*;
use args::Args;
use command::Command;
use env_logger::Builder as LogBuilder;
use log::LevelFilter;
use xftp::{FtpError, NativeTlsFtpStream as FtpStream};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

fn usage() {
    println!("Available commands:");
    println!("APPE <file> <dest>                  Append content of local file `file` to `dest`");
    println!("CCC                                 Go back to a plain control connection");
    println!("CDUP                                Go to parent directory");
    println!("CONNECT <addr:port>                 Connect to remote host");
    println!("CONNECT+S <addr:port>               Connect to remote host using FTPS");
    println!("CWD <dir>                           Change working directory");
    println!("FEAT                                Get supported features on the server");
    println!("HELP                                Print this help");
    println!("LIST [dir]                          List files. If directory is not provided, current directory is used");
    println!("LOGIN                               Login to remote");
    println!("MDTM <file>                         Get modification time for `file`");
    println!("MKDIR <dir>                         Create directory");
    println!("MLSD [dir]                          List files with MLSD");
    println!("MLST [path]                         Print facts of `path`");
    println!("MODE <PASSIVE|EXTPASSIVE|ACTIVE|EXTACTIVE> Set mode");
    println!("NLST [dir]                          List file names");
    println!("NOOP                                Ping server");
    println!("OPTS <feature-name> [feature-value] Set a feature on the server (e.g. OPTS UTF8 ON)");
    println!("PUT <file> <dest>                   Upload local file `file` to `dest`");
    println!("PWD                                 Print working directory");
    println!("QUIT                                Quit xftp");
    println!("RENAME <source> <dest>              Rename file `source` to `dest`");
    println!("RETR <file> <dest>                  Download `file` to `dest`");
    println!("RM <file>                           Remove file");
    println!("RMDIR <dir>                         Remove directory");
    println!("SIZE <file>                         Get `file` size");
    println!("STAT [path]                         Get server status or status of `path`");
    println!("SYST                                Get the server system type");
}

fn input() -> Command {
    loop {
        print!(">> ");
        let _ = io::stdout().flush();
        let mut input: String = String::new();
        match io::stdin().read_line(&mut input) {
            // stdin closed
            Ok(0) => return Command::Quit,
            Ok(_) => {}
            Err(err) => {
                eprintln!("Failed to read stdin: {err}");
                return Command::Quit;
            }
        }
        // Try to create command
        match Command::from_str(input.as_str()) {
            Ok(cmd) => return cmd,
            Err(err) => println!("{err}"),
        }
    }
}

fn main() {
    let args: Args = argh::from_env();
    // print version
    if args.version {
        println!("xftp {APP_VERSION} - developed by {APP_AUTHORS}")
    }
    // init logger
    LogBuilder::new()
        .filter_level(if args.debug {
            LevelFilter::Trace
        } else if args.verbose || args.trace_commands {
            LevelFilter::Info
        } else {
            LevelFilter::Off
        })
        .init();
    // Main loop
    let mut ftp: Option<FtpStream> = None;
    let trace_commands = args.trace_commands;

    // connect if host is specified
    if let Some(host) = args.host {
        perform(&mut ftp, Command::Connect(host, args.secure), trace_commands);
    }

    loop {
        match input() {
            Command::Quit => {
                // Break if quit
                quit(ftp);
                break;
            }
            Command::Help => usage(),
            cmd => perform(&mut ftp, cmd, trace_commands),
        }
    }
}

fn perform(ftp: &mut Option<FtpStream>, command: Command, trace_commands: bool) {
    match ftp {
        Some(ftp) => perform_connected(ftp, command, trace_commands),
        None => {
            if let Some(stream) = perform_uninitialized(command, trace_commands) {
                *ftp = Some(stream);
            }
        }
    }
}

fn perform_uninitialized(command: Command, trace_commands: bool) -> Option<FtpStream> {
    match command {
        Command::Connect(remote, secure) => connect(remote.as_str(), secure, trace_commands),
        _ => {
            eprintln!("Can't perform command: you must connect to remote first");
            None
        }
    }
}

fn perform_connected(ftp: &mut FtpStream, command: Command, trace_commands: bool) {
    match command {
        Command::Appe(src, dest) => appe(ftp, src.as_path(), dest.as_str()),
        Command::Ccc => ccc(ftp),
        Command::Cdup => cdup(ftp),
        Command::Connect(remote, secure) => {
            if let Some(stream) = connect(remote.as_str(), secure, trace_commands) {
                *ftp = stream;
            }
        }
        Command::Cwd(dir) => cwd(ftp, dir.as_str()),
        Command::Feat => feat(ftp),
        Command::List(p) => list(ftp, p.as_deref()),
        Command::Login => login(ftp),
        Command::Mdtm(p) => mdtm(ftp, p.as_str()),
        Command::Mkdir(p) => mkdir(ftp, p.as_str()),
        Command::Mlsd(p) => mlsd(ftp, p.as_deref()),
        Command::Mlst(p) => mlst(ftp, p.as_deref()),
        Command::Mode(m) => set_mode(ftp, m),
        Command::Nlst(p) => nlst(ftp, p.as_deref()),
        Command::Noop => noop(ftp),
        Command::Opts(feature, values) => opts(ftp, feature, values),
        Command::Put(src, dest) => put(ftp, src.as_path(), dest.as_str()),
        Command::Pwd => pwd(ftp),
        Command::Rename(src, dest) => rename(ftp, src.as_str(), dest.as_str()),
        Command::Retr(file, dest) => retr(ftp, file.as_str(), dest.as_path()),
        Command::Rm(file) => rm(ftp, file.as_str()),
        Command::Rmdir(file) => rmdir(ftp, file.as_str()),
        Command::Size(file) => size(ftp, file.as_str()),
        Command::Stat(p) => stat(ftp, p.as_deref()),
        Command::Syst => syst(ftp),
        Command::Help | Command::Quit => {
            eprintln!("Something unexpected happened")
        }
    }
}
