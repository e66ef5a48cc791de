use std::path::PathBuf;
use std::str::FromStr;

use xftp::Mode;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Appe(PathBuf, String),
    Ccc,
    Cdup,
    Connect(String, bool),
    Cwd(String),
    Feat,
    Help,
    List(Option<String>),
    Login,
    Mdtm(String),
    Mlsd(Option<String>),
    Mlst(Option<String>),
    Mkdir(String),
    Mode(Mode),
    Nlst(Option<String>),
    Noop,
    Opts(String, Option<String>),
    Put(PathBuf, String),
    Pwd,
    Quit,
    Rename(String, String),
    Retr(String, PathBuf),
    Rm(String),
    Rmdir(String),
    Size(String),
    Stat(Option<String>),
    Syst,
}

impl FromStr for Command {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split string by space
        let mut args = s.split_ascii_whitespace();
        // Match args
        match args.next() {
            Some(cmd) => match cmd.to_ascii_uppercase().as_str() {
                "APPE" => {
                    let local: PathBuf = match args.next() {
                        Some(l) => PathBuf::from(l),
                        None => return Err("Missing `source` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Appe(local, d.to_string())),
                        None => Err("Missing `dest` field"),
                    }
                }
                "CCC" => Ok(Self::Ccc),
                "CDUP" => Ok(Self::Cdup),
                "CONNECT" => match args.next() {
                    Some(addr) => Ok(Self::Connect(addr.to_string(), false)),
                    None => Err("Missing `addr` field"),
                },
                "CONNECT+S" => match args.next() {
                    Some(addr) => Ok(Self::Connect(addr.to_string(), true)),
                    None => Err("Missing `addr` field"),
                },
                "CWD" => match args.next() {
                    Some(p) => Ok(Self::Cwd(p.to_string())),
                    None => Err("Missing `dir` field"),
                },
                "FEAT" => Ok(Self::Feat),
                "HELP" => Ok(Self::Help),
                "LIST" => Ok(Self::List(args.next().map(str::to_string))),
                "LOGIN" => Ok(Self::Login),
                "MDTM" => match args.next() {
                    Some(file) => Ok(Self::Mdtm(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "MKDIR" => match args.next() {
                    Some(file) => Ok(Self::Mkdir(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "MLSD" => Ok(Self::Mlsd(args.next().map(str::to_string))),
                "MLST" => Ok(Self::Mlst(args.next().map(str::to_string))),
                "MODE" => match args.next().map(|m| m.to_ascii_uppercase()).as_deref() {
                    Some("ACTIVE") => Ok(Self::Mode(Mode::Active)),
                    Some("EXTACTIVE") => Ok(Self::Mode(Mode::ExtendedActive)),
                    Some("EXTPASSIVE") => Ok(Self::Mode(Mode::ExtendedPassive)),
                    Some("PASSIVE") => Ok(Self::Mode(Mode::Passive)),
                    Some(_) => Err("Invalid mode"),
                    None => Err("Missing `mode` field"),
                },
                "NLST" => Ok(Self::Nlst(args.next().map(str::to_string))),
                "NOOP" => Ok(Self::Noop),
                "OPTS" => {
                    let feature_name = match args.next() {
                        Some(s) => s.to_string(),
                        None => return Err("Missing `feature-name` field"),
                    };
                    match args.collect::<Vec<&str>>().join(" ") {
                        s if s.is_empty() => Ok(Self::Opts(feature_name, None)),
                        s => Ok(Self::Opts(feature_name, Some(s))),
                    }
                }
                "PUT" => {
                    let local: PathBuf = match args.next() {
                        Some(l) => PathBuf::from(l),
                        None => return Err("Missing `source` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Put(local, d.to_string())),
                        None => Err("Missing `dest` field"),
                    }
                }
                "PWD" => Ok(Self::Pwd),
                "QUIT" => Ok(Self::Quit),
                "RENAME" => {
                    let src: String = match args.next() {
                        Some(s) => s.to_string(),
                        None => return Err("Missing `src` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Rename(src, d.to_string())),
                        None => Err("Missing `dest` field"),
                    }
                }
                "RETR" => {
                    let file: String = match args.next() {
                        Some(f) => f.to_string(),
                        None => return Err("Missing `file` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Retr(file, PathBuf::from(d))),
                        None => Err("Missing `dest` field"),
                    }
                }
                "RM" => match args.next() {
                    Some(file) => Ok(Self::Rm(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "RMDIR" => match args.next() {
                    Some(dir) => Ok(Self::Rmdir(dir.to_string())),
                    None => Err("Missing `dir` field"),
                },
                "SIZE" => match args.next() {
                    Some(file) => Ok(Self::Size(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "STAT" => Ok(Self::Stat(args.next().map(str::to_string))),
                "SYST" => Ok(Self::Syst),
                _ => Err("Unknown command"),
            },
            None => Err("Unknown command"),
        }
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_parse_commands() {
        assert_eq!(
            Command::from_str("connect+s ftp.example.com:21").unwrap(),
            Command::Connect(String::from("ftp.example.com:21"), true)
        );
        assert_eq!(Command::from_str("LIST").unwrap(), Command::List(None));
        assert_eq!(
            Command::from_str("list /pub\n").unwrap(),
            Command::List(Some(String::from("/pub")))
        );
        assert_eq!(
            Command::from_str("MODE extactive").unwrap(),
            Command::Mode(Mode::ExtendedActive)
        );
        assert_eq!(
            Command::from_str("OPTS UTF8 ON").unwrap(),
            Command::Opts(String::from("UTF8"), Some(String::from("ON")))
        );
        assert_eq!(
            Command::from_str("RETR a.txt /tmp/a.txt").unwrap(),
            Command::Retr(String::from("a.txt"), PathBuf::from("/tmp/a.txt"))
        );
        assert_eq!(Command::from_str("ccc").unwrap(), Command::Ccc);
    }

    #[test]
    fn should_reject_bad_commands() {
        assert_eq!(Command::from_str(""), Err("Unknown command"));
        assert_eq!(Command::from_str("DANCE"), Err("Unknown command"));
        assert_eq!(Command::from_str("MODE FAST"), Err("Invalid mode"));
        assert_eq!(Command::from_str("PUT a.txt"), Err("Missing `dest` field"));
    }
}
