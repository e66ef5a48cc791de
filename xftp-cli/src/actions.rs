use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::Path;

use xftp::list::FileEntry;
use xftp::native_tls::TlsConnector;
use xftp::types::FileType;
use xftp::{LogCommandListener, Mode, NativeTlsConnector};

use super::{FtpError, FtpStream};

pub fn quit(mut ftp: Option<FtpStream>) {
    if let Some(mut ftp) = ftp.take() {
        match ftp.quit() {
            Ok(_) => println!("OK"),
            Err(err) => eprintln!("Failed to disconnect from remote: {}", err),
        }
    }
}

pub fn ccc(ftp: &mut FtpStream) {
    match ftp.clear_command_channel() {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("CCC error: {}", err),
    }
}

pub fn cdup(ftp: &mut FtpStream) {
    match ftp.cdup() {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("CDUP error: {}", err),
    }
}

pub fn connect(remote: &str, secure: bool, trace_commands: bool) -> Option<FtpStream> {
    let mut stream: FtpStream = match FtpStream::connect(remote) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Failed to connect to remote: {}", err);
            return None;
        }
    };
    if let Some(welcome) = stream.get_welcome_msg() {
        println!("{welcome}");
    }
    if trace_commands {
        stream.add_protocol_listener(LogCommandListener::new(log::Level::Info));
    }
    // if secure, enable TLS
    if secure {
        let ctx = match TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
        {
            Ok(tls) => NativeTlsConnector::from(tls),
            Err(err) => {
                eprintln!("Failed to setup TLS stream: {}", err);
                return None;
            }
        };
        // Get address without port
        let address: &str = remote.split(':').next().unwrap_or(remote);
        stream = match stream.into_secure(ctx, address) {
            Ok(s) => s,
            Err(err) => {
                eprintln!("Failed to setup TLS stream: {}", err);
                return None;
            }
        };
    }
    // Set transfer type to binary
    if let Err(err) = stream.transfer_type(FileType::Binary) {
        eprintln!("Failed to set transfer type to binary: {}", err);
    }
    println!("OK");
    Some(stream)
}

pub fn cwd(ftp: &mut FtpStream, dir: &str) {
    match ftp.cwd(dir) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("CWD error: {}", err),
    }
}

pub fn feat(ftp: &mut FtpStream) {
    match ftp.feat() {
        Ok(features) => {
            let mut features: Vec<_> = features.into_iter().collect();
            features.sort();
            for (name, value) in features {
                match value {
                    Some(value) => println!("{name} {value}"),
                    None => println!("{name}"),
                }
            }
        }
        Err(err) => eprintln!("FEAT error: {}", err),
    }
}

pub fn list(ftp: &mut FtpStream, p: Option<&str>) {
    match ftp.list_files(p) {
        Ok(files) => files.iter().for_each(print_entry),
        Err(err) => eprintln!("LIST error: {}", err),
    }
}

pub fn mlsd(ftp: &mut FtpStream, p: Option<&str>) {
    match ftp.mlsd_files(p) {
        Ok(files) => files.iter().for_each(print_entry),
        Err(err) => eprintln!("MLSD error: {}", err),
    }
}

pub fn mlst(ftp: &mut FtpStream, p: Option<&str>) {
    match ftp.mlst(p) {
        Ok(facts) => println!("{facts}"),
        Err(err) => eprintln!("MLST error: {}", err),
    }
}

pub fn nlst(ftp: &mut FtpStream, p: Option<&str>) {
    match ftp.nlst(p) {
        Ok(names) => names.iter().for_each(|name| println!("{name}")),
        Err(err) => eprintln!("NLST error: {}", err),
    }
}

fn print_entry(entry: &FileEntry) {
    if !entry.is_valid() {
        println!("?? {}", entry.raw_listing());
        return;
    }
    let kind = if entry.is_directory() {
        'd'
    } else if entry.is_symlink() {
        'l'
    } else {
        '-'
    };
    let modified = entry
        .timestamp()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| String::from("-"));
    match entry.link() {
        Some(target) => println!(
            "{kind} {:>12} {modified} {} -> {target}",
            entry.size(),
            entry.name()
        ),
        None => println!("{kind} {:>12} {modified} {}", entry.size(), entry.name()),
    }
}

pub fn login(ftp: &mut FtpStream) {
    // Read username
    print!("Username: ");
    let _ = io::stdout().flush();
    let mut username = String::new();
    if let Err(err) = io::stdin().lock().read_line(&mut username) {
        eprintln!("Could not read username: {}", err);
        return;
    }
    // Read password
    let password: String = match rpassword::prompt_password("Password: ") {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Could not read password: {}", err);
            return;
        }
    };
    // Login
    match ftp.login(username.trim(), password.as_str()) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("LOGIN error: {}", err),
    }
}

pub fn mdtm(ftp: &mut FtpStream, f: &str) {
    match ftp.mdtm(f) {
        Ok(time) => println!("OK: {}", time),
        Err(err) => eprintln!("MDTM error: {}", err),
    }
}

pub fn mkdir(ftp: &mut FtpStream, f: &str) {
    match ftp.mkdir(f) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("MKDIR error: {}", err),
    }
}

pub fn set_mode(ftp: &mut FtpStream, mode: Mode) {
    ftp.set_mode(mode);
    println!("OK");
}

pub fn noop(ftp: &mut FtpStream) {
    match ftp.noop() {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("NOOP error: {}", err),
    }
}

pub fn opts(ftp: &mut FtpStream, feature: String, value: Option<String>) {
    match ftp.opts(feature, value) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("OPTS error: {}", err),
    }
}

pub fn appe(ftp: &mut FtpStream, local: &Path, dest: &str) {
    let mut reader = match File::open(local) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to open local file for read: {}", err);
            return;
        }
    };
    match ftp.append_file(dest, &mut reader) {
        Ok(bytes) => println!("OK: {bytes} bytes"),
        Err(err) => eprintln!("APPE error: {}", err),
    }
}

pub fn put(ftp: &mut FtpStream, local: &Path, dest: &str) {
    let mut reader = match File::open(local) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to open local file for read: {}", err);
            return;
        }
    };
    match ftp.put_file(dest, &mut reader) {
        Ok(bytes) => println!("OK: {bytes} bytes"),
        Err(err) => eprintln!("PUT error: {}", err),
    }
}

pub fn pwd(ftp: &mut FtpStream) {
    match ftp.pwd() {
        Ok(p) => println!("OK: {}", p),
        Err(err) => eprintln!("PWD error: {}", err),
    }
}

pub fn rename(ftp: &mut FtpStream, src: &str, dest: &str) {
    match ftp.rename(src, dest) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RENAME error: {}", err),
    }
}

pub fn retr(ftp: &mut FtpStream, file: &str, dest: &Path) {
    let mut dest: File = match File::create(dest) {
        Ok(d) => d,
        Err(err) => {
            eprintln!("Failed to open destination file: {}", err);
            return;
        }
    };
    match ftp.retr(file, move |reader| {
        io::copy(reader, &mut dest)
            .map(|_| ())
            .map_err(FtpError::ConnectionError)
    }) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RETR error: {}", err),
    }
}

pub fn rm(ftp: &mut FtpStream, file: &str) {
    match ftp.rm(file) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RM error: {}", err),
    }
}

pub fn rmdir(ftp: &mut FtpStream, dir: &str) {
    match ftp.rmdir(dir) {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RMDIR error: {}", err),
    }
}

pub fn size(ftp: &mut FtpStream, file: &str) {
    match ftp.size(file) {
        Ok(size) => println!("OK: {}", size),
        Err(err) => eprintln!("SIZE error: {}", err),
    }
}

pub fn stat(ftp: &mut FtpStream, p: Option<&str>) {
    match ftp.stat(p) {
        Ok(reply) => println!("{}", reply.as_string()),
        Err(err) => eprintln!("STAT error: {}", err),
    }
}

pub fn syst(ftp: &mut FtpStream) {
    match ftp.syst() {
        Ok(system) => println!("OK: {}", system),
        Err(err) => eprintln!("SYST error: {}", err),
    }
}
