//! # Test server
//!
//! A scripted FTP server on the loopback interface

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

/// An exchange on the control connection, in the order the client performs it
pub enum Step {
    /// Expect the command line and reply with the given text
    Reply(&'static str, &'static str),
    /// Expect `PASV` and open a data listener
    Pasv,
    /// Expect the command line and send the data over the passive connection
    Send(&'static str, &'static str),
    /// Expect the command line and read the data sent by the client over the passive connection
    Receive(&'static str),
    /// Expect the command line and open the passive connection, without transferring anything
    Open(&'static str),
    /// Expect the command line and hang up
    Close(&'static str),
}

pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<Vec<Vec<u8>>>,
}

impl MockServer {
    /// Accept a single client, greet it and run `script`
    pub fn start(greeting: &'static str, script: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut control = Control::new(stream);
            control.write(greeting);
            control.run(script)
        });
        Self { addr, handle }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the script to complete; returns the data received, one buffer per transfer
    pub fn finish(self) -> Vec<Vec<u8>> {
        self.handle.join().expect("mock server failed")
    }
}

struct Control {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    data_listener: Option<TcpListener>,
    open_data: Option<TcpStream>,
}

impl Control {
    fn new(stream: TcpStream) -> Self {
        let writer = stream.try_clone().unwrap();
        Self {
            reader: BufReader::new(stream),
            writer,
            data_listener: None,
            open_data: None,
        }
    }

    fn run(&mut self, script: Vec<Step>) -> Vec<Vec<u8>> {
        let mut received = Vec::new();
        for step in script {
            match step {
                Step::Reply(command, reply) => {
                    self.expect(command);
                    self.write(reply);
                }
                Step::Pasv => {
                    self.expect("PASV");
                    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
                    let port = listener.local_addr().unwrap().port();
                    self.write(&format!(
                        "227 Entering Passive Mode (127,0,0,1,{},{})\r\n",
                        port >> 8,
                        port & 0xff
                    ));
                    self.data_listener = Some(listener);
                }
                Step::Send(command, data) => {
                    self.expect(command);
                    let mut stream = self.accept_data();
                    stream.write_all(data.as_bytes()).unwrap();
                    drop(stream);
                    self.write("226 Transfer complete\r\n");
                }
                Step::Receive(command) => {
                    self.expect(command);
                    let mut stream = self.accept_data();
                    let mut buffer = Vec::new();
                    stream.read_to_end(&mut buffer).unwrap();
                    received.push(buffer);
                    self.write("226 Transfer complete\r\n");
                }
                Step::Open(command) => {
                    self.expect(command);
                    self.open_data = Some(self.accept_data());
                }
                Step::Close(command) => {
                    self.expect(command);
                    break;
                }
            }
        }
        received
    }

    fn accept_data(&mut self) -> TcpStream {
        self.write("150 Opening data connection\r\n");
        let listener = self.data_listener.take().expect("PASV was not sent");
        listener.accept().unwrap().0
    }

    fn expect(&mut self, command: &str) {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        assert_eq!(line.trim_end_matches("\r\n"), command);
    }

    fn write(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).unwrap();
        self.writer.flush().unwrap();
    }
}
