//! Scripted mock beanstalkd for client tests
//!
//! Each `Session` scripts one accepted connection: the requests it expects,
//! in order, and the raw bytes to answer each with.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use stalkwire::{Client, Config};

/// One request the server expects, and its scripted answer
pub struct Exchange {
    /// Prefix the request line must start with
    pub expect: String,

    /// Bytes written back; empty means "answer nothing yet"
    pub reply: Vec<u8>,

    /// Write the answer one byte at a time
    pub trickle: bool,
}

pub fn exchange(expect: &str, reply: impl AsRef<[u8]>) -> Exchange {
    Exchange {
        expect: expect.to_string(),
        reply: reply.as_ref().to_vec(),
        trickle: false,
    }
}

pub fn trickle(expect: &str, reply: impl AsRef<[u8]>) -> Exchange {
    Exchange {
        trickle: true,
        ..exchange(expect, reply)
    }
}

/// `OK <n>\r\n<body>\r\n`
pub fn ok_body(body: &str) -> Vec<u8> {
    format!("OK {}\r\n{}\r\n", body.len(), body).into_bytes()
}

/// `<status> <id> <n>\r\n<body>\r\n`
pub fn job_reply(status: &str, id: u64, body: &[u8]) -> Vec<u8> {
    let mut reply = format!("{} {} {}\r\n", status, id, body.len()).into_bytes();
    reply.extend_from_slice(body);
    reply.extend_from_slice(b"\r\n");
    reply
}

/// Script for one accepted connection
pub struct Session {
    pub exchanges: Vec<Exchange>,

    /// Keep the connection open until the client hangs up
    pub hold: bool,
}

/// Scripted connection that stays open after the last exchange
pub fn held(exchanges: Vec<Exchange>) -> Session {
    Session {
        exchanges,
        hold: true,
    }
}

/// Scripted connection the server drops after the last exchange
pub fn dropped(exchanges: Vec<Exchange>) -> Session {
    Session {
        exchanges,
        hold: false,
    }
}

/// A request as the server saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub line: String,
    pub body: Option<Vec<u8>>,
}

pub struct MockServer {
    pub addr: String,
    handle: JoinHandle<Vec<Vec<Received>>>,
}

impl MockServer {
    /// Listen on an ephemeral port and serve `sessions` one after another
    pub fn start(sessions: Vec<Session>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = thread::spawn(move || {
            let mut log = Vec::new();
            for session in sessions {
                let (stream, _) = listener.accept().unwrap();
                log.push(serve(stream, session));
            }
            log
        });

        Self { addr, handle }
    }

    /// Wait for the server to finish; returns what each connection received
    pub fn finish(self) -> Vec<Vec<Received>> {
        self.handle.join().expect("mock server panicked")
    }

    pub fn config(&self) -> Config {
        Config::builder()
            .addr(&self.addr)
            .connect_timeout_ms(2000)
            .reconnect_delay_ms(20)
            .build()
    }

    pub fn connect(&self) -> Client {
        Client::connect(self.config()).unwrap()
    }
}

fn serve(stream: TcpStream, session: Session) -> Vec<Received> {
    stream.set_nodelay(true).unwrap();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    let mut received = Vec::new();

    for ex in session.exchanges {
        let request = read_request(&mut reader).expect("client hung up mid-script");
        assert!(
            request.line.starts_with(&ex.expect),
            "expected {:?}, got {:?}",
            ex.expect,
            request.line
        );
        received.push(request);

        if ex.trickle {
            for byte in &ex.reply {
                writer.write_all(&[*byte]).unwrap();
                writer.flush().unwrap();
                thread::sleep(Duration::from_millis(1));
            }
        } else if !ex.reply.is_empty() {
            writer.write_all(&ex.reply).unwrap();
            writer.flush().unwrap();
        }
    }

    if session.hold {
        while let Some(request) = read_request(&mut reader) {
            received.push(request);
        }
    }
    received
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<Received> {
    let mut line = Vec::new();
    match reader.read_until(b'\n', &mut line) {
        Ok(0) | Err(_) => return None,
        Ok(_) => {}
    }
    let line = String::from_utf8(line).unwrap().trim_end().to_string();

    let body = if line.starts_with("put ") {
        let len: usize = line.rsplit(' ').next().unwrap().parse().unwrap();
        let mut body = vec![0u8; len + 2];
        reader.read_exact(&mut body).unwrap();
        assert_eq!(&body[len..], b"\r\n", "put body must end in CRLF");
        body.truncate(len);
        Some(body)
    } else {
        None
    };

    Some(Received { line, body })
}

/// Poll `check` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

pub fn lines(received: &[Received]) -> Vec<&str> {
    received.iter().map(|r| r.line.as_str()).collect()
}
