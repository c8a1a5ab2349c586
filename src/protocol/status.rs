//! Status codes
//!
//! The closed vocabulary of beanstalkd status tokens, with a fallback
//! for anything the client does not know.

use std::fmt;

/// Response status codes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    // Success statuses
    Ok,
    Inserted,
    Reserved,
    Found,
    Deleted,
    Released,
    Buried,
    Touched,
    Kicked,
    Using,
    Watching,
    Paused,

    // Job / tube conditions
    NotFound,
    NotIgnored,
    TimedOut,
    DeadlineSoon,
    ExpectedCrlf,
    JobTooBig,
    Draining,

    // Server errors
    OutOfMemory,
    InternalError,
    BadFormat,
    UnknownCommand,

    /// Any token the client does not recognize, kept verbatim
    Unknown(String),
}

impl Status {
    /// Parse a status token (first word of a response line)
    pub fn parse(token: &str) -> Self {
        match token {
            "OK" => Status::Ok,
            "INSERTED" => Status::Inserted,
            "RESERVED" => Status::Reserved,
            "FOUND" => Status::Found,
            "DELETED" => Status::Deleted,
            "RELEASED" => Status::Released,
            "BURIED" => Status::Buried,
            "TOUCHED" => Status::Touched,
            "KICKED" => Status::Kicked,
            "USING" => Status::Using,
            "WATCHING" => Status::Watching,
            "PAUSED" => Status::Paused,
            "NOT_FOUND" => Status::NotFound,
            "NOT_IGNORED" => Status::NotIgnored,
            "TIMED_OUT" => Status::TimedOut,
            "DEADLINE_SOON" => Status::DeadlineSoon,
            "EXPECTED_CRLF" => Status::ExpectedCrlf,
            "JOB_TOO_BIG" => Status::JobTooBig,
            "DRAINING" => Status::Draining,
            "OUT_OF_MEMORY" => Status::OutOfMemory,
            "INTERNAL_ERROR" => Status::InternalError,
            "BAD_FORMAT" => Status::BadFormat,
            "UNKNOWN_COMMAND" => Status::UnknownCommand,
            other => Status::Unknown(other.to_string()),
        }
    }

    /// The token exactly as it appears on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Status::Ok => "OK",
            Status::Inserted => "INSERTED",
            Status::Reserved => "RESERVED",
            Status::Found => "FOUND",
            Status::Deleted => "DELETED",
            Status::Released => "RELEASED",
            Status::Buried => "BURIED",
            Status::Touched => "TOUCHED",
            Status::Kicked => "KICKED",
            Status::Using => "USING",
            Status::Watching => "WATCHING",
            Status::Paused => "PAUSED",
            Status::NotFound => "NOT_FOUND",
            Status::NotIgnored => "NOT_IGNORED",
            Status::TimedOut => "TIMED_OUT",
            Status::DeadlineSoon => "DEADLINE_SOON",
            Status::ExpectedCrlf => "EXPECTED_CRLF",
            Status::JobTooBig => "JOB_TOO_BIG",
            Status::Draining => "DRAINING",
            Status::OutOfMemory => "OUT_OF_MEMORY",
            Status::InternalError => "INTERNAL_ERROR",
            Status::BadFormat => "BAD_FORMAT",
            Status::UnknownCommand => "UNKNOWN_COMMAND",
            Status::Unknown(token) => token,
        }
    }

    /// Index of the metadata token that declares the body length, for
    /// statuses followed by a body
    ///
    /// - `RESERVED <id> <bytes>` / `FOUND <id> <bytes>` → 1
    /// - `OK <bytes>` → 0
    pub fn body_len_index(&self) -> Option<usize> {
        match self {
            Status::Reserved | Status::Found => Some(1),
            Status::Ok => Some(0),
            _ => None,
        }
    }

    pub fn has_body(&self) -> bool {
        self.body_len_index().is_some()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
