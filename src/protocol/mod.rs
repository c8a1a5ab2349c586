//! Protocol Module
//!
//! Defines the beanstalkd wire protocol as seen from the client.
//!
//! ## Protocol Format (text lines, optional binary body)
//!
//! ### Request Format
//! ```text
//! ┌──────────────────────────────┬──────┬───────────────┬──────┐
//! │ command [args ...]           │ CRLF │ body (put)    │ CRLF │
//! └──────────────────────────────┴──────┴───────────────┴──────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌──────────────────────────────┬──────┬───────────────┬──────┐
//! │ STATUS [meta ...]            │ CRLF │ body (n)      │ CRLF │
//! └──────────────────────────────┴──────┴───────────────┴──────┘
//! ```
//!
//! ### Statuses with a body
//! - RESERVED <id> <n>
//! - FOUND <id> <n>
//! - OK <n>
//!
//! Responses carry no request identifier: they are matched to commands
//! purely by order.

mod codec;
mod command;
mod request;
mod response;
mod stats;
mod status;

pub mod frame;

pub use codec::{decode_reply, read_frame, round_trip, take_frame, write_request};
pub use command::{Command, PendingReply};
pub use frame::{bytes_needed, frame_len};
pub use request::{validate_tube, Request, DEFAULT_TUBE, MAX_TUBE_NAME_LEN};
pub use response::Reply;
pub use stats::{parse_list, parse_list_bytes, parse_stats, StatValue, Stats};
pub use status::Status;
