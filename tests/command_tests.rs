//! Command Tests
//!
//! Tests for request encoding and response resolution.

use std::time::Duration;

use bytes::Bytes;
use stalkwire::protocol::{decode_reply, validate_tube, Command, Request, Status};
use stalkwire::StalkError;

fn resolve(buf: &[u8], expected: Option<Status>) -> stalkwire::Result<stalkwire::protocol::Reply> {
    let (command, pending) = Command::new(Request::reserve(), expected);
    command.resolve(Ok(Bytes::copy_from_slice(buf)));
    pending.wait()
}

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_encode_bodiless_request() {
    assert_eq!(&Request::reserve().encode()[..], b"reserve\r\n");
    assert_eq!(&Request::delete(42).encode()[..], b"delete 42\r\n");
    assert_eq!(&Request::release(3, 10, 5).encode()[..], b"release 3 10 5\r\n");
    assert_eq!(&Request::bury(3, 7).encode()[..], b"bury 3 7\r\n");
    assert_eq!(
        &Request::reserve_with_timeout(0).encode()[..],
        b"reserve-with-timeout 0\r\n"
    );
    assert_eq!(
        &Request::pause_tube("orders", 30).encode()[..],
        b"pause-tube orders 30\r\n"
    );
    assert_eq!(&Request::kick_job(9).encode()[..], b"kick-job 9\r\n");
    assert_eq!(&Request::list_tubes_watched().encode()[..], b"list-tubes-watched\r\n");
}

#[test]
fn test_encode_put_with_body() {
    let request = Request::put(100, 0, 60, Bytes::from_static(b"a\r\nb"));
    assert_eq!(request.line(), "put 100 0 60 4");
    assert_eq!(&request.encode()[..], b"put 100 0 60 4\r\na\r\nb\r\n");
}

#[test]
fn test_encode_put_binary_body() {
    let body: Vec<u8> = (0..=255).collect();
    let encoded = Request::put(1, 2, 3, Bytes::from(body.clone())).encode();

    let head = b"put 1 2 3 256\r\n";
    assert_eq!(&encoded[..head.len()], head);
    assert_eq!(&encoded[head.len()..head.len() + 256], &body[..]);
    assert_eq!(&encoded[encoded.len() - 2..], b"\r\n");
}

#[test]
fn test_command_encode_matches_request() {
    let (command, _pending) = Command::new(Request::touch(5), Some(Status::Touched));
    assert_eq!(command.encode(), Request::touch(5).encode());
    assert_eq!(command.expected(), Some(&Status::Touched));
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_resolve_success_with_body() {
    let reply = resolve(b"RESERVED 7 5\r\nhello\r\n", Some(Status::Reserved)).unwrap();

    assert_eq!(reply.status, Status::Reserved);
    assert_eq!(reply.meta, vec!["7".to_string(), "5".to_string()]);
    assert_eq!(reply.body.as_deref(), Some(&b"hello"[..]));
    assert_eq!(reply.meta_u64(0).unwrap(), 7);
}

#[test]
fn test_resolve_body_with_embedded_crlf() {
    let reply = resolve(b"FOUND 1 6\r\n\r\nab\r\n\r\n", None).unwrap();
    assert_eq!(reply.body.as_deref(), Some(&b"\r\nab\r\n"[..]));
}

#[test]
fn test_resolve_bodiless_success() {
    let reply = resolve(b"INSERTED 12\r\n", None).unwrap();
    assert_eq!(reply.status, Status::Inserted);
    assert_eq!(reply.meta, vec!["12".to_string()]);
    assert_eq!(reply.body, None);
}

#[test]
fn test_expected_status_mismatch_carries_status() {
    let err = resolve(b"NOT_FOUND\r\n", Some(Status::Deleted)).unwrap_err();

    assert!(matches!(err, StalkError::Status(Status::NotFound)));
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "NOT_FOUND");
}

#[test]
fn test_unknown_status_kept_verbatim() {
    let err = resolve(b"WEIRD_THING\r\n", Some(Status::Deleted)).unwrap_err();
    assert_eq!(err.status(), Some(&Status::Unknown("WEIRD_THING".to_string())));
    assert_eq!(err.to_string(), "WEIRD_THING");
}

#[test]
fn test_timed_out_is_typed() {
    let err = resolve(b"TIMED_OUT\r\n", Some(Status::Reserved)).unwrap_err();
    assert!(err.is_timed_out());
    assert!(!err.is_transport());

    let err = resolve(b"DEADLINE_SOON\r\n", Some(Status::Reserved)).unwrap_err();
    assert!(err.is_deadline_soon());
}

#[test]
fn test_missing_terminator_is_malformed() {
    let err = resolve(b"INSERTED 12", None).unwrap_err();
    assert!(matches!(err, StalkError::Malformed(_)));
}

#[test]
fn test_body_length_mismatch_is_malformed() {
    let err = resolve(b"RESERVED 1 10\r\nshort\r\n", None).unwrap_err();
    assert!(matches!(err, StalkError::Malformed(_)));
    assert!(err.to_string().contains("declares 10"));
}

#[test]
fn test_missing_body_is_malformed() {
    let err = resolve(b"OK 5\r\n", Some(Status::Ok)).unwrap_err();
    assert!(matches!(err, StalkError::Malformed(_)));
}

#[test]
fn test_empty_status_line_is_malformed() {
    let err = resolve(b"\r\n", None).unwrap_err();
    assert!(matches!(err, StalkError::Malformed(_)));
}

#[test]
fn test_transport_error_propagates_unchanged() {
    let (command, pending) = Command::new(Request::reserve(), Some(Status::Reserved));
    command.resolve(Err(StalkError::ConnectionLost("reset by peer".to_string())));

    match pending.wait() {
        Err(StalkError::ConnectionLost(msg)) => assert_eq!(msg, "reset by peer"),
        other => panic!("Expected ConnectionLost, got {:?}", other),
    }
}

#[test]
fn test_decode_does_not_resolve() {
    let (command, pending) = Command::new(Request::delete(1), Some(Status::Deleted));
    let decoded = command.decode(Ok(Bytes::from_static(b"DELETED\r\n"))).unwrap();
    assert_eq!(decoded.status, Status::Deleted);

    // Still pending: only `complete` / `resolve` deliver an outcome
    assert!(matches!(
        pending.wait_timeout(Duration::from_millis(20)),
        Err(StalkError::WaitTimeout)
    ));
    drop(command);
}

// =============================================================================
// Single Resolution Tests
// =============================================================================

#[test]
fn test_dropped_command_cancels_pending() {
    let (command, pending) = Command::new(Request::reserve(), None);
    drop(command);
    assert!(matches!(pending.wait(), Err(StalkError::Cancelled)));
}

#[test]
fn test_resolution_after_caller_gave_up_is_harmless() {
    let (command, pending) = Command::new(Request::reserve(), None);
    drop(pending);
    command.resolve(Ok(Bytes::from_static(b"TIMED_OUT\r\n")));
}

#[test]
fn test_pending_observes_exactly_one_outcome() {
    let (command, pending) = Command::new(Request::delete(1), Some(Status::Deleted));
    command.resolve(Ok(Bytes::from_static(b"DELETED\r\n")));
    // `resolve` consumed the command; the slot holds exactly this outcome
    assert_eq!(pending.wait().unwrap().status, Status::Deleted);
}

#[test]
fn test_wait_timeout_when_unresolved() {
    let (_command, pending) = Command::new(Request::reserve(), None);
    assert!(matches!(
        pending.wait_timeout(Duration::from_millis(10)),
        Err(StalkError::WaitTimeout)
    ));
}

// =============================================================================
// Codec Helpers
// =============================================================================

#[test]
fn test_decode_reply_without_expectation() {
    let reply = decode_reply(b"KICKED 3\r\n", None).unwrap();
    assert_eq!(reply.status, Status::Kicked);
    assert_eq!(reply.meta_u64(0).unwrap(), 3);
    assert!(reply.meta_u64(1).is_err());
}

#[test]
fn test_status_round_trips_through_tokens() {
    for token in ["OK", "INSERTED", "NOT_IGNORED", "OUT_OF_MEMORY", "JOB_TOO_BIG", "DRAINING"] {
        assert_eq!(Status::parse(token).as_str(), token);
    }
    assert!(matches!(Status::parse("NOPE"), Status::Unknown(_)));
}

#[test]
fn test_validate_tube() {
    assert!(validate_tube("default").is_ok());
    assert!(validate_tube("orders.v2+eu/(a);$_").is_ok());
    assert!(validate_tube(&"t".repeat(200)).is_ok());

    for bad in ["", "-leading", "has space", "new\nline", "ümlaut"] {
        assert!(
            matches!(validate_tube(bad), Err(StalkError::InvalidTube(_))),
            "{:?}",
            bad
        );
    }
    assert!(validate_tube(&"t".repeat(201)).is_err());
}
