//! Wire codec: fixed-layout, big-endian packing of every message type.
//!
//! Layouts (sizes in bytes):
//!
//! ```text
//! individual request     type(2) id(12) nonce(4)                          = 18
//! individual response    type(2) id(12) nonce(4) token(64)                = 82
//! individual validation  type(2) id(12) nonce(4) token(64)                = 82
//! individual status      type(2) id(12) nonce(4) token(64) status(1)      = 83
//! group request          type(2) n(2) sas(80)*n                           = 4 + 80n
//! group response         type(2) n(2) sas(80)*n token(64)                 = 68 + 80n
//! group validation       type(2) n(2) sas(80)*n token(64)                 = 68 + 80n
//! group status           type(2) n(2) sas(80)*n token(64) status(1)       = 69 + 80n
//! error                  type(2)=256 code(2)                              = 4
//! ```
//!
//! ASCII fields are right-padded with spaces on encode and trimmed on decode.

use bytes::{Buf, BufMut};

use crate::protocol::{
    ErrorResponse, GroupTokenRequest, GroupTokenResponse, GroupTokenStatus, GroupTokenValidation,
    IndividualTokenRequest, IndividualTokenResponse, IndividualTokenStatus,
    IndividualTokenValidation, Sas,
};

const TYPE_LEN: usize = 2;
const GROUP_SIZE_LEN: usize = 2;
const STATUS_LEN: usize = 1;

pub const ID_LEN: usize = 12;
pub const NONCE_LEN: usize = 4;
pub const TOKEN_LEN: usize = 64;
/// One group member: id + nonce + token.
pub const SAS_LEN: usize = ID_LEN + NONCE_LEN + TOKEN_LEN;

pub const INDIVIDUAL_REQUEST_LEN: usize = TYPE_LEN + ID_LEN + NONCE_LEN;
pub const INDIVIDUAL_RESPONSE_LEN: usize = TYPE_LEN + SAS_LEN;
pub const INDIVIDUAL_VALIDATION_LEN: usize = TYPE_LEN + SAS_LEN;
pub const INDIVIDUAL_STATUS_LEN: usize = TYPE_LEN + SAS_LEN + STATUS_LEN;
pub const GROUP_HEADER_LEN: usize = TYPE_LEN + GROUP_SIZE_LEN;
/// No success reply layout is ever this long, so length alone identifies an error reply.
pub const ERROR_LEN: usize = TYPE_LEN + 2;

pub fn group_request_len(n: usize) -> usize {
    GROUP_HEADER_LEN.saturating_add(SAS_LEN.saturating_mul(n))
}

pub fn group_response_len(n: usize) -> usize {
    group_request_len(n).saturating_add(TOKEN_LEN)
}

pub fn group_validation_len(n: usize) -> usize {
    group_response_len(n)
}

pub fn group_status_len(n: usize) -> usize {
    group_response_len(n).saturating_add(STATUS_LEN)
}

/// Error encoding a record: caller data does not fit the fixed layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("{field} contains non-ASCII characters")]
    NonAscii { field: &'static str },
    #[error("{field} is {len} bytes, at most {max} fit")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("group declares n={declared} but has {actual} members")]
    GroupSize { declared: i16, actual: usize },
}

/// Error decoding a reply that does not match the expected layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("{field} contains non-ASCII bytes")]
    NonAscii { field: &'static str },
}

/// Encode a type 1 request (18 bytes).
pub fn encode_individual_request(req: &IndividualTokenRequest) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(INDIVIDUAL_REQUEST_LEN);
    out.put_i16(IndividualTokenRequest::TYPE.code());
    put_ascii(&mut out, "id", &req.id, ID_LEN)?;
    out.put_i32(req.nonce);
    Ok(out)
}

/// Decode a type 2 reply. Requires exactly 82 bytes.
pub fn decode_individual_response(bytes: &[u8]) -> Result<IndividualTokenResponse, DecodeError> {
    expect_len(bytes, INDIVIDUAL_RESPONSE_LEN)?;
    let mut buf = bytes;
    let message_type = buf.get_i16();
    let Sas { id, nonce, token } = get_sas(&mut buf)?;
    Ok(IndividualTokenResponse {
        message_type,
        id,
        nonce,
        token,
    })
}

/// Encode a type 3 request (82 bytes).
pub fn encode_individual_validation(
    req: &IndividualTokenValidation,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(INDIVIDUAL_VALIDATION_LEN);
    out.put_i16(IndividualTokenValidation::TYPE.code());
    put_sas(&mut out, &req.id, req.nonce, &req.token)?;
    Ok(out)
}

/// Decode a type 4 reply. Requires exactly 83 bytes.
pub fn decode_individual_status(bytes: &[u8]) -> Result<IndividualTokenStatus, DecodeError> {
    expect_len(bytes, INDIVIDUAL_STATUS_LEN)?;
    let mut buf = bytes;
    let message_type = buf.get_i16();
    let Sas { id, nonce, token } = get_sas(&mut buf)?;
    let status = buf.get_i8();
    Ok(IndividualTokenStatus {
        message_type,
        id,
        nonce,
        token,
        status,
    })
}

/// Encode a type 5 request (4 + 80n bytes), members in the given order.
pub fn encode_group_request(req: &GroupTokenRequest) -> Result<Vec<u8>, EncodeError> {
    let n = check_group_size(req.n, &req.members)?;
    let chunks = encode_members(&req.members)?;
    let mut out = Vec::with_capacity(group_request_len(n));
    out.put_i16(GroupTokenRequest::TYPE.code());
    out.put_i16(req.n);
    out.put_slice(&chunks);
    Ok(out)
}

/// Decode a type 6 reply for a group of `n` members. Requires exactly 68 + 80n bytes.
pub fn decode_group_response(bytes: &[u8], n: usize) -> Result<GroupTokenResponse, DecodeError> {
    expect_len(bytes, group_response_len(n))?;
    let mut buf = bytes;
    let message_type = buf.get_i16();
    let wire_n = buf.get_i16();
    let members = get_members(&mut buf, n)?;
    let token = get_ascii(&mut buf, "token", TOKEN_LEN)?;
    Ok(GroupTokenResponse {
        message_type,
        n: wire_n,
        members,
        token,
    })
}

/// Encode a type 7 request (68 + 80n bytes).
pub fn encode_group_validation(req: &GroupTokenValidation) -> Result<Vec<u8>, EncodeError> {
    let n = check_group_size(req.n, &req.members)?;
    let chunks = encode_members(&req.members)?;
    let mut out = Vec::with_capacity(group_validation_len(n));
    out.put_i16(GroupTokenValidation::TYPE.code());
    out.put_i16(req.n);
    out.put_slice(&chunks);
    put_ascii(&mut out, "token", &req.token, TOKEN_LEN)?;
    Ok(out)
}

/// Decode a type 8 reply for a group of `n` members. Requires exactly 69 + 80n bytes.
pub fn decode_group_status(bytes: &[u8], n: usize) -> Result<GroupTokenStatus, DecodeError> {
    expect_len(bytes, group_status_len(n))?;
    let mut buf = bytes;
    let message_type = buf.get_i16();
    let wire_n = buf.get_i16();
    let members = get_members(&mut buf, n)?;
    let token = get_ascii(&mut buf, "token", TOKEN_LEN)?;
    let status = buf.get_i8();
    Ok(GroupTokenStatus {
        message_type,
        n: wire_n,
        members,
        token,
        status,
    })
}

/// Recognize the 4-byte error layout. `None` means "not an error reply", not a failure.
pub fn try_decode_error(bytes: &[u8]) -> Option<ErrorResponse> {
    if bytes.len() != ERROR_LEN {
        return None;
    }
    let mut buf = bytes;
    if buf.get_i16() != ErrorResponse::TYPE.code() {
        return None;
    }
    Some(ErrorResponse {
        code: buf.get_i16(),
    })
}

fn check_group_size(declared: i16, members: &[Sas]) -> Result<usize, EncodeError> {
    match usize::try_from(declared) {
        Ok(n) if n == members.len() => Ok(n),
        _ => Err(EncodeError::GroupSize {
            declared,
            actual: members.len(),
        }),
    }
}

fn encode_members(members: &[Sas]) -> Result<Vec<u8>, EncodeError> {
    let mut chunks = Vec::with_capacity(SAS_LEN * members.len());
    for sas in members {
        put_sas(&mut chunks, &sas.id, sas.nonce, &sas.token)?;
    }
    Ok(chunks)
}

fn put_sas(out: &mut Vec<u8>, id: &str, nonce: i32, token: &str) -> Result<(), EncodeError> {
    put_ascii(out, "id", id, ID_LEN)?;
    out.put_i32(nonce);
    put_ascii(out, "token", token, TOKEN_LEN)
}

fn put_ascii(
    out: &mut Vec<u8>,
    field: &'static str,
    value: &str,
    width: usize,
) -> Result<(), EncodeError> {
    if !value.is_ascii() {
        return Err(EncodeError::NonAscii { field });
    }
    if value.len() > width {
        return Err(EncodeError::FieldTooLong {
            field,
            len: value.len(),
            max: width,
        });
    }
    out.put_slice(value.as_bytes());
    out.put_bytes(b' ', width - value.len());
    Ok(())
}

fn expect_len(bytes: &[u8], expected: usize) -> Result<(), DecodeError> {
    if bytes.len() != expected {
        return Err(DecodeError::Length {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Caller has checked the total length, so `buf` holds at least `n` chunks.
fn get_members(buf: &mut &[u8], n: usize) -> Result<Vec<Sas>, DecodeError> {
    let current = *buf;
    let (region, rest) = current.split_at(SAS_LEN * n);
    *buf = rest;
    region
        .chunks_exact(SAS_LEN)
        .map(|mut chunk| get_sas(&mut chunk))
        .collect()
}

fn get_sas(buf: &mut &[u8]) -> Result<Sas, DecodeError> {
    let id = get_ascii(buf, "id", ID_LEN)?;
    let nonce = buf.get_i32();
    let token = get_ascii(buf, "token", TOKEN_LEN)?;
    Ok(Sas { id, nonce, token })
}

fn get_ascii(buf: &mut &[u8], field: &'static str, width: usize) -> Result<String, DecodeError> {
    let current = *buf;
    let (raw, rest) = current.split_at(width);
    *buf = rest;
    if !raw.is_ascii() {
        return Err(DecodeError::NonAscii { field });
    }
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::NonAscii { field })?;
    Ok(text.trim_end_matches(|c| c == ' ' || c == '\0').to_string())
}
