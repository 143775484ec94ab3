//! Auth protocol: message type codes, request/response records and their text forms (SAS, GAS).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type code carried in the leading 16-bit field of every message.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    IndividualTokenRequest = 1,
    IndividualTokenResponse = 2,
    IndividualTokenValidation = 3,
    IndividualTokenStatus = 4,
    GroupTokenRequest = 5,
    GroupTokenResponse = 6,
    GroupTokenValidation = 7,
    GroupTokenStatus = 8,
    /// Server-side failure marker; see `ErrorResponse`.
    Error = 256,
}

impl MessageType {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::IndividualTokenRequest),
            2 => Some(Self::IndividualTokenResponse),
            3 => Some(Self::IndividualTokenValidation),
            4 => Some(Self::IndividualTokenStatus),
            5 => Some(Self::GroupTokenRequest),
            6 => Some(Self::GroupTokenResponse),
            7 => Some(Self::GroupTokenValidation),
            8 => Some(Self::GroupTokenStatus),
            256 => Some(Self::Error),
            _ => None,
        }
    }
}

/// Single Authentication String: one authenticated `(id, nonce, token)` triple.
/// Also the element type of every group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sas {
    pub id: String,
    pub nonce: i32,
    pub token: String,
}

impl Sas {
    pub fn new(id: impl Into<String>, nonce: i32, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nonce,
            token: token.into(),
        }
    }
}

impl fmt::Display for Sas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.nonce, self.token)
    }
}

/// Error parsing a SAS (`id:nonce:token`) or GAS (`sas+...+token`) string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSasError {
    #[error("expected id:nonce:token, got {0:?}")]
    Shape(String),
    #[error("invalid nonce {0:?}")]
    Nonce(String),
    #[error("group authentication string needs at least one SAS before the group token")]
    EmptyGroup,
}

impl FromStr for Sas {
    type Err = ParseSasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            &[id, nonce, token] => {
                let nonce = nonce
                    .parse::<i32>()
                    .map_err(|_| ParseSasError::Nonce(nonce.to_string()))?;
                Ok(Sas::new(id, nonce, token))
            }
            _ => Err(ParseSasError::Shape(s.to_string())),
        }
    }
}

/// Group Authentication String: ordered members followed by the aggregate group token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gas {
    pub members: Vec<Sas>,
    pub token: String,
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sas) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{sas}")?;
        }
        write!(f, "+{}", self.token)
    }
}

impl FromStr for Gas {
    type Err = ParseSasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').collect();
        // split always yields at least one part
        let token = parts.pop().unwrap_or_default().to_string();
        if parts.is_empty() {
            return Err(ParseSasError::EmptyGroup);
        }
        let members = parts
            .into_iter()
            .map(str::parse)
            .collect::<Result<Vec<Sas>, _>>()?;
        Ok(Gas { members, token })
    }
}

/// Type 1: ask the server for a token bound to `(id, nonce)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualTokenRequest {
    pub id: String,
    pub nonce: i32,
}

impl IndividualTokenRequest {
    pub const TYPE: MessageType = MessageType::IndividualTokenRequest;

    pub fn new(id: impl Into<String>, nonce: i32) -> Self {
        Self {
            id: id.into(),
            nonce,
        }
    }
}

/// Type 2 (by convention; the received type field is kept as-is).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualTokenResponse {
    pub message_type: i16,
    pub id: String,
    pub nonce: i32,
    pub token: String,
}

impl IndividualTokenResponse {
    pub fn sas(&self) -> Sas {
        Sas::new(self.id.clone(), self.nonce, self.token.clone())
    }
}

/// Type 3: ask the server whether a SAS is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualTokenValidation {
    pub id: String,
    pub nonce: i32,
    pub token: String,
}

impl IndividualTokenValidation {
    pub const TYPE: MessageType = MessageType::IndividualTokenValidation;

    pub fn from_sas(sas: Sas) -> Self {
        Self {
            id: sas.id,
            nonce: sas.nonce,
            token: sas.token,
        }
    }
}

/// Type 4: validation verdict for a SAS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualTokenStatus {
    pub message_type: i16,
    pub id: String,
    pub nonce: i32,
    pub token: String,
    pub status: i8,
}

/// Type 5: ask for an aggregate token over `n` members. Member order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTokenRequest {
    /// Declared group size; must equal `members.len()` to encode.
    pub n: i16,
    pub members: Vec<Sas>,
}

impl GroupTokenRequest {
    pub const TYPE: MessageType = MessageType::GroupTokenRequest;

    /// Build a request whose declared size is the member count (saturating at `i16::MAX`).
    pub fn new(members: Vec<Sas>) -> Self {
        Self {
            n: i16::try_from(members.len()).unwrap_or(i16::MAX),
            members,
        }
    }
}

/// Type 6: the members echoed back plus the aggregate group token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTokenResponse {
    pub message_type: i16,
    pub n: i16,
    pub members: Vec<Sas>,
    pub token: String,
}

impl GroupTokenResponse {
    pub fn gas(&self) -> Gas {
        Gas {
            members: self.members.clone(),
            token: self.token.clone(),
        }
    }
}

/// Type 7: ask the server whether a GAS is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTokenValidation {
    pub n: i16,
    pub members: Vec<Sas>,
    pub token: String,
}

impl GroupTokenValidation {
    pub const TYPE: MessageType = MessageType::GroupTokenValidation;

    pub fn from_gas(gas: Gas) -> Self {
        Self {
            n: i16::try_from(gas.members.len()).unwrap_or(i16::MAX),
            members: gas.members,
            token: gas.token,
        }
    }
}

/// Type 8: validation verdict for a GAS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTokenStatus {
    pub message_type: i16,
    pub n: i16,
    pub members: Vec<Sas>,
    pub token: String,
    pub status: i8,
}

/// Type 256: the server rejected the request. Only ever 4 bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: i16,
}

impl ErrorResponse {
    pub const TYPE: MessageType = MessageType::Error;
}
