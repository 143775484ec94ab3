//! UDP authentication token protocol: records, fixed-layout wire codec, request exchange.
//! No sockets and no logging: the host supplies a `DatagramChannel` and reports outcomes.

pub mod client;
pub mod exchange;
pub mod protocol;
pub mod server_error;
pub mod wire;

pub use client::{AuthClient, ClientError};
pub use exchange::{perform, DatagramChannel, ExchangeConfig, ExchangeError};
pub use protocol::{
    ErrorResponse, Gas, GroupTokenRequest, GroupTokenResponse, GroupTokenStatus,
    GroupTokenValidation, IndividualTokenRequest, IndividualTokenResponse, IndividualTokenStatus,
    IndividualTokenValidation, MessageType, ParseSasError, Sas,
};
pub use server_error::{ServerError, ServerErrorKind};
pub use wire::{try_decode_error, DecodeError, EncodeError};
