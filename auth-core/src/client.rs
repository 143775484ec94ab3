//! Typed operations: encode a request, run the exchange, decode the matching reply.

use crate::exchange::{self, DatagramChannel, ExchangeConfig, ExchangeError};
use crate::protocol::{
    GroupTokenRequest, GroupTokenResponse, GroupTokenStatus, GroupTokenValidation,
    IndividualTokenRequest, IndividualTokenResponse, IndividualTokenStatus,
    IndividualTokenValidation,
};
use crate::wire::{self, DecodeError, EncodeError};

/// Any failure of a typed operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    Encode(#[from] EncodeError),
    #[error("malformed reply: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// Client bound to one channel. `&mut self` keeps at most one exchange in flight.
pub struct AuthClient<C> {
    channel: C,
    config: ExchangeConfig,
}

impl<C: DatagramChannel> AuthClient<C> {
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, ExchangeConfig::default())
    }

    pub fn with_config(channel: C, config: ExchangeConfig) -> Self {
        Self { channel, config }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Give back the channel; dropping it closes the socket.
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Type 1 -> type 2.
    pub async fn individual_token(
        &mut self,
        req: &IndividualTokenRequest,
    ) -> Result<IndividualTokenResponse, ClientError> {
        let payload = wire::encode_individual_request(req)?;
        let reply = exchange::perform(&mut self.channel, &payload, &self.config).await?;
        Ok(wire::decode_individual_response(&reply)?)
    }

    /// Type 3 -> type 4.
    pub async fn validate_individual_token(
        &mut self,
        req: &IndividualTokenValidation,
    ) -> Result<IndividualTokenStatus, ClientError> {
        let payload = wire::encode_individual_validation(req)?;
        let reply = exchange::perform(&mut self.channel, &payload, &self.config).await?;
        Ok(wire::decode_individual_status(&reply)?)
    }

    /// Type 5 -> type 6. The reply is sliced using the request's member count.
    pub async fn group_token(
        &mut self,
        req: &GroupTokenRequest,
    ) -> Result<GroupTokenResponse, ClientError> {
        let payload = wire::encode_group_request(req)?;
        let reply = exchange::perform(&mut self.channel, &payload, &self.config).await?;
        Ok(wire::decode_group_response(&reply, req.members.len())?)
    }

    /// Type 7 -> type 8.
    pub async fn validate_group_token(
        &mut self,
        req: &GroupTokenValidation,
    ) -> Result<GroupTokenStatus, ClientError> {
        let payload = wire::encode_group_validation(req)?;
        let reply = exchange::perform(&mut self.channel, &payload, &self.config).await?;
        Ok(wire::decode_group_status(&reply, req.members.len())?)
    }
}
