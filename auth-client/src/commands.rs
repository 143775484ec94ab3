//! Run one subcommand against the server and render its result; map failures to exit codes.

use std::io;

use auth_core::{
    AuthClient, ClientError, DatagramChannel, ExchangeError, GroupTokenRequest,
    GroupTokenValidation, IndividualTokenRequest, IndividualTokenValidation, MessageType,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::Command;

pub const EXIT_SETUP: u8 = 1;
pub const EXIT_CHANNEL: u8 = 2;
pub const EXIT_NO_RESPONSE: u8 = 3;
pub const EXIT_SERVER_ERROR: u8 = 4;
pub const EXIT_INVALID_INPUT: u8 = 5;
pub const EXIT_MALFORMED_REPLY: u8 = 6;
pub const EXIT_OUTPUT: u8 = 7;

/// Anything that stops the client before it can print a result.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),
    #[error("could not open a valid socket: {0}")]
    Setup(#[source] io::Error),
    #[error("could not render output: {0}")]
    Output(#[from] serde_json::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl Failure {
    pub fn exit_code(&self) -> u8 {
        match self {
            Failure::Setup(_) => EXIT_SETUP,
            Failure::Output(_) => EXIT_OUTPUT,
            Failure::Config(_) => EXIT_INVALID_INPUT,
            Failure::Client(ClientError::Encode(_)) => EXIT_INVALID_INPUT,
            Failure::Client(ClientError::Decode(_)) => EXIT_MALFORMED_REPLY,
            Failure::Client(ClientError::Exchange(e)) => match e {
                ExchangeError::Channel(_) => EXIT_CHANNEL,
                ExchangeError::NoResponse { .. } => EXIT_NO_RESPONSE,
                ExchangeError::Server(_) => EXIT_SERVER_ERROR,
            },
        }
    }
}

/// Perform `command` and return the line to print.
pub async fn execute<C: DatagramChannel>(
    client: &mut AuthClient<C>,
    command: Command,
    json: bool,
) -> Result<String, Failure> {
    let policy = client.config();
    debug!(attempts = policy.attempts, timeout = ?policy.timeout, "exchange policy");
    match command {
        Command::Itr { id, nonce } => {
            debug!(%id, nonce, "requesting individual token");
            let res = client
                .individual_token(&IndividualTokenRequest::new(id, nonce))
                .await?;
            note_type(res.message_type, MessageType::IndividualTokenResponse);
            render(json, &res, || res.sas().to_string())
        }
        Command::Itv { sas } => {
            debug!(%sas, "validating individual token");
            let res = client
                .validate_individual_token(&IndividualTokenValidation::from_sas(sas))
                .await?;
            note_type(res.message_type, MessageType::IndividualTokenStatus);
            render(json, &res, || res.status.to_string())
        }
        Command::Gtr { n, members } => {
            debug!(n, members = members.len(), "requesting group token");
            let res = client
                .group_token(&GroupTokenRequest { n, members })
                .await?;
            note_type(res.message_type, MessageType::GroupTokenResponse);
            render(json, &res, || res.gas().to_string())
        }
        Command::Gtv { gas } => {
            debug!(%gas, "validating group token");
            let res = client
                .validate_group_token(&GroupTokenValidation::from_gas(gas))
                .await?;
            note_type(res.message_type, MessageType::GroupTokenStatus);
            render(json, &res, || res.status.to_string())
        }
    }
}

/// The reply type is not enforced; a mismatch is only reported.
fn note_type(received: i16, expected: MessageType) {
    if received != expected.code() {
        warn!(received, expected = expected.code(), "unexpected reply type");
    }
}

fn render<T, F>(json: bool, value: &T, plain: F) -> Result<String, Failure>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if json {
        Ok(serde_json::to_string(value)?)
    } else {
        Ok(plain())
    }
}
