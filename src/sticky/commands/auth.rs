use crate::commands::{CmdMessage, CmdResult, StickyPaths};
use crate::error::Result;
use crate::settings::Settings;
use crate::source::{AuthHandshake, AuthStatus};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long to wait for the user to accept the request inside Joplin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            attempts: 60,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted(String),
    Rejected,
    TimedOut,
    Unreachable,
}

impl AuthOutcome {
    pub fn token(self) -> Option<String> {
        match self {
            AuthOutcome::Granted(token) => Some(token),
            _ => None,
        }
    }
}

/// Asks Joplin for an API token and polls until the user answers or the
/// policy's attempts run out.
pub fn request_api_token<H: AuthHandshake>(handshake: &H, policy: &AuthPolicy) -> AuthOutcome {
    let auth_token = match handshake.request_auth() {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "could not start authorization");
            return AuthOutcome::Unreachable;
        }
    };
    info!("authorization requested, waiting for approval in Joplin");

    for attempt in 1..=policy.attempts {
        match handshake.check_auth(&auth_token) {
            Ok(check) => match (check.status, check.token) {
                (AuthStatus::Accepted, Some(token)) => return AuthOutcome::Granted(token),
                (AuthStatus::Accepted, None) => {
                    warn!("authorization accepted without a token, still waiting")
                }
                (AuthStatus::Rejected, _) => return AuthOutcome::Rejected,
                (AuthStatus::Waiting, _) => debug!(attempt, "authorization pending"),
            },
            Err(e) => debug!(attempt, error = %e, "authorization check failed"),
        }
        if attempt < policy.attempts {
            thread::sleep(policy.interval);
        }
    }

    AuthOutcome::TimedOut
}

/// Runs the handshake and remembers the token on success.
pub fn run<H: AuthHandshake>(
    handshake: &H,
    policy: &AuthPolicy,
    paths: &StickyPaths,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    match request_api_token(handshake, policy) {
        AuthOutcome::Granted(token) => {
            save_token(paths, token)?;
            result.add_message(CmdMessage::success("Connected to Joplin."));
        }
        AuthOutcome::Rejected => result.add_message(CmdMessage::error(
            "The authorization request was rejected in Joplin.",
        )),
        AuthOutcome::TimedOut => result.add_message(CmdMessage::error(
            "No answer from Joplin in time. Accept the request in Joplin and try again.",
        )),
        AuthOutcome::Unreachable => result.add_message(CmdMessage::error(
            "Couldn't obtain API token. Please start Joplin and activate the web clipper.",
        )),
    }
    Ok(result)
}

/// Stores a token obtained some other way, e.g. copied from Joplin's settings.
pub fn save_token(paths: &StickyPaths, token: String) -> Result<()> {
    let mut settings = Settings::load(&paths.data_dir)?;
    settings.api_token = Some(token);
    settings.save(&paths.data_dir)
}
