//! Pinpad session state machine
//!
//! One session is live at a time. The server owns the credential, the
//! current state, and the identity/payload of the most recent submission;
//! every inbound write re-evaluates and may move freely between
//! [`State::PinAccepted`] and [`State::PinRejected`]. Re-arming back to
//! [`State::Idle`] is an explicit operation (see [`PinpadServer::rearm`]).

use log::{debug, info, warn};

use dwara_otp::Credential;
use dwara_proto::ParseError;

use crate::events::{Event, EventDispatcher};
use crate::transport::Transport;

/// Authentication progress of the single live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not advertising. Initial state; also entered whenever advertising
    /// stops.
    Stopped,
    /// Advertising, no submission evaluated yet.
    Idle,
    /// The last submission matched the current TOTP window.
    PinAccepted,
    /// The last submission did not match.
    PinRejected,
}

#[derive(thiserror::Error, Debug)]
pub enum PinpadError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// The pinpad peripheral core.
///
/// Transport callbacks reach the server through explicit `&mut` entry
/// points; there is no process-wide instance. Callers receiving transport
/// notifications on another execution context wrap the server in a mutex
/// held for the duration of a single call.
pub struct PinpadServer<T: Transport> {
    credential: Credential,
    device_name: String,
    state: State,
    user_id: String,
    cmd_id: String,
    transport: T,
    events: EventDispatcher,
}

impl<T: Transport> PinpadServer<T>
where
    T::Error: std::fmt::Display,
{
    /// Create a server in [`State::Stopped`].
    ///
    /// The credential is validated at construction
    /// ([`Credential::new`](dwara_otp::Credential::new)), so a server can
    /// never exist without a usable secret.
    pub fn new(credential: Credential, device_name: impl Into<String>, transport: T) -> Self {
        Self {
            credential,
            device_name: device_name.into(),
            state: State::Stopped,
            user_id: String::new(),
            cmd_id: String::new(),
            transport,
            events: EventDispatcher::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Identity claimed by the most recently evaluated submission.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Payload of the most recently evaluated submission.
    pub fn cmd_id(&self) -> &str {
        &self.cmd_id
    }

    pub fn is_active(&self) -> bool {
        self.state != State::Stopped
    }

    pub fn is_accepted(&self) -> bool {
        self.state == State::PinAccepted
    }

    pub fn is_rejected(&self) -> bool {
        self.state == State::PinRejected
    }

    /// The event registry; subscribe here before starting the transport.
    pub fn events(&mut self) -> &mut EventDispatcher {
        &mut self.events
    }

    /// Start advertising: `Stopped -> Idle`. A redundant call while already
    /// active is a no-op.
    pub fn start_advertising(&mut self) -> Result<(), PinpadError> {
        if self.is_active() {
            return Ok(());
        }

        self.transport
            .start_advertising(&self.device_name)
            .map_err(|e| PinpadError::Transport(e.to_string()))?;
        info!("advertising started as '{}'", self.device_name);
        self.transition(State::Idle);
        Ok(())
    }

    /// Stop advertising: any state -> `Stopped`; clears the session. A
    /// redundant call while already stopped is a no-op with no transport
    /// side effect.
    pub fn stop_advertising(&mut self) -> Result<(), PinpadError> {
        if self.state == State::Stopped {
            return Ok(());
        }

        self.transport
            .stop_advertising()
            .map_err(|e| PinpadError::Transport(e.to_string()))?;
        info!("advertising stopped");
        self.user_id.clear();
        self.cmd_id.clear();
        self.transition(State::Stopped);
        Ok(())
    }

    /// Evaluate a raw inbound write.
    ///
    /// Malformed writes are dropped without a state change; the error is
    /// returned so callers can observe the drop. A parsed write always emits
    /// a user-command event, then (unless stopped) is evaluated: a payload
    /// matching the current TOTP window accepts, anything else rejects.
    /// `user_id` and `cmd_id` are updated together on every evaluation.
    pub fn on_raw_write(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        let cmd = match dwara_proto::parse(bytes) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("dropping malformed write: {e}");
                return Err(e);
            }
        };

        debug!("write from '{}': '{}'", cmd.who, cmd.what);
        self.events.emit(Event::UserCommand {
            who: cmd.who.clone(),
            what: cmd.what.clone(),
        });

        if self.state == State::Stopped {
            // Command receipt is observable, but a stopped pinpad makes no
            // authorization decision.
            return Ok(());
        }

        let accepted = match cmd.what.parse::<u32>() {
            Ok(code) => self.credential.verify(code),
            // A payload that is not a numeric passcode can never match.
            Err(_) => false,
        };

        self.user_id = cmd.who;
        self.cmd_id = cmd.what;

        if accepted {
            info!("pin accepted for '{}'", self.user_id);
            self.transition(State::PinAccepted);
        } else {
            info!("pin rejected for '{}'", self.user_id);
            self.transition(State::PinRejected);
        }
        Ok(())
    }

    /// Out-of-band identity pre-announcement. Emits a user-selected event;
    /// does not alter state.
    pub fn on_user_selected(&mut self, user_id: &str) {
        self.events.emit(Event::UserSelected { user_id: user_id.to_string() });
    }

    /// Connection notification from the transport. Emits a client-connected
    /// event; does not alter state.
    pub fn on_client_connected(&mut self, peer_id: &str) {
        debug!("client connected: {peer_id}");
        self.events.emit(Event::ClientConnected { peer_id: peer_id.to_string() });
    }

    /// Explicitly re-arm after a decision: `PinAccepted`/`PinRejected` ->
    /// `Idle`, clearing the session. No-op in other states.
    pub fn rearm(&mut self) {
        if matches!(self.state, State::PinAccepted | State::PinRejected) {
            self.user_id.clear();
            self.cmd_id.clear();
            self.transition(State::Idle);
        }
    }

    /// Apply `next`, drive the status indicator on active-ness edges, and
    /// emit a state-changed event carrying the session identifiers.
    fn transition(&mut self, next: State) {
        let was_active = self.is_active();
        self.state = next;

        if was_active != self.is_active() {
            if let Err(e) = self.transport.set_status(self.is_active()) {
                warn!("status indicator update failed: {e}");
            }
        }

        self.events.emit(Event::StateChanged {
            state: self.state,
            user_id: self.user_id.clone(),
            cmd_id: self.cmd_id.clone(),
        });
    }
}
