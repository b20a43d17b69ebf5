//! Typed event fan-out for pinpad subscribers
//!
//! One handler list per event kind, so handler signatures are checked at
//! compile time. Handlers for a kind fire synchronously in registration
//! order. Events raised while a dispatch is already running are queued and
//! drained before control returns, giving run-to-completion semantics;
//! handlers never observe a half-applied transition.

use std::collections::VecDeque;

use crate::server::State;

pub type StateChangedHandler = Box<dyn FnMut(State, &str, &str) + Send>;
pub type UserSelectedHandler = Box<dyn FnMut(&str) + Send>;
pub type UserCommandHandler = Box<dyn FnMut(&str, &str) + Send>;
pub type ClientConnectedHandler = Box<dyn FnMut(&str) + Send>;

/// An event raised by a session transition, queued until dispatch.
#[derive(Debug, Clone)]
pub(crate) enum Event {
    StateChanged {
        state: State,
        user_id: String,
        cmd_id: String,
    },
    UserSelected {
        user_id: String,
    },
    UserCommand {
        who: String,
        what: String,
    },
    ClientConnected {
        peer_id: String,
    },
}

/// Callback registry and dispatch queue.
///
/// Handlers cannot reach back into the dispatcher (registration needs
/// `&mut`), so a handler cannot re-enter the server that is mid-transition;
/// collaborators that want to drive the server from an event must defer to
/// their own context.
#[derive(Default)]
pub struct EventDispatcher {
    state_changed: Vec<StateChangedHandler>,
    user_selected: Vec<UserSelectedHandler>,
    user_command: Vec<UserCommandHandler>,
    client_connected: Vec<ClientConnectedHandler>,
    queue: VecDeque<Event>,
    dispatching: bool,
}

impl EventDispatcher {
    /// Subscribe to state changes; called with `(state, user_id, cmd_id)`.
    pub fn on_state_changed(&mut self, f: impl FnMut(State, &str, &str) + Send + 'static) {
        self.state_changed.push(Box::new(f));
    }

    /// Subscribe to out-of-band user pre-announcements.
    pub fn on_user_selected(&mut self, f: impl FnMut(&str) + Send + 'static) {
        self.user_selected.push(Box::new(f));
    }

    /// Subscribe to raw command receipt; fires for every parsed write,
    /// regardless of the validation outcome.
    pub fn on_user_command(&mut self, f: impl FnMut(&str, &str) + Send + 'static) {
        self.user_command.push(Box::new(f));
    }

    /// Subscribe to client connection notifications.
    pub fn on_client_connected(&mut self, f: impl FnMut(&str) + Send + 'static) {
        self.client_connected.push(Box::new(f));
    }

    /// Queue `event` and, unless a dispatch is already draining the queue,
    /// run all queued events to completion.
    pub(crate) fn emit(&mut self, event: Event) {
        self.queue.push_back(event);
        if self.dispatching {
            return;
        }

        self.dispatching = true;
        while let Some(ev) = self.queue.pop_front() {
            self.dispatch(ev);
        }
        self.dispatching = false;
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::StateChanged { state, user_id, cmd_id } => {
                for handler in &mut self.state_changed {
                    handler(state, &user_id, &cmd_id);
                }
            }
            Event::UserSelected { user_id } => {
                for handler in &mut self.user_selected {
                    handler(&user_id);
                }
            }
            Event::UserCommand { who, what } => {
                for handler in &mut self.user_command {
                    handler(&who, &what);
                }
            }
            Event::ClientConnected { peer_id } => {
                for handler in &mut self.client_connected {
                    handler(&peer_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn handlers_fire_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventDispatcher::default();

        for i in 0..3 {
            let order = order.clone();
            events.on_user_selected(move |_| order.lock().unwrap().push(i));
        }

        events.emit(Event::UserSelected { user_id: "alice".into() });
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn kinds_are_independent() {
        let hits = Arc::new(Mutex::new(0));
        let mut events = EventDispatcher::default();

        let h = hits.clone();
        events.on_client_connected(move |_| *h.lock().unwrap() += 1);

        // An event with no subscribers for other kinds is a no-op.
        events.emit(Event::UserCommand { who: "".into(), what: "1".into() });
        assert_eq!(*hits.lock().unwrap(), 0);

        events.emit(Event::ClientConnected { peer_id: "aa:bb".into() });
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
