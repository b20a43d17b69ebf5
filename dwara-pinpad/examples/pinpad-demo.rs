//! Console walkthrough of the pinpad session machine.
//!
//! Runs the server against a transport that just prints what the radio
//! would do, then feeds it a few simulated characteristic writes:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example pinpad-demo
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use dwara_pinpad::{Credential, PinpadServer, State, Transport};

/// A transport that narrates instead of transmitting.
struct ConsoleRadio;

impl Transport for ConsoleRadio {
    type Error = std::convert::Infallible;

    fn start_advertising(&mut self, device_name: &str) -> Result<(), Self::Error> {
        println!("[radio] advertising as '{device_name}'");
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), Self::Error> {
        println!("[radio] advertising stopped");
        Ok(())
    }

    fn set_status(&mut self, active: bool) -> Result<(), Self::Error> {
        println!("[radio] status indicator: {}", if active { "on" } else { "off" });
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let secret = b"12345678901234567890";
    let credential = Credential::standard(secret).expect("secret is non-empty");

    // Compute the code a provisioned authenticator app would show right now.
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is past the epoch")
        .as_secs();
    let code = credential.code_at(now);

    let mut server = PinpadServer::new(credential, "Dwara-Demo", ConsoleRadio);

    server.events().on_state_changed(|state, user, cmd| {
        println!("[event] state={state:?} user='{user}' cmd='{cmd}'");
        if state == State::PinAccepted {
            println!("[door] unlocked for '{user}'");
        }
    });
    server.events().on_user_command(|who, what| {
        println!("[event] command from '{who}': '{what}'");
    });
    server.events().on_client_connected(|peer| {
        println!("[event] client connected: {peer}");
    });

    server.start_advertising().expect("console radio never fails");
    server.on_client_connected("aa:bb:cc:dd:ee:ff");

    // A wrong code, then the current one.
    let _ = server.on_raw_write(b"alice:000000");
    let _ = server.on_raw_write(format!("alice:{code:06}").as_bytes());

    server.rearm();
    server.stop_advertising().expect("console radio never fails");
}
