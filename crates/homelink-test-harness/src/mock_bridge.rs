//! Mock bridge for testing device codecs and entities.
//!
//! [`MockBridge`] implements [`Bridge`] with a queue of scripted exchanges.
//! Each exchange names the hex command it expects and either a raw reply or
//! a failure. The mock is cheaply cloneable: keep one handle in the test and
//! hand the other to the entity under test, then inspect what was sent.
//!
//! # Example
//!
//! ```
//! use homelink_test_harness::MockBridge;
//!
//! let bridge = MockBridge::new();
//! bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC2,VOL40\r\n");
//! bridge.expect_timeout_for("*Z1STATUS?\r");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use homelink_core::error::{Error, Result};
use homelink_core::transport::{share_bridge, Bridge, SharedBridge};

#[derive(Debug, Clone)]
enum Outcome {
    Reply(String),
    Timeout,
    Fail(String),
}

#[derive(Debug, Clone)]
struct Exchange {
    hex_command: String,
    outcome: Outcome,
}

#[derive(Debug, Default)]
struct State {
    exchanges: VecDeque<Exchange>,
    sent: Vec<String>,
}

/// A scripted [`Bridge`] for tests.
///
/// Exchanges are consumed in order. A command that does not match the next
/// exchange, or arrives after the script is exhausted, fails with
/// [`Error::Protocol`].
#[derive(Debug, Clone, Default)]
pub struct MockBridge {
    state: Arc<Mutex<State>>,
}

impl MockBridge {
    /// Create an empty mock bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Box a clone of this bridge into a [`SharedBridge`].
    pub fn shared(&self) -> SharedBridge {
        share_bridge(Box::new(self.clone()))
    }

    /// Expect `hex_command` and answer with `reply`.
    pub fn expect(&self, hex_command: &str, reply: &str) {
        self.push(hex_command.to_string(), Outcome::Reply(reply.to_string()));
    }

    /// Expect the hex encoding of the ASCII `command` and answer with `reply`.
    pub fn expect_command(&self, command: &str, reply: &str) {
        self.push(hex::encode(command), Outcome::Reply(reply.to_string()));
    }

    /// Expect the hex encoding of `command` and fail with [`Error::Timeout`].
    pub fn expect_timeout_for(&self, command: &str) {
        self.push(hex::encode(command), Outcome::Timeout);
    }

    /// Expect the hex encoding of `command` and fail with
    /// [`Error::Transport`] carrying `message`.
    pub fn expect_failure_for(&self, command: &str, message: &str) {
        self.push(hex::encode(command), Outcome::Fail(message.to_string()));
    }

    /// Every hex command received so far, in order.
    pub fn sent_hex(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Every command received so far, decoded back to text.
    pub fn sent_commands(&self) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .map(|h| match hex::decode(h) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => h.clone(),
            })
            .collect()
    }

    /// Number of scripted exchanges not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.lock().exchanges.len()
    }

    fn push(&self, hex_command: String, outcome: Outcome) {
        self.lock().exchanges.push_back(Exchange {
            hex_command,
            outcome,
        });
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test poisons the lock; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Bridge for MockBridge {
    async fn send_and_receive(&mut self, hex_command: &str) -> Result<String> {
        let mut state = self.lock();
        state.sent.push(hex_command.to_string());

        let exchange = state
            .exchanges
            .pop_front()
            .ok_or_else(|| Error::Protocol("no more expectations in mock bridge".into()))?;

        if exchange.hex_command != hex_command {
            return Err(Error::Protocol(format!(
                "unexpected command: expected {}, got {}",
                exchange.hex_command, hex_command
            )));
        }

        match exchange.outcome {
            Outcome::Reply(reply) => Ok(reply),
            Outcome::Timeout => Err(Error::Timeout),
            Outcome::Fail(message) => Err(Error::Transport(message)),
        }
    }
}
