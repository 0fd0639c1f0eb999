// SPDX-License-Identifier: AGPL-3.0-or-later
//! The per-line publish loop.
//!
//! A [`Publisher`] owns the connected transport for the whole run:
//! `start` (connected, confirm mode set up) -> `run` / `publish_line`
//! (publishing) -> `close` (closed). An error from any step ends the run;
//! nothing is retried and messages already sent stay sent.

use std::fmt;
use std::io::{self, BufRead, Write};

use log::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::message::{Envelope, MessageDefaults};

/// Broker verdict on a single confirmed publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Ack,
    Nack,
}

/// What the publish loop needs from a messaging client. One connection and
/// one channel sit behind it.
pub trait Transport {
    /// Put the channel into publisher-confirm mode.
    fn enable_confirms(&mut self) -> Result<()>;

    /// Fail with [`Error::TargetNotFound`] if `exchange` does not exist.
    fn check_exchange(&mut self, exchange: &str) -> Result<()>;

    fn publish(&mut self, exchange: &str, routing_key: &str, envelope: &Envelope) -> Result<()>;

    /// Block until the broker confirms the last published message. Only
    /// valid after [`Transport::enable_confirms`].
    fn wait_for_confirm(&mut self) -> Result<Confirmation>;

    fn close(self) -> Result<()>;
}

/// Sink for `-V` progress lines. Off unless verbose.
pub struct Progress {
    out: Option<Box<dyn Write>>,
}

impl Progress {
    pub fn stdout(verbose: bool) -> Self {
        let out: Option<Box<dyn Write>> = if verbose {
            Some(Box::new(io::stdout()))
        } else {
            None
        };
        Self { out }
    }

    pub fn quiet() -> Self {
        Self { out: None }
    }

    pub fn to_writer<W: Write + 'static>(writer: W) -> Self {
        Self {
            out: Some(Box::new(writer)),
        }
    }

    pub fn log(&mut self, args: fmt::Arguments<'_>) {
        debug!("{}", args);
        if let Some(out) = self.out.as_mut() {
            // Write failures are ignored.
            let _ = writeln!(out, "{}", args);
            let _ = out.flush();
        }
    }
}

pub struct Publisher<T: Transport> {
    transport: T,
    exchange: String,
    routing_key: String,
    defaults: MessageDefaults,
    confirm: bool,
    progress: Progress,
    published: u64,
}

impl<T: Transport> Publisher<T> {
    /// Take over a freshly connected transport and prepare it for publishing.
    pub fn start(mut transport: T, config: &Config, mut progress: Progress) -> Result<Self> {
        if !config.exchange.is_empty() {
            transport.check_exchange(&config.exchange)?;
        }

        if config.confirm {
            transport.enable_confirms()?;
            progress.log(format_args!("Publisher confirmation enabled"));
        }

        progress.log(format_args!("Connected"));

        Ok(Self {
            transport,
            exchange: config.exchange.clone(),
            routing_key: config.routing_key.clone(),
            defaults: config.defaults.clone(),
            confirm: config.confirm,
            progress,
            published: 0,
        })
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    /// Publish every line of `input` in order until end of stream.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> Result<u64> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = input.read_until(b'\n', &mut line).map_err(Error::Input)?;
            if n == 0 {
                break;
            }
            self.publish_line(&line)?;
        }
        Ok(self.published)
    }

    pub fn publish_line(&mut self, line: &[u8]) -> Result<()> {
        let envelope = Envelope::from_line(line, &self.defaults);

        self.transport
            .publish(&self.exchange, &self.routing_key, &envelope)?;

        if self.confirm && self.transport.wait_for_confirm()? == Confirmation::Nack {
            return Err(Error::Unconfirmed);
        }

        self.published += 1;
        self.progress
            .log(format_args!("Message #{} published", self.published));
        Ok(())
    }

    /// Close the connection and report how many messages went out.
    pub fn close(self) -> Result<u64> {
        let Self {
            transport,
            mut progress,
            published,
            ..
        } = self;

        transport.close()?;
        progress.log(format_args!("Closed RabbitMQ connection"));
        progress.log(format_args!("Published {} messages", published));
        Ok(published)
    }
}
