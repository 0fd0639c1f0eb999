// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pipe newline-delimited input to RabbitMQ, one message per line.
//!
//! ```text
//! cat /var/log/messages | rabbitstew -H rabbit-server -r syslog.messages
//! ```
//!
//! Transport: one AMQP connection and one channel for the whole run.
//! Message: body is the line minus trailing CR/LF; properties are rebuilt per
//!          message (timestamp, optional unique id, run-wide defaults).
//! Failure: any connection, publish or confirmation error ends the run.

pub mod amqp;
pub mod config;
pub mod error;
pub mod message;
pub mod publisher;

pub use amqp::AmqpTransport;
pub use config::{Args, Config};
pub use error::{Error, Result};
pub use message::{Envelope, MessageDefaults, Properties};
pub use publisher::{Confirmation, Progress, Publisher, Transport};
