// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command line surface and the immutable run configuration built from it.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::{Error, Result};
use crate::message::MessageDefaults;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5672;
pub const DEFAULT_VHOST: &str = "/";
pub const DEFAULT_USER: &str = "guest";
pub const DEFAULT_PASSWORD: &str = "guest";
pub const DEFAULT_APP_ID: &str = "rabbitstew";

pub const PASSWORD_PROMPT: &str = "RabbitMQ password: ";

// Everything but ASCII alphanumerics and `-._~` is escaped, `/` included.
const VHOST_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rabbitstew",
    version,
    about = "RabbitMQ message publisher",
    disable_version_flag = true
)]
pub struct Args {
    /// Server hostname
    #[arg(short = 'H', default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server port
    #[arg(short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Use SSL to connect
    #[arg(short = 's')]
    pub ssl: bool,

    /// Server virtual host
    #[arg(short = 'v', default_value = DEFAULT_VHOST)]
    pub vhost: String,

    /// Server username
    #[arg(short = 'u', default_value = DEFAULT_USER)]
    pub user: String,

    /// Server password
    #[arg(short = 'P', default_value = DEFAULT_PASSWORD, hide_default_value = true)]
    pub password: String,

    /// Prompt for password
    #[arg(short = 'W')]
    pub prompt: bool,

    /// Read password from a file
    #[arg(short = 'f', value_name = "PATH")]
    pub password_file: Option<PathBuf>,

    /// Exchange to publish to
    #[arg(short = 'e')]
    pub exchange: Option<String>,

    /// Routing Key to use
    #[arg(short = 'r')]
    pub routing_key: Option<String>,

    /// Confirm delivery of each message, exiting if a message delivery could
    /// not be confirmed
    #[arg(short = 'c')]
    pub confirm: bool,

    /// Include the user in the message properties
    #[arg(long)]
    pub add_user: bool,

    /// Specify the app-id property of the message
    #[arg(long, default_value = DEFAULT_APP_ID)]
    pub app_id: String,

    /// Create a unique message ID for each message
    #[arg(long)]
    pub auto_id: bool,

    /// Specify the content type of the message
    #[arg(long, value_name = "VALUE")]
    pub content_type: Option<String>,

    /// Specify the message type
    #[arg(long = "type")]
    pub message_type: Option<String>,

    /// Verbose output
    #[arg(short = 'V')]
    pub verbose: bool,

    /// Print version
    #[arg(long, action = ArgAction::Version)]
    version: (),
}

impl Args {
    /// Resolve the credential and freeze everything into a [`Config`].
    ///
    /// `prompt` is only called when `-W` was given.
    pub fn resolve<F>(self, prompt: F) -> Result<Config>
    where
        F: FnOnce() -> io::Result<String>,
    {
        let password = resolve_password(
            self.prompt,
            self.password_file.as_deref(),
            &self.password,
            prompt,
        )?;

        let defaults = MessageDefaults {
            app_id: self.app_id,
            content_type: self.content_type,
            message_type: self.message_type,
            user_id: self.add_user.then(|| self.user.clone()),
            auto_id: self.auto_id,
        };

        Ok(Config {
            host: self.host,
            port: self.port,
            ssl: self.ssl,
            vhost: self.vhost,
            user: self.user,
            password,
            exchange: self.exchange.unwrap_or_default(),
            routing_key: self.routing_key.unwrap_or_default(),
            confirm: self.confirm,
            verbose: self.verbose,
            defaults,
        })
    }
}

/// First matching source wins: prompt, then file, then the inline value.
pub fn resolve_password<F>(
    prompt: bool,
    password_file: Option<&Path>,
    inline: &str,
    read_prompt: F,
) -> Result<String>
where
    F: FnOnce() -> io::Result<String>,
{
    if prompt {
        return read_prompt().map_err(Error::Prompt);
    }
    if let Some(path) = password_file {
        let contents = fs::read_to_string(path).map_err(|source| Error::PasswordFile {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(contents.trim().to_string());
    }
    Ok(inline.to_string())
}

/// Masked interactive prompt on the controlling terminal.
pub fn prompt_password() -> io::Result<String> {
    rpassword::prompt_password(PASSWORD_PROMPT)
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub vhost: String,
    pub user: String,
    pub password: String,
    /// Empty means the broker's default exchange.
    pub exchange: String,
    pub routing_key: String,
    pub confirm: bool,
    pub verbose: bool,
    pub defaults: MessageDefaults,
}

impl Config {
    pub fn scheme(&self) -> &'static str {
        if self.ssl { "amqps" } else { "amqp" }
    }

    /// Connection target handed to the transport. Embeds the password: never
    /// log this, use [`Config::redacted_url`] instead.
    pub fn url(&self) -> String {
        self.url_with_password(&self.password)
    }

    pub fn redacted_url(&self) -> String {
        self.url_with_password("***")
    }

    /// Replace the connection target, and any stray copy of the password, in
    /// text coming back from the transport.
    pub fn redact(&self, text: &str) -> String {
        let text = text.replace(&self.url(), &self.redacted_url());
        if self.password.is_empty() {
            text
        } else {
            text.replace(&self.password, "***")
        }
    }

    fn url_with_password(&self, password: &str) -> String {
        format!(
            "{}://{}:{}@{}:{}/{}",
            self.scheme(),
            self.user,
            password,
            self.host,
            self.port,
            utf8_percent_encode(&self.vhost, VHOST_ESCAPE)
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("vhost", &self.vhost)
            .field("user", &self.user)
            .field("password", &"***")
            .field("exchange", &self.exchange)
            .field("routing_key", &self.routing_key)
            .field("confirm", &self.confirm)
            .field("verbose", &self.verbose)
            .field("defaults", &self.defaults)
            .finish()
    }
}
