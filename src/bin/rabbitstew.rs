// SPDX-License-Identifier: AGPL-3.0-or-later
use std::io;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use rabbitstew::config::prompt_password;
use rabbitstew::{AmqpTransport, Args, Config, Progress, Publisher, Result};

fn main() -> ExitCode {
    // By default emit warnings
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
            let _ = e.print();
            return code;
        }
    };

    match args.resolve(prompt_password).and_then(|config| run(&config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<()> {
    debug!("resolved {:?}", config);

    let mut progress = Progress::stdout(config.verbose);
    progress.log(format_args!("Connecting to RabbitMQ"));
    let transport = AmqpTransport::open(config)?;

    let mut publisher = Publisher::start(transport, config, progress)?;
    publisher.run(io::stdin().lock())?;
    publisher.close()?;
    Ok(())
}
