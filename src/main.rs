use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use nntp_slb::constants::listener::MAX_LISTENERS;
use nntp_slb::{Args, Dispatcher, ListenerSet, lifecycle, logging};

fn main() {
    let args = Args::parse();
    logging::init(&args.log_config());

    // Single reporting path for every fatal error: the rendered chain goes
    // to the configured sinks before the non-zero exit.
    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let listeners = ListenerSet::bind(&args.listen, MAX_LISTENERS)?;
    info!("bound {} listener(s)", listeners.len());

    if !args.is_foreground() {
        lifecycle::daemonize()?;
    }
    if let Some(path) = &args.pidfile {
        lifecycle::write_pidfile(path);
    }

    listeners.start_listening()?;
    lifecycle::ignore_sigpipe()?;
    lifecycle::notice_child_exits()?;

    let worker = args.worker_path();
    info!(
        "accepting connections, worker {}, backends {}",
        worker.display(),
        args.realservers
    );
    Dispatcher::new(listeners, worker, args.realservers).run()
}
