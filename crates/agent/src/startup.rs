use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use adapters::blocker::iptables::IptablesBlocker;
use adapters::blocker::noop::NoopBlocker;
use adapters::capture::parser::Prefilter;
use adapters::capture::sniffer::{self, run_capture};
use adapters::events::log_sink::FileEventSink;
use adapters::query::server::run_query_service;
use application::guard_service_impl::GuardAppService;
use domain::cidr::engine::CidrMatcher;
use domain::guard::engine::GuardEngine;
use infrastructure::config::{AgentConfig, BlockerBackend};
use infrastructure::logging::init_logging;
use ports::secondary::event_sink::GuardEventSink;
use ports::secondary::packet_blocker::PacketBlocker;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::Cli;

/// Run the agent startup sequence and block until shutdown.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    // ── 1. Config and logging ───────────────────────────────────────
    let config = AgentConfig::load(Path::new(&cli.config))?;
    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format)?;

    info!(
        config_path = %cli.config,
        version = env!("CARGO_PKG_VERSION"),
        "udpguard agent starting"
    );

    // ── 2. Static lists and detection engine ────────────────────────
    let blacklist = load_matcher(config.guard.blacklist_file.as_deref(), "blacklist")?;
    let exceptions = load_matcher(config.guard.exception_file.as_deref(), "exceptions")?;

    let mut engine = GuardEngine::new(config.guard.to_domain_policy());
    engine.set_lists(blacklist, exceptions);

    // ── 3. Adapters ─────────────────────────────────────────────────
    let blocker: Arc<dyn PacketBlocker> = match config.blocker.backend {
        BlockerBackend::Iptables => Arc::new(IptablesBlocker::new(config.blocker.chain.clone())),
        BlockerBackend::None => Arc::new(NoopBlocker),
    };
    let events: Arc<dyn GuardEventSink> =
        Arc::new(FileEventSink::open(Path::new(&config.agent.event_log)));

    let service = Arc::new(Mutex::new(GuardAppService::new(engine, blocker, events)));

    // ── 4. Interface whitelisting ───────────────────────────────────
    let interfaces = sniffer::select_interfaces(&config.agent.interfaces);
    if interfaces.is_empty() {
        anyhow::bail!(
            "no capture interface matched {:?}",
            config.agent.interfaces
        );
    }
    {
        let mut service = service.lock().unwrap();
        for iface in &interfaces {
            for addr in sniffer::interface_addresses(iface) {
                service.protect(addr);
            }
        }
    }

    // ── 5. Shutdown plumbing ────────────────────────────────────────
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            token.cancel();
        });
    }
    let stop_capture = Arc::new(AtomicBool::new(false));

    // ── 6. Query service ────────────────────────────────────────────
    let query_task = if config.query.enabled {
        Some(tokio::spawn(run_query_service(
            config.query.port,
            Arc::clone(&service),
            token.clone(),
        )))
    } else {
        None
    };

    // ── 7. Capture workers ──────────────────────────────────────────
    let prefilter = Prefilter::new(
        config.capture.min_port,
        config.capture.ignored_dst_ports.clone(),
    );
    let mut workers = Vec::with_capacity(interfaces.len());
    for iface in interfaces {
        let service = Arc::clone(&service);
        let prefilter = prefilter.clone();
        let stop = Arc::clone(&stop_capture);
        let iface_name = iface.name.clone();

        let handle = std::thread::Builder::new()
            .name(format!("capture-{iface_name}"))
            .spawn(move || {
                let result = run_capture(&iface, &prefilter, &stop, |addr, port| {
                    let mut service = service.lock().unwrap();
                    service.observe(addr, port);
                    service.purge();
                });
                if let Err(err) = result {
                    warn!(interface = %iface.name, %err, "capture worker exited with error");
                }
            })?;
        workers.push(handle);
        info!(interface = %iface_name, "capture started");
    }

    info!("firewall running");
    token.cancelled().await;
    info!("shutting down");

    // ── 8. Teardown: stop workers, release remaining bans ───────────
    stop_capture.store(true, Ordering::Relaxed);
    for worker in workers {
        let _ = worker.join();
    }
    if let Some(task) = query_task {
        let _ = task.await;
    }
    service.lock().unwrap().shutdown();
    info!("released remaining bans");
    Ok(())
}

/// Validate the configuration and CIDR list files without starting capture.
pub fn check(cli: &Cli) -> anyhow::Result<()> {
    let config = AgentConfig::load(Path::new(&cli.config))?;
    let blacklist = load_matcher(config.guard.blacklist_file.as_deref(), "blacklist")?;
    let exceptions = load_matcher(config.guard.exception_file.as_deref(), "exceptions")?;

    println!(
        "config ok: {} interface(s), {} blacklist prefix(es), {} exception prefix(es)",
        config.agent.interfaces.len(),
        blacklist.map_or(0, |m| m.len()),
        exceptions.map_or(0, |m| m.len()),
    );
    Ok(())
}

fn load_matcher(path: Option<&str>, list: &str) -> anyhow::Result<Option<CidrMatcher>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let matcher = CidrMatcher::load_path(Path::new(path))
        .map_err(|err| anyhow::anyhow!("loading {list} list from {path}: {err}"))?;
    info!(list, path, prefixes = matcher.len(), "CIDR list loaded");
    Ok(Some(matcher))
}

/// Resolve on the first SIGINT or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
