use anyhow::{Result, anyhow};
use log::{info, trace, warn};
use std::{
    io::ErrorKind,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use evdev::Device;

use crate::driver::Session;
use crate::gestures::{ClassifierConfig, GestureEvent};
use crate::input::{self, MtDecoder};

pub struct WatchOptions {
    pub device: Option<String>,
    pub json: bool,
}

struct Source {
    path: String,
    dev: Device,
    decoder: MtDecoder,
}

/// Classify live touches until SIGINT/SIGTERM. Devices are read, never grabbed.
pub fn run_watch(cfg: ClassifierConfig, opts: &WatchOptions) -> Result<()> {
    let mut sources = open_sources(opts.device.as_deref())?;

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;

    let mut session = Session::new(cfg);
    info!("watching {} device(s); Ctrl-C to stop", sources.len());

    while !stop.load(Ordering::Relaxed) {
        let mut any_event = false;

        for src in sources.iter_mut() {
            let inputs = match src.dev.fetch_events() {
                Ok(events) => events
                    .flat_map(|ev| src.decoder.feed(&ev))
                    .collect::<Vec<_>>(),
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) => {
                    warn!("read from {} failed: {e}", src.path);
                    continue;
                }
            };
            for touch in inputs {
                any_event = true;
                session.handle(touch, Instant::now());
                trace!(
                    "{touch:?} -> {} ({} tracked)",
                    session.classifier().state(),
                    session.classifier().tracked_len()
                );
            }
        }

        session.poll(Instant::now());
        for ev in session.drain() {
            report(&ev, opts.json);
        }

        if !any_event {
            thread::sleep(Duration::from_millis(4));
        }
    }

    if let Some(h) = session.classifier().peek_committed() {
        info!("dropping unfinished {} gesture", h.as_str());
    }
    session.reset();
    info!("watch stopped");
    Ok(())
}

fn open_sources(explicit: Option<&str>) -> Result<Vec<Source>> {
    let paths: Vec<String> = match explicit {
        Some(p) => vec![p.to_string()],
        None => input::discover_multitouch()
            .into_iter()
            .map(|d| {
                info!("found {} ({})", d.name, d.path);
                d.path
            })
            .collect(),
    };
    if paths.is_empty() {
        return Err(anyhow!(
            "no multitouch devices detected (are you in the 'input' group? try `gesturectl doctor`)"
        ));
    }

    let mut out = vec![];
    for path in paths {
        match Device::open(&path) {
            Ok(mut dev) => {
                if !input::is_multitouch(&dev) {
                    warn!("{path} does not report MT slots; skipping");
                    continue;
                }
                if let Err(e) = dev.set_nonblocking(true) {
                    warn!("failed to set {path} non-blocking: {e}");
                    continue;
                }
                out.push(Source {
                    path,
                    dev,
                    decoder: MtDecoder::new(),
                });
            }
            Err(e) => warn!("failed to open {path}: {e}"),
        }
    }
    if out.is_empty() {
        return Err(anyhow!("failed to open any multitouch device"));
    }
    Ok(out)
}

fn report(ev: &GestureEvent, json: bool) {
    if json {
        match serde_json::to_string(ev) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("failed to encode event: {e}"),
        }
    } else {
        info!("{}", crate::cli::describe(ev));
    }
}
