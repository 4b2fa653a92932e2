//! Replays recognition engine results dumped as JSON lines, one frame per line.
//!
//! A line is either the engine payload or `{"ok": false, "phrase": "..."}` for a failed frame.
//! Ctrl-C stops the replay after the current frame, the plates are written anyway.
//!
//! ```text
//! cargo run --example replay -- results.jsonl [max_frames] [options.json]
//! ```

use alpr_tracker::prelude::*;
use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::Ordering;

fn engine_result(line: &str) -> EngineResult {
    match serde_json::from_str::<Value>(line) {
        Ok(v) if v.get("ok") == Some(&Value::Bool(false)) => EngineResult::failure(
            v.get("phrase")
                .and_then(Value::as_str)
                .unwrap_or("unknown failure"),
        ),
        _ => EngineResult::success(line),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args.next().context("Path to the engine results is required")?;
    let limits = match args.next() {
        Some(n) => SessionLimits::frames(n.parse().context("Invalid frame limit")?),
        None => SessionLimits::unlimited(),
    };
    let opts = match args.next() {
        Some(path) => PlateTrackerOptions::from_json(
            &std::fs::read_to_string(&path).with_context(|| format!("Unable to read {}", path))?,
        )?,
        None => PlateTrackerOptions::default(),
    };

    info!("Processing engine results from {}", input);
    let reader = BufReader::new(File::open(&input).with_context(|| format!("Unable to open {}", input))?);
    let results = reader
        .lines()
        .enumerate()
        .map_while(|(n, l)| match l {
            Ok(l) => Some(l),
            Err(e) => {
                warn!("{}:{}: replay truncated, {}", input, n + 1, e);
                None
            }
        })
        .filter(|l| !l.trim().is_empty())
        .map(|l| engine_result(&l));

    let mut session = Session::new(PlateTracker::new(opts)?, limits);
    let interrupted = session.interrupt_handle();
    ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
    })
    .context("Unable to install the Ctrl-C handler")?;

    let reason = session.run(results, |report| {
        let texts = report
            .vehicles
            .iter()
            .map(|v| format!("{}#{} {:.2}", v.text, v.id, v.speed))
            .collect::<Vec<_>>();
        println!(
            "frame {}: out: {} in: {} {:?}",
            report.frame, report.outgoing, report.incoming, texts
        );
    });
    info!("Stopped: {:?}", reason);

    let snapshot = session.finish(Some(Path::new("numberplates.json")))?;
    println!("{:?}", snapshot.plates);
    Ok(())
}
