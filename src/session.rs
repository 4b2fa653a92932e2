use crate::adapter::{adapt, EngineResult};
use crate::trackers::plate::{FrameReport, PlateTracker, TrackerSnapshot};
use anyhow::Result;
use log::{info, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) const PROGRESS_PERIODICITY: u64 = 100;

/// How many frames the session is allowed to process
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_frames: Option<u64>,
}

impl SessionLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn frames(n: u64) -> Self {
        Self { max_frames: Some(n) }
    }

    /// Limit for the first `seconds` of a stream with `fps` frames per second
    ///
    pub fn from_duration(fps: u64, seconds: u64) -> Self {
        Self::frames(fps * seconds)
    }
}

/// Why the session loop stopped
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Exhausted,
    FrameLimit,
    Interrupted,
}

/// Frame loop over engine results
///
/// Every frame is processed completely before an interruption or a limit is honored, and the
/// tracker state can be flushed with [`Session::finish`] however the loop stopped.
///
pub struct Session {
    tracker: PlateTracker,
    limits: SessionLimits,
    interrupted: Arc<AtomicBool>,
    frames: u64,
    failures: u64,
}

impl Session {
    pub fn new(tracker: PlateTracker, limits: SessionLimits) -> Self {
        Self {
            tracker,
            limits,
            interrupted: Arc::new(AtomicBool::new(false)),
            frames: 0,
            failures: 0,
        }
    }

    /// Flag that stops the loop before the next frame when set
    ///
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn tracker(&self) -> &PlateTracker {
        &self.tracker
    }

    /// Frames processed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames the engine failed to process
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self.interrupted.load(Ordering::SeqCst) {
            Some(StopReason::Interrupted)
        } else if matches!(self.limits.max_frames, Some(max) if self.frames >= max) {
            Some(StopReason::FrameLimit)
        } else {
            None
        }
    }

    /// Processes a single frame. Engine failures skip the tracking updates for the frame.
    ///
    pub fn step(&mut self, result: &EngineResult) -> FrameReport {
        self.frames += 1;
        match adapt(result, self.frames) {
            Ok(frame) => self.tracker.process_frame(frame.frame, &frame.detections),
            Err(e) => {
                self.failures += 1;
                warn!("Frame {}: {}", self.frames, e);
                self.tracker.skip_frame(self.frames)
            }
        }
    }

    /// Processes engine results until they end, the frame limit is reached or the session is interrupted.
    ///
    /// # Parameters
    /// * `results` - engine results, one per frame
    /// * `sink` - receives the report of every processed frame
    ///
    pub fn run<I, F>(&mut self, results: I, mut sink: F) -> StopReason
    where
        I: IntoIterator<Item = EngineResult>,
        F: FnMut(&FrameReport),
    {
        let mut results = results.into_iter();
        let reason = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }
            let result = match results.next() {
                Some(r) => r,
                None => break StopReason::Exhausted,
            };
            let report = self.step(&result);
            sink(&report);
            if self.frames % PROGRESS_PERIODICITY == 0 {
                info!(
                    "Processed {} frames, in: {}, out: {}",
                    self.frames,
                    self.tracker.incoming(),
                    self.tracker.outgoing()
                );
            }
        };
        info!(
            "Stopped after {} frames ({:?}), {} engine failures",
            self.frames, reason, self.failures
        );
        reason
    }

    /// Flushes the tracked plates, optionally persisting them to `ledger`
    ///
    pub fn finish(self, ledger: Option<&Path>) -> Result<TrackerSnapshot> {
        let snapshot = self.tracker.snapshot();
        info!(
            "{} vehicles tracked, in: {}, out: {}, plates: {:?}",
            snapshot.vehicles, snapshot.incoming, snapshot.outgoing, snapshot.plates
        );
        if let Some(path) = ledger {
            snapshot.persist(path)?;
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::EngineResult;
    use crate::session::{Session, SessionLimits, StopReason};
    use crate::test_stuff::{engine_payload, VehicleGen};
    use crate::trackers::plate::{PlateTracker, TrackerSnapshot};
    use std::sync::atomic::Ordering;

    fn stream(frames: u64) -> Vec<EngineResult> {
        let mut gen = VehicleGen::new("ABC123", 100.0, 300.0, 3.0);
        (1..=frames)
            .map(|frame| {
                let d = gen.next().unwrap();
                EngineResult::success(engine_payload(frame, &[d]))
            })
            .collect()
    }

    #[test]
    fn exhausted() {
        let mut session = Session::new(PlateTracker::default(), SessionLimits::unlimited());
        let mut reports = Vec::new();
        let reason = session.run(stream(30), |r| reports.push(r.clone()));
        assert_eq!(reason, StopReason::Exhausted);
        assert_eq!(reports.len(), 30);
        assert_eq!(session.frames(), 30);
        assert!(reports.iter().all(|r| r.vehicles.len() == 1 && r.vehicles[0].id == 1));
        assert_eq!(reports.last().unwrap().outgoing, 1);
        assert_eq!(reports[5].frame, 6);
    }

    #[test]
    fn frame_limit() {
        let mut session = Session::new(PlateTracker::default(), SessionLimits::from_duration(5, 2));
        let reason = session.run(stream(30), |_| {});
        assert_eq!(reason, StopReason::FrameLimit);
        assert_eq!(session.frames(), 10);
    }

    #[test]
    fn interrupted() {
        let mut session = Session::new(PlateTracker::default(), SessionLimits::unlimited());
        let handle = session.interrupt_handle();
        let mut processed = 0;
        let reason = session.run(stream(30), |_| {
            processed += 1;
            if processed == 3 {
                handle.store(true, Ordering::SeqCst);
            }
        });
        assert_eq!(reason, StopReason::Interrupted);
        assert_eq!(session.frames(), 3);
        let snapshot = session.finish(None).unwrap();
        assert_eq!(snapshot.plates, vec!["ABC123".to_string()]);
        assert_eq!(snapshot.vehicles, 1);
    }

    #[test]
    fn engine_failures_are_skipped() {
        let mut results = stream(6);
        results[2] = EngineResult::failure("busy");
        results[4] = EngineResult::success("{");
        let mut session = Session::new(PlateTracker::default(), SessionLimits::unlimited());
        let mut reports = Vec::new();
        session.run(results, |r| reports.push(r.clone()));

        assert_eq!(session.failures(), 2);
        assert_eq!(reports.len(), 6);
        assert!(reports[2].vehicles.is_empty());
        assert!(reports[4].vehicles.is_empty());
        assert_eq!(reports[5].vehicles[0].id, 1);
        assert_eq!(session.tracker().vehicles().len(), 1);
    }

    #[test]
    fn ledger() {
        let mut session = Session::new(PlateTracker::default(), SessionLimits::unlimited());
        session.run(stream(3), |_| {});
        let path = std::env::temp_dir().join(format!("ledger-{}.json", std::process::id()));
        let snapshot = session.finish(Some(path.as_path())).unwrap();
        let loaded: TrackerSnapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, snapshot);
        std::fs::remove_file(path).unwrap();
    }
}
