//! Render Scheduler: the fixed-rate draw loop.
//!
//! Every tick first checks the program feed's dirty flag. If set, the flag is
//! cleared and the program is rebuilt and repacked before anything else
//! happens. Then one frame is presented unconditionally, so viewport changes
//! animate even when no equation changed. A rebuild never waits on the
//! compiler; it only encodes what the feed already holds.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::EncodeError;
use crate::feed::FeedValue;
use crate::program::{encode, RenderProgram};
use crate::texture::{pack, EncoderConfig, ProgramTexture};
use crate::viewport::Viewport;

/// Frame rate used when none is configured.
pub const DEFAULT_FRAME_RATE: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target frames per second.
    pub frame_rate: u32,
    pub encoder: EncoderConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            frame_rate: DEFAULT_FRAME_RATE,
            encoder: EncoderConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

/// Everything the shading stage needs for one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub number: u64,
    pub program: Arc<RenderProgram>,
    pub texture: Arc<ProgramTexture>,
    pub viewport: Viewport,
    /// True if the program was rebuilt for this frame.
    pub rebuilt: bool,
}

/// Receives every frame the scheduler produces.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Frame);
}

/// Keeps only the latest frame, for readers outside the loop.
impl FrameSink for watch::Sender<Option<Frame>> {
    fn present(&mut self, frame: &Frame) {
        self.send_replace(Some(frame.clone()));
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Presented { rebuilt: bool },
    /// The program feed is gone; the session has ended.
    Closed,
}

/// Totals reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub frames: u64,
    pub rebuilds: u64,
}

/// Counts frames and reports a rate once per elapsed second.
#[derive(Debug)]
struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    fn new(now: Instant) -> Self {
        FpsCounter {
            window_start: now,
            frames: 0,
        }
    }

    fn frame(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.duration_since(self.window_start) >= Duration::from_secs(1) {
            let fps = self.frames;
            self.window_start = now;
            self.frames = 0;
            Some(fps)
        } else {
            None
        }
    }
}

pub struct RenderScheduler {
    programs: watch::Receiver<FeedValue>,
    viewport: watch::Receiver<Viewport>,
    config: SchedulerConfig,
    program: Arc<RenderProgram>,
    texture: Arc<ProgramTexture>,
    stats: RenderStats,
    fps: FpsCounter,
}

impl RenderScheduler {
    /// Builds the scheduler and encodes the feed's current program.
    pub fn new(
        mut programs: watch::Receiver<FeedValue>,
        viewport: watch::Receiver<Viewport>,
        config: SchedulerConfig,
    ) -> Result<Self, EncodeError> {
        let program = encode(&programs.borrow_and_update().snapshot)?;
        let texture = pack(&program, &config.encoder)?;
        Ok(RenderScheduler {
            programs,
            viewport,
            config,
            program: Arc::new(program),
            texture: Arc::new(texture),
            stats: RenderStats::default(),
            fps: FpsCounter::new(Instant::now()),
        })
    }

    pub fn program(&self) -> &Arc<RenderProgram> {
        &self.program
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Rebuilds if dirty, then presents one frame.
    pub fn tick<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Tick {
        let dirty = match self.programs.has_changed() {
            Ok(dirty) => dirty,
            Err(_) => return Tick::Closed,
        };

        let rebuilt = dirty && self.rebuild();

        let frame = Frame {
            number: self.stats.frames,
            program: Arc::clone(&self.program),
            texture: Arc::clone(&self.texture),
            viewport: *self.viewport.borrow(),
            rebuilt,
        };
        sink.present(&frame);
        self.stats.frames += 1;

        if let Some(fps) = self.fps.frame(Instant::now()) {
            tracing::info!("FPS: {} ({} slots)", fps, self.program.slots().len());
        }

        Tick::Presented { rebuilt }
    }

    /// Clears the dirty flag and re-encodes. On failure the previous program
    /// stays current.
    fn rebuild(&mut self) -> bool {
        let encoded = {
            let value = self.programs.borrow_and_update();
            encode(&value.snapshot)
                .and_then(|program| pack(&program, &self.config.encoder).map(|t| (program, t)))
        };

        match encoded {
            Ok((program, texture)) => {
                tracing::debug!(
                    "rebuilt program: {} slots, {} instructions",
                    program.slots().len(),
                    program.instructions().len()
                );
                self.program = Arc::new(program);
                self.texture = Arc::new(texture);
                self.stats.rebuilds += 1;
                true
            }
            Err(err) => {
                tracing::warn!("program rebuild failed, keeping previous program: {}", err);
                false
            }
        }
    }

    /// Runs the loop at the configured frame rate until the feed closes.
    pub async fn run<S: FrameSink>(mut self, mut sink: S) -> RenderStats {
        let mut interval = tokio::time::interval(self.config.frame_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if self.tick(&mut sink) == Tick::Closed {
                break;
            }
        }

        tracing::info!(
            "render loop stopped after {} frames, {} rebuilds",
            self.stats.frames,
            self.stats.rebuilds
        );
        self.stats
    }

    /// Spawns [`RenderScheduler::run`] on the current runtime.
    pub fn spawn<S: FrameSink + 'static>(self, sink: S) -> tokio::task::JoinHandle<RenderStats> {
        tokio::spawn(self.run(sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ProgramFeed;
    use crate::program::{ProgramEntry, ProgramSnapshot};
    use gcalc_core::{CompiledArtifact, EquationId, HslColor, Instruction};

    #[derive(Default)]
    struct Recorder(Vec<Frame>);

    impl FrameSink for Recorder {
        fn present(&mut self, frame: &Frame) {
            self.0.push(frame.clone());
        }
    }

    fn one_equation() -> ProgramSnapshot {
        ProgramSnapshot::new(vec![ProgramEntry {
            id: EquationId(0),
            artifact: Arc::new(
                CompiledArtifact::new("", vec![Instruction::PushX, Instruction::Store]).unwrap(),
            ),
            color: HslColor::default(),
            visible: true,
        }])
    }

    fn scheduler(feed: &ProgramFeed) -> (RenderScheduler, watch::Sender<Viewport>) {
        let (viewport_tx, viewport_rx) = watch::channel(Viewport::default());
        let scheduler =
            RenderScheduler::new(feed.subscribe(), viewport_rx, SchedulerConfig::default())
                .unwrap();
        (scheduler, viewport_tx)
    }

    #[test]
    fn presents_every_tick_and_rebuilds_only_when_dirty() {
        let feed = ProgramFeed::new();
        let (mut scheduler, _viewport) = scheduler(&feed);
        let mut sink = Recorder::default();

        assert_eq!(scheduler.tick(&mut sink), Tick::Presented { rebuilt: false });
        feed.publish(one_equation());
        assert_eq!(scheduler.tick(&mut sink), Tick::Presented { rebuilt: true });
        assert_eq!(scheduler.tick(&mut sink), Tick::Presented { rebuilt: false });

        assert_eq!(sink.0.len(), 3);
        assert!(sink.0[0].program.is_empty());
        assert_eq!(sink.0[2].program.slots().len(), 1);
        assert_eq!(scheduler.stats(), RenderStats { frames: 3, rebuilds: 1 });
    }

    #[test]
    fn viewport_changes_repaint_without_rebuild() {
        let feed = ProgramFeed::new();
        let (mut scheduler, viewport) = scheduler(&feed);
        let mut sink = Recorder::default();

        viewport.send_modify(|v| v.pan(5, 5));
        assert_eq!(scheduler.tick(&mut sink), Tick::Presented { rebuilt: false });
        assert_eq!(sink.0[0].viewport.origin, (5, 5));
    }

    #[test]
    fn initial_program_is_encoded_at_construction() {
        let feed = ProgramFeed::new();
        feed.publish(one_equation());
        let (mut scheduler, _viewport) = scheduler(&feed);
        assert_eq!(scheduler.program().slots().len(), 1);
        let mut sink = Recorder::default();
        assert_eq!(scheduler.tick(&mut sink), Tick::Presented { rebuilt: false });
    }

    #[test]
    fn closed_feed_stops_ticking() {
        let feed = ProgramFeed::new();
        let (mut scheduler, _viewport) = scheduler(&feed);
        drop(feed);
        let mut sink = Recorder::default();
        assert_eq!(scheduler.tick(&mut sink), Tick::Closed);
        assert!(sink.0.is_empty());
    }

    #[tokio::test]
    async fn run_exits_when_feed_closes() {
        let feed = ProgramFeed::new();
        let (viewport_tx, viewport_rx) = watch::channel(Viewport::default());
        let config = SchedulerConfig {
            frame_rate: 200,
            ..SchedulerConfig::default()
        };
        let scheduler = RenderScheduler::new(feed.subscribe(), viewport_rx, config).unwrap();
        let (frame_tx, frame_rx) = watch::channel::<Option<Frame>>(None);
        let handle = scheduler.spawn(frame_tx);

        feed.publish(one_equation());
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(feed);

        let stats = handle.await.unwrap();
        assert!(stats.frames > 0);
        assert_eq!(stats.rebuilds, 1);
        assert!(frame_rx.borrow().is_some());
        drop(viewport_tx);
    }

    #[test]
    fn fps_counter_reports_once_per_second() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        assert_eq!(fps.frame(start + Duration::from_millis(500)), None);
        assert_eq!(fps.frame(start + Duration::from_millis(1000)), Some(2));
        assert_eq!(fps.frame(start + Duration::from_millis(1500)), None);
    }
}
