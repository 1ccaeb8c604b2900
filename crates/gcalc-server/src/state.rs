//! Application state shared by all handlers.
//!
//! [`AppState`] holds the [`Session`] behind an `Arc`; the session locks its
//! own registry, so handlers never hold a lock across a compiler call. The
//! render loop runs as a separate task and publishes each frame into a watch
//! channel that `GET /frame` reads.

use std::sync::Arc;

use gcalc_render::{Frame, RenderScheduler, Viewport};
use gcalc_session::{ExpressionCompiler, Session};
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::error::ApiError;

pub struct AppState<C> {
    pub session: Arc<Session<C>>,
    /// Viewport the render loop reads on every tick.
    pub viewport: Arc<watch::Sender<Viewport>>,
    /// Latest presented frame; `None` until the first tick.
    pub frames: watch::Receiver<Option<Frame>>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        AppState {
            session: Arc::clone(&self.session),
            viewport: Arc::clone(&self.viewport),
            frames: self.frames.clone(),
        }
    }
}

impl<C: ExpressionCompiler + 'static> AppState<C> {
    /// Creates the session and spawns the render loop.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(compiler: C, config: &ServerConfig) -> Result<Self, ApiError> {
        let session = Arc::new(Session::new(compiler, config.session()));
        let (viewport_tx, viewport_rx) = watch::channel(Viewport::default());
        let (frame_tx, frame_rx) = watch::channel::<Option<Frame>>(None);

        let scheduler =
            RenderScheduler::new(session.feed().subscribe(), viewport_rx, config.scheduler())?;
        scheduler.spawn(frame_tx);
        tracing::info!(
            "render loop started at {} fps, texture width {}",
            config.frame_rate,
            config.texture_width
        );

        Ok(AppState {
            session,
            viewport: Arc::new(viewport_tx),
            frames: frame_rx,
        })
    }
}
