use std::sync::Arc;

use crate::{
    bands::{self, BandSet},
    config::BeamConfig,
    render::Compositor,
    surface::{self, Surface, SurfaceGeometry, Viewport},
    timeline::{FrameDriver, FrameScheduler, FrameToken, ManualScheduler},
};

/// What happened to a frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was painted with this many draw commands.
    Rendered { commands: usize },
    /// Time advanced but nothing could be drawn (no surface bound, context
    /// unavailable or collapsed viewport). The next frame is still scheduled.
    Skipped,
    /// The callback was stale or the engine is stopped.
    Ignored,
}

/// One independent beam instance: its own bands, clock, geometry and
/// surface binding.
#[derive(Debug)]
pub struct BeamEngine<S, F = ManualScheduler> {
    config: BeamConfig,
    compositor: Compositor,
    bands: Arc<BandSet>,
    driver: FrameDriver<F>,
    surface: Option<S>,
    geometry: SurfaceGeometry,
}

impl<S: Surface, F: FrameScheduler> BeamEngine<S, F> {
    /// Builds the engine and generates its bands. Nothing is drawn until
    /// [`mount`](Self::mount).
    pub fn new(config: BeamConfig, scheduler: F) -> Self {
        let seed = config.seed.unwrap_or_else(bands::random_seed);
        let bands = BandSet::from_seed(seed, config.band_count, &config.bands);
        tracing::debug!(seed, band_count = bands.len(), "created beam engine");

        Self {
            compositor: Compositor::from_config(&config),
            config,
            bands: Arc::new(bands),
            driver: FrameDriver::new(scheduler),
            surface: None,
            geometry: SurfaceGeometry::new(Viewport::new(0.0, 0.0), 1.0),
        }
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    /// Snapshot of the current band set.
    pub fn bands(&self) -> Arc<BandSet> {
        Arc::clone(&self.bands)
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn driver(&self) -> &FrameDriver<F> {
        &self.driver
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        self.driver.scheduler_mut()
    }

    pub fn elapsed(&self) -> f64 {
        self.driver.clock().elapsed()
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Binds `surface`, sizes it for `viewport` and starts the frame loop.
    /// A previously bound surface is released first.
    pub fn mount(&mut self, surface: S, viewport: Viewport, pixel_ratio: f32) {
        if self.surface.is_some() {
            self.unmount();
        }
        let bound = self.surface.insert(surface);
        self.geometry = surface::resize(bound, viewport, pixel_ratio);
        self.driver.start();
        tracing::debug!(
            width = self.geometry.buffer_width,
            height = self.geometry.buffer_height,
            "mounted beam"
        );
    }

    /// Stops the frame loop and hands the surface back. Safe to call when
    /// nothing is mounted.
    pub fn unmount(&mut self) -> Option<S> {
        self.driver.stop();
        let surface = self.surface.take();
        if surface.is_some() {
            tracing::debug!("unmounted beam");
        }
        surface
    }

    /// Host notification that the viewport changed. Frames started after
    /// this call use the new geometry.
    pub fn on_viewport_resize(&mut self, viewport: Viewport, pixel_ratio: f32) {
        self.geometry = match self.surface.as_mut() {
            Some(bound) => surface::resize(bound, viewport, pixel_ratio),
            None => SurfaceGeometry::new(viewport, pixel_ratio),
        };
    }

    /// Replaces the whole band set. `None` draws a fresh seed.
    pub fn reseed(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or_else(bands::random_seed);
        let generation = self.bands.generation() + 1;
        let bands = BandSet::with_generation(
            seed,
            generation,
            self.config.band_count,
            &self.config.bands,
        );
        self.bands = Arc::new(bands);
        tracing::debug!(seed, generation, "reseeded bands");
    }

    /// Scheduler callback for the frame identified by `token`.
    pub fn tick(&mut self, token: FrameToken, now_ms: f64) -> FrameOutcome {
        match self.driver.begin_tick(token, now_ms) {
            Some(time) => self.finish_frame(time),
            None => FrameOutcome::Ignored,
        }
    }

    /// Advances by a fixed step and paints, bypassing host timestamps.
    pub fn step(&mut self, delta: f32) -> FrameOutcome {
        match self.driver.begin_step(delta) {
            Some(time) => self.finish_frame(time),
            None => FrameOutcome::Ignored,
        }
    }

    fn finish_frame(&mut self, time: f64) -> FrameOutcome {
        let outcome = self.render(time);
        self.driver.end_tick();
        outcome
    }

    fn render(&mut self, time: f64) -> FrameOutcome {
        let bands = Arc::clone(&self.bands);
        let geometry = self.geometry;
        let Some(surface) = self.surface.as_mut() else {
            tracing::trace!("no surface bound, skipping frame");
            return FrameOutcome::Skipped;
        };
        if !surface.is_ready() || !geometry.is_drawable() {
            tracing::trace!(
                width = geometry.buffer_width,
                height = geometry.buffer_height,
                "surface not ready, skipping frame"
            );
            return FrameOutcome::Skipped;
        }

        let commands = self
            .compositor
            .render_frame(surface, &bands, time, &geometry);
        tracing::trace!(time, commands, "rendered frame");
        FrameOutcome::Rendered { commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, PixmapSurface, RecordingSurface};

    fn engine(band_count: usize, seed: u64) -> BeamEngine<RecordingSurface> {
        let config = BeamConfig {
            band_count,
            ..BeamConfig::seeded(seed)
        };
        BeamEngine::new(config, ManualScheduler::new())
    }

    fn strokes(commands: &[DrawCommand]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokePolyline { .. }))
            .count()
    }

    #[test]
    fn sixty_fixed_steps_render_every_frame() {
        let mut engine = engine(4, 21);
        engine.mount(RecordingSurface::new(), Viewport::new(400.0, 200.0), 1.0);

        for _ in 0..60 {
            let outcome = engine.step(0.016);
            assert!(matches!(outcome, FrameOutcome::Rendered { commands } if commands > 0));
            let surface = engine.surface().unwrap();
            assert!(!surface.commands().is_empty());
            assert_eq!(strokes(surface.commands()), 8);
        }

        assert!((engine.elapsed() - 0.96).abs() < 1e-4);
        assert_eq!(engine.surface().unwrap().frames(), 60);
    }

    #[test]
    fn scheduled_ticks_drive_the_loop() {
        let mut engine = engine(4, 21);
        engine.mount(RecordingSurface::new(), Viewport::new(400.0, 200.0), 1.0);

        let mut now = 0.0;
        for _ in 0..10 {
            let token = engine.scheduler_mut().pending().unwrap();
            assert!(matches!(
                engine.tick(token, now),
                FrameOutcome::Rendered { .. }
            ));
            now += 16.0;
        }

        assert!((engine.elapsed() - 0.144).abs() < 1e-4);
    }

    #[test]
    fn stall_advances_at_most_max_delta() {
        let mut engine = engine(4, 2);
        engine.mount(RecordingSurface::new(), Viewport::new(100.0, 100.0), 1.0);

        let token = engine.scheduler_mut().pending().unwrap();
        engine.tick(token, 1_000.0);
        let token = engine.scheduler_mut().pending().unwrap();
        engine.tick(token, 11_000.0);

        assert!((engine.elapsed() - f64::from(crate::timeline::MAX_DELTA)).abs() < 1e-6);
    }

    #[test]
    fn unmount_is_idempotent_and_stops_frames() {
        let mut engine = engine(4, 2);
        engine.mount(RecordingSurface::new(), Viewport::new(100.0, 100.0), 1.0);
        let token = engine.scheduler_mut().pending().unwrap();

        assert!(engine.unmount().is_some());
        assert!(engine.unmount().is_none());

        assert!(!engine.is_running());
        assert_eq!(engine.tick(token, 16.0), FrameOutcome::Ignored);
        assert_eq!(engine.step(0.016), FrameOutcome::Ignored);
        assert!(engine.scheduler_mut().pending().is_none());
        assert_eq!(engine.scheduler_mut().cancelled(), 1);
    }

    #[test]
    fn resize_applies_to_the_next_frame() {
        let mut engine = engine(4, 2);
        engine.mount(RecordingSurface::new(), Viewport::new(100.0, 100.0), 1.0);
        engine.step(0.016);

        engine.on_viewport_resize(Viewport::new(800.0, 400.0), 2.0);
        assert_eq!(engine.geometry().buffer_width, 1600);
        assert_eq!(engine.geometry().buffer_height, 800);
        assert_eq!(engine.surface().unwrap().size(), (1600, 800));

        engine.step(0.016);
        let commands = engine.surface().unwrap().commands();
        let last_x = commands.iter().find_map(|c| match c {
            DrawCommand::StrokePolyline { points, .. } => points.last().map(|p| p.x),
            _ => None,
        });
        assert_eq!(last_x, Some(1600.0));
    }

    #[test]
    fn unavailable_surface_skips_and_retries() {
        let mut engine = engine(4, 2);
        let mut surface = RecordingSurface::new();
        surface.set_available(false);
        engine.mount(surface, Viewport::new(100.0, 100.0), 1.0);

        assert_eq!(engine.step(0.016), FrameOutcome::Skipped);
        assert!(engine.scheduler_mut().pending().is_some());

        engine.surface_mut().unwrap().set_available(true);
        assert!(matches!(engine.step(0.016), FrameOutcome::Rendered { .. }));
    }

    #[test]
    fn collapsed_viewport_skips_frames() {
        let mut engine = engine(4, 2);
        engine.mount(RecordingSurface::new(), Viewport::new(0.0, 0.0), 1.0);
        assert_eq!(engine.step(0.016), FrameOutcome::Skipped);

        engine.on_viewport_resize(Viewport::new(50.0, 20.0), 1.0);
        assert!(matches!(engine.step(0.016), FrameOutcome::Rendered { .. }));
    }

    #[test]
    fn reseed_swaps_the_whole_set() {
        let mut engine = engine(28, 5);
        engine.mount(RecordingSurface::new(), Viewport::new(200.0, 100.0), 1.0);
        let before = engine.bands();

        engine.step(0.016);
        engine.reseed(Some(6));
        engine.step(0.016);

        let after = engine.bands();
        assert_eq!(before.len(), 28);
        assert_eq!(after.len(), 28);
        assert_eq!(after.generation(), before.generation() + 1);
        assert_ne!(before.bands(), after.bands());
        assert_eq!(strokes(engine.surface().unwrap().commands()), 56);
    }

    #[test]
    fn instances_are_independent() {
        let mut a = engine(4, 1);
        let mut b = engine(4, 2);
        a.mount(RecordingSurface::new(), Viewport::new(100.0, 50.0), 1.0);
        b.mount(RecordingSurface::new(), Viewport::new(300.0, 80.0), 2.0);

        a.step(0.02);
        a.step(0.02);
        b.step(0.01);

        assert!((a.elapsed() - 0.04).abs() < 1e-6);
        assert!((b.elapsed() - 0.01).abs() < 1e-6);
        assert_ne!(a.bands().bands(), b.bands().bands());
        assert_eq!(a.geometry().buffer_width, 100);
        assert_eq!(b.geometry().buffer_width, 600);
    }

    #[test]
    fn raster_frames_have_visible_content() {
        let config = BeamConfig {
            band_count: 4,
            ..BeamConfig::seeded(8)
        };
        let mut engine: BeamEngine<PixmapSurface> = BeamEngine::new(config, ManualScheduler::new());
        engine.mount(PixmapSurface::new(), Viewport::new(120.0, 60.0), 1.0);

        for _ in 0..3 {
            engine.step(0.016);
        }

        assert!(engine.surface().unwrap().lit_pixels() > 0);
    }
}
