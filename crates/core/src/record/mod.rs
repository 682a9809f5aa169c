use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    engine::{BeamEngine, FrameOutcome},
    surface::PixmapSurface,
    timeline::FrameScheduler,
    BeamError, Result,
};

/// Configuration options for headless frame export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub output_dir: PathBuf,
    pub fps: u32,
    pub frames: u32,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "frame".to_string()
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("frames"),
            fps: 60,
            frames: 60,
            prefix: default_prefix(),
        }
    }
}

impl RecordingSettings {
    /// Lowest rate whose frame step fits inside
    /// [`MAX_DELTA`](crate::timeline::MAX_DELTA). Slower rates
    /// would be clamped and play back slower than real time.
    pub const MIN_FPS: u32 = 20;

    /// Simulated seconds between two recorded frames.
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps < Self::MIN_FPS {
            return Err(BeamError::msg(format!(
                "fps must be at least {}, got {}",
                Self::MIN_FPS,
                self.fps
            )));
        }
        Ok(())
    }
}

/// Writes rasterised frames to a numbered PNG sequence.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    settings: RecordingSettings,
    is_recording: bool,
    written: usize,
}

impl FrameRecorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            is_recording: false,
            written: 0,
        }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn start(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.settings.output_dir)?;
        self.is_recording = true;
        self.written = 0;
        tracing::debug!(dir = ?self.settings.output_dir, "recording started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.is_recording {
            tracing::debug!(frames = self.written, "recording stopped");
        }
        self.is_recording = false;
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames_written(&self) -> usize {
        self.written
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("{}_{index:05}.png", self.settings.prefix))
    }

    /// Saves the current contents of `surface` as the next frame.
    pub fn capture(&mut self, surface: &PixmapSurface) -> Result<PathBuf> {
        if !self.is_recording {
            return Err(BeamError::msg("recorder has not been started"));
        }
        let path = self.frame_path(self.written);
        surface.save_png(&path)?;
        self.written += 1;
        Ok(path)
    }

    /// Steps `engine` at the configured frame rate and captures every frame
    /// that was actually painted. Returns the number of files written.
    pub fn record<F: FrameScheduler>(
        &mut self,
        engine: &mut BeamEngine<PixmapSurface, F>,
    ) -> Result<usize> {
        self.settings.validate()?;
        self.start()?;
        let delta = self.settings.frame_delta();
        for _ in 0..self.settings.frames {
            if let FrameOutcome::Rendered { .. } = engine.step(delta) {
                if let Some(surface) = engine.surface() {
                    self.capture(surface)?;
                }
            }
        }
        self.stop()?;
        Ok(self.written)
    }
}

/// Removes every file of a previous run that matches the recorder's naming.
pub fn clear_previous(dir: &Path, prefix: &str) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(&format!("{prefix}_")) && name.ends_with(".png"))
            .unwrap_or(false);
        if matches {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
