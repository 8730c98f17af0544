// src/animation.rs
use std::fs;
use std::path::{Path, PathBuf};

const SPRITE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

/// Frame clock for one state's sprite strip.
///
/// Pixels never pass through here: the renderer asks for `current_frame` and the
/// state machine asks `is_finished`.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    sprites_dir: Option<PathBuf>,
    frame_count: usize,
    fps: f64,
    looping: bool,
    frame_duration_ms: u64,
    start_time: Option<u64>,
    current_frame: usize,
    finished: bool,
}

impl Animation {
    pub fn new(frame_count: usize, fps: f64, looping: bool) -> Self {
        let frame_duration_ms = if fps > 0.0 { (1000.0 / fps) as u64 } else { 1000 };
        Animation {
            sprites_dir: None,
            frame_count: frame_count.max(1), // a missing strip still shows one (blank) frame
            fps,
            looping,
            frame_duration_ms: frame_duration_ms.max(1),
            start_time: None,
            current_frame: 0,
            finished: false,
        }
    }

    /// Counts the sprite files under `dir` to size the strip.
    pub fn from_sprites_dir(dir: &Path, fps: f64, looping: bool) -> Self {
        let frames = count_sprites(dir);
        let mut anim = Animation::new(frames, fps, looping);
        anim.sprites_dir = Some(dir.to_path_buf());
        anim
    }

    /// Same strip and timing, clock not started.
    pub fn fresh_copy(&self) -> Self {
        Animation {
            start_time: None,
            current_frame: 0,
            finished: false,
            sprites_dir: self.sprites_dir.clone(),
            ..*self
        }
    }

    pub fn reset(&mut self, start_time: u64) {
        self.start_time = Some(start_time);
        self.current_frame = 0;
        self.finished = false;
    }

    pub fn update(&mut self, now: u64) {
        if self.finished { return; }
        let Some(start) = self.start_time else {
            self.start_time = Some(now);
            return;
        };
        let target = (now.saturating_sub(start) / self.frame_duration_ms) as usize;
        if self.looping {
            self.current_frame = target % self.frame_count;
        } else if target >= self.frame_count {
            self.current_frame = self.frame_count - 1;
            self.finished = true;
        } else {
            self.current_frame = target;
        }
    }

    pub fn current_frame(&self) -> usize { self.current_frame }
    pub fn frame_count(&self) -> usize { self.frame_count }
    pub fn fps(&self) -> f64 { self.fps }
    pub fn is_looping(&self) -> bool { self.looping }
    pub fn is_finished(&self) -> bool { self.finished }
    pub fn sprites_dir(&self) -> Option<&Path> { self.sprites_dir.as_deref() }
}

fn count_sprites(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else { return 0 };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SPRITE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .count()
}
