use crate::components::sprite::UvRect;
use crate::scene::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stops on the last frame.
    Once,
    #[default]
    Loop,
}

/// Flipbook animation over UV frames of its owner's [`Sprite`](super::Sprite).
#[derive(Debug, Clone)]
pub struct SpriteAnimator {
    pub(crate) owner: Option<NodeHandle>,

    frames: Vec<UvRect>,
    /// Seconds per frame.
    pub frame_duration: f32,
    pub loop_mode: LoopMode,
    pub time_scale: f32,
    pub playing: bool,

    time: f32,
    current: usize,
}

impl SpriteAnimator {
    #[must_use]
    pub fn new(frames: Vec<UvRect>, frame_duration: f32) -> Self {
        Self {
            owner: None,
            frames,
            frame_duration,
            loop_mode: LoopMode::Loop,
            time_scale: 1.0,
            playing: true,
            time: 0.0,
            current: 0,
        }
    }

    /// Builds frames from a horizontal strip of `count` equal cells.
    #[must_use]
    pub fn from_strip(count: usize, frame_duration: f32) -> Self {
        let count = count.max(1);
        let step = 1.0 / count as f32;
        let frames = (0..count)
            .map(|i| UvRect {
                min: glam::Vec2::new(i as f32 * step, 0.0),
                max: glam::Vec2::new((i + 1) as f32 * step, 1.0),
            })
            .collect();
        Self::new(frames, frame_duration)
    }

    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn current_uv(&self) -> Option<UvRect> {
        self.frames.get(self.current).copied()
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.time = 0.0;
        self.current = 0;
    }

    /// Advances playback; returns the new frame's UVs if the frame changed.
    pub fn advance(&mut self, dt: f32) -> Option<UvRect> {
        if !self.playing || self.frames.is_empty() || self.frame_duration <= 0.0 {
            return None;
        }

        let count = self.frames.len();
        self.time += dt * self.time_scale;
        if self.loop_mode == LoopMode::Loop {
            self.time %= self.frame_duration * count as f32;
        }
        let mut frame = (self.time / self.frame_duration) as usize;
        match self.loop_mode {
            LoopMode::Loop => frame %= count,
            LoopMode::Once => {
                if frame >= count {
                    frame = count - 1;
                    self.playing = false;
                }
            }
        }

        if frame == self.current {
            return None;
        }
        self.current = frame;
        self.current_uv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_wraps() {
        let mut anim = SpriteAnimator::from_strip(4, 0.1);
        assert!(anim.advance(0.05).is_none());
        assert!(anim.advance(0.1).is_some());
        assert_eq!(anim.current_frame(), 1);
        anim.advance(0.3);
        assert_eq!(anim.current_frame(), 0);
    }

    #[test]
    fn test_once_stops_on_last_frame() {
        let mut anim = SpriteAnimator::from_strip(3, 0.1);
        anim.loop_mode = LoopMode::Once;
        anim.advance(1.0);
        assert_eq!(anim.current_frame(), 2);
        assert!(!anim.playing);
    }
}
