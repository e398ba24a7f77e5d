//! Frame timing and draw statistics

use std::collections::VecDeque;
use std::time::Duration;

use crate::graphics::EncoderStats;

const MAX_SAMPLES: usize = 120;

/// Rolling frame time window plus the last frame's encoder counters
#[derive(Debug)]
pub struct FrameStats {
    frame_times: VecDeque<Duration>,
    fps: f32,
    avg_frame_time_ms: f32,
    min_frame_time_ms: f32,
    max_frame_time_ms: f32,
    total_frames: u64,
    last_draw: EncoderStats,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(MAX_SAMPLES),
            fps: 0.0,
            avg_frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            total_frames: 0,
            last_draw: EncoderStats::default(),
        }
    }

    /// Record a frame with the given delta time
    pub fn record_frame(&mut self, delta: Duration) {
        self.total_frames += 1;

        if self.frame_times.len() >= MAX_SAMPLES {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(delta);

        self.update_stats();
    }

    pub fn record_draw(&mut self, stats: EncoderStats) {
        self.last_draw = stats;
    }

    fn update_stats(&mut self) {
        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;

        for &dt in &self.frame_times {
            total += dt;
            min = min.min(dt);
            max = max.max(dt);
        }

        let count = self.frame_times.len() as f32;
        let total_secs = total.as_secs_f32();
        if total_secs > 0.0 {
            self.avg_frame_time_ms = (total_secs / count) * 1000.0;
            self.fps = count / total_secs;
        } else {
            self.avg_frame_time_ms = 0.0;
            self.fps = 0.0;
        }

        self.min_frame_time_ms = min.as_secs_f32() * 1000.0;
        self.max_frame_time_ms = max.as_secs_f32() * 1000.0;
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn avg_frame_time_ms(&self) -> f32 {
        self.avg_frame_time_ms
    }

    pub fn min_frame_time_ms(&self) -> f32 {
        self.min_frame_time_ms
    }

    pub fn max_frame_time_ms(&self) -> f32 {
        self.max_frame_time_ms
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn last_draw(&self) -> &EncoderStats {
        &self.last_draw
    }

    pub fn format_stats(&self) -> String {
        format!(
            "FPS: {:.1} | Frame: {:.2}ms (min: {:.2}, max: {:.2}) | Submits: {} | Texture binds: {}",
            self.fps,
            self.avg_frame_time_ms,
            self.min_frame_time_ms,
            self.max_frame_time_ms,
            self.last_draw.submits,
            self.last_draw.texture_binds
        )
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_over_window() {
        let mut stats = FrameStats::new();
        stats.record_frame(Duration::from_millis(10));
        stats.record_frame(Duration::from_millis(30));
        assert_eq!(stats.total_frames(), 2);
        assert!((stats.avg_frame_time_ms() - 20.0).abs() < 0.01);
        assert!((stats.fps() - 50.0).abs() < 0.01);
        assert!((stats.min_frame_time_ms() - 10.0).abs() < 0.01);
        assert!((stats.max_frame_time_ms() - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_window_drops_oldest() {
        let mut stats = FrameStats::new();
        stats.record_frame(Duration::from_millis(100));
        for _ in 0..MAX_SAMPLES {
            stats.record_frame(Duration::from_millis(10));
        }
        assert!((stats.max_frame_time_ms() - 10.0).abs() < 0.01);
        assert_eq!(stats.total_frames(), MAX_SAMPLES as u64 + 1);
    }

    #[test]
    fn test_zero_delta_has_no_fps() {
        let mut stats = FrameStats::new();
        stats.record_frame(Duration::ZERO);
        assert!(stats.fps().abs() < 0.0001);
    }

    #[test]
    fn test_format_includes_draws() {
        let mut stats = FrameStats::new();
        stats.record_draw(EncoderStats {
            submits: 7,
            ..Default::default()
        });
        assert!(stats.format_stats().contains("Submits: 7"));
    }
}
