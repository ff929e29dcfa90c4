//! Running frame and inference-time statistics.

use std::time::Instant;
use tracing::debug;

/// Per-stream counters updated once per transformed frame.
///
/// Produces two preformatted overlay lines, one for inference timing
/// and one for video throughput.
#[derive(Debug, Default)]
pub struct FrameStats {
    started: Option<Instant>,
    frame_count: u64,
    uptime: f64,
    fps: f64,
    inference_time_cur: f64,
    inference_time_total: f64,
    inference_time_avg: f64,
    inference_line: String,
    fps_line: String,
}

impl FrameStats {
    /// Fresh, unstarted counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the inference wall time of the current frame, in
    /// milliseconds.
    pub fn record_inference_time(&mut self, millis: f64) {
        self.inference_time_cur = millis;
    }

    /// Account one transformed frame of the given output size.
    ///
    /// The first call only starts the clock; averages accumulate from
    /// the second frame on.
    pub fn tick(&mut self, width: u32, height: u32) {
        match self.started {
            Some(start) => {
                self.frame_count += 1;
                self.uptime = start.elapsed().as_secs_f64();
                self.fps = self.frame_count as f64 / self.uptime.max(f64::EPSILON);
                self.inference_time_total += self.inference_time_cur;
                self.inference_time_avg = self.inference_time_total / self.frame_count as f64;
            }
            None => {
                self.started = Some(Instant::now());
                self.frame_count = 0;
                self.uptime = 0.0;
                self.fps = 0.0;
                self.inference_time_total = 0.0;
                self.inference_time_avg = 0.0;
            }
        }

        let inference_fps = if self.inference_time_avg > 0.0 {
            1000.0 / self.inference_time_avg
        } else {
            0.0
        };
        self.inference_line = format!(
            "Inference time Avg: {:6.3}ms, Cur: {:6.3}ms ({:.1}fps)",
            self.inference_time_avg, self.inference_time_cur, inference_fps
        );
        self.fps_line = format!(
            "Video: {:6.3}fps (Res: {}x{}, Frame: {}, Uptime: {:.3}s)",
            self.fps, width, height, self.frame_count, self.uptime
        );
        debug!("{}, {}", self.inference_line, self.fps_line);
    }

    /// Frames accounted so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average frames per second since the clock started.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Average inference time per frame, in milliseconds.
    pub fn inference_time_avg(&self) -> f64 {
        self.inference_time_avg
    }

    /// Overlay line describing inference timing.
    pub fn inference_line(&self) -> &str {
        &self.inference_line
    }

    /// Overlay line describing video throughput.
    pub fn fps_line(&self) -> &str {
        &self.fps_line
    }
}
