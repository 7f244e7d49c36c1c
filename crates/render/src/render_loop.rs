use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, info, info_span};

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// The frame returned an error or panicked; the loop carries on.
    Dropped,
    /// The loop had been stopped; the frame did not run.
    Stopped,
}

/// Drives frames and isolates their failures.
#[derive(Debug)]
pub struct RenderLoop {
    running: bool,
    frames: u64,
    dropped: u64,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            running: true,
            frames: 0,
            dropped: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames attempted, dropped ones included.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    pub fn stop(&mut self) {
        if self.running {
            info!(frames = self.frames, dropped = self.dropped, "render loop stopped");
        }
        self.running = false;
    }

    /// Run one frame. Errors and panics are logged and counted.
    pub fn run_frame<E, F>(&mut self, frame: F) -> FrameOutcome
    where
        E: Display,
        F: FnOnce() -> Result<(), E>,
    {
        if !self.running {
            return FrameOutcome::Stopped;
        }
        let index = self.frames;
        self.frames += 1;
        let span = info_span!("frame", index);
        let _enter = span.enter();

        match panic::catch_unwind(AssertUnwindSafe(frame)) {
            Ok(Ok(())) => FrameOutcome::Rendered,
            Ok(Err(err)) => {
                self.dropped += 1;
                error!(error = %err, "frame failed, dropping it");
                FrameOutcome::Dropped
            }
            Err(payload) => {
                self.dropped += 1;
                error!(panic = panic_message(payload.as_ref()), "frame panicked, dropping it");
                FrameOutcome::Dropped
            }
        }
    }

    /// Run up to `count` frames, stopping early if the loop is stopped.
    /// `frame` receives the frame index and may stop the loop.
    pub fn run<E, F>(&mut self, count: u64, mut frame: F) -> u64
    where
        E: Display,
        F: FnMut(u64, &mut bool) -> Result<(), E>,
    {
        let mut rendered = 0;
        for _ in 0..count {
            let index = self.frames;
            let mut stop = false;
            match self.run_frame(|| frame(index, &mut stop)) {
                FrameOutcome::Rendered => rendered += 1,
                FrameOutcome::Dropped => {}
                FrameOutcome::Stopped => break,
            }
            if stop {
                self.stop();
            }
        }
        rendered
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_frames_render() {
        let mut render_loop = RenderLoop::new();
        let rendered = render_loop.run(5, |_, _| Ok::<(), String>(()));
        assert_eq!(rendered, 5);
        assert_eq!(render_loop.frames(), 5);
        assert_eq!(render_loop.dropped_frames(), 0);
    }

    #[test]
    fn errors_and_panics_drop_single_frames() {
        let mut render_loop = RenderLoop::new();
        let rendered = render_loop.run(6, |index, _| {
            if index == 1 {
                return Err("boom".to_string());
            }
            if index == 3 {
                panic!("frame {index} exploded");
            }
            Ok(())
        });
        assert_eq!(rendered, 4);
        assert_eq!(render_loop.dropped_frames(), 2);
        assert!(render_loop.is_running());
    }

    #[test]
    fn stop_halts_further_frames() {
        let mut render_loop = RenderLoop::new();
        let rendered = render_loop.run(10, |index, stop| {
            *stop = index == 2;
            Ok::<(), String>(())
        });
        assert_eq!(rendered, 3);
        assert!(!render_loop.is_running());
        assert_eq!(render_loop.run_frame(|| Ok::<(), String>(())), FrameOutcome::Stopped);
    }

    #[test]
    fn panic_message_reads_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let number: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(number.as_ref()), "non-string panic payload");
    }
}
