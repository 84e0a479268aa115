use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// What currently owns the audio device.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioHandle {
    Recording { path: PathBuf, started_at: Instant },
    Playback { message_id: String, url: String, started_at: Instant },
}

/// Single slot for the open recording or playback. Starting either releases the previous one.
#[derive(Debug, Default)]
pub struct AudioSlot {
    active: Option<AudioHandle>,
}

impl AudioSlot {
    pub fn start_recording(&mut self, path: impl AsRef<Path>) -> Option<AudioHandle> {
        self.replace(AudioHandle::Recording {
            path: path.as_ref().to_path_buf(),
            started_at: Instant::now(),
        })
    }

    pub fn start_playback(
        &mut self,
        message_id: impl Into<String>,
        url: impl Into<String>,
    ) -> Option<AudioHandle> {
        self.replace(AudioHandle::Playback {
            message_id: message_id.into(),
            url: url.into(),
            started_at: Instant::now(),
        })
    }

    /// Takes the recorded file, leaving the slot empty. Playback is left alone.
    pub fn finish_recording(&mut self) -> Option<PathBuf> {
        match self.active.take() {
            Some(AudioHandle::Recording { path, .. }) => Some(path),
            other => {
                self.active = other;
                None
            }
        }
    }

    pub fn stop(&mut self) -> Option<AudioHandle> {
        self.active.take()
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.active, Some(AudioHandle::Recording { .. }))
    }

    pub fn playing(&self) -> Option<&str> {
        match &self.active {
            Some(AudioHandle::Playback { message_id, .. }) => Some(message_id),
            _ => None,
        }
    }

    pub fn active(&self) -> Option<&AudioHandle> {
        self.active.as_ref()
    }

    fn replace(&mut self, next: AudioHandle) -> Option<AudioHandle> {
        let previous = self.active.replace(next);
        if let Some(prev) = &previous {
            debug!(released = ?prev, "Released previous audio handle");
        }
        previous
    }
}
