use std::collections::VecDeque;

/// Fire-and-forget sound playback supplied by the host.
pub trait AudioSink {
    fn play_sound(&mut self, id: &str, pitch: Option<f32>, gain: Option<f32>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundTrigger {
    pub id: String,
    pub pitch: f32,
    pub gain: f32,
}

/// Sink that remembers the most recent triggers instead of playing them.
pub struct AudioLog {
    enabled: bool,
    capacity: usize,
    triggers: VecDeque<SoundTrigger>,
}

impl AudioLog {
    pub fn new(capacity: usize) -> Self {
        Self { enabled: true, capacity: capacity.max(1), triggers: VecDeque::new() }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }

    pub fn recent_triggers(&self) -> impl ExactSizeIterator<Item = &SoundTrigger> {
        self.triggers.iter()
    }

    fn push_trigger(&mut self, trigger: SoundTrigger) {
        if self.triggers.len() == self.capacity {
            self.triggers.pop_front();
        }
        self.triggers.push_back(trigger);
    }
}

impl AudioSink for AudioLog {
    fn play_sound(&mut self, id: &str, pitch: Option<f32>, gain: Option<f32>) {
        if !self.enabled {
            return;
        }
        self.push_trigger(SoundTrigger { id: id.to_string(), pitch: pitch.unwrap_or(1.0), gain: gain.unwrap_or(1.0) });
    }
}
