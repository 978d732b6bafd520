//! Sound cues. Fire and forget: a sink never reports failure.

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    PowerUpFormed,
    BombDetonated,
}

impl AudioCue {
    pub fn tag(self) -> &'static str {
        match self {
            Self::PowerUpFormed => "power-up-formed",
            Self::BombDetonated => "bomb-detonated",
        }
    }
}

pub trait AudioSink {
    fn cue(&mut self, cue: AudioCue);
}

/// Drops every cue (`--mute`, tests).
#[derive(Debug, Default)]
pub struct Silent;

impl AudioSink for Silent {
    fn cue(&mut self, _cue: AudioCue) {}
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudioSink for TerminalBell {
    fn cue(&mut self, cue: AudioCue) {
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
            log::debug!("bell for {} failed: {e}", cue.tag());
        }
    }
}

/// Remembers cues so tests can inspect them.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct Recorder(pub std::rc::Rc<std::cell::RefCell<Vec<AudioCue>>>);

#[cfg(test)]
impl AudioSink for Recorder {
    fn cue(&mut self, cue: AudioCue) {
        self.0.borrow_mut().push(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(AudioCue::PowerUpFormed.tag(), "power-up-formed");
        assert_eq!(AudioCue::BombDetonated.tag(), "bomb-detonated");
    }

    #[test]
    fn recorder_shares_its_log() {
        let rec = Recorder::default();
        let mut sink: Box<dyn AudioSink> = Box::new(rec.clone());
        sink.cue(AudioCue::BombDetonated);
        assert_eq!(*rec.0.borrow(), vec![AudioCue::BombDetonated]);
    }
}
