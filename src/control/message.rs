#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::dsp::ladder::LadderFilter;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LadderMessage {
    SetCutoff(f32),
    SetResonance(f32),
    SetDrive(f32),
    Reset,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<LadderMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<LadderMessage> {
    fn pop(&mut self) -> Option<LadderMessage> {
        Consumer::pop(self).ok()
    }
}

/// Map a message onto the filter contract.
#[inline]
pub fn apply_message<F: LadderFilter + ?Sized>(filter: &mut F, msg: LadderMessage) {
    match msg {
        LadderMessage::SetCutoff(hz) => filter.set_cutoff(hz),
        LadderMessage::SetResonance(amount) => filter.set_resonance(amount),
        LadderMessage::SetDrive(amount) => filter.set_drive(amount),
        LadderMessage::Reset => filter.reset(),
    }
}

/// Apply every pending message in arrival order. Returns how many were applied.
pub fn drain_messages<R, F>(rx: &mut R, filter: &mut F) -> usize
where
    R: MessageReceiver + ?Sized,
    F: LadderFilter + ?Sized,
{
    let mut applied = 0;
    while let Some(msg) = rx.pop() {
        apply_message(filter, msg);
        applied += 1;
    }
    applied
}
