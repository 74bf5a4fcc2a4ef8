#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

#[cfg(feature = "rtrb")]
use crate::control::{drain_messages, LadderMessage};
use crate::{
    dsp::ladder::LadderFilter,
    graph::node::{GraphNode, Modulatable, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Ladder Filter Node
==================

Wraps any `LadderFilter` so it can sit in a graph: it filters the block it
is handed in place, follows the host's sample rate, and exposes cutoff,
resonance and drive as modulation targets.

Modulation:
-----------

    final_value = base + modulation

Cutoff is kept within the audible range (20 Hz .. 20 kHz) before it reaches
the filter, which then applies its own ceiling below Nyquist. Resonance and
drive go straight through; every model clamps them itself.

Note events:
------------

By default a ladder keeps ringing across notes, like the hardware. With
`reset_on_note(true)` each `note_on` clears the filter state so every note
starts from silence (useful for percussive patches at high resonance).

Remote control:
---------------

`SharedLadderNode::new` returns the node plus a `LadderHandle`. The handle
lives on a control thread and pushes messages into a lock-free queue; the
node applies all of them at the start of its next block.

Example usage:
  // Owned, generic over the model
  let mut node = LadderNode::<Oberheim>::with_params(48_000.0, 800.0, 0.6);
  node.apply_modulation(LadderParam::Cutoff, 800.0, lfo_value * 400.0);
  node.render_block(&mut buffer, &ctx);

  // Shared, model chosen at runtime
  let ladder = Ladder::from_model(LadderModel::Microtracker, 48_000.0);
  let (mut node, mut handle) = SharedLadderNode::new(ladder);
  handle.set_cutoff(1200.0); // from the UI thread
*/

/// Audible cutoff range applied to modulated values.
const MOD_CUTOFF_MIN_HZ: f32 = 20.0;
const MOD_CUTOFF_MAX_HZ: f32 = 20_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LadderParam {
    Cutoff,
    Resonance,
    Drive,
}

/// Resync the filter with the host rate when it changes.
#[inline]
fn follow_sample_rate<F: LadderFilter + ?Sized>(filter: &mut F, ctx: &RenderCtx) {
    if ctx.sample_rate > 0.0 && ctx.sample_rate != filter.sample_rate() {
        filter.set_sample_rate(ctx.sample_rate);
    }
}

pub struct LadderNode<F: LadderFilter> {
    filter: F,
    base_cutoff: f32,
    base_resonance: f32,
    base_drive: f32,
    reset_on_note: bool,
}

impl<F: LadderFilter> LadderNode<F> {
    pub fn new(sample_rate: f32) -> Self {
        Self::from_filter(F::new(sample_rate))
    }

    pub fn with_params(sample_rate: f32, cutoff_hz: f32, resonance: f32) -> Self {
        let mut filter = F::new(sample_rate);
        filter.set_cutoff(cutoff_hz);
        filter.set_resonance(resonance);
        Self::from_filter(filter)
    }

    /// Wrap an already configured filter. Base values start at its settings.
    pub fn from_filter(filter: F) -> Self {
        Self {
            base_cutoff: filter.cutoff(),
            base_resonance: filter.resonance(),
            base_drive: filter.drive().unwrap_or(1.0),
            reset_on_note: false,
            filter,
        }
    }

    pub fn reset_on_note(mut self, enabled: bool) -> Self {
        self.reset_on_note = enabled;
        self
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut F {
        &mut self.filter
    }

    pub fn into_inner(self) -> F {
        self.filter
    }
}

impl<F: LadderFilter> Modulatable for LadderNode<F> {
    type Param = LadderParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            LadderParam::Cutoff => self.base_cutoff,
            LadderParam::Resonance => self.base_resonance,
            LadderParam::Drive => self.base_drive,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        let final_value = base + modulation;
        match param {
            LadderParam::Cutoff => {
                self.base_cutoff = base;
                self.filter
                    .set_cutoff(final_value.clamp(MOD_CUTOFF_MIN_HZ, MOD_CUTOFF_MAX_HZ));
            }
            LadderParam::Resonance => {
                self.base_resonance = base;
                self.filter.set_resonance(final_value);
            }
            LadderParam::Drive => {
                self.base_drive = base;
                self.filter.set_drive(final_value);
            }
        }
    }
}

impl<F: LadderFilter> GraphNode for LadderNode<F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        follow_sample_rate(&mut self.filter, ctx);
        self.filter.process(out);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        if self.reset_on_note {
            self.filter.reset();
        }
    }
}

#[cfg(feature = "rtrb")]
pub const LADDER_QUEUE_SIZE: usize = 64;

/// Control-thread side of a [`SharedLadderNode`].
///
/// Setters return `false` when the queue is full and the message was dropped.
#[cfg(feature = "rtrb")]
pub struct LadderHandle {
    tx: Producer<LadderMessage>,
}

#[cfg(feature = "rtrb")]
impl LadderHandle {
    pub fn send(&mut self, msg: LadderMessage) -> bool {
        self.tx.push(msg).is_ok()
    }

    pub fn set_cutoff(&mut self, hz: f32) -> bool {
        self.send(LadderMessage::SetCutoff(hz))
    }

    pub fn set_resonance(&mut self, amount: f32) -> bool {
        self.send(LadderMessage::SetResonance(amount))
    }

    pub fn set_drive(&mut self, amount: f32) -> bool {
        self.send(LadderMessage::SetDrive(amount))
    }

    pub fn reset(&mut self) -> bool {
        self.send(LadderMessage::Reset)
    }

    /// Free slots left in the queue.
    pub fn capacity_left(&self) -> usize {
        self.tx.slots()
    }
}

/// Ladder node driven from another thread through a [`LadderHandle`].
#[cfg(feature = "rtrb")]
pub struct SharedLadderNode<F: LadderFilter> {
    filter: F,
    rx: Consumer<LadderMessage>,
}

#[cfg(feature = "rtrb")]
impl<F: LadderFilter> SharedLadderNode<F> {
    pub fn new(filter: F) -> (Self, LadderHandle) {
        let (tx, rx) = RingBuffer::<LadderMessage>::new(LADDER_QUEUE_SIZE);

        let handle = LadderHandle { tx };
        let node = Self { filter, rx };

        (node, handle)
    }

    pub fn with_sample_rate(sample_rate: f32) -> (Self, LadderHandle) {
        Self::new(F::new(sample_rate))
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }
}

#[cfg(feature = "rtrb")]
impl<F: LadderFilter> GraphNode for SharedLadderNode<F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        drain_messages(&mut self.rx, &mut self.filter);
        follow_sample_rate(&mut self.filter, ctx);
        self.filter.process(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::ladder::{
        Improved, Ladder, LadderModel, Microtracker, Oberheim, Stilson, DEFAULT_CUTOFF_HZ,
        DEFAULT_RESONANCE,
    };

    fn ctx() -> RenderCtx {
        RenderCtx::new(48_000.0)
    }

    #[test]
    fn test_new_uses_filter_defaults() {
        let node = LadderNode::<Stilson>::new(48_000.0);
        assert_eq!(node.get_param(LadderParam::Cutoff), DEFAULT_CUTOFF_HZ);
        assert_eq!(node.get_param(LadderParam::Resonance), DEFAULT_RESONANCE);
        // Stilson has no drive stage; the base falls back to unity.
        assert_eq!(node.get_param(LadderParam::Drive), 1.0);
    }

    #[test]
    fn test_with_params_configures_filter() {
        let node = LadderNode::<Oberheim>::with_params(48_000.0, 800.0, 0.6);
        assert_eq!(node.filter().cutoff(), 800.0);
        assert_eq!(node.filter().resonance(), 0.6);
    }

    #[test]
    fn test_render_block_filters_in_place() {
        let mut node = LadderNode::<Improved>::with_params(48_000.0, 500.0, 0.0);
        let mut buffer: Vec<f32> = (0..256)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        node.render_block(&mut buffer, &ctx());

        // Nyquist-rate square is almost entirely removed by a 500 Hz lowpass.
        let tail_peak = buffer[128..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < 0.05, "tail_peak = {tail_peak}");
    }

    #[test]
    fn test_cutoff_modulation_is_clamped() {
        let mut node = LadderNode::<Microtracker>::new(96_000.0);
        node.apply_modulation(LadderParam::Cutoff, 1000.0, -5000.0);
        assert_eq!(node.filter().cutoff(), 20.0);
        assert_eq!(node.get_param(LadderParam::Cutoff), 1000.0);

        node.apply_modulation(LadderParam::Cutoff, 1000.0, 1.0e6);
        // Audible ceiling first, then the model's own ceiling (fs / 2pi).
        let expected = 20_000.0f32.min(96_000.0 / std::f32::consts::TAU);
        assert!((node.filter().cutoff() - expected).abs() < 0.01);
    }

    #[test]
    fn test_modulation_offsets_do_not_accumulate() {
        let mut node = LadderNode::<Oberheim>::new(48_000.0);
        for _ in 0..10 {
            node.apply_modulation(LadderParam::Resonance, 0.3, 0.2);
        }
        assert!((node.filter().resonance() - 0.5).abs() < 1e-6);
        assert_eq!(node.get_param(LadderParam::Resonance), 0.3);
    }

    #[test]
    fn test_drive_modulation_reaches_filter() {
        let mut node = LadderNode::<Oberheim>::new(48_000.0);
        node.apply_modulation(LadderParam::Drive, 1.0, 0.5);
        assert_eq!(node.filter().drive(), Some(1.5));
    }

    #[test]
    fn test_follows_context_sample_rate() {
        let mut node = LadderNode::<Stilson>::with_params(48_000.0, 20_000.0, 0.0);
        let mut buffer = vec![0.0; 64];
        node.render_block(&mut buffer, &RenderCtx::new(22_050.0));

        assert_eq!(node.filter().sample_rate(), 22_050.0);
        assert!(node.filter().cutoff() <= 22_050.0 * 0.45);
    }

    #[test]
    fn test_note_on_resets_only_when_enabled() {
        let mut keep = LadderNode::<Stilson>::new(48_000.0);
        let mut clear = LadderNode::<Stilson>::new(48_000.0).reset_on_note(true);
        let mut buffer = vec![0.8; 128];
        keep.render_block(&mut buffer, &ctx());
        buffer.fill(0.8);
        clear.render_block(&mut buffer, &ctx());

        keep.note_on(&ctx());
        clear.note_on(&ctx());

        assert!(keep.filter_mut().tick(0.0).abs() > 0.0);
        assert_eq!(clear.filter_mut().tick(0.0), 0.0);
    }

    #[test]
    fn test_boxed_node_forwards() {
        let ladder = Ladder::from_model(LadderModel::RkSimulation, 48_000.0);
        let mut node: Box<dyn GraphNode> = Box::new(LadderNode::from_filter(ladder));
        let mut buffer = vec![0.5; 128];
        node.render_block(&mut buffer, &ctx());

        assert!(node.is_active());
        assert!(buffer.iter().all(|s| s.is_finite()));
        assert!(buffer[127] > 0.0);
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn test_shared_node_applies_messages_before_rendering() {
        let (mut node, mut handle) = SharedLadderNode::<Oberheim>::with_sample_rate(48_000.0);
        assert!(handle.set_cutoff(2000.0));
        assert!(handle.set_resonance(0.25));
        assert!(handle.set_drive(3.0));

        let mut buffer = vec![0.0; 32];
        node.render_block(&mut buffer, &ctx());

        assert_eq!(node.filter().cutoff(), 2000.0);
        assert_eq!(node.filter().resonance(), 0.25);
        assert_eq!(node.filter().drive(), Some(3.0));
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn test_handle_reports_full_queue() {
        let (_node, mut handle) = SharedLadderNode::<Stilson>::with_sample_rate(48_000.0);
        for _ in 0..LADDER_QUEUE_SIZE {
            assert!(handle.set_cutoff(500.0));
        }
        assert_eq!(handle.capacity_left(), 0);
        assert!(!handle.reset());
    }
}
