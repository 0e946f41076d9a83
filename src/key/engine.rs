//! Key event engine.
//!
//! Every tick the registered keys are debounced and folded into a
//! [`KeyMask`]; the mask then drives a five-state machine:
//!
//! ```text
//!   Idle ──press──▶ ComboWait ──window closed──▶ Pressing ──release──▶ MultiWait
//!    ▲                  ▲                           │  ▲                 │ │ │
//!    │                  └────── other combo ────────┼──┼─────────────────┘ │ │
//!    │                                              │  └── same combo ─────┘ │
//!    ├───────────── gap elapsed: Click / Double / Triple ────────────────────┘
//!    │                                              │ held
//!    └──────────── released: HoldEnd + Up ───── Holding
//! ```
//!
//! Produced events wait in a small bounded queue. When it is full the
//! oldest event is dropped, so a consumer that polls too slowly loses
//! history but never blocks input handling.

use heapless::{Deque, Vec};

use super::input::{Key, KeyId, KeyInput};
use crate::config::{KeyTiming, KEY_CAPACITY, KEY_EVENT_QUEUE_DEPTH};
use crate::error::Error;
use crate::time::{elapsed, Millis};

/// Bit `i` set means key `i` is pressed.
pub type KeyMask = u32;

/// Mask with only `id` set.
pub const fn key_mask(id: KeyId) -> KeyMask {
    1 << id
}

/// Semantic key events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEventKind {
    /// Combo window closed with at least one key down (optional).
    Down,
    /// All keys of a press or hold released.
    Up,
    Click,
    DoubleClick,
    /// Three or more clicks.
    TripleClick,
    HoldStart,
    /// Repeat while held; `param` is the hold duration so far.
    Holding,
    /// Hold released; `param` is the total hold duration.
    HoldEnd,
    /// Extra key tapped while a combo is held; mask includes both.
    ModifierClick,
}

/// One produced event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub mask: KeyMask,
    pub kind: KeyEventKind,
    pub timestamp: Millis,
    /// Duration in ms for `Holding` / `HoldEnd`, zero otherwise.
    pub param: u32,
}

/// Timers owned by the `Holding` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HoldTimers {
    since: Millis,
    last_repeat: Millis,
    last_modifier: Option<Millis>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    ComboWait { since: Millis },
    Pressing { since: Millis },
    MultiWait { since: Millis },
    Holding(HoldTimers),
}

/// Key registry plus click / hold state machine.
///
/// `CAP` bounds the number of keys, `DEPTH` the pending event queue.
pub struct KeyEventEngine<I, const CAP: usize = KEY_CAPACITY, const DEPTH: usize = KEY_EVENT_QUEUE_DEPTH>
{
    keys: Vec<Key<I>, CAP>,
    timing: KeyTiming,
    state: State,
    /// Combo being tracked; only meaningful outside `Idle`.
    active_mask: KeyMask,
    click_count: u8,
    events: Deque<KeyEvent, DEPTH>,
    dropped: u32,
}

impl<I: KeyInput, const CAP: usize, const DEPTH: usize> KeyEventEngine<I, CAP, DEPTH> {
    pub fn new() -> Self {
        Self::with_timing(KeyTiming::default())
    }

    pub fn with_timing(timing: KeyTiming) -> Self {
        Self {
            keys: Vec::new(),
            timing,
            state: State::Idle,
            active_mask: 0,
            click_count: 0,
            events: Deque::new(),
            dropped: 0,
        }
    }

    pub fn timing(&self) -> &KeyTiming {
        &self.timing
    }

    /// Add a key to the scan set.
    pub fn register(&mut self, id: KeyId, input: I) -> Result<(), Error> {
        if id as u32 >= KeyMask::BITS {
            return Err(Error::InvalidKeyId(id));
        }
        if self.keys.iter().any(|k| k.id() == id) {
            return Err(Error::DuplicateKeyId(id));
        }
        self.keys
            .push(Key::new(id, input))
            .map_err(|_| Error::RegistryFull)?;
        debug!("Key {} registered ({} total)", id, self.keys.len());
        Ok(())
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Debounced mask as of the last scan.
    pub fn pressed_mask(&self) -> KeyMask {
        self.keys
            .iter()
            .filter(|k| k.is_pressed())
            .fold(0, |mask, k| mask | key_mask(k.id()))
    }

    /// Sample every key and advance the machine one step.
    pub fn tick(&mut self, now: Millis) {
        let mask = self.scan(now);
        self.step(mask, now);
    }

    fn scan(&mut self, now: Millis) -> KeyMask {
        let debounce = self.timing.debounce_ms;
        self.keys.iter_mut().fold(0, |mask, key| {
            if key.sample(now, debounce) {
                mask | key_mask(key.id())
            } else {
                mask
            }
        })
    }

    /// Advance the machine with an already debounced mask.
    pub fn step(&mut self, mask: KeyMask, now: Millis) {
        let t = self.timing;

        match self.state {
            State::Idle => {
                if mask != 0 {
                    self.active_mask = mask;
                    self.click_count = 0;
                    self.state = State::ComboWait { since: now };
                }
            }

            State::ComboWait { since } => {
                self.active_mask |= mask;
                if elapsed(now, since) > t.combo_window_ms {
                    if self.active_mask != 0 {
                        if t.report_down {
                            self.push(KeyEventKind::Down, self.active_mask, now, 0);
                        }
                        self.state = State::Pressing { since: now };
                    } else {
                        self.state = State::Idle;
                    }
                }
            }

            State::Pressing { since } => {
                if mask == 0 {
                    self.click_count = self.click_count.saturating_add(1);
                    self.push(KeyEventKind::Up, self.active_mask, now, 0);
                    self.state = State::MultiWait { since: now };
                } else if elapsed(now, since) >= t.hold_time_ms && covers(mask, self.active_mask) {
                    self.push(KeyEventKind::HoldStart, self.active_mask, now, 0);
                    debug!("Key hold start: mask={=u32:#x}", self.active_mask);
                    // A hold never counts towards a multi-click.
                    self.click_count = 0;
                    self.state = State::Holding(HoldTimers {
                        since: now,
                        last_repeat: now,
                        last_modifier: None,
                    });
                }
            }

            State::MultiWait { since } => {
                if elapsed(now, since) > t.multi_click_gap_ms {
                    let kind = match self.click_count {
                        0 => None,
                        1 => Some(KeyEventKind::Click),
                        2 => Some(KeyEventKind::DoubleClick),
                        _ => Some(KeyEventKind::TripleClick),
                    };
                    if let Some(kind) = kind {
                        self.push(kind, self.active_mask, now, 0);
                    }
                    self.click_count = 0;
                    self.state = State::Idle;
                } else if mask != 0 {
                    if mask == self.active_mask {
                        self.state = State::Pressing { since: now };
                    } else {
                        // Different combo: settle what we have as one click.
                        self.push(KeyEventKind::Click, self.active_mask, now, 0);
                        self.click_count = 0;
                        self.active_mask = mask;
                        self.state = State::ComboWait { since: now };
                    }
                }
            }

            State::Holding(mut hold) => {
                let duration = elapsed(now, hold.since).wrapping_add(t.hold_time_ms);

                if !covers(mask, self.active_mask) {
                    debug!("Key hold end: mask={=u32:#x} {} ms", self.active_mask, duration);
                    self.push(KeyEventKind::HoldEnd, self.active_mask, now, duration);
                    self.push(KeyEventKind::Up, self.active_mask, now, 0);
                    self.state = State::Idle;
                    return;
                }

                let modifier = mask & !self.active_mask;
                if modifier != 0 {
                    let due = hold
                        .last_modifier
                        .map_or(true, |at| elapsed(now, at) > t.modifier_filter_ms);
                    if due {
                        self.push(KeyEventKind::ModifierClick, self.active_mask | modifier, now, 0);
                        hold.last_modifier = Some(now);
                    }
                }

                if t.repeat_rate_ms > 0 && elapsed(now, hold.last_repeat) > t.repeat_rate_ms {
                    self.push(KeyEventKind::Holding, self.active_mask, now, duration);
                    hold.last_repeat = now;
                }

                self.state = State::Holding(hold);
            }
        }
    }

    /// Take the oldest pending event.
    pub fn poll_event(&mut self) -> Option<KeyEvent> {
        self.events.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }

    /// Events discarded because the queue was full.
    pub fn dropped_events(&self) -> u32 {
        self.dropped
    }

    /// Name of the current state, for diagnostics.
    pub fn state_name(&self) -> &'static str {
        match self.state {
            State::Idle => "idle",
            State::ComboWait { .. } => "combo-wait",
            State::Pressing { .. } => "pressing",
            State::MultiWait { .. } => "multi-wait",
            State::Holding(_) => "holding",
        }
    }

    fn push(&mut self, kind: KeyEventKind, mask: KeyMask, now: Millis, param: u32) {
        let event = KeyEvent {
            mask,
            kind,
            timestamp: now,
            param,
        };
        if self.events.is_full() {
            let _lost = self.events.pop_front();
            self.dropped = self.dropped.wrapping_add(1);
            warn!("Key event queue full - dropping oldest");
        }
        let _ = self.events.push_back(event);
    }
}

impl<I: KeyInput, const CAP: usize, const DEPTH: usize> Default for KeyEventEngine<I, CAP, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

/// `mask` still contains every key of `combo`.
fn covers(mask: KeyMask, combo: KeyMask) -> bool {
    mask & combo == combo
}
