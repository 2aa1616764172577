//! Pet state engine: needs decay, care actions and the death rules.
//!
//! Every stat lives in [0,1] and is clamped on write. Time is absolute wall
//! clock seconds; catching up after the program was closed and advancing one
//! frame are the same operation (`apply_offline`).

use crate::appearance::Appearance;
use chrono::Utc;
use std::fmt;

// Per-second rates.
const HUNGER_UP: f64 = 1.0 / 600.0;
const ENERGY_DOWN_AWAKE: f64 = 1.0 / 1200.0;
const ENERGY_UP_ASLEEP: f64 = 1.0 / 600.0;
const FUN_DOWN: f64 = 1.0 / 900.0;
const HYGIENE_DOWN: f64 = 1.0 / 1800.0;

const SLEEP_HUNGER_FACTOR: f64 = 0.6;
const SLEEP_FUN_FACTOR: f64 = 0.4;

// Just inside the clamp boundary so float drift towards 0/1 still triggers.
const STARVED_AT: f64 = 0.999;
const EXHAUSTED_AT: f64 = 0.001;

pub const STARVED: &str = "Starved";
pub const EXHAUSTED: &str = "Exhausted";

/// Wall clock as fractional seconds since the Unix epoch.
pub fn epoch_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// The four needs. `hunger` is the only one where higher is worse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Needs {
    pub hunger: f64,
    pub energy: f64,
    pub fun: f64,
    pub hygiene: f64,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 0.2,
            energy: 0.8,
            fun: 0.7,
            hygiene: 0.6,
        }
    }
}

impl Needs {
    pub fn clamped(self) -> Self {
        Self {
            hunger: clamp01(self.hunger),
            energy: clamp01(self.energy),
            fun: clamp01(self.fun),
            hygiene: clamp01(self.hygiene),
        }
    }
}

/// Additive change to the needs, applied with clamping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatDelta {
    pub hunger: f64,
    pub energy: f64,
    pub fun: f64,
    pub hygiene: f64,
}

impl StatDelta {
    pub fn is_zero(&self) -> bool {
        self.hunger == 0.0 && self.energy == 0.0 && self.fun == 0.0 && self.hygiene == 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Feed,
    Play,
    Sleep,
    Clean,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Feed, Action::Play, Action::Sleep, Action::Clean];

    pub fn name(self) -> &'static str {
        match self {
            Action::Feed => "Feed",
            Action::Play => "Play",
            Action::Sleep => "Sleep",
            Action::Clean => "Clean",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            Action::Feed => 'F',
            Action::Play => 'P',
            Action::Sleep => 'S',
            Action::Clean => 'C',
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Action::Feed => "Decrease hunger",
            Action::Play => "Increase fun",
            Action::Sleep => "Toggle sleep",
            Action::Clean => "Increase hygiene",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Life {
    Awake,
    Asleep,
    Dead,
}

/// What a single `apply_offline` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Catchup {
    pub elapsed: f64,
    pub died: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PetState {
    needs: Needs,
    asleep: bool,
    // `Some(reason)` once dead; the reason is never empty.
    death: Option<String>,
    last_timestamp: f64,
    appearance: Appearance,
}

impl PetState {
    pub fn new(now: f64, appearance: Appearance) -> Self {
        Self {
            needs: Needs::default(),
            asleep: false,
            death: None,
            last_timestamp: now,
            appearance,
        }
    }

    /// Builds a state from untrusted parts. Stats are clamped, an empty death
    /// reason becomes "Unknown", and a dead pet is never asleep.
    pub fn from_parts(
        needs: Needs,
        asleep: bool,
        death_reason: Option<String>,
        last_timestamp: f64,
        appearance: Appearance,
    ) -> Self {
        let death = death_reason.map(|r| {
            let r = r.trim();
            if r.is_empty() {
                "Unknown".to_string()
            } else {
                r.to_string()
            }
        });
        Self {
            needs: needs.clamped(),
            asleep: asleep && death.is_none(),
            death,
            last_timestamp,
            appearance,
        }
    }

    /// A brand new creature replacing a dead one.
    pub fn respawn(now: f64, appearance: Appearance) -> Self {
        let mut st = Self::new(now, appearance);
        st.apply_offline(now);
        st
    }

    pub fn needs(&self) -> Needs {
        self.needs
    }
    pub fn hunger(&self) -> f64 {
        self.needs.hunger
    }
    pub fn energy(&self) -> f64 {
        self.needs.energy
    }
    pub fn fun(&self) -> f64 {
        self.needs.fun
    }
    pub fn hygiene(&self) -> f64 {
        self.needs.hygiene
    }
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }
    pub fn is_alive(&self) -> bool {
        self.death.is_none()
    }
    /// Empty while alive.
    pub fn death_reason(&self) -> &str {
        self.death.as_deref().unwrap_or("")
    }
    pub fn last_timestamp(&self) -> f64 {
        self.last_timestamp
    }
    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn life(&self) -> Life {
        match (self.is_alive(), self.asleep) {
            (false, _) => Life::Dead,
            (true, true) => Life::Asleep,
            (true, false) => Life::Awake,
        }
    }

    /// Mean wellbeing in [0,1].
    pub fn mood(&self) -> f64 {
        let n = &self.needs;
        clamp01((n.energy + n.fun + n.hygiene + (1.0 - n.hunger)) / 4.0)
    }

    /// Advance the simulation to absolute time `now`.
    pub fn apply_offline(&mut self, now: f64) -> Catchup {
        if !now.is_finite() {
            return Catchup::default();
        }
        let dt = (now - self.last_timestamp).max(0.0);
        let mut died = false;

        if self.is_alive() {
            let n = &mut self.needs;
            if self.asleep {
                n.energy = clamp01(n.energy + dt * ENERGY_UP_ASLEEP);
                n.hunger = clamp01(n.hunger + dt * HUNGER_UP * SLEEP_HUNGER_FACTOR);
                n.fun = clamp01(n.fun - dt * FUN_DOWN * SLEEP_FUN_FACTOR);
            } else {
                n.energy = clamp01(n.energy - dt * ENERGY_DOWN_AWAKE);
                n.hunger = clamp01(n.hunger + dt * HUNGER_UP);
                n.fun = clamp01(n.fun - dt * FUN_DOWN);
            }
            n.hygiene = clamp01(n.hygiene - dt * HYGIENE_DOWN);
            died = self.check_death();
        }

        // Also advances while dead so the same span is never counted twice.
        self.last_timestamp = self.last_timestamp.max(now);
        Catchup { elapsed: dt, died }
    }

    /// Advance by one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> Catchup {
        self.apply_offline(self.last_timestamp + dt.max(0.0))
    }

    pub fn perform(&mut self, action: Action) {
        match action {
            Action::Feed => self.feed(),
            Action::Play => self.play(),
            Action::Sleep => self.toggle_sleep(),
            Action::Clean => self.clean(),
        }
    }

    pub fn feed(&mut self) {
        self.nudge(StatDelta {
            hunger: -0.5,
            hygiene: -0.05,
            ..StatDelta::default()
        });
    }

    pub fn play(&mut self) {
        self.nudge(StatDelta {
            fun: 0.5,
            energy: -0.1,
            hunger: 0.1,
            ..StatDelta::default()
        });
    }

    pub fn toggle_sleep(&mut self) {
        if self.is_alive() {
            self.asleep = !self.asleep;
        }
    }

    pub fn clean(&mut self) {
        self.nudge(StatDelta {
            hygiene: 0.6,
            ..StatDelta::default()
        });
    }

    /// Apply an arbitrary delta with clamping. Ignored once dead.
    pub fn nudge(&mut self, d: StatDelta) {
        if !self.is_alive() {
            return;
        }
        let n = &mut self.needs;
        n.hunger = clamp01(n.hunger + d.hunger);
        n.energy = clamp01(n.energy + d.energy);
        n.fun = clamp01(n.fun + d.fun);
        n.hygiene = clamp01(n.hygiene + d.hygiene);
    }

    // Starvation wins over exhaustion when both are breached.
    fn check_death(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        let reason = if self.needs.hunger >= STARVED_AT {
            STARVED
        } else if self.needs.energy <= EXHAUSTED_AT {
            EXHAUSTED
        } else {
            return false;
        };
        self.death = Some(reason.to_string());
        self.asleep = false;
        true
    }
}
