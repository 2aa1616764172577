//! One-shot facial expressions derived from the pet's needs and from events.
//!
//! Nothing here feeds back into the simulation; the renderer reads `Expression`.

use crate::config::{EmotionConfig, StatCue};
use crate::pet::{Action, PetState};
use crate::sentiment::{Label, Sentiment};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Love,
    Excited,
    Tired,
    Sleepy,
    Angry,
    Surprised,
    Sad,
    Yuck,
}

/// A face to show for `secs` seconds and an optional floating line.
#[derive(Clone, Debug, PartialEq)]
pub struct Cue {
    pub face: Option<Face>,
    pub secs: f32,
    pub line: Option<&'static str>,
}

impl Cue {
    fn new(face: Face, secs: f32, line: Option<&'static str>) -> Self {
        Self {
            face: Some(face),
            secs,
            line,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Burst {
    Crumbs,
    Confetti,
    Stars,
    Bubbles,
}

/// Everything the front end should play in response to one action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reaction {
    pub cues: Vec<Cue>,
    pub burst: Option<Burst>,
    pub beeps: Vec<u32>,
}

fn pick<R: Rng + ?Sized>(rng: &mut R, lines: &[&'static str]) -> Option<&'static str> {
    lines.choose(rng).copied()
}

/// First breached threshold in configured priority order.
pub fn stat_cue<R: Rng + ?Sized>(
    state: &PetState,
    cfg: &EmotionConfig,
    rng: &mut R,
) -> Option<Cue> {
    if !state.is_alive() {
        return None;
    }
    let t = &cfg.thresholds;
    cfg.priority.iter().find_map(|cue| match cue {
        StatCue::EnergyLow if state.energy() < t.energy_low => Some(Cue::new(
            Face::Tired,
            1.2,
            pick(rng, &["Tired...", "So sleepy", "Low energy"]),
        )),
        StatCue::HungerHigh if state.hunger() > t.hunger_high => Some(Cue::new(
            Face::Sad,
            1.2,
            pick(rng, &["Hungry...", "Feed me", "Stomach growls"]),
        )),
        StatCue::FunLow if state.fun() < t.fun_low => Some(Cue::new(
            Face::Sad,
            1.0,
            pick(rng, &["Bored...", "Play?", "Lonely..."]),
        )),
        StatCue::HygieneLow if state.hygiene() < t.hygiene_low => Some(Cue::new(
            Face::Yuck,
            1.0,
            pick(rng, &["Dirty...", "Messy", "Eww!"]),
        )),
        _ => None,
    })
}

/// `state` is the pet after the action; `was_asleep` is from before it.
pub fn react_to_action<R: Rng + ?Sized>(
    action: Action,
    was_asleep: bool,
    state: &PetState,
    cfg: &EmotionConfig,
    rng: &mut R,
) -> Reaction {
    let mut out = Reaction::default();
    if !state.is_alive() {
        return out;
    }

    match action {
        Action::Feed => {
            out.cues.push(Cue::new(
                Face::Love,
                1.2,
                pick(rng, &["Yum!", "Delish!", "Nom nom!", "Mmmm!"]),
            ));
            out.burst = Some(Burst::Crumbs);
            out.beeps.push(520);
        }
        Action::Play => {
            out.cues.push(Cue::new(
                Face::Excited,
                1.2,
                pick(rng, &["Fun!", "Yay!", "Woo!", "Nice!"]),
            ));
            out.burst = Some(Burst::Confetti);
            out.beeps.push(760);
            if rng.gen_bool(cfg.surprise_prob_play.clamp(0.0, 1.0)) {
                out.cues.push(Cue::new(
                    Face::Surprised,
                    0.8,
                    pick(rng, &["Whoa!", "Woah!", "Huh?", "Oh!"]),
                ));
            }
        }
        Action::Sleep => {
            out.cues.push(Cue::new(
                Face::Sleepy,
                1.5,
                pick(rng, &["ZzZ", "Sleepy...", "Nap time"]),
            ));
            out.burst = Some(Burst::Stars);
            out.beeps.push(400);
        }
        Action::Clean => {
            out.cues.push(Cue::new(
                Face::Yuck,
                0.9,
                pick(rng, &["Fresh!", "Squeaky!", "Shiny!", "So clean!"]),
            ));
            out.burst = Some(Burst::Bubbles);
            out.beeps.push(640);
        }
    }

    out.cues.extend(stat_cue(state, cfg, rng));

    if cfg.wake_angry && action == Action::Sleep && was_asleep && !state.is_asleep() {
        out.cues.push(Cue::new(
            Face::Angry,
            1.2,
            pick(rng, &["Hey!", "Grr...", "Let me sleep!", "Ugh!"]),
        ));
        out.beeps.push(300);
    }
    out
}

pub fn chat_cue(sentiment: &Sentiment) -> Cue {
    match sentiment.label {
        Label::Positive => Cue::new(Face::Love, 1.0, Some("(feels better)")),
        Label::Negative => Cue::new(Face::Sad, 1.0, Some("(feels worse)")),
        Label::Neutral => Cue {
            face: None,
            secs: 0.0,
            line: Some("(neutral)"),
        },
    }
}

/// The face currently on screen plus the little hop after an action.
///
/// A one-shot face from an event wins over the standing face that the
/// per-frame needs scan keeps up to date.
#[derive(Clone, Debug, Default)]
pub struct Expression {
    face: Option<Face>,
    standing: Option<Face>,
    timer: f32,
    reaction: f32,
    clock: f32,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, face: Face, secs: f32) {
        self.face = Some(face);
        self.timer = secs.max(0.0);
    }

    pub fn apply(&mut self, cue: &Cue) {
        if let Some(face) = cue.face {
            self.set(face, cue.secs);
        }
    }

    pub fn bounce(&mut self) {
        self.reaction = 1.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.clock += dt;
        if self.reaction > 0.0 {
            self.reaction = (self.reaction - dt * 3.0).max(0.0);
        }
        if self.timer > 0.0 {
            self.timer = (self.timer - dt).max(0.0);
            if self.timer == 0.0 {
                self.face = None;
            }
        }
    }

    /// Run once per frame. Returns the stat cue only when the standing face
    /// changes, so its line is shown once rather than every frame.
    pub fn scan<R: Rng + ?Sized>(
        &mut self,
        state: &PetState,
        cfg: &EmotionConfig,
        rng: &mut R,
    ) -> Option<Cue> {
        let cue = stat_cue(state, cfg, rng);
        let face = cue.as_ref().and_then(|c| c.face);
        if face == self.standing {
            return None;
        }
        self.standing = face;
        cue
    }

    pub fn current(&self) -> Option<Face> {
        self.face.or(self.standing)
    }

    /// 1.0 right after an action, decaying to 0.
    pub fn reaction(&self) -> f32 {
        self.reaction
    }

    /// Seconds of animation time, for blinking.
    pub fn clock(&self) -> f32 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::Appearance;
    use crate::pet::Needs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pet(needs: Needs) -> PetState {
        PetState::from_parts(needs, false, None, 0.0, Appearance::default())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[test]
    fn content_pet_has_no_stat_cue() {
        let cfg = EmotionConfig::default();
        assert_eq!(stat_cue(&pet(Needs::default()), &cfg, &mut rng()), None);
    }

    #[test]
    fn priority_order_decides() {
        let needs = Needs {
            hunger: 0.9,
            energy: 0.1,
            fun: 0.7,
            hygiene: 0.1,
        };
        let mut cfg = EmotionConfig::default();
        let cue = stat_cue(&pet(needs), &cfg, &mut rng()).expect("cue");
        assert_eq!(cue.face, Some(Face::Tired));

        cfg.priority = vec![StatCue::HygieneLow, StatCue::EnergyLow];
        let cue = stat_cue(&pet(needs), &cfg, &mut rng()).expect("cue");
        assert_eq!(cue.face, Some(Face::Yuck));
    }

    #[test]
    fn dead_pet_shows_nothing() {
        let st = PetState::from_parts(
            Needs {
                energy: 0.0,
                ..Needs::default()
            },
            false,
            Some("Exhausted".into()),
            0.0,
            Appearance::default(),
        );
        let cfg = EmotionConfig::default();
        assert_eq!(stat_cue(&st, &cfg, &mut rng()), None);
        assert_eq!(
            react_to_action(Action::Feed, false, &st, &cfg, &mut rng()),
            Reaction::default()
        );
    }

    #[test]
    fn waking_up_makes_it_angry() {
        let cfg = EmotionConfig::default();
        let st = pet(Needs::default());
        let r = react_to_action(Action::Sleep, true, &st, &cfg, &mut rng());
        assert_eq!(r.cues.last().and_then(|c| c.face), Some(Face::Angry));

        let calm = EmotionConfig {
            wake_angry: false,
            ..EmotionConfig::default()
        };
        let r = react_to_action(Action::Sleep, true, &st, &calm, &mut rng());
        assert_eq!(r.cues.last().and_then(|c| c.face), Some(Face::Sleepy));
    }

    #[test]
    fn surprise_follows_probability() {
        let st = pet(Needs::default());
        let always = EmotionConfig {
            surprise_prob_play: 1.0,
            ..EmotionConfig::default()
        };
        let never = EmotionConfig {
            surprise_prob_play: 0.0,
            ..EmotionConfig::default()
        };
        let r = react_to_action(Action::Play, false, &st, &always, &mut rng());
        assert!(r.cues.iter().any(|c| c.face == Some(Face::Surprised)));
        let r = react_to_action(Action::Play, false, &st, &never, &mut rng());
        assert!(!r.cues.iter().any(|c| c.face == Some(Face::Surprised)));
        assert_eq!(r.burst, Some(Burst::Confetti));
    }

    #[test]
    fn chat_cues_follow_label() {
        let pos = Sentiment {
            score: 0.5,
            label: Label::Positive,
        };
        assert_eq!(chat_cue(&pos).face, Some(Face::Love));
        assert_eq!(chat_cue(&Sentiment::NEUTRAL).face, None);
    }

    #[test]
    fn neglect_shows_without_input() {
        let cfg = EmotionConfig::default();
        let mut e = Expression::new();
        let tired = pet(Needs {
            energy: 0.1,
            ..Needs::default()
        });

        let cue = e.scan(&tired, &cfg, &mut rng()).expect("cue");
        assert_eq!(cue.face, Some(Face::Tired));
        assert_eq!(e.current(), Some(Face::Tired));
        // Same breach on the next frame: face stays, no repeated line.
        assert_eq!(e.scan(&tired, &cfg, &mut rng()), None);
        assert_eq!(e.current(), Some(Face::Tired));

        e.set(Face::Love, 1.0);
        assert_eq!(e.current(), Some(Face::Love));
        e.update(1.5);
        assert_eq!(e.current(), Some(Face::Tired));

        assert_eq!(e.scan(&pet(Needs::default()), &cfg, &mut rng()), None);
        assert_eq!(e.current(), None);
    }

    #[test]
    fn expression_expires() {
        let mut e = Expression::new();
        e.set(Face::Love, 1.0);
        e.bounce();
        e.update(0.5);
        assert_eq!(e.current(), Some(Face::Love));
        assert!(e.reaction() < 1.0);
        e.update(0.6);
        assert_eq!(e.current(), None);
        assert_eq!(e.reaction(), 0.0);
    }
}
