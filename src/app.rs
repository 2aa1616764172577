use crate::appearance::random_appearance;
use crate::chat::{
    apply_exchange, backend_from_config, ChatMessage, ChatSession, Exchange, Role, SendOutcome,
};
use crate::config::Config;
use crate::emotion::{chat_cue, react_to_action, Cue, Expression};
use crate::fx::Effects;
use crate::input::{collect_input_nonblocking, map_event, Command, Overlay};
use crate::pet::{epoch_now, Action, Life, PetState};
use crate::render::{
    canvas_to_cells, draw_chat_dialog, draw_death_screen, draw_help, draw_pet, draw_stage_text,
    ui_overlay, Hud, Scene, Stage, Terminal, Viewport, STAGE_H, STAGE_W,
};
use crate::storage::{self, LoadSource};
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::{max, min};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const AUTOSAVE_EVERY: Duration = Duration::from_secs(30);
const TRANSCRIPT_MAX: usize = 50;

const PET_X: f32 = STAGE_W as f32 / 2.0;
const PET_Y: f32 = STAGE_H as f32 / 2.0;

pub(crate) struct App {
    cfg: Config,
    state: PetState,
    chat: ChatSession,
    // Everything shown in the chat dialog, including local notes.
    transcript: Vec<ChatMessage>,
    chat_input: String,
    expression: Expression,
    effects: Effects,
    rng: StdRng,
    term: Terminal,
    overlay: Overlay,
    selected: usize,
    muted: bool,
    should_quit: bool,
    autosave_at: Instant,
    started: Instant,
}

impl App {
    fn init(cfg: Config) -> anyhow::Result<Self> {
        let mut rng = StdRng::from_entropy();

        let loaded = storage::load(&cfg.save_path, epoch_now(), &mut rng);
        if loaded.source == LoadSource::Corrupt {
            warn!("previous save was unreadable; a new pet hatched");
        }
        if loaded.catchup.died {
            info!(reason = loaded.state.death_reason(), "pet died while you were away");
        }

        let chat = ChatSession::new(backend_from_config(&cfg.chat), cfg.chat.max_history);
        let term = Terminal::begin().context("setting up the terminal")?;

        Ok(Self {
            cfg,
            state: loaded.state,
            chat,
            transcript: Vec::new(),
            chat_input: String::new(),
            expression: Expression::new(),
            effects: Effects::new(),
            rng,
            term,
            overlay: Overlay::None,
            selected: 0,
            muted: false,
            should_quit: false,
            autosave_at: Instant::now() + AUTOSAVE_EVERY,
            started: Instant::now(),
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.cfg.fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();
            self.term.resize_if_needed()?;

            // input
            let events = collect_input_nonblocking(frame_dt)?;
            for ev in events {
                let cmd = map_event(
                    self.overlay,
                    self.state.is_alive(),
                    self.chat_input.chars().count(),
                    &ev,
                );
                if let Some(cmd) = cmd {
                    self.handle(cmd)?;
                }
                if self.should_quit {
                    break;
                }
            }

            if let Some(exchange) = self.chat.poll() {
                self.finish_exchange(exchange);
            }

            // sim
            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame).as_secs_f32();
            last_frame = now;

            if self.state.is_alive() {
                let step = self.state.tick(f64::from(dt));
                if step.died {
                    info!(reason = self.state.death_reason(), "pet died");
                    self.overlay = Overlay::None;
                }
                self.expression.update(dt);
                let standing = self
                    .expression
                    .scan(&self.state, &self.cfg.emotion, &mut self.rng);
                if let Some(cue) = standing {
                    self.say_line(&cue, 34.0);
                }
            }
            self.effects.update(dt);

            self.render_frame()?;

            if Instant::now() >= self.autosave_at {
                self.save_now();
                self.autosave_at = Instant::now() + AUTOSAVE_EVERY;
            }

            spin_sleep(frame_dt, frame_start);
        }

        self.save_now();
        self.term.end()?;
        Ok(())
    }

    fn handle(&mut self, cmd: Command) -> anyhow::Result<()> {
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::ToggleHelp => {
                self.overlay = match self.overlay {
                    Overlay::Help => Overlay::None,
                    _ => Overlay::Help,
                }
            }
            Command::ToggleMute => self.muted = !self.muted,
            Command::OpenChat => {
                self.overlay = Overlay::Chat;
                self.chat_input.clear();
            }
            Command::ChatClose => {
                self.overlay = Overlay::None;
                self.chat_input.clear();
            }
            Command::ChatChar(ch) => self.chat_input.push(ch),
            Command::ChatBackspace => {
                self.chat_input.pop();
            }
            Command::ChatSubmit => self.submit_chat(),
            Command::SelectPrev => {
                self.selected = (self.selected + Action::ALL.len() - 1) % Action::ALL.len()
            }
            Command::SelectNext => self.selected = (self.selected + 1) % Action::ALL.len(),
            Command::PerformSelected => {
                if let Some(&action) = Action::ALL.get(self.selected) {
                    self.do_action(action)?;
                }
            }
            Command::Perform(action) => self.do_action(action)?,
            Command::Respawn => self.respawn(),
        }
        Ok(())
    }

    fn do_action(&mut self, action: Action) -> anyhow::Result<()> {
        if !self.state.is_alive() {
            return Ok(());
        }
        let was_asleep = self.state.is_asleep();
        self.state.perform(action);
        self.expression.bounce();

        let reaction = react_to_action(
            action,
            was_asleep,
            &self.state,
            &self.cfg.emotion,
            &mut self.rng,
        );
        if let Some(burst) = reaction.burst {
            self.effects.spawn(burst, PET_X, PET_Y, &mut self.rng);
        }
        for (i, cue) in reaction.cues.iter().enumerate() {
            self.play_cue(cue, 18.0 + 8.0 * i as f32);
        }
        if !reaction.beeps.is_empty() && !self.muted {
            self.term.bell()?;
        }
        Ok(())
    }

    fn play_cue(&mut self, cue: &Cue, rise: f32) {
        self.expression.apply(cue);
        self.say_line(cue, rise);
    }

    fn say_line(&mut self, cue: &Cue, rise: f32) {
        if let Some(line) = cue.line {
            let x = PET_X - line.len() as f32 * 1.5;
            self.effects.say(line, x, PET_Y - rise);
        }
    }

    fn note(&mut self, role: Role, text: impl Into<String>) {
        self.transcript.push(ChatMessage::new(role, text));
        if self.transcript.len() > TRANSCRIPT_MAX {
            let extra = self.transcript.len() - TRANSCRIPT_MAX;
            self.transcript.drain(..extra);
        }
    }

    fn submit_chat(&mut self) {
        let text = self.chat_input.trim().to_string();
        if text.is_empty() {
            // empty Enter closes the dialog
            self.overlay = Overlay::None;
            return;
        }
        match self.chat.send(&text) {
            SendOutcome::Sent => {
                self.note(Role::User, text);
                self.chat_input.clear();
            }
            SendOutcome::Busy => {}
            SendOutcome::Disabled => {
                self.note(Role::User, text);
                self.note(Role::Assistant, "(chat disabled)");
                self.chat_input.clear();
            }
        }
    }

    fn finish_exchange(&mut self, exchange: Exchange) {
        match exchange.reply {
            Ok(reply) => {
                let sentiment = apply_exchange(
                    &mut self.state,
                    &exchange.user_text,
                    &reply,
                    &self.cfg.chat.gains,
                );
                self.note(Role::Assistant, reply);
                if self.state.is_alive() {
                    self.play_cue(&chat_cue(&sentiment), 30.0);
                }
            }
            Err(err) => self.note(Role::Assistant, format!("(no reply: {err})")),
        }
    }

    fn respawn(&mut self) {
        let now = epoch_now();
        self.state = PetState::respawn(now, random_appearance(&mut self.rng));
        self.effects.clear();
        self.expression = Expression::new();
        self.overlay = Overlay::None;
        info!("new pet hatched");
        self.save_now();
    }

    fn save_now(&mut self) {
        if let Err(err) = storage::save(&self.cfg.save_path, &mut self.state, epoch_now()) {
            warn!(path = %self.cfg.save_path.display(), "save failed: {err}");
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let bg = crossterm::style::Color::Black;
        self.term.cur.clear(bg);
        self.term.canvas.clear();

        // Reserve left panel for text; pet viewport on right.
        let cols = self.term.cols as i32;
        let rows = self.term.rows as i32;
        let panel_w_cells = max(0, min(max(34, cols / 3), cols - 10));
        let vp = Viewport {
            x: panel_w_cells * 2,
            y: 0,
            w: (cols - panel_w_cells) * 2,
            h: rows * 4,
        };
        let stage = Stage::fit(vp);

        let scene = Scene {
            state: &self.state,
            expression: &self.expression,
            effects: &self.effects,
        };
        draw_pet(&mut self.term.canvas, stage, &scene);
        canvas_to_cells(&self.term.canvas, &mut self.term.cur, bg);
        draw_stage_text(&mut self.term.cur, stage, &self.state, &self.effects);

        let chat_status = if !self.chat.is_ready() {
            "off"
        } else if self.chat.is_waiting() {
            "waiting..."
        } else {
            "on (T)"
        };
        ui_overlay(
            &mut self.term.cur,
            &self.state,
            &Hud {
                selected: self.selected,
                muted: self.muted,
                chat_status,
            },
        );

        if self.state.life() == Life::Dead {
            draw_death_screen(&mut self.term.cur, self.state.death_reason());
        } else if self.overlay == Overlay::Help {
            draw_help(&mut self.term.cur);
        }

        if self.overlay == Overlay::Chat {
            let blink = (self.started.elapsed().as_millis() / 300) % 2 == 0;
            draw_chat_dialog(
                &mut self.term.cur,
                self.transcript.iter(),
                &self.chat_input,
                blink,
            );
        }

        self.term.present()?;
        Ok(())
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let mut app = App::init(cfg)?;
    let result = app.run();
    if result.is_err() {
        // Leave the terminal usable even when the loop bailed out.
        let _ = app.term.end();
    }
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
