use crate::pet::Action;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

const CHAT_INPUT_MAX: usize = 200;

#[derive(Clone, Debug)]
pub struct InputEvent {
    pub key: KeyCode,
    pub mods: KeyModifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
    Chat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Perform(Action),
    PerformSelected,
    SelectPrev,
    SelectNext,
    ToggleHelp,
    ToggleMute,
    OpenChat,
    ChatChar(char),
    ChatBackspace,
    ChatSubmit,
    ChatClose,
    Respawn,
    Quit,
}

pub fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

/// `typed` is the length of the chat line being edited.
pub fn map_event(overlay: Overlay, alive: bool, typed: usize, ev: &InputEvent) -> Option<Command> {
    if ev.mods.contains(KeyModifiers::CONTROL) && ev.key == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    // The chat dialog captures every key.
    if overlay == Overlay::Chat {
        return match ev.key {
            KeyCode::Esc => Some(Command::ChatClose),
            KeyCode::Enter => Some(Command::ChatSubmit),
            KeyCode::Backspace => Some(Command::ChatBackspace),
            KeyCode::Char(ch) if (' '..='~').contains(&ch) && typed < CHAT_INPUT_MAX => {
                Some(Command::ChatChar(ch))
            }
            _ => None,
        };
    }

    match ev.key {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Command::ToggleHelp),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Command::ToggleMute),
        KeyCode::Char('t') | KeyCode::Char('T') => Some(Command::OpenChat),
        KeyCode::Char('r') | KeyCode::Char('R') if !alive => Some(Command::Respawn),
        _ if !alive => None,
        KeyCode::Left => Some(Command::SelectPrev),
        KeyCode::Right => Some(Command::SelectNext),
        KeyCode::Up | KeyCode::Enter | KeyCode::Char(' ') => Some(Command::PerformSelected),
        KeyCode::Char(ch) => Action::ALL
            .into_iter()
            .find(|a| a.hotkey().eq_ignore_ascii_case(&ch))
            .map(Command::Perform),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent {
            key: code,
            mods: KeyModifiers::NONE,
        }
    }

    #[test]
    fn hotkeys_map_to_actions() {
        let cases = [
            ('f', Action::Feed),
            ('P', Action::Play),
            ('s', Action::Sleep),
            ('c', Action::Clean),
        ];
        for (ch, action) in cases {
            assert_eq!(
                map_event(Overlay::None, true, 0, &key(KeyCode::Char(ch))),
                Some(Command::Perform(action))
            );
        }
    }

    #[test]
    fn dead_pet_only_respawns() {
        assert_eq!(
            map_event(Overlay::None, false, 0, &key(KeyCode::Char('f'))),
            None
        );
        assert_eq!(
            map_event(Overlay::None, false, 0, &key(KeyCode::Char('r'))),
            Some(Command::Respawn)
        );
        assert_eq!(
            map_event(Overlay::None, true, 0, &key(KeyCode::Char('r'))),
            None
        );
        assert_eq!(
            map_event(Overlay::None, false, 0, &key(KeyCode::Char('q'))),
            Some(Command::Quit)
        );
    }

    #[test]
    fn chat_captures_letters() {
        assert_eq!(
            map_event(Overlay::Chat, true, 0, &key(KeyCode::Char('q'))),
            Some(Command::ChatChar('q'))
        );
        assert_eq!(
            map_event(Overlay::Chat, true, CHAT_INPUT_MAX, &key(KeyCode::Char('q'))),
            None
        );
        assert_eq!(
            map_event(Overlay::Chat, true, 0, &key(KeyCode::Esc)),
            Some(Command::ChatClose)
        );
        assert_eq!(
            map_event(Overlay::Chat, true, 0, &key(KeyCode::Char('é'))),
            None
        );
    }
}
