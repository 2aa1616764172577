//! Word-list sentiment heuristic. No model, no state.

use std::collections::HashSet;
use std::fmt;

const POSITIVE: &[&str] = &[
    "love", "like", "yay", "good", "great", "happy", "fun", "nice", "awesome", "cool", "enjoy",
    "cute", "sweet", "bravo", "wow", "woo", "thanks", "thank you", "yummy", "delicious", "delish",
];

const NEGATIVE: &[&str] = &[
    "sad", "angry", "mad", "hate", "bad", "terrible", "awful", "boring", "tired", "exhausted",
    "dirty", "ew", "eww", "yuck", "hungry", "starving", "lonely", "cry", "upset", "ugh", "grr",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Positive => "positive",
            Label::Negative => "negative",
            Label::Neutral => "neutral",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sentiment {
    pub score: f64,
    pub label: Label,
}

impl Sentiment {
    pub const NEUTRAL: Sentiment = Sentiment {
        score: 0.0,
        label: Label::Neutral,
    };
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

// Each vocabulary entry counts at most once, however often it appears.
fn hits(vocab: &[&str], tokens: &HashSet<&str>, text: &str) -> i32 {
    vocab
        .iter()
        .filter(|entry| {
            if entry.contains(' ') {
                text.contains(&format!(" {entry} "))
            } else {
                tokens.contains(*entry)
            }
        })
        .count() as i32
}

/// Score `text` into [-1,1].
///
/// Matches whole words, not substrings: "new" does not count as "ew" and
/// "funny" does not count as "fun".
pub fn score(text: &str) -> Sentiment {
    let toks = words(text);
    let joined = format!(" {} ", toks.join(" "));
    let set: HashSet<&str> = toks.iter().map(String::as_str).collect();

    let pos = hits(POSITIVE, &set, &joined);
    let neg = hits(NEGATIVE, &set, &joined);
    if pos == 0 && neg == 0 {
        return Sentiment::NEUTRAL;
    }

    let s = (pos - neg) as f64 / (pos + neg).max(1) as f64;
    let label = if s > 0.0 {
        Label::Positive
    } else if s < 0.0 {
        Label::Negative
    } else {
        Label::Neutral
    };
    Sentiment {
        score: s.clamp(-1.0, 1.0),
        label,
    }
}
