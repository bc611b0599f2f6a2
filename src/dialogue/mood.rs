//! Lexical mood classification

use std::fmt;

use serde::{Deserialize, Serialize};

use super::language::is_devanagari;

/// Coarse emotional tone of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Urgent,
}

impl MoodLabel {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SAD_CUES: &[&str] = &[
    "sad", "sadness", "unhappy", "depressed", "lonely", "miserable", "heartbroken", "crying",
    "cry", "grief", "feeling low", "दुखी", "उदास", "dukhi", "udaas",
];

const ANGRY_CUES: &[&str] = &[
    "angry", "mad", "furious", "annoyed", "irritated", "hate", "frustrated", "fed up",
    "गुस्सा", "नाराज़", "नाराज", "gussa", "naraz",
];

const HAPPY_CUES: &[&str] = &[
    "happy", "great", "awesome", "excited", "glad", "wonderful", "amazing", "love", "thanks",
    "thank you", "खुश", "मज़ा", "khush", "maza",
];

/// Cue sets in priority order; the first category with a hit wins
const CUES: &[(MoodLabel, &[&str])] = &[
    (MoodLabel::Sad, SAD_CUES),
    (MoodLabel::Angry, ANGRY_CUES),
    (MoodLabel::Happy, HAPPY_CUES),
];

/// Maps text to a [`MoodLabel`] via word and phrase cues
///
/// Priority is `sad > angry > happy > urgent > neutral`; categories are never
/// combined. `urgent` is signalled by an exclamation mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoodClassifier;

impl MoodClassifier {
    /// Classify `text`
    #[must_use]
    pub fn classify(&self, text: &str) -> MoodLabel {
        let normalized = normalize(text);

        for (mood, cues) in CUES {
            if cues.iter().any(|cue| contains_phrase(&normalized, cue)) {
                return *mood;
            }
        }

        if text.contains('!') {
            return MoodLabel::Urgent;
        }

        MoodLabel::Neutral
    }
}

/// Lower-case, turn punctuation (danda included) into spaces, and pad so
/// every word is surrounded by single spaces
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{0964}' | '\u{0965}' => ' ',
            c if c.is_alphanumeric() || is_devanagari(c) => c,
            _ => ' ',
        })
        .collect();

    let mut out = String::with_capacity(cleaned.len() + 2);
    out.push(' ');
    for word in cleaned.split_whitespace() {
        out.push_str(word);
        out.push(' ');
    }
    out
}

fn contains_phrase(normalized: &str, cue: &str) -> bool {
    normalized.contains(&format!(" {cue} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> MoodLabel {
        MoodClassifier.classify(text)
    }

    #[test]
    fn test_default_neutral() {
        assert_eq!(classify("What time is it?"), MoodLabel::Neutral);
        assert_eq!(classify(""), MoodLabel::Neutral);
    }

    #[test]
    fn test_each_category() {
        assert_eq!(classify("I am so sad today"), MoodLabel::Sad);
        assert_eq!(classify("I'm really ANGRY about this"), MoodLabel::Angry);
        assert_eq!(classify("That is awesome"), MoodLabel::Happy);
        assert_eq!(classify("Open the door now!"), MoodLabel::Urgent);
    }

    #[test]
    fn test_priority_order() {
        // sad beats happy
        assert_eq!(classify("I'm happy but also sad"), MoodLabel::Sad);
        // sad beats angry
        assert_eq!(classify("angry and lonely"), MoodLabel::Sad);
        // angry beats happy and urgent
        assert_eq!(classify("I love it but I'm furious!"), MoodLabel::Angry);
        // happy beats urgent
        assert_eq!(classify("Thanks!"), MoodLabel::Happy);
    }

    #[test]
    fn test_cues_match_whole_words() {
        // "made" must not trigger "mad", "glade" must not trigger "glad"
        assert_eq!(classify("I made a glade"), MoodLabel::Neutral);
        assert_eq!(classify("fed up with this"), MoodLabel::Angry);
    }

    #[test]
    fn test_hindi_cues() {
        assert_eq!(classify("मैं आज बहुत उदास हूँ"), MoodLabel::Sad);
        assert_eq!(classify("मुझे गुस्सा आ रहा है"), MoodLabel::Angry);
        assert_eq!(classify("मैं खुश हूँ"), MoodLabel::Happy);
    }

    #[test]
    fn test_hindi_cues_before_danda() {
        assert_eq!(classify("मैं बहुत उदास।"), MoodLabel::Sad);
        assert_eq!(classify("मुझे गुस्सा॥"), MoodLabel::Angry);
        assert_eq!(classify("मैं खुश।ठीक"), MoodLabel::Happy);
    }

    #[test]
    fn test_normalize_pads_words() {
        assert_eq!(normalize("Hello, World!"), " hello world ");
        assert_eq!(normalize("बहुत उदास।"), " बहुत उदास ");
    }
}
