//! Reply composition
//!
//! Decision precedence:
//! 1. a mood override template (sad, angry, happy, urgent)
//! 2. a keyword intent (how are you, time, date, joke, who are you, sing)
//! 3. a random acknowledgment from the default pool
//!
//! Every template carries one rendering per [`LanguageTag`]. A missing
//! translation is a compile error, not a runtime fallback.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use rand::Rng;

use super::language::LanguageTag;
use super::mood::MoodLabel;

/// Time format used in replies (`03:07 PM`)
pub const TIME_FORMAT: &str = "%I:%M %p";

/// Date format used in replies (`Monday, October 19, 2026`)
pub const DATE_FORMAT: &str = "%A, %B %d, %Y";

/// A template rendered in every supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Localized {
    pub en: &'static str,
    pub hi: &'static str,
}

impl Localized {
    /// Rendering for `language`
    #[must_use]
    pub const fn get(&self, language: LanguageTag) -> &'static str {
        match language {
            LanguageTag::En => self.en,
            LanguageTag::Hi => self.hi,
        }
    }
}

/// Mood override templates
pub mod templates {
    use super::Localized;

    pub const SAD: Localized = Localized {
        en: "I'm sorry you're feeling down, Boss. I'm right here with you.",
        hi: "यह सुनकर दुख हुआ, बॉस। मैं आपके साथ हूँ।",
    };

    pub const ANGRY: Localized = Localized {
        en: "I hear you, Boss. Let's take a breath and sort this out together.",
        hi: "मैं समझ रही हूँ, बॉस। चलिए शांति से इसे मिलकर सुलझाते हैं।",
    };

    pub const HAPPY: Localized = Localized {
        en: "Love the energy, Boss! What's next?",
        hi: "आपकी खुशी देखकर अच्छा लगा, बॉस! आगे क्या करें?",
    };

    pub const URGENT: Localized = Localized {
        en: "Right away, Boss. I'm on it.",
        hi: "तुरंत, बॉस। मैं लग गई हूँ।",
    };

    pub const HOW_ARE_YOU: Localized = Localized {
        en: "I'm fully operational and ready, Boss.",
        hi: "मैं पूरी तरह तैयार हूँ, बॉस।",
    };

    pub const TIME: Localized = Localized {
        en: "The current time is {time}.",
        hi: "अभी समय {time} है।",
    };

    pub const DATE: Localized = Localized {
        en: "Today's date is {date}.",
        hi: "आज की तारीख {date} है।",
    };

    pub const IDENTITY: Localized = Localized {
        en: "I am MINI, the Most Intelligent Narrative Instrument, designed by you, Boss.",
        hi: "मैं MINI हूँ, मोस्ट इंटेलिजेंट नैरेटिव इंस्ट्रूमेंट, जिसे आपने बनाया है, बॉस।",
    };

    pub const SING: Localized = Localized {
        en: "My singing skills are still in beta, Boss. But I can hum some data streams.",
        hi: "मेरा गाना अभी बीटा में है, बॉस। पर मैं कुछ डेटा स्ट्रीम गुनगुना सकती हूँ।",
    };

    pub const JOKES: &[Localized] = &[
        Localized {
            en: "Why did the AI go to therapy? Because it had too many neural issues.",
            hi: "AI थेरेपी पर क्यों गया? क्योंकि उसके न्यूरल मसले बहुत ज़्यादा थे।",
        },
        Localized {
            en: "I told a joke about algorithms, but it had no class.",
            hi: "मैंने एल्गोरिदम पर एक चुटकुला सुनाया, पर उसमें कोई क्लास नहीं थी।",
        },
        Localized {
            en: "They say AI will take over the world, but I'm still stuck in your laptop.",
            hi: "कहते हैं AI दुनिया पर राज करेगा, पर मैं तो अब भी आपके लैपटॉप में अटकी हूँ।",
        },
    ];

    pub const ACKNOWLEDGMENTS: &[Localized] = &[
        Localized {
            en: "At your service, Boss.",
            hi: "आपकी सेवा में, बॉस।",
        },
        Localized {
            en: "Task received, processing now.",
            hi: "काम मिल गया, अभी कर रही हूँ।",
        },
        Localized {
            en: "On it, Boss.",
            hi: "बस कर रही हूँ, बॉस।",
        },
        Localized {
            en: "Understood, executing your request.",
            hi: "समझ गई, आपका अनुरोध पूरा कर रही हूँ।",
        },
        Localized {
            en: "Working on it, stay sharp Boss.",
            hi: "काम चालू है, तैयार रहिए बॉस।",
        },
    ];
}

/// Override template for a mood, if it has one
#[must_use]
pub const fn mood_template(mood: MoodLabel) -> Option<Localized> {
    match mood {
        MoodLabel::Sad => Some(templates::SAD),
        MoodLabel::Angry => Some(templates::ANGRY),
        MoodLabel::Happy => Some(templates::HAPPY),
        MoodLabel::Urgent => Some(templates::URGENT),
        MoodLabel::Neutral => None,
    }
}

/// Keyword intents, in match order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    HowAreYou,
    Time,
    Date,
    Joke,
    Identity,
    Sing,
}

impl Intent {
    /// Declared match order
    pub const ALL: [Self; 6] = [
        Self::HowAreYou,
        Self::Time,
        Self::Date,
        Self::Joke,
        Self::Identity,
        Self::Sing,
    ];

    /// Lower-case substrings that trigger this intent
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::HowAreYou => &["how are you", "कैसे हो", "कैसी हो", "kaise ho"],
            Self::Time => &["time", "समय", "टाइम", "kitne baje"],
            Self::Date => &["date", "तारीख", "दिनांक"],
            Self::Joke => &["joke", "चुटकुला", "mazak"],
            Self::Identity => &["who are you", "तुम कौन", "आप कौन", "kaun ho"],
            Self::Sing => &["sing", "गाना", "gaana"],
        }
    }
}

/// Maps input text to an [`Intent`]
///
/// Seam for replacing keyword matching with real NLU.
pub trait IntentResolver: Send + Sync {
    /// Resolve the intent of `text`, if any
    fn resolve(&self, text: &str) -> Option<Intent>;
}

/// Case-insensitive substring matching, first declared intent wins
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentResolver;

impl IntentResolver for KeywordIntentResolver {
    fn resolve(&self, text: &str) -> Option<Intent> {
        let lowered = text.to_lowercase();
        Intent::ALL
            .into_iter()
            .find(|intent| intent.keywords().iter().any(|k| lowered.contains(k)))
    }
}

/// Picks an index from a non-empty pool
pub trait Chooser: Send + Sync {
    /// Return an index in `0..len`; `len` is never zero
    fn choose(&self, len: usize) -> usize;
}

/// Uniform choice from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomChooser;

impl Chooser for RandomChooser {
    fn choose(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Which rule produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Mood(MoodLabel),
    Intent(Intent),
    Acknowledgment,
}

/// Builds reply text from language, mood and intent
#[derive(Clone)]
pub struct ReplyComposer {
    intents: Arc<dyn IntentResolver>,
    chooser: Arc<dyn Chooser>,
    clock: Arc<dyn Clock>,
}

impl Default for ReplyComposer {
    fn default() -> Self {
        Self {
            intents: Arc::new(KeywordIntentResolver),
            chooser: Arc::new(RandomChooser),
            clock: Arc::new(SystemClock),
        }
    }
}

impl fmt::Debug for ReplyComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyComposer").finish_non_exhaustive()
    }
}

impl ReplyComposer {
    /// Create a composer with keyword intents, random choice and the wall clock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the intent resolver
    #[must_use]
    pub fn with_intent_resolver(mut self, intents: Arc<dyn IntentResolver>) -> Self {
        self.intents = intents;
        self
    }

    /// Replace the random chooser
    #[must_use]
    pub fn with_chooser(mut self, chooser: Arc<dyn Chooser>) -> Self {
        self.chooser = chooser;
        self
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Compose the reply for an utterance
    #[must_use]
    pub fn compose(&self, text: &str, language: LanguageTag, mood: MoodLabel) -> String {
        self.compose_with_source(text, language, mood).0
    }

    /// Compose the reply and report which rule produced it
    #[must_use]
    pub fn compose_with_source(
        &self,
        text: &str,
        language: LanguageTag,
        mood: MoodLabel,
    ) -> (String, ReplySource) {
        if let Some(template) = mood_template(mood) {
            return (template.get(language).to_string(), ReplySource::Mood(mood));
        }

        if let Some(intent) = self.intents.resolve(text) {
            return (self.render_intent(intent, language), ReplySource::Intent(intent));
        }

        let reply = self.pick(templates::ACKNOWLEDGMENTS).get(language).to_string();
        (reply, ReplySource::Acknowledgment)
    }

    fn render_intent(&self, intent: Intent, language: LanguageTag) -> String {
        match intent {
            Intent::HowAreYou => templates::HOW_ARE_YOU.get(language).to_string(),
            Intent::Time => {
                let time = self.clock.now().format(TIME_FORMAT).to_string();
                templates::TIME.get(language).replace("{time}", &time)
            }
            Intent::Date => {
                let date = self.clock.now().format(DATE_FORMAT).to_string();
                templates::DATE.get(language).replace("{date}", &date)
            }
            Intent::Joke => self.pick(templates::JOKES).get(language).to_string(),
            Intent::Identity => templates::IDENTITY.get(language).to_string(),
            Intent::Sing => templates::SING.get(language).to_string(),
        }
    }

    fn pick(&self, pool: &'static [Localized]) -> Localized {
        // Clamp so a misbehaving chooser can never index out of bounds
        let index = self.chooser.choose(pool.len()).min(pool.len() - 1);
        pool[index]
    }
}
