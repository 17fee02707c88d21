use rand::Rng;

use crate::index::CorpusIndex;
use crate::intent::{classify, Intent};
use crate::llm::LlmFallback;
use crate::model::{ContextMessage, QaRecord, Reply};
use crate::normalize::normalize;
use crate::suggestions::{dynamic_suggestions, related_suggestions, top_suggestions};

pub const NO_DATA_MESSAGE: &str =
    "I'm sorry, my Cambodia travel information isn't available right now. Please try again later.";
pub const EMPTY_MESSAGE: &str =
    "Please type a question about traveling in Cambodia and I'll do my best to help.";
pub const GREETING_MESSAGE: &str = "Hello! I can help you with information about traveling in Cambodia, especially Phnom Penh, Siem Reap, and Battambang. What would you like to know?";
pub const THANK_YOU_MESSAGE: &str =
    "You're welcome! Is there anything else you'd like to know about traveling in Cambodia?";
pub const GOODBYE_MESSAGE: &str = "Goodbye! Enjoy your trip to Cambodia.";
pub const NOT_SURE_MESSAGE: &str =
    "I'm not sure I understand. Could you please rephrase your question about Cambodia travel?";
pub const DISCLAIMER: &str =
    "\n\nI'm not completely sure this answers your question. Feel free to ask more specifically.";

pub const LOW_CONFIDENCE: f32 = 0.2;
pub const HIGH_CONFIDENCE: f32 = 0.4;

/// Confidence band of a similarity score. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    NotSure,
    Related,
    Confident,
}

impl Band {
    pub fn of(confidence: f32) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            Band::Confident
        } else if confidence >= LOW_CONFIDENCE {
            Band::Related
        } else {
            Band::NotSure
        }
    }
}

/// A locally composed reply and, for corpus lookups, the band it fell in.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub reply: Reply,
    pub band: Option<Band>,
}

impl Composition {
    fn canned(reply: Reply) -> Self {
        Self { reply, band: None }
    }
}

/// Answers `/process` requests. Built once at startup and read-only after.
pub struct Responder {
    records: Vec<QaRecord>,
    index: CorpusIndex,
    fallback: Option<LlmFallback>,
}

impl Responder {
    pub fn new(records: Vec<QaRecord>) -> Self {
        let questions: Vec<String> = records.iter().map(|r| r.question.clone()).collect();
        let index = CorpusIndex::build(&questions);
        log::info!(
            "Indexed {} questions over a vocabulary of {} terms",
            index.len(),
            index.vocabulary_len()
        );
        Self {
            records,
            index,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<LlmFallback>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }

    pub fn fallback_provider(&self) -> Option<&str> {
        self.fallback.as_ref().map(|f| f.provider_name())
    }

    /// The local pipeline: canned intents, then the similarity lookup with
    /// confidence banding. `rng` drives related-suggestion sampling.
    pub fn compose<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> Composition {
        if self.index.is_empty() {
            return Composition::canned(Reply::new(NO_DATA_MESSAGE, Vec::new(), 0.0));
        }
        if message.trim().is_empty() {
            return Composition::canned(Reply::new(EMPTY_MESSAGE, top_suggestions(), 0.0));
        }

        let intent = classify(message);
        log::debug!("Intent for {:?}: {}", message, intent.as_str());
        match intent {
            Intent::Greeting => {
                return Composition::canned(Reply::new(GREETING_MESSAGE, top_suggestions(), 1.0))
            }
            Intent::ThankYou => {
                return Composition::canned(Reply::new(THANK_YOU_MESSAGE, top_suggestions(), 1.0))
            }
            Intent::Goodbye => {
                return Composition::canned(Reply::new(GOODBYE_MESSAGE, Vec::new(), 1.0))
            }
            Intent::Query => {}
        }

        let Some(best) = self.index.best_match(&normalize(message)) else {
            return Composition::canned(Reply::new(NO_DATA_MESSAGE, Vec::new(), 0.0));
        };
        let band = Band::of(best.confidence);
        log::debug!(
            "Best match #{} at {:.3} ({:?})",
            best.index,
            best.confidence,
            band
        );

        let reply = match band {
            Band::NotSure => Reply::new(
                NOT_SURE_MESSAGE,
                dynamic_suggestions(message),
                best.confidence,
            ),
            Band::Related => Reply::new(
                format!("{}{}", self.records[best.index].answer, DISCLAIMER),
                related_suggestions(&self.records, best.index, rng),
                best.confidence,
            ),
            Band::Confident => Reply::new(
                self.records[best.index].answer.clone(),
                related_suggestions(&self.records, best.index, rng),
                best.confidence,
            ),
        };
        Composition {
            reply,
            band: Some(band),
        }
    }

    /// Full answer: the local pipeline, with the LLM fallback standing in for
    /// the "not sure" reply when one is configured and succeeds.
    pub async fn answer(&self, message: &str, context: &[ContextMessage]) -> Reply {
        let composition = {
            let mut rng = rand::thread_rng();
            self.compose(message, &mut rng)
        };

        let (Some(Band::NotSure), Some(fallback)) = (composition.band, &self.fallback) else {
            return composition.reply;
        };

        match fallback.answer(message, context).await {
            Ok(answer) => Reply::new(
                answer.message,
                answer.suggestions,
                composition.reply.confidence,
            ),
            Err(e) => {
                log::error!("LLM fallback failed: {:#}", e);
                composition.reply
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tests::{memory_cache, MockBackend};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn record(question: &str, answer: &str, location: &str) -> QaRecord {
        QaRecord {
            question: question.to_string(),
            answer: answer.to_string(),
            location: location.to_string(),
        }
    }

    fn corpus() -> Vec<QaRecord> {
        vec![
            record(
                "What is the best time to visit Angkor Wat?",
                "November to February.",
                "Siem Reap",
            ),
            record(
                "Where is the Royal Palace?",
                "On Sothearos Boulevard.",
                "Phnom Penh",
            ),
            record(
                "How do I ride the Bamboo Train?",
                "Take a tuk-tuk to the O Sralau station.",
                "Battambang",
            ),
            record(
                "Which temples near Siem Reap are best for sunrise photography with a tripod?",
                "Angkor Wat and Srah Srang.",
                "Siem Reap",
            ),
        ]
    }

    fn compose(responder: &Responder, message: &str) -> Composition {
        responder.compose(message, &mut StdRng::seed_from_u64(42))
    }

    #[actix_web::test]
    async fn exact_question_returns_its_answer() {
        let responder = Responder::new(corpus());
        let reply = responder.answer("best time to visit angkor wat", &[]).await;
        assert_eq!(reply.message, "November to February.");
        assert!(reply.confidence >= 0.4);
        assert_eq!(
            reply.suggestions,
            vec!["Which temples near Siem Reap are best for sunrise photography with a tripod?"]
        );
    }

    #[test]
    fn greeting_substring_wins_with_full_confidence() {
        let responder = Responder::new(corpus());
        let c = compose(&responder, "hey there");
        assert_eq!(c.reply.message, GREETING_MESSAGE);
        assert_eq!(c.reply.confidence, 1.0);
        assert_eq!(c.reply.suggestions, top_suggestions());
        assert_eq!(c.band, None);
    }

    #[test]
    fn thanks_and_goodbye_are_canned() {
        let responder = Responder::new(corpus());
        let thanks = compose(&responder, "Thanks!").reply;
        assert_eq!(thanks.message, THANK_YOU_MESSAGE);
        assert_eq!(thanks.suggestions, top_suggestions());

        let bye = compose(&responder, "bye now").reply;
        assert_eq!(bye.message, GOODBYE_MESSAGE);
        assert_eq!(bye.confidence, 1.0);
        assert!(bye.suggestions.is_empty());
    }

    #[test]
    fn blank_message_prompts_for_input() {
        let responder = Responder::new(corpus());
        for message in ["", "   \n\t"] {
            let reply = compose(&responder, message).reply;
            assert_eq!(reply.message, EMPTY_MESSAGE);
            assert_eq!(reply.confidence, 0.0);
            assert_eq!(reply.suggestions, top_suggestions());
        }
    }

    #[test]
    fn empty_corpus_apologizes() {
        let responder = Responder::new(Vec::new());
        let reply = compose(&responder, "hello").reply;
        assert_eq!(reply.message, NO_DATA_MESSAGE);
        assert!(reply.suggestions.is_empty());
        assert_eq!(reply.confidence, 0.0);
    }

    #[test]
    fn band_boundaries_are_inclusive_below() {
        assert_eq!(Band::of(0.0), Band::NotSure);
        assert_eq!(Band::of(0.199), Band::NotSure);
        assert_eq!(Band::of(0.2), Band::Related);
        assert_eq!(Band::of(0.399), Band::Related);
        assert_eq!(Band::of(0.4), Band::Confident);
        assert_eq!(Band::of(1.0), Band::Confident);
    }

    #[test]
    fn unknown_words_are_not_sure_with_keyword_suggestions() {
        let responder = Responder::new(corpus());
        let c = compose(&responder, "where to eat durian");
        assert_eq!(c.band, Some(Band::NotSure));
        assert_eq!(c.reply.message, NOT_SURE_MESSAGE);
        assert_eq!(c.reply.confidence, 0.0);
        assert_eq!(c.reply.suggestions, dynamic_suggestions("where to eat durian"));
    }

    #[test]
    fn weak_match_gets_disclaimer() {
        let responder = Responder::new(corpus());
        let c = compose(&responder, "photography");
        assert_eq!(c.band, Some(Band::Related));
        assert!(c.reply.confidence >= 0.2 && c.reply.confidence < 0.4);
        assert_eq!(
            c.reply.message,
            format!("Angkor Wat and Srah Srang.{}", DISCLAIMER)
        );
        assert_eq!(
            c.reply.suggestions,
            vec!["What is the best time to visit Angkor Wat?"]
        );
    }

    #[actix_web::test]
    async fn fallback_replaces_not_sure_reply() {
        let backend = MockBackend::new(vec![
            Ok("Try the durian stalls at Kampot market."),
            Ok("Is durian expensive?\nWhen is durian season?"),
        ]);
        let fallback = LlmFallback::new(Box::new(backend), memory_cache(), Duration::from_secs(5));
        let responder = Responder::new(corpus()).with_fallback(Some(fallback));

        let reply = responder.answer("where to eat durian", &[]).await;
        assert_eq!(reply.message, "Try the durian stalls at Kampot market.");
        assert_eq!(
            reply.suggestions,
            vec!["Is durian expensive?", "When is durian season?"]
        );
        assert_eq!(reply.confidence, 0.0);
    }

    #[actix_web::test]
    async fn fallback_is_skipped_for_good_matches_and_failures_degrade() {
        let backend = MockBackend::new(vec![Err("provider down")]);
        let calls = backend.calls.clone();
        let fallback = LlmFallback::new(Box::new(backend), memory_cache(), Duration::from_secs(5));
        let responder = Responder::new(corpus()).with_fallback(Some(fallback));

        let good = responder.answer("Where is the Royal Palace?", &[]).await;
        assert_eq!(good.message, "On Sothearos Boulevard.");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        let degraded = responder.answer("where to eat durian", &[]).await;
        assert_eq!(degraded.message, NOT_SURE_MESSAGE);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
