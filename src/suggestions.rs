use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::QaRecord;

const TOP_SUGGESTIONS: [&str; 4] = [
    "What are the must-see attractions in Phnom Penh?",
    "How do I get from Phnom Penh to Siem Reap?",
    "What is the best time to visit Angkor Wat?",
    "Recommended hotels in Battambang?",
];

/// City phrases in priority order, each with its own follow-ups.
const CITY_SUGGESTIONS: &[(&str, [&str; 4])] = &[
    (
        "phnom penh",
        [
            "What are the must-see attractions in Phnom Penh?",
            "Where should I stay in Phnom Penh?",
            "What is the best street food in Phnom Penh?",
            "How do I get around Phnom Penh?",
        ],
    ),
    (
        "siem reap",
        [
            "What is the best time to visit Angkor Wat?",
            "How much is an Angkor pass?",
            "What is there to do on Pub Street?",
            "How do I visit the floating villages on Tonle Sap?",
        ],
    ),
    (
        "battambang",
        [
            "Recommended hotels in Battambang?",
            "How do I ride the Bamboo Train?",
            "When is the bat exodus at Phnom Sampeau?",
            "How do I get from Phnom Penh to Battambang?",
        ],
    ),
];

const TOPIC_SUGGESTIONS: &[(&[&str], [&str; 4])] = &[
    (
        &["food", "eat", "restaurant"],
        [
            "What Khmer dishes should I try?",
            "Is street food safe to eat in Cambodia?",
            "What is the best street food in Phnom Penh?",
            "Where are the best restaurants in Siem Reap?",
        ],
    ),
    (
        &["hotel", "stay", "accommodation"],
        [
            "Where should I stay in Phnom Penh?",
            "What are the best areas to stay in Siem Reap?",
            "Recommended hotels in Battambang?",
            "How much does accommodation cost in Cambodia?",
        ],
    ),
    (
        &["transport", "travel", "get around"],
        [
            "How do I get from Phnom Penh to Siem Reap?",
            "How much does a tuk-tuk cost?",
            "Is there a ride-hailing app in Cambodia?",
            "How do I get from Phnom Penh to Battambang?",
        ],
    ),
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn top_suggestions() -> Vec<String> {
    owned(&TOP_SUGGESTIONS)
}

/// Picks a follow-up list from keywords in the raw user message: city names
/// first, then topic groups, then the static list.
pub fn dynamic_suggestions(raw_message: &str) -> Vec<String> {
    let lower_text = raw_message.to_lowercase();

    if let Some((_, list)) = CITY_SUGGESTIONS
        .iter()
        .find(|(city, _)| lower_text.contains(city))
    {
        return owned(list);
    }

    TOPIC_SUGGESTIONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower_text.contains(k)))
        .map(|(_, list)| owned(list))
        .unwrap_or_else(top_suggestions)
}

/// Up to three other questions about the same place as `records[matched]`.
pub fn related_suggestions<R: Rng + ?Sized>(
    records: &[QaRecord],
    matched: usize,
    rng: &mut R,
) -> Vec<String> {
    let Some(main) = records.get(matched) else {
        log::debug!("Related lookup for out-of-range index {}", matched);
        return top_suggestions().into_iter().take(3).collect();
    };

    let candidates: Vec<&QaRecord> = records
        .iter()
        .enumerate()
        .filter(|(i, r)| *i != matched && r.location == main.location && r.question != main.question)
        .map(|(_, r)| r)
        .collect();

    if candidates.is_empty() {
        return top_suggestions().into_iter().take(3).collect();
    }

    candidates
        .choose_multiple(rng, 3)
        .map(|r| r.question.clone())
        .collect()
}
