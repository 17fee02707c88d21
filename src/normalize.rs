use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Everything except letters, digits, whitespace and the currency/percent signs.
static NON_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s$%]").expect("static pattern is valid"));

/// A large, but not exhaustive, list of common English stop words.
/// Apostrophes are stripped before the lookup, so contractions appear in their
/// collapsed form.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an",
    "and", "any", "are", "arent", "as", "at", "be", "because", "been", "before",
    "being", "below", "between", "both", "but", "by", "can", "cant", "cannot",
    "could", "couldnt", "did", "didnt", "do", "does", "doesnt", "doing", "dont",
    "down", "during", "each", "few", "for", "from", "further", "had", "hadnt",
    "has", "hasnt", "have", "havent", "having", "he", "hed", "hell", "hes", "her",
    "here", "heres", "hers", "herself", "him", "himself", "his", "how", "hows",
    "i", "id", "ill", "im", "ive", "if", "in", "into", "is", "isnt", "it", "its",
    "itself", "just", "lets", "me", "more", "most", "mustnt", "my", "myself",
    "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other",
    "ought", "our", "ours", "ourselves", "out", "over", "own", "please", "same",
    "shant", "she", "shed", "shell", "shes", "should", "shouldnt", "so", "some",
    "such", "than", "that", "thats", "the", "their", "theirs", "them",
    "themselves", "then", "there", "theres", "these", "they", "theyd", "theyll",
    "theyre", "theyve", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasnt", "we", "wed", "well", "were", "weve",
    "werent", "what", "whats", "when", "whens", "where", "wheres", "which",
    "while", "who", "whos", "whom", "why", "whys", "will", "with", "wont",
    "would", "wouldnt", "you", "youd", "youll", "youre", "youve", "your",
    "yours", "yourself", "yourselves",
];

static STOP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// Inflected forms the suffix rules cannot reach.
const IRREGULAR: &[(&str, &str)] = &[
    ("went", "go"),
    ("gone", "go"),
    ("goes", "go"),
    ("going", "go"),
    ("got", "get"),
    ("gotten", "get"),
    ("ate", "eat"),
    ("eaten", "eat"),
    ("took", "take"),
    ("taken", "take"),
    ("saw", "see"),
    ("seen", "see"),
    ("bought", "buy"),
    ("paid", "pay"),
    ("made", "make"),
    ("better", "good"),
    ("children", "child"),
    ("people", "person"),
    ("women", "woman"),
    ("men", "man"),
    ("feet", "foot"),
    ("buses", "bus"),
];

/// Reduces free text to the token string the TF-IDF index is built from.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = NON_TEXT.replace_all(&lowered, "");
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .filter(|token| token.chars().count() > 2)
        .filter(|token| !STOP_SET.contains(token))
        .map(lemmatize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rule-based base form of a single lowercase token.
pub fn lemmatize(token: &str) -> String {
    if let Some((_, base)) = IRREGULAR.iter().find(|(form, _)| *form == token) {
        return base.to_string();
    }
    // Prices, years and non-Latin words are left alone.
    if !token.chars().all(|c| c.is_ascii_lowercase()) {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if token.ends_with("sses") {
        return token[..token.len() - 2].to_string();
    }
    for suffix in ["ches", "shes", "xes", "zes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].to_string();
        }
    }
    if token.len() > 3
        && token.ends_with('s')
        && !["ss", "us", "is"].iter().any(|end| token.ends_with(end))
    {
        return token[..token.len() - 1].to_string();
    }
    for suffix in ["ing", "ed"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.len() >= 4 {
                return undouble(stem).to_string();
            }
        }
    }
    token.to_string()
}

/// `shopp` -> `shop`, but `sell` and `pass` keep their double letters.
fn undouble(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n >= 2 && bytes[n - 1] == bytes[n - 2] && !b"aeioulsz".contains(&bytes[n - 1]) {
        &stem[..n - 1]
    } else {
        stem
    }
}
