//! TF-IDF keyword extraction.
//!
//! Tokenization matches the conventional vectorizer defaults: lowercase,
//! tokens are runs of two or more word characters, English stop words removed.
//! IDF is smoothed: `ln((1 + n) / (1 + df)) + 1`, vectors are L2-normalised.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static token pattern is valid"))
}

pub fn is_stop_word(term: &str) -> bool {
    ENGLISH_STOP_WORDS.contains(&term)
}

/// Lowercased tokens in document order, stop words included.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lowercased tokens with stop words removed.
pub fn content_terms(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Raw term counts for one document.
pub fn term_counts(terms: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Scales a weight vector to unit L2 length. Zero vectors are left as-is.
pub fn l2_normalize(weights: &mut [f64]) {
    let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        weights.iter_mut().for_each(|w| *w /= norm);
    }
}

/// A fitted TF-IDF model: vocabulary with smoothed inverse document frequencies.
#[derive(Debug, Clone)]
pub struct TfIdf {
    idf: BTreeMap<String, f64>,
}

impl TfIdf {
    pub fn fit(documents: &[&str]) -> Self {
        let n = documents.len() as f64;
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for doc in documents {
            let terms = content_terms(doc);
            for term in term_counts(&terms).keys() {
                *document_frequency.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        let idf = document_frequency
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        Self { idf }
    }

    #[cfg(test)]
    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// Normalised `(term, weight)` pairs for a document; out-of-vocabulary terms are dropped.
    pub fn transform(&self, document: &str) -> Vec<(String, f64)> {
        let terms = content_terms(document);
        let counts = term_counts(&terms);

        let mut pairs: Vec<(String, f64)> = counts
            .into_iter()
            .filter_map(|(term, count)| {
                self.idf
                    .get(term)
                    .map(|idf| (term.to_string(), count as f64 * idf))
            })
            .collect();

        let mut weights: Vec<f64> = pairs.iter().map(|(_, w)| *w).collect();
        l2_normalize(&mut weights);
        for (pair, weight) in pairs.iter_mut().zip(weights) {
            pair.1 = weight;
        }
        pairs
    }
}

/// Top-`top_n` keywords of a single document by TF-IDF weight.
/// Ties are broken alphabetically so output is deterministic.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let model = TfIdf::fit(&[text]);
    let mut scored = model.transform(text);

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    scored.into_iter().take(top_n).map(|(term, _)| term).collect()
}
