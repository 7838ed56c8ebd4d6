use std::collections::HashMap;
use std::fmt::Debug;

use lazy_static::lazy_static;

/// Reduces a single lowercase token to its dictionary base form.
///
/// Implementations must return lowercase ASCII letters only and must be
/// idempotent: `lemmatize(lemmatize(t)) == lemmatize(t)`. The normalizer relies
/// on both properties to make cleaning a fixed point after one pass.
pub trait Lemmatizer: Send + Sync + Debug {
    fn lemmatize(&self, token: &str) -> String;
}

lazy_static! {
    /// Irregular forms and words the suffix rules would otherwise mangle.
    /// Every value is itself a fixed point of the rules.
    static ref IRREGULAR_FORMS: HashMap<&'static str, &'static str> = [
        // irregular plurals
        ("children", "child"), ("men", "man"), ("women", "woman"),
        ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"),
        ("geese", "goose"), ("knives", "knife"), ("leaves", "leaf"),
        ("wolves", "wolf"), ("lives", "life"), ("wives", "wife"),
        ("halves", "half"), ("shelves", "shelf"),
        // irregular verbs
        ("went", "go"), ("gone", "go"), ("bought", "buy"), ("brought", "bring"),
        ("ran", "run"), ("fell", "fall"), ("fallen", "fall"), ("wore", "wear"),
        ("worn", "wear"), ("tore", "tear"), ("torn", "tear"), ("sold", "sell"),
        ("shrank", "shrink"), ("shrunk", "shrink"), ("thought", "think"),
        ("felt", "feel"), ("kept", "keep"), ("sent", "send"), ("paid", "pay"),
        ("made", "make"), ("took", "take"), ("taken", "take"), ("gave", "give"),
        ("given", "give"), ("came", "come"), ("got", "get"), ("gotten", "get"),
        ("found", "find"), ("told", "tell"), ("said", "say"), ("saw", "see"),
        ("seen", "see"), ("broke", "break"), ("broken", "break"),
        // words ending in `s` that are already base forms
        ("always", "always"), ("perhaps", "perhaps"), ("yes", "yes"),
        ("sometimes", "sometimes"), ("afterwards", "afterwards"),
        ("besides", "besides"), ("towards", "towards"), ("whereas", "whereas"),
        ("overseas", "overseas"), ("news", "news"), ("lens", "lens"),
        ("series", "series"), ("species", "species"), ("thanks", "thanks"),
        ("chaos", "chaos"), ("canvas", "canvas"), ("atlas", "atlas"),
        ("bias", "bias"), ("alias", "alias"), ("kudos", "kudos"),
        // garments that only exist in plural
        ("jeans", "jeans"), ("pants", "pants"), ("shorts", "shorts"),
        ("leggings", "leggings"), ("trousers", "trousers"),
        ("clothes", "clothes"), ("glasses", "glasses"), ("tights", "tights"),
        ("scissors", "scissors"), ("pajamas", "pajamas"),
    ]
    .into_iter()
    .collect();
}

/// Consonants that are undoubled when a suffix is stripped (`running` -> `run`).
const UNDOUBLE: &[u8] = b"bgmnprt";
/// Doubled consonants that already end a base word (`falling` -> `fall`).
const KEEP_DOUBLE: &[u8] = b"lsfz";

/// Dictionary-free lemmatizer built from an irregular-form table and
/// conservative suffix rules.
///
/// Verbal `-ing`/`-ed` endings are only removed when the remaining stem ends in
/// a doubled consonant, so the output is always a real word rather than a
/// truncated stem. Rules are applied until nothing changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleLemmatizer;

impl RuleLemmatizer {
    pub fn new() -> Self {
        Self
    }

    /// One rule application. `None` when no rule changes the token.
    fn step(token: &str) -> Option<String> {
        if let Some(&base) = IRREGULAR_FORMS.get(token) {
            return (base != token).then(|| base.to_string());
        }
        if token.len() < 4 {
            return None;
        }

        if token.ends_with("sses") {
            return Some(token[..token.len() - 2].to_string());
        }
        if token.ends_with("ies") && token.len() > 4 {
            return Some(format!("{}y", &token[..token.len() - 3]));
        }
        if ["ches", "shes", "xes", "zzes"].iter().any(|suffix| token.ends_with(suffix)) {
            return Some(token[..token.len() - 2].to_string());
        }
        if token.ends_with('s') && !["ss", "us", "is"].iter().any(|suffix| token.ends_with(suffix)) {
            return Some(token[..token.len() - 1].to_string());
        }

        for suffix in ["ing", "ed"] {
            if let Some(stem) = token.strip_suffix(suffix) {
                return Self::doubled_stem(stem);
            }
        }
        None
    }

    fn doubled_stem(stem: &str) -> Option<String> {
        let bytes = stem.as_bytes();
        if bytes.len() < 3 {
            return None;
        }
        let last = bytes[bytes.len() - 1];
        if last != bytes[bytes.len() - 2] {
            return None;
        }
        if UNDOUBLE.contains(&last) {
            Some(stem[..stem.len() - 1].to_string())
        } else if KEEP_DOUBLE.contains(&last) {
            Some(stem.to_string())
        } else {
            None
        }
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        // every rule either shortens the token or lands on a fixed table entry
        let mut current = token.to_string();
        while let Some(next) = Self::step(&current) {
            current = next;
        }
        current
    }
}
