//! English noun inflection used by naming-convention discovery.
//!
//! Association discovery only needs four questions answered about a word:
//! its plural, its singular, and whether it already is one or the other.
//! [`Inflector`] is the seam for plugging in a full inflection library;
//! [`EnglishInflector`] covers the regular rules plus a short irregular list,
//! which is enough for conventional table names.

/// Pluralization/singularization capability.
pub trait Inflector: Send + Sync {
    /// Plural form of `word`. Already-plural words are returned unchanged.
    fn pluralize(&self, word: &str) -> String;

    /// Singular form of `word`. Already-singular words are returned unchanged.
    fn singularize(&self, word: &str) -> String;

    /// Whether `word` is a plural noun.
    fn is_plural(&self, word: &str) -> bool {
        self.pluralize(&self.singularize(word)) == word
    }

    /// Whether `word` is a singular noun.
    fn is_singular(&self, word: &str) -> bool {
        self.singularize(word) == word
    }
}

/// (singular, plural) pairs that don't follow the suffix rules.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
    ("mouse", "mice"),
    ("datum", "data"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("analysis", "analyses"),
    ("crisis", "crises"),
    ("axis", "axes"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("life", "lives"),
];

/// Words whose singular and plural are identical.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "fish",
    "species",
];

/// Singulars ending in 's' whose plural adds "es".
const S_SINGULARS: &[&str] = &[
    "status", "alias", "campus", "bonus", "census", "virus", "canvas", "atlas", "bus", "gas", "lens",
    "bias", "plus",
];

/// Singulars ending in "ie" whose plural only adds 's'.
const IE_SINGULARS: &[&str] = &[
    "movie", "cookie", "pie", "tie", "lie", "calorie", "zombie", "rookie", "genie", "prairie",
    "brownie", "selfie", "goalie", "sortie",
];

/// Rule-based English inflector.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishInflector;

impl EnglishInflector {
    /// Create a new inflector.
    pub const fn new() -> Self {
        Self
    }

    /// Pluralize a word known to be singular.
    ///
    /// Rules:
    /// - Words ending in 's', 'x', 'ch', 'sh' -> add 'es'
    /// - Words ending in 'z' -> add 'es' (doubling the 'z' after a vowel)
    /// - Words ending in 'y' preceded by consonant -> change 'y' to 'ies'
    /// - Words ending in 'f' -> change to 'ves'
    /// - Words ending in 'o' preceded by consonant -> add 'es' (with exceptions)
    /// - Default: add 's'
    fn pluralize_singular(word: &str) -> String {
        if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
            return format!("{word}es");
        }

        if word.ends_with('z') {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() >= 2 && "aeiou".contains(chars[chars.len() - 2]) {
                return format!("{word}zes");
            }
            return format!("{word}es");
        }

        if let Some(stripped) = word.strip_suffix('y') {
            if let Some(prev) = stripped.chars().last() {
                if !"aeiou".contains(prev) {
                    return format!("{stripped}ies");
                }
            }
            return format!("{word}s");
        }

        if let Some(stripped) = word.strip_suffix('f') {
            return format!("{stripped}ves");
        }

        if word.ends_with('o') {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() >= 2 && !"aeiou".contains(chars[chars.len() - 2]) {
                let exceptions = ["photo", "piano", "halo", "memo", "pro", "auto", "video", "logo"];
                if !exceptions.contains(&word) {
                    return format!("{word}es");
                }
            }
        }

        format!("{word}s")
    }

    fn pluralize_word(word: &str) -> String {
        if word.is_empty() || UNCOUNTABLE.contains(&word) {
            return word.to_string();
        }
        if let Some((_, plural)) = IRREGULAR.iter().find(|(s, p)| *s == word || *p == word) {
            return (*plural).to_string();
        }
        Self::pluralize_singular(&Self::singularize_word(word))
    }

    fn singularize_word(word: &str) -> String {
        if word.is_empty() || UNCOUNTABLE.contains(&word) || S_SINGULARS.contains(&word) {
            return word.to_string();
        }
        if let Some((singular, _)) = IRREGULAR.iter().find(|(s, p)| *s == word || *p == word) {
            return (*singular).to_string();
        }
        if let Some(stem) = word.strip_suffix("es").filter(|stem| S_SINGULARS.contains(stem)) {
            return stem.to_string();
        }
        if let Some(stem) = word.strip_suffix('s').filter(|stem| IE_SINGULARS.contains(stem)) {
            return stem.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            if !stem.is_empty() {
                return format!("{stem}y");
            }
        }
        if let Some(stem) = word.strip_suffix("zzes") {
            return format!("{stem}z");
        }
        if let Some(stem) = word.strip_suffix("lves") {
            return format!("{stem}lf");
        }
        if let Some(stem) = word.strip_suffix("eaves") {
            return format!("{stem}eaf");
        }
        for suffix in ["sses", "xes", "ches", "shes", "zes", "oes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        if let Some(stem) = word.strip_suffix('s') {
            if !stem.is_empty() {
                return stem.to_string();
            }
        }
        word.to_string()
    }
}

impl Inflector for EnglishInflector {
    fn pluralize(&self, word: &str) -> String {
        let (head, last) = split_last_word(word);
        format!("{head}{}", Self::pluralize_word(last))
    }

    fn singularize(&self, word: &str) -> String {
        let (head, last) = split_last_word(word);
        format!("{head}{}", Self::singularize_word(last))
    }
}

/// Split `order_statuses` into `("order_", "statuses")`. Only the last word
/// of a compound name is inflected.
fn split_last_word(word: &str) -> (&str, &str) {
    match word.rfind('_') {
        Some(at) => word.split_at(at + 1),
        None => ("", word),
    }
}

/// Split an identifier into lowercase words on underscores and camel-case
/// boundaries (`isConnected` -> `["is", "connected"]`).
pub fn explode(word: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = word.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary =
                prev.is_lowercase() || (prev.is_uppercase() && next.is_some_and(char::is_lowercase));
            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
