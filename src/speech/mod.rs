//! Phrase tokenizer for the vox voice
//!
//! Turns a sentence into the ordered list of word recordings that speak it.

use std::path::PathBuf;

/// Splits sentences into word-audio paths
pub trait PhraseTokenizer: Send + Sync {
    /// Paths are relative to the board's sound directory
    fn voxify(&self, sentence: &str) -> Vec<PathBuf>;
}

/// Maps every word to `<dir>/<word>.<ext>`
#[derive(Debug, Clone)]
pub struct WordFileTokenizer {
    dir: PathBuf,
    extension: String,
}

impl WordFileTokenizer {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Words spoken for a single token
    fn words(token: &str) -> Vec<String> {
        let token = token.to_lowercase();

        if let Ok(n) = token.parse::<i64>() {
            return number_words(n);
        }

        let word: String = token
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();

        if word.is_empty() {
            Vec::new()
        } else {
            vec![word]
        }
    }
}

impl Default for WordFileTokenizer {
    fn default() -> Self {
        Self::new("vox", "wav")
    }
}

impl PhraseTokenizer for WordFileTokenizer {
    fn voxify(&self, sentence: &str) -> Vec<PathBuf> {
        let mut words = Vec::new();

        for raw in sentence.split_whitespace() {
            let trailing = raw.chars().last();
            let token = raw.trim_end_matches([',', '.']);
            words.extend(Self::words(token));

            match trailing {
                Some(',') => words.push("_comma".to_string()),
                Some('.') => words.push("_period".to_string()),
                _ => {}
            }
        }

        words
            .into_iter()
            .map(|w| self.dir.join(format!("{}.{}", w, self.extension)))
            .collect()
    }
}

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Spell an integer as separate words: `-42` → `minus forty two`
fn number_words(n: i64) -> Vec<String> {
    let mut out = Vec::new();
    if n < 0 {
        out.push("minus".to_string());
    }
    spell(n.unsigned_abs(), &mut out);
    out
}

fn spell(n: u64, out: &mut Vec<String>) {
    const SCALES: [(u64, &str); 3] = [
        (1_000_000_000, "billion"),
        (1_000_000, "million"),
        (1_000, "thousand"),
    ];

    if n < 20 {
        out.push(ONES[n as usize].to_string());
        return;
    }
    if n < 100 {
        out.push(TENS[(n / 10) as usize].to_string());
        if n % 10 != 0 {
            out.push(ONES[(n % 10) as usize].to_string());
        }
        return;
    }
    if n < 1_000 {
        out.push(ONES[(n / 100) as usize].to_string());
        out.push("hundred".to_string());
        if n % 100 != 0 {
            spell(n % 100, out);
        }
        return;
    }

    for (scale, name) in SCALES {
        if n >= scale {
            spell(n / scale, out);
            out.push(name.to_string());
            if n % scale != 0 {
                spell(n % scale, out);
            }
            return;
        }
    }
}
