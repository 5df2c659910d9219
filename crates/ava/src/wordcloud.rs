//! Word cloud rendering to SVG.
//!
//! Words are counted case-insensitively with common English stop words
//! removed, the most frequent are kept, and each is placed along an
//! Archimedean spiral from the centre until it no longer overlaps an
//! earlier word.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

pub const SVG_MIME: &str = "image/svg+xml";

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w[\w']+").expect("valid word pattern"));

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "cannot", "com", "could", "couldn't", "did", "didn't",
    "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "else", "ever", "few",
    "for", "from", "further", "get", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "he", "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him",
    "himself", "his", "how", "how's", "however", "http", "i", "i'd", "i'll", "i'm", "i've", "if",
    "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just", "k", "let's", "like",
    "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on",
    "once", "only", "or", "other", "otherwise", "ought", "our", "ours", "ourselves", "out",
    "over", "own", "r", "same", "shall", "shan't", "she", "she'd", "she'll", "she's", "should",
    "shouldn't", "since", "so", "some", "such", "than", "that", "that's", "the", "their",
    "theirs", "them", "themselves", "then", "there", "there's", "therefore", "these", "they",
    "they'd", "they'll", "they're", "they've", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasn't", "we", "we'd", "we'll", "we're", "we've", "were",
    "weren't", "what", "what's", "when", "when's", "where", "where's", "which", "while", "who",
    "who's", "whom", "why", "why's", "with", "won't", "would", "wouldn't", "www", "you",
    "you'd", "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
];

#[derive(Debug, Clone)]
pub struct WordCloud {
    pub width: u32,
    pub height: u32,
    pub max_words: usize,
    pub max_font_size: f32,
    pub min_font_size: f32,
    stopwords: HashSet<&'static str>,
}

impl Default for WordCloud {
    fn default() -> Self {
        Self {
            width: 1980,
            height: 1080,
            max_words: 100,
            max_font_size: 220.0,
            min_font_size: 14.0,
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Rect {
    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

impl WordCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most frequent words, highest count first (ties alphabetical), capped
    /// at `max_words`.
    pub fn frequencies(&self, text: &str) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for m in WORD_PATTERN.find_iter(text) {
            let word = m.as_str().to_lowercase();
            let word = word.strip_suffix("'s").unwrap_or(&word);
            if word.chars().all(|c| c.is_ascii_digit()) || self.stopwords.contains(word) {
                continue;
            }
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }

        let mut words: Vec<(String, usize)> = counts.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(self.max_words);
        words
    }

    /// SVG bytes on a transparent background, or `None` when the text has
    /// no countable words.
    pub fn render_svg(&self, text: &str) -> Option<Vec<u8>> {
        let words = self.frequencies(text);
        let top = words.first()?.1 as f32;

        let mut placed: Vec<Rect> = Vec::with_capacity(words.len());
        let mut body = String::new();
        let total = words.len();

        for (rank, (word, count)) in words.iter().enumerate() {
            let scale = *count as f32 / top;
            let mut size = self.min_font_size + (self.max_font_size - self.min_font_size) * scale;

            let slot = loop {
                if let Some(rect) = self.find_slot(word, size, &placed) {
                    break Some(rect);
                }
                size *= 0.85;
                if size < self.min_font_size {
                    break None;
                }
            };

            let Some(rect) = slot else {
                tracing::debug!(word = %word, "No room left in word cloud");
                continue;
            };
            placed.push(rect);

            let (r, g, b) = cool_colour(rank, total);
            let _ = writeln!(
                body,
                r#"  <text x="{:.1}" y="{:.1}" font-size="{:.1}" fill="rgb({},{},{})">{}</text>"#,
                rect.x,
                rect.y + size * 0.8,
                size,
                r,
                g,
                b,
                escape_xml(word)
            );
        }

        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"Helvetica, Arial, sans-serif\" font-weight=\"bold\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = body
        );
        Some(svg.into_bytes())
    }

    fn find_slot(&self, word: &str, size: f32, placed: &[Rect]) -> Option<Rect> {
        let w = word.chars().count() as f32 * size * 0.6;
        let h = size;
        let (width, height) = (self.width as f32, self.height as f32);
        if w > width || h > height {
            return None;
        }

        let (cx, cy) = (width / 2.0, height / 2.0);
        let mut theta: f32 = 0.0;
        while theta < 400.0 {
            let radius = 4.0 * theta;
            let rect = Rect {
                x: cx + radius * theta.cos() - w / 2.0,
                y: cy + radius * theta.sin() * (height / width) - h / 2.0,
                w,
                h,
            };
            let inside =
                rect.x >= 0.0 && rect.y >= 0.0 && rect.x + w <= width && rect.y + h <= height;
            if inside && !placed.iter().any(|p| p.overlaps(&rect)) {
                return Some(rect);
            }
            theta += 0.1;
        }
        None
    }
}

/// Cyan to magenta across the ranked words.
fn cool_colour(rank: usize, total: usize) -> (u8, u8, u8) {
    let t = if total > 1 {
        rank as f32 / (total - 1) as f32
    } else {
        0.0
    };
    ((t * 255.0).round() as u8, ((1.0 - t) * 255.0).round() as u8, 255)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}
