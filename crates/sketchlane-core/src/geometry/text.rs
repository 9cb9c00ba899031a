//! Text measurement with a bounded width cache.

use std::collections::{HashMap, VecDeque};

use crate::elements::TextProps;

/// Number of `(text, font)` widths kept by [`TextMetrics`].
pub const TEXT_CACHE_CAPACITY: usize = 512;

/// Font parameters that affect measured width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontDescriptor {
    pub family: String,
    size_bits: u64,
    spacing_bits: u64,
}

impl FontDescriptor {
    pub fn new(family: impl Into<String>, size: f64, letter_spacing: f64) -> Self {
        Self {
            family: family.into(),
            size_bits: size.to_bits(),
            spacing_bits: letter_spacing.to_bits(),
        }
    }

    pub fn of(props: &TextProps) -> Self {
        Self::new(props.font_family.clone(), props.font_size, props.letter_spacing)
    }

    pub fn size(&self) -> f64 {
        f64::from_bits(self.size_bits)
    }

    pub fn letter_spacing(&self) -> f64 {
        f64::from_bits(self.spacing_bits)
    }
}

/// Measures the advance width of a single line of text.
pub trait TextMeasurer {
    fn measure_width(&self, text: &str, font: &FontDescriptor) -> f64;
}

/// Metric approximation used when the host supplies no font backend.
///
/// Widths vary per glyph class, so narrow and wide characters measure
/// differently.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMeasurer;

impl ApproximateMeasurer {
    fn char_factor(c: char, family: &str) -> f64 {
        let base = match c {
            'i' | 'l' | 'j' | '!' | '|' | '.' | ',' | ':' | ';' | '\'' => 0.28,
            'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' => 0.38,
            ' ' => 0.3,
            'm' | 'w' => 0.82,
            'M' | 'W' | '@' => 0.95,
            c if c.is_ascii_uppercase() => 0.68,
            c if c.is_ascii_digit() => 0.56,
            c if c.is_ascii() => 0.52,
            _ => 1.0,
        };
        match family {
            "Cascadia" | "monospace" => 0.6,
            "Helvetica" | "Nunito" => base * 0.96,
            _ => base,
        }
    }
}

impl TextMeasurer for ApproximateMeasurer {
    fn measure_width(&self, text: &str, font: &FontDescriptor) -> f64 {
        let size = font.size();
        let count = text.chars().count();
        let glyphs: f64 = text
            .chars()
            .map(|c| Self::char_factor(c, &font.family) * size)
            .sum();
        glyphs + font.letter_spacing() * count.saturating_sub(1) as f64
    }
}

/// Text layout helper owning a measurer and its width cache.
///
/// The cache is bounded; the oldest entry is evicted first.
pub struct TextMetrics {
    measurer: Box<dyn TextMeasurer>,
    cache: HashMap<(String, FontDescriptor), f64>,
    order: VecDeque<(String, FontDescriptor)>,
    capacity: usize,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self::new(Box::new(ApproximateMeasurer))
    }
}

impl std::fmt::Debug for TextMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMetrics")
            .field("cached", &self.cache.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl TextMetrics {
    pub fn new(measurer: Box<dyn TextMeasurer>) -> Self {
        Self::with_capacity(measurer, TEXT_CACHE_CAPACITY)
    }

    pub fn with_capacity(measurer: Box<dyn TextMeasurer>, capacity: usize) -> Self {
        Self {
            measurer,
            cache: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Width of one line of text.
    pub fn width(&mut self, text: &str, font: &FontDescriptor) -> f64 {
        let key = (text.to_string(), font.clone());
        if let Some(w) = self.cache.get(&key) {
            return *w;
        }
        let w = self.measurer.measure_width(text, font);
        if self.cache.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.cache.insert(key, w);
        w
    }

    /// Width of the widest single character in `text`.
    pub fn widest_char(&mut self, text: &str, font: &FontDescriptor) -> f64 {
        let mut buf = [0u8; 4];
        let mut widest = 0.0_f64;
        for c in text.chars().filter(|c| !c.is_control()) {
            let w = self.width(c.encode_utf8(&mut buf), font);
            widest = widest.max(w);
        }
        widest
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Explicit newlines always break. Words wider than the limit are split
    /// between characters.
    pub fn wrap(&mut self, text: &str, font: &FontDescriptor, max_width: f64) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split(' ') {
                let candidate = if line.is_empty() {
                    word.to_string()
                } else {
                    format!("{line} {word}")
                };
                if self.width(&candidate, font) <= max_width {
                    line = candidate;
                    continue;
                }
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                if self.width(word, font) <= max_width {
                    line = word.to_string();
                    continue;
                }
                for c in word.chars() {
                    let mut next = line.clone();
                    next.push(c);
                    if !line.is_empty() && self.width(&next, font) > max_width {
                        lines.push(std::mem::take(&mut line));
                        line.push(c);
                    } else {
                        line = next;
                    }
                }
            }
            lines.push(line);
        }
        lines
    }

    /// Measure a text block. Returns `(width, height)`.
    ///
    /// With `max_width` the block wraps and keeps that width; without it the
    /// block is as wide as its longest line.
    pub fn measure_block(&mut self, props: &TextProps, max_width: Option<f64>) -> (f64, f64) {
        let font = FontDescriptor::of(props);
        let line_px = props.line_px();
        match max_width {
            Some(max) => {
                let lines = self.wrap(&props.text, &font, max);
                (max, lines.len().max(1) as f64 * line_px)
            }
            None => {
                let lines: Vec<&str> = props.text.split('\n').collect();
                let width = lines
                    .iter()
                    .map(|l| self.width(l, &font))
                    .fold(0.0, f64::max);
                (width, lines.len().max(1) as f64 * line_px)
            }
        }
    }

    /// Recompute `width`/`height` of a text element from its content.
    pub fn relayout(&mut self, props: &mut TextProps) {
        let max = props.is_text_box.then_some(props.width);
        let (w, h) = self.measure_block(props, max);
        props.width = w;
        props.height = h;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn font() -> FontDescriptor {
        FontDescriptor::new("Virgil", 20.0, 0.0)
    }

    #[test]
    fn test_widths_are_not_monospace() {
        let m = ApproximateMeasurer;
        assert!(m.measure_width("W", &font()) > m.measure_width("i", &font()));
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut metrics = TextMetrics::with_capacity(Box::new(ApproximateMeasurer), 3);
        for word in ["a", "b", "c", "d", "e"] {
            metrics.width(word, &font());
        }
        assert_eq!(metrics.cached_len(), 3);
        let first = metrics.width("a", &font());
        assert!((first - metrics.width("a", &font())).abs() < f64::EPSILON);
    }

    #[test]
    fn test_widest_char() {
        let mut metrics = TextMetrics::default();
        let widest = metrics.widest_char("ilW", &font());
        assert!((widest - metrics.width("W", &font())).abs() < f64::EPSILON);
        assert_eq!(metrics.widest_char("", &font()), 0.0);
    }

    #[test]
    fn test_wrap_breaks_on_width() {
        let mut metrics = TextMetrics::default();
        let f = font();
        let limit = ["hello", "world", "again"]
            .iter()
            .map(|w| metrics.width(w, &f))
            .fold(0.0, f64::max)
            + 1.0;
        let lines = metrics.wrap("hello world again", &f, limit);
        assert_eq!(lines, vec!["hello", "world", "again"]);
        for line in &lines {
            assert!(metrics.width(line, &f) <= limit);
        }
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let mut metrics = TextMetrics::default();
        let f = font();
        let limit = metrics.width("abc", &f) + 0.5;
        let lines = metrics.wrap("abcdefg", &f, limit);
        assert!(lines.len() >= 3);
        assert_eq!(lines.concat(), "abcdefg");
    }

    #[test]
    fn test_relayout_auto_width() {
        let mut metrics = TextMetrics::default();
        let mut props = TextProps::new(Point::ZERO, "one\nthree");
        metrics.relayout(&mut props);
        assert!((props.height - 2.0 * props.line_px()).abs() < 1e-9);
        let f = FontDescriptor::of(&props);
        assert!((props.width - metrics.width("three", &f)).abs() < 1e-9);
    }
}
