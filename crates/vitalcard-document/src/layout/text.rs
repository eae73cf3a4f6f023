// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text measurement, fitting and wrapping for the built-in PDF faces.
//
// The built-in faces are not embedded, so widths are estimated from per-glyph
// classes of the Helvetica metrics. Courier is monospaced and exact.

use crate::pdf::canvas::FontFace;

/// Millimetres per typographic point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

const ELLIPSIS: char = '…';

/// Helvetica advance of one glyph, in em.
fn helvetica_advance(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' | '.' | ',' | ':' | ';' | '!' => 0.24,
        ' ' | 'f' | 't' | 'I' | '/' | '(' | ')' | '[' | ']' | '-' => 0.30,
        'r' => 0.34,
        'm' | 'M' | 'W' | '%' => 0.84,
        'w' | '@' => 0.76,
        '0'..='9' | '$' | '#' | '?' | '_' => 0.556,
        '—' => 1.0,
        '…' => 1.0,
        c if c.is_uppercase() => 0.69,
        c if c.is_lowercase() => 0.53,
        _ => 0.56,
    }
}

/// Estimated width of `text` set in `face` at `size_pt`, in millimetres.
pub fn text_width_mm(text: &str, size_pt: f32, face: FontFace) -> f32 {
    let em: f32 = match face {
        FontFace::Mono | FontFace::MonoBold => text.chars().count() as f32 * face.average_advance(),
        FontFace::Regular | FontFace::Italic => text.chars().map(helvetica_advance).sum(),
        FontFace::Bold => text.chars().map(helvetica_advance).sum::<f32>() * 1.06,
    };
    em * size_pt * MM_PER_PT
}

/// `text` unchanged when it fits `max_width_mm`, otherwise the longest prefix
/// that fits once an ellipsis is appended.
pub fn fit_text(text: &str, size_pt: f32, face: FontFace, max_width_mm: f32) -> String {
    if text_width_mm(text, size_pt, face) <= max_width_mm {
        return text.to_string();
    }

    let mut fitted = String::with_capacity(text.len());
    for c in text.chars() {
        fitted.push(c);
        let candidate = format!("{}{ELLIPSIS}", fitted.trim_end());
        if text_width_mm(&candidate, size_pt, face) > max_width_mm {
            fitted.pop();
            break;
        }
    }
    format!("{}{ELLIPSIS}", fitted.trim_end())
}

/// Wrap `text` into lines no wider than `max_width_mm`, breaking on
/// whitespace. A single word wider than the limit is force-broken.
pub fn wrap_text(text: &str, size_pt: f32, face: FontFace, max_width_mm: f32) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, size_pt, face) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in words {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
                continue;
            }

            // Oversized word: emit as many full chunks as needed.
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}
