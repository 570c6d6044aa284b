//! Turns a ranked prediction list into the content of the results region.
//!
//! Every call yields the complete region content. The page swaps it in
//! wholesale, so nothing from an earlier render survives.

use serde::Serialize;

use crate::models::Prediction;

pub const FALLBACK_MESSAGE: &str = "No items detected. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub lines: Vec<String>,
    pub html: String,
}

pub fn render(predictions: Option<&[Prediction]>) -> Rendered {
    match predictions {
        Some(predictions) if !predictions.is_empty() => {
            let lines: Vec<String> = predictions.iter().map(format_line).collect();
            let html = lines
                .iter()
                .map(|line| format!("<div><p>{}</p></div>", escape_html(line)))
                .collect();
            Rendered { lines, html }
        }
        _ => fallback(),
    }
}

/// Error state: the message followed by the usual fallback line.
pub fn render_error(message: &str) -> Rendered {
    Rendered {
        lines: vec![message.to_string(), FALLBACK_MESSAGE.to_string()],
        html: format!(
            "<p class=\"error\">{}</p><p>{}</p>",
            escape_html(message),
            FALLBACK_MESSAGE
        ),
    }
}

fn fallback() -> Rendered {
    Rendered {
        lines: vec![FALLBACK_MESSAGE.to_string()],
        html: format!("<p>{}</p>", FALLBACK_MESSAGE),
    }
}

fn format_line(prediction: &Prediction) -> String {
    format!(
        "{} - Probability: {:.2}",
        prediction.label, prediction.probability
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
