use crate::domain::model::{HistoryEntry, HistoryStatus, Recommendation};
use std::fmt::Write;

const TIP_PREVIEW_CHARS: usize = 80;

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TIP_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn render_recommendation(result: &Recommendation) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Recommendations for {}", result.query);
    let _ = writeln!(output);

    if result.top_picks.is_empty() {
        let _ = writeln!(output, "No restaurant found. Try a different query.");
        if let Some(error) = &result.source_error {
            let _ = writeln!(output, "(source error: {})", error);
        }
    } else {
        for (idx, place) in result.top_picks.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {}  ⭐ {:.2} ({} reviews)",
                idx + 1,
                place.name,
                place.average_rating,
                place.review_count
            );
            let _ = writeln!(output, "   📍 {}", place.address);
            if let Some(tip) = place.sample_tips.first() {
                let _ = writeln!(output, "   💬 {}", preview(tip));
            }
        }
    }

    let _ = writeln!(output);
    let status = match &result.history {
        HistoryStatus::Saved => "Saved top pick to history.".to_string(),
        HistoryStatus::AlreadyExists => "Top pick already in history.".to_string(),
        HistoryStatus::Skipped => "Nothing to save.".to_string(),
        HistoryStatus::Disabled => "History disabled.".to_string(),
        HistoryStatus::Failed(message) => format!("⚠️ Could not save history: {}", message),
    };
    let _ = writeln!(output, "{}", status);
    output
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Search History");

    if entries.is_empty() {
        let _ = writeln!(output, "No history yet.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:<19}  {:<28}  {:>6}  {:<14}  {}",
        "Timestamp", "Restaurant", "Rating", "Food", "Location"
    );
    for entry in entries {
        let _ = writeln!(
            output,
            "{:<19}  {:<28}  {:>6.2}  {:<14}  {}",
            entry.timestamp, entry.restaurant, entry.rating, entry.food, entry.location
        );
    }
    output
}
