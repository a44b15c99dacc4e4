//! 解析結果のテキスト表示

use crate::types::{Breakdown, WasteAnalysis};

fn breakdown_lines(title: &str, value: &Breakdown) -> Vec<String> {
    let mut lines = vec![format!("{}:", title)];
    match value {
        Breakdown::Text(text) => lines.push(format!("  {}", text)),
        Breakdown::Keyed(map) => {
            lines.extend(map.iter().map(|(key, text)| format!("  - {}: {}", key, text)));
        }
    }
    lines
}

/// 端末表示用に整形する
pub fn render_text(analysis: &WasteAnalysis) -> String {
    let mut lines = vec![format!("Waste Type: {}", analysis.waste_type), String::new()];

    lines.extend(breakdown_lines("Market Value", &analysis.market_value));
    lines.push(String::new());

    lines.push("Recycling Methods:".to_string());
    if analysis.recycling_methods.is_empty() {
        lines.push("  (none suggested)".to_string());
    }
    lines.extend(
        analysis
            .recycling_methods
            .iter()
            .enumerate()
            .map(|(i, method)| format!("  {}. {}", i + 1, method)),
    );
    lines.push(String::new());

    lines.push("Interested Industries:".to_string());
    if analysis.interested_industries.is_empty() {
        lines.push("  (none suggested)".to_string());
    } else {
        lines.push(format!("  {}", analysis.interested_industries.join(", ")));
    }
    lines.push(String::new());

    lines.extend(breakdown_lines("Environmental Impact", &analysis.environmental_impact));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
