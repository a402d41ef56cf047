use owo_colors::OwoColorize;
use zoekt_nav_core::TreeIcon;
use zoekt_nav_core::TreeItem;

/// Splits `text` into `(segment, highlighted)` runs.
///
/// Ranges are clamped to the text; ranges that overlap an earlier one or do
/// not fall on char boundaries are dropped.
pub fn split_highlights<'a>(text: &'a str, ranges: &[(usize, usize)]) -> Vec<(&'a str, bool)> {
    let mut sorted: Vec<(usize, usize)> = ranges
        .iter()
        .map(|&(start, end)| (start.min(text.len()), end.min(text.len())))
        .filter(|(start, end)| start < end)
        .collect();
    sorted.sort_unstable();

    let mut runs = Vec::new();
    let mut cursor = 0;
    for (start, end) in sorted {
        if start < cursor || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        if start > cursor {
            runs.push((&text[cursor..start], false));
        }
        runs.push((&text[start..end], true));
        cursor = end;
    }
    if cursor < text.len() {
        runs.push((&text[cursor..], false));
    }
    runs
}

pub fn highlighted(text: &str, ranges: &[(usize, usize)]) -> String {
    split_highlights(text, ranges)
        .into_iter()
        .map(|(segment, highlight)| {
            if highlight {
                segment.bold().bright_yellow().to_string()
            } else {
                segment.to_string()
            }
        })
        .collect()
}

pub fn print_summary(item: &TreeItem) {
    let scope = match item.icon {
        Some(TreeIcon::Globe) => "all repositories",
        _ => "local repositories",
    };
    println!(
        "{} {} {}",
        item.label.bright_blue().bold(),
        item.description.as_deref().unwrap_or_default().bright_cyan(),
        format!("[{scope}]").bright_black()
    );
}

pub fn print_welcome(item: &TreeItem) {
    println!("{}", item.label.bright_black());
}

pub fn print_file(item: &TreeItem) {
    println!();
    println!(
        "{} {}",
        item.label.bright_cyan(),
        item.tooltip.as_deref().unwrap_or_default().bright_black()
    );
}

pub fn print_line(item: &TreeItem, line_number: u32) {
    println!(
        "  {} {}",
        format!("{line_number:>5}:").bright_black(),
        highlighted(&item.label, &item.highlights)
    );
}
