use chrono::{DateTime, Utc};
use colored::Colorize;
use joplin_sticky::commands::note::NoteInfo;
use joplin_sticky::commands::{CmdMessage, MessageLevel};
use joplin_sticky::config::{StickyConfig, CONFIG_KEYS};
use joplin_sticky::model::NoteWindow;
use joplin_sticky::picker::{PickerRow, RowKind};
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 80;
const INDENT: &str = "  ";
const NUMBER_WIDTH: usize = 5;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_rows(rows: &[PickerRow]) {
    if rows.is_empty() {
        println!("No notes available.");
        return;
    }

    for row in rows {
        let indent = INDENT.repeat(row.depth);
        match &row.kind {
            RowKind::Notebook => {
                let available = LINE_WIDTH.saturating_sub(indent.width() + NUMBER_WIDTH);
                println!(
                    "{}{}{}",
                    " ".repeat(NUMBER_WIDTH),
                    indent,
                    truncate_to_width(&row.title, available).bold()
                );
            }
            RowKind::Note { number, .. } => {
                let idx = format!("{:>width$}. ", number, width = NUMBER_WIDTH - 2);
                let available = LINE_WIDTH.saturating_sub(indent.width() + idx.width());
                println!(
                    "{}{}{}",
                    idx.yellow(),
                    indent,
                    truncate_to_width(&row.title, available)
                );
            }
        }
    }
}

pub(super) fn print_info(info: &NoteInfo) {
    println!("{}", info.title.bold());
    println!("--------------------------------");
    println!("{:<10}{}", "id", info.id);
    if let Some(notebook) = &info.notebook {
        println!("{:<10}{}", "notebook", notebook);
    }
    println!("{:<10}{}", "created", format_date(info.created));
    println!("{:<10}{}", "updated", format_date(info.updated));
    if info.is_todo {
        println!("{:<10}{}", "due", format_date(info.due));
    }
}

pub(super) fn print_windows(windows: &[NoteWindow]) {
    if windows.is_empty() {
        println!("No windows open.");
        return;
    }

    for (i, window) in windows.iter().enumerate() {
        let idx = format!("{:>3}. ", i + 1);
        let mut flags = Vec::new();
        if !window.visible {
            flags.push("hidden");
        }
        if !window.body_visible {
            flags.push("collapsed");
        }
        if window.note_id.is_none() {
            flags.push("blank");
        }
        let g = window.geometry;
        let place = format!("{}x{}+{}+{}", g.width, g.height, g.x, g.y);
        let suffix = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };

        let available = LINE_WIDTH.saturating_sub(idx.width() + place.width() + suffix.width() + 1);
        let title = truncate_to_width(&window.title, available);
        let padding = available.saturating_sub(title.width());

        let title = if window.visible {
            title.normal()
        } else {
            title.dimmed()
        };
        println!(
            "{}{}{} {}{}",
            idx.yellow(),
            title,
            " ".repeat(padding),
            place.dimmed(),
            suffix.dimmed()
        );
    }
}

pub(super) fn print_config(config: &StickyConfig) {
    for key in CONFIG_KEYS {
        if let Some(value) = config.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

/// Fits `s` into `max_width` columns, marking a cut with `…`.
fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut kept: String = s
        .chars()
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= budget
        })
        .collect();
    if max_width > 0 {
        kept.push('…');
    }
    kept
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    let Some(date) = date else {
        return "-".to_string();
    };
    let duration = Utc::now().signed_duration_since(date);
    let relative = match duration.to_std() {
        Ok(past) => Formatter::new().convert(past),
        // due dates lie ahead
        Err(_) => {
            let mut ahead = Formatter::new();
            ahead.ago("");
            let until = ahead.convert((-duration).to_std().unwrap_or_default());
            format!("in {}", until.trim_end())
        }
    };
    format!("{} ({})", date.format("%Y-%m-%d %H:%M"), relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_that_fit_are_untouched() {
        assert_eq!(truncate_to_width("Groceries", 9), "Groceries");
        assert_eq!(truncate_to_width("Groceries", 20), "Groceries");
        assert_eq!(truncate_to_width("", 0), "");
    }

    #[test]
    fn long_titles_end_in_ellipsis() {
        assert_eq!(truncate_to_width("Groceries", 8), "Groceri…");
        assert_eq!(truncate_to_width("Groceries", 1), "…");
        assert_eq!(truncate_to_width("Groceries", 0), "");
    }

    #[test]
    fn wide_characters_count_double() {
        // each ideograph takes two columns
        assert_eq!(truncate_to_width("日本語", 6), "日本語");
        assert_eq!(truncate_to_width("日本語", 5), "日本…");
        assert_eq!(truncate_to_width("日本語", 4), "日…");
    }
}
