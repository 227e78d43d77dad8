use pulldown_cmark::{html, Event, Options, Parser};
use std::path::Path;

/// Renders a note body to HTML.
///
/// Single newlines become line breaks, the way Joplin's own viewer shows them.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Points Joplin's internal `:/<resource id>` links at downloaded files.
pub fn localize_resource_links(body: &str, resource_id: &str, local: &Path) -> String {
    body.replace(
        &format!(":/{}", resource_id),
        &local.to_string_lossy(),
    )
}

/// Deep link that makes the desktop app open a note.
pub fn open_note_url(note_id: &str) -> String {
    format!("joplin://x-callback-url/openNote?id={}", note_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_newline_becomes_break() {
        let html = markdown_to_html("first\nsecond");
        assert!(html.contains("first<br />"), "{}", html);
        assert!(html.contains("second"));
    }

    #[test]
    fn renders_tables() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"), "{}", html);
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn renders_strikethrough_and_tasks() {
        let html = markdown_to_html("- [x] ~~done~~\n- [ ] open\n");
        assert!(html.contains("<del>done</del>"), "{}", html);
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn rewrites_resource_links() {
        let body = "![img](:/abc123) and [file](:/abc123)";
        let local = Path::new("/tmp/res/abc123");
        let out = localize_resource_links(body, "abc123", local);
        assert_eq!(out, "![img](/tmp/res/abc123) and [file](/tmp/res/abc123)");
    }

    #[test]
    fn leaves_other_links_alone() {
        let out = localize_resource_links("[x](:/other)", "abc123", Path::new("/r/abc123"));
        assert_eq!(out, "[x](:/other)");
    }

    #[test]
    fn builds_open_note_url() {
        assert_eq!(
            open_note_url("0123abcd"),
            "joplin://x-callback-url/openNote?id=0123abcd"
        );
    }
}
