use crate::models::Note;

pub(crate) const UNTITLED: &str = "Untitled";

/// Next free title in the `base`, `base-2`, `base-3`, ... sequence.
pub(crate) fn next_available_title(base: &str, existing_notes: &[Note]) -> String {
    let base = base.trim();

    let mut has_base = false;
    let mut max_suffix: u32 = 1;

    for n in existing_notes {
        let t = n.title.trim();
        if t == base {
            has_base = true;
            continue;
        }

        if let Some(rest) = t.strip_prefix(&format!("{}-", base)) {
            if let Ok(k) = rest.parse::<u32>() {
                if k >= max_suffix {
                    max_suffix = k;
                }
            }
        }
    }

    if !has_base {
        return base.to_string();
    }

    format!("{}-{}", base, max_suffix.saturating_add(1))
}

pub(crate) fn next_untitled_title(existing_notes: &[Note]) -> String {
    next_available_title(UNTITLED, existing_notes)
}

/// Plain-text excerpt of note markup for list rows.
pub(crate) fn excerpt(html: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    let mut last_space = true;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                if !last_space {
                    out.push(' ');
                    last_space = true;
                }
            }
            '>' => in_tag = false,
            _ if in_tag => {}
            c if c.is_whitespace() => {
                if !last_space {
                    out.push(' ');
                    last_space = true;
                }
            }
            c => {
                out.push(c);
                last_space = false;
            }
        }
    }

    let text = out
        .trim()
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
