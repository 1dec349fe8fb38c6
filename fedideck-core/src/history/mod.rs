// Fedideck - A multi-column Mastodon desktop client
// Copyright (C) 2025 Fedideck Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Edit history comparison
//!
//! Versions of an edited status are flattened to plain text and compared
//! character by character. The result is HTML with `<ins>` and `<s>` markup
//! that the UI shows as-is.

use chrono::Local;
use serde::Serialize;
use similar::{DiffTag, TextDiff};

use crate::error::{CoreError, CoreResult};
use crate::html::{escape_html, html_to_text};
use crate::models::StatusEdit;

/// A rendered comparison of two versions
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryDiff {
    /// One label per version, oldest first
    pub labels: Vec<String>,
    pub from: usize,
    pub to: usize,
    /// The `from` version as HTML
    pub from_html: String,
    pub diff_html: String,
}

/// Flatten one version of a status to comparable text
pub fn plain_text(edit: &StatusEdit) -> String {
    let mut text = format!(
        "Sensitive:{}\nSpoiler text: {}\n\n{}\n\n",
        if edit.sensitive { "On" } else { "Off" },
        edit.spoiler_text,
        html_to_text(&edit.content),
    );

    for media in &edit.media_attachments {
        text.push_str(&format!(
            "{} {} {}\n",
            media.media_type,
            media.id,
            media.description.as_deref().unwrap_or("None"),
        ));
    }

    if let Some(poll) = edit.poll.as_ref().filter(|p| !p.options.is_empty()) {
        text.push_str("Poll options:\n");
        for option in &poll.options {
            text.push_str(&format!("* {}\n", option.title));
        }
    }

    text.trim().to_string()
}

/// Labels for a version picker, oldest first
pub fn version_labels(history: &[StatusEdit]) -> Vec<String> {
    let last = history.len().saturating_sub(1);

    history
        .iter()
        .enumerate()
        .map(|(i, edit)| {
            let stamp = edit
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M");
            let suffix = if i == 0 {
                " (original)"
            } else if i == last {
                " (current)"
            } else if i + 1 == last {
                " (previous)"
            } else {
                ""
            };
            format!("{}{}", stamp, suffix)
        })
        .collect()
}

/// Versions compared when the user has not picked any: the previous against
/// the current one, or the original when there is no previous version.
pub fn default_pair(len: usize) -> Option<(usize, usize)> {
    match len {
        0 => None,
        1 | 2 => Some((0, len - 1)),
        _ => Some((len - 2, len - 1)),
    }
}

/// Character diff of two texts as escaped HTML
pub fn diff(from: &str, to: &str) -> String {
    let text_diff = TextDiff::from_chars(from, to);
    let old = text_diff.old_slices();
    let new = text_diff.new_slices();
    let mut output = String::new();

    for op in text_diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let removed = escape_html(&old[old_range].concat());
        let added = escape_html(&new[new_range].concat());

        match tag {
            DiffTag::Equal => output.push_str(&removed),
            DiffTag::Delete => output.push_str(&format!("<s>{}</s>", removed)),
            DiffTag::Insert => output.push_str(&format!("<ins>{}</ins>", added)),
            DiffTag::Replace => {
                output.push_str(&format!("<s>{}</s><ins>{}</ins>", removed, added))
            }
        }
    }

    output.replace('\n', "<br>")
}

/// Plain text as HTML for display
pub fn text_to_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Compare two versions, or the default pair when none are given
pub fn compare(
    history: &[StatusEdit],
    from: Option<usize>,
    to: Option<usize>,
) -> CoreResult<HistoryDiff> {
    let (default_from, default_to) = default_pair(history.len())
        .ok_or_else(|| CoreError::InvalidParams("Post has no edit history".to_string()))?;
    let from = from.unwrap_or(default_from);
    let to = to.unwrap_or(default_to);

    let (Some(from_edit), Some(to_edit)) = (history.get(from), history.get(to)) else {
        return Err(CoreError::InvalidParams(format!(
            "Version out of range: {} versions",
            history.len()
        )));
    };

    let from_text = plain_text(from_edit);
    let to_text = plain_text(to_edit);

    Ok(HistoryDiff {
        labels: version_labels(history),
        from,
        to,
        from_html: text_to_html(&from_text),
        diff_html: diff(&from_text, &to_text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EditedPoll, EditedPollOption, MediaAttachment, MediaMeta, MediaType};
    use chrono::{Duration, TimeZone, Utc};

    fn edit(content: &str, minutes: i64) -> StatusEdit {
        StatusEdit {
            content: content.to_string(),
            spoiler_text: String::new(),
            sensitive: false,
            created_at: Utc.with_ymd_and_hms(2023, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes),
            account: None,
            poll: None,
            media_attachments: vec![],
            emojis: vec![],
        }
    }

    #[test]
    fn plain_text_lists_every_part_of_a_version() {
        let mut version = edit("<p>Hello<br>there</p>", 0);
        version.sensitive = true;
        version.spoiler_text = "cw".to_string();
        version.media_attachments = vec![MediaAttachment {
            id: "m1".to_string(),
            media_type: MediaType::Image,
            url: String::new(),
            preview_url: None,
            remote_url: None,
            description: Some("a cat".to_string()),
            blurhash: None,
            meta: Some(MediaMeta::default()),
        }];
        version.poll = Some(EditedPoll {
            options: vec![
                EditedPollOption { title: "yes".to_string() },
                EditedPollOption { title: "no".to_string() },
            ],
        });

        assert_eq!(
            plain_text(&version),
            "Sensitive:On\nSpoiler text: cw\n\nHello\nthere\n\n\nimage m1 a cat\nPoll options:\n* yes\n* no"
        );
    }

    #[test]
    fn plain_text_of_a_bare_version_is_trimmed() {
        assert_eq!(
            plain_text(&edit("<p>hi</p>", 0)),
            "Sensitive:Off\nSpoiler text: \n\nhi"
        );
    }

    #[test]
    fn labels_mark_original_previous_and_current() {
        let history: Vec<_> = (0..4).map(|i| edit("x", i)).collect();
        let labels = version_labels(&history);

        assert!(labels[0].ends_with(" (original)"));
        assert!(!labels[1].contains('('));
        assert!(labels[2].ends_with(" (previous)"));
        assert!(labels[3].ends_with(" (current)"));
        assert_eq!(labels[0].len(), "2023-05-01 08:00 (original)".len());
    }

    #[test]
    fn default_pair_prefers_the_previous_version() {
        assert_eq!(default_pair(0), None);
        assert_eq!(default_pair(1), Some((0, 0)));
        assert_eq!(default_pair(2), Some((0, 1)));
        assert_eq!(default_pair(5), Some((3, 4)));
    }

    #[test]
    fn diff_marks_insertions_and_deletions() {
        assert_eq!(diff("abc", "abc"), "abc");
        assert_eq!(diff("ab", "abc"), "ab<ins>c</ins>");
        assert_eq!(diff("abc", "ac"), "a<s>b</s>c");
        assert_eq!(diff("a\nb", "a\nb"), "a<br>b");
    }

    #[test]
    fn diff_escapes_markup_in_the_text() {
        assert_eq!(diff("<b>", "<b>"), "&lt;b&gt;");
    }

    #[test]
    fn compare_validates_versions() {
        assert!(compare(&[], None, None).is_err());

        let history = vec![edit("<p>first</p>", 0), edit("<p>fist</p>", 5)];
        let result = compare(&history, None, None).unwrap();
        assert_eq!((result.from, result.to), (0, 1));
        assert!(result.diff_html.contains("<s>r</s>"));

        assert!(compare(&history, Some(0), Some(7)).is_err());
    }
}
