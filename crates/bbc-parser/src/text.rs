//! Text level passes run before and after the tag scan.

use crate::SMILEY_MARKER;
use bbc_types::SmileyParser;

/// Characters pasted from word processors and their plain replacements.
const MS_PUNCTUATION: [(char, &str); 9] = [
    ('\u{201a}', ","),
    ('\u{201e}', ",,"),
    ('\u{2026}', "..."),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
];

/// Normalize smart punctuation and drop carriage returns, which are reserved for the smiley
/// marker.
pub(crate) fn sanitize_ms_cut_paste(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for ch in message.chars() {
        if ch == SMILEY_MARKER {
            continue;
        }
        match MS_PUNCTUATION.iter().find(|(x, _)| *x == ch) {
            Some((_, replacement)) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

/// Wrap a rendering so that the smiley pass skips it.
pub(crate) fn no_smileys(s: &str) -> String {
    format!("{SMILEY_MARKER}{s}{SMILEY_MARKER}")
}

/// Keep runs of spaces visible in html.
pub(crate) fn cleanup_whitespace(message: String) -> String {
    let message = match message.strip_prefix(' ') {
        Some(rest) => format!("&nbsp;{rest}"),
        None => message,
    };
    message
        .replace("  ", "&nbsp; ")
        .replace("<br /> ", "<br />&nbsp;")
        .replace("&#13;", "\n")
}

/// Run `smileys` over text outside the rendered tags, then remove all markers.
///
/// Markers come in pairs around every rendering, user text is what lies outside the pairs.
pub(crate) fn finish_smileys(message: &mut String, smileys: Option<&dyn SmileyParser>) {
    let Some(smileys) = smileys else {
        message.retain(|x| x != SMILEY_MARKER);
        return;
    };

    let mut out = String::with_capacity(message.len());
    for (i, part) in message.split(SMILEY_MARKER).enumerate() {
        if i % 2 == 0 && !part.is_empty() {
            let mut text = part.to_owned();
            smileys.parse(&mut text);
            out.push_str(&text);
        } else {
            out.push_str(part);
        }
    }
    *message = out;
}
