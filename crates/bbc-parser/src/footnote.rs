use crate::SMILEY_MARKER;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

static FOOTNOTE_RE: OnceLock<Regex> = OnceLock::new();

/// Running count of footnotes over several messages.
///
/// Footnote anchors must be unique on a page showing several messages, so the caller keeps one
/// counter for the whole page and passes it to every parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FootnoteCounter {
    total: usize,
}

impl FootnoteCounter {
    /// Start counting after `total` footnotes.
    pub fn new(total: usize) -> Self {
        Self { total }
    }

    /// Footnotes rendered so far.
    pub fn total(&self) -> usize {
        self.total
    }
}

/// Replace `%fn%text%fn%` spans with numbered references and collect the texts at the end of
/// `message`.
///
/// Returns the number of footnotes rendered.
pub(crate) fn render_footnotes(message: &mut String, counter: &mut FootnoteCounter) -> usize {
    // Footnote tags that did not get rendered.
    let stripped = message.replace("[footnote]", "").replace("[/footnote]", "");

    let base = counter.total;
    let mut num = 0;
    let mut content = String::new();

    let re = FOOTNOTE_RE.get_or_init(|| Regex::new(r"(?is)%fn%(.*?)%fn%").unwrap());
    let replaced = re.replace_all(&stripped, |captures: &Captures| {
        num += 1;
        // The text keeps the markers of the tags around it, so markup stays paired.
        let text = captures.get(1).map_or("", |x| x.as_str());
        content.push_str(&format!(
            "{m}<div class=\"target\" id=\"fn{num}_{base}\"><sup>{num}&nbsp;</sup>{text}\
             <a class=\"footnote_return\" href=\"#ref{num}_{base}\">&crarr;</a></div>{m}",
            m = SMILEY_MARKER,
        ));
        format!(
            "<a class=\"target\" href=\"#fn{num}_{base}\" id=\"ref{num}_{base}\">[{num}]</a>"
        )
    });
    let mut result = replaced.into_owned();

    if num > 0 {
        debug!("rendered {num} footnotes after {base}");
        result.push_str(&format!(
            "{m}<div class=\"bbc_footnotes\">{m}{content}{m}</div>{m}",
            m = SMILEY_MARKER,
        ));
    }

    counter.total += num;
    *message = result;
    num
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_after_counter() {
        let mut counter = FootnoteCounter::new(4);
        let mut message =
            "a\r<sup>%fn%\rone\r%fn%</sup>\r b\r<sup>%fn%\rtwo\r%fn%</sup>\r".to_owned();
        assert_eq!(render_footnotes(&mut message, &mut counter), 2);
        assert_eq!(counter.total(), 6);

        let message = message.replace('\r', "");
        assert!(message.starts_with(
            "a<sup><a class=\"target\" href=\"#fn1_4\" id=\"ref1_4\">[1]</a></sup> b"
        ));
        assert!(message.contains(
            "<div class=\"target\" id=\"fn2_4\"><sup>2&nbsp;</sup>two\
             <a class=\"footnote_return\" href=\"#ref2_4\">&crarr;</a></div>"
        ));
        assert!(message.ends_with("</div></div>"));
    }

    #[test]
    fn markers_stay_paired() {
        let mut counter = FootnoteCounter::default();
        let mut message = "x\r<sup>%fn%\rnote\r%fn%</sup>\r".to_owned();
        render_footnotes(&mut message, &mut counter);
        assert_eq!(message.matches('\r').count() % 2, 0);
    }

    #[test]
    fn tags_in_footnote_keep_text_outside_markup() {
        let mut counter = FootnoteCounter::default();
        let mut message = "x\r<sup>%fn%\r\r<b>\ry\r</b>\r z\r%fn%</sup>\r".to_owned();
        render_footnotes(&mut message, &mut counter);

        let text = message.split('\r').step_by(2).collect::<String>();
        assert_eq!(text, "xy z");
    }

    #[test]
    fn leftover_tags_removed() {
        let mut counter = FootnoteCounter::default();
        let mut message = "[footnote]x[/footnote]".to_owned();
        assert_eq!(render_footnotes(&mut message, &mut counter), 0);
        assert_eq!(message, "x");
        assert_eq!(counter.total(), 0);
    }
}
