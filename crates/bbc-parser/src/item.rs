use crate::parser::Parser;
use crate::stack::OpenTag;
use crate::text::no_smileys;
use crate::CLOSE;
use bbc_types::{TagSet, Trim};
use regex::Regex;
use std::sync::OnceLock;

/// Whitespace after a line break, up to what follows.
static AFTER_BREAK_RE: OnceLock<Regex> = OnceLock::new();

impl Parser {
    /// Expand `[*]` and friends into list items, opening the list when needed.
    ///
    /// The item is closed at the next line break, and the list with it unless another tag
    /// follows the break.
    pub(crate) fn handle_item_code(&mut self, inside: Option<&OpenTag>) {
        let pos = self.scanner.pos;
        let style = self
            .scanner
            .byte(pos + 1)
            .and_then(|c| {
                self.codes
                    .item_code(c)
                    .or_else(|| self.codes.item_code(c.to_ascii_lowercase()))
            })
            .unwrap_or_default()
            .to_owned();
        let disallow_children: Option<TagSet> = inside.and_then(|x| x.disallow_children.clone());

        let mut code = match inside.map(|x| x.name.as_str()) {
            Some("list") => String::new(),
            Some("li") => {
                self.stack.pop();
                "</li>".to_owned()
            }
            _ => {
                self.stack.push(OpenTag {
                    name: "list".to_owned(),
                    after: "</ul>".to_owned(),
                    block_level: true,
                    autolink: true,
                    trim: Trim::None,
                    require_children: Some(TagSet::from(["li".to_owned()])),
                    disallow_children: disallow_children.clone(),
                });
                if style.is_empty() {
                    "<ul class=\"bbc_list\">".to_owned()
                } else {
                    format!("<ul style=\"list-style-type: {style}\" class=\"bbc_list\">")
                }
            }
        };

        self.stack.push(OpenTag {
            name: "li".to_owned(),
            after: "</li>".to_owned(),
            block_level: true,
            autolink: true,
            trim: Trim::Outside,
            require_children: None,
            disallow_children,
        });
        code.push_str("<li>");

        let tmp = no_smileys(&code);
        let inserted = self.scanner.splice(pos, 3, &tmp);
        self.scanner.pos += inserted.saturating_sub(1);

        let pos = self.scanner.pos;
        let next_break = self.scanner.find("<br />", pos);
        let next_closer = self.scanner.find("[/", pos);

        match next_break {
            Some(pos2) if next_closer.map_or(true, |pos3| pos2 <= pos3) => {
                self.scanner.pos2 = pos2;
                let re = AFTER_BREAK_RE
                    .get_or_init(|| Regex::new(r"^(?:<br />|&nbsp;|\s|\[)+").unwrap());
                // Another tag after the break keeps the list open.
                let more = re
                    .find(self.scanner.slice_from(pos2 + 6))
                    .map_or(false, |x| x.as_str().ends_with('['));
                let replacement = if more { "[/li]" } else { "[/li][/list]" };
                self.scanner.insert(pos2, replacement);
                if let Some(list) = self.stack.nth_from_top_mut(1) {
                    "</ul>".clone_into(&mut list.after);
                }
            }
            _ => {
                // Nothing tells where the item ends, the list closes it.
                if let Some(li) = self.stack.nth_from_top_mut(0) {
                    li.after.clear();
                }
                if let Some(list) = self.stack.nth_from_top_mut(1) {
                    "</li></ul>".clone_into(&mut list.after);
                }
            }
        }
    }

    /// The cursor is on `[c]` with `c` an item code, and lists are enabled.
    pub(crate) fn at_item_code(&self, next_char: u8) -> bool {
        self.codes.item_code(next_char).is_some()
            && self.scanner.byte(self.scanner.pos + 2) == Some(CLOSE)
            && !self.codes.is_disabled("list")
            && !self.codes.is_disabled("li")
    }

    /// `[0]` is only an item after a separator, so that numbers in brackets survive.
    pub(crate) fn item_code_allowed(&self) -> bool {
        let pos = self.scanner.pos;
        if self.scanner.byte(pos + 1) != Some(b'0') || pos == 0 {
            return true;
        }
        matches!(
            self.scanner.byte(pos - 1),
            Some(b';' | b' ' | b'\t' | b'\n' | b'>')
        )
    }
}
