use crate::parser::Parser;
use crate::stack::OpenTag;
use crate::template::{positional, substitute};
use crate::text::no_smileys;
use crate::CLOSE;
use bbc_types::{Quoting, TagGrammar, TagKind};
use tracing::{debug, trace};

/// Quote around tag values, as stored in escaped messages.
const QUOTE: &str = "&quot;";

impl Parser {
    /// Rewrite the matched tag according to its shape.
    ///
    /// Returns `true` when the tag is incomplete, the text is then left as it is.
    pub(crate) fn handle_tag(&mut self, tag: TagGrammar) -> bool {
        trace!("handling {} at {}", tag.name, self.scanner.pos);
        let incomplete = match tag.kind {
            TagKind::ParsedContent { .. } => self.handle_parsed_content(&tag),
            TagKind::UnparsedContent { .. } => self.handle_unparsed_content(&tag),
            TagKind::Closed { .. } => self.handle_closed(&tag),
            TagKind::UnparsedEqualsContent { .. } => self.handle_unparsed_equals_content(&tag),
            TagKind::UnparsedCommasContent { .. } => self.handle_unparsed_commas_content(&tag),
            TagKind::UnparsedCommas { .. } => self.handle_unparsed_commas(tag),
            TagKind::UnparsedEquals { .. } | TagKind::ParsedEquals { .. } => {
                self.handle_equals(tag)
            }
        };
        if incomplete {
            debug!("incomplete tag at {}", self.scanner.pos);
        }
        incomplete
    }

    /// Replace the text from the cursor to `end` with `code`, leaving the cursor on the last
    /// inserted byte.
    fn replace_tag(&mut self, end: usize, code: &str) {
        let pos = self.scanner.pos;
        let inserted = self
            .scanner
            .splice(pos, end.saturating_sub(pos), &no_smileys(code));
        self.scanner.pos += inserted.saturating_sub(1);
    }

    /// Run the grammar validator over captured values.
    fn filter_data(&self, tag: &TagGrammar, mut data: Vec<String>) -> Vec<String> {
        if let Some(validate) = &tag.validate {
            validate.call(tag, &mut data, self.codes.disabled());
        }
        data
    }

    /// Step over an opening quote after `=`.
    ///
    /// Returns whether the value is quoted, `None` when quotes are required but missing.
    fn open_value(&mut self, quoting: Quoting) -> Option<bool> {
        let quoted =
            quoting != Quoting::Never && self.scanner.starts_with_at(self.scanner.pos1, QUOTE);
        if quoting == Quoting::Required && !quoted {
            return None;
        }
        if quoted {
            self.scanner.pos1 += QUOTE.len();
        }
        Some(quoted)
    }

    fn handle_parsed_content(&mut self, tag: &TagGrammar) -> bool {
        self.stack.push(OpenTag::from_grammar(tag));
        self.replace_tag(self.scanner.pos1, tag.kind.before().unwrap_or_default());
        false
    }

    fn handle_unparsed_content(&mut self, tag: &TagGrammar) -> bool {
        let close = format!("[/{}]", tag.name);
        let Some(pos2) = self.scanner.find_ignore_case(&close, self.scanner.pos1) else {
            return true;
        };
        self.scanner.pos2 = pos2;

        let mut data = self.scanner.slice(self.scanner.pos1, pos2).to_owned();
        if tag.block_level {
            strip_leading_break(&mut data);
        }
        let data = self.filter_data(tag, vec![data]);

        let code = substitute(tag.kind.content().unwrap_or_default(), &positional(&data));
        self.replace_tag(pos2 + close.len(), &code);
        // Content is final, never look at it again.
        self.scanner.last_pos = self.scanner.pos + 1;
        false
    }

    fn handle_closed(&mut self, tag: &TagGrammar) -> bool {
        let end = self
            .scanner
            .find_byte(CLOSE, self.scanner.pos)
            .map_or(self.scanner.len(), |x| x + 1);
        self.replace_tag(end, tag.kind.content().unwrap_or_default());
        false
    }

    fn handle_unparsed_equals_content(&mut self, tag: &TagGrammar) -> bool {
        let Some(quoted) = self.open_value(tag.kind.quoting()) else {
            return true;
        };
        let terminator = if quoted { "&quot;]" } else { "]" };
        let Some(pos2) = self.scanner.find(terminator, self.scanner.pos1) else {
            return true;
        };
        self.scanner.pos2 = pos2;

        let close = format!("[/{}]", tag.name);
        let Some(pos3) = self.scanner.find_ignore_case(&close, pos2) else {
            return true;
        };
        self.scanner.pos3 = pos3;

        let mut body = self
            .scanner
            .slice(pos2 + terminator.len(), pos3)
            .to_owned();
        let value = self.scanner.slice(self.scanner.pos1, pos2).to_owned();
        if tag.block_level {
            strip_leading_break(&mut body);
        }
        let data = self.filter_data(tag, vec![body, value]);

        let code = substitute(tag.kind.content().unwrap_or_default(), &positional(&data));
        self.replace_tag(pos3 + close.len(), &code);
        false
    }

    fn handle_unparsed_commas_content(&mut self, tag: &TagGrammar) -> bool {
        let Some(pos2) = self.scanner.find_byte(CLOSE, self.scanner.pos1) else {
            return true;
        };
        self.scanner.pos2 = pos2;

        let close = format!("[/{}]", tag.name);
        let Some(pos3) = self.scanner.find_ignore_case(&close, pos2) else {
            return true;
        };
        self.scanner.pos3 = pos3;

        // `$1` is the content, the values follow.
        let mut data = vec![self.scanner.slice(pos2 + 1, pos3).to_owned()];
        data.extend(
            self.scanner
                .slice(self.scanner.pos1, pos2)
                .split(',')
                .map(str::to_owned),
        );
        let data = self.filter_data(tag, data);

        let code = substitute(
            tag.kind.content().unwrap_or_default(),
            &positional(&trimmed(&data)),
        );
        self.replace_tag(pos3 + close.len(), &code);
        false
    }

    fn handle_unparsed_commas(&mut self, mut tag: TagGrammar) -> bool {
        let Some(pos2) = self.scanner.find_byte(CLOSE, self.scanner.pos1) else {
            return true;
        };
        self.scanner.pos2 = pos2;

        let data = self
            .scanner
            .slice(self.scanner.pos1, pos2)
            .split(',')
            .map(str::to_owned)
            .collect();
        let data = self.filter_data(&tag, data);
        let pairs = positional(&trimmed(&data));

        // Disabled renderings may use the values when closing.
        if let Some(after) = tag.kind.after_mut() {
            *after = substitute(after, &pairs);
        }
        self.stack.push(OpenTag::from_grammar(&tag));

        let code = substitute(tag.kind.before().unwrap_or_default(), &pairs);
        self.replace_tag(pos2 + 1, &code);
        false
    }

    /// `[tag=value]`, the value is parsed again for [`TagKind::ParsedEquals`].
    fn handle_equals(&mut self, mut tag: TagGrammar) -> bool {
        let Some(quoted) = self.open_value(tag.kind.quoting()) else {
            return true;
        };
        let terminator = if quoted { "&quot;]" } else { "]" };
        let Some(pos2) = self.scanner.find(terminator, self.scanner.pos1) else {
            return true;
        };
        self.scanner.pos2 = pos2;

        let data = self.scanner.slice(self.scanner.pos1, pos2).to_owned();
        let mut value = self
            .filter_data(&tag, vec![data])
            .into_iter()
            .next()
            .unwrap_or_default();

        if let TagKind::ParsedEquals {
            parsed_tags_allowed,
            ..
        } = &tag.kind
        {
            self.recursive_parse(&mut value, parsed_tags_allowed);
        }

        let pairs = [("$1", value.as_str())];
        if let Some(after) = tag.kind.after_mut() {
            *after = substitute(after, &pairs);
        }
        self.stack.push(OpenTag::from_grammar(&tag));

        let code = substitute(tag.kind.before().unwrap_or_default(), &pairs);
        self.replace_tag(pos2 + terminator.len(), &code);
        false
    }
}

/// Swap the templates of a disabled tag for its disabled renderings.
///
/// Tags without any disabled rendering become a plain `<div>` when block level and vanish
/// otherwise, keeping their content.
pub(crate) fn handle_disabled(tag: &mut TagGrammar) {
    let block = tag.block_level;
    let (open, close) = if block { ("<div>", "</div>") } else { ("", "") };

    if tag.disabled_before.is_none()
        && tag.disabled_after.is_none()
        && tag.disabled_content.is_none()
    {
        let content = match tag.kind {
            TagKind::Closed { .. } => "",
            _ if block => "<div>$1</div>",
            _ => "$1",
        };
        set_templates(tag, Some(open), Some(close), Some(content));
    } else if tag.disabled_before.is_some() || tag.disabled_after.is_some() {
        let before = tag.disabled_before.clone().unwrap_or_else(|| open.to_owned());
        let after = tag.disabled_after.clone().unwrap_or_else(|| close.to_owned());
        set_templates(tag, Some(&before), Some(&after), None);
    } else if let Some(content) = tag.disabled_content.clone() {
        set_templates(tag, None, None, Some(&content));
    }
}

fn set_templates(
    tag: &mut TagGrammar,
    before: Option<&str>,
    after: Option<&str>,
    content: Option<&str>,
) {
    if let (Some(v), Some(before)) = (tag.kind.before_mut(), before) {
        before.clone_into(v);
    }
    if let (Some(v), Some(after)) = (tag.kind.after_mut(), after) {
        after.clone_into(v);
    }
    if let (Some(v), Some(content)) = (tag.kind.content_mut(), content) {
        content.clone_into(v);
    }
}

fn strip_leading_break(data: &mut String) {
    if data.starts_with("<br />") {
        data.replace_range(..6, "");
    }
}

fn trimmed(data: &[String]) -> Vec<&str> {
    data.iter().map(|x| x.trim()).collect()
}
