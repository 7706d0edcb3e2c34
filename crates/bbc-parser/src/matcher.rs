use crate::params::match_parameters;
use crate::parser::Parser;
use crate::stack::OpenTag;
use crate::template::substitute;
use crate::{CLOSE, EQUAL, SLASH};
use bbc_types::{TagGrammar, TagKind, TestPattern};
use std::sync::Arc;
use tracing::trace;

impl Parser {
    /// Find the grammar matching the tag at the cursor.
    ///
    /// Candidates for `next_char` are tried in registry order, and once a name failed on the
    /// text its other grammars are skipped.
    pub(crate) fn find_tag(
        &mut self,
        next_char: u8,
        inside: Option<&OpenTag>,
    ) -> Option<TagGrammar> {
        let codes = Arc::clone(&self.codes);
        let pos = self.scanner.pos;
        let mut last_check: Option<&str> = None;
        let mut found = None;

        for possible in codes.candidates(next_char) {
            if last_check == Some(possible.name.as_str()) {
                continue;
            }

            // The name runs past the message or is followed by something else.
            let next_c = match self.scanner.byte(pos + 1 + possible.len()) {
                Some(c @ (b' ' | CLOSE | EQUAL | SLASH))
                    if self
                        .scanner
                        .matches_ignore_case_at(pos + 1, possible.name.as_bytes()) =>
                {
                    c
                }
                _ => {
                    last_check = Some(possible.name.as_str());
                    continue;
                }
            };

            if let Some(tag) = self.check_code_attributes(next_c, possible, inside) {
                found = Some(tag);
                break;
            }
        }

        let mut tag = found?;
        trace!("matched tag {} as {}", tag.name, tag.kind.name());
        if tag.name == "quote" {
            self.alternate_quote_style(&mut tag);
        }
        if self.can_cache {
            self.can_cache = !tag.no_cache;
        }
        if tag.name == "footnote" {
            self.num_footnotes += 1;
        }
        Some(tag)
    }

    /// Check the syntax and the position in the tree of one candidate.
    fn check_code_attributes(
        &mut self,
        next_c: u8,
        possible: &TagGrammar,
        inside: Option<&OpenTag>,
    ) -> Option<TagGrammar> {
        let after_name = self.scanner.pos + 1 + possible.len();

        if !possible.params.is_empty() {
            if next_c != b' ' {
                return None;
            }
        } else if matches!(possible.kind, TagKind::ParsedContent { .. }) {
            if next_c != CLOSE {
                return None;
            }
        } else {
            if next_c != EQUAL && possible.kind.needs_equals() {
                return None;
            }
            if next_c != CLOSE {
                match possible.kind {
                    TagKind::UnparsedContent { .. } => return None,
                    TagKind::Closed { .. }
                        if !self.scanner.starts_with_at(after_name, "/]")
                            && !self.scanner.starts_with_at(after_name, " /]") =>
                    {
                        return None
                    }
                    _ => {}
                }
            }
        }

        if let Some(parents) = &possible.require_parents {
            if !inside.map_or(false, |x| parents.contains(&x.name)) {
                return None;
            }
        }

        let mut tag = possible.clone();

        if let Some(inside) = inside {
            if let Some(children) = &inside.require_children {
                if !children.contains(&possible.name) {
                    return None;
                }
            }

            if let Some(denied) = &inside.disallow_children {
                if denied.contains(&possible.name) {
                    return None;
                }
            }

            // Not allowed in this parent: render through the replacements if any.
            if possible
                .disallow_parents
                .as_ref()
                .map_or(false, |x| x.contains(&inside.name))
            {
                let (Some(before), Some(after)) =
                    (&possible.disallow_before, &possible.disallow_after)
                else {
                    return None;
                };
                if let Some(v) = tag.kind.before_mut() {
                    v.clone_from(before);
                }
                if let Some(v) = tag.kind.after_mut() {
                    v.clone_from(after);
                }
            }
        }

        if let Some(test) = &possible.test {
            if !self.passes_test(after_name + 1, test) {
                return None;
            }
        }

        // `[`, the name, then a space or `=`.
        self.scanner.pos1 = after_name + 1;

        if !possible.params.is_empty() {
            let stub = self.scanner.slice_from(self.scanner.pos1 - 1);
            let matched = match_parameters(&possible.params, stub, &mut self.param_cache)?;
            if let Some(v) = tag.kind.before_mut() {
                *v = substitute(v, &matched.values);
            }
            if let Some(v) = tag.kind.after_mut() {
                *v = substitute(v, &matched.values);
            }
            if let Some(v) = tag.kind.content_mut() {
                *v = substitute(v, &matched.values);
            }
            self.scanner.pos1 += matched.consumed - 1;
        }

        Some(tag)
    }

    /// Text from `start` to the next `]` matches the grammar test.
    fn passes_test(&self, start: usize, test: &TestPattern) -> bool {
        let Some(end) = self.scanner.find_byte(CLOSE, self.scanner.pos) else {
            return false;
        };
        test.is_match(self.scanner.slice(start, end))
    }

    /// Nested quotes alternate between two styles.
    fn alternate_quote_style(&self, tag: &mut TagGrammar) {
        let alternate = self.stack.iter().filter(|x| x.name == "quote").count() % 2 == 1;
        if let Some(before) = tag.kind.before_mut() {
            *before = before.replace(
                "<blockquote>",
                &format!(
                    "<blockquote class=\"bbc_{}_quote\">",
                    if alternate { "alternate" } else { "standard" }
                ),
            );
        }
    }
}
