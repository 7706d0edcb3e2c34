use crate::parser::Parser;
use crate::stack::CloseOutcome;
use crate::text::no_smileys;
use crate::CLOSE;
use std::sync::Arc;
use tracing::{debug, trace};

impl Parser {
    /// Handle `[/name]` at the cursor.
    ///
    /// Everything opened after the named tag is closed with it. Stray closers, and inline closers
    /// that would have to close a block level tag, are left as text.
    pub(crate) fn handle_open_tags(&mut self) {
        let pos = self.scanner.pos;
        let Some(pos2) = self.scanner.find_byte(CLOSE, pos + 1) else {
            return;
        };
        // `[/]`
        if pos2 == pos + 2 {
            return;
        }
        self.scanner.pos2 = pos2;

        let look_for = self.scanner.slice(pos + 2, pos2).to_ascii_lowercase();
        let codes = Arc::clone(&self.codes);
        let to_close = match self
            .stack
            .close_until(&look_for, |name| codes.block_level(name))
        {
            CloseOutcome::Closed(tags) => tags,
            CloseOutcome::Blocked => {
                debug!("closer {look_for} blocked by a block level tag");
                return;
            }
            CloseOutcome::NotFound => {
                trace!("stray closer {look_for}");
                return;
            }
        };

        // The first closer replaces `[/name]`, the others follow it.
        let mut replace_len = pos2 + 1 - pos;
        for tag in &to_close {
            let at = self.scanner.pos;
            let inserted = self
                .scanner
                .splice(at, replace_len, &no_smileys(&tag.after));
            self.scanner.pos += inserted;
            replace_len = 0;

            let at = self.scanner.pos;
            if tag.block_level && self.scanner.starts_with_at(at, "<br />") {
                self.scanner.remove(at, 6);
            }
            if tag.trim.trims_outside() {
                self.trim_whitespace(at);
            }
        }
        // Back on the last byte written.
        self.scanner.pos = self.scanner.pos.saturating_sub(1);
    }

    /// Close inline tags before a block level tag opens, they cannot contain it.
    pub(crate) fn close_non_block_level(&mut self) {
        for tag in self.stack.pop_inline() {
            let at = self.scanner.pos;
            let inserted = self.scanner.insert(at, &no_smileys(&tag.after));
            self.scanner.pos += inserted;
            self.scanner.pos1 += inserted;
        }
    }
}
