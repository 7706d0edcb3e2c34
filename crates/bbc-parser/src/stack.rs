use bbc_types::{TagGrammar, TagSet, Trim};

/// A tag opened in the message and waiting for its closer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct OpenTag {
    pub(crate) name: String,

    /// Text emitted when the tag closes, parameters already substituted.
    pub(crate) after: String,

    pub(crate) block_level: bool,

    pub(crate) autolink: bool,

    pub(crate) trim: Trim,

    pub(crate) require_children: Option<TagSet>,

    /// Inherited from ancestors as well as declared by the grammar.
    pub(crate) disallow_children: Option<TagSet>,
}

impl OpenTag {
    pub(crate) fn from_grammar(tag: &TagGrammar) -> Self {
        Self {
            name: tag.name.clone(),
            after: tag.kind.after().unwrap_or_default().to_owned(),
            block_level: tag.block_level,
            autolink: tag.autolink,
            trim: tag.trim,
            require_children: tag.require_children.clone(),
            disallow_children: tag.disallow_children.clone(),
        }
    }
}

/// Result of looking for the tag a `[/name]` closes.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CloseOutcome {
    /// Tags removed from the stack, innermost first. The last one is the target.
    Closed(Vec<OpenTag>),

    /// An inline closer reached a block level tag. Stack unchanged.
    Blocked,

    /// No open tag has that name. Stack unchanged.
    NotFound,
}

#[derive(Debug, Default)]
pub(crate) struct TagStack {
    tags: Vec<OpenTag>,
}

impl TagStack {
    pub(crate) fn push(&mut self, tag: OpenTag) {
        self.tags.push(tag);
    }

    pub(crate) fn pop(&mut self) -> Option<OpenTag> {
        self.tags.pop()
    }

    pub(crate) fn last(&self) -> Option<&OpenTag> {
        self.tags.last()
    }

    /// The `n`th tag counting from the innermost, which is 0.
    pub(crate) fn nth_from_top_mut(&mut self, n: usize) -> Option<&mut OpenTag> {
        let index = self.tags.len().checked_sub(n + 1)?;
        self.tags.get_mut(index)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &OpenTag> {
        self.tags.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.tags.clear();
    }

    /// Remove open tags from the innermost up to and including the one called `name`.
    ///
    /// Block level tags are only closed on the way when `name` itself is block level, which is
    /// asked from `is_block` at most once. When the target is not reached the stack is left as it
    /// was.
    pub(crate) fn close_until(
        &mut self,
        name: &str,
        mut is_block: impl FnMut(&str) -> bool,
    ) -> CloseOutcome {
        let mut popped: Vec<OpenTag> = vec![];
        let mut target_block = None;

        while let Some(tag) = self.tags.pop() {
            if tag.block_level && !*target_block.get_or_insert_with(|| is_block(name)) {
                self.tags.push(tag);
                self.restore(popped);
                return CloseOutcome::Blocked;
            }

            let found = tag.name == name;
            popped.push(tag);
            if found {
                return CloseOutcome::Closed(popped);
            }
        }

        self.restore(popped);
        CloseOutcome::NotFound
    }

    /// Push back tags popped innermost first.
    fn restore(&mut self, popped: Vec<OpenTag>) {
        self.tags.extend(popped.into_iter().rev());
    }

    /// Pop every inline tag above the innermost block level one, innermost first.
    pub(crate) fn pop_inline(&mut self) -> Vec<OpenTag> {
        let keep = self
            .tags
            .iter()
            .rposition(|x| x.block_level)
            .map_or(0, |x| x + 1);
        let mut inline = self.tags.split_off(keep);
        inline.reverse();
        inline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, block_level: bool) -> OpenTag {
        OpenTag {
            name: name.to_owned(),
            after: format!("</{name}>"),
            block_level,
            autolink: true,
            ..OpenTag::default()
        }
    }

    fn names(stack: &TagStack) -> Vec<&str> {
        stack.iter().map(|x| x.name.as_str()).collect()
    }

    #[test]
    fn closes_through_inline_tags() {
        let mut stack = TagStack::default();
        stack.push(tag("b", false));
        stack.push(tag("i", false));
        stack.push(tag("u", false));

        let CloseOutcome::Closed(closed) = stack.close_until("i", |_| false) else {
            panic!("expected closed");
        };
        assert_eq!(
            closed.iter().map(|x| x.name.as_str()).collect::<Vec<_>>(),
            ["u", "i"]
        );
        assert_eq!(names(&stack), ["b"]);
    }

    #[test]
    fn inline_closer_blocked_by_block_tag() {
        let mut stack = TagStack::default();
        stack.push(tag("i", false));
        stack.push(tag("quote", true));
        stack.push(tag("b", false));

        let mut asked = 0;
        let outcome = stack.close_until("i", |_| {
            asked += 1;
            false
        });
        assert_eq!(outcome, CloseOutcome::Blocked);
        assert_eq!(asked, 1);
        // Order is kept, including the inline tag popped before the block.
        assert_eq!(names(&stack), ["i", "quote", "b"]);
    }

    #[test]
    fn block_closer_passes_block_tags() {
        let mut stack = TagStack::default();
        stack.push(tag("quote", true));
        stack.push(tag("center", true));
        stack.push(tag("b", false));

        let CloseOutcome::Closed(closed) = stack.close_until("quote", |x| x == "quote") else {
            panic!("expected closed");
        };
        assert_eq!(closed.len(), 3);
        assert!(stack.is_empty());
    }

    #[test]
    fn unknown_closer_restores_order() {
        let mut stack = TagStack::default();
        stack.push(tag("b", false));
        stack.push(tag("i", false));
        stack.push(tag("u", false));

        assert_eq!(stack.close_until("s", |_| false), CloseOutcome::NotFound);
        assert_eq!(names(&stack), ["b", "i", "u"]);

        let mut empty = TagStack::default();
        assert_eq!(empty.close_until("s", |_| false), CloseOutcome::NotFound);
    }

    #[test]
    fn pop_inline_stops_at_block() {
        let mut stack = TagStack::default();
        stack.push(tag("b", false));
        stack.push(tag("quote", true));
        stack.push(tag("i", false));
        stack.push(tag("u", false));

        let inline = stack.pop_inline();
        assert_eq!(
            inline.iter().map(|x| x.name.as_str()).collect::<Vec<_>>(),
            ["u", "i"]
        );
        assert_eq!(names(&stack), ["b", "quote"]);

        let mut stack = TagStack::default();
        stack.push(tag("b", false));
        assert_eq!(stack.pop_inline().len(), 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn nth_from_top() {
        let mut stack = TagStack::default();
        stack.push(tag("list", true));
        stack.push(tag("li", true));
        assert_eq!(stack.nth_from_top_mut(1).map(|x| x.name.clone()), Some("list".to_owned()));
        assert!(stack.nth_from_top_mut(2).is_none());
    }
}
