//! Common types shared by the bbc crates.
//!
//! A [`TagGrammar`] describes how one bracket tag looks in user markup and what it renders to.
//! Grammars are owned by the registry and only read by the parser, which clones a grammar into a
//! concrete tag instance every time one matches.

mod collab;
mod grammar;

pub use collab::{Autolink, HtmlParser, SmileyParser};
pub use grammar::{
    GrammarError, Param, ParamFilter, Quoting, TagGrammar, TagKind, TagSet, TestPattern, Trim,
    Validator,
};
