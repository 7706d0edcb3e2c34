//! Single pass bbc to html conversion.
//!
//! ```
//! use bbc_codes::Codes;
//! use bbc_parser::Parser;
//! use std::sync::Arc;
//!
//! let codes = Arc::new(Codes::standard().unwrap());
//! let mut parser = Parser::new(codes);
//! assert_eq!(parser.parse("[b]hi[/b]"), "<strong class=\"bbc_strong\">hi</strong>");
//! ```

mod autolink;
mod closer;
mod footnote;
mod handlers;
mod item;
mod matcher;
mod params;
mod parser;
mod scanner;
mod settings;
mod smiley;
mod stack;
mod template;
mod text;

pub use autolink::UrlAutolinker;
pub use footnote::FootnoteCounter;
pub use parser::Parser;
pub use settings::ParserSettings;
pub use smiley::SmileyMap;

const OPEN: u8 = b'[';
const CLOSE: u8 = b']';
const SLASH: u8 = b'/';
const EQUAL: u8 = b'=';

/// Wraps rendered html so that the smiley pass skips it.
pub(crate) const SMILEY_MARKER: char = '\r';
