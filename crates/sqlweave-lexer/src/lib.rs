//! sqlweave Lexer - Tokenization of query templates
//!
//! Two tokenizers live here:
//! - a hand-written, lazily evaluated tokenizer driven by a [`Lexicon`]
//!   (registered keywords, symbols and quote characters), consumed through
//!   a [`Cursor`] with lookahead, lookback and reset
//! - a `logos` tokenizer for the small directive-header grammar
//!   (`if`, `for <e> in <c> join '<sep>'`, `endif`, `endfor`)

mod cursor;
mod directive;
mod error;
mod lexer;
mod lexicon;
mod token;

pub use cursor::*;
pub use directive::*;
pub use error::*;
pub use lexer::*;
pub use lexicon::*;
pub use token::*;
