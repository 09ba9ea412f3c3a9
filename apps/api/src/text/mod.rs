// Text canonicalization shared by the parser (dedup keys) and every scorer (token sets).
// Pure, total functions only. No I/O, no allocation beyond the returned values.

pub mod normalize;
pub mod tokenize;

pub use normalize::normalize;
pub use tokenize::{tokenize, tokenize_opt, TokenSet};
