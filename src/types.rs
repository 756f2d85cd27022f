use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Element {
    // Matches exactly one specific rune
    Literal(char),
    // \d: any Unicode digit
    Digit,
    // \w: any Unicode letter, digit, or underscore
    Word,
    // .: any rune except a newline
    Wildcard,
    // [abc] or [^abc]; no ranges in this dialect, a dash is a literal dash
    CharSet { chars: Vec<char>, negated: bool },
    // Greedy +, must match at least once
    OneOrMore(Box<Element>),
    // ?, matches zero or one time (zero preferred)
    ZeroOrOne(Box<Element>),
    // a|b|c, each branch is a full sub-pattern
    Alternation(Vec<Pattern>),
    // A capturing group; index is 1-based in order of the opening parens
    Group { index: usize, inner: Box<Pattern> },
    // \1..\9, matches the text most recently captured by a group
    Backref(usize),
}

/// A compiled pattern: an element sequence plus anchor flags.
///
/// Immutable once compiled. `find` keeps all per-attempt state on its own
/// stack, so one compiled pattern can serve any number of concurrent
/// searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub(crate) elements: Vec<Element>,
    pub(crate) start_anchor: bool,
    pub(crate) end_anchor: bool,
    pub(crate) group_count: usize,
}

/// The one way a pattern can fail to compile; everything else in the
/// surface syntax has a lenient reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("missing closing parenthesis")]
    MissingCloseParen,
}
