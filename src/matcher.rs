use crate::classify;
use crate::types::{Element, Pattern};

// Rune span [start, end) into the input most recently captured by a group.
// None is the "never matched" sentinel; a backreference to it cannot match.
type Span = (usize, usize);
type Captures = Vec<Option<Span>>;

impl Pattern {
    /// Search for the pattern anywhere in `input`, or at the positions its
    /// anchors allow. Returns whether any match exists.
    pub fn find(&self, input: &str) -> bool {
        let runes = input.chars().collect::<Vec<_>>();

        log::debug!("find({input:?}) against {self:?}");

        if self.start_anchor {
            let mut captures: Captures = vec![None; self.group_count];
            return self.match_here(&runes, 0, &mut captures).is_some();
        }

        // The one-past-the-end start position is included so that patterns
        // that can match zero runes succeed on the empty input
        for start in 0..=runes.len() {
            let mut captures: Captures = vec![None; self.group_count];
            if self.match_here(&runes, start, &mut captures).is_some() {
                return true;
            }
        }
        false
    }

    // Match this pattern's whole element sequence at pos.
    fn match_here(&self, input: &[char], pos: usize, captures: &mut Captures) -> Option<usize> {
        self.match_sequence(&self.elements, input, pos, captures)
    }

    // Match a suffix of this pattern's elements at pos, enforcing the end
    // anchor once the sequence is exhausted. Every speculative path (an
    // alternation arm, a quantifier retry, either side of ?) runs against a
    // cloned capture snapshot that is committed only when the whole rest of
    // the sequence succeeds.
    fn match_sequence(
        &self,
        elements: &[Element],
        input: &[char],
        pos: usize,
        captures: &mut Captures,
    ) -> Option<usize> {
        let mut pos = pos;
        let mut elements = elements;

        while let Some((element, rest)) = elements.split_first() {
            match element {
                Element::Alternation(branches) => {
                    // First branch that lets the rest of the sequence
                    // succeed wins
                    for branch in branches {
                        let mut snapshot = captures.clone();
                        if let Some(branch_end) = branch.match_here(input, pos, &mut snapshot) {
                            if let Some(end) =
                                self.match_sequence(rest, input, branch_end, &mut snapshot)
                            {
                                *captures = snapshot;
                                return Some(end);
                            }
                        }
                    }
                    return None;
                }

                Element::OneOrMore(inner) => {
                    // The first occurrence is mandatory
                    let mut caps = captures.clone();
                    let mut end = match_once(inner, input, pos, &mut caps)?;

                    // Greedily take further occurrences, recording the
                    // position and captures after each one so backtracking
                    // can restore them. Stop once an occurrence makes no
                    // progress, which a group with an empty-matching body
                    // can do.
                    let mut attempts = vec![(end, caps.clone())];
                    loop {
                        match match_once(inner, input, end, &mut caps) {
                            Some(next) if next > end => {
                                end = next;
                                attempts.push((end, caps.clone()));
                            }
                            _ => break,
                        }
                    }

                    // Try the rest at the greediest position first, then
                    // relinquish one occurrence at a time
                    while let Some((end, mut caps)) = attempts.pop() {
                        if let Some(finish) = self.match_sequence(rest, input, end, &mut caps) {
                            *captures = caps;
                            return Some(finish);
                        }
                    }
                    return None;
                }

                Element::ZeroOrOne(inner) => {
                    // Zero occurrences is preferred; one is the fallback
                    let mut snapshot = captures.clone();
                    if let Some(end) = self.match_sequence(rest, input, pos, &mut snapshot) {
                        *captures = snapshot;
                        return Some(end);
                    }

                    let mut snapshot = captures.clone();
                    if let Some(taken) = match_once(inner, input, pos, &mut snapshot) {
                        if let Some(end) = self.match_sequence(rest, input, taken, &mut snapshot) {
                            *captures = snapshot;
                            return Some(end);
                        }
                    }
                    return None;
                }

                // Groups, backreferences, and the one-rune elements consume
                // a single occurrence and continue down the sequence
                _ => {
                    pos = match_once(element, input, pos, captures)?;
                    elements = rest;
                }
            }
        }

        // Sequence complete; an end anchor additionally requires the input
        // to be exhausted
        if self.end_anchor && pos != input.len() {
            return None;
        }
        Some(pos)
    }
}

// Match a single occurrence of one element at pos. On success the position
// after the occurrence is returned and `captures` reflects any group the
// occurrence (re)captured; on failure `captures` is left untouched.
fn match_once(
    element: &Element,
    input: &[char],
    pos: usize,
    captures: &mut Captures,
) -> Option<usize> {
    match element {
        Element::Group { index, inner } => {
            let mut snapshot = captures.clone();
            let end = inner.match_here(input, pos, &mut snapshot)?;
            // The group records the rune span this occurrence consumed,
            // overwriting any earlier capture
            snapshot[index - 1] = Some((pos, end));
            *captures = snapshot;
            Some(end)
        }

        Element::Backref(index) => {
            let (start, end) = captures.get(index - 1).copied().flatten()?;
            let len = end - start;
            if pos + len > input.len() || input[pos..pos + len] != input[start..end] {
                return None;
            }
            Some(pos + len)
        }

        // The compiler never nests quantifiers or puts an alternation
        // outside a group, and match_sequence handles all three before
        // calling here
        Element::OneOrMore(_) | Element::ZeroOrOne(_) | Element::Alternation(_) => {
            unreachable!("composite element in single-occurrence position")
        }

        element => {
            if pos < input.len() && element.match_rune(input[pos]) {
                Some(pos + 1)
            } else {
                None
            }
        }
    }
}

impl Element {
    // Single-rune test for the one-rune-wide variants; the composite
    // variants never reach this.
    fn match_rune(&self, r: char) -> bool {
        match self {
            Element::Literal(c) => *c == r,
            Element::Digit => classify::is_digit_rune(r),
            Element::Word => classify::is_word_rune(r),
            Element::Wildcard => r != '\n',
            Element::CharSet { chars, negated } => chars.contains(&r) != *negated,
            _ => false,
        }
    }
}
