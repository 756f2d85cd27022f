use crate::types::{CompileError, Element, Pattern};

impl TryFrom<&str> for Pattern {
    type Error = CompileError;

    // Compile a surface pattern. Anchors only have meaning on the outermost
    // pattern: a ^ after position 0 or a $ before the final position is an
    // ordinary literal, as is either one inside a group.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let runes = value.chars().collect::<Vec<_>>();
        let mut body = runes.as_slice();

        let start_anchor = body.first() == Some(&'^');
        if start_anchor {
            body = &body[1..];
        }
        let end_anchor = body.last() == Some(&'$');
        if end_anchor {
            body = &body[..body.len() - 1];
        }

        let mut group_counter = 0;
        let mut pattern = parse_alternation(body, &mut group_counter)?;
        pattern.start_anchor = start_anchor;
        pattern.end_anchor = end_anchor;
        pattern.group_count = group_counter;
        Ok(pattern)
    }
}

// Split on top-level | (nested parens shield their contents) and parse each
// branch. A single branch becomes the pattern directly; several branches
// become one Alternation element. A trailing empty branch is dropped, so
// "a|" compiles the same as "a".
fn parse_alternation(
    runes: &[char],
    group_counter: &mut usize,
) -> Result<Pattern, CompileError> {
    let mut bounds = vec![];
    let mut depth = 0i32;
    let mut start = 0;

    for (i, &r) in runes.iter().enumerate() {
        match r {
            '(' => depth += 1,
            ')' => depth -= 1,
            '|' if depth == 0 => {
                bounds.push(&runes[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if bounds.is_empty() {
        return parse_branch(runes, group_counter);
    }

    // The final branch, unless it is empty
    if start < runes.len() {
        bounds.push(&runes[start..]);
    }

    let mut branches = Vec::with_capacity(bounds.len());
    for bound in bounds {
        branches.push(parse_branch(bound, group_counter)?);
    }

    if branches.len() == 1 {
        return Ok(branches.swap_remove(0));
    }

    Ok(Pattern {
        elements: vec![Element::Alternation(branches)],
        start_anchor: false,
        end_anchor: false,
        group_count: *group_counter,
    })
}

// Scan a single alternation-free branch into an element sequence.
fn parse_branch(runes: &[char], group_counter: &mut usize) -> Result<Pattern, CompileError> {
    let mut elements = vec![];
    let mut input = runes;

    while let Some(&r) = input.first() {
        input = &input[1..];

        let element = match r {
            '(' => {
                // Groups are numbered by the position of their opening
                // paren, before descending into the body
                *group_counter += 1;
                let index = *group_counter;

                let (group_body, rest) = split_group(input)?;
                input = rest;

                let inner = parse_alternation(group_body, group_counter)?;
                Element::Group {
                    index,
                    inner: Box::new(inner),
                }
            }

            '[' => {
                let negated = input.first() == Some(&'^');
                if negated {
                    input = &input[1..];
                }

                // Everything up to ] is collected literally; an unterminated
                // set runs to the end of the pattern
                let mut chars = vec![];
                while let Some(&c) = input.first() {
                    input = &input[1..];
                    if c == ']' {
                        break;
                    }
                    chars.push(c);
                }

                Element::CharSet { chars, negated }
            }

            '.' => Element::Wildcard,

            '\\' => match input.first() {
                // A lone trailing backslash is dropped
                None => continue,
                Some(&c) => {
                    input = &input[1..];
                    match c {
                        'd' => Element::Digit,
                        'w' => Element::Word,
                        // Backreferences never take a quantifier; a + or ?
                        // that follows one is scanned as its own atom
                        '1'..='9' => {
                            elements.push(Element::Backref(c as usize - '0' as usize));
                            continue;
                        }
                        _ => Element::Literal(c),
                    }
                }
            },

            c => Element::Literal(c),
        };

        // Check for a quantifier suffix
        let element = match input.first() {
            Some('+') => {
                input = &input[1..];
                Element::OneOrMore(Box::new(element))
            }
            Some('?') => {
                input = &input[1..];
                Element::ZeroOrOne(Box::new(element))
            }
            _ => element,
        };

        elements.push(element);
    }

    Ok(Pattern {
        elements,
        start_anchor: false,
        end_anchor: false,
        group_count: *group_counter,
    })
}

// Locate the matching close paren for a group whose ( was just consumed,
// returning the group body and the input after the ).
fn split_group(input: &[char]) -> Result<(&[char], &[char]), CompileError> {
    let mut depth = 1;
    for (i, &r) in input.iter().enumerate() {
        match r {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[..i], &input[i + 1..]));
                }
            }
            _ => {}
        }
    }
    Err(CompileError::MissingCloseParen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Element::*;

    // A sub-pattern as the parser builds it: no anchors, group_count frozen
    // at the counter value reached once its body was parsed.
    fn sub(elements: Vec<Element>, group_count: usize) -> Pattern {
        Pattern {
            elements,
            start_anchor: false,
            end_anchor: false,
            group_count,
        }
    }

    macro_rules! test_parse {
        ($name:ident, $input:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let pattern = match Pattern::try_from($input) {
                    Ok(pattern) => pattern,
                    Err(error) => panic!("Error compiling pattern: {error:?}"),
                };
                assert_eq!(pattern.elements, $expected);
            }
        };
    }

    test_parse!(single_literal, "a", vec![Literal('a')]);
    test_parse!(literal_sequence, "ab", vec![Literal('a'), Literal('b')]);
    test_parse!(wildcard, ".", vec![Wildcard]);
    test_parse!(digit_class, r"\d", vec![Digit]);
    test_parse!(word_class, r"\w", vec![Word]);

    test_parse!(escaped_dot, r"\.", vec![Literal('.')]);
    test_parse!(escaped_backslash, r"\\", vec![Literal('\\')]);
    test_parse!(unknown_escape, r"\z", vec![Literal('z')]);
    test_parse!(trailing_backslash_dropped, "a\\", vec![Literal('a')]);

    test_parse!(
        charset,
        "[abc]",
        vec![CharSet {
            chars: vec!['a', 'b', 'c'],
            negated: false
        }]
    );
    test_parse!(
        charset_negated,
        "[^ab]",
        vec![CharSet {
            chars: vec!['a', 'b'],
            negated: true
        }]
    );
    // No ranges in this dialect: the dash is just another member
    test_parse!(
        charset_dash_is_literal,
        "[0-9]",
        vec![CharSet {
            chars: vec!['0', '-', '9'],
            negated: false
        }]
    );
    test_parse!(
        charset_unterminated_runs_to_end,
        "[ab",
        vec![CharSet {
            chars: vec!['a', 'b'],
            negated: false
        }]
    );
    test_parse!(
        charset_empty,
        "[]",
        vec![CharSet {
            chars: vec![],
            negated: false
        }]
    );

    test_parse!(one_or_more, "a+", vec![OneOrMore(Box::new(Literal('a')))]);
    test_parse!(zero_or_one, "a?", vec![ZeroOrOne(Box::new(Literal('a')))]);
    test_parse!(quantified_wildcard, ".+", vec![OneOrMore(Box::new(Wildcard))]);
    test_parse!(
        quantified_charset,
        "[ab]?",
        vec![ZeroOrOne(Box::new(CharSet {
            chars: vec!['a', 'b'],
            negated: false
        }))]
    );
    test_parse!(quantified_class, r"\d+", vec![OneOrMore(Box::new(Digit))]);

    // A quantifier with nothing to attach to is a literal, and may itself
    // be quantified
    test_parse!(dangling_plus, "+", vec![Literal('+')]);
    test_parse!(
        dangling_plus_quantified,
        "+?",
        vec![ZeroOrOne(Box::new(Literal('+')))]
    );
    // The Kleene star is not part of this dialect
    test_parse!(star_is_literal, "a*", vec![Literal('a'), Literal('*')]);

    test_parse!(
        group,
        "(ab)",
        vec![Group {
            index: 1,
            inner: Box::new(sub(vec![Literal('a'), Literal('b')], 1))
        }]
    );
    test_parse!(
        group_quantified,
        "(a)+",
        vec![OneOrMore(Box::new(Group {
            index: 1,
            inner: Box::new(sub(vec![Literal('a')], 1))
        }))]
    );
    test_parse!(
        group_alternation,
        "(a|b)",
        vec![Group {
            index: 1,
            inner: Box::new(sub(
                vec![Alternation(vec![
                    sub(vec![Literal('a')], 1),
                    sub(vec![Literal('b')], 1),
                ])],
                1
            ))
        }]
    );
    test_parse!(
        nested_groups,
        "((a)b)",
        vec![Group {
            index: 1,
            inner: Box::new(sub(
                vec![
                    Group {
                        index: 2,
                        inner: Box::new(sub(vec![Literal('a')], 2))
                    },
                    Literal('b'),
                ],
                2
            ))
        }]
    );
    test_parse!(
        sibling_groups,
        "(a)(b)",
        vec![
            Group {
                index: 1,
                inner: Box::new(sub(vec![Literal('a')], 1))
            },
            Group {
                index: 2,
                inner: Box::new(sub(vec![Literal('b')], 2))
            },
        ]
    );

    test_parse!(
        top_level_alternation,
        "a|b",
        vec![Alternation(vec![
            sub(vec![Literal('a')], 0),
            sub(vec![Literal('b')], 0),
        ])]
    );
    test_parse!(trailing_empty_branch_dropped, "a|", vec![Literal('a')]);
    test_parse!(
        interior_empty_branch_kept,
        "a||b",
        vec![Alternation(vec![
            sub(vec![Literal('a')], 0),
            sub(vec![], 0),
            sub(vec![Literal('b')], 0),
        ])]
    );

    test_parse!(
        backref,
        r"(a)\1",
        vec![
            Group {
                index: 1,
                inner: Box::new(sub(vec![Literal('a')], 1))
            },
            Backref(1),
        ]
    );
    // The quantifier does not attach to the backreference; it falls through
    // to the literal path
    test_parse!(
        backref_not_quantified,
        r"(a)\1+",
        vec![
            Group {
                index: 1,
                inner: Box::new(sub(vec![Literal('a')], 1))
            },
            Backref(1),
            Literal('+'),
        ]
    );

    test_parse!(
        caret_mid_pattern_is_literal,
        "a^b",
        vec![Literal('a'), Literal('^'), Literal('b')]
    );
    test_parse!(
        dollar_mid_pattern_is_literal,
        "a$b",
        vec![Literal('a'), Literal('$'), Literal('b')]
    );
    test_parse!(
        caret_inside_group_is_literal,
        "(^a)",
        vec![Group {
            index: 1,
            inner: Box::new(sub(vec![Literal('^'), Literal('a')], 1))
        }]
    );
    test_parse!(
        dollar_inside_group_is_literal,
        "(a$)",
        vec![Group {
            index: 1,
            inner: Box::new(sub(vec![Literal('a'), Literal('$')], 1))
        }]
    );

    #[test]
    fn outer_anchors_consumed() {
        let pattern = Pattern::try_from("^ab$").unwrap();
        assert!(pattern.start_anchor);
        assert!(pattern.end_anchor);
        assert_eq!(pattern.elements, vec![Literal('a'), Literal('b')]);
    }

    #[test]
    fn empty_pattern() {
        let pattern = Pattern::try_from("").unwrap();
        assert!(pattern.elements.is_empty());
        assert!(!pattern.start_anchor);
        assert!(!pattern.end_anchor);
        assert_eq!(pattern.group_count, 0);
    }

    #[test]
    fn anchors_only() {
        let pattern = Pattern::try_from("^$").unwrap();
        assert!(pattern.elements.is_empty());
        assert!(pattern.start_anchor);
        assert!(pattern.end_anchor);
    }

    #[test]
    fn groups_numbered_across_alternation() {
        // Numbering follows the opening parens left to right, including
        // across top-level branches
        let pattern = Pattern::try_from("((a)(b))|(c)").unwrap();
        assert_eq!(pattern.group_count, 4);

        let Alternation(branches) = &pattern.elements[0] else {
            panic!("expected a top-level alternation, got {:?}", pattern.elements);
        };
        let Group { index, inner } = &branches[0].elements[0] else {
            panic!("expected a group, got {:?}", branches[0].elements);
        };
        assert_eq!(*index, 1);
        assert!(matches!(
            &inner.elements[..],
            [Group { index: 2, .. }, Group { index: 3, .. }]
        ));
        assert!(matches!(
            &branches[1].elements[..],
            [Group { index: 4, .. }]
        ));
    }

    #[test]
    fn missing_close_paren() {
        assert_eq!(
            Pattern::try_from("(ab"),
            Err(CompileError::MissingCloseParen)
        );
        assert_eq!(
            Pattern::try_from("(a(b)"),
            Err(CompileError::MissingCloseParen)
        );
    }

    #[test]
    fn compile_is_deterministic() {
        let first = Pattern::try_from("a(b|c)+[xy]\\d$").unwrap();
        let second = Pattern::try_from("a(b|c)+[xy]\\d$").unwrap();
        assert_eq!(first, second);
    }
}
