/// Redis-style glob matching for `keys`.
///
/// Supports `*` (any run), `?` (one char), `[abc]`, `[a-z]`, `[^abc]` and
/// `\x` escapes. Matching is per `char`, not per byte.
pub struct GlobPattern {
    chars: Vec<char>,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Self {
        GlobPattern {
            chars: pattern.chars().collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        glob_match(&self.chars, &text)
    }
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let mut pi = 0;
    let mut ti = 0;
    // Position of the last `*` and the text index it is currently absorbing up to.
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        if pi < pattern.len() {
            match pattern[pi] {
                '*' => {
                    star = Some((pi, ti));
                    pi += 1;
                    continue;
                }
                '?' => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                '\\' if pi + 1 < pattern.len() => {
                    if pattern[pi + 1] == text[ti] {
                        pi += 2;
                        ti += 1;
                        continue;
                    }
                }
                '[' => {
                    if let Some((true, end)) = match_class(pattern, pi, text[ti]) {
                        pi = end;
                        ti += 1;
                        continue;
                    }
                }
                c if c == text[ti] => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                _ => {}
            }
        }

        match star {
            Some((star_pi, star_ti)) => {
                pi = star_pi + 1;
                ti = star_ti + 1;
                star = Some((star_pi, star_ti + 1));
            }
            None => return false,
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }
    pi == pattern.len()
}

/// Matches the class opening at `pattern[open]`. Returns whether `ch` is in
/// the class and the index just past the closing `]`, or `None` when the
/// class is never closed (the `[` is then compared literally).
fn match_class(pattern: &[char], open: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = open + 1;
    let negate = i < pattern.len() && pattern[i] == '^';
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < pattern.len() {
        match pattern[i] {
            ']' => return Some((matched != negate, i + 1)),
            '\\' if i + 1 < pattern.len() => {
                matched |= pattern[i + 1] == ch;
                i += 2;
            }
            lo if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']' => {
                let hi = pattern[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                matched |= lo <= ch && ch <= hi;
                i += 3;
            }
            c => {
                matched |= c == ch;
                i += 1;
            }
        }
    }

    if ch == '[' {
        Some((true, open + 1))
    } else {
        None
    }
}
