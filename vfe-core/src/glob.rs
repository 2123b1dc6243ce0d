//! Wildcard name filters (`*.txt`, `file?.[ch]`, `[!.]*`)

/// Patterns matched against bare file names.
///
/// An empty set matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilters {
    patterns: Vec<Vec<char>>,
    case_sensitive: bool,
}

impl NameFilters {
    pub fn new<I, S>(patterns: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .filter(|p| !p.as_ref().is_empty())
                .map(|p| p.as_ref().chars().collect())
                .collect(),
            case_sensitive,
        }
    }

    /// Split a `"*.cpp *.h"` / `"*.cpp;*.h"` list into patterns
    pub fn parse(list: &str, case_sensitive: bool) -> Self {
        let separator = if list.contains(';') { ';' } else { ' ' };
        Self::new(list.split(separator).map(str::trim), case_sensitive)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let name: Vec<char> = name.chars().collect();
        self.patterns
            .iter()
            .any(|pattern| wildcard_match(pattern, &name, self.case_sensitive))
    }
}

/// Match a single wildcard pattern against `name`
pub fn matches(pattern: &str, name: &str, case_sensitive: bool) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    wildcard_match(&pattern, &name, case_sensitive)
}

fn same(a: char, b: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a == b || a.to_lowercase().eq(b.to_lowercase())
    }
}

/// `[...]` set starting at `pattern[start]`
struct CharClass {
    negated: bool,
    items: Vec<(char, char)>,
    /// Index just past the closing `]`
    end: usize,
}

impl CharClass {
    fn parse(pattern: &[char], start: usize) -> Option<Self> {
        let mut i = start + 1;
        let negated = matches!(pattern.get(i), Some('!') | Some('^'));
        if negated {
            i += 1;
        }
        let mut items = Vec::new();
        let first = i;
        while i < pattern.len() {
            let c = pattern[i];
            if c == ']' && i > first {
                return Some(Self {
                    negated,
                    items,
                    end: i + 1,
                });
            }
            if pattern.get(i + 1) == Some(&'-') && pattern.get(i + 2).is_some_and(|c| *c != ']') {
                items.push((c, pattern[i + 2]));
                i += 3;
            } else {
                items.push((c, c));
                i += 1;
            }
        }
        None
    }

    fn contains(&self, c: char, case_sensitive: bool) -> bool {
        let hit = |c: char| self.items.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        let found = if case_sensitive {
            hit(c)
        } else {
            hit(c) || c.to_lowercase().any(hit) || c.to_uppercase().any(hit)
        };
        found != self.negated
    }
}

fn wildcard_match(pattern: &[char], name: &[char], case_sensitive: bool) -> bool {
    let (mut p, mut n) = (0, 0);
    // last `*` seen and the name position it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        let next = match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
                continue;
            }
            Some('?') => Some(p + 1),
            Some('[') => match CharClass::parse(pattern, p) {
                Some(class) => class.contains(name[n], case_sensitive).then_some(class.end),
                None => same('[', name[n], case_sensitive).then_some(p + 1),
            },
            Some(&c) => same(c, name[n], case_sensitive).then_some(p + 1),
            None => None,
        };

        match (next, backtrack) {
            (Some(next), _) => {
                p = next;
                n += 1;
            }
            (None, Some((star, absorbed))) => {
                p = star + 1;
                n = absorbed + 1;
                backtrack = Some((star, absorbed + 1));
            }
            (None, None) => return false,
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
