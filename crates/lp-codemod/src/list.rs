//! Comma-separated lists inside `(...)` and `{...}`: parameter lists, call
//! arguments and `use` groups.

use lp_codemod_lex::{Span, TokenStream};

/// One item of a bracketed list, as an inclusive range of code tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListItem {
    pub first: usize,
    pub last: usize,
}

/// Split the list opened at code token `open` into its items.
///
/// Commas nested in brackets or in generic arguments do not split. A
/// trailing comma does not produce an empty item. Returns nothing when the
/// bracket at `open` is unbalanced.
pub fn list_items(ts: &TokenStream, open: usize) -> Vec<ListItem> {
    let Some(close) = ts.partner(open).filter(|&close| close > open) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut start = open + 1;
    let mut angles = 0usize;
    let mut j = open + 1;
    while j < close {
        if let Some(partner) = ts.partner(j).filter(|&p| p > j) {
            j = partner + 1;
            continue;
        }
        if ts.opens_generic(j) {
            angles += 1;
        } else if ts.is_punct(j, ">") && angles > 0 {
            angles -= 1;
        } else if ts.is_punct(j, ",") && angles == 0 {
            if j > start {
                items.push(ListItem {
                    first: start,
                    last: j - 1,
                });
            }
            start = j + 1;
        }
        j += 1;
    }
    if start < close {
        items.push(ListItem {
            first: start,
            last: close - 1,
        });
    }
    items
}

/// Spans to delete so that the items flagged in `remove` disappear together
/// with exactly one separating comma each.
///
/// A removed run followed by a kept item is cut up to that item's start, so
/// the kept item inherits the removed run's position and indentation. A run
/// reaching the end of the list is cut from the end of the preceding kept
/// item, leaving any trailing comma in place. When every item goes, the list
/// is emptied down to its brackets.
pub fn removal_spans(
    ts: &TokenStream,
    open: usize,
    items: &[ListItem],
    remove: &[bool],
) -> Vec<Span> {
    debug_assert_eq!(items.len(), remove.len());
    let Some(close) = ts.partner(open) else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    let mut i = 0;
    while i < items.len() {
        if !remove[i] {
            i += 1;
            continue;
        }
        let run_start = i;
        while i + 1 < items.len() && remove[i + 1] {
            i += 1;
        }
        let run_end = i;
        i += 1;

        let span = if run_end + 1 < items.len() {
            Span::new(
                ts.span(items[run_start].first).start,
                ts.span(items[run_end + 1].first).start,
            )
        } else if run_start > 0 {
            Span::new(
                ts.span(items[run_start - 1].last).end,
                ts.span(items[run_end].last).end,
            )
        } else {
            Span::new(ts.span(open).end, ts.span(close).start)
        };
        spans.push(span);
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_codemod_lex::PatchSet;

    fn strip(source: &str, doomed: &[&str]) -> String {
        let ts = TokenStream::new(source);
        let open = (0..ts.len()).find(|&i| ts.is_punct(i, "(")).unwrap();
        let items = list_items(&ts, open);
        let remove: Vec<bool> = items
            .iter()
            .map(|item| doomed.contains(&ts.span_of(item.first, item.last).slice(source)))
            .collect();
        let mut patches = PatchSet::new();
        for span in removal_spans(&ts, open, &items, &remove) {
            patches.delete(span);
        }
        patches.apply(source).unwrap()
    }

    #[test]
    fn test_items_ignore_nested_commas() {
        let source = "f(a, g(b, c), HashMap<K, V>, [d, e],)";
        let ts = TokenStream::new(source);
        let items: Vec<&str> = list_items(&ts, 1)
            .iter()
            .map(|item| ts.span_of(item.first, item.last).slice(source))
            .collect();
        assert_eq!(items, vec!["a", "g(b, c)", "HashMap<K, V>", "[d, e]"]);
    }

    #[test]
    fn test_empty_list() {
        let ts = TokenStream::new("f()");
        assert!(list_items(&ts, 1).is_empty());
    }

    #[test]
    fn test_remove_first() {
        assert_eq!(strip("f(pool, x, y)", &["pool"]), "f(x, y)");
    }

    #[test]
    fn test_remove_middle() {
        assert_eq!(strip("f(x, pool, y)", &["pool"]), "f(x, y)");
    }

    #[test]
    fn test_remove_last() {
        assert_eq!(strip("f(x, y, pool)", &["pool"]), "f(x, y)");
    }

    #[test]
    fn test_remove_only() {
        assert_eq!(strip("f(pool)", &["pool"]), "f()");
    }

    #[test]
    fn test_remove_last_with_trailing_comma() {
        assert_eq!(strip("f(x, pool,)", &["pool"]), "f(x,)");
    }

    #[test]
    fn test_remove_adjacent_items() {
        assert_eq!(strip("f(a, b, c, d)", &["b", "c"]), "f(a, d)");
        assert_eq!(strip("f(a, b, c)", &["b", "c"]), "f(a)");
        assert_eq!(strip("f(a, b, c)", &["a", "c"]), "f(b)");
    }

    #[test]
    fn test_remove_multiline() {
        let source = "fn f(\n    a: A,\n    pool: P,\n    b: B,\n) {}";
        assert_eq!(
            strip(source, &["pool: P"]),
            "fn f(\n    a: A,\n    b: B,\n) {}"
        );
        let source = "fn f(\n    a: A,\n    pool: P,\n) {}";
        assert_eq!(strip(source, &["pool: P"]), "fn f(\n    a: A,\n) {}");
        let source = "fn f(\n    pool: P,\n) {}";
        assert_eq!(strip(source, &["pool: P"]), "fn f() {}");
    }
}
