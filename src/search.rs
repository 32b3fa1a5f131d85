//! Regex search and replace over `w:t` text nodes.
//!
//! Word splits a sentence over as many runs as it likes, so the windowed
//! variants join up to `window` consecutive text nodes before matching. All
//! passes are single-pass: text produced by a replacement is never rescanned.

use std::collections::BTreeSet;

use log::debug;
use regex::{NoExpand, Regex};

use crate::document::Document;
use crate::model::Content;
use crate::xml::{Element, XML};

pub const DEFAULT_WINDOW: usize = 3;

/// Paths (child indices from the root) of every non-empty `w:t` in document order.
fn text_paths(root: &Element) -> Vec<Vec<usize>> {
    fn walk(node: &Element, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if node.is_w("t") && node.text.as_deref().is_some_and(|t| !t.is_empty()) {
            out.push(path.clone());
        }
        for (i, child) in node.children.iter().enumerate() {
            path.push(i);
            walk(child, path, out);
            path.pop();
        }
    }
    let mut out = Vec::new();
    walk(root, &mut Vec::new(), &mut out);
    out
}

fn node_at<'a>(root: &'a Element, path: &[usize]) -> &'a Element {
    path.iter().fold(root, |node, &i| &node.children[i])
}

fn node_at_mut<'a>(root: &'a mut Element, path: &[usize]) -> &'a mut Element {
    path.iter().fold(root, |node, &i| &mut node.children[i])
}

struct Hit {
    /// Offset into the active window of the first matching node.
    start: usize,
    len: usize,
    joined: String,
    match_start: usize,
    matched: String,
}

/// Try every contiguous run of `active` nodes, shortest first, then earliest.
fn find_hit(texts: &[String], active: &[usize], pattern: &Regex) -> Option<Hit> {
    for len in 1..=active.len() {
        for start in 0..=active.len() - len {
            let joined: String = active[start..start + len]
                .iter()
                .map(|&k| texts[k].as_str())
                .collect();
            if let Some(m) = pattern.find(&joined) {
                return Some(Hit {
                    start,
                    len,
                    match_start: m.start(),
                    matched: m.as_str().to_string(),
                    joined,
                });
            }
        }
    }
    None
}

/// Drive the sliding window over `texts`, calling `on_hit` for the first hit
/// found after each node is added.
fn scan(
    texts: &mut [String],
    pattern: &Regex,
    window: usize,
    mut on_hit: impl FnMut(&mut [String], &[usize], Hit) -> bool,
) {
    let window = window.max(1);
    let mut active: Vec<usize> = Vec::with_capacity(window + 1);
    for i in 0..texts.len() {
        active.push(i);
        if active.len() > window {
            active.remove(0);
        }
        if let Some(hit) = find_hit(texts, &active, pattern) {
            let span: Vec<usize> = active[hit.start..hit.start + hit.len].to_vec();
            debug!("match {:?} across text nodes {:?}", hit.matched, span);
            if !on_hit(texts, &span, hit) {
                return;
            }
        }
    }
}

fn collect_texts(root: &Element, paths: &[Vec<usize>]) -> Vec<String> {
    paths
        .iter()
        .map(|p| node_at(root, p).text.clone().unwrap_or_default())
        .collect()
}

/// Whether `pattern` matches anywhere, allowing matches to span up to
/// [`DEFAULT_WINDOW`] adjacent text nodes.
pub fn search(document: &Document, pattern: &Regex) -> bool {
    let paths = text_paths(document.root());
    let mut texts = collect_texts(document.root(), &paths);
    let mut found = false;
    scan(&mut texts, pattern, DEFAULT_WINDOW, |_, _, _| {
        found = true;
        false
    });
    found
}

/// Every distinct matched string, found with a window of `window` text nodes.
pub fn advanced_search(document: &Document, pattern: &Regex, window: usize) -> BTreeSet<String> {
    let paths = text_paths(document.root());
    let mut texts = collect_texts(document.root(), &paths);
    let mut matches = BTreeSet::new();
    scan(&mut texts, pattern, window, |_, _, hit| {
        matches.insert(hit.matched);
        true
    });
    matches
}

fn set_text(node: &mut Element, text: String) {
    if text.trim().len() < text.len() {
        node.set_attr_ns(Some(XML), "space", "preserve");
    }
    node.text = (!text.is_empty()).then_some(text);
}

/// Replace matches inside each text node on its own. `replacement` is
/// inserted literally, `$` included. Returns the number of nodes changed.
pub fn replace(document: &mut Document, pattern: &Regex, replacement: &str) -> usize {
    let mut changed = 0;
    for path in text_paths(document.root()) {
        let node = node_at_mut(document.root_mut(), &path);
        let text = node.text.as_deref().unwrap_or("");
        if !pattern.is_match(text) {
            continue;
        }
        let replaced = pattern.replace_all(text, NoExpand(replacement)).into_owned();
        set_text(node, replaced);
        changed += 1;
    }
    changed
}

/// Windowed replace.
///
/// For a match spanning several nodes, the node holding the match start
/// receives the whole joined text with every match substituted, and the other
/// nodes of the span are emptied. Element replacements empty the match from
/// the text and are inserted as siblings right after the enclosing paragraph.
/// Returns the number of replacements made.
pub fn advanced_replace(
    document: &mut Document,
    pattern: &Regex,
    replacement: &Content,
    window: usize,
) -> usize {
    let paths = text_paths(document.root());
    let mut texts = collect_texts(document.root(), &paths);
    let mut insertions: Vec<(usize, Vec<Element>)> = Vec::new();
    let mut count = 0;

    scan(&mut texts, pattern, window, |texts, span, hit| {
        let mut target = *span.last().unwrap_or(&0);
        let mut cumulative = 0;
        for &k in span {
            cumulative += texts[k].len();
            if cumulative > hit.match_start {
                target = k;
                break;
            }
        }
        for &k in span {
            texts[k].clear();
        }
        match replacement {
            Content::Text(text) => {
                texts[target] = pattern.replace_all(&hit.joined, NoExpand(text)).into_owned();
            }
            Content::Node(node) => {
                texts[target] = pattern.replace_all(&hit.joined, "").into_owned();
                insertions.push((target, vec![node.clone()]));
            }
            Content::Nodes(nodes) => {
                texts[target] = pattern.replace_all(&hit.joined, "").into_owned();
                insertions.push((target, nodes.clone()));
            }
        }
        count += 1;
        true
    });

    let root = document.root_mut();
    for (path, text) in paths.iter().zip(texts) {
        let node = node_at_mut(root, path);
        if node.text.as_deref().unwrap_or("") != text {
            set_text(node, text);
        }
    }

    // Later insertions first so earlier paths stay valid.
    for (k, nodes) in insertions.into_iter().rev() {
        let path = &paths[k];
        let Some(depth) = (0..path.len())
            .rev()
            .find(|&d| node_at(root, &path[..d]).is_w("p"))
        else {
            debug!("text node {k} has no enclosing paragraph, dropping replacement");
            continue;
        };
        if depth == 0 {
            continue;
        }
        let parent = node_at_mut(root, &path[..depth - 1]);
        let at = path[depth - 1] + 1;
        for (offset, node) in nodes.into_iter().enumerate() {
            parent.children.insert(at + offset, node);
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Paragraph;
    use crate::model::Content;

    fn split_paragraph(parts: &[&str]) -> Element {
        let mut p = Element::w("p");
        for part in parts {
            p.push(Element::w("r").with_child(Element::w("t").with_text(*part)));
        }
        p
    }

    fn doc_of(paragraphs: Vec<Element>) -> Document {
        let mut doc = Document::new();
        doc.extend(paragraphs);
        doc
    }

    fn run_texts(doc: &Document) -> Vec<String> {
        let mut out = Vec::new();
        doc.root().visit(&mut |n| {
            if n.is_w("t") {
                out.push(n.text.clone().unwrap_or_default());
            }
        });
        out
    }

    #[test]
    fn search_spans_run_boundaries() {
        let doc = doc_of(vec![split_paragraph(&["Hel", "lo,", " world!"])]);
        assert!(search(&doc, &Regex::new("Hello,").unwrap()));
        assert!(search(&doc, &Regex::new("lo, wor").unwrap()));
        assert!(!search(&doc, &Regex::new("Goodbye").unwrap()));
    }

    #[test]
    fn window_limits_span() {
        let doc = doc_of(vec![split_paragraph(&["a", "b", "c", "d"])]);
        let pattern = Regex::new("abcd").unwrap();
        assert!(advanced_search(&doc, &pattern, 3).is_empty());
        assert_eq!(advanced_search(&doc, &pattern, 4).into_iter().collect::<Vec<_>>(), vec!["abcd"]);
    }

    #[test]
    fn advanced_search_collects_distinct_matches() {
        let doc = doc_of(vec![split_paragraph(&["Hel", "lo", " __", "name", "__!"])]);
        let found = advanced_search(&doc, &Regex::new("__[a-z]+__").unwrap(), DEFAULT_WINDOW);
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["__name__"]);
    }

    #[test]
    fn advanced_replace_moves_text_into_first_node() {
        let mut doc = doc_of(vec![split_paragraph(&["Hel", "lo,", " world!"])]);
        let n = advanced_replace(&mut doc, &Regex::new("Hello,").unwrap(), &Content::from("Hi!"), 3);
        assert_eq!(n, 1);
        assert_eq!(run_texts(&doc), vec!["Hi!", "", " world!"]);
        assert_eq!(doc.text(), vec!["Hi! world!"]);
    }

    #[test]
    fn advanced_replace_whole_sentence() {
        let mut doc = doc_of(vec![split_paragraph(&["Hel", "lo,", " world!"])]);
        advanced_replace(&mut doc, &Regex::new("Hello, world").unwrap(), &Content::from("Hi"), 3);
        assert_eq!(run_texts(&doc), vec!["Hi!", "", ""]);
    }

    #[test]
    fn single_node_match_is_left_in_place() {
        let mut doc = doc_of(vec![split_paragraph(&["Hel", "lo,", " world!"])]);
        advanced_replace(&mut doc, &Regex::new("Hel").unwrap(), &Content::from("Hal"), 3);
        assert_eq!(run_texts(&doc), vec!["Hal", "lo,", " world!"]);
    }

    #[test]
    fn replaced_pattern_is_gone() {
        let mut doc = doc_of(vec![split_paragraph(&["Dear {{na", "me}},"])]);
        let pattern = Regex::new(r"\{\{name\}\}").unwrap();
        advanced_replace(&mut doc, &pattern, &Content::from("Ada"), 3);
        assert!(!search(&doc, &pattern));
        assert_eq!(run_texts(&doc), vec!["Dear Ada,", ""]);
    }

    #[test]
    fn single_node_match_wins_over_spanning_match() {
        let mut doc = doc_of(vec![split_paragraph(&["{{na", "me}} and {{name}}"])]);
        let pattern = Regex::new(r"\{\{name\}\}").unwrap();
        advanced_replace(&mut doc, &pattern, &Content::from("Ada"), 3);
        assert_eq!(run_texts(&doc), vec!["{{na", "me}} and Ada"]);
        assert!(search(&doc, &pattern));
    }

    #[test]
    fn self_reintroducing_replacement_is_not_rescanned() {
        let mut doc = doc_of(vec![split_paragraph(&["a"])]);
        let n = advanced_replace(&mut doc, &Regex::new("a").unwrap(), &Content::from("aa"), 3);
        assert_eq!(n, 1);
        assert_eq!(run_texts(&doc), vec!["aa"]);
    }

    #[test]
    fn node_replacement_goes_after_paragraph() {
        let mut doc = doc_of(vec![
            split_paragraph(&["before ", "[TA", "BLE]"]),
            split_paragraph(&["tail"]),
        ]);
        let inserted = Paragraph::new("inserted").build();
        advanced_replace(&mut doc, &Regex::new(r"\[TABLE\]").unwrap(), &Content::Node(inserted), 3);
        assert_eq!(doc.text(), vec!["before ", "inserted", "tail"]);
    }

    #[test]
    fn simple_replace_stays_inside_nodes() {
        let mut doc = doc_of(vec![split_paragraph(&["cat cat", "ca", "t"])]);
        let changed = replace(&mut doc, &Regex::new("cat").unwrap(), "dog");
        assert_eq!(changed, 1);
        assert_eq!(run_texts(&doc), vec!["dog dog", "ca", "t"]);
    }

    #[test]
    fn replacement_whitespace_is_preserved() {
        let mut doc = doc_of(vec![split_paragraph(&["X"])]);
        replace(&mut doc, &Regex::new("X").unwrap(), " padded ");
        let mut space = None;
        doc.root().visit(&mut |n| {
            if n.is_w("t") {
                space = n.attr("space").map(str::to_string);
            }
        });
        assert_eq!(space.as_deref(), Some("preserve"));
    }

    #[test]
    fn dollar_signs_in_replacement_are_literal() {
        let mut doc = doc_of(vec![split_paragraph(&["Total: {{pri", "ce}}"])]);
        let price = Regex::new(r"\{\{price\}\}").unwrap();
        advanced_replace(&mut doc, &price, &Content::from("$12.50"), DEFAULT_WINDOW);
        assert_eq!(doc.text(), vec!["Total: $12.50"]);

        let mut doc = doc_of(vec![split_paragraph(&["Cost X"])]);
        replace(&mut doc, &Regex::new("(X)").unwrap(), "$5 ($1)");
        assert_eq!(run_texts(&doc), vec!["Cost $5 ($1)"]);
    }
}
