//! Tree adapter: XML option files (`options/other.xml`, `ide.general.xml`).
//!
//! Purge runs three passes over the element tree:
//! 1. under every `RecentProjectMetaInfo`, each child that is or contains a
//!    matching `projectPath` option is dropped;
//! 2. recent-file `option` entries whose `value` matches are dropped;
//! 3. every remaining element whose direct text or any attribute value matches
//!    is removed from its parent.
//!
//! The root element itself is never removed.

use crate::core::error::ScrubError;
use crate::core::terms::MatchTermSet;
use crate::plugins::{Applied, parse_failure, write_failure, write_replacing};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;
use xmltree::{Element, EmitterConfig, XMLNode};

const RECENT_PROJECT: &str = "RecentProjectMetaInfo";
const RECENT_FILES: &str = "RecentFiles";
const PROJECT_PATH: &str = "projectPath";

pub fn load(path: &Path) -> Result<Element, ScrubError> {
    let file = File::open(path).map_err(|e| write_failure(path, e))?;
    Element::parse(BufReader::new(file)).map_err(|e| parse_failure(path, e))
}

pub fn purge(path: &Path, terms: &MatchTermSet) -> Result<Applied, ScrubError> {
    let mut root = load(path)?;

    let projects = purge_recent_projects(&mut root, terms);
    let files = purge_recent_files(&mut root, terms);
    let generic = remove_flagged(&mut root, terms);
    debug!(path = %path.display(), projects, files, generic, "tree purge passes");

    let removed = projects + files + generic;
    if removed == 0 {
        return Ok(Applied::Unchanged);
    }

    let mut buf = Vec::new();
    root.write_with_config(&mut buf, EmitterConfig::new().perform_indent(true))
        .map_err(|e| write_failure(path, e))?;
    write_replacing(path, &buf)?;
    Ok(Applied::removed(removed))
}

/// Concatenated text and CDATA children of `el`, not descending further.
fn direct_text(el: &Element) -> String {
    el.children
        .iter()
        .filter_map(|n| match n {
            XMLNode::Text(t) | XMLNode::CData(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

fn is_flagged(el: &Element, terms: &MatchTermSet) -> bool {
    let text = direct_text(el);
    if !text.trim().is_empty() && terms.matches(&text) {
        return true;
    }
    el.attributes.values().any(|v| terms.matches(v))
}

/// Remove flagged descendants of `el`. Returns the number of subtrees removed.
pub(crate) fn remove_flagged(el: &mut Element, terms: &MatchTermSet) -> usize {
    let before = el.children.len();
    el.children.retain(|node| match node {
        XMLNode::Element(child) => !is_flagged(child, terms),
        _ => true,
    });
    let mut removed = before - el.children.len();
    for node in el.children.iter_mut() {
        if let XMLNode::Element(child) = node {
            removed += remove_flagged(child, terms);
        }
    }
    removed
}

fn attr<'e>(el: &'e Element, name: &str) -> Option<&'e str> {
    el.attributes.get(name).map(String::as_str)
}

fn holds_matching_project_path(el: &Element, terms: &MatchTermSet) -> bool {
    let is_match = el.name == "option"
        && attr(el, "name") == Some(PROJECT_PATH)
        && attr(el, "value").is_some_and(|v| terms.matches(v));
    is_match
        || el.children.iter().any(|n| match n {
            XMLNode::Element(child) => holds_matching_project_path(child, terms),
            _ => false,
        })
}

/// Drop children of every `RecentProjectMetaInfo` that are, or contain, a
/// matching `projectPath` option. In the usual JetBrains layout the option is
/// a direct child, so only the option itself goes; the enclosing map entry is
/// left to the generic pass, which removes it by its matching `key`.
pub(crate) fn purge_recent_projects(el: &mut Element, terms: &MatchTermSet) -> usize {
    let mut removed = 0;
    if el.name == RECENT_PROJECT {
        let before = el.children.len();
        el.children.retain(|node| match node {
            XMLNode::Element(child) => !holds_matching_project_path(child, terms),
            _ => true,
        });
        removed += before - el.children.len();
    }
    for node in el.children.iter_mut() {
        if let XMLNode::Element(child) = node {
            removed += purge_recent_projects(child, terms);
        }
    }
    removed
}

fn is_recent_files(el: &Element) -> bool {
    el.name == RECENT_FILES || attr(el, "name") == Some(RECENT_FILES)
}

/// Drop matching `option` entries anywhere under a recent-files container.
pub(crate) fn purge_recent_files(el: &mut Element, terms: &MatchTermSet) -> usize {
    if is_recent_files(el) {
        return remove_matching_options(el, terms);
    }
    let mut removed = 0;
    for node in el.children.iter_mut() {
        if let XMLNode::Element(child) = node {
            removed += purge_recent_files(child, terms);
        }
    }
    removed
}

fn remove_matching_options(el: &mut Element, terms: &MatchTermSet) -> usize {
    let before = el.children.len();
    el.children.retain(|node| match node {
        XMLNode::Element(child) => {
            !(child.name == "option" && attr(child, "value").is_some_and(|v| terms.matches(v)))
        }
        _ => true,
    });
    let mut removed = before - el.children.len();
    for node in el.children.iter_mut() {
        if let XMLNode::Element(child) = node {
            removed += remove_matching_options(child, terms);
        }
    }
    removed
}
