//! Page tree traversal.
//!
//! Walks the Pages/Kids hierarchy depth-first from the catalog's page root,
//! stamping `/Type` onto every node, filling inheritable attributes into
//! leaves from a snapshot stack, and collecting page references in document
//! order. A visited set keyed by object number guards against cyclic trees.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::names;
use crate::object::{Dict, Object, ObjectRef};
use std::collections::HashSet;

/// Attributes a Page inherits from enclosing Pages nodes.
const INHERITABLE: [&str; 4] = [
    names::MEDIA_BOX,
    names::ROTATE,
    names::RESOURCES,
    names::CROP_BOX,
];

/// Ordered list of the document's pages.
#[derive(Debug, Clone, Default)]
pub struct PageTree {
    refs: Vec<ObjectRef>,
}

impl PageTree {
    /// Number of pages.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// True when the document has no pages.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Reference of the 1-based page number.
    pub fn get(&self, page: usize) -> Option<ObjectRef> {
        page.checked_sub(1).and_then(|i| self.refs.get(i)).copied()
    }
}

/// Walk the tree under `root` and produce the ordered page list.
///
/// Every visited node is re-cached with its stamped `/Type` (and, for
/// leaves, the inherited attributes merged in), so later page lookups see
/// the merged dictionaries. The root node's `/Count` is refreshed from the
/// discovered leaf count.
pub(crate) fn build(doc: &mut Document, root: ObjectRef) -> Result<PageTree> {
    let mut refs = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<Dict> = vec![Dict::new()];
    walk(doc, root, &mut stack, &mut visited, &mut refs)?;

    if let Some(Object::Dictionary(mut root_dict)) = doc.load_object(root.number)? {
        root_dict.insert(
            names::COUNT.to_string(),
            Object::Integer(refs.len() as i64),
        );
        doc.cache_replace(root.number, Object::Dictionary(root_dict));
    }
    Ok(PageTree { refs })
}

fn walk(
    doc: &mut Document,
    node_ref: ObjectRef,
    stack: &mut Vec<Dict>,
    visited: &mut HashSet<u32>,
    out: &mut Vec<ObjectRef>,
) -> Result<()> {
    if !visited.insert(node_ref.number) {
        return Err(Error::PageTreeCycle(node_ref.number));
    }
    let mut dict = match doc.load_object(node_ref.number)? {
        Some(Object::Dictionary(d)) => d,
        Some(other) => {
            return Err(Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: other.type_name().to_string(),
            });
        },
        None => return Ok(()),
    };

    let kids = match dict.get(names::KIDS).cloned() {
        Some(value) => match doc.resolve(&value)? {
            Object::Array(arr) => Some(arr),
            _ => None,
        },
        None => None,
    };

    match kids {
        None => {
            // Leaf page: merge in the nearest enclosing attributes.
            dict.insert(names::TYPE.to_string(), Object::name(names::PAGE));
            let snapshot = stack.last().cloned().unwrap_or_default();
            for key in INHERITABLE {
                if !dict.contains_key(key) {
                    if let Some(value) = snapshot.get(key) {
                        dict.insert(key.to_string(), value.clone());
                    }
                }
            }
            if !dict.contains_key(names::MEDIA_BOX) {
                dict.insert(
                    names::MEDIA_BOX.to_string(),
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(595),
                        Object::Integer(842),
                    ]),
                );
            }
            doc.cache_replace(node_ref.number, Object::Dictionary(dict));
            out.push(node_ref);
        },
        Some(kid_values) => {
            dict.insert(names::TYPE.to_string(), Object::name(names::PAGES));
            let mut snapshot = stack.last().cloned().unwrap_or_default();
            for key in INHERITABLE {
                if let Some(value) = dict.get(key) {
                    snapshot.insert(key.to_string(), value.clone());
                }
            }
            stack.push(snapshot);

            let mut kept = Vec::new();
            let mut truncated = false;
            let mut result = Ok(());
            for kid in &kid_values {
                match kid {
                    Object::Reference(r) => {
                        kept.push(kid.clone());
                        result = walk(doc, *r, stack, visited, out);
                        if result.is_err() {
                            break;
                        }
                    },
                    other => {
                        // Direct objects inside Kids truncate the rest of
                        // the array; documented leniency, not an error.
                        log::warn!(
                            "direct {} in /Kids of object {}; truncating",
                            other.type_name(),
                            node_ref.number
                        );
                        truncated = true;
                        break;
                    },
                }
            }
            stack.pop();
            result?;

            if truncated {
                dict.insert(names::KIDS.to_string(), Object::Array(kept));
            }
            doc.cache_replace(node_ref.number, Object::Dictionary(dict));
        },
    }
    Ok(())
}
