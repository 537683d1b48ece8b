//! Page tree manipulation.
//!
//! Helpers that locate insertion points in a page tree, detach pages from
//! their source tree and splice them into a destination tree. Trees may be
//! nested; counts are kept consistent along the whole ancestor chain.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::DocumentError;

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic or absurdly deep page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Where new page references go in the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InsertionPoint {
    /// Pages node whose `Kids` array receives the new pages.
    pub parent: ObjectId,
    /// Index in `Kids` the first new page lands at.
    pub position: usize,
}

/// Object id of the root `Pages` node.
pub(crate) fn root_pages_id(doc: &Document) -> Result<ObjectId, DocumentError> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| DocumentError::Structure(format!("catalog has no page tree: {e}")))
}

fn kids_of(doc: &Document, node: ObjectId) -> Result<&Vec<Object>, DocumentError> {
    doc.get_dictionary(node)
        .and_then(|dict| dict.get(b"Kids"))
        .and_then(Object::as_array)
        .map_err(|e| DocumentError::Structure(format!("pages node {node:?} has no Kids: {e}")))
}

/// Resolve a 1-based insertion point to a parent node and a `Kids` slot.
///
/// `dest_index` may range from 1 to `page_count + 1`; the latter appends
/// after the current last page.
pub(crate) fn insertion_point(
    doc: &Document,
    dest_index: u32,
) -> Result<InsertionPoint, DocumentError> {
    let pages = doc.get_pages();
    let page_count = pages.len() as u32;

    if dest_index == 0 || dest_index > page_count + 1 {
        return Err(DocumentError::InvalidDestination {
            dest_index,
            page_count,
        });
    }

    if page_count == 0 {
        let root = root_pages_id(doc)?;
        let position = kids_of(doc, root)?.len();
        return Ok(InsertionPoint {
            parent: root,
            position,
        });
    }

    let (anchor_number, after_anchor) = if dest_index <= page_count {
        (dest_index, false)
    } else {
        (page_count, true)
    };
    let anchor_id = pages[&anchor_number];

    let parent = doc
        .get_dictionary(anchor_id)
        .and_then(|page| page.get(b"Parent"))
        .and_then(Object::as_reference)
        .map_err(|e| {
            DocumentError::Structure(format!("page {anchor_number} has no parent: {e}"))
        })?;

    let position = kids_of(doc, parent)?
        .iter()
        .position(|kid| kid.as_reference().ok() == Some(anchor_id))
        .ok_or_else(|| {
            DocumentError::Structure(format!(
                "page {anchor_number} is missing from its parent's Kids"
            ))
        })?;

    Ok(InsertionPoint {
        parent,
        position: if after_anchor { position + 1 } else { position },
    })
}

/// Clone a page dictionary so it can live outside its source tree.
///
/// Inherited attributes are copied onto the page itself and the `Parent`
/// link is removed.
pub(crate) fn detached_page(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Dictionary, DocumentError> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|e| DocumentError::Structure(format!("page object {page_id:?}: {e}")))?
        .clone();

    let mut ancestor = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(node_id) = ancestor {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(DocumentError::Structure(
                "page tree is cyclic or too deep".to_string(),
            ));
        }

        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        for key in INHERITABLE_KEYS {
            if !page.has(key)
                && let Ok(value) = node.get(key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }

        ancestor = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    page.remove(b"Parent");
    Ok(page)
}

/// Splice `page_ids` into the tree at `at`, in the given order.
///
/// The page objects must already exist in `doc`.
pub(crate) fn link_pages(
    doc: &mut Document,
    at: InsertionPoint,
    page_ids: &[ObjectId],
) -> Result<(), DocumentError> {
    for &page_id in page_ids {
        doc.get_dictionary_mut(page_id)
            .map_err(|e| DocumentError::Structure(format!("page object {page_id:?}: {e}")))?
            .set("Parent", Object::Reference(at.parent));
    }

    let kids = doc
        .get_dictionary_mut(at.parent)
        .and_then(|dict| dict.get_mut(b"Kids"))
        .and_then(Object::as_array_mut)
        .map_err(|e| DocumentError::Structure(format!("pages node has no Kids: {e}")))?;
    let position = at.position.min(kids.len());
    kids.splice(
        position..position,
        page_ids.iter().map(|&id| Object::Reference(id)),
    );

    let added = page_ids.len() as i64;
    let mut node = Some(at.parent);
    let mut depth = 0;

    while let Some(node_id) = node {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(DocumentError::Structure(
                "page tree is cyclic or too deep".to_string(),
            ));
        }

        let dict = doc
            .get_dictionary_mut(node_id)
            .map_err(|e| DocumentError::Structure(format!("pages node {node_id:?}: {e}")))?;
        let count = dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        dict.set("Count", Object::Integer(count + added));
        node = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(())
}
