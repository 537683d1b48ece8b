//! In-memory PDF builders shared by the unit tests.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

fn font_resources(doc: &mut Document) -> ObjectId {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    })
}

fn labelled_page(doc: &mut Document, parent: ObjectId, label: String) -> ObjectId {
    let content = format!("BT /F1 24 Tf 72 720 Td ({label}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
    })
}

fn finish(doc: &mut Document, pages_id: ObjectId) {
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// Flat page tree; page `n` draws the text `{label}{n}`.
pub(crate) fn build_document(label: &str, pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = font_resources(&mut doc);

    let kids: Vec<Object> = (1..=pages)
        .map(|n| Object::Reference(labelled_page(&mut doc, pages_id, format!("{label}{n}"))))
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    finish(&mut doc, pages_id);
    doc
}

/// Two-level page tree with two pages per intermediate node. Pages carry
/// no `MediaBox` or `Resources` of their own.
pub(crate) fn build_nested_document(label: &str, pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let root_id = doc.new_object_id();
    let resources_id = font_resources(&mut doc);

    let mut branches = Vec::new();
    let mut number = 1;
    while number <= pages {
        let branch_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..2 {
            if number > pages {
                break;
            }
            kids.push(Object::Reference(labelled_page(
                &mut doc,
                branch_id,
                format!("{label}{number}"),
            )));
            number += 1;
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            branch_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => root_id,
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
            }),
        );
        branches.push(Object::Reference(branch_id));
    }

    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => branches,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    finish(&mut doc, root_id);
    doc
}

/// Serialize a built document.
pub(crate) fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Flat PDF bytes; see [`build_document`].
pub(crate) fn pdf_bytes(label: &str, pages: usize) -> Vec<u8> {
    to_bytes(build_document(label, pages))
}

/// Text label drawn on every page, in page order.
pub(crate) fn labels_of(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find('(').unwrap() + 1;
            let end = text.find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

/// Labels of a serialized PDF.
pub(crate) fn page_labels(bytes: &[u8]) -> Vec<String> {
    labels_of(&Document::load_mem(bytes).unwrap())
}
