//! Shared helpers for the integration tests.
//!
//! PDFs are generated with `lopdf` instead of being checked in; page `n`
//! of a document labelled `A` draws the text `A{n}`, so page order can be
//! read back from the merged output.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, Stream, dictionary};
use pagetrail::config::AuditConfig;
use pagetrail::session::Session;
use tempfile::TempDir;

/// Flat single-level PDF with `pages` labelled pages.
pub fn pdf_bytes(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages);
    for n in 1..=pages {
        let content = format!("BT /F1 24 Tf 72 720 Td ({label}{n}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

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
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to serialize fixture");
    buffer
}

/// Write a labelled PDF into `dir` and return its path.
pub fn write_pdf(dir: &Path, label: &str, pages: usize) -> PathBuf {
    let path = dir.join(format!("{label}.pdf"));
    std::fs::write(&path, pdf_bytes(label, pages)).expect("Failed to write fixture");
    path
}

/// Page labels of a serialized PDF, in page order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("Merged output does not parse");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).expect("Page has no content");
            let text = String::from_utf8_lossy(&content).into_owned();
            let start = text.find('(').expect("No text on page") + 1;
            let end = text.find(')').expect("Unterminated text");
            text[start..end].to_string()
        })
        .collect()
}

/// Expected labels for `label` with `pages` pages.
pub fn labels(label: &str, pages: usize) -> Vec<String> {
    (1..=pages).map(|n| format!("{label}{n}")).collect()
}

/// Session whose audit log lives in `dir`.
pub fn file_session(dir: &Path) -> Session {
    Session::open(&AuditConfig::new(dir)).expect("Failed to open session")
}

/// Fresh temporary directory.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}
