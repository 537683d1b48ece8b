//! End-to-end merges over files on disk.

use pagetrail::audit::{AuditEventStore, EventKind, NewAuditEvent};
use pagetrail::config::CompressionLevel;
use pagetrail::error::{DocumentError, PageTrailError};
use pagetrail::io::{DocumentRef, PdfWriter};
use pagetrail::merge::{MergeRequest, Merger, PdfDocument, merge_documents};
use pagetrail::session::Session;
use rstest::rstest;

use crate::common::{file_session, labels, page_labels, pdf_bytes, temp_dir, write_pdf};

#[tokio::test]
async fn test_merge_two_files_in_order() {
    let dir = temp_dir();
    let a = write_pdf(dir.path(), "A", 3);
    let b = write_pdf(dir.path(), "B", 2);
    let session = file_session(dir.path());

    let output = merge_documents(
        &session,
        vec![DocumentRef::path(&a), DocumentRef::path(&b)],
        "combined",
    )
    .await
    .unwrap();

    assert_eq!(output.file_name, "combined.pdf");
    assert_eq!(output.total_pages, 5);
    assert_eq!(output.page_counts, [3, 2]);
    assert_eq!(
        page_labels(&output.bytes),
        [labels("A", 3), labels("B", 2)].concat()
    );
    assert_eq!(session.open_documents(), 0);
}

#[tokio::test]
async fn test_merge_reverse_order() {
    let dir = temp_dir();
    let a = write_pdf(dir.path(), "A", 3);
    let b = write_pdf(dir.path(), "B", 2);
    let session = file_session(dir.path());

    let request = MergeRequest::from_paths(&[&b, &a], "reversed.pdf").unwrap();
    let output = Merger::new().merge(&session, &request).await.unwrap();

    assert_eq!(output.file_name, "reversed.pdf");
    assert_eq!(
        page_labels(&output.bytes),
        [labels("B", 2), labels("A", 3)].concat()
    );
}

#[tokio::test]
async fn test_single_input_rejected_before_loading() {
    let dir = temp_dir();
    let session = file_session(dir.path());

    // Not even a file; the count check comes first.
    let request = MergeRequest::from_paths(&[dir.path().join("missing.pdf")], "x").unwrap();
    let err = Merger::new().merge(&session, &request).await.unwrap_err();

    assert!(matches!(err, PageTrailError::InsufficientInputs { count: 1 }));
    assert_eq!(err.failing_index(), None);
}

#[rstest]
#[case::missing_file(None)]
#[case::garbage_bytes(Some(b"definitely not a pdf".as_slice()))]
#[tokio::test]
async fn test_failure_names_input_index(#[case] second_contents: Option<&[u8]>) {
    let dir = temp_dir();
    let first = write_pdf(dir.path(), "A", 1);
    let second = dir.path().join("broken.pdf");
    if let Some(contents) = second_contents {
        std::fs::write(&second, contents).unwrap();
    }
    let third = write_pdf(dir.path(), "C", 2);
    let session = file_session(dir.path());

    let request = MergeRequest::from_paths(&[&first, &second, &third], "out").unwrap();
    let err = Merger::new().merge(&session, &request).await.unwrap_err();

    assert_eq!(err.failing_index(), Some(2));
    assert!(err.to_string().contains("#2"));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(session.open_documents(), 0);
}

#[tokio::test]
async fn test_merge_from_bytes_and_paths() {
    let dir = temp_dir();
    let a = write_pdf(dir.path(), "A", 2);
    let session = Session::in_memory();

    let order = vec![
        DocumentRef::path(&a),
        DocumentRef::bytes("inline.pdf", pdf_bytes("M", 1)),
        DocumentRef::url(format!("file://{}", a.display())),
    ];
    let output = merge_documents(&session, order, "mixed").await.unwrap();

    assert_eq!(
        page_labels(&output.bytes),
        ["A1", "A2", "M1", "A1", "A2"]
    );
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_every_compression_level_round_trips(#[case] level: CompressionLevel) {
    let session = Session::in_memory();
    let order = vec![
        DocumentRef::bytes("a.pdf", pdf_bytes("A", 2)),
        DocumentRef::bytes("b.pdf", pdf_bytes("B", 2)),
    ];
    let request = MergeRequest::new(order, "out").unwrap();

    let output = Merger::new()
        .with_compression(level)
        .with_jobs(1)
        .merge(&session, &request)
        .await
        .unwrap();

    assert_eq!(page_labels(&output.bytes), ["A1", "A2", "B1", "B2"]);
    assert_eq!(output.statistics.compressed, level != CompressionLevel::None);
}

#[tokio::test]
async fn test_write_merged_output_and_record_it() {
    let dir = temp_dir();
    let a = write_pdf(dir.path(), "A", 1);
    let b = write_pdf(dir.path(), "B", 1);
    let session = file_session(dir.path());

    let request = MergeRequest::from_paths(&[&a, &b], "result").unwrap();
    let output = Merger::new().merge(&session, &request).await.unwrap();

    let out_path = dir.path().join(&output.file_name);
    let stats = PdfWriter::new().save(&output.bytes, &out_path).await.unwrap();
    assert_eq!(stats.file_size, output.bytes.len() as u64);

    let written = std::fs::read(&out_path).unwrap();
    assert_eq!(page_labels(&written), ["A1", "B1"]);

    let store = session.audit_store().unwrap();
    store
        .append(NewAuditEvent::new(EventKind::DocumentMerged).detail("A.pdf, B.pdf -> result.pdf"))
        .unwrap();

    let events = session.audit_events().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::DocumentMerged);
}

#[test]
fn test_insert_pages_in_the_middle() {
    let session = Session::in_memory();
    let mut dest = PdfDocument::from_bytes(&session, "dest", &pdf_bytes("D", 3)).unwrap();
    let source = PdfDocument::from_bytes(&session, "src", &pdf_bytes("S", 3)).unwrap();
    assert_eq!(session.open_documents(), 2);

    dest.insert_pages(&source, &[3, 1], 2).unwrap();

    let bytes = dest.serialize(CompressionLevel::None).unwrap();
    assert_eq!(page_labels(&bytes), ["D1", "S3", "S1", "D2", "D3"]);

    drop(source);
    drop(dest);
    assert_eq!(session.open_documents(), 0);
}

#[test]
fn test_insert_pages_rejects_bad_destination() {
    let session = Session::in_memory();
    let mut dest = PdfDocument::from_bytes(&session, "dest", &pdf_bytes("D", 2)).unwrap();
    let source = PdfDocument::from_bytes(&session, "src", &pdf_bytes("S", 1)).unwrap();

    let err = dest.insert_pages(&source, &[1], 4).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::InvalidDestination {
            dest_index: 4,
            page_count: 2
        }
    ));
    assert_eq!(dest.page_count(), 2);
}

#[tokio::test]
async fn test_disposed_session_refuses_merge() {
    let session = Session::in_memory();
    session.dispose();

    let order = vec![
        DocumentRef::bytes("a.pdf", pdf_bytes("A", 1)),
        DocumentRef::bytes("b.pdf", pdf_bytes("B", 1)),
    ];
    let err = merge_documents(&session, order, "out").await.unwrap_err();
    assert!(matches!(err, PageTrailError::SessionClosed));
}
