#![no_main]

use libfuzzer_sys::fuzz_target;
use pagetrail::io::DocumentRef;
use pagetrail::merge::merge_documents;
use pagetrail::session::Session;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Builder::new_current_thread().enable_all().build().unwrap())
}

// Arbitrary bytes as both inputs. Failures name one of the two inputs and
// never leave a document loaded.
fuzz_target!(|data: &[u8]| {
    let session = Session::in_memory();
    let order = vec![
        DocumentRef::bytes("fuzz-a.pdf", data.to_vec()),
        DocumentRef::bytes("fuzz-b.pdf", data.to_vec()),
    ];

    if let Err(err) = runtime().block_on(merge_documents(&session, order, "fuzz"))
        && let Some(index) = err.failing_index()
    {
        assert!(index == 1 || index == 2);
    }
    assert_eq!(session.open_documents(), 0);
});
