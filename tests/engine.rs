//! Library-level tests for the context engine.
//!
//! These drive [`ContextEngine`] through a corpus wrapper that counts how
//! often documents are resolved and how many rows are read, so truncation
//! can be checked for skipped work and not just for output length.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use rowctx::corpus::{DocumentCorpus, InMemoryCorpus};
use rowctx::engine::ContextEngine;
use rowctx::error::{ContextError, ContextResult};
use rowctx::history::HistoryStore;
use rowctx::models::{Document, Row, SummaryEntry};
use rowctx::request::{ContextRequestSpec, ExcludedRows};

// ─── Counting corpus ────────────────────────────────────────────────

#[derive(Default)]
struct CountingCorpus {
    inner: InMemoryCorpus,
    resolves: Mutex<Vec<String>>,
    rows_calls: Mutex<HashMap<String, usize>>,
    rows_read: Arc<AtomicUsize>,
}

impl CountingCorpus {
    fn new(docs: Vec<Document>) -> Self {
        Self {
            inner: docs.into_iter().collect(),
            ..Default::default()
        }
    }

    fn rows_calls(&self, handle: &str) -> usize {
        self.rows_calls
            .lock()
            .unwrap()
            .get(handle)
            .copied()
            .unwrap_or(0)
    }
}

impl DocumentCorpus for CountingCorpus {
    fn resolve(&self, handle: &str) -> ContextResult<Arc<Document>> {
        self.resolves.lock().unwrap().push(handle.to_string());
        self.inner.resolve(handle)
    }

    fn rows<'a>(
        &'a self,
        document: &'a Document,
        source_column: &str,
        translation_column: &str,
    ) -> Box<dyn Iterator<Item = Row> + 'a> {
        *self
            .rows_calls
            .lock()
            .unwrap()
            .entry(document.handle.clone())
            .or_default() += 1;
        let counter = Arc::clone(&self.rows_read);
        Box::new(
            document
                .rows(source_column, translation_column)
                .inspect(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        )
    }
}

fn doc(handle: &str, n: usize) -> Document {
    let owned: Vec<(String, String)> = (0..n)
        .map(|i| (format!("{}-src-{}", handle, i), format!("{}-tr-{}", handle, i)))
        .collect();
    let pairs: Vec<(&str, &str)> = owned.iter().map(|(s, t)| (s.as_str(), t.as_str())).collect();
    Document::from_pairs(handle, "src", "tr", &pairs)
}

fn spec(docs: &[&str], chunk_size: usize, max_chunks: usize) -> ContextRequestSpec {
    ContextRequestSpec::new(docs.iter().copied(), "src", "tr")
        .with_chunk_size(chunk_size)
        .with_max_chunks(max_chunks)
}

// ─── Selection ──────────────────────────────────────────────────────

#[test]
fn test_scenario_filtered_document() {
    let corpus = InMemoryCorpus::new();
    corpus.insert(Document::from_pairs(
        "D",
        "src",
        "tr",
        &[("a", "A"), ("b", ""), ("c", "C"), ("d", "D"), ("e", "E")],
    ));
    let engine = ContextEngine::new(corpus);

    let full = engine
        .get_context_for_translation(&spec(&["D"], 2, 10))
        .unwrap();
    assert_eq!(full.chunks.len(), 2);
    assert_eq!(full.total_pairs, 4);

    let one = engine
        .get_context_for_translation(&spec(&["D"], 2, 1))
        .unwrap();
    assert_eq!(one.chunks.len(), 1);
    assert_eq!(one.total_pairs, 2);
    assert_eq!(one.chunks[0], full.chunks[0]);
}

#[test]
fn test_truncation_skips_later_documents() {
    let engine = ContextEngine::new(CountingCorpus::new(vec![
        doc("first", 10),
        doc("second", 10),
        doc("third", 10),
    ]));

    let bundle = engine
        .get_context_for_summary(&spec(&["first", "second", "third"], 3, 2))
        .unwrap();

    assert_eq!(bundle.chunks.len(), 2);
    assert!(bundle.chunks.iter().all(|c| c.document == "first"));
    assert_eq!(bundle.total_pairs, 6);

    let corpus = engine.corpus();
    assert_eq!(corpus.rows_calls("first"), 1);
    assert_eq!(corpus.rows_calls("second"), 0);
    assert_eq!(corpus.rows_calls("third"), 0);
    assert_eq!(corpus.rows_read.load(Ordering::SeqCst), 6);
}

#[test]
fn test_truncation_mid_second_document() {
    let engine = ContextEngine::new(CountingCorpus::new(vec![
        doc("first", 4),
        doc("second", 10),
    ]));

    let bundle = engine
        .get_context_for_translation(&spec(&["first", "second"], 2, 3))
        .unwrap();

    let order: Vec<(&str, usize)> = bundle
        .chunks
        .iter()
        .map(|c| (c.document.as_str(), c.start_index))
        .collect();
    assert_eq!(order, vec![("first", 0), ("first", 2), ("second", 0)]);
    assert!(bundle.chunks.len() <= 3);
    assert_eq!(engine.corpus().rows_read.load(Ordering::SeqCst), 4 + 2);
}

#[test]
fn test_unknown_document_stops_in_listed_order() {
    let engine = ContextEngine::new(CountingCorpus::new(vec![doc("a", 3), doc("c", 3)]));

    let err = engine
        .get_context_for_translation(&spec(&["a", "missing", "c"], 2, 5))
        .unwrap_err();
    assert_eq!(err, ContextError::UnknownDocument("missing".into()));

    let corpus = engine.corpus();
    assert_eq!(*corpus.resolves.lock().unwrap(), vec!["a", "missing"]);
    assert_eq!(corpus.rows_read.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalid_configuration_touches_nothing() {
    let engine = ContextEngine::new(CountingCorpus::new(vec![doc("a", 3)]));
    for bad in [spec(&["a"], 0, 5), spec(&["a"], 2, 0)] {
        assert!(matches!(
            engine.get_context_for_translation(&bad),
            Err(ContextError::InvalidConfiguration(_))
        ));
    }
    assert!(engine.corpus().resolves.lock().unwrap().is_empty());
}

#[test]
fn test_chunk_size_beyond_document_length() {
    let engine = ContextEngine::new(InMemoryCorpus::from_iter([doc("a", 2)]));
    let bundle = engine
        .get_context_for_translation(&spec(&["a"], usize::MAX, 1))
        .unwrap();
    assert_eq!(bundle.chunks.len(), 1);
    assert_eq!(bundle.total_pairs, 2);
}

#[test]
fn test_current_chunk_excluded_from_its_own_context() {
    let engine = ContextEngine::new(CountingCorpus::new(vec![doc("a", 6), doc("b", 2)]));
    let s = spec(&["a", "b"], 2, 10).with_excluded_rows(ExcludedRows::new(2, 3).in_document("a"));

    let bundle = engine.get_context_for_translation(&s).unwrap();
    let rows: Vec<(&str, Vec<usize>)> = bundle
        .chunks
        .iter()
        .map(|c| (c.document.as_str(), c.source_rows.clone()))
        .collect();
    assert_eq!(
        rows,
        vec![("a", vec![0, 1]), ("a", vec![4, 5]), ("b", vec![0, 1])]
    );
    assert!(bundle
        .chunks
        .iter()
        .flat_map(|c| &c.pairs)
        .all(|p| p.source != "a-src-2" && p.source != "a-src-3"));
}

#[test]
fn test_empty_document_list_is_empty_bundle() {
    let engine = ContextEngine::new(InMemoryCorpus::new());
    let bundle = engine.get_context_for_summary(&spec(&[], 5, 5)).unwrap();
    assert!(bundle.chunks.is_empty());
    assert_eq!(bundle.total_pairs, 0);
}

#[test]
fn test_selection_is_idempotent() {
    let engine = ContextEngine::new(InMemoryCorpus::from_iter([doc("a", 7), doc("b", 5)]));
    let s = spec(&["b", "a"], 3, 4);
    let first = engine.get_context_for_translation(&s).unwrap();
    let second = engine.get_context_for_translation(&s).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_bundle_invariants_hold() {
    let engine = ContextEngine::new(InMemoryCorpus::from_iter([doc("a", 11), doc("b", 7)]));
    for chunk_size in 1..6 {
        for max_chunks in 1..8 {
            let bundle = engine
                .get_context_for_translation(&spec(&["a", "b"], chunk_size, max_chunks))
                .unwrap();
            assert!(bundle.chunks.len() <= max_chunks);
            let total: usize = bundle.chunks.iter().map(|c| c.pairs.len()).sum();
            assert_eq!(bundle.total_pairs, total);
            for c in &bundle.chunks {
                assert!(!c.pairs.is_empty() && c.pairs.len() <= chunk_size);
                assert_eq!(c.end_index - c.start_index + 1, c.pairs.len());
            }
        }
    }
}

// ─── History ────────────────────────────────────────────────────────

fn entry_at(id: &str, secs: i64) -> SummaryEntry {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut e = SummaryEntry::new("model", format!("summary {}", id), 100)
        .with_created_at(base + Duration::seconds(secs));
    e.id = id.to_string();
    e
}

#[test]
fn test_history_keeps_latest_three() {
    let engine = ContextEngine::new(InMemoryCorpus::new());
    for (i, id) in ["1", "2", "3", "4"].iter().enumerate() {
        engine.record_summary(entry_at(id, i as i64)).unwrap();
    }
    let ids: Vec<String> = engine.history().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["2", "3", "4"]);
}

#[test]
fn test_history_records_spec() {
    let engine = ContextEngine::new(InMemoryCorpus::new());
    let s = spec(&["a"], 10, 2);
    engine
        .record_summary(SummaryEntry::new("m", "text", 5).with_context_spec(s.clone()))
        .unwrap();
    assert_eq!(engine.history()[0].source_context_spec, Some(s));
}

#[test]
fn test_concurrent_appends_stay_bounded() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let store = Arc::new(HistoryStore::new());
    let evictions = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            let evictions = Arc::clone(&evictions);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let secs = (t * PER_THREAD + i) as i64;
                    if store.append(entry_at(&format!("{}-{}", t, i), secs)).unwrap().is_some() {
                        evictions.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..500 {
                assert!(store.list().len() <= 3);
            }
        })
    };

    barrier.wait();
    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(evictions.load(Ordering::SeqCst), THREADS * PER_THREAD - 3);
}

#[test]
fn test_hydrated_engine() {
    let store = HistoryStore::new();
    store
        .restore(vec![entry_at("a", 1), entry_at("b", 2)])
        .unwrap();
    let engine = ContextEngine::with_history(InMemoryCorpus::new(), store);
    let evicted = engine.record_summary(entry_at("c", 3)).unwrap();
    assert!(evicted.is_none());
    let evicted = engine.record_summary(entry_at("d", 4)).unwrap();
    assert_eq!(evicted.map(|e| e.id), Some("a".to_string()));
}
