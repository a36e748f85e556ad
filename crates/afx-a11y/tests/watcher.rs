//! Mutation watcher integration tests
//!
//! Drive a `LocalExecutor` with real timers.

use afx_a11y::{Finding, MutationWatcher, ScanOptions, Scanner, SharedDocument, Subscription};
use afx_dom::NodeId;
use afx_html::HtmlParser;
use smol::{LocalExecutor, Timer};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(50);
const SETTLE: Duration = Duration::from_millis(300);

type Calls = Rc<RefCell<Vec<Vec<Finding>>>>;

fn shared(html: &str) -> SharedDocument {
    Rc::new(RefCell::new(HtmlParser::new().parse(html)))
}

fn watch(ex: &LocalExecutor<'_>, doc: &SharedDocument) -> (Subscription, Calls) {
    let scanner = Arc::new(Scanner::with_built_in_rules().unwrap());
    let watcher = MutationWatcher::new(scanner).with_debounce(DEBOUNCE);
    let calls: Calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let options = ScanOptions::new().with_rules(["input-label"]);
    let subscription = watcher
        .observe_and_scan(ex, Rc::clone(doc), options, move |findings| sink.borrow_mut().push(findings))
        .unwrap();
    (subscription, calls)
}

fn add_input(doc: &SharedDocument) -> NodeId {
    let mut doc = doc.borrow_mut();
    let body = doc.body().unwrap();
    let tree = doc.tree_mut();
    let input = tree.create_element("input");
    tree.append_child(body, input).unwrap();
    input
}

fn settle(ex: &LocalExecutor<'_>) {
    smol::block_on(ex.run(Timer::after(SETTLE)));
}

#[test]
fn test_initial_scan_is_synchronous() {
    let ex = LocalExecutor::new();
    let doc = shared("<input id='a'>");
    let (_subscription, calls) = watch(&ex, &doc);

    // Delivered before the executor ever ran
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(calls.borrow()[0].len(), 1);
}

#[test]
fn test_burst_of_mutations_yields_one_rescan() {
    let ex = LocalExecutor::new();
    let doc = shared("<p>start</p>");
    let (_subscription, calls) = watch(&ex, &doc);
    assert!(calls.borrow()[0].is_empty());

    for _ in 0..10 {
        add_input(&doc);
    }
    settle(&ex);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].len(), 10);
}

#[test]
fn test_separate_bursts_rescan_separately() {
    let ex = LocalExecutor::new();
    let doc = shared("<p>start</p>");
    let (_subscription, calls) = watch(&ex, &doc);

    add_input(&doc);
    settle(&ex);
    let input = add_input(&doc);
    doc.borrow_mut().tree_mut().set_attribute(input, "aria-label", "Name").unwrap();
    settle(&ex);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].len(), 1);
    assert_eq!(calls[2].len(), 1);
}

#[test]
fn test_attribute_change_triggers_rescan() {
    let ex = LocalExecutor::new();
    let doc = shared("<input id='name'>");
    let (_subscription, calls) = watch(&ex, &doc);
    let input = doc.borrow().get_element_by_id("name").unwrap();

    doc.borrow_mut().tree_mut().set_attribute(input, "aria-label", "Name").unwrap();
    settle(&ex);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].is_empty());
}

#[test]
fn test_no_callback_after_unsubscribe() {
    let ex = LocalExecutor::new();
    let doc = shared("<p>start</p>");
    let (subscription, calls) = watch(&ex, &doc);
    assert_eq!(doc.borrow().tree().observer_count(), 1);

    // A re-scan is pending when the subscription ends
    add_input(&doc);
    smol::block_on(ex.run(Timer::after(DEBOUNCE / 5)));
    assert!(subscription.is_active());
    subscription.unsubscribe();

    add_input(&doc);
    settle(&ex);
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(doc.borrow().tree().observer_count(), 0);
}

#[test]
fn test_dropping_subscription_stops_watching() {
    let ex = LocalExecutor::new();
    let doc = shared("<p>start</p>");
    let (subscription, calls) = watch(&ex, &doc);
    drop(subscription);

    add_input(&doc);
    settle(&ex);
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(doc.borrow().tree().observer_count(), 0);
}

#[test]
fn test_busy_document_postpones_rescan() {
    let ex = LocalExecutor::new();
    let doc = shared("<p>start</p>");
    let (_subscription, calls) = watch(&ex, &doc);

    add_input(&doc);
    {
        let _held = doc.borrow_mut();
        smol::block_on(ex.run(Timer::after(SETTLE)));
    }
    assert_eq!(calls.borrow().len(), 1);

    settle(&ex);
    assert_eq!(calls.borrow().len(), 2);
}
