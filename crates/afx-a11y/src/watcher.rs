//! Mutation Watcher
//!
//! Re-scans a document whenever it changes. The DOM observer only forwards
//! a wake-up over a channel; a task on the caller's `LocalExecutor` waits
//! for a quiet window (every mutation restarts the timer) and then runs a
//! single scan.

use crate::scanner::{ScanOptions, ScanRoot, Scanner};
use crate::{Finding, WatchError};
use afx_dom::{DisconnectQueue, Document, DomTree, MutationObserverInit, MutationRecord, NodeId, ObserverId};
use smol::{LocalExecutor, Task, Timer};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

/// Document shared between the page and its watchers
pub type SharedDocument = Rc<RefCell<Document>>;

/// Quiet window before a re-scan
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches documents and re-scans them after mutations
pub struct MutationWatcher {
    scanner: Arc<Scanner>,
    debounce: Duration,
}

enum Wake {
    Mutation,
    Quiet,
    Closed,
}

impl MutationWatcher {
    pub fn new(scanner: Arc<Scanner>) -> Self {
        Self {
            scanner,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Scan now, then re-scan after every burst of mutations.
    ///
    /// The first result is delivered to `callback` before this returns.
    /// Later results are delivered from a task spawned on `executor`, which
    /// must be driven by the caller. Dropping or unsubscribing the returned
    /// handle stops all further callbacks.
    pub fn observe_and_scan<F>(
        &self,
        executor: &LocalExecutor<'_>,
        document: SharedDocument,
        options: ScanOptions,
        mut callback: F,
    ) -> Result<Subscription, WatchError>
    where
        F: FnMut(Vec<Finding>) + 'static,
    {
        let (target, initial) = {
            let doc = document.try_borrow().map_err(|_| WatchError::DocumentBusy)?;
            let target = observe_target(doc.tree(), options.root)?;
            (target, self.scanner.scan(&doc, &options))
        };
        callback(initial);

        // One slot: a burst of mutations coalesces into a single wake-up
        let (tx, rx) = smol::channel::bounded::<()>(1);
        let (observer, disconnects) = {
            let mut doc = document.try_borrow_mut().map_err(|_| WatchError::DocumentBusy)?;
            let tree = doc.tree_mut();
            let observer = tree.observe(
                target,
                MutationObserverInit::structure_and_attributes(),
                Box::new(move |record: &MutationRecord| {
                    tracing::trace!(node = %record.target, kind = ?record.mutation_type, "mutation");
                    let _ = tx.try_send(());
                }),
            );
            (observer, tree.disconnect_queue())
        };
        tracing::debug!(node = %target, debounce = ?self.debounce, "watching for mutations");

        let scanner = Arc::clone(&self.scanner);
        let weak = Rc::downgrade(&document);
        let debounce = self.debounce;
        let task = executor.spawn(async move {
            while rx.recv().await.is_ok() {
                loop {
                    let wake = smol::future::or(
                        async {
                            match rx.recv().await {
                                Ok(()) => Wake::Mutation,
                                Err(_) => Wake::Closed,
                            }
                        },
                        async {
                            Timer::after(debounce).await;
                            Wake::Quiet
                        },
                    )
                    .await;
                    match wake {
                        Wake::Mutation => continue,
                        Wake::Closed => return,
                        Wake::Quiet => {}
                    }

                    let Some(document) = weak.upgrade() else {
                        return;
                    };
                    let findings = match document.try_borrow() {
                        Ok(doc) => scanner.scan(&doc, &options),
                        Err(_) => {
                            tracing::trace!("document busy, rescan postponed");
                            continue;
                        }
                    };
                    callback(findings);
                    break;
                }
            }
        });

        Ok(Subscription {
            document: Rc::downgrade(&document),
            observer: Some(observer),
            disconnects,
            task: Some(task),
        })
    }
}

impl fmt::Debug for MutationWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationWatcher").field("debounce", &self.debounce).finish()
    }
}

/// Node the observer is attached to
fn observe_target(tree: &DomTree, root: ScanRoot) -> Result<NodeId, WatchError> {
    match root {
        ScanRoot::Document => Ok(tree.body_of(NodeId::ROOT).unwrap_or(NodeId::ROOT)),
        ScanRoot::Node(id) => match tree.get(id) {
            Some(node) if node.is_element() || node.is_tree_root() => Ok(id),
            _ => Err(WatchError::InvalidRoot(id)),
        },
    }
}

/// Live watch; dropping it stops the watch
pub struct Subscription {
    document: Weak<RefCell<Document>>,
    observer: Option<ObserverId>,
    disconnects: DisconnectQueue,
    task: Option<Task<()>>,
}

impl Subscription {
    /// Stop watching. No callback runs after this returns.
    pub fn unsubscribe(mut self) {
        self.shutdown();
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    fn shutdown(&mut self) {
        // Dropping the task cancels any pending re-scan
        drop(self.task.take());
        let Some(observer) = self.observer.take() else {
            return;
        };
        let Some(document) = self.document.upgrade() else {
            return;
        };
        match document.try_borrow_mut() {
            Ok(mut doc) => {
                doc.tree_mut().disconnect(observer);
            }
            Err(_) => {
                tracing::trace!("document busy, observer disconnect queued");
                self.disconnects.push(observer);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_target() {
        let mut doc = Document::new("about:blank");
        let body = doc.body().unwrap();
        let text = doc.tree_mut().create_text("hi");
        doc.tree_mut().append_child(body, text).unwrap();

        assert_eq!(observe_target(doc.tree(), ScanRoot::Document).unwrap(), body);
        assert_eq!(observe_target(doc.tree(), ScanRoot::Node(body)).unwrap(), body);
        assert!(matches!(
            observe_target(doc.tree(), ScanRoot::Node(text)),
            Err(WatchError::InvalidRoot(_))
        ));
        assert_eq!(
            observe_target(Document::empty("about:blank").tree(), ScanRoot::Document).unwrap(),
            NodeId::ROOT
        );
    }

    #[test]
    fn test_busy_document_is_rejected() {
        let ex = LocalExecutor::new();
        let watcher = MutationWatcher::new(Arc::new(Scanner::new()));
        let doc: SharedDocument = Rc::new(RefCell::new(Document::new("about:blank")));

        let guard = doc.borrow_mut();
        let result = watcher.observe_and_scan(&ex, doc.clone(), ScanOptions::default(), |_| {});
        assert!(matches!(result, Err(WatchError::DocumentBusy)));
        drop(guard);
    }

    #[test]
    fn test_unsubscribe_while_busy_still_disconnects() {
        let ex = LocalExecutor::new();
        let watcher = MutationWatcher::new(Arc::new(Scanner::new()));
        let doc: SharedDocument = Rc::new(RefCell::new(Document::new("about:blank")));

        for _ in 0..3 {
            let sub = watcher
                .observe_and_scan(&ex, doc.clone(), ScanOptions::default(), |_| {})
                .unwrap();
            let guard = doc.borrow_mut();
            sub.unsubscribe();
            drop(guard);
            assert_eq!(doc.borrow().tree().observer_count(), 0);
        }

        // The next mutation drops the queued registrations for good
        let mut page = doc.borrow_mut();
        let body = page.body().unwrap();
        let div = page.tree_mut().create_element("div");
        page.tree_mut().append_child(body, div).unwrap();
        assert_eq!(page.tree().observer_count(), 0);
        assert!(page.tree().disconnect_queue().is_empty());
    }
}
