use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use runtime::{DiagnosticLog, SelectionStore};
use structure::{StructureRecord, description_for, normalize_id};

use crate::error::ClientError;

/// Fetches filtered structure text from the proxy endpoint.
pub trait StructureClient {
    fn fetch(&self, id: &str) -> LocalBoxFuture<'static, Result<String, ClientError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Blank identifier; nothing was requested.
    Ignored,
    Loaded { id: String, bytes: usize },
    Failed { id: String, message: String },
    /// A newer selection was made before this response arrived.
    Superseded { id: String },
}

struct ControllerInner<C> {
    client: C,
    store: SelectionStore,
    log: DiagnosticLog,
    latest_request: Cell<u64>,
    selected: RefCell<Option<String>>,
}

/// Turns user selections into fetches and commits results to the store.
///
/// Every selection gets a request number. Only the response to the most
/// recent request may write the store or clear the loading flag, whatever
/// order responses arrive in.
pub struct SelectionController<C> {
    inner: Rc<ControllerInner<C>>,
}

impl<C> Clone for SelectionController<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: StructureClient + 'static> SelectionController<C> {
    pub fn new(client: C, store: SelectionStore, log: DiagnosticLog) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                client,
                store,
                log,
                latest_request: Cell::new(0),
                selected: RefCell::new(None),
            }),
        }
    }

    pub fn store(&self) -> &SelectionStore {
        &self.inner.store
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.inner.log
    }

    /// The most recently selected identifier, normalized.
    pub fn selected(&self) -> Option<String> {
        self.inner.selected.borrow().clone()
    }

    pub fn selected_description(&self) -> Option<&'static str> {
        self.selected().as_deref().and_then(description_for)
    }

    /// Selects `id`: the request is issued and the loading flag raised before
    /// this returns; the future settles the request.
    pub fn select(&self, id: &str) -> LocalBoxFuture<'static, SelectionOutcome> {
        let inner = Rc::clone(&self.inner);
        let request = normalize_id(id).map(|id| {
            let request = inner.latest_request.get() + 1;
            inner.latest_request.set(request);
            *inner.selected.borrow_mut() = Some(id.clone());
            inner.store.set_loading(true);
            inner.log.info(format!("Loading protein: {id}"));
            let fetch = inner.client.fetch(&id);
            (request, id, fetch)
        });

        async move {
            let Some((request, id, fetch)) = request else {
                return SelectionOutcome::Ignored;
            };
            let result = fetch.await;

            if inner.latest_request.get() != request {
                tracing::debug!(%id, "discarding superseded response");
                return SelectionOutcome::Superseded { id };
            }

            let outcome = match result {
                Ok(text) => {
                    let bytes = text.len();
                    inner
                        .log
                        .success(format!("Successfully loaded {id} ({bytes} bytes)"));
                    inner.store.set_current(Some(StructureRecord::new(&id, text)));
                    SelectionOutcome::Loaded { id, bytes }
                }
                Err(err) => {
                    inner.log.error(format!("Failed to load protein: {err}"));
                    SelectionOutcome::Failed {
                        id,
                        message: err.message,
                    }
                }
            };
            inner.store.set_loading(false);
            outcome
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClient, structure_text};
    use futures_util::future::join3;
    use runtime::StoreProvider;

    fn controller() -> (SelectionController<FakeClient>, FakeClient, SelectionStore) {
        let client = FakeClient::new();
        let store = StoreProvider::new().store();
        let ctl = SelectionController::new(client.clone(), store.clone(), DiagnosticLog::new("search"));
        (ctl, client, store)
    }

    #[tokio::test]
    async fn loads_into_store_and_clears_loading() {
        let (ctl, client, store) = controller();

        let pending = ctl.select("1CRN");
        assert!(store.loading());
        assert_eq!(client.requests(), ["1crn"]);

        let outcome = pending.await;
        let text = structure_text("1crn");
        assert_eq!(
            outcome,
            SelectionOutcome::Loaded {
                id: "1crn".into(),
                bytes: text.len()
            }
        );
        assert!(!store.loading());
        let current = store.current().unwrap();
        assert_eq!(current.id, "1crn");
        assert_eq!(current.raw_text, text);
        assert_eq!(ctl.selected_description(), Some("Plant seed protein"));
    }

    #[tokio::test]
    async fn blank_selection_is_ignored() {
        let (ctl, client, store) = controller();
        assert_eq!(ctl.select("  ").await, SelectionOutcome::Ignored);
        assert!(client.requests().is_empty());
        assert!(!store.loading());
        assert!(ctl.log().is_empty());
    }

    #[tokio::test]
    async fn failure_is_logged_and_keeps_previous_record() {
        let (ctl, client, store) = controller();
        ctl.select("1ubq").await;

        client
            .gate("9zzz")
            .send(Err("Failed to fetch protein data: Not Found".into()))
            .unwrap();
        let outcome = ctl.select("9zzz").await;

        assert!(matches!(outcome, SelectionOutcome::Failed { ref id, .. } if id == "9zzz"));
        assert!(!store.loading());
        assert_eq!(store.current().map(|r| r.id.clone()), Some("1ubq".to_string()));
        assert_eq!(
            ctl.log().last().map(|e| e.message),
            Some("Failed to load protein: Failed to fetch protein data: Not Found".to_string())
        );
    }

    #[tokio::test]
    async fn later_selection_wins_when_earlier_response_is_slower() {
        let (ctl, client, store) = controller();
        let slow = client.gate("1ubq");
        let fast = client.gate("4hhb");

        let first = ctl.select("1ubq");
        let second = ctl.select("4hhb");
        let release = async move {
            fast.send(Ok(structure_text("4hhb"))).unwrap();
            slow.send(Ok(structure_text("1ubq"))).unwrap();
        };
        let (a, b, ()) = join3(first, second, release).await;

        assert_eq!(a, SelectionOutcome::Superseded { id: "1ubq".into() });
        assert!(matches!(b, SelectionOutcome::Loaded { ref id, .. } if id == "4hhb"));
        assert_eq!(store.current().map(|r| r.id.clone()), Some("4hhb".to_string()));
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn later_selection_wins_when_earlier_response_settles_last() {
        let (ctl, client, store) = controller();
        let slow = client.gate("1ubq");

        let first = ctl.select("1ubq");
        let second = ctl.select("4hhb");

        assert!(matches!(second.await, SelectionOutcome::Loaded { .. }));
        assert!(!store.loading());

        slow.send(Ok(structure_text("1ubq"))).unwrap();
        assert_eq!(first.await, SelectionOutcome::Superseded { id: "1ubq".into() });
        assert_eq!(store.current().map(|r| r.id.clone()), Some("4hhb".to_string()));
        assert_eq!(ctl.selected().as_deref(), Some("4hhb"));
    }

    #[tokio::test]
    async fn repointed_client_keeps_selection_order() {
        let (ctl, client, store) = controller();
        let slow = client.gate("1ubq");

        let first = ctl.select("1ubq");
        client.set_origin("https://proxy.test/");
        let second = ctl.select("4hhb");

        assert!(matches!(second.await, SelectionOutcome::Loaded { .. }));
        slow.send(Ok(structure_text("1ubq"))).unwrap();
        assert_eq!(first.await, SelectionOutcome::Superseded { id: "1ubq".into() });
        assert_eq!(client.requests(), ["1ubq", "https://proxy.test/4hhb"]);
        assert_eq!(store.current().map(|r| r.id.clone()), Some("4hhb".to_string()));
    }

    #[tokio::test]
    async fn loading_stays_raised_until_latest_settles() {
        let (ctl, client, store) = controller();
        let latest = client.gate("4hhb");

        let first = ctl.select("1ubq");
        let second = ctl.select("4hhb");

        assert_eq!(first.await, SelectionOutcome::Superseded { id: "1ubq".into() });
        assert!(store.loading());

        latest.send(Ok(structure_text("4hhb"))).unwrap();
        second.await;
        assert!(!store.loading());
    }
}
