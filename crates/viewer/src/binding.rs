use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use runtime::{SelectionStore, StoreChange, SubscriptionId};
use structure::StructureRecord;

use crate::engine::EngineFactory;
use crate::loader::ScriptLoader;
use crate::orchestrator::Viewer;

/// Rebuilds `viewer` whenever the store receives a new structure.
///
/// A record already in the store is shown straight away. Build sequences are
/// handed to `spawn`; the viewer itself logs their failures. Drop the binding
/// with [`SelectionStore::unsubscribe`].
pub fn bind_viewer<F, L, S>(store: &SelectionStore, viewer: &Viewer<F, L>, spawn: S) -> SubscriptionId
where
    F: EngineFactory + 'static,
    L: ScriptLoader + 'static,
    S: Fn(LocalBoxFuture<'static, ()>) + 'static,
{
    if let Some(record) = store.current() {
        spawn(start_build(viewer, record));
    }

    let viewer = viewer.clone();
    store.subscribe(move |change| {
        if let StoreChange::Current(Some(record)) = change {
            spawn(start_build(&viewer, Rc::clone(record)));
        }
    })
}

fn start_build<F, L>(viewer: &Viewer<F, L>, record: Rc<StructureRecord>) -> LocalBoxFuture<'static, ()>
where
    F: EngineFactory + 'static,
    L: ScriptLoader + 'static,
{
    let build = viewer.show(record);
    async move {
        match build.await {
            Ok(outcome) => tracing::debug!(?outcome, "build settled"),
            Err(err) => tracing::debug!(%err, "build failed"),
        }
    }
    .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use runtime::{DiagnosticLog, StoreProvider};

    use crate::config::ViewerConfig;
    use crate::selection::{SelectionController, SelectionOutcome};
    use crate::testing::{FakeClient, FakeFactory, FakeLoader, structure_text};

    type Queue = Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>;

    struct Page {
        store: SelectionStore,
        client: FakeClient,
        factory: FakeFactory,
        viewer: Viewer<FakeFactory, FakeLoader>,
        controller: SelectionController<FakeClient>,
        queue: Queue,
        binding: SubscriptionId,
    }

    impl Page {
        fn new(provider: &StoreProvider) -> Self {
            let store = provider.store();
            let client = FakeClient::new();
            let factory = FakeFactory::new();
            let viewer = Viewer::new(
                factory.clone(),
                FakeLoader::new(),
                ViewerConfig::default(),
                DiagnosticLog::new("viewer"),
            );
            let controller =
                SelectionController::new(client.clone(), store.clone(), DiagnosticLog::new("search"));
            let queue: Queue = Rc::default();
            let sink = Rc::clone(&queue);
            let binding = bind_viewer(&store, &viewer, move |fut| sink.borrow_mut().push(fut));
            Self {
                store,
                client,
                factory,
                viewer,
                controller,
                queue,
                binding,
            }
        }

        async fn drain(&self) {
            let pending: Vec<_> = self.queue.borrow_mut().drain(..).collect();
            for fut in pending {
                fut.await;
            }
        }
    }

    #[tokio::test]
    async fn selection_flows_through_to_render() {
        let provider = StoreProvider::new();
        let page = Page::new(&provider);

        page.controller.select("1crn").await;
        page.drain().await;

        assert_eq!(page.viewer.session_id().as_deref(), Some("1CRN"));
        assert_eq!(page.factory.created(), 1);
    }

    #[tokio::test]
    async fn rapid_reselection_displays_the_latest() {
        let provider = StoreProvider::new();
        let page = Page::new(&provider);
        let slow = page.client.gate("1ubq");

        let first = page.controller.select("1ubq");
        let second = page.controller.select("4hhb");
        assert!(matches!(second.await, SelectionOutcome::Loaded { .. }));

        slow.send(Ok(structure_text("1ubq"))).unwrap();
        assert!(matches!(first.await, SelectionOutcome::Superseded { .. }));
        page.drain().await;

        assert_eq!(page.viewer.session_id().as_deref(), Some("4HHB"));
        assert_eq!(page.factory.created(), 1);
    }

    #[tokio::test]
    async fn back_to_back_records_render_only_the_last() {
        let provider = StoreProvider::new();
        let page = Page::new(&provider);

        page.store
            .set_current(Some(StructureRecord::new("1ubq", structure_text("1ubq"))));
        page.store
            .set_current(Some(StructureRecord::new("4hhb", structure_text("4hhb"))));
        assert_eq!(page.queue.borrow().len(), 2);
        page.drain().await;

        assert_eq!(page.viewer.session_id().as_deref(), Some("4HHB"));
        assert_eq!(page.factory.created(), 1);
    }

    #[tokio::test]
    async fn existing_record_is_shown_on_bind() {
        let provider = StoreProvider::new();
        provider
            .store()
            .set_current(Some(StructureRecord::new("2lyz", structure_text("2lyz"))));

        let page = Page::new(&provider);
        page.drain().await;

        assert_eq!(page.viewer.session_id().as_deref(), Some("2LYZ"));
    }

    #[tokio::test]
    async fn unbound_viewer_ignores_new_records() {
        let provider = StoreProvider::new();
        let page = Page::new(&provider);

        assert!(page.store.unsubscribe(page.binding));
        page.controller.select("1crn").await;

        assert!(page.queue.borrow().is_empty());
        assert!(!page.viewer.has_session());
    }

    #[tokio::test]
    async fn cleared_store_keeps_current_scene() {
        let provider = StoreProvider::new();
        let page = Page::new(&provider);
        page.controller.select("1crn").await;
        page.drain().await;

        page.store.set_current(None);

        assert!(page.queue.borrow().is_empty());
        assert!(page.viewer.has_session());
    }
}
