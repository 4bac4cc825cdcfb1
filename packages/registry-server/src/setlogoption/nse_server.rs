use async_trait::async_trait;
use registry_core::{
    ExecutionContext, NetworkServiceEndpoint, NetworkServiceEndpointQuery, RegistryError,
};

use super::{ContextOverride, SetLogOption};
use crate::registry::{FindServer, NetworkServiceEndpointRegistryServer};

#[async_trait]
impl<S> NetworkServiceEndpointRegistryServer for SetLogOption<S>
where
    S: NetworkServiceEndpointRegistryServer,
{
    async fn register(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<NetworkServiceEndpoint, RegistryError> {
        let ctx = self.with_fields(&ctx);
        self.next.register(ctx, endpoint).await
    }

    async fn find(
        &self,
        query: NetworkServiceEndpointQuery,
        server: &dyn FindServer<NetworkServiceEndpoint>,
    ) -> Result<(), RegistryError> {
        let ctx = self.with_fields(server.context());
        let server = ContextOverride::new(server, ctx);
        self.next.find(query, &server).await
    }

    async fn unregister(
        &self,
        ctx: ExecutionContext,
        endpoint: NetworkServiceEndpoint,
    ) -> Result<(), RegistryError> {
        let ctx = self.with_fields(&ctx);
        self.next.unregister(ctx, endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use proptest::prelude::*;
    use registry_core::{ContextError, LogFields};

    use super::*;
    use crate::memory::MemoryRegistry;
    use crate::registry::ChannelFindServer;
    use crate::setlogoption::testing::Recorder;

    fn node_options() -> HashMap<String, String> {
        HashMap::from([("nodeID".to_string(), "n1".to_string())])
    }

    async fn drain(mut rx: tokio::sync::mpsc::Receiver<NetworkServiceEndpoint>) -> Vec<String> {
        let mut names = Vec::new();
        while let Some(nse) = rx.recv().await {
            names.push(nse.name);
        }
        names
    }

    #[tokio::test]
    async fn register_attaches_node_id() {
        let recorder = Recorder::new();
        let svc = SetLogOption::new(node_options(), recorder.clone());

        let resp = svc
            .register(
                ExecutionContext::background(),
                NetworkServiceEndpoint::named("nse-1"),
            )
            .await
            .unwrap();

        assert_eq!(resp.name, "nse-1");
        assert_eq!(resp.url, "tcp://registered:5002");
        assert_eq!(recorder.last_context().field("nodeID"), Some("n1"));
    }

    #[tokio::test]
    async fn unregister_attaches_fields() {
        let recorder = Recorder::new();
        let options: LogFields = [("nodeID", "n1"), ("cluster", "c1")].into_iter().collect();
        let svc = SetLogOption::new(options, recorder.clone());

        svc.unregister(
            ExecutionContext::background(),
            NetworkServiceEndpoint::named("nse-1"),
        )
        .await
        .unwrap();

        let seen = recorder.last_context();
        assert_eq!(seen.field("nodeID"), Some("n1"));
        assert_eq!(seen.field("cluster"), Some("c1"));
    }

    #[tokio::test]
    async fn errors_pass_through_unchanged() {
        let svc = SetLogOption::new(node_options(), Recorder::failing());
        let ctx = ExecutionContext::background();

        let err = svc
            .register(ctx.clone(), NetworkServiceEndpoint::named("nse-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { name } if name == "nse-1"));

        let err = svc
            .unregister(ctx.clone(), NetworkServiceEndpoint::named("nse-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { name } if name == "nse-2"));

        let (server, _rx) = ChannelFindServer::new(ctx, 1);
        let err = svc
            .find(NetworkServiceEndpointQuery::default(), &server)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { name } if name == "find"));
    }

    #[tokio::test]
    async fn empty_options_pass_the_same_context() {
        let recorder = Recorder::new();
        let svc = SetLogOption::new(LogFields::new(), recorder.clone());
        let ctx = ExecutionContext::background();

        svc.register(ctx.clone(), NetworkServiceEndpoint::named("nse-1"))
            .await
            .unwrap();
        assert!(ExecutionContext::ptr_eq(&recorder.last_context(), &ctx));

        svc.unregister(ctx.clone(), NetworkServiceEndpoint::named("nse-1"))
            .await
            .unwrap();
        assert!(ExecutionContext::ptr_eq(&recorder.last_context(), &ctx));

        let (server, _rx) = ChannelFindServer::new(ctx.clone(), 1);
        svc.find(NetworkServiceEndpointQuery::default(), &server)
            .await
            .unwrap();
        assert!(ExecutionContext::ptr_eq(&recorder.last_context(), &ctx));
    }

    #[tokio::test]
    async fn each_call_gets_its_own_derived_context() {
        let recorder = Recorder::new();
        let svc = SetLogOption::new(node_options(), recorder.clone());
        let ctx = ExecutionContext::background();

        svc.register(ctx.clone(), NetworkServiceEndpoint::named("a"))
            .await
            .unwrap();
        svc.register(ctx, NetworkServiceEndpoint::named("b"))
            .await
            .unwrap();

        let contexts = recorder.contexts.lock();
        assert!(!ExecutionContext::ptr_eq(&contexts[0], &contexts[1]));
    }

    #[tokio::test]
    async fn existing_attachments_are_kept() {
        let recorder = Recorder::new();
        let svc = SetLogOption::new(node_options(), recorder.clone());
        let upstream: LogFields = [("requestID", "r-7")].into_iter().collect();
        let ctx = ExecutionContext::background().with_fields(&upstream);

        svc.register(ctx, NetworkServiceEndpoint::named("nse-1"))
            .await
            .unwrap();

        let seen = recorder.last_context();
        assert_eq!(seen.field("requestID"), Some("r-7"));
        assert_eq!(seen.field("nodeID"), Some("n1"));
    }

    #[tokio::test]
    async fn cancellation_reaches_the_next_element() {
        let recorder = Recorder::new();
        let svc = SetLogOption::new(node_options(), recorder.clone());
        let (ctx, cancel) = ExecutionContext::background().with_cancel();

        svc.register(ctx, NetworkServiceEndpoint::named("nse-1"))
            .await
            .unwrap();
        let seen = recorder.last_context();
        assert!(seen.err().is_none());

        cancel.cancel();
        assert_eq!(seen.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_reaches_the_find_stream_context() {
        let recorder = Recorder::new();
        let svc = SetLogOption::new(node_options(), recorder.clone());
        let ctx = ExecutionContext::background().with_timeout(Duration::from_millis(100));

        let (server, _rx) = ChannelFindServer::new(ctx.clone(), 1);
        svc.find(NetworkServiceEndpointQuery::default(), &server)
            .await
            .unwrap();

        let seen = recorder.last_context();
        assert_eq!(seen.deadline(), ctx.deadline());
        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(seen.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancel_during_find_ends_the_stream() {
        let memory = MemoryRegistry::new();
        let ctx = ExecutionContext::background();
        for name in ["nse-1", "nse-2", "nse-3"] {
            memory
                .register(ctx.clone(), NetworkServiceEndpoint::named(name))
                .await
                .unwrap();
        }
        let svc = Arc::new(SetLogOption::new(node_options(), memory));

        let (ctx, cancel) = ctx.with_cancel();
        let (server, mut rx) = ChannelFindServer::new(ctx, 1);
        let find = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move {
                svc.find(NetworkServiceEndpointQuery::default(), &server)
                    .await
            }
        });

        // The stream is now mid-call: one item delivered, the rest waiting
        // on a full channel.
        assert_eq!(rx.recv().await.unwrap().name, "nse-1");
        cancel.cancel();

        let err = find.await.unwrap().unwrap_err();
        assert!(matches!(err, RegistryError::Cancelled));
    }

    #[tokio::test]
    async fn find_forwards_items_in_order() {
        let items = ["nse-1", "nse-2", "nse-3", "nse-4"];
        let svc = SetLogOption::new(node_options(), Recorder::sending(&items));
        let (server, rx) = ChannelFindServer::new(ExecutionContext::background(), items.len());

        svc.find(NetworkServiceEndpointQuery::default(), &server)
            .await
            .unwrap();
        drop(server);

        assert_eq!(drain(rx).await, items);
    }

    #[tokio::test]
    async fn find_exposes_enriched_context_on_the_handle() {
        let recorder = Recorder::new();
        let svc = SetLogOption::new(node_options(), recorder.clone());
        let ctx = ExecutionContext::background();
        let (server, _rx) = ChannelFindServer::new(ctx.clone(), 1);

        svc.find(NetworkServiceEndpointQuery::default(), &server)
            .await
            .unwrap();

        let seen = recorder.last_context();
        assert_eq!(seen.field("nodeID"), Some("n1"));
        // The caller's handle still reports its own context.
        assert!(ExecutionContext::ptr_eq(server.context(), &ctx));
        assert!(server.context().field("nodeID").is_none());
    }

    #[tokio::test]
    async fn find_send_failure_is_returned() {
        let svc = SetLogOption::new(node_options(), Recorder::sending(&["nse-1"]));
        let (server, rx) = ChannelFindServer::new(ExecutionContext::background(), 1);
        drop(rx);

        let err = svc
            .find(NetworkServiceEndpointQuery::default(), &server)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::StreamClosed));
    }

    #[test]
    fn decorated_register_matches_direct_call() {
        proptest!(|(
            options in prop::collection::hash_map("[a-zA-Z]{1,8}", "[a-z0-9]{0,8}", 0..6),
            name in "[a-z0-9-]{1,16}",
            fail in any::<bool>(),
        )| {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let inner = if fail { Recorder::failing() } else { Recorder::new() };
                let svc = SetLogOption::new(options.clone(), inner.clone());
                let ctx = ExecutionContext::background();

                let decorated = svc
                    .register(ctx.clone(), NetworkServiceEndpoint::named(name.clone()))
                    .await;
                let derived = ctx.with_fields(&LogFields::from(options.clone()));
                let direct = inner
                    .register(derived, NetworkServiceEndpoint::named(name.clone()))
                    .await;

                match (decorated, direct) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                    (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
                    (a, b) => prop_assert!(false, "outcomes differ: {:?} vs {:?}", a, b),
                }

                let seen = inner.last_context();
                for (k, v) in &options {
                    prop_assert_eq!(seen.field(k), Some(v.as_str()));
                }
                prop_assert_eq!(seen.fields().len(), options.len());
                Ok(())
            })?;
        });
    }
}
