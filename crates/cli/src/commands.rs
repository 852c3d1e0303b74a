//! Producer and consumer runs behind the CLI subcommands.

use prefill_client::{DataHook, FetchCoordinator, FetchState};
use prefill_core::Error;
use serde_json::json;

/// Preloads `ids` and returns the transfer string.
///
/// Any failed identifier aborts the run: there is nothing to fall back to.
pub async fn preload(coordinator: &FetchCoordinator, ids: &[String]) -> Result<String, Error> {
    coordinator.preload_all(ids).await?;
    Ok(coordinator.store().serialize())
}

/// Settled state of every hook in a hydrate run, in argument order.
#[derive(Debug)]
pub struct HydrateReport {
    pub states: Vec<(String, FetchState)>,
}

impl HydrateReport {
    /// One JSON object per identifier.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.states.iter().map(|(identifier, state)| {
            json!({
                "identifier": identifier,
                "loading": state.loading,
                "data": state.data,
                "error": state.error.as_ref().map(|e| e.to_string()),
            })
            .to_string()
        })
    }
}

/// Restores `transfer` (if any) and settles one hook per identifier.
pub async fn hydrate(coordinator: &FetchCoordinator, transfer: Option<&str>, ids: &[String]) -> HydrateReport {
    if let Some(text) = transfer {
        coordinator.store().restore(text);
    }

    let mut hooks: Vec<DataHook> = ids.iter().map(|id| DataHook::bind(coordinator, id.as_str())).collect();

    let mut states = Vec::with_capacity(hooks.len());
    for hook in &mut hooks {
        let state = hook.settled().await;
        states.push((hook.identifier().to_owned(), state));
    }

    HydrateReport { states }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefill_client::{HttpTransport, TransportConfig};
    use prefill_core::Store;
    use std::sync::Arc;

    fn coordinator(base_url: String) -> (FetchCoordinator, Arc<HttpTransport>) {
        let config = TransportConfig { base_url: Some(base_url), ..Default::default() };
        let transport = Arc::new(HttpTransport::new(config).unwrap());
        (FetchCoordinator::new(Store::new(), transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_preload_then_hydrate_through_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/people")
            .with_status(200)
            .with_body(r#"[{"name":"Ann"}]"#)
            .expect(1)
            .create_async()
            .await;

        let (producer, _) = coordinator(server.url());
        let transfer = preload(&producer, &["/people".to_string()]).await.unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &transfer).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();

        let (consumer, consumer_http) = coordinator(server.url());
        let report = hydrate(&consumer, Some(&text), &["/people".to_string()]).await;

        assert_eq!(consumer_http.requests_sent(), 0);
        let lines: Vec<serde_json::Value> = report.lines().map(|l| serde_json::from_str(&l).unwrap()).collect();
        assert_eq!(
            lines,
            vec![json!({"identifier": "/people", "loading": false, "data": [{"name": "Ann"}], "error": null})]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_preload_failure_aborts() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server.mock("GET", "/a").with_status(200).with_body("1").create_async().await;
        let _bad = server.mock("GET", "/b").with_status(500).create_async().await;

        let (producer, _) = coordinator(server.url());
        let result = preload(&producer, &["/a".to_string(), "/b".to_string()]).await;

        match result {
            Err(Error::Preload(e)) => assert_eq!(e.identifier(), "/b"),
            other => panic!("expected preload error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hydrate_without_transfer_reports_errors_as_data() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server.mock("GET", "/gone").with_status(404).create_async().await;

        let (consumer, consumer_http) = coordinator(server.url());
        let report = hydrate(&consumer, Some("not valid json"), &["/gone".to_string()]).await;

        assert_eq!(consumer_http.requests_sent(), 1);
        let (_, state) = &report.states[0];
        assert!(!state.loading);
        assert!(state.error.is_some());
    }
}
