use std::cell::RefCell;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use gloo_net::http::Request;
use serde::Deserialize;
use viewer::{ClientError, StructureClient};

#[derive(Debug, Deserialize)]
struct ProteinPayload {
    data: Option<String>,
    error: Option<String>,
}

/// Talks to the proxy's `/api/protein` endpoint.
///
/// Clones share one base URL, so repointing a handle repoints every clone.
#[derive(Debug, Clone, Default)]
pub struct ProxyClient {
    /// Origin of the proxy; empty for same-origin requests.
    base: Rc<RefCell<String>>,
}

impl ProxyClient {
    pub fn set_base(&self, base: &str) {
        *self.base.borrow_mut() = base.trim_end_matches('/').to_string();
    }

    fn url_for(&self, id: &str) -> String {
        let id = String::from(js_sys::encode_uri_component(id));
        format!("{}/api/protein?id={id}", self.base.borrow())
    }
}

impl StructureClient for ProxyClient {
    fn fetch(&self, id: &str) -> LocalBoxFuture<'static, Result<String, ClientError>> {
        let url = self.url_for(id);
        async move {
            let resp = Request::get(&url)
                .send()
                .await
                .map_err(|e| ClientError::new(e.to_string()))?;
            let ok = resp.ok();
            let text = resp.text().await.map_err(|e| ClientError::new(e.to_string()))?;
            let payload: ProteinPayload =
                serde_json::from_str(&text).map_err(|e| ClientError::new(e.to_string()))?;

            match payload {
                ProteinPayload { data: Some(data), error: None } if ok => Ok(data),
                ProteinPayload { error, .. } => Err(ClientError::new(
                    error.unwrap_or_else(|| "Failed to fetch protein".to_string()),
                )),
            }
        }
        .boxed_local()
    }
}
