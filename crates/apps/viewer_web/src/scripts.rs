use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use js_sys::Promise;
use viewer::{Dependency, DependencyLoadError, ScriptLoader};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlScriptElement;

use crate::engine::js_message;

/// Appends `<script>` elements to the document head.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomScriptLoader;

impl ScriptLoader for DomScriptLoader {
    fn inject(&self, dependency: &Dependency) -> LocalBoxFuture<'static, Result<(), DependencyLoadError>> {
        let dependency = dependency.clone();
        async move {
            append_script(&dependency)
                .await
                .map_err(|err| DependencyLoadError::new(dependency.name.clone(), js_message(&err)))
        }
        .boxed_local()
    }
}

async fn append_script(dependency: &Dependency) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no head"))?;
    let script: HtmlScriptElement = document.create_element("script")?.dyn_into()?;
    script.set_src(&dependency.url);

    let url = dependency.url.clone();
    let loaded = Promise::new(&mut |resolve, reject| {
        script.set_onload(Some(&resolve));
        let url = url.clone();
        let on_error = Closure::once_into_js(move |_event: JsValue| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&format!("script error from {url}")));
        });
        script.set_onerror(Some(on_error.unchecked_ref()));
    });

    head.append_child(&script)?;
    JsFuture::from(loaded).await?;
    Ok(())
}
