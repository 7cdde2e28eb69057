//! Bindings for script-hosted pages.

use wasm_bindgen::prelude::*;

use crate::console;

#[wasm_bindgen(start)]
pub fn start() {
    console::init(log::LevelFilter::Warn);
    match suola_core::rules() {
        Ok(rules) => log::info!("started with {} sites", rules.len()),
        Err(e) => log::error!("default rules failed to load: {}", e),
    }
}

/// Signature of `url`, or `undefined` when it cannot be signed.
#[wasm_bindgen(js_name = hashUrl)]
pub fn hash_url(url: &str) -> Option<String> {
    match suola_core::signature_for(url) {
        Ok(signature) => Some(signature),
        Err(e) => {
            log::debug!("hashUrl({}) failed: {}", url, e);
            None
        }
    }
}

/// `{ canonicalUrl, signature, domain }` for `url`; throws on error.
#[wasm_bindgen]
pub fn canonicalize(url: &str) -> Result<JsValue, JsValue> {
    let result = suola_core::canonicalize(url).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let js_result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&js_result, &"canonicalUrl".into(), &JsValue::from_str(&result.canonical_url));
    let _ = js_sys::Reflect::set(&js_result, &"signature".into(), &JsValue::from_str(&result.signature));
    let _ = js_sys::Reflect::set(&js_result, &"domain".into(), &JsValue::from_str(&result.domain));
    Ok(js_result.into())
}

/// Replace the rule set with a YAML document. Returns the number of sites.
#[wasm_bindgen(js_name = loadRules)]
pub fn load_rules(text: &str) -> Result<u32, JsValue> {
    suola_core::load(text.as_bytes())
        .map(|rules| rules.len() as u32)
        .map_err(|e| JsValue::from_str(&format!("Failed to load rules: {}", e)))
}

/// Rule set statistics: `{ sites, templates, retainedBuffers }`.
#[wasm_bindgen(js_name = getRulesInfo)]
pub fn get_rules_info() -> JsValue {
    let result = js_sys::Object::new();
    if let Ok(rules) = suola_core::rules() {
        let _ = js_sys::Reflect::set(&result, &"sites".into(), &JsValue::from(rules.len() as u32));
        let _ = js_sys::Reflect::set(&result, &"templates".into(), &JsValue::from(rules.template_count() as u32));
    }
    let retained = crate::abi::arena().retained_count() as u32;
    let _ = js_sys::Reflect::set(&result, &"retainedBuffers".into(), &JsValue::from(retained));
    result.into()
}
