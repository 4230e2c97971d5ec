mod api;
mod app;
mod blocks;
mod components;
mod models;
mod pages;
mod state;
mod storage;
mod telemetry;
mod util;

pub use app::App;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::{ApiClient, EnvConfig};
    use crate::storage::{
        load_current_page_id, load_expanded_ids, save_current_page_id, save_expanded_ids,
        TOKEN_KEY,
    };
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_expanded_ids_roundtrip() {
        save_expanded_ids(&["a".to_string(), "b".to_string()]);
        assert_eq!(load_expanded_ids(), vec!["a".to_string(), "b".to_string()]);
        save_expanded_ids(&[]);
        assert!(load_expanded_ids().is_empty());
    }

    #[wasm_bindgen_test]
    fn test_current_page_id_roundtrip() {
        save_current_page_id(Some("page-1"));
        assert_eq!(load_current_page_id().as_deref(), Some("page-1"));
        save_current_page_id(None);
        assert!(load_current_page_id().is_none());
    }

    #[wasm_bindgen_test]
    fn test_client_picks_up_stored_token() {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .expect("localStorage");
        storage.set_item(TOKEN_KEY, "t1").expect("set token");
        let client = ApiClient::from_env();
        assert_eq!(client.token.as_deref(), Some("t1"));
        storage.remove_item(TOKEN_KEY).expect("remove token");
    }

    #[wasm_bindgen_test]
    fn test_env_config_defaults_without_window_env() {
        assert_eq!(EnvConfig::new().api_url, "http://localhost:4317");
    }

    #[wasm_bindgen_test]
    fn test_telemetry_init_is_idempotent() {
        crate::telemetry::init();
        crate::telemetry::init();
        tracing::info!("telemetry ready");
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    telemetry::init();
    mount_to_body(App);
}
