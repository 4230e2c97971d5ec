use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "pagebook_token";
pub(crate) const EXPANDED_PAGES_KEY: &str = "pagebook_expanded_pages";
pub(crate) const CURRENT_PAGE_KEY: &str = "pagebook_current_page_id";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = local_storage()?.get_item(key).ok().flatten()?;
    match serde_json::from_str(&json) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unreadable stored value");
            None
        }
    }
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(key, &json);
        }
    }
}

fn load_string(key: &str) -> Option<String> {
    local_storage()?
        .get_item(key)
        .ok()
        .flatten()
        .filter(|v| !v.trim().is_empty())
}

fn save_string(key: &str, value: Option<&str>) {
    let Some(storage) = local_storage() else {
        return;
    };
    let _ = match value {
        Some(v) => storage.set_item(key, v),
        None => storage.remove_item(key),
    };
}

pub(crate) fn load_token() -> Option<String> {
    load_string(TOKEN_KEY)
}

pub(crate) fn load_expanded_ids() -> Vec<String> {
    load_json_from_storage::<Vec<String>>(EXPANDED_PAGES_KEY).unwrap_or_default()
}

pub(crate) fn save_expanded_ids(ids: &[String]) {
    save_json_to_storage(EXPANDED_PAGES_KEY, &ids);
}

pub(crate) fn load_current_page_id() -> Option<String> {
    load_string(CURRENT_PAGE_KEY)
}

pub(crate) fn save_current_page_id(page_id: Option<&str>) {
    save_string(CURRENT_PAGE_KEY, page_id);
}
