use crate::api::ApiClient;
use crate::pages::{NoticeBanner, PageView, Sidebar};
use crate::state::expansion::ExpansionState;
use crate::state::{AppContext, Workspace};
use crate::storage::{
    load_current_page_id, load_expanded_ids, save_current_page_id, save_expanded_ids,
};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn App() -> impl IntoView {
    // Read before the persistence effects below overwrite it.
    let last_page_id = load_current_page_id();

    let ws = Workspace::new(
        ApiClient::from_env(),
        ExpansionState::from_ids(load_expanded_ids()),
    );
    provide_context(AppContext(ws));

    Effect::new(move |_| {
        let ids = ws.expansion.with(|e| e.ids());
        save_expanded_ids(&ids);
    });

    Effect::new(move |_| {
        let id = ws.navigation.with(|n| n.current_id().map(str::to_string));
        save_current_page_id(id.as_deref());
    });

    spawn_local(async move {
        if ws.load_pages().await.is_err() {
            return;
        }
        if let Some(page_id) = last_page_id {
            let _ = ws.restore(&page_id).await;
        }
    });

    view! {
        <div class="flex h-screen w-full overflow-hidden bg-background text-foreground">
            <Sidebar />
            <main class="flex min-w-0 flex-1 flex-col overflow-y-auto">
                <div class="px-8 pt-4">
                    <NoticeBanner />
                </div>
                <PageView />
            </main>
        </div>
    }
}
