/// Popup UI: the enabled toggle and a content-script connection test.
use patternfly_yew::prelude::*;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::config::Config;
use crate::contracts::{Envelope, events};
use crate::storage::keys;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/popup.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryActiveTab() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendTabMessage(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getSyncStorage(key: String) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setSyncStorage(key: String, value: JsValue) -> Result<(), JsValue>;
}

#[derive(Clone, PartialEq)]
enum TestState {
    Idle,
    Testing,
    Working,
    NotResponding,
    NotPiazza,
    Failed(String),
}

#[derive(Deserialize)]
struct ActiveTab {
    id: i32,
    #[serde(default)]
    url: String,
}

#[function_component(App)]
pub fn app() -> Html {
    let enabled = use_state(|| true);
    let test_state = use_state(|| TestState::Idle);

    // Load the toggle from synced storage on mount
    {
        let enabled = enabled.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                if let Ok(value) = getSyncStorage(keys::ENABLED.to_string()).await {
                    if let Some(stored) = value.as_bool() {
                        enabled.set(stored);
                    }
                }
            });
            || ()
        });
    }

    let on_toggle = {
        let enabled = enabled.clone();
        Callback::from(move |_: Event| {
            let next = !*enabled;
            enabled.set(next);

            spawn_local(async move {
                let _ = setSyncStorage(keys::ENABLED.to_string(), JsValue::from_bool(next)).await;
                notify_active_tab(next).await;
            });
        })
    };

    let on_test = {
        let test_state = test_state.clone();
        Callback::from(move |_| {
            let test_state = test_state.clone();
            test_state.set(TestState::Testing);

            spawn_local(async move {
                match run_connection_test().await {
                    Ok(result) => test_state.set(result),
                    Err(err) => test_state.set(TestState::Failed(err)),
                }
            });
        })
    };

    let config = Config::default();
    let is_busy = matches!(*test_state, TestState::Testing);

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"ThreadSense"}</h1>

            <div class="toggle-row">
                <label class="toggle-label">
                    <input
                        type="checkbox"
                        checked={*enabled}
                        onchange={on_toggle}
                    />
                    {" Enable ThreadSense on Piazza"}
                </label>
            </div>

            <Button onclick={on_test} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                {"🔌 Test Connection"}
            </Button>

            {match &*test_state {
                TestState::Idle => html! {},
                TestState::Testing => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Testing..."}</p>
                    </div>
                },
                TestState::Working => html! {
                    <Alert r#type={AlertType::Success} title={"Extension working!"} inline={true}>
                    </Alert>
                },
                TestState::NotResponding => html! {
                    <Alert r#type={AlertType::Warning} title={"Content script not responding"} inline={true}>
                        {"Try refreshing the Piazza tab."}
                    </Alert>
                },
                TestState::NotPiazza => html! {
                    <Alert r#type={AlertType::Info} title={"Not a Piazza page"} inline={true}>
                        {"Navigate to a Piazza page first."}
                    </Alert>
                },
                TestState::Failed(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Test failed"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
            }}

            <p class="footer-popup">
                {format!("ThreadSense v{}", config.version)}
            </p>
        </div>
    }
}

// Helper functions

async fn active_piazza_tab() -> Result<Option<ActiveTab>, String> {
    let tab_js = queryActiveTab()
        .await
        .map_err(|e| format!("Failed to query tabs: {e:?}"))?;
    if tab_js.is_null() || tab_js.is_undefined() {
        return Ok(None);
    }
    let tab: ActiveTab = serde_wasm_bindgen::from_value(tab_js)
        .map_err(|e| format!("Failed to parse tab: {e:?}"))?;
    if tab.url.contains("piazza.com") {
        Ok(Some(tab))
    } else {
        Ok(None)
    }
}

async fn notify_active_tab(enabled: bool) {
    let Ok(Some(tab)) = active_piazza_tab().await else {
        return;
    };
    let envelope = Envelope::new(
        events::TS_TOGGLE,
        Some(serde_json::json!({ "enabled": enabled })),
    );
    if let Ok(message) = serde_wasm_bindgen::to_value(&envelope) {
        // The tab may have no content script; that is fine.
        let _ = sendTabMessage(tab.id, message).await;
    }
}

async fn run_connection_test() -> Result<TestState, String> {
    let Some(tab) = active_piazza_tab().await? else {
        return Ok(TestState::NotPiazza);
    };

    let probe = Envelope::new(events::TEST, None);
    let message = serde_wasm_bindgen::to_value(&probe)
        .map_err(|e| format!("Failed to serialize probe: {e:?}"))?;

    match sendTabMessage(tab.id, message).await {
        Ok(response) if !response.is_null() && !response.is_undefined() => Ok(TestState::Working),
        Ok(_) => Ok(TestState::NotResponding),
        Err(_) => Ok(TestState::NotResponding),
    }
}
