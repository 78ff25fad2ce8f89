use napi::Result as NapiResult;
use napi_derive::napi;

use emi_core::emi::engine::{self, DownPaymentInput, EmiQuoteInput};
use emi_core::emi::session::{self, LoanSession, SessionEvent};
use emi_core::CalculatorConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Empty or missing config JSON means the built-in defaults.
fn parse_config(config_json: Option<String>) -> NapiResult<CalculatorConfig> {
    match config_json.as_deref().map(str::trim) {
        None | Some("") => Ok(CalculatorConfig::default()),
        Some(json) => {
            let config: CalculatorConfig = serde_json::from_str(json).map_err(to_napi_error)?;
            config.validate().map_err(to_napi_error)?;
            Ok(config)
        }
    }
}

// ---------------------------------------------------------------------------
// One-shot calculations
// ---------------------------------------------------------------------------

#[napi]
pub fn quote_emi(input_json: String) -> NapiResult<String> {
    let input: EmiQuoteInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::quote_emi(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn solve_down_payment(input_json: String) -> NapiResult<String> {
    let input: DownPaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::solve_down_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Linked-slider session
// ---------------------------------------------------------------------------

/// Fresh session state as JSON. The caller holds it and passes it back on
/// every event.
#[napi]
pub fn new_session(config_json: Option<String>) -> NapiResult<String> {
    let config = parse_config(config_json)?;
    let session = LoanSession::new(&config).map_err(to_napi_error)?;
    serde_json::to_string(&session).map_err(to_napi_error)
}

/// Apply one event; returns `{"session": ..., "view": ...}`.
#[napi]
pub fn apply_session_event(session_json: String, event_json: String) -> NapiResult<String> {
    let session: LoanSession = serde_json::from_str(&session_json).map_err(to_napi_error)?;
    let event: SessionEvent = serde_json::from_str(&event_json).map_err(to_napi_error)?;
    let next = session.apply(&event).map_err(to_napi_error)?;
    let view = next.view().map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "session": next, "view": view }))
        .map_err(to_napi_error)
}

#[napi]
pub fn replay_session(events_json: String, config_json: Option<String>) -> NapiResult<String> {
    let config = parse_config(config_json)?;
    let events: Vec<SessionEvent> = serde_json::from_str(&events_json).map_err(to_napi_error)?;
    let trace = session::replay(&config, &events).map_err(to_napi_error)?;
    serde_json::to_string(&trace).map_err(to_napi_error)
}
