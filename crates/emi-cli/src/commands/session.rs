use clap::Args;
use serde_json::{json, Value};

use emi_core::emi::session::{self, SessionEvent};
use emi_core::CalculatorConfig;

use crate::input;

#[derive(Args)]
pub struct SessionArgs {
    /// Path to JSON file with an array of session events
    #[arg(long)]
    pub input: Option<String>,

    /// Only report the final state, not every step
    #[arg(long)]
    pub final_only: bool,
}

pub fn run_session(
    args: SessionArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let events: Vec<SessionEvent> = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <events.json> or stdin required for session replay".into());
    };
    log::debug!("replaying {} session events", events.len());

    let trace = session::replay(config, &events)?;

    let mut output = json!({ "result": trace.final_view });
    if !args.final_only {
        let steps: Vec<Value> = trace
            .steps
            .iter()
            .map(|step| {
                json!({
                    "step": step.index + 1,
                    "event": step.event,
                    "principal": step.view.principal,
                    "down_payment": step.view.down_payment,
                    "emi": step.view.emi,
                    "tenure": step.view.tenure,
                    "mode": step.view.mode,
                })
            })
            .collect();
        output["results"] = Value::Array(steps);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r#"[
        {"event": "set_principal", "value": "1200000"},
        {"event": "drag_down_payment", "value": 200000},
        {"event": "drag_emi", "value": "55000"}
    ]"#;

    fn events_file(name: &str) -> String {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, EVENTS).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_session_reports_each_step() {
        let path = events_file("emi_cli_session_steps.json");
        let args = SessionArgs {
            input: Some(path.clone()),
            final_only: false,
        };
        let value = run_session(args, &CalculatorConfig::default()).unwrap();

        assert_eq!(value["result"]["emi"], "55000");
        assert_eq!(value["result"]["down_payment"], "600000");
        let steps = value["results"].as_array().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0]["step"], 1);
        assert_eq!(steps[1]["emi"], "91667");
        assert_eq!(steps[2]["mode"], "emi_driven");
        assert_eq!(steps[2]["event"]["event"], "drag_emi");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_session_final_only() {
        let path = events_file("emi_cli_session_final.json");
        let args = SessionArgs {
            input: Some(path.clone()),
            final_only: true,
        };
        let value = run_session(args, &CalculatorConfig::default()).unwrap();

        assert!(value.get("results").is_none());
        assert_eq!(value["result"]["mode"], "emi_driven");
        assert_eq!(value["result"]["display"]["total_down_payment"], "606000");
        let _ = std::fs::remove_file(&path);
    }
}
