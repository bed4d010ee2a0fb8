use std::process::Command;

use crate::error::FocusError;

/// Bring the first process whose name contains `process_name` to the front.
pub fn bring_to_front(process_name: &str) -> Result<(), FocusError> {
    let status = Command::new("osascript")
        .args(["-e", &frontmost_script(process_name)])
        .status()?;
    if !status.success() {
        return Err(FocusError::CommandFailed {
            program: "osascript",
            status,
        });
    }
    Ok(())
}

fn frontmost_script(process_name: &str) -> String {
    let name = process_name.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"tell application "System Events" to set frontmost of first process whose name contains "{}" to true"#,
        name
    )
}

/// Process name of the terminal application hosting us, from `TERM_PROGRAM`.
pub fn terminal_process_name(term_program: Option<&str>) -> String {
    match term_program {
        Some("Apple_Terminal") | None => "Terminal".to_string(),
        Some("iTerm.app") => "iTerm2".to_string(),
        Some(other) => other.trim_end_matches(".app").to_string(),
    }
}
