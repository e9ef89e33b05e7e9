/// Response type shared by all command endpoints (/action, /offboard).
#[derive(serde::Deserialize, Debug)]
pub(crate) struct CommandResultResponse {
    /// Whether the autopilot accepted the command.
    success: bool,
    /// Autopilot result text, mostly set on failure.
    #[serde(default)]
    message: Option<String>,
}

impl CommandResultResponse {
    pub(crate) fn is_success(&self) -> bool { self.success }

    /// The refusal reason, or a generic one if the bridge sent none.
    pub(crate) fn reason(&self) -> String {
        self.message.clone().unwrap_or_else(|| String::from("refused without reason"))
    }
}
