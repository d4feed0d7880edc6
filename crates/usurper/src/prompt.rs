//! The prompt controller: at most one decision surface, one request per
//! choice.

use usurper_engine::{
    PlayerResponse, PromptSpec, ProtocolEngine,
};
use usurper_protocol::ActionRequest;

use crate::ClientError;

/// Owns the single active decision surface.
///
/// `sync` replaces rather than stacks, so a re-delivered prompt is
/// harmless; `choose` consumes the surface before handing back the
/// request, so one choice can never emit two requests.
#[derive(Debug, Default)]
pub struct PromptController {
    active: Option<PromptSpec>,
}

impl PromptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The surface currently shown, if any.
    pub fn active(&self) -> Option<&PromptSpec> {
        self.active.as_ref()
    }

    /// Makes `desired` the active surface (replacing any prior one), or
    /// dismisses the surface when `desired` is `None`.
    pub fn sync(&mut self, desired: Option<PromptSpec>) {
        self.active = desired;
    }

    /// Converts a player's choice into exactly one protocol request.
    ///
    /// The surface is consumed on success. On a local precondition
    /// failure no request is produced and the surface stays up so the
    /// player can pick again.
    pub fn choose(
        &mut self,
        engine: &mut ProtocolEngine,
        response: PlayerResponse,
    ) -> Result<ActionRequest, ClientError> {
        if self.active.is_none() {
            return Err(ClientError::NoPrompt);
        }
        let request = engine.respond(response)?;
        self.active = None;
        Ok(request)
    }
}
