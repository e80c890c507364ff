//! Response stream construction
//!
//! Converts one batched, variable-length generation result into an ordered
//! sequence of per-step frames. Frame `i` carries, for every request that
//! produced output at step `i`, either the token generated at that step or
//! the stop sentinel at the position immediately after the request's last
//! token.

use super::types::{RequestId, TokenId};
use crate::pipeline::StepOutput;
use serde::Serialize;
use std::collections::HashMap;

/// One request's contribution to a single frame: a generated token, or the
/// stop sentinel closing its stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StreamDelta {
    Token(TokenId),
    Stop,
}

impl StreamDelta {
    pub fn is_stop(&self) -> bool {
        matches!(self, StreamDelta::Stop)
    }
}

/// One generation step's worth of output across the whole batch.
pub type ResponseFrame = HashMap<RequestId, StreamDelta>;

/// Build the ordered frame sequence for one tick's results.
///
/// The sequence length is the maximum over requests of tokens produced,
/// plus one for each request that terminated (its stop sentinel occupies
/// the frame after its last token). A request that continues next tick is
/// absent from frames beyond its own output. Returns an empty sequence for
/// empty results; the caller emits nothing in that case.
pub fn build_stream(results: &HashMap<RequestId, StepOutput>) -> Vec<ResponseFrame> {
    let mut frames: Vec<ResponseFrame> = Vec::new();

    for (request_id, output) in results {
        let needed = output.tokens.len() + usize::from(output.finished);
        while frames.len() < needed {
            frames.push(ResponseFrame::new());
        }

        for (step, &token) in output.tokens.iter().enumerate() {
            frames[step].insert(request_id.clone(), StreamDelta::Token(token));
        }

        if output.finished {
            frames[output.tokens.len()].insert(request_id.clone(), StreamDelta::Stop);
        }
    }

    frames
}
