//! Replays recorded interactions from a cassette.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Serves interactions from a loaded cassette.
///
/// Each interaction is served once. A call is answered by the first unused
/// interaction whose recorded input equals the call's input; if none matches,
/// the first unused interaction for the port/method pair is served. Matching
/// on input keeps concurrent callers paired with their own recordings.
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, Vec<(Interaction, bool)>>,
}

impl CassetteReplayer {
    /// Create a replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<(Interaction, bool)>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push((interaction.clone(), false));
        }
        Self { queues }
    }

    /// Take the interaction answering a call with `input`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the cassette holds no
    /// interactions for the port/method pair, or all of them were served.
    pub fn next_interaction(
        &mut self,
        port: &str,
        method: &str,
        input: &serde_json::Value,
    ) -> Result<&Interaction, String> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };

        if !self.queues.contains_key(&key) {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            return Err(format!(
                "Cassette has no interactions for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            ));
        }
        let queue = self.queues.get_mut(&key).ok_or("cassette queue vanished")?;

        let position = queue
            .iter()
            .position(|(i, used)| !used && i.input == *input)
            .or_else(|| queue.iter().position(|(_, used)| !used))
            .ok_or_else(|| {
                format!(
                    "Cassette exhausted: all {} interactions for port={port:?} method={method:?} \
                     have been consumed.",
                    queue.len()
                )
            })?;

        let entry = &mut queue[position];
        entry.1 = true;
        Ok(&entry.0)
    }
}
