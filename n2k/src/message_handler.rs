use crate::decoder::ParsedMessage;

/// Trait for components that consume decoded NMEA2000 messages.
///
/// Consumers receive every message from the output queue and decide
/// internally which ones they are interested in, keeping the dispatch loop
/// decoupled from individual consumers.
pub trait MessageHandler {
    /// Process one decoded message.
    ///
    /// Implementations should check the PGN or selected definition and
    /// ignore messages they do not care about.
    fn handle_message(&mut self, message: &ParsedMessage);
}
