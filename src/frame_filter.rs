use n2k::ParsedMessage;

use crate::config::Config;

/// Filters decoded messages based on application configuration
///
/// # Arguments
/// * `config` - Application configuration containing filter rules
/// * `message` - The decoded message to filter
///
/// # Returns
/// true if the message should be processed, false if it should be skipped
pub fn should_process_message(config: &Config, message: &ParsedMessage) -> bool {
    // Apply source filter - skip messages that don't match the configured source
    config
        .source_filter
        .should_accept(message.header.pgn, message.header.source)
}
