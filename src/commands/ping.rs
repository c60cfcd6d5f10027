//! Connection commands (PING)

use super::{Command, CommandContext, extract_bulk_string};
use crate::protocol::RespValue;

/// PING command - Test the connection
///
/// Syntax: PING [message]
pub struct PingCommand;

impl Command for PingCommand {
    fn execute(&self, _ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let Some(message) = args.first() else {
            return RespValue::simple_string("PONG");
        };

        match extract_bulk_string(message) {
            Ok(bytes) => RespValue::simple_string(String::from_utf8_lossy(bytes)),
            Err(e) => RespValue::error(format!("ERR {}", e)),
        }
    }

    fn name(&self) -> &'static str {
        "PING"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping() {
        let ctx = CommandContext::new();
        assert_eq!(
            PingCommand.execute(&ctx, &[]),
            RespValue::simple_string("PONG")
        );
        assert_eq!(
            PingCommand.execute(&ctx, &[RespValue::bulk_string("hello")]),
            RespValue::simple_string("hello")
        );
    }
}
