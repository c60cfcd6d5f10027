//! String commands (SET, GET)

use super::{Command, CommandContext, extract_bulk_string, extract_bulk_strings};
use crate::protocol::RespValue;

/// SET command - Set a key to a value
///
/// Syntax: SET key value
pub struct SetCommand;

impl Command for SetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let [key, value] = match extract_bulk_strings(args) {
            Ok(parts) => match <[_; 2]>::try_from(parts) {
                Ok(pair) => pair,
                Err(_) => return wrong_arity(self.name()),
            },
            Err(e) => return e,
        };

        ctx.store.set(key, value);

        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "SET"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// GET command - Get the value of a key
///
/// Syntax: GET key
pub struct GetCommand;

impl Command for GetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let Some(key) = args.first() else {
            return wrong_arity(self.name());
        };

        let key = match extract_bulk_string(key) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        match ctx.store.get(key) {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        }
    }

    fn name(&self) -> &'static str {
        "GET"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// Reply for an argument count the command does not accept
pub(crate) fn wrong_arity(name: &str) -> RespValue {
    RespValue::error(format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_lowercase()
    ))
}
