//! Hash commands (HSET, HGET, HGETALL)

use super::string::wrong_arity;
use super::{Command, CommandContext, extract_bulk_strings};
use crate::protocol::RespValue;

/// HSET command - Set field in the hash stored at key to value
///
/// Syntax: HSET key field value
pub struct HSetCommand;

impl Command for HSetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let [key, field, value] = match extract_bulk_strings(args) {
            Ok(parts) => match <[_; 3]>::try_from(parts) {
                Ok(triple) => triple,
                Err(_) => return wrong_arity(self.name()),
            },
            Err(e) => return e,
        };

        ctx.store.hset(key, field, value);

        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "HSET"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// HGET command - Get the value of a hash field
///
/// Syntax: HGET key field
pub struct HGetCommand;

impl Command for HGetCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let [key, field] = match extract_bulk_strings(args) {
            Ok(parts) => match <[_; 2]>::try_from(parts) {
                Ok(pair) => pair,
                Err(_) => return wrong_arity(self.name()),
            },
            Err(e) => return e,
        };

        match ctx.store.hget(&key, &field) {
            Some(v) => RespValue::bulk_string(v),
            None => RespValue::null(),
        }
    }

    fn name(&self) -> &'static str {
        "HGET"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// HGETALL command - Get all fields and values in a hash
///
/// Syntax: HGETALL key
///
/// Replies with alternating field/value bulk strings in no particular order,
/// or null when the hash does not exist.
pub struct HGetAllCommand;

impl Command for HGetAllCommand {
    fn execute(&self, ctx: &CommandContext, args: &[RespValue]) -> RespValue {
        let [key] = match extract_bulk_strings(args) {
            Ok(parts) => match <[_; 1]>::try_from(parts) {
                Ok(single) => single,
                Err(_) => return wrong_arity(self.name()),
            },
            Err(e) => return e,
        };

        // The store lock is already released here
        let Some(pairs) = ctx.store.hgetall(&key) else {
            return RespValue::null();
        };

        let mut result = Vec::with_capacity(pairs.len() * 2);
        for (field, value) in pairs {
            result.push(RespValue::bulk_string(field));
            result.push(RespValue::bulk_string(value));
        }
        RespValue::array(result)
    }

    fn name(&self) -> &'static str {
        "HGETALL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
