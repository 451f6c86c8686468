//! The five wire verbs binding bloom chains to keyspace slots.
//!
//! Verbs and argument shapes:
//!
//! * `BFADD key [ERROR e] [ELEMENTS v1 v2 ...]`
//! * `BFEXIST key value`
//! * `BFCOUNT key`
//! * `BFDEBUG STATUS key`
//! * `BFDEBUG FILTER key idx`
//!
//! Argument validation always completes before any state change, so a
//! rejected command leaves the keyspace untouched.

use thiserror::Error;
use tracing::debug;

use crate::bloom::{BloomChain, BloomError, MIN_ERROR_RATE};
use crate::keyspace::{Keyspace, Value};

/// Non-error replies of the command surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Integer(i64),
    Bulk(String),
}

pub type CommandResult = Result<Reply, CommandError>;

/// Caller-visible command failures. All are recovered at the command
/// boundary; none leave partial state behind.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("wrong number of arguments")]
    WrongArity,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no error specified")]
    NoErrorSpecified,

    #[error("value is not a valid float")]
    NotAFloat,

    #[error("value is not an integer")]
    NotAnInteger,

    #[error("error too small")]
    ErrorTooSmall,

    #[error("cannot change error on existing bloom filter")]
    ErrorConflict,

    #[error("key holds a value of the wrong type")]
    WrongType,

    #[error("no such key")]
    MissingKey,

    #[error("filter index out of range")]
    FilterIndexOutOfRange,
}

/// Route a tokenized command line. `argv[0]` is the verb, matched
/// case-insensitively.
pub fn dispatch(keyspace: &mut Keyspace, argv: &[&[u8]]) -> CommandResult {
    let verb = *argv.first().ok_or(CommandError::WrongArity)?;
    if verb.eq_ignore_ascii_case(b"bfadd") {
        bfadd(keyspace, argv)
    } else if verb.eq_ignore_ascii_case(b"bfexist") {
        bfexist(keyspace, argv)
    } else if verb.eq_ignore_ascii_case(b"bfcount") {
        bfcount(keyspace, argv)
    } else if verb.eq_ignore_ascii_case(b"bfdebug") {
        bfdebug(keyspace, argv)
    } else {
        Err(CommandError::UnknownCommand(
            String::from_utf8_lossy(verb).into_owned(),
        ))
    }
}

/// `BFADD key [ERROR e] [ELEMENTS v1 v2 ...]`
///
/// Creates the chain when the key is absent. Replies with the number of
/// elements the tail filter considered novel; a bare creation replies 1,
/// a no-op replies 0.
pub fn bfadd(keyspace: &mut Keyspace, argv: &[&[u8]]) -> CommandResult {
    if argv.len() < 2 {
        return Err(CommandError::WrongArity);
    }
    let key = String::from_utf8_lossy(argv[1]).into_owned();

    let mut requested_error: Option<f64> = None;
    let mut j = 2;
    while j < argv.len() {
        let option = argv[j];
        if option.eq_ignore_ascii_case(b"elements") {
            j += 1;
            break;
        } else if option.eq_ignore_ascii_case(b"error") {
            if j + 1 >= argv.len() {
                return Err(CommandError::NoErrorSpecified);
            }
            let rate = parse_float(argv[j + 1])?;
            if rate < MIN_ERROR_RATE {
                return Err(CommandError::ErrorTooSmall);
            }
            requested_error = Some(rate);
            j += 2;
        } else {
            return Err(CommandError::InvalidOption(
                String::from_utf8_lossy(option).into_owned(),
            ));
        }
    }
    let elements = &argv[j..];

    let created = match keyspace.get(&key) {
        Some(Value::Bloom(_)) => false,
        Some(_) => return Err(CommandError::WrongType),
        None => true,
    };
    if let (false, Some(rate)) = (created, requested_error) {
        // Resolve the conflict before touching the keyspace.
        let Some(Value::Bloom(chain)) = keyspace.get(&key) else {
            return Err(CommandError::WrongType);
        };
        if rate != chain.error_rate() {
            return Err(CommandError::ErrorConflict);
        }
    }
    if created {
        keyspace.insert(key.clone(), Value::Bloom(BloomChain::new()));
        debug!(key = %key, "created bloom chain");
    }
    let Some(Value::Bloom(chain)) = keyspace.get_mut(&key) else {
        return Err(CommandError::WrongType);
    };

    if created {
        if let Some(rate) = requested_error {
            match chain.set_error_rate(rate) {
                Ok(()) => {}
                Err(BloomError::ErrorRateTooSmall(_)) => {
                    return Err(CommandError::ErrorTooSmall)
                }
                Err(_) => return Err(CommandError::ErrorConflict),
            }
        }
    }

    let mut novel = 0i64;
    for element in elements {
        if chain.add(element) {
            novel += 1;
        }
    }

    if elements.is_empty() {
        Ok(Reply::Integer(i64::from(created)))
    } else {
        Ok(Reply::Integer(novel))
    }
}

/// `BFEXIST key value` — 0/1 membership; an absent key replies 0.
pub fn bfexist(keyspace: &Keyspace, argv: &[&[u8]]) -> CommandResult {
    if argv.len() != 3 {
        return Err(CommandError::WrongArity);
    }
    let key = String::from_utf8_lossy(argv[1]);
    match keyspace.get(key.as_ref()) {
        None => Ok(Reply::Integer(0)),
        Some(Value::Bloom(chain)) => {
            Ok(Reply::Integer(i64::from(chain.contains(argv[2]))))
        }
        Some(_) => Err(CommandError::WrongType),
    }
}

/// `BFCOUNT key` — cardinality estimate; an absent key replies 0.
pub fn bfcount(keyspace: &Keyspace, argv: &[&[u8]]) -> CommandResult {
    if argv.len() != 2 {
        return Err(CommandError::WrongArity);
    }
    let key = String::from_utf8_lossy(argv[1]);
    match keyspace.get(key.as_ref()) {
        None => Ok(Reply::Integer(0)),
        Some(Value::Bloom(chain)) => {
            Ok(Reply::Integer(chain.estimate_cardinality() as i64))
        }
        Some(_) => Err(CommandError::WrongType),
    }
}

/// `BFDEBUG STATUS key` and `BFDEBUG FILTER key idx`.
pub fn bfdebug(keyspace: &Keyspace, argv: &[&[u8]]) -> CommandResult {
    if argv.len() < 3 {
        return Err(CommandError::WrongArity);
    }
    let sub = argv[1];
    if sub.eq_ignore_ascii_case(b"status") {
        if argv.len() != 3 {
            return Err(CommandError::WrongArity);
        }
        let chain = lookup_chain(keyspace, argv[2])?;
        Ok(Reply::Bulk(format!(
            "n:{} e:{}",
            chain.num_filters(),
            format_g(chain.error_rate())
        )))
    } else if sub.eq_ignore_ascii_case(b"filter") {
        if argv.len() != 4 {
            return Err(CommandError::WrongArity);
        }
        let chain = lookup_chain(keyspace, argv[2])?;
        let index = parse_index(argv[3])?;
        let filter = chain
            .filter(index)
            .map_err(|_| CommandError::FilterIndexOutOfRange)?;
        Ok(Reply::Bulk(format!(
            "k:{} s:{} b:{}",
            filter.params().num_partitions,
            filter.params().partition_bits,
            filter.bits_set()
        )))
    } else {
        Err(CommandError::UnknownSubcommand(
            String::from_utf8_lossy(sub).into_owned(),
        ))
    }
}

fn lookup_chain<'a>(
    keyspace: &'a Keyspace,
    key: &[u8],
) -> Result<&'a BloomChain, CommandError> {
    let key = String::from_utf8_lossy(key);
    match keyspace.get(key.as_ref()) {
        None => Err(CommandError::MissingKey),
        Some(Value::Bloom(chain)) => Ok(chain),
        Some(_) => Err(CommandError::WrongType),
    }
}

fn parse_float(token: &[u8]) -> Result<f64, CommandError> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or(CommandError::NotAFloat)
}

fn parse_index(token: &[u8]) -> Result<usize, CommandError> {
    let value = std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or(CommandError::NotAnInteger)?;
    if value < 0 {
        return Err(CommandError::FilterIndexOutOfRange);
    }
    Ok(value as usize)
}

/// Render a float the way C's `%g` does: six significant digits,
/// scientific notation outside `[1e-4, 1e6)`, trailing zeros trimmed,
/// two-digit exponent.
pub(crate) fn format_g(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= 6 {
        let formatted = format!("{value:.5e}");
        let (mantissa, exp) = formatted
            .split_once('e')
            .unwrap_or((formatted.as_str(), "0"));
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        let exp: i32 = exp.parse().unwrap_or(0);
        if exp < 0 {
            format!("{mantissa}e-{:02}", -exp)
        } else {
            format!("{mantissa}e+{exp:02}")
        }
    } else {
        let decimals = (5 - exponent).max(0) as usize;
        let formatted = format!("{value:.decimals$}");
        if formatted.contains('.') {
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            formatted
        }
    }
}
