//! HelloWorld Contract
//!
//! Every `hello(name)` call returns "Hello, <name>" and keeps it in its own
//! storage slot keyed by `name || '_' || counter`, the counter being a
//! big-endian u64 incremented after each greeting.
//!
//! Input layout: opcode (1 byte), then the name as a u16 big-endian length
//! followed by its UTF-8 bytes.
//!
//! Box keys are limited to 64 bytes, so names longer than 55 bytes are
//! rejected with `ERR_NAME_TOO_LONG`. The local ledger refuses the same
//! calls with `BoxKeyTooLong`.

#![no_std]
#![no_main]

use tako_sdk::*;

const OP_HELLO: u8 = 0x01;

/// Storage key of the greeting counter
const COUNTER_KEY: &[u8] = b"counter";
const GREETING_PREFIX: &[u8] = b"Hello, ";
const SEPARATOR: u8 = b'_';

const MAX_KEY_LEN: usize = 64;
const MAX_NAME_LEN: usize = MAX_KEY_LEN - 1 - 8;
const MAX_VALUE_LEN: usize = GREETING_PREFIX.len() + MAX_NAME_LEN;

const ERR_INVALID_INSTRUCTION: u64 = 1;
const ERR_INVALID_NAME: u64 = 2;
const ERR_NAME_TOO_LONG: u64 = 3;
const ERR_CORRUPT_COUNTER: u64 = 4;
const ERR_COUNTER_OVERFLOW: u64 = 5;
const ERR_STORAGE_COLLISION: u64 = 6;
const ERR_STORAGE_WRITE: u64 = 7;

fn read_counter() -> Result<u64, u64> {
    let mut buffer = [0u8; 8];
    match storage_read(COUNTER_KEY, &mut buffer) {
        0 => Ok(0),
        8 => Ok(u64::from_be_bytes(buffer)),
        _ => Err(ERR_CORRUPT_COUNTER),
    }
}

fn parse_name(params: &[u8]) -> Result<&[u8], u64> {
    if params.len() < 2 {
        return Err(ERR_INVALID_NAME);
    }
    let len = u16::from_be_bytes([params[0], params[1]]) as usize;
    let name = params.get(2..2 + len).ok_or(ERR_INVALID_NAME)?;
    if core::str::from_utf8(name).is_err() {
        return Err(ERR_INVALID_NAME);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ERR_NAME_TOO_LONG);
    }
    Ok(name)
}

fn hello(params: &[u8]) -> u64 {
    let name = match parse_name(params) {
        Ok(name) => name,
        Err(code) => return code,
    };

    let counter = match read_counter() {
        Ok(counter) => counter,
        Err(code) => {
            log("HelloWorld: Counter slot is corrupt");
            return code;
        }
    };
    // Checked before any write so a failing call stores nothing
    let next = match counter.checked_add(1) {
        Some(next) => next,
        None => return ERR_COUNTER_OVERFLOW,
    };

    let mut key = [0u8; MAX_KEY_LEN];
    let key_len = name.len() + 1 + 8;
    key[..name.len()].copy_from_slice(name);
    key[name.len()] = SEPARATOR;
    key[name.len() + 1..key_len].copy_from_slice(&counter.to_be_bytes());
    let key = &key[..key_len];

    let mut existing = [0u8; 1];
    if storage_read(key, &mut existing) != 0 {
        log("HelloWorld: Greeting slot already used");
        return ERR_STORAGE_COLLISION;
    }

    let mut value = [0u8; MAX_VALUE_LEN];
    let value_len = GREETING_PREFIX.len() + name.len();
    value[..GREETING_PREFIX.len()].copy_from_slice(GREETING_PREFIX);
    value[GREETING_PREFIX.len()..value_len].copy_from_slice(name);
    let value = &value[..value_len];

    if storage_write(key, value).is_err() || storage_write(COUNTER_KEY, &next.to_be_bytes()).is_err() {
        log("HelloWorld: Storage write failed");
        return ERR_STORAGE_WRITE;
    }

    match set_return_data(value) {
        Ok(_) => {
            log("HelloWorld: Greeting stored");
            log_u64(counter, next, name.len() as u64, 0, 0);
            SUCCESS
        }
        Err(code) => code,
    }
}

/// Main contract entrypoint
#[no_mangle]
pub extern "C" fn entrypoint() -> u64 {
    let mut input = [0u8; 256];
    let len = get_input_data(&mut input);

    if len == 0 {
        log("HelloWorld: No input data");
        return ERR_INVALID_INSTRUCTION;
    }

    let len = (len as usize).min(input.len());
    let params = &input[1..len];
    match input[0] {
        OP_HELLO => hello(params),
        _ => {
            log("HelloWorld: Unknown instruction");
            ERR_INVALID_INSTRUCTION
        }
    }
}

/// Panic handler (required for no_std)
#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}
