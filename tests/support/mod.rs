// tests/support/mod.rs

#![allow(unused)]

pub mod provider;
pub mod server;

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}
