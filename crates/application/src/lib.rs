#![forbid(unsafe_code)]

pub mod guard_service_impl;
