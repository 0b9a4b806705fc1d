#![allow(non_snake_case)]

pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod runtime;
pub mod service;
pub mod session;
pub mod storage;
pub mod validation;
