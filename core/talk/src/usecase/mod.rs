//! ユースケース層

pub mod app;
