#![allow(dead_code)]

pub mod pages;
pub mod socket_guard;
