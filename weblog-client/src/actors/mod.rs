//! Actors owning mutable state. All appends and reads marshal through an
//! actor mailbox, so readers never observe a half-applied append.

pub mod weblog_store;
