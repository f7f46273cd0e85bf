mod client;
mod error;
mod helpers;
mod launcher;
